use std::io::IsTerminal;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::LoggingError;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_directive` (e.g. `"info"`) is used.
/// Output goes to stderr, with ANSI colors only when stderr is a terminal.
pub fn init_tracing(default_directive: &str) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive)?,
    };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);

    Registry::default().with(filter).with(fmt_layer).try_init()?;
    Ok(())
}
