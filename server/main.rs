/// ferrite-filter server
///
/// Applies one random convolution filter per class to uploaded image datasets.
/// Served by a synchronous tiny_http server, one thread per request.
///
/// Run with:
///   cargo run --bin filter-server --release
/// Then POST to http://127.0.0.1:8000
///
/// Endpoints:
///   POST /upload-image/          grayscale 256x256 PNG preview of one image
///   POST /upload-zip/            filter a dataset zip, JSON with samples + download URL
///   POST /upload-zip-download/   filter a dataset zip, returns the zip itself
///   GET  /static/...             sample images and result archives

mod error;
mod handlers;
mod routes;
mod state;
mod util;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use tiny_http::Server;
use tracing::info;

use ferrite_filter::ServiceConfig;
use state::ServerState;

#[derive(Parser, Debug)]
#[command(author, version, about = "Per-class dataset filtering over HTTP", long_about = None)]
struct Args {
    /// JSON config file; missing keys keep their defaults
    #[arg(short, long, env = "FERRITE_FILTER_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind, e.g. 0.0.0.0:8000
    #[arg(short, long, env = "FERRITE_FILTER_ADDR")]
    addr: Option<String>,

    /// Directory served under /static
    #[arg(short, long, env = "FERRITE_FILTER_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Worker threads per dataset job
    #[arg(short, long, env = "FERRITE_FILTER_WORKERS")]
    workers: Option<usize>,
}

fn load_config(args: &Args) -> anyhow::Result<ServiceConfig> {
    let mut config = match &args.config {
        Some(path) => ServiceConfig::load_json(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(addr) = &args.addr {
        config.bind_addr = addr.clone();
    }
    if let Some(dir) = &args.static_dir {
        config.static_dir = dir.clone();
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    ferrite_filter::logging::init_tracing("info")?;
    let args = Args::parse();
    let config = load_config(&args)?;

    for dir in [config.samples_dir(), config.downloads_dir()] {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let server = Server::http(&config.bind_addr)
        .map_err(|e| anyhow!("failed to bind {}: {}", config.bind_addr, e))?;

    println!("╔══════════════════════════════════════════════╗");
    println!("║          ferrite-filter server               ║");
    println!("╠══════════════════════════════════════════════╣");
    println!("║  Listening on:                               ║");
    println!("║  http://{:<37}║", config.bind_addr);
    println!("╚══════════════════════════════════════════════╝");
    info!(addr = %config.bind_addr, static_dir = %config.static_dir.display(), workers = config.workers, "server started");

    let shared_state = Arc::new(ServerState::new(config));

    // One thread per request.
    for request in server.incoming_requests() {
        let state_clone = shared_state.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, state_clone);
        });
    }
    Ok(())
}
