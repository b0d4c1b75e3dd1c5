use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use ferrite_filter::ServiceConfig;

/// State shared by every request thread. Only the job counter changes after start-up.
pub struct ServerState {
    pub config: ServiceConfig,
    job_counter: AtomicU64,
}

impl ServerState {
    pub fn new(config: ServiceConfig) -> Self {
        ServerState { config, job_counter: AtomicU64::new(0) }
    }

    /// Unique id for one dataset job: `<unix_seconds>_<counter>`.
    ///
    /// Used to name the job's sample folder and download archive.
    pub fn next_job_id(&self) -> String {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let n = self.job_counter.fetch_add(1, Ordering::Relaxed);
        format!("{}_{}", secs, n)
    }
}

/// Shared state type: an `Arc<ServerState>` passed to every handler.
pub type SharedState = Arc<ServerState>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_ids_never_repeat() {
        let state = ServerState::new(ServiceConfig::default());
        let a = state.next_job_id();
        let b = state.next_job_id();
        assert_ne!(a, b);
        assert!(a.ends_with("_0"));
        assert!(b.ends_with("_1"));
    }
}
