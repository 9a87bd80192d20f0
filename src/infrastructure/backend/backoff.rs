//! Delay between backend retries

use std::time::Duration;

/// Decides how long to wait before retry number `attempt` (1-based)
pub trait Backoff: Send + Sync {
    fn delay(&self, attempt: u32) -> Duration;
}

/// `attempt × unit`; no jitter
#[derive(Debug, Clone, Copy)]
pub struct LinearBackoff {
    unit: Duration,
}

impl LinearBackoff {
    pub fn new(unit: Duration) -> Self {
        Self { unit }
    }
}

impl Default for LinearBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Backoff for LinearBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        self.unit * attempt
    }
}
