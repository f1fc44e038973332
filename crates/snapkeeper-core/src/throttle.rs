use std::time::Duration;
use tracing::debug;

/// Pause taken between volumes to stay under provider rate limits.
pub trait Throttle: Send + Sync {
    fn pause(&self);
}

/// Sleep for a fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl FixedDelay {
    pub fn from_secs(secs: u64) -> Self {
        FixedDelay(Duration::from_secs(secs))
    }
}

impl Throttle for FixedDelay {
    fn pause(&self) {
        if self.0.is_zero() {
            return;
        }
        debug!("Sleeping {:.1}s before the next volume", self.0.as_secs_f64());
        std::thread::sleep(self.0);
    }
}

/// Never pauses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Throttle for NoDelay {
    fn pause(&self) {}
}
