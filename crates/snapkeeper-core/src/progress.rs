use crate::period::Period;
use crate::processor::VolumeOutcome;

/// Trait for reporting run progress.
///
/// The CLI implements this with colored status lines. All methods have
/// default no-op implementations.
pub trait RunReporter: Send + Sync {
    fn on_run_start(&self, _period: Period, _volumes: usize) {}
    fn on_volume_start(&self, _index: usize, _total: usize, _volume_id: &str) {}
    fn on_volume_complete(&self, _volume_id: &str, _outcome: &VolumeOutcome) {}
    fn on_volume_error(&self, _volume_id: &str, _error: &str) {}
    fn on_run_complete(&self, _success: usize, _total: usize, _errors: usize) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl RunReporter for SilentReporter {}
