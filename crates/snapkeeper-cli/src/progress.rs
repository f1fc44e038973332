use colored::*;
use snapkeeper_core::period::Period;
use snapkeeper_core::processor::VolumeOutcome;
use snapkeeper_core::RunReporter;

/// Prints one status line per volume to stderr.
pub struct CliReporter;

impl RunReporter for CliReporter {
    fn on_run_start(&self, period: Period, volumes: usize) {
        eprintln!(
            "{} {} volumes selected for {} snapshots",
            "•".cyan(),
            volumes,
            period.frequency_label()
        );
    }

    fn on_volume_start(&self, index: usize, total: usize, volume_id: &str) {
        eprintln!("  [{}/{}] {}", index + 1, total, volume_id.bold());
    }

    fn on_volume_complete(&self, volume_id: &str, outcome: &VolumeOutcome) {
        let pruned = if outcome.pruning_skipped {
            "pruning skipped".dimmed().to_string()
        } else {
            format!("{} deleted", outcome.deleted)
        };
        eprintln!(
            "  {} {}: {} created, {}",
            "✓".green(),
            volume_id,
            outcome.snapshot_id.as_deref().unwrap_or("nothing"),
            pruned
        );
    }

    fn on_volume_error(&self, volume_id: &str, error: &str) {
        eprintln!("  {} {}: {}", "✗".red(), volume_id, error);
    }

    fn on_run_complete(&self, success: usize, total: usize, errors: usize) {
        let status = if errors == 0 {
            format!("{}/{}", success, total).green()
        } else {
            format!("{}/{}", success, total).red()
        };
        eprintln!("{} {} volumes processed, {} errors", "•".cyan(), status, errors);
    }
}
