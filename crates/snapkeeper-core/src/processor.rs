use crate::error::Error;
use crate::period::{PeriodMatcher, MANAGED_PERIOD_TAG, SNAPSHOT_MARKER};
use crate::provider::{SnapshotStore, Volume, VolumeDirectory};
use crate::retention::select_for_deletion;
use crate::tags;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Timestamp format used in descriptions and run messages.
pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// What happened to one volume, including the partial progress of a failed one.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VolumeOutcome {
    pub snapshot_id: Option<String>,
    pub deleted: usize,
    pub pruning_skipped: bool,
}

#[derive(Debug)]
pub struct VolumeFailure {
    pub error: Error,
    pub partial: VolumeOutcome,
}

pub fn snapshot_description(frequency_label: &str, volume_id: &str, at: DateTime<Utc>) -> String {
    format!(
        "{} snapshot for {} {} at {}",
        frequency_label,
        volume_id,
        SNAPSHOT_MARKER,
        at.format(TIMESTAMP_FORMAT)
    )
}

/// Snapshots one volume and prunes its snapshots of the same period.
pub struct VolumeProcessor<'a> {
    directory: &'a dyn VolumeDirectory,
    store: &'a dyn SnapshotStore,
    matcher: PeriodMatcher,
    keep: Option<usize>,
}

impl<'a> VolumeProcessor<'a> {
    pub fn new(
        directory: &'a dyn VolumeDirectory,
        store: &'a dyn SnapshotStore,
        matcher: PeriodMatcher,
        keep: Option<usize>,
    ) -> Self {
        Self {
            directory,
            store,
            matcher,
            keep,
        }
    }

    /// Create a snapshot of `volume`, copy its tags over, then delete the
    /// oldest snapshots of the period beyond the keep-count.
    ///
    /// If the snapshot cannot be created, tagging and pruning are skipped and
    /// the volume fails.
    pub fn process(&self, volume: &Volume) -> Result<VolumeOutcome, VolumeFailure> {
        let mut outcome = VolumeOutcome::default();
        match self.run_steps(volume, &mut outcome) {
            Ok(()) => Ok(outcome),
            Err(error) => Err(VolumeFailure {
                error,
                partial: outcome,
            }),
        }
    }

    fn run_steps(&self, volume: &Volume, outcome: &mut VolumeOutcome) -> Result<(), Error> {
        let period = self.matcher.period();
        let volume_tags = tags::read_tags(self.directory, &volume.id)?;

        let description =
            snapshot_description(period.frequency_label(), &volume.id, Utc::now());
        let snapshot = self.store.create_snapshot(&volume.id, &description)?;
        outcome.snapshot_id = Some(snapshot.id.clone());

        let mut desired = volume_tags.clone();
        desired.insert(MANAGED_PERIOD_TAG.to_string(), period.token().to_string());
        let report = tags::mirror(&desired, &snapshot.id, &snapshot.tags, self.store);
        info!(
            "Snapshot created with description: \"{}\" and tags: {:?}",
            description, volume_tags
        );
        debug!(
            "{} tags applied to {}, {} failed",
            report.applied, snapshot.id, report.failed
        );

        let Some(keep) = self.keep else {
            info!(
                "No retention policy found in the config for {}, skipping",
                period.keep_key()
            );
            outcome.pruning_skipped = true;
            return Ok(());
        };

        let snapshots = self.store.list_snapshots(&volume.id)?;
        let doomed = select_for_deletion(&snapshots, &self.matcher, Some(keep));
        debug!(
            "{} of {} snapshots of {} selected for deletion (keep {})",
            doomed.len(),
            snapshots.len(),
            volume.id,
            keep
        );

        for snap in doomed {
            info!("Deleting snapshot: {}", snap.description);
            self.store.delete_snapshot(&snap.id)?;
            outcome.deleted += 1;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::Period;
    use chrono::TimeZone;

    #[test]
    fn test_snapshot_description_format() {
        let at = Utc.with_ymd_and_hms(2024, 2, 1, 3, 4, 5).unwrap();
        let description = snapshot_description("daily", "vol-123", at);
        assert_eq!(
            description,
            "daily snapshot for vol-123 taken by the snapshot script at 01-02-2024 03:04:05"
        );
        assert!(Period::Day.matcher().matches_description(&description));
        assert!(!Period::Week.matcher().matches_description(&description));
    }
}
