use crate::config::AppConfig;
use crate::period::Period;
use crate::processor::{VolumeProcessor, TIMESTAMP_FORMAT};
use crate::progress::RunReporter;
use crate::provider::{Backend, NotificationTarget, SnapshotStore, Volume, VolumeDirectory};
use crate::retention::RetentionPolicy;
use crate::throttle::{FixedDelay, Throttle};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

pub const ERROR_PREAMBLE: &str =
    "Some of the volumes could not be processed. See the logs for more detailed info.\n\n";
pub const ERROR_SUBJECT: &str = "Error with volume snapshots";
pub const SUMMARY_SUBJECT: &str = "Finished taking volume snapshots";

/// Counters and message buffers for one invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub count_total: usize,
    pub count_success: usize,
    pub count_errors: usize,
    pub total_created: usize,
    pub total_deleted: usize,
    pub messages: String,
    pub errors: String,
}

impl RunResult {
    fn note(&mut self, msg: &str) {
        info!("{}", msg);
        self.messages.push_str(msg);
        self.messages.push('\n');
    }

    fn note_error(&mut self, msg: &str) {
        error!("{}", msg);
        self.errors.push_str(msg);
        self.errors.push('\n');
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Body of the error notification, or `None` on a clean run.
    pub fn error_report(&self) -> Option<String> {
        self.has_errors()
            .then(|| format!("{}{}", ERROR_PREAMBLE, self.errors))
    }

    fn summary(&self, timestamp: &str) -> String {
        format!(
            "Finished taking snapshots at {} with {} snapshots out of {} possible.\n\
             Total snapshots created: {}\n\
             Total snapshots deleted: {}\n\
             Total snapshots errors: {}\n",
            timestamp,
            self.count_success,
            self.count_total,
            self.total_created,
            self.total_deleted,
            self.count_errors,
        )
    }
}

/// Runs one period over every volume carrying the selection tag.
pub struct SnapshotEngine {
    directory: Arc<dyn VolumeDirectory>,
    store: Arc<dyn SnapshotStore>,
    notifications: Option<NotificationTarget>,
    tag_name: String,
    tag_value: String,
    retention: RetentionPolicy,
    throttle: Box<dyn Throttle>,
}

impl SnapshotEngine {
    pub fn new(
        directory: Arc<dyn VolumeDirectory>,
        store: Arc<dyn SnapshotStore>,
        tag_name: &str,
        tag_value: &str,
    ) -> Self {
        Self {
            directory,
            store,
            notifications: None,
            tag_name: tag_name.to_string(),
            tag_value: tag_value.to_string(),
            retention: RetentionPolicy::default(),
            throttle: Box::new(FixedDelay::from_secs(3)),
        }
    }

    pub fn from_config(config: &AppConfig, backend: Backend) -> Self {
        let engine = Self::new(
            backend.directory,
            backend.store,
            &config.tag_name,
            &config.tag_value,
        )
        .with_retention(config.retention())
        .with_throttle(FixedDelay::from_secs(config.throttle_secs));
        match backend.notifications {
            Some(target) => engine.with_notifications(target),
            None => engine,
        }
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_throttle(mut self, throttle: impl Throttle + 'static) -> Self {
        self.throttle = Box::new(throttle);
        self
    }

    pub fn with_notifications(mut self, target: NotificationTarget) -> Self {
        self.notifications = Some(target);
        self
    }

    /// Snapshot and prune every selected volume for `period`, then send the
    /// notifications. Per-volume failures are recorded in the result and never
    /// stop the remaining volumes.
    pub fn run(&self, period: Period, reporter: &dyn RunReporter) -> RunResult {
        let mut result = RunResult::default();
        let (label, matcher) = period.classify();
        let keep = self.retention.keep_for(period);

        result.note(&format!(
            "Started taking {} snapshots at {}",
            label,
            Utc::now().format(TIMESTAMP_FORMAT)
        ));

        info!(
            "Finding volumes that match the requested tag ({{ \"tag:{}\": \"{}\" }})",
            self.tag_name, self.tag_value
        );
        let volumes: Vec<Volume> = match self.directory.list_volumes(&self.tag_name, &self.tag_value) {
            Ok(volumes) => volumes,
            Err(e) => {
                result.note_error(&format!("Volumes could not be listed: {}", e));
                Vec::new()
            }
        };
        result.count_total = volumes.len();
        reporter.on_run_start(period, volumes.len());

        let processor =
            VolumeProcessor::new(self.directory.as_ref(), self.store.as_ref(), matcher, keep);

        for (index, volume) in volumes.iter().enumerate() {
            reporter.on_volume_start(index, volumes.len(), &volume.id);
            match processor.process(volume) {
                Ok(outcome) => {
                    result.count_success += 1;
                    result.total_created += usize::from(outcome.snapshot_id.is_some());
                    result.total_deleted += outcome.deleted;
                    reporter.on_volume_complete(&volume.id, &outcome);
                }
                Err(failure) => {
                    result.count_errors += 1;
                    result.total_created += usize::from(failure.partial.snapshot_id.is_some());
                    result.total_deleted += failure.partial.deleted;
                    result.note_error(&format!("Error in processing volume with id: {}", volume.id));
                    error!("{}", failure.error);
                    reporter.on_volume_error(&volume.id, &failure.error.to_string());
                }
            }

            if index + 1 < volumes.len() {
                self.throttle.pause();
            }
        }

        let summary = result.summary(&Utc::now().format(TIMESTAMP_FORMAT).to_string());
        result.messages.push_str(&summary);

        if volumes.is_empty() {
            result.note_error("No volumes found");
        }

        self.dispatch(&result);
        info!("{}", summary.trim_end());
        reporter.on_run_complete(result.count_success, result.count_total, result.count_errors);

        result
    }

    /// Best effort: a failed publish is logged and does not change the outcome.
    fn dispatch(&self, result: &RunResult) {
        let Some(target) = &self.notifications else {
            return;
        };

        if let Some(body) = result.error_report() {
            if let Err(e) = target.notifier.publish(&target.channel, &body, ERROR_SUBJECT) {
                error!("Could not publish error notification to {}: {}", target.channel, e);
            }
        }
        if let Err(e) = target
            .notifier
            .publish(&target.channel, &result.messages, SUMMARY_SUBJECT)
        {
            error!("Could not publish summary notification to {}: {}", target.channel, e);
        }
    }
}
