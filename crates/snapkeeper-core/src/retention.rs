//! Retention selection: which snapshots of a period fall outside the
//! keep-count.

use crate::period::{Period, PeriodMatcher};
use crate::provider::Snapshot;

/// Keep-count per period. `None` means the period is never pruned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub keep_hour: Option<usize>,
    pub keep_four_hours: Option<usize>,
    pub keep_day: Option<usize>,
    pub keep_week: Option<usize>,
    pub keep_month: Option<usize>,
}

impl RetentionPolicy {
    pub fn keep_for(&self, period: Period) -> Option<usize> {
        match period {
            Period::Hour => self.keep_hour,
            Period::FourHours => self.keep_four_hours,
            Period::Day => self.keep_day,
            Period::Week => self.keep_week,
            Period::Month => self.keep_month,
        }
    }
}

/// Snapshots of `matcher`'s period in deletion order, oldest first, leaving
/// the newest `keep` untouched. Ties on start time are broken by id.
pub fn select_for_deletion<'a>(
    snapshots: &'a [Snapshot],
    matcher: &PeriodMatcher,
    keep: Option<usize>,
) -> Vec<&'a Snapshot> {
    let Some(keep) = keep else {
        return Vec::new();
    };

    let mut relevant: Vec<&Snapshot> = snapshots.iter().filter(|s| matcher.matches(s)).collect();
    relevant.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));

    let excess = relevant.len().saturating_sub(keep);
    relevant.truncate(excess);
    relevant
}
