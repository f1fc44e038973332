//! Period classification.
//!
//! A snapshot belongs to a period when it carries the `managed-period` tag for
//! that period. Snapshots taken before the tag existed are recognised by their
//! description instead: it must start with the frequency label (or the bare
//! period token used by older releases) and contain [`SNAPSHOT_MARKER`].

use crate::error::Error;
use crate::provider::Snapshot;
use std::fmt;
use std::str::FromStr;

/// Substring identifying descriptions written by this tool.
pub const SNAPSHOT_MARKER: &str = "taken by the snapshot script";

/// Tag carrying the period token on snapshots created by this tool.
pub const MANAGED_PERIOD_TAG: &str = "managed-period";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Hour,
    FourHours,
    Day,
    Week,
    Month,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::Hour,
        Period::FourHours,
        Period::Day,
        Period::Week,
        Period::Month,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Period::Hour => "hour",
            Period::FourHours => "four_hours",
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
        }
    }

    pub fn frequency_label(self) -> &'static str {
        match self {
            Period::Hour => "hourly",
            Period::FourHours => "four-hourly",
            Period::Day => "daily",
            Period::Week => "weekly",
            Period::Month => "monthly",
        }
    }

    /// Name of the keep-count setting for this period, e.g. `keep_day`.
    pub fn keep_key(self) -> String {
        format!("keep_{}", self.token())
    }

    pub fn matcher(self) -> PeriodMatcher {
        PeriodMatcher { period: self }
    }

    pub fn classify(self) -> (&'static str, PeriodMatcher) {
        (self.frequency_label(), self.matcher())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|period| period.token() == s)
            .ok_or_else(|| Error::UnknownPeriod(s.to_string()))
    }
}

/// Decides whether a snapshot belongs to one period and was made by this tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodMatcher {
    period: Period,
}

impl PeriodMatcher {
    pub fn period(&self) -> Period {
        self.period
    }

    pub fn matches(&self, snapshot: &Snapshot) -> bool {
        match snapshot.tags.get(MANAGED_PERIOD_TAG) {
            Some(token) => token == self.period.token(),
            None => self.matches_description(&snapshot.description),
        }
    }

    pub fn matches_description(&self, description: &str) -> bool {
        let labelled = description.starts_with(self.period.frequency_label())
            || description.starts_with(self.period.token());
        labelled && description.contains(SNAPSHOT_MARKER)
    }
}

/// Resolve a period token into its frequency label and matcher.
pub fn classify(token: &str) -> Result<(&'static str, PeriodMatcher), Error> {
    token.parse::<Period>().map(Period::classify)
}
