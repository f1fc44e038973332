use crate::error::Error;
use crate::period::MANAGED_PERIOD_TAG;
use crate::provider::{SnapshotStore, TagMap, VolumeDirectory};
use tracing::{debug, warn};

/// Tag keys with this prefix belong to the provider and are never copied.
pub const RESERVED_TAG_PREFIX: &str = "aws:";

/// Read a resource's tags, dropping provider-reserved keys and the
/// period tag this tool manages itself.
pub fn read_tags(directory: &dyn VolumeDirectory, resource_id: &str) -> Result<TagMap, Error> {
    let tags = directory.get_tags(resource_id)?;
    Ok(tags
        .into_iter()
        .filter(|(key, _)| !key.starts_with(RESERVED_TAG_PREFIX) && key != MANAGED_PERIOD_TAG)
        .collect())
}

/// Tags from `source` that are missing on `target` or carry a different value.
pub fn pending_tags<'a>(source: &'a TagMap, target: &TagMap) -> Vec<(&'a str, &'a str)> {
    source
        .iter()
        .filter(|(key, value)| target.get(*key) != Some(*value))
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MirrorReport {
    pub applied: usize,
    pub failed: usize,
}

/// Copy `source` tags onto `target_id`. Tags on the target that are absent
/// from `source` are left alone. A tag that fails to apply is logged and the
/// rest are still attempted.
pub fn mirror(
    source: &TagMap,
    target_id: &str,
    target_tags: &TagMap,
    store: &dyn SnapshotStore,
) -> MirrorReport {
    let mut report = MirrorReport::default();
    for (key, value) in pending_tags(source, target_tags) {
        match store.add_tag(target_id, key, value) {
            Ok(()) => {
                debug!("Tagged {} with {}={}", target_id, key, value);
                report.applied += 1;
            }
            Err(e) => {
                warn!("Could not tag {} with {}={}: {}", target_id, key, value, e);
                report.failed += 1;
            }
        }
    }
    report
}
