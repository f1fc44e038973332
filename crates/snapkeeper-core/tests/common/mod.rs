#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use snapkeeper_core::provider::inventory::{InventoryProvider, InventoryState};
use snapkeeper_core::provider::{Notifier, Snapshot, SnapshotStore, TagMap, Volume, VolumeDirectory};
use snapkeeper_core::Error;
use std::collections::HashSet;
use std::sync::Mutex;

pub const TAG_NAME: &str = "MakeSnapshot";
pub const TAG_VALUE: &str = "True";

pub fn tags(pairs: &[(&str, &str)]) -> TagMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn volume(id: &str) -> Volume {
    Volume {
        id: id.to_string(),
        tags: tags(&[(TAG_NAME, TAG_VALUE), ("Name", id)]),
    }
}

pub fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
}

/// A snapshot as an older release would have left it: no period tag.
pub fn legacy_snapshot(id: &str, volume_id: &str, label: &str, day: u32) -> Snapshot {
    Snapshot {
        id: id.to_string(),
        volume_id: volume_id.to_string(),
        description: format!(
            "{} snapshot for {} taken by the snapshot script at {:02}-01-2024 12:00:00",
            label, volume_id, day
        ),
        start_time: at(day),
        tags: TagMap::new(),
    }
}

/// Wraps an in-memory inventory and fails chosen calls.
pub struct ScriptedProvider {
    pub inner: InventoryProvider,
    pub fail_list_volumes: bool,
    pub fail_create: HashSet<String>,
    pub fail_list_snapshots: HashSet<String>,
    pub fail_delete: HashSet<String>,
    pub fail_tag_keys: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(volumes: Vec<Volume>, snapshots: Vec<Snapshot>) -> Self {
        Self {
            inner: InventoryProvider::in_memory(InventoryState {
                volumes,
                snapshots,
                next_snapshot_seq: 100,
            }),
            fail_list_volumes: false,
            fail_create: HashSet::new(),
            fail_list_snapshots: HashSet::new(),
            fail_delete: HashSet::new(),
            fail_tag_keys: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.inner.snapshot_state().unwrap().snapshots
    }

    pub fn snapshots_of(&self, volume_id: &str) -> Vec<Snapshot> {
        self.snapshots()
            .into_iter()
            .filter(|s| s.volume_id == volume_id)
            .collect()
    }
}

impl VolumeDirectory for ScriptedProvider {
    fn list_volumes(&self, tag_key: &str, tag_value: &str) -> Result<Vec<Volume>, Error> {
        self.record("list_volumes".to_string());
        if self.fail_list_volumes {
            return Err(Error::Provider("request limit exceeded".to_string()));
        }
        self.inner.list_volumes(tag_key, tag_value)
    }

    fn get_tags(&self, resource_id: &str) -> Result<TagMap, Error> {
        self.record(format!("get_tags:{}", resource_id));
        self.inner.get_tags(resource_id)
    }
}

impl SnapshotStore for ScriptedProvider {
    fn create_snapshot(&self, volume_id: &str, description: &str) -> Result<Snapshot, Error> {
        self.record(format!("create:{}", volume_id));
        if self.fail_create.contains(volume_id) {
            return Err(Error::Provider(format!("snapshot limit reached for {}", volume_id)));
        }
        self.inner.create_snapshot(volume_id, description)
    }

    fn list_snapshots(&self, volume_id: &str) -> Result<Vec<Snapshot>, Error> {
        self.record(format!("list_snapshots:{}", volume_id));
        if self.fail_list_snapshots.contains(volume_id) {
            return Err(Error::Provider("throttled".to_string()));
        }
        self.inner.list_snapshots(volume_id)
    }

    fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), Error> {
        self.record(format!("delete:{}", snapshot_id));
        if self.fail_delete.contains(snapshot_id) {
            return Err(Error::Provider(format!("{} is in use by an AMI", snapshot_id)));
        }
        self.inner.delete_snapshot(snapshot_id)
    }

    fn add_tag(&self, resource_id: &str, key: &str, value: &str) -> Result<(), Error> {
        self.record(format!("tag:{}:{}", resource_id, key));
        if self.fail_tag_keys.contains(key) {
            return Err(Error::Provider(format!("invalid tag key {}", key)));
        }
        self.inner.add_tag(resource_id, key, value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub channel: String,
    pub body: String,
    pub subject: String,
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: bool,
    pub published: Mutex<Vec<Published>>,
}

impl RecordingNotifier {
    pub fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn publish(&self, channel_id: &str, body: &str, subject: &str) -> Result<(), Error> {
        self.published.lock().unwrap().push(Published {
            channel: channel_id.to_string(),
            body: body.to_string(),
            subject: subject.to_string(),
        });
        if self.fail {
            return Err(Error::Provider("topic does not exist".to_string()));
        }
        Ok(())
    }
}
