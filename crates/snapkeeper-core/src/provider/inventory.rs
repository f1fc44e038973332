//! File-backed provider. The inventory is a JSON document listing volumes and
//! their snapshots; every mutation is written straight back to disk.

use super::{Snapshot, SnapshotStore, TagMap, Volume, VolumeDirectory};
use crate::error::Error;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryState {
    #[serde(default)]
    pub volumes: Vec<Volume>,
    #[serde(default)]
    pub snapshots: Vec<Snapshot>,
    #[serde(default)]
    pub next_snapshot_seq: u64,
}

pub struct InventoryProvider {
    path: Option<PathBuf>,
    state: Mutex<InventoryState>,
}

impl InventoryProvider {
    /// Load the inventory at `path`. A missing file is an error: an empty
    /// inventory would silently report "no volumes found".
    pub fn open(path: &Path) -> Result<Self, Error> {
        let raw = fs::read_to_string(path)?;
        let state: InventoryState = serde_json::from_str(&raw)?;
        debug!(
            "Inventory loaded: {} volumes, {} snapshots",
            state.volumes.len(),
            state.snapshots.len()
        );
        Ok(Self {
            path: Some(path.to_path_buf()),
            state: Mutex::new(state),
        })
    }

    /// An inventory that lives only in memory.
    pub fn in_memory(state: InventoryState) -> Self {
        Self {
            path: None,
            state: Mutex::new(state),
        }
    }

    pub fn snapshot_state(&self) -> Result<InventoryState, Error> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, InventoryState>, Error> {
        self.state
            .lock()
            .map_err(|_| Error::Provider("inventory lock poisoned".to_string()))
    }

    /// Apply `change` to a copy of the state and swap it in only once the copy
    /// is on disk, so a failed write leaves memory and file untouched.
    fn commit<T>(
        &self,
        change: impl FnOnce(&mut InventoryState) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut guard = self.lock()?;
        let mut next = guard.clone();
        let value = change(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(value)
    }

    fn persist(&self, state: &InventoryState) -> Result<(), Error> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(state)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl VolumeDirectory for InventoryProvider {
    fn list_volumes(&self, tag_key: &str, tag_value: &str) -> Result<Vec<Volume>, Error> {
        let state = self.lock()?;
        Ok(state
            .volumes
            .iter()
            .filter(|v| v.tags.get(tag_key).map(String::as_str) == Some(tag_value))
            .cloned()
            .collect())
    }

    fn get_tags(&self, resource_id: &str) -> Result<TagMap, Error> {
        let state = self.lock()?;
        if let Some(volume) = state.volumes.iter().find(|v| v.id == resource_id) {
            return Ok(volume.tags.clone());
        }
        if let Some(snapshot) = state.snapshots.iter().find(|s| s.id == resource_id) {
            return Ok(snapshot.tags.clone());
        }
        Err(Error::Provider(format!("unknown resource: {}", resource_id)))
    }
}

impl SnapshotStore for InventoryProvider {
    fn create_snapshot(&self, volume_id: &str, description: &str) -> Result<Snapshot, Error> {
        self.commit(|state| {
            if !state.volumes.iter().any(|v| v.id == volume_id) {
                return Err(Error::VolumeNotFound(volume_id.to_string()));
            }
            state.next_snapshot_seq += 1;
            let snapshot = Snapshot {
                id: format!("snap-{:08x}", state.next_snapshot_seq),
                volume_id: volume_id.to_string(),
                description: description.to_string(),
                start_time: Utc::now(),
                tags: TagMap::new(),
            };
            state.snapshots.push(snapshot.clone());
            Ok(snapshot)
        })
    }

    fn list_snapshots(&self, volume_id: &str) -> Result<Vec<Snapshot>, Error> {
        let state = self.lock()?;
        Ok(state
            .snapshots
            .iter()
            .filter(|s| s.volume_id == volume_id)
            .cloned()
            .collect())
    }

    fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), Error> {
        self.commit(|state| {
            let before = state.snapshots.len();
            state.snapshots.retain(|s| s.id != snapshot_id);
            if state.snapshots.len() == before {
                return Err(Error::SnapshotNotFound(snapshot_id.to_string()));
            }
            Ok(())
        })
    }

    fn add_tag(&self, resource_id: &str, key: &str, value: &str) -> Result<(), Error> {
        self.commit(|state| {
            let tags = if let Some(volume) = state.volumes.iter_mut().find(|v| v.id == resource_id) {
                &mut volume.tags
            } else if let Some(snapshot) = state.snapshots.iter_mut().find(|s| s.id == resource_id) {
                &mut snapshot.tags
            } else {
                return Err(Error::Provider(format!("unknown resource: {}", resource_id)));
            };
            tags.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }
}
