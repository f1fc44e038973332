//! Capability interfaces for the cloud provider, plus the backends that
//! implement them.

pub mod inventory;
pub mod outbox;

#[cfg(feature = "aws")]
pub mod aws;

use crate::config::{AppConfig, BackendKind};
use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Tag key → value. Ordered so logs and notifications are stable.
pub type TagMap = BTreeMap<String, String>;

/// A block-storage volume as returned by the volume directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    #[serde(default)]
    pub tags: TagMap,
}

/// A point-in-time copy of a volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub volume_id: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub tags: TagMap,
}

pub trait VolumeDirectory: Send + Sync {
    /// Volumes whose tag `tag_key` equals `tag_value`, in provider order.
    fn list_volumes(&self, tag_key: &str, tag_value: &str) -> Result<Vec<Volume>, Error>;

    /// All tags of a volume or snapshot, unfiltered.
    fn get_tags(&self, resource_id: &str) -> Result<TagMap, Error>;
}

pub trait SnapshotStore: Send + Sync {
    fn create_snapshot(&self, volume_id: &str, description: &str) -> Result<Snapshot, Error>;
    fn list_snapshots(&self, volume_id: &str) -> Result<Vec<Snapshot>, Error>;
    fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), Error>;
    fn add_tag(&self, resource_id: &str, key: &str, value: &str) -> Result<(), Error>;
}

pub trait Notifier: Send + Sync {
    fn publish(&self, channel_id: &str, body: &str, subject: &str) -> Result<(), Error>;
}

/// A notifier bound to the channel it publishes to.
#[derive(Clone)]
pub struct NotificationTarget {
    pub notifier: Arc<dyn Notifier>,
    pub channel: String,
}

/// The collaborators a run needs, built from configuration.
pub struct Backend {
    pub directory: Arc<dyn VolumeDirectory>,
    pub store: Arc<dyn SnapshotStore>,
    pub notifications: Option<NotificationTarget>,
}

/// Build the backend selected by `config.backend`.
pub fn connect(config: &AppConfig) -> Result<Backend, Error> {
    match config.backend {
        BackendKind::Inventory => {
            info!("Opening inventory {}", config.inventory_path.display());
            let inventory = Arc::new(inventory::InventoryProvider::open(&config.inventory_path)?);
            let notifications = config.notification_channel.as_ref().map(|channel| {
                NotificationTarget {
                    notifier: Arc::new(outbox::OutboxNotifier) as Arc<dyn Notifier>,
                    channel: channel.clone(),
                }
            });
            Ok(Backend {
                directory: inventory.clone(),
                store: inventory,
                notifications,
            })
        }
        BackendKind::Aws => {
            #[cfg(feature = "aws")]
            {
                aws::connect(config)
            }
            #[cfg(not(feature = "aws"))]
            {
                Err(Error::InvalidConfig(
                    "aws backend support not enabled (build with --features aws)".to_string(),
                ))
            }
        }
    }
}
