//! EC2/SNS backend. The SDK is async; calls are driven to completion on a
//! private current-thread runtime so the rest of the crate stays blocking.

use super::{Backend, NotificationTarget, Notifier, Snapshot, SnapshotStore, TagMap, Volume, VolumeDirectory};
use crate::config::AppConfig;
use crate::error::Error;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ec2::config::Credentials;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::{Filter, Tag};
use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;
use aws_smithy_runtime_api::client::http::SharedHttpClient;
use chrono::{DateTime, Utc};
use hyper::client::HttpConnector;
use hyper::Uri;
use hyper_proxy::{Intercept, Proxy, ProxyConnector};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

fn provider_error<E: std::error::Error>(err: E) -> Error {
    Error::Provider(DisplayErrorContext(err).to_string())
}

fn to_utc(time: Option<&aws_sdk_ec2::primitives::DateTime>) -> Option<DateTime<Utc>> {
    time.and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos()))
}

fn tag_map(tags: &[Tag]) -> TagMap {
    tags.iter()
        .filter_map(|t| Some((t.key()?.to_string(), t.value().unwrap_or_default().to_string())))
        .collect()
}

fn filter(name: &str, value: &str) -> Filter {
    Filter::builder().name(name).values(value).build()
}

/// HTTP client tunnelling every request through `proxy_uri`.
fn proxy_http_client(proxy_uri: &str) -> Result<SharedHttpClient, Error> {
    let uri: Uri = proxy_uri
        .parse()
        .map_err(|e| Error::InvalidConfig(format!("invalid proxy {}: {}", proxy_uri, e)))?;
    let connector = ProxyConnector::from_proxy(HttpConnector::new(), Proxy::new(Intercept::All, uri))?;
    Ok(HyperClientBuilder::new().build(connector))
}

pub struct Ec2Provider {
    runtime: Arc<Runtime>,
    client: aws_sdk_ec2::Client,
}

pub struct SnsNotifier {
    runtime: Arc<Runtime>,
    client: aws_sdk_sns::Client,
}

pub fn connect(config: &AppConfig) -> Result<Backend, Error> {
    let runtime = Arc::new(
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?,
    );

    let region = config
        .region
        .clone()
        .ok_or_else(|| Error::InvalidConfig("region is required for the aws backend".to_string()))?;
    let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region));
    if let (Some(key), Some(secret)) = (&config.aws_access_key, &config.aws_secret_key) {
        loader = loader.credentials_provider(Credentials::new(
            key.clone(),
            secret.clone(),
            None,
            None,
            "snapkeeper-config",
        ));
    }
    if let Some(endpoint) = &config.region_endpoint {
        loader = loader.endpoint_url(endpoint.clone());
    }
    if let Some(proxy) = config.proxy_uri() {
        info!("Using proxy {}", proxy);
        loader = loader.http_client(proxy_http_client(&proxy)?);
    }

    info!("Connecting to AWS");
    let sdk_config = runtime.block_on(loader.load());

    let ec2 = Arc::new(Ec2Provider {
        runtime: runtime.clone(),
        client: aws_sdk_ec2::Client::new(&sdk_config),
    });

    let notifications = config.notification_channel.as_ref().map(|arn| {
        info!("Connecting to SNS");
        NotificationTarget {
            notifier: Arc::new(SnsNotifier {
                runtime: runtime.clone(),
                client: aws_sdk_sns::Client::new(&sdk_config),
            }) as Arc<dyn Notifier>,
            channel: arn.clone(),
        }
    });

    Ok(Backend {
        directory: ec2.clone(),
        store: ec2,
        notifications,
    })
}

impl VolumeDirectory for Ec2Provider {
    fn list_volumes(&self, tag_key: &str, tag_value: &str) -> Result<Vec<Volume>, Error> {
        let mut pages = self
            .client
            .describe_volumes()
            .filters(filter(&format!("tag:{}", tag_key), tag_value))
            .into_paginator()
            .send();
        self.runtime.block_on(async {
            let mut volumes = Vec::new();
            while let Some(page) = pages.next().await {
                let page = page.map_err(provider_error)?;
                volumes.extend(page.volumes().iter().filter_map(|v| {
                    Some(Volume {
                        id: v.volume_id()?.to_string(),
                        tags: tag_map(v.tags()),
                    })
                }));
            }
            Ok::<_, Error>(volumes)
        })
    }

    fn get_tags(&self, resource_id: &str) -> Result<TagMap, Error> {
        let mut pages = self
            .client
            .describe_tags()
            .filters(filter("resource-id", resource_id))
            .into_paginator()
            .send();
        self.runtime.block_on(async {
            let mut tags = TagMap::new();
            while let Some(page) = pages.next().await {
                let page = page.map_err(provider_error)?;
                tags.extend(page.tags().iter().filter_map(|t| {
                    Some((t.key()?.to_string(), t.value().unwrap_or_default().to_string()))
                }));
            }
            Ok::<_, Error>(tags)
        })
    }
}

impl SnapshotStore for Ec2Provider {
    fn create_snapshot(&self, volume_id: &str, description: &str) -> Result<Snapshot, Error> {
        let output = self
            .runtime
            .block_on(
                self.client
                    .create_snapshot()
                    .volume_id(volume_id)
                    .description(description)
                    .send(),
            )
            .map_err(provider_error)?;
        let id = output
            .snapshot_id()
            .ok_or_else(|| Error::Provider(format!("no snapshot id returned for {}", volume_id)))?;
        Ok(Snapshot {
            id: id.to_string(),
            volume_id: volume_id.to_string(),
            description: description.to_string(),
            // The snapshot exists either way; a missing start time just means "now".
            start_time: to_utc(output.start_time()).unwrap_or_else(Utc::now),
            tags: tag_map(output.tags()),
        })
    }

    /// Snapshots without a start time cannot be ordered and are left out, so
    /// they are never pruned.
    fn list_snapshots(&self, volume_id: &str) -> Result<Vec<Snapshot>, Error> {
        let mut pages = self
            .client
            .describe_snapshots()
            .owner_ids("self")
            .filters(filter("volume-id", volume_id))
            .into_paginator()
            .send();
        self.runtime.block_on(async {
            let mut snapshots = Vec::new();
            while let Some(page) = pages.next().await {
                let page = page.map_err(provider_error)?;
                for s in page.snapshots() {
                    let Some(id) = s.snapshot_id() else {
                        continue;
                    };
                    let Some(start_time) = to_utc(s.start_time()) else {
                        warn!("Snapshot {} has no start time, leaving it out of retention", id);
                        continue;
                    };
                    snapshots.push(Snapshot {
                        id: id.to_string(),
                        volume_id: s.volume_id().unwrap_or(volume_id).to_string(),
                        description: s.description().unwrap_or_default().to_string(),
                        start_time,
                        tags: tag_map(s.tags()),
                    });
                }
            }
            debug!("{} snapshots listed for {}", snapshots.len(), volume_id);
            Ok::<_, Error>(snapshots)
        })
    }

    fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), Error> {
        self.runtime
            .block_on(self.client.delete_snapshot().snapshot_id(snapshot_id).send())
            .map_err(provider_error)?;
        Ok(())
    }

    fn add_tag(&self, resource_id: &str, key: &str, value: &str) -> Result<(), Error> {
        self.runtime
            .block_on(
                self.client
                    .create_tags()
                    .resources(resource_id)
                    .tags(Tag::builder().key(key).value(value).build())
                    .send(),
            )
            .map_err(provider_error)?;
        Ok(())
    }
}

impl Notifier for SnsNotifier {
    fn publish(&self, channel_id: &str, body: &str, subject: &str) -> Result<(), Error> {
        self.runtime
            .block_on(
                self.client
                    .publish()
                    .topic_arn(channel_id)
                    .message(body)
                    .subject(subject)
                    .send(),
            )
            .map_err(provider_error)?;
        Ok(())
    }
}
