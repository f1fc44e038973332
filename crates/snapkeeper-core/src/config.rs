use crate::error::Error;
use crate::retention::RetentionPolicy;
use config::{Config, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local JSON inventory file.
    Inventory,
    /// EC2 + SNS, requires the `aws` feature.
    Aws,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_backend")]
    pub backend: BackendKind,
    #[serde(default = "default_inventory_path")]
    pub inventory_path: PathBuf,

    pub aws_access_key: Option<String>,
    pub aws_secret_key: Option<String>,
    pub region: Option<String>,
    pub region_endpoint: Option<String>,
    pub proxy_host: Option<String>,
    pub proxy_port: Option<u16>,

    /// Volumes carrying `tag_name = tag_value` are snapshotted.
    pub tag_name: String,
    pub tag_value: String,

    pub notification_channel: Option<String>,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    #[serde(default = "default_throttle_secs")]
    pub throttle_secs: u64,

    pub keep_hour: Option<usize>,
    pub keep_four_hours: Option<usize>,
    pub keep_day: Option<usize>,
    pub keep_week: Option<usize>,
    pub keep_month: Option<usize>,
}

fn default_backend() -> BackendKind {
    BackendKind::Inventory
}

fn default_inventory_path() -> PathBuf {
    PathBuf::from("./inventory.json")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("./logs/snapkeeper.log")
}

fn default_throttle_secs() -> u64 {
    3
}

impl AppConfig {
    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), Error> {
        if self.tag_name.trim().is_empty() {
            return Err(Error::InvalidConfig("tag_name must not be empty".to_string()));
        }
        if self.tag_value.trim().is_empty() {
            return Err(Error::InvalidConfig("tag_value must not be empty".to_string()));
        }
        match (&self.aws_access_key, &self.aws_secret_key) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(Error::InvalidConfig(
                    "aws_access_key and aws_secret_key must be set together".to_string(),
                ));
            }
            _ => {}
        }
        if self.proxy_port.is_some() && self.proxy_host.is_none() {
            return Err(Error::InvalidConfig(
                "proxy_port is set but proxy_host is missing".to_string(),
            ));
        }
        if self.backend == BackendKind::Aws && self.region.is_none() {
            return Err(Error::InvalidConfig(
                "region is required for the aws backend".to_string(),
            ));
        }
        if let Some(channel) = &self.notification_channel {
            if channel.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "notification_channel must not be empty when set".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy {
            keep_hour: self.keep_hour,
            keep_four_hours: self.keep_four_hours,
            keep_day: self.keep_day,
            keep_week: self.keep_week,
            keep_month: self.keep_month,
        }
    }

    /// Proxy URI for provider traffic, e.g. `http://proxy.internal:3128`.
    pub fn proxy_uri(&self) -> Option<String> {
        let host = self.proxy_host.as_deref()?.trim();
        let base = if host.contains("://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", host)
        };
        Some(match self.proxy_port {
            Some(port) => format!("{}:{}", base, port),
            None => base,
        })
    }
}

/// Load `Config.toml` (or `path` when given), then `SNAPKEEPER_*` environment
/// variables on top, and validate the result.
pub fn load_configuration(path: Option<&Path>) -> Result<AppConfig, Error> {
    let file_source = match path {
        Some(path) => ConfigFile::from(path).required(true),
        None => ConfigFile::with_name("Config").required(false),
    };
    let builder = Config::builder()
        .add_source(file_source)
        .add_source(Environment::with_prefix("SNAPKEEPER"))
        .build()?;
    let config = builder.try_deserialize::<AppConfig>()?;
    config.validate()?;
    Ok(config)
}
