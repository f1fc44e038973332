use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown period '{0}', expected one of: hour, four_hours, day, week, month")]
    UnknownPeriod(String),

    #[error("Inventory error: {0}")]
    Inventory(#[from] serde_json::Error),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Volume not found: {0}")]
    VolumeNotFound(String),

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),
}
