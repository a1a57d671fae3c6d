use std::sync::PoisonError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwarmError {
    #[error("Task `{0}` has a weight of zero.")]
    ZeroWeight(String),

    #[error("No tasks registered.")]
    NoTasks,

    #[error("Invalid task weights: {0}")]
    InvalidWeights(#[from] rand::distributions::WeightedError),

    #[error("No target host configured (use `--host`).")]
    MissingHost,

    #[error("Invalid host: {0}")]
    InvalidHost(#[from] url::ParseError),

    #[error("Invalid host: unsupported scheme `{0}` (expected `http` or `https`).")]
    UnsupportedScheme(String),

    #[error("Spawn rate must be a positive number of at least one user per day, got {0}.")]
    InvalidSpawnRate(f64),

    #[error("Stats interval must be greater than zero.")]
    ZeroStatsInterval,

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Mutex is poisoned.")]
    PoisonData,

    #[error("Unable to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[cfg(feature = "metrics")]
    #[error("Unable to install metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

impl<T> From<PoisonError<T>> for SwarmError {
    fn from(_err: PoisonError<T>) -> Self {
        Self::PoisonData
    }
}
