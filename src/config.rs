//! Cluster configuration.
//!
//! Deserialised from TOML; every field has a default so an empty file (or no
//! file at all) yields a usable three-worker localhost setup. Loading only
//! parses; command-line overrides are layered on with `with_overrides`, which
//! validates the merged result.
//!
//! ```toml
//! workers = ["10.0.0.5:8000", "10.0.0.6:8000"]
//! max_in_flight = 64
//! per_worker_limit = 16
//! task_timeout_ms = 5000
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::coordinator::types::WorkerAddress;
use crate::error::{MatmulError, Result};

/// Port a worker binds to when none is given, and the base of the default
/// worker list.
pub const DEFAULT_WORKER_PORT: u16 = 8000;
pub const DEFAULT_WORKER_HOST: &str = "localhost";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    #[serde(default = "default_workers")]
    pub workers: Vec<WorkerAddress>,
    /// Total number of dispatch units running at once.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Maximum simultaneous connections opened to a single worker.
    #[serde(default = "default_per_worker_limit")]
    pub per_worker_limit: usize,
    /// Deadline for one round-trip (connect, send, receive).
    #[serde(default = "default_task_timeout_ms")]
    pub task_timeout_ms: u64,
}

fn default_workers() -> Vec<WorkerAddress> {
    (0..3)
        .map(|offset| WorkerAddress::new(DEFAULT_WORKER_HOST, DEFAULT_WORKER_PORT + offset))
        .collect()
}

fn default_max_in_flight() -> usize {
    64
}

fn default_per_worker_limit() -> usize {
    16
}

fn default_task_timeout_ms() -> u64 {
    5000
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_in_flight: default_max_in_flight(),
            per_worker_limit: default_per_worker_limit(),
            task_timeout_ms: default_task_timeout_ms(),
        }
    }
}

/// Values supplied on the command line. `None` (or an empty worker list)
/// keeps what the file or the defaults provide.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub workers: Vec<WorkerAddress>,
    pub max_in_flight: Option<usize>,
    pub per_worker_limit: Option<usize>,
    pub task_timeout_ms: Option<u64>,
}

impl ClusterConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::info!(
            "Loaded cluster config from {} ({} workers)",
            path.display(),
            config.workers.len()
        );
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| MatmulError::Config(e.to_string()))
    }

    /// Applies `overrides` on top of this config and validates the result.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self> {
        if !overrides.workers.is_empty() {
            self.workers = overrides.workers;
        }
        if let Some(value) = overrides.max_in_flight {
            self.max_in_flight = value;
        }
        if let Some(value) = overrides.per_worker_limit {
            self.per_worker_limit = value;
        }
        if let Some(value) = overrides.task_timeout_ms {
            self.task_timeout_ms = value;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers.is_empty() {
            return Err(MatmulError::Config("worker list is empty".to_string()));
        }
        if self.max_in_flight == 0 {
            return Err(MatmulError::Config("max_in_flight must be at least 1".to_string()));
        }
        if self.per_worker_limit == 0 {
            return Err(MatmulError::Config(
                "per_worker_limit must be at least 1".to_string(),
            ));
        }
        if self.task_timeout_ms == 0 {
            return Err(MatmulError::Config("task_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }
}
