//! Engine configuration.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine configuration, loadable from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Configuration version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Merge limits.
    #[serde(default)]
    pub merge: MergeSettings,

    /// Summary dispatch settings.
    #[serde(default)]
    pub summary: SummarySettings,
}

fn default_version() -> u32 {
    1
}

/// Limits applied before grouping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeSettings {
    /// Upper bound on the number of events considered in one merge.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

fn default_max_batch_size() -> usize {
    500
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
        }
    }
}

/// Settings for the asynchronous summary path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarySettings {
    /// Capacity of the bounded summary job queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    64
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            merge: MergeSettings::default(),
            summary: SummarySettings::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file. Missing fields fall back to
    /// their defaults.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }
}
