//! Caller configuration: every tunable of the assembly core, with TOML
//! loading, validation and save support.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::core::tandem::TandemRepeatParams;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("configuration error: {message}")]
    Load { message: String },

    #[error("input/output error: {message}")]
    Io { message: String },

    #[error("validation error: {field} is invalid: {reason}")]
    Validation { field: String, reason: String },
}

impl From<ConfigError> for ConfigurationError {
    fn from(err: ConfigError) -> Self {
        ConfigurationError::Load { message: err.to_string() }
    }
}

/// Tunables of the somatic caller core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallerConfig {
    /// Smallest odd k tried for a window.
    pub min_k: usize,
    /// Largest k tried before the window is dropped.
    pub max_k: usize,
    /// Increment applied after a cycle or repeat restart.
    pub k_step: usize,
    /// Absolute per-node coverage floor.
    pub min_node_cov: u16,
    /// Fraction of the window's average coverage used as an extra floor.
    pub min_cov_ratio: f64,
    /// Minimum total sample count for a reference k-mer to anchor the
    /// source or sink.
    pub min_anchor_cov: u16,
    /// Tips shorter than this many unique k-mers are clipped.
    pub min_graph_tip_length: usize,
    /// Extra path length allowed past the reference anchor.
    pub max_indel_length: u32,
    /// Total builder visits allowed per path search.
    pub graph_traversal_limit: u32,
    /// Mismatch tolerance of the near-repeat check on enumerated paths.
    pub max_rpt_mismatch: usize,
    /// Tandem repeat thresholds.
    pub max_str_unit_length: usize,
    pub min_str_units: usize,
    pub min_str_len: usize,
    pub max_str_dist: usize,
    /// Base quality floor for the bq-pass coverage counters.
    pub min_base_quality: u8,
    /// Worker threads draining the window queue.
    pub num_workers: usize,
    /// When set, every component is serialized to Graphviz before and
    /// after pruning and after path enumeration.
    pub out_graphs_dir: Option<PathBuf>,
    /// Enables the linked-read scoring seam in path enumeration.
    pub tenx_mode: bool,
}

impl Default for CallerConfig {
    fn default() -> Self {
        CallerConfig {
            min_k: 11,
            max_k: 101,
            k_step: 10,
            min_node_cov: 2,
            min_cov_ratio: 0.01,
            min_anchor_cov: 5,
            min_graph_tip_length: 11,
            max_indel_length: 500,
            graph_traversal_limit: 100_000,
            max_rpt_mismatch: 2,
            max_str_unit_length: 4,
            min_str_units: 3,
            min_str_len: 7,
            max_str_dist: 300,
            min_base_quality: 17,
            num_workers: num_cpus::get(),
            out_graphs_dir: None,
            tenx_mode: false,
        }
    }
}

impl CallerConfig {
    /// Load from a TOML file, falling back to defaults for absent keys.
    pub fn load_from_file(path: &Path) -> Result<CallerConfig, ConfigurationError> {
        let config = Config::builder().add_source(File::from(path)).build()?;
        let loaded: CallerConfig = config.try_deserialize()?;
        loaded.validate()?;
        info!("loaded caller configuration from {}", path.display());
        Ok(loaded)
    }

    /// Write the effective configuration as pretty TOML.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigurationError> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigurationError::Io { message: format!("failed to serialize config: {e}") })?;
        std::fs::write(path, toml_string)
            .map_err(|e| ConfigurationError::Io { message: format!("failed to write {}: {e}", path.display()) })
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.min_k < 3 {
            return Err(ConfigurationError::Validation {
                field: "min_k".to_string(),
                reason: "must be at least 3".to_string(),
            });
        }
        if self.min_k > self.max_k {
            return Err(ConfigurationError::Validation {
                field: "min_k".to_string(),
                reason: "must not exceed max_k".to_string(),
            });
        }
        if self.k_step == 0 {
            return Err(ConfigurationError::Validation {
                field: "k_step".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.graph_traversal_limit == 0 {
            return Err(ConfigurationError::Validation {
                field: "graph_traversal_limit".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.max_str_unit_length == 0 {
            return Err(ConfigurationError::Validation {
                field: "max_str_unit_length".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// The tandem-repeat thresholds as one bundle.
    pub fn tandem_params(&self) -> TandemRepeatParams {
        TandemRepeatParams {
            max_unit_len: self.max_str_unit_length,
            min_units: self.min_str_units,
            min_len: self.min_str_len,
            max_dist: self.max_str_dist,
        }
    }
}
