// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Generation knobs: DAG shape, table length ranges and choice weights.
//!
//! Every field has a default, so a config file only needs the values it
//! changes. Weights are relative integers, not percentages.
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matrix::DagShape;

/// Number of size buckets: 512, 1024, ... 65536.
pub const SIZE_BUCKETS: usize = 8;

/// Smallest table size, used when no size distribution is configured.
pub const DEFAULT_TABLE_SIZE: u32 = 512;

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error while reading.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The values parse but cannot drive a run.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Inclusive length range a list length is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LenRange {
    /// Minimum length.
    pub min: usize,
    /// Maximum length.
    pub max: usize,
}

impl LenRange {
    /// Builds `min..=max`.
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

/// Table synthesis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Requested key-list length.
    pub key_len: LenRange,
    /// Requested action-list length.
    pub action_len: LenRange,
    /// Weight of enforcing an upstream dependency for a key slot.
    pub dependency_enforce: u32,
    /// Weight of synthesizing a free key instead.
    pub dependency_not_enforce: u32,
    /// Weight of `exact`.
    pub match_exact: u32,
    /// Weight of `lpm`.
    pub match_lpm: u32,
    /// Weight of `ternary`.
    pub match_ternary: u32,
    /// Weights for sizes 512, 1024, ... 65536. `None` means always 512.
    pub size_weights: Option<Vec<u32>>,
    /// When `false`, ancestor fields and pre-assigned actions are ignored.
    pub dependency_aware: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            key_len: LenRange::new(0, 5),
            action_len: LenRange::new(0, 3),
            dependency_enforce: 50,
            dependency_not_enforce: 50,
            match_exact: 60,
            match_lpm: 20,
            match_ternary: 20,
            size_weights: None,
            dependency_aware: true,
        }
    }
}

impl TableConfig {
    /// Match-kind weights in [`crate::ir::MatchKind::ALL`] order.
    pub fn match_weights(&self) -> [u32; 3] {
        [self.match_exact, self.match_lpm, self.match_ternary]
    }
}

/// Top-level configuration for one generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    /// Random DAG parameters.
    pub dag: DagShape,
    /// Per-table synthesis settings.
    pub tables: TableConfig,
}

impl GenConfig {
    /// Rejects settings that cannot drive a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dag
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let t = &self.tables;
        for (label, range) in [("key_len", t.key_len), ("action_len", t.action_len)] {
            if range.min > range.max {
                return Err(ConfigError::Invalid(format!(
                    "{label}: min {} exceeds max {}",
                    range.min, range.max
                )));
            }
        }
        if let Some(weights) = &t.size_weights {
            if weights.len() > SIZE_BUCKETS {
                return Err(ConfigError::Invalid(format!(
                    "size_weights: {} buckets given, at most {SIZE_BUCKETS} allowed",
                    weights.len()
                )));
            }
        }
        Ok(())
    }

    /// Parses and validates a JSON document.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let bytes = fs::read(path)?;
        Self::from_json_slice(&bytes)
    }

    /// Serializes to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
