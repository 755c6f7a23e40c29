//! Configuration management for batch feature extraction
//!
//! This module provides runtime configuration loading from JSON files so
//! worker counts, failure handling and the clip source can be changed
//! without recompiling. Every section has defaults and missing keys fall
//! back to them.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    pub classifier: ClassifierConfig,
}

/// What the batch pipeline does when a single clip fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure, keep processing the other clips
    #[default]
    Skip,
    /// Stop dispatching clips and return the error
    FailFast,
}

/// Batch pipeline parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker threads for per-clip extraction (0 = one per available core)
    pub workers: usize,
    /// Per-clip failure handling
    pub failure_policy: FailurePolicy,
    /// Extra decode attempts after a decode failure (computation is never retried)
    pub decode_retries: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            failure_policy: FailurePolicy::Skip,
            decode_retries: 0,
        }
    }
}

/// Clip source parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory holding the clips
    pub clip_dir: Option<PathBuf>,
    /// File extension of clips to enumerate (case-insensitive, no dot)
    pub extension: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            clip_dir: None,
            extension: "wav".to_string(),
        }
    }
}

/// Classification parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// JSON file with linear model weights
    pub model_path: Option<PathBuf>,
    /// Substring of a file name that marks the clip as music in ground truth
    pub music_marker: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            music_marker: "mu".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults (with a warning) when the
    /// file cannot be read or parsed.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from JSON file, failing on any read or parse error
    pub fn try_load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        log::info!("[Config] Loaded configuration from {:?}", path);
        Ok(config)
    }
}
