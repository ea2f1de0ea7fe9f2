use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{AlignmentStrategy, UID_LEN, ValueRange};
use crate::error::{ViewError, ViewResult};

use super::validation::validate_viewer_config;

/// Viewer bootstrap configuration.
///
/// Serializable so hosts can keep viewer setup next to their result folders.
/// Every field except `results_root` has a default, so `{"results_root": "."}`
/// is a complete config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    pub results_root: PathBuf,
    #[serde(default = "default_manifest_name")]
    pub manifest_name: String,
    #[serde(default = "default_group")]
    pub default_group: String,
    #[serde(default)]
    pub alignment: AlignmentStrategy,
    #[serde(default = "default_uid_len")]
    pub uid_len: usize,
    #[serde(default = "default_hidden_by_default")]
    pub hidden_by_default: bool,
    #[serde(default = "default_fallback_range")]
    pub fallback_position_range: ValueRange,
    #[serde(default = "default_fallback_range")]
    pub fallback_force_range: ValueRange,
    #[serde(default = "default_playback_speed")]
    pub playback_speed: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self::new("results")
    }
}

impl ViewerConfig {
    #[must_use]
    pub fn new(results_root: impl Into<PathBuf>) -> Self {
        Self {
            results_root: results_root.into(),
            manifest_name: default_manifest_name(),
            default_group: default_group(),
            alignment: AlignmentStrategy::default(),
            uid_len: default_uid_len(),
            hidden_by_default: default_hidden_by_default(),
            fallback_position_range: default_fallback_range(),
            fallback_force_range: default_fallback_range(),
            playback_speed: default_playback_speed(),
        }
    }

    #[must_use]
    pub fn with_manifest_name(mut self, manifest_name: impl Into<String>) -> Self {
        self.manifest_name = manifest_name.into();
        self
    }

    #[must_use]
    pub fn with_default_group(mut self, group: impl Into<String>) -> Self {
        self.default_group = group.into();
        self
    }

    #[must_use]
    pub fn with_alignment(mut self, alignment: AlignmentStrategy) -> Self {
        self.alignment = alignment;
        self
    }

    /// Whether freshly loaded documents start with every candidate hidden.
    #[must_use]
    pub fn with_hidden_by_default(mut self, hidden: bool) -> Self {
        self.hidden_by_default = hidden;
        self
    }

    #[must_use]
    pub fn with_fallback_ranges(mut self, position: ValueRange, force: ValueRange) -> Self {
        self.fallback_position_range = position;
        self.fallback_force_range = force;
        self
    }

    #[must_use]
    pub fn with_playback_speed(mut self, speed: f64) -> Self {
        self.playback_speed = speed;
        self
    }

    /// Parses and validates a JSON config.
    pub fn from_json_str(input: &str) -> ViewResult<Self> {
        let config: Self = serde_json::from_str(input)
            .map_err(|e| ViewError::InvalidConfig(format!("failed to parse config json: {e}")))?;
        validate_viewer_config(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> ViewResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            ViewError::InvalidConfig(format!("failed to read `{}`: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_pretty(&self) -> ViewResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ViewError::InvalidConfig(format!("failed to serialize config: {e}")))
    }

    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.results_root.join(&self.manifest_name)
    }
}

fn default_manifest_name() -> String {
    "files.json".to_owned()
}

fn default_group() -> String {
    "validation_group".to_owned()
}

fn default_uid_len() -> usize {
    UID_LEN
}

fn default_hidden_by_default() -> bool {
    true
}

fn default_fallback_range() -> ValueRange {
    ValueRange::new(-20.0, 20.0)
}

fn default_playback_speed() -> f64 {
    1.0
}
