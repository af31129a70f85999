/// Configuration module for codeshape.
///
/// Handles loading, validating, and providing default extraction settings.
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::indexer::relations::StrengthStrategy;

/// Deepest nesting the traversal cutoff may be set to.
pub const MAX_DEPTH_LIMIT: usize = 64;

// ── Default value functions ──────────────────────────────────────────

fn default_max_depth() -> usize {
    10
}

fn default_true() -> bool {
    true
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Nested and internal traversal cutoff.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Emit internal structures (statements) as chunks.
    #[serde(default = "default_true")]
    pub include_internal: bool,

    /// Reject invalid chunk inputs instead of clamping them.
    #[serde(default = "default_true")]
    pub validate_required: bool,

    #[serde(default)]
    pub strength_strategy: StrengthStrategy,

    /// Merge chunks whose line gap is at most this many lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_max_gap: Option<usize>,

    /// Chunks below this confidence are dropped.
    #[serde(default)]
    pub min_confidence: f32,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            include_internal: default_true(),
            validate_required: default_true(),
            strength_strategy: StrengthStrategy::default(),
            merge_max_gap: None,
            min_confidence: 0.0,
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// A missing file or invalid JSON yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {}: {e}", path.display());
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {}", path.display());
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data)
            .with_context(|| format!("failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            (1..=MAX_DEPTH_LIMIT).contains(&self.max_depth),
            "max_depth must be between 1 and {MAX_DEPTH_LIMIT}"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.min_confidence),
            "min_confidence must be between 0 and 1"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_depth, 10);
        assert!(config.include_internal);
        assert!(config.validate_required);
        assert_eq!(config.strength_strategy, StrengthStrategy::SizeRatio);
        assert_eq!(config.merge_max_gap, None);
        assert_eq!(config.min_confidence, 0.0);
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"{"max_depth": 4, "strength_strategy": "distance_decay"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.strength_strategy, StrengthStrategy::DistanceDecay);
        // Other fields should have defaults
        assert!(config.include_internal);
        assert_eq!(config.merge_max_gap, None);
    }

    #[test]
    fn test_validate_ok() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_depth() {
        let mut config = Config::default();
        config.max_depth = 0;
        assert!(config.validate().is_err());
        config.max_depth = 65;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_confidence() {
        let mut config = Config::default();
        config.min_confidence = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_and_invalid_files() {
        let dir = tempdir().unwrap();
        let missing = Config::load(dir.path().join("nope.json")).unwrap();
        assert_eq!(missing, Config::default());

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert_eq!(Config::load(&broken).unwrap(), Config::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("codeshape.json");
        let config = Config {
            merge_max_gap: Some(2),
            include_internal: false,
            ..Config::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
