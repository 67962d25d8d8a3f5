use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// How long a cached existence answer stays fresh (5 s).
pub const DEFAULT_EXISTENCE_TTL_MS: u64 = 5_000;

/// Longest filename accepted, in bytes.
pub const MAX_FILENAME_BYTES: usize = 255;

/// Bridge error code reported when storage permission is refused.
pub const PERMISSION_DENIED_ERROR: i32 = 20;

/// What to do when the target file is already on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Last write wins.
    #[default]
    Overwrite,
    /// Leave the existing file alone and report its path.
    KeepExisting,
}

/// Top-level configuration for the media file helper.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HelperConfig {
    /// Application-private cache directory, used when no external storage is available.
    pub app_cache_dir: String,
    /// Mounted external storage directory, preferred when set.
    pub external_storage_dir: Option<String>,
    /// Freshness window for cached existence answers, in milliseconds.
    pub existence_ttl_ms: u64,
    pub write_policy: WritePolicy,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            app_cache_dir: String::new(),
            external_storage_dir: None,
            existence_ttl_ms: DEFAULT_EXISTENCE_TTL_MS,
            write_policy: WritePolicy::Overwrite,
        }
    }
}

impl HelperConfig {
    /// Config rooted at a single directory with default settings.
    pub fn with_cache_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            app_cache_dir: dir.into().to_string_lossy().into_owned(),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid helper config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading helper config {}", path.display()))?;
        Self::from_json_str(&raw)
    }

    pub fn existence_ttl(&self) -> Duration {
        Duration::from_millis(self.existence_ttl_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = HelperConfig::from_json_str(
            r#"{ "app_cache_dir": "/data/data/com.example/cache", "write_policy": "keep_existing" }"#,
        )
        .unwrap();
        assert_eq!(cfg.app_cache_dir, "/data/data/com.example/cache");
        assert!(cfg.external_storage_dir.is_none());
        assert_eq!(cfg.existence_ttl(), Duration::from_millis(DEFAULT_EXISTENCE_TTL_MS));
        assert_eq!(cfg.write_policy, WritePolicy::KeepExisting);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("helper.json");
        std::fs::write(
            &path,
            r#"{ "external_storage_dir": "/storage/emulated/0", "existence_ttl_ms": 250 }"#,
        )
        .unwrap();

        let cfg = HelperConfig::load(&path).unwrap();
        assert_eq!(cfg.external_storage_dir.as_deref(), Some("/storage/emulated/0"));
        assert_eq!(cfg.existence_ttl(), Duration::from_millis(250));
        assert_eq!(cfg.write_policy, WritePolicy::Overwrite);
        assert!(HelperConfig::load(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(HelperConfig::from_json_str("{ not json").is_err());
    }
}
