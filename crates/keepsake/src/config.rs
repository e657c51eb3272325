//! Configuration for Keepsake
//!
//! TOML-backed, with per-field defaults so a partial (or absent) config
//! file always yields a usable configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{KeepsakeError, Result};
use crate::policy::RetentionPolicy;

/// Main configuration structure for Keepsake
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Retention window configuration
    #[serde(default)]
    pub retention: RetentionConfig,
    /// Cleanup driver configuration
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

impl Config {
    /// Load configuration from `path`, or probe the default locations
    /// (`~/.keepsake/config.toml`, the platform config dir, then
    /// `./keepsake.toml`). Missing files fall back to defaults; unreadable
    /// or unparseable files are errors.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        if let Some(path) = path {
            tracing::info!("Loading config from: {}", path.display());
            return Self::from_file(path);
        }

        let default_paths = [
            dirs::home_dir().map(|h| h.join(".keepsake").join("config.toml")),
            dirs::config_dir().map(|c| c.join("keepsake").join("config.toml")),
            Some(PathBuf::from("keepsake.toml")),
        ];

        for candidate in default_paths.iter().flatten() {
            if candidate.exists() {
                tracing::info!("Loading config from: {}", candidate.display());
                return Self::from_file(candidate);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    fn from_file(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            KeepsakeError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| KeepsakeError::Config(format!("Failed to parse config: {e}")))
    }
}

/// Retention window configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Monthly tier window in days
    #[serde(default = "default_monthly_days")]
    pub monthly_days: i64,
    /// Weekly tier window in days
    #[serde(default = "default_weekly_days")]
    pub weekly_days: i64,
    /// Daily tier window in days
    #[serde(default = "default_daily_days")]
    pub daily_days: i64,
    /// Intra-daily tier window in days
    #[serde(default = "default_intra_daily_days")]
    pub intra_daily_days: i64,
    /// Which end of the timeline wins a contested bucket ("newest" or
    /// "oldest")
    #[serde(default = "default_prefer")]
    pub prefer: String,
}

impl RetentionConfig {
    /// Collapse the config fields into the policy value the classifier
    /// consumes.
    pub fn to_policy(&self) -> RetentionPolicy {
        RetentionPolicy::new(
            self.monthly_days,
            self.weekly_days,
            self.daily_days,
            self.intra_daily_days,
        )
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            monthly_days: default_monthly_days(),
            weekly_days: default_weekly_days(),
            daily_days: default_daily_days(),
            intra_daily_days: default_intra_daily_days(),
            prefer: default_prefer(),
        }
    }
}

fn default_monthly_days() -> i64 {
    99999
}

fn default_weekly_days() -> i64 {
    45
}

fn default_daily_days() -> i64 {
    21
}

fn default_intra_daily_days() -> i64 {
    3
}

fn default_prefer() -> String {
    "newest".to_string()
}

/// Cleanup driver configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    /// Regex a file name must match to be considered; the first capture
    /// group is the date when the date source is the filename
    #[serde(default = "default_pattern")]
    pub pattern: String,
    /// Files smaller than this many bytes are ignored
    #[serde(default)]
    pub min_size_bytes: u64,
    /// Where to move discarded files; deleted when unset. A relative path
    /// is resolved against the source directory.
    #[serde(default)]
    pub destination: Option<PathBuf>,
    /// Where the candidate timestamp comes from ("filename", "created",
    /// or "modified")
    #[serde(default = "default_date_source")]
    pub date_source: String,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            min_size_bytes: 0,
            destination: None,
            date_source: default_date_source(),
        }
    }
}

fn default_pattern() -> String {
    r"(\d{4}-\d{2}-\d{2})".to_string()
}

fn default_date_source() -> String {
    "filename".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.retention.monthly_days, 99999);
        assert_eq!(config.retention.weekly_days, 45);
        assert_eq!(config.retention.daily_days, 21);
        assert_eq!(config.retention.intra_daily_days, 3);
        assert_eq!(config.retention.prefer, "newest");
        assert_eq!(config.cleanup.pattern, r"(\d{4}-\d{2}-\d{2})");
        assert_eq!(config.cleanup.min_size_bytes, 0);
        assert!(config.cleanup.destination.is_none());
        assert_eq!(config.cleanup.date_source, "filename");
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
[retention]
monthly_days = 365
weekly_days = 60
daily_days = 14
intra_daily_days = 2
prefer = "oldest"

[cleanup]
pattern = 'backup-(\d{4}-\d{2}-\d{2})\.bak'
min_size_bytes = 1024
destination = "archive"
date_source = "modified"
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse TOML");

        assert_eq!(config.retention.monthly_days, 365);
        assert_eq!(config.retention.weekly_days, 60);
        assert_eq!(config.retention.daily_days, 14);
        assert_eq!(config.retention.intra_daily_days, 2);
        assert_eq!(config.retention.prefer, "oldest");

        assert_eq!(config.cleanup.pattern, r"backup-(\d{4}-\d{2}-\d{2})\.bak");
        assert_eq!(config.cleanup.min_size_bytes, 1024);
        assert_eq!(config.cleanup.destination, Some(PathBuf::from("archive")));
        assert_eq!(config.cleanup.date_source, "modified");
    }

    #[test]
    fn test_toml_partial_deserialization() {
        // Only one field given; everything else takes its default
        let toml_str = r#"
[retention]
daily_days = 10
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse partial TOML");

        assert_eq!(config.retention.daily_days, 10);
        assert_eq!(config.retention.monthly_days, 99999);
        assert_eq!(config.retention.weekly_days, 45);
        assert_eq!(config.cleanup.date_source, "filename");
    }

    #[test]
    fn test_to_policy() {
        let retention = RetentionConfig {
            monthly_days: 30,
            weekly_days: 14,
            daily_days: 7,
            intra_daily_days: 1,
            prefer: "newest".to_string(),
        };

        let policy = retention.to_policy();
        assert_eq!(policy.monthly, 30);
        assert_eq!(policy.weekly, 14);
        assert_eq!(policy.daily, 7);
        assert_eq!(policy.intra_daily, 1);
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[retention]\nweekly_days = 5\n").expect("write config");

        let config = Config::load(Some(&path)).expect("load config");
        assert_eq!(config.retention.weekly_days, 5);
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not valid toml [").expect("write config");

        let result = Config::load(Some(&path));
        assert!(matches!(result, Err(KeepsakeError::Config(_))));
    }
}
