//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default bound on how deep the parameter visitor descends into an entity
pub const DEFAULT_MAX_DEPTH: usize = 25;

/// Default collection size above which the formula scan runs in parallel
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 512;

/// Default name suffix applied to duplicated entities
pub const DEFAULT_COPY_SUFFIX: &str = " - Copy";

/// Name of the dataset-local config file
pub const LOCAL_CONFIG_FILE: &str = ".lcag.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },

    #[error("invalid value '{value}' for {var}: expected a positive integer")]
    InvalidEnv { var: &'static str, value: String },
}

/// lcag configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Depth bound of the parameter visitor
    pub max_depth: Option<usize>,

    /// Collection size above which formula scans fan out over threads
    pub parallel_threshold: Option<usize>,

    /// Suffix appended to duplicated names
    pub copy_suffix: Option<String>,

    /// Default output format
    pub default_format: Option<String>,

    /// Name recorded on entities this tool edits
    pub author: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    ///
    /// `dataset_dir` is the directory holding the dataset; its `.lcag.yaml`
    /// overrides the global user file.
    pub fn load(dataset_dir: Option<&Path>) -> Result<Self, ConfigError> {
        // 1. Built-in defaults (already in Default impl)
        let mut config = Config::default();

        // 2. Global user config (~/.config/lcag/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path)? {
                config.merge(global);
            }
        }

        // 3. Dataset-local config
        if let Some(dir) = dataset_dir {
            if let Some(local) = Self::read_file(&dir.join(LOCAL_CONFIG_FILE))? {
                config.merge(local);
            }
        }

        // 4. Environment variables
        if let Some(depth) = env_usize("LCAG_MAX_DEPTH")? {
            config.max_depth = Some(depth);
        }
        if let Some(threshold) = env_usize("LCAG_PARALLEL_THRESHOLD")? {
            config.parallel_threshold = Some(threshold);
        }
        if let Ok(author) = std::env::var("LCAG_AUTHOR") {
            config.author = Some(author);
        }

        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Parse a config file; a missing file is not an error
    pub fn read_file(path: &Path) -> Result<Option<Config>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Some(Config::default()));
        }
        serde_yml::from_str(&contents)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "lcag")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.max_depth.is_some() {
            self.max_depth = other.max_depth;
        }
        if other.parallel_threshold.is_some() {
            self.parallel_threshold = other.parallel_threshold;
        }
        if other.copy_suffix.is_some() {
            self.copy_suffix = other.copy_suffix;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.author.is_some() {
            self.author = other.author;
        }
    }

    /// Get the author name, falling back to the login name
    pub fn author(&self) -> String {
        if let Some(ref author) = self.author {
            return author.clone();
        }
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH)
    }

    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold.unwrap_or(DEFAULT_PARALLEL_THRESHOLD)
    }

    pub fn copy_suffix(&self) -> &str {
        match self.copy_suffix.as_deref() {
            Some(suffix) if !suffix.is_empty() => suffix,
            _ => DEFAULT_COPY_SUFFIX,
        }
    }
}

fn env_usize(var: &'static str) -> Result<Option<usize>, ConfigError> {
    match std::env::var(var) {
        Ok(value) => {
            let parsed = value.trim().parse::<usize>();
            match parsed {
                Ok(n) if n > 0 => Ok(Some(n)),
                _ => Err(ConfigError::InvalidEnv { var, value }),
            }
        }
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_depth(), 25);
        assert_eq!(config.copy_suffix(), " - Copy");
        assert_eq!(config.parallel_threshold(), DEFAULT_PARALLEL_THRESHOLD);
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base = Config {
            max_depth: Some(10),
            copy_suffix: Some(" (copy)".to_string()),
            ..Default::default()
        };
        base.merge(Config {
            max_depth: Some(40),
            ..Default::default()
        });
        assert_eq!(base.max_depth(), 40);
        assert_eq!(base.copy_suffix(), " (copy)");
    }

    #[test]
    fn test_read_local_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOCAL_CONFIG_FILE);
        std::fs::write(&path, "max_depth: 7\ndefault_format: json\n").unwrap();

        let config = Config::read_file(&path).unwrap().unwrap();
        assert_eq!(config.max_depth(), 7);
        assert_eq!(config.default_format.as_deref(), Some("json"));
        assert!(Config::read_file(&dir.path().join("missing.yaml"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_malformed_file_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOCAL_CONFIG_FILE);
        std::fs::write(&path, "max_depth: [oops\n").unwrap();
        assert!(matches!(
            Config::read_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
