//! Configuration for the extraction pipeline.
//!
//! Configuration is stored in TOML format and supports environment variable
//! overrides.
//!
//! ## Resolution order
//!
//! 1. **Config file**: `PAGESPLIT_CONFIG` if set, otherwise the platform config
//!    directory (see [`Config::default_path`])
//! 2. **Defaults** for every key the file leaves out
//! 3. **Environment variables**: `PAGESPLIT_CACHE_DIR`, `PAGESPLIT_CACHE_TTL`
//!
//! ## Example configuration file
//!
//! ```toml
//! [cache]
//! dir = "/var/cache/pagesplit"
//! ttl_secs = 3600
//!
//! [fetch]
//! timeout_secs = 30
//! user_agent = "pagesplit/0.3"
//!
//! [extract]
//! max_import_depth = 8
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::css::DEFAULT_MAX_IMPORT_DEPTH;
use crate::{Error, Result};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PAGESPLIT_CONFIG";
/// Environment variable overriding `cache.dir`.
pub const CACHE_DIR_ENV: &str = "PAGESPLIT_CACHE_DIR";
/// Environment variable overriding `cache.ttl_secs`.
pub const CACHE_TTL_ENV: &str = "PAGESPLIT_CACHE_TTL";

/// Default lifetime of a cached extraction.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Effective configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extraction cache settings
    pub cache: CacheConfig,
    /// HTTP settings
    pub fetch: FetchConfig,
    /// Pipeline settings
    pub extract: ExtractConfig,
}

/// Where and for how long extractions are cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Root of the filesystem cache.
    ///
    /// Default locations:
    /// - Linux: `~/.cache/pagesplit`
    /// - macOS: `~/Library/Caches/dev.pagesplit.pagesplit`
    /// - Windows: `%LOCALAPPDATA%\pagesplit\pagesplit\cache`
    pub dir: PathBuf,
    /// Seconds an entry stays fresh.
    pub ttl_secs: u64,
}

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// `User-Agent` header sent with every request
    pub user_agent: String,
}

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Deepest `@import` chain that is followed
    pub max_import_depth: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: project_dirs().map_or_else(
                || {
                    directories::BaseDirs::new().map_or_else(
                        || PathBuf::from(".pagesplit/cache"),
                        |base| base.home_dir().join(".pagesplit").join("cache"),
                    )
                },
                |dirs| dirs.cache_dir().to_path_buf(),
            ),
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("pagesplit/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_import_depth: DEFAULT_MAX_IMPORT_DEPTH,
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "pagesplit", "pagesplit")
}

impl Config {
    /// Load the effective configuration.
    ///
    /// Reads `PAGESPLIT_CONFIG` or the default config file when present,
    /// falls back to defaults otherwise, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `PAGESPLIT_CONFIG` names a file that cannot be read
    /// - The config file contains invalid TOML
    /// - An environment override has an invalid value
    pub fn load() -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = match explicit {
            Some(path) => Self::load_from(&path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load configuration from an explicit file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config {}: {e}", path.display())))
    }

    /// Write this configuration as TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
        }
        fs::write(path, self.to_toml()?)
            .map_err(|e| Error::Config(format!("Failed to write config: {e}")))
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))
    }

    /// Platform location of `config.toml`, if one can be determined.
    ///
    /// - Linux: `~/.config/pagesplit/config.toml`
    /// - macOS: `~/Library/Application Support/dev.pagesplit.pagesplit/config.toml`
    /// - Windows: `%APPDATA%\pagesplit\pagesplit\config\config.toml`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply overrides read through `lookup`, which maps an environment
    /// variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `PAGESPLIT_CACHE_TTL` is not an integer.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(CACHE_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.cache.dir = PathBuf::from(dir);
        }
        if let Some(ttl) = lookup(CACHE_TTL_ENV) {
            self.cache.ttl_secs = ttl.trim().parse().map_err(|_| {
                warn!(value = %ttl, "invalid {CACHE_TTL_ENV}");
                Error::Config(format!("{CACHE_TTL_ENV} must be a whole number of seconds, got '{ttl}'"))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.fetch.timeout_secs, 30);
        assert!(config.fetch.user_agent.starts_with("pagesplit/"));
        assert_eq!(config.extract.max_import_depth, DEFAULT_MAX_IMPORT_DEPTH);
        assert!(!config.cache.dir.as_os_str().is_empty());
    }

    #[test]
    fn test_config_save_and_load_roundtrip() -> Result<()> {
        // Given: A customized configuration
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.cache.dir = temp_dir.path().join("cache");
        config.cache.ttl_secs = 60;
        config.fetch.user_agent = "test-agent".into();

        // When: Saving and reading it back
        config.save(&path)?;
        let loaded = Config::load_from(&path)?;

        // Then: Nothing is lost
        assert_eq!(loaded, config);
        Ok(())
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[cache]\nttl_secs = 10\n")?;

        let config = Config::load_from(&path)?;

        assert_eq!(config.cache.ttl_secs, 10);
        assert_eq!(config.cache.dir, CacheConfig::default().dir);
        assert_eq!(config.fetch, FetchConfig::default());
        Ok(())
    }

    #[test]
    fn test_invalid_toml_is_config_error() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[cache\nttl_secs = ")?;

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Failed to parse config"));
        Ok(())
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::load_from(Path::new("/nonexistent/pagesplit/config.toml")).unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_env_overrides() -> Result<()> {
        let vars: HashMap<&str, &str> =
            HashMap::from([(CACHE_DIR_ENV, "/tmp/elsewhere"), (CACHE_TTL_ENV, " 120 ")]);
        let mut config = Config::default();

        config.apply_overrides(|name| vars.get(name).map(ToString::to_string))?;

        assert_eq!(config.cache.dir, PathBuf::from("/tmp/elsewhere"));
        assert_eq!(config.cache.ttl_secs, 120);
        Ok(())
    }

    #[test]
    fn test_blank_cache_dir_override_ignored() -> Result<()> {
        let mut config = Config::default();
        let before = config.cache.dir.clone();
        config.apply_overrides(|name| (name == CACHE_DIR_ENV).then(|| "  ".to_string()))?;
        assert_eq!(config.cache.dir, before);
        Ok(())
    }

    #[test]
    fn test_invalid_ttl_override_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|name| (name == CACHE_TTL_ENV).then(|| "an hour".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(config.cache.ttl_secs, DEFAULT_TTL_SECS);
    }

    proptest! {
        #[test]
        fn test_config_ttl_roundtrip(ttl in 0u64..=31_536_000, depth in 0usize..=64) {
            let mut config = Config::default();
            config.cache.ttl_secs = ttl;
            config.extract.max_import_depth = depth;

            let text = config.to_toml().unwrap();
            let back: Config = toml::from_str(&text).unwrap();
            prop_assert_eq!(back, config);
        }
    }
}
