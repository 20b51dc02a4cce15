//! Configuration management for anime-harvest.
//!
//! Settings come from built-in defaults, then an optional config file
//! (`anime-harvest.{toml,json,yaml,yml}` in the working directory, or an
//! explicit `--config` path), then environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::harvest::{AnimeHarvestConfig, UserHarvestConfig};
use crate::scrapers::BrowserEngineConfig;
use crate::storage::HarvestPaths;

/// Basename of auto-discovered config files.
pub const CONFIG_BASENAME: &str = "anime-harvest";

/// Extensions tried during discovery, in order.
const CONFIG_EXTENSIONS: &[&str] = &["toml", "json", "yaml", "yml"];

/// Default data directory, relative to the config file or working directory.
pub const DEFAULT_DATA_DIR: &str = "csv_output";

/// Default database filename inside the data directory.
pub const DEFAULT_DATABASE_FILENAME: &str = "anime_harvest.db";

pub const DEFAULT_BASE_URL: &str = "https://myanimelist.net";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Loader options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Distinct statuses (other than plan-to-watch) a user needs to be loaded.
    #[serde(default = "default_min_distinct_statuses")]
    pub min_distinct_statuses: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            min_distinct_statuses: default_min_distinct_statuses(),
        }
    }
}

fn default_min_distinct_statuses() -> usize {
    2
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding the harvest CSV files and checkpoint.
    pub data_dir: PathBuf,
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Site root, without trailing slash.
    pub base_url: String,
    pub browser: BrowserEngineConfig,
    pub anime: AnimeHarvestConfig,
    pub users: UserHarvestConfig,
    pub loader: LoaderConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_data_dir(PathBuf::from(DEFAULT_DATA_DIR))
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join(DEFAULT_DATABASE_FILENAME),
            data_dir,
            base_url: DEFAULT_BASE_URL.to_string(),
            browser: BrowserEngineConfig::default(),
            anime: AnimeHarvestConfig::default(),
            users: UserHarvestConfig::default(),
            loader: LoaderConfig::default(),
        }
    }

    pub fn paths(&self) -> HarvestPaths {
        HarvestPaths::new(&self.data_dir)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// Recognised variables: `ANIME_HARVEST_DATA_DIR`, `DATABASE_URL`,
    /// `CHROME_REMOTE_URL`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(dir) = var("ANIME_HARVEST_DATA_DIR") {
            tracing::debug!("Using ANIME_HARVEST_DATA_DIR from environment: {}", dir);
            let dir = PathBuf::from(shellexpand::tilde(&dir).as_ref());
            if self.database_path == self.data_dir.join(DEFAULT_DATABASE_FILENAME) {
                self.database_path = dir.join(DEFAULT_DATABASE_FILENAME);
            }
            self.data_dir = dir;
        }
        if let Some(url) = var("DATABASE_URL") {
            tracing::debug!("Using DATABASE_URL from environment: {}", url);
            self.database_path = database_path_from_url(&url);
        }
        if let Some(remote) = var("CHROME_REMOTE_URL") {
            tracing::debug!("Using CHROME_REMOTE_URL from environment: {}", remote);
            self.browser.remote_url = Some(remote);
        }
    }
}

/// `sqlite:///tmp/a.db`, `sqlite:a.db` or a bare path -> file path.
pub fn database_path_from_url(url: &str) -> PathBuf {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database file path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Site root URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub browser: BrowserEngineConfig,
    #[serde(default)]
    pub anime: AnimeHarvestConfig,
    #[serde(default)]
    pub users: UserHarvestConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Look for `anime-harvest.<ext>` in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{}.{}", CONFIG_BASENAME, ext)))
            .find(|p| p.exists())
    }

    /// Load configuration from a specific file path.
    /// The format is chosen by extension; anything unrecognised is read as JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_err = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| parse_err(e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_err(e.to_string()))?
            }
            _ => serde_json::from_str(&contents).map_err(|e| parse_err(e.to_string()))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        } else {
            settings.data_dir = base_dir.join(DEFAULT_DATA_DIR);
        }
        settings.database_path = match self.database {
            Some(ref database) => self.resolve_path(database, base_dir),
            None => settings.data_dir.join(DEFAULT_DATABASE_FILENAME),
        };
        if let Some(ref base_url) = self.base_url {
            settings.base_url = base_url.trim_end_matches('/').to_string();
        }
        settings.browser = self.browser.clone();
        settings.anime = self.anime.clone();
        settings.users = self.users.clone();
        settings.loader = self.loader.clone();
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(
    options: LoadOptions,
) -> Result<(Settings, Config), ConfigError> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let config_path = options.config_path.or_else(|| Config::discover(&cwd));
    let config = match config_path {
        Some(ref path) => {
            tracing::debug!("Loading config from {}", path.display());
            Config::load_from_path(path).await?
        }
        None => Config::default(),
    };

    let mut settings = Settings::default();
    let base_dir = config.base_dir().unwrap_or_else(|| cwd.clone());
    config.apply_to_settings(&mut settings, &base_dir);
    settings.apply_env(|key| std::env::var(key).ok());

    Ok((settings, config))
}
