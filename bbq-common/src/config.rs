//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`BBQ_ROOT_FOLDER`)
//! 3. TOML config file (`root_folder` key)
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never stops a service from starting;
//! callers log a warning and fall back to `TomlConfig::default()`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "BBQ_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "bbq.db";

/// Default upstream player ID map (Smart Fantasy Baseball)
pub const DEFAULT_FEED_URL: &str = "https://www.smartfantasybaseball.com/PLAYERIDMAPCSV";

/// Identifying client header sent to the upstream feed
pub const DEFAULT_USER_AGENT: &str = "BBQ/1.0 (Fantasy Baseball Draft Manager)";

/// Longest accepted scheduled sync interval (one year)
pub const MAX_SYNC_INTERVAL_HOURS: u64 = 24 * 366;

/// Full TOML configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Root folder holding the database
    pub root_folder: Option<PathBuf>,
    pub server: ServerConfig,
    pub feed: FeedConfig,
    pub sync: SyncConfig,
    pub import: ImportConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// `[server]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5760,
        }
    }
}

/// `[feed]` section: upstream player ID map
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
        }
    }
}

/// `[sync]` section: scheduled feed sync
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Hours between scheduled syncs; 0 disables the schedule
    pub interval_hours: u64,
}

impl SyncConfig {
    /// Schedule period, `None` when disabled. Clamped to
    /// [`MAX_SYNC_INTERVAL_HOURS`].
    pub fn period(&self) -> Option<Duration> {
        let hours = self.interval_hours.min(MAX_SYNC_INTERVAL_HOURS);
        (hours > 0).then(|| Duration::from_secs(hours * 3600))
    }
}

/// `[import]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Records per upsert transaction
    pub batch_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self { batch_size: 500 }
    }
}

/// `[auth]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Treat every caller as an admin. Local development only.
    pub trust_all: bool,
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.import.batch_size == 0 {
            return Err(Error::Config("import.batch_size must be > 0".to_string()));
        }
        if self.feed.timeout_secs == 0 {
            return Err(Error::Config("feed.timeout_secs must be > 0".to_string()));
        }
        if self.feed.url.trim().is_empty() {
            return Err(Error::Config("feed.url must not be empty".to_string()));
        }
        if self.sync.interval_hours > MAX_SYNC_INTERVAL_HOURS {
            return Err(Error::Config(format!(
                "sync.interval_hours must be <= {}",
                MAX_SYNC_INTERVAL_HOURS
            )));
        }
        Ok(())
    }
}

/// Platform config file location, if one exists
///
/// Linux checks `~/.config/bbq/config.toml` then `/etc/bbq/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("bbq").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/bbq/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("bbq"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/bbq"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("bbq"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/bbq"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("bbq"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\bbq"))
    } else {
        PathBuf::from("./bbq_data")
    }
}

/// Resolves the root folder following the priority order above
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_root: None,
        }
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_toml_config(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!("{}: root folder from command line", self.module_name);
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!("{}: root folder from {}", self.module_name, ROOT_FOLDER_ENV);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_root {
            info!("{}: root folder from config file", self.module_name);
            return path.clone();
        }

        default_root_folder()
    }
}

/// Creates the root folder and locates the database inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }
}
