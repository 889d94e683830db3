//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`GATEPASS_ROOT_FOLDER`)
//! 3. TOML config file (`root_folder`)
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file is never fatal: a warning is logged and
//! compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "GATEPASS_ROOT_FOLDER";

/// Environment variable pointing at an explicit TOML config file
pub const CONFIG_PATH_ENV: &str = "GATEPASS_CONFIG";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "gatepass.db";

/// Top-level TOML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind_address: String,
    pub port: u16,
    /// Origin the kiosk is served from, used for feedback links and
    /// storage URLs
    pub public_base_url: String,
    pub camera: CameraConfig,
    pub notify: NotifyConfig,
    pub feed: FeedConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// When false the capture API is reported as unavailable
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Feedback-request endpoint (e.g. `https://…/functions/v1/send-email`)
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Number of most-recent visits kept in the live feed
    pub window: usize,
    /// Background refresh period; 0 disables polling
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub bucket: String,
    /// Public buckets resolve to plain URLs; private ones to signed URLs
    pub public: bool,
    pub signing_secret: Option<String>,
    pub signed_url_ttl_secs: u64,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            bind_address: "0.0.0.0".to_string(),
            port: 5810,
            public_base_url: "http://localhost:5810".to_string(),
            camera: CameraConfig::default(),
            notify: NotifyConfig::default(),
            feed: FeedConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            window: 20,
            poll_interval_secs: 15,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "visitor-selfies".to_string(),
            public: true,
            signing_secret: None,
            signed_url_ttl_secs: 600,
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.public_base_url.trim_end_matches('/')
    }

    /// Whether browsers will treat the kiosk origin as a secure context
    ///
    /// HTTPS origins are secure; plain HTTP is only secure on loopback hosts.
    pub fn is_secure_context(&self) -> bool {
        is_secure_origin(&self.public_base_url)
    }
}

/// Secure-context rule applied to an origin string
pub fn is_secure_origin(origin: &str) -> bool {
    let origin = origin.trim().to_lowercase();
    if origin.starts_with("https://") {
        return true;
    }
    let Some(rest) = origin.strip_prefix("http://") else {
        return false;
    };
    let authority = rest.split('/').next().unwrap_or_default();
    let host = if authority.starts_with('[') {
        authority.split(']').next().map(|h| format!("{}]", h)).unwrap_or_default()
    } else {
        authority.split(':').next().unwrap_or_default().to_string()
    };
    matches!(host.as_str(), "localhost" | "127.0.0.1" | "[::1]")
}

/// Load the TOML config, degrading to defaults when it is missing or invalid
pub fn load_toml_config(explicit_path: Option<&Path>) -> TomlConfig {
    let path = match explicit_path {
        Some(path) => Some(path.to_path_buf()),
        None => std::env::var(CONFIG_PATH_ENV)
            .ok()
            .map(PathBuf::from)
            .or_else(|| find_config_file().ok()),
    };

    let Some(path) = path else {
        warn!("No gatepass config file found, using compiled defaults");
        return TomlConfig::default();
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => match TomlConfig::from_toml_str(&content) {
            Ok(config) => {
                info!("Loaded config: {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring invalid config {}: {}", path.display(), e);
                TomlConfig::default()
            }
        },
        Err(e) => {
            warn!("Could not read config {}: {}", path.display(), e);
            TomlConfig::default()
        }
    }
}

/// Root folder resolution following the documented priority order
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Create the root folder if it is missing and return the database path
pub fn prepare_root_folder(root: &Path) -> Result<PathBuf> {
    if !root.exists() {
        std::fs::create_dir_all(root)?;
        info!("Created root folder: {}", root.display());
    }
    Ok(root.join(DATABASE_FILE))
}

/// Get default configuration file path for the platform
fn find_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("gatepass").join("gatepass.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/gatepass/gatepass.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("gatepass"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/gatepass"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("gatepass"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/gatepass"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("gatepass"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\gatepass"))
    } else {
        PathBuf::from("./gatepass_data")
    }
}
