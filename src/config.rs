//! Library configuration.
//!
//! Configuration is a JSON file at `~/.config/marquee/config.json`. Every
//! key is optional so callers can check presence without errors; credential
//! keys may also be supplied per call and layered over these defaults.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::api::ApiError;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "marquee";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default cookie file name under the cache directory
const COOKIES_FILE: &str = "cookies.json";

#[derive(Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Root URL of the tracker, e.g. `https://tracker.example`.
    pub base_url: Option<String>,
    /// Where the serialized session cookies live. Defaults to a file under
    /// the user cache directory.
    pub cookies_file: Option<PathBuf>,
    pub api_user: Option<String>,
    pub api_key: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub passkey: Option<String>,
}

impl Config {
    /// Loads the default config file, or an empty config if none exists.
    pub fn load() -> Result<Self, ApiError> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ApiError> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| ApiError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }

    fn config_path() -> Result<PathBuf, ApiError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ApiError::Config("could not determine config directory".into()))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// The cookie file path: the configured one, or the default under the
    /// user cache directory.
    pub fn cookies_path(&self) -> Result<PathBuf, ApiError> {
        if let Some(path) = &self.cookies_file {
            return Ok(path.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| ApiError::Config("could not determine cache directory".into()))?;
        Ok(cache_dir.join(APP_NAME).join(COOKIES_FILE))
    }
}

// Keep credential material out of Debug output.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("cookies_file", &self.cookies_file)
            .field("api_user", &self.api_user)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("passkey", &self.passkey.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
