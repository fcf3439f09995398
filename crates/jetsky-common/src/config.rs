use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_SERVICE: &str = "https://bsky.social";
pub const DEFAULT_TIMELINE_LIMIT: u8 = 10;
pub const MAX_TIMELINE_LIMIT: u8 = 50;

/// Environment variable that overrides the stored app password.
pub const APP_PASSWORD_ENV: &str = "JETSKY_APP_PASSWORD";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Handle or DID to log in with, e.g. `alice.bsky.social`.
    pub identifier: String,
    /// Base URL of the PDS used for login, posting and handle resolution.
    pub service: String,
    /// Number of posts fetched by the timeline export.
    pub timeline_limit: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            identifier: String::new(),
            service: DEFAULT_SERVICE.to_owned(),
            timeline_limit: DEFAULT_TIMELINE_LIMIT,
        }
    }
}

impl Config {
    /// Loads the configuration from the provided loader.
    pub async fn load(loader: &impl Loader) -> Result<Self, ConfigError> {
        loader.load().await
    }

    /// Saves the configuration using the provided saver.
    pub async fn save(&self, saver: &impl Saver) -> Result<(), ConfigError> {
        saver.save(self).await
    }

    pub fn service_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.service).map_err(|e| ConfigError::UrlParse {
            url: self.service.clone(),
            message: e.to_string(),
        })
    }

    /// Timeline limit clamped to what the appview accepts.
    pub fn effective_timeline_limit(&self) -> u8 {
        self.timeline_limit.clamp(1, MAX_TIMELINE_LIMIT)
    }
}

/// The trait for loading configuration data.
pub trait Loader {
    fn load(&self) -> impl Future<Output = Result<Config, ConfigError>>;
}

/// The trait for saving configuration data.
pub trait Saver {
    fn save(&self, config: &Config) -> impl Future<Output = Result<(), ConfigError>>;
}

/// An implementation of [`Loader`] and [`Saver`] that reads and writes a configuration file.
///
/// Only `.json` files are supported. A missing file loads as the default
/// configuration.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_format(&self) -> Result<(), ConfigError> {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(()),
            _ => Err(ConfigError::UnsupportedFormat {
                path: self.path.clone(),
            }),
        }
    }
}

impl Loader for FileStore {
    async fn load(&self) -> Result<Config, ConfigError> {
        self.check_format()?;
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no config file, using defaults");
                return Ok(Config::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

impl Saver for FileStore {
    async fn save(&self, config: &Config) -> Result<(), ConfigError> {
        self.check_format()?;
        let raw = serde_json::to_string_pretty(config)
            .map_err(|source| ConfigError::Serialize { source })?;
        write_creating_parent(&self.path, raw.as_bytes())
    }
}

/// App password kept in its own file, outside the main configuration.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The stored password, or None if nothing (or only whitespace) is stored.
    pub fn load(&self) -> Result<Option<String>, ConfigError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let password = raw.trim();
                Ok((!password.is_empty()).then(|| password.to_owned()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ConfigError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    pub fn save(&self, password: &str) -> Result<(), ConfigError> {
        write_creating_parent(&self.path, password.as_bytes())?;
        restrict_permissions(&self.path)
    }

    /// Forget the stored password. Clearing an empty store is not an error.
    pub fn clear(&self) -> Result<(), ConfigError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ConfigError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

fn write_creating_parent(path: &Path, contents: &[u8]) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, contents).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(|source| {
        ConfigError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

/// `<user config dir>/jetsky`
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("jetsky"))
        .ok_or(ConfigError::NoConfigDir)
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(default_config_dir()?.join("config.json"))
}

/// The password file lives next to whichever config file is in use.
pub fn password_path_for(config_path: &Path) -> PathBuf {
    config_path.with_file_name("app-password")
}
