//! Configuration structures and loading logic.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::auth::{HmacSigner, PlaceholderSigner, RequestSigner};
use crate::api::constants::{user_agent, DEFAULT_LOCALE};
use crate::api::transport::DEFAULT_TIMEOUT_SECS;
use crate::api::ClientSettings;
use crate::error::{Error, Result};
use crate::fs::{default_session_path, ensure_parent};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub account: AccountConfig,

    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub signing: SigningConfig,
}

/// Account to log in as. The password never lives in the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountConfig {
    #[serde(default)]
    pub username: String,
}

/// How the client presents itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Overrides the user agent derived from the locale.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Seconds east of UTC.
    #[serde(default)]
    pub timezone_offset: i32,
}

/// Transport options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Proxy URL (http, https or socks5).
    #[serde(default)]
    pub proxy: Option<String>,

    /// Accept invalid certificates from the proxy.
    #[serde(default)]
    pub insecure: bool,

    #[serde(default)]
    pub force_http2: bool,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Where the logged-in session is stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Request signing key. Without one the placeholder signature is sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SigningConfig {
    #[serde(default)]
    pub hmac_key: Option<String>,
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            user_agent: None,
            timezone_offset: 0,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            insecure: false,
            force_http2: false,
            timeout_secs: default_timeout(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}. Create one from config.example.toml",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        Ok(toml::from_str(&content)?)
    }

    /// Load the file if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        ensure_parent(path)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Configured session file, or the per-user default.
    pub fn session_path(&self) -> Result<PathBuf> {
        match &self.session.path {
            Some(path) => Ok(path.clone()),
            None => default_session_path(),
        }
    }

    /// Signer matching the `[signing]` section.
    pub fn signer(&self) -> Arc<dyn RequestSigner> {
        match self.signing.hmac_key.as_deref() {
            Some(key) if !key.is_empty() => Arc::new(HmacSigner::new(key.as_bytes().to_vec())),
            _ => Arc::new(PlaceholderSigner),
        }
    }
}

impl From<&ClientConfig> for ClientSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            locale: config.device.locale.clone(),
            user_agent: config
                .device
                .user_agent
                .clone()
                .unwrap_or_else(|| user_agent(&config.device.locale)),
            timezone_offset: config.device.timezone_offset,
            timeout_secs: config.network.timeout_secs,
        }
    }
}
