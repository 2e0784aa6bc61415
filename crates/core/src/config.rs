//! Configuration management
//!
//! This module handles loading, saving, and migrating the dlk configuration
//! file, stored in TOML format at ~/.config/dlk/config.toml (the directory can
//! be overridden with DLK_CONFIG_DIR). Environment variables override the file;
//! command-line flags override both.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Current configuration schema version
///
/// Bumping this version requires adding a migration in `migrate` and marking
/// the change as breaking.
pub const SCHEMA_VERSION: u32 = 1;

/// Default DNS suffix for the DFS endpoint
pub const DEFAULT_DNS_SUFFIX: &str = "dfs.core.windows.net";

/// Environment variable naming the storage account
pub const ENV_ACCOUNT_NAME: &str = "ADL_TOOL_ACCOUNT_NAME";
/// Environment variable naming the service principal client id
pub const ENV_CLIENT_ID: &str = "ADL_TOOL_APP_CLIENTID";
/// Environment variable naming the service principal client secret
pub const ENV_CLIENT_SECRET: &str = "ADL_TOOL_APP_CLIENTSECRET";
/// Environment variable naming the service principal tenant
pub const ENV_TENANT_ID: &str = "ADL_TOOL_TENANTID";

const DEFAULT_OUTPUT: &str = "human";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Default settings
    #[serde(default)]
    pub defaults: Defaults,

    /// Storage endpoint settings
    #[serde(default)]
    pub storage: StorageSettings,

    /// Credential settings
    #[serde(default)]
    pub auth: AuthSettings,
}

/// Default settings for CLI behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Output format: "human" or "json"
    #[serde(default = "default_output")]
    pub output: String,

    /// Show progress bars
    #[serde(default = "default_true")]
    pub progress: bool,
}

/// Storage account addressing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Storage account name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    /// DNS suffix of the DFS endpoint
    #[serde(default = "default_dns_suffix")]
    pub dns_suffix: String,
}

/// Credential configuration
///
/// The client secret may be stored here but is more commonly supplied through
/// the environment; `resolved_*` accessors apply the environment overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Credential source: "environment", "identity", or "service-principal"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_dns_suffix() -> String {
    DEFAULT_DNS_SUFFIX.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            progress: true,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            storage: StorageSettings {
                account: None,
                dns_suffix: default_dns_suffix(),
            },
            auth: AuthSettings::default(),
        }
    }
}

impl Settings {
    /// Account name with the environment override applied
    pub fn resolved_account(&self) -> Option<String> {
        std::env::var(ENV_ACCOUNT_NAME)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.storage.account.clone())
    }

    /// Service principal client id with the environment override applied
    pub fn resolved_client_id(&self) -> Option<String> {
        std::env::var(ENV_CLIENT_ID)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.auth.client_id.clone())
    }

    /// Service principal client secret with the environment override applied
    pub fn resolved_client_secret(&self) -> Option<String> {
        std::env::var(ENV_CLIENT_SECRET)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.auth.client_secret.clone())
    }

    /// Service principal tenant id with the environment override applied
    pub fn resolved_tenant_id(&self) -> Option<String> {
        std::env::var(ENV_TENANT_ID)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.auth.tenant_id.clone())
    }
}

/// Configuration manager handles loading and saving settings
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    ///
    /// Honors DLK_CONFIG_DIR for test and automation environments.
    pub fn new() -> Result<Self> {
        let config_dir = match std::env::var("DLK_CONFIG_DIR") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
                .join("dlk"),
        };
        Ok(Self {
            config_path: config_dir.join("config.toml"),
        })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load settings from disk
    ///
    /// If the configuration file doesn't exist, returns default settings.
    /// If the schema version doesn't match, attempts migration.
    pub fn load(&self) -> Result<Settings> {
        if !self.config_path.exists() {
            return Ok(Settings::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let mut settings: Settings = toml::from_str(&content)?;

        if settings.schema_version < SCHEMA_VERSION {
            settings = self.migrate(settings)?;
        } else if settings.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade dlk.",
                settings.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(settings)
    }

    /// Save settings to disk
    ///
    /// Creates parent directories if they don't exist. The file may contain a
    /// client secret, so permissions are set to 600 on Unix.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(settings)?;
        std::fs::write(&self.config_path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        Ok(())
    }

    /// Migrate settings from older schema versions
    fn migrate(&self, settings: Settings) -> Result<Settings> {
        let mut settings = settings;

        // Migration steps go here when the schema version is bumped.

        settings.schema_version = SCHEMA_VERSION;
        Ok(settings)
    }
}
