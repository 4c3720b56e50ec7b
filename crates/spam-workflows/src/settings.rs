// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Client settings
//!
//! The only setting is the backend base address. It is resolved once per
//! session, later sources overriding earlier ones:
//!
//! 1. built-in default (`http://localhost:8000`)
//! 2. the persisted settings file (JSON)
//! 3. `SPAM_CONSOLE_BACKEND_URL`
//! 4. a runtime override such as a command-line flag
//!
//! The resolved [`ClientSettings`] is passed explicitly to every workflow;
//! nothing reads it from global state.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use config::{Config, Environment as ConfigEnv, File, FileFormat};
use serde::{Deserialize, Deserializer, Serialize, de};
use tokio::fs;
use tracing::{debug, info};
use url::Url;

use crate::error::{WorkflowError, WorkflowResult};

/// Backend address used when nothing else is configured
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Environment variable overriding the backend address
pub const BACKEND_URL_ENV: &str = "SPAM_CONSOLE_BACKEND_URL";

/// Environment variable naming the settings file
pub const SETTINGS_PATH_ENV: &str = "SPAM_CONSOLE_SETTINGS";

const ENV_PREFIX: &str = "SPAM_CONSOLE";

/// Resolved client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Base address of the classification backend
    #[serde(deserialize_with = "http_url")]
    pub backend_url: Url,
}

impl ClientSettings {
    /// Create settings for `backend_url`
    ///
    /// # Errors
    ///
    /// Returns an error unless the URL is an http or https address
    pub fn new(backend_url: Url) -> WorkflowResult<Self> {
        check_backend_url(&backend_url).map_err(WorkflowError::settings)?;
        Ok(Self { backend_url })
    }

    /// Parse and validate a backend address
    pub fn parse(backend_url: &str) -> WorkflowResult<Self> {
        let url = Url::parse(backend_url.trim()).map_err(|e| {
            WorkflowError::settings(format!("invalid backend URL '{backend_url}': {e}"))
        })?;
        Self::new(url)
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            backend_url: Url::parse(DEFAULT_BACKEND_URL)
                .unwrap_or_else(|_| unreachable!("default backend URL is valid")),
        }
    }
}

fn check_backend_url(url: &Url) -> Result<(), String> {
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(()),
        "http" | "https" => Err(format!("backend URL has no host: {url}")),
        other => Err(format!("backend URL must use http or https, got '{other}'")),
    }
}

fn http_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let url = Url::parse(raw.trim()).map_err(|e| de::Error::custom(format!("invalid URL '{raw}': {e}")))?;
    check_backend_url(&url).map_err(de::Error::custom)?;
    Ok(url)
}

/// Location of the persisted settings file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Use the settings file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Pick the settings file: explicit path, then `SPAM_CONSOLE_SETTINGS`,
    /// then the platform configuration directory
    pub fn locate(explicit: Option<PathBuf>) -> WorkflowResult<Self> {
        if let Some(path) = explicit {
            return Ok(Self::new(path));
        }
        if let Some(path) = std::env::var_os(SETTINGS_PATH_ENV).filter(|p| !p.is_empty()) {
            return Ok(Self::new(path));
        }
        Self::default_path().map(Self::new)
    }

    /// `<config dir>/spam-console/settings.json`
    pub fn default_path() -> WorkflowResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("spam-console").join("settings.json"))
            .ok_or_else(|| WorkflowError::settings("no configuration directory on this platform"))
    }

    /// Path of the settings file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve settings from defaults, the file, the process environment and
    /// `override_url`
    pub fn load(&self, override_url: Option<&Url>) -> WorkflowResult<ClientSettings> {
        self.load_with_env(None, override_url)
    }

    /// Same as [`SettingsStore::load`], reading environment variables from `env`
    /// instead of the process when given
    pub fn load_with_env(
        &self,
        env: Option<HashMap<String, String>>,
        override_url: Option<&Url>,
    ) -> WorkflowResult<ClientSettings> {
        debug!(path = %self.path.display(), "resolving client settings");

        let mut builder = Config::builder()
            .set_default("backend_url", DEFAULT_BACKEND_URL)?
            .add_source(
                File::from(self.path.as_path())
                    .format(FileFormat::Json)
                    .required(false),
            )
            .add_source(ConfigEnv::with_prefix(ENV_PREFIX).source(env));

        if let Some(url) = override_url {
            builder = builder.set_override("backend_url", url.as_str())?;
        }

        let settings: ClientSettings = builder.build()?.try_deserialize()?;
        debug!(backend_url = %settings.backend_url, "client settings resolved");
        Ok(settings)
    }

    /// Settings as persisted, ignoring environment and overrides
    ///
    /// Returns `None` when no file has been saved yet.
    pub async fn saved(&self) -> WorkflowResult<Option<ClientSettings>> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(WorkflowError::io(format!(
                "Failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    /// Persist `settings` for future sessions
    pub async fn save(&self, settings: &ClientSettings) -> WorkflowResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                WorkflowError::io(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, content).await.map_err(|e| {
            WorkflowError::io(format!("Failed to write {}: {e}", self.path.display()))
        })?;

        info!(
            path = %self.path.display(),
            backend_url = %settings.backend_url,
            "settings saved"
        );
        Ok(())
    }
}
