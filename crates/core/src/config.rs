//! Application configuration.
//!
//! Settings are layered from built-in defaults, an optional TOML file in the
//! user config directory and the environment. Everything is read once at
//! startup by [`AppConfig::load`]; the resulting value is passed explicitly to
//! the components that need it.

use std::{
    collections::HashMap,
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::info;

use crate::igdb::{
    auth::DEFAULT_AUTH_URL, client::DEFAULT_BASE_URL, image::DEFAULT_IMAGE_BASE_URL, Credentials,
};

/// Directory under the platform config dir holding the config file.
pub const CONFIG_DIR: &str = "switch-gallery";
/// Config file name.
pub const CONFIG_FILE: &str = "config.toml";

/// IGDB region id for Japan.
pub const DEFAULT_REGION: u32 = 5;
/// IGDB platform id for the Nintendo Switch.
pub const DEFAULT_PLATFORM: u32 = 130;
/// Games fetched per list page.
pub const DEFAULT_LIST_LIMIT: u32 = 50;
/// Request-level timeout applied to every outbound call.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Prefix for general overrides, e.g. `SWITCH_GALLERY_REGION=1`.
pub const ENV_PREFIX: &str = "SWITCH_GALLERY";
/// Prefix for credentials: `IGDB_API_CLIENT_ID`, `IGDB_API_CLIENT_SECRET`.
pub const CREDENTIALS_ENV_PREFIX: &str = "IGDB_API";

const DEFAULT_CONFIG: &str = r#"# switch-gallery configuration
#
# Credentials come from a Twitch developer application. They are usually
# supplied through IGDB_API_CLIENT_ID / IGDB_API_CLIENT_SECRET instead.
# client_id = ""
# client_secret = ""

# auth_url = "https://id.twitch.tv/oauth2/token"
# api_base_url = "https://api.igdb.com"
# image_base_url = "https://images.igdb.com"

# Region whose localized title is shown (5 = Japan).
# region = 5
# Platform listed by the gallery (130 = Nintendo Switch).
# platform = 130
# list_limit = 50
# request_timeout_secs = 30
"#;

/// Resolved application settings.
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    client_secret: String,
    pub auth_url: String,
    pub api_base_url: String,
    pub image_base_url: String,
    pub region: u32,
    pub platform: u32,
    pub list_limit: u32,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    /// Load from the default config file and the process environment.
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        Self::load_from(Some(&path), None)
    }

    /// Load from an optional file and an explicit environment.
    ///
    /// `env` of `None` reads the process environment.
    pub fn load_from(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("auth_url", DEFAULT_AUTH_URL)?
            .set_default("api_base_url", DEFAULT_BASE_URL)?
            .set_default("image_base_url", DEFAULT_IMAGE_BASE_URL)?
            .set_default("region", i64::from(DEFAULT_REGION))?
            .set_default("platform", i64::from(DEFAULT_PLATFORM))?
            .set_default("list_limit", i64::from(DEFAULT_LIST_LIMIT))?
            .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS as i64)?;

        if let Some(path) = path {
            builder = builder
                .add_source(File::new(&path.to_string_lossy(), FileFormat::Toml).required(false));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(env.clone()),
            )
            .add_source(Environment::with_prefix(CREDENTIALS_ENV_PREFIX).source(env))
            .build()
            .context("failed to read configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("failed to parse configuration")?;
        app_config.validate()?;

        info!(
            region = app_config.region,
            platform = app_config.platform,
            "Configuration loaded"
        );
        Ok(app_config)
    }

    fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() || self.client_secret.trim().is_empty() {
            bail!(
                "IGDB API credentials are not configured; set {0}_CLIENT_ID and {0}_CLIENT_SECRET",
                CREDENTIALS_ENV_PREFIX
            );
        }
        if self.list_limit == 0 {
            bail!("list_limit must be greater than zero");
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.client_id.clone(), self.client_secret.clone())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Shared HTTP client carrying the request-level timeout.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.request_timeout())
            .build()
            .context("failed to create HTTP client")
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("auth_url", &self.auth_url)
            .field("api_base_url", &self.api_base_url)
            .field("image_base_url", &self.image_base_url)
            .field("region", &self.region)
            .field("platform", &self.platform)
            .field("list_limit", &self.list_limit)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Location of the user config file.
pub fn config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
        .ok_or_else(|| anyhow!("unable to determine the user config directory"))
}

/// Write a commented template config file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path()?;
    write_default_config(&path)?;
    Ok(path)
}

/// Returns `true` when a new file was written.
pub fn write_default_config(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write config {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(true)
}
