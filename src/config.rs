//! Referee client configuration loading.

use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::api::config::ApiConfig;

/// Default location on disk where the client looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/referee.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SUMULA_REFEREE_CONFIG_PATH";
const API_BASE_URL_ENV: &str = "SUMULA_API_BASE_URL";
const EVENT_ID_ENV: &str = "SUMULA_EVENT_ID";
const STORE_DIR_ENV: &str = "SUMULA_STORE_DIR";
const ACCESS_TOKEN_ENV: &str = "SUMULA_ACCESS_TOKEN";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_EVENT_ID: i64 = 1;
const DEFAULT_STORE_DIR: &str = ".sumula-referee";

/// Runtime configuration of the referee client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefereeConfig {
    /// Root URL of the competition backend.
    pub api_base_url: String,
    /// Event whose súmulas are listed and claimed.
    pub event_id: i64,
    /// Directory of the local slot store.
    pub store_dir: PathBuf,
    /// Bearer token sent to the backend, if any.
    pub access_token: Option<String>,
}

impl RefereeConfig {
    /// Load the file configuration, then apply environment overrides.
    pub fn load() -> Self {
        let mut config = Self::from_file(&resolve_config_path());
        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    /// Backend client settings derived from this configuration.
    pub fn api_config(&self) -> ApiConfig {
        let config = ApiConfig::new(self.api_base_url.clone());
        match self.access_token {
            Some(ref token) => config.with_access_token(token.clone()),
            None => config,
        }
    }

    fn from_file(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        event_id = config.event_id,
                        "loaded referee config"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup(API_BASE_URL_ENV) {
            self.api_base_url = url;
        }
        if let Some(raw) = lookup(EVENT_ID_ENV) {
            match raw.trim().parse() {
                Ok(event_id) => self.event_id = event_id,
                Err(err) => warn!(value = %raw, error = %err, "ignoring invalid event id override"),
            }
        }
        if let Some(dir) = lookup(STORE_DIR_ENV) {
            self.store_dir = PathBuf::from(dir);
        }
        if let Some(token) = lookup(ACCESS_TOKEN_ENV) {
            self.access_token = Some(token);
        }
    }
}

impl Default for RefereeConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            event_id: DEFAULT_EVENT_ID,
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            access_token: None,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    api_base_url: Option<String>,
    #[serde(default)]
    event_id: Option<i64>,
    #[serde(default)]
    store_dir: Option<PathBuf>,
}

impl From<RawConfig> for RefereeConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: value.api_base_url.unwrap_or(defaults.api_base_url),
            event_id: value.event_id.unwrap_or(defaults.event_id),
            store_dir: value.store_dir.unwrap_or(defaults.store_dir),
            access_token: None,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
