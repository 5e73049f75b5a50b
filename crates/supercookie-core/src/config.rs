use std::{env, fmt::Display, fs, path::PathBuf, str::FromStr};

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::SupercookieError;

/// Path of an optional TOML file read before environment overrides.
pub const CONFIG_PATH_VAR: &str = "SUPERCOOKIE_CONFIG";
pub const PORT_VAR: &str = "PORT";
pub const HOST_VAR: &str = "SUPERCOOKIE_HOST";
pub const ASSETS_VAR: &str = "SUPERCOOKIE_ASSETS";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding `tracker.html` and `probe.html`.
    pub assets_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            assets_dir: PathBuf::from("static"),
        }
    }
}

impl ServerConfig {
    /// Defaults, then `SUPERCOOKIE_CONFIG`, then environment overrides.
    pub fn load() -> Result<Self, SupercookieError> {
        Self::load_with(|key| env::var(key).ok())
    }

    /// Same as [`ServerConfig::load`] with an explicit variable source.
    pub fn load_with<F>(lookup: F) -> Result<Self, SupercookieError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_VAR) {
            Some(path) => {
                info!("Reading configuration from {path}");
                Self::from_toml_str(&fs::read_to_string(&path)?)?
            }
            None => Self::default(),
        };

        config.port = try_override(&lookup, PORT_VAR, config.port);
        config.host = try_override(&lookup, HOST_VAR, config.host);
        if let Some(dir) = lookup(ASSETS_VAR) {
            config.assets_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, SupercookieError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn try_override<F, T>(lookup: &F, key: &str, current: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        return current;
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(e) => {
            warn!("Invalid {key} value {raw:?}: {e}, keeping {current}");
            current
        }
    }
}
