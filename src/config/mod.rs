mod basic;
mod polar;

pub use basic::BasicConfig;
pub use polar::PolarConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Polar API and webhook settings (see `polar` table in config.toml).
    #[serde(default)]
    pub polar: PolarConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Environment variables honoured on top of `config.toml`.
const POLAR_ENV_KEYS: [&str; 2] = ["POLAR_ACCESS_TOKEN", "POLAR_WEBHOOK_SECRET"];

impl Config {
    /// Builds a Figment that merges defaults, a config TOML file and the Polar env vars.
    ///
    /// `POLAR_ACCESS_TOKEN` lands on `polar.access_token`, `POLAR_WEBHOOK_SECRET` on
    /// `polar.webhook_secret`.
    pub fn figment() -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE));
        }
        figment.merge(Env::raw().only(&POLAR_ENV_KEYS).map(|key| {
            key.as_str()
                .to_ascii_lowercase()
                .replacen("polar_", "polar.", 1)
                .into()
        }))
    }

    /// Loads configuration without validating required fields.
    ///
    /// Binaries should call `Config::from_toml()` instead so that an empty
    /// `basic.admin_key` is caught at startup.
    pub fn from_optional_toml() -> Self {
        Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration (defaults + optional config.toml): {err}")
        })
    }

    /// Loads configuration and validates required fields.
    pub fn from_toml() -> Self {
        let cfg = Self::from_optional_toml();
        if cfg.basic.admin_key.trim().is_empty() {
            panic!("basic.admin_key must be set and non-empty (in {DEFAULT_CONFIG_FILE})");
        }
        cfg
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::from_toml);
