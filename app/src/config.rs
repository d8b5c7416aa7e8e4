use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::*;
use serde::{Deserialize, Serialize};
use url::Url;

use infra::persistence::{Documents, FileStorage};

pub const ENV_PREFIX: &str = "DOUGHCALC_";

#[derive(Deserialize, Serialize, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub share: ShareConfig,
}

#[derive(Deserialize, Serialize, Debug, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
    pub key: String,
}

#[derive(Deserialize, Serialize, Debug, PartialEq)]
#[serde(default)]
pub struct ShareConfig {
    pub base_url: String,
}

/// Settings taken from `DOUGHCALC_*` environment variables, which win over
/// the config file.
#[derive(Deserialize, Debug, Default, PartialEq)]
pub struct EnvOverrides {
    pub storage_path: Option<PathBuf>,
    pub share_url: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct EnvLogger {
    level: Option<LogLevel>,
    modules: HashMap<String, LogLevel>,
    timestamp_nanos: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            path: PathBuf::from("doughcalc-data"),
            key: "doughCalc".to_string(),
        }
    }
}

impl Default for ShareConfig {
    fn default() -> Self {
        ShareConfig {
            base_url: "https://localhost/dough-calc.html".to_string(),
        }
    }
}

impl Config {
    pub fn apply(&mut self, overrides: EnvOverrides) {
        if let Some(path) = overrides.storage_path {
            debug!("Storage path from environment: {:?}", path);
            self.storage.path = path;
        }
        if let Some(url) = overrides.share_url {
            debug!("Share url from environment: {}", url);
            self.share.base_url = url;
        }
    }
}

impl EnvOverrides {
    pub fn from_env() -> Result<Self> {
        let overrides = envy::prefixed(ENV_PREFIX)
            .from_env::<EnvOverrides>()
            .context("read environment overrides")?;
        Ok(overrides)
    }
}

impl StorageConfig {
    pub fn build(&self) -> Documents<FileStorage> {
        debug!("Build storage from {:?}", self);
        Documents::wrap(FileStorage::new(&self.path))
    }
}

impl ShareConfig {
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url)
            .with_context(|| format!("share base url {:?}", self.base_url))?;
        Ok(url)
    }
}

impl LogLevel {
    fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl EnvLogger {
    pub fn builder(&self) -> env_logger::Builder {
        let mut b = env_logger::Builder::from_default_env();
        if let Some(level) = self.level {
            b.filter_level(level.to_filter());
        }

        for (module, level) in self.modules.iter() {
            b.filter_module(&module, level.to_filter());
        }

        if self.timestamp_nanos {
            b.format_timestamp_nanos();
        }

        b
    }
}
