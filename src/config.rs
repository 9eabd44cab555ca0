use dirs::config_dir;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::rss::ChannelMeta;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
}

/// What to do when one feed cannot be fetched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run; nothing is written
    #[default]
    Abort,
    /// Log the failure and merge the remaining feeds
    Skip,
}

/// Shape of config.toml on disk
///
/// Example:
/// feeds_file = "feed_urls.txt"
/// output_file = "output/merged.xml"
/// channel_title = "My merged feed"
/// concurrency = 4
/// timeout_secs = 10
/// on_fetch_error = "skip"
#[derive(Debug, Default, Deserialize)]
pub struct RawConfig {
    pub feeds_file: Option<String>,
    pub output_file: Option<String>,
    pub channel_title: Option<String>,
    pub channel_link: Option<String>,
    pub channel_description: Option<String>,
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub on_fetch_error: Option<FailurePolicy>,
}

/// Resolved config used by the app
#[derive(Debug, Clone)]
pub struct Config {
    pub feeds_path: PathBuf,
    pub output_path: PathBuf,
    pub channel: ChannelMeta,
    pub concurrency: usize,
    pub timeout: Duration,
    pub user_agent: String,
    pub on_fetch_error: FailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config::resolve(RawConfig::default())
    }
}

impl Config {
    /// Apply defaults to whatever the file left unset
    pub fn resolve(raw: RawConfig) -> Config {
        let defaults = ChannelMeta::default();

        Config {
            feeds_path: raw
                .feeds_file
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("feed_urls.txt")),
            output_path: raw
                .output_file
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("output").join("merged.xml")),
            channel: ChannelMeta {
                title: raw.channel_title.unwrap_or(defaults.title),
                link: raw.channel_link.unwrap_or(defaults.link),
                description: raw.channel_description.unwrap_or(defaults.description),
            },
            concurrency: raw.concurrency.unwrap_or(1),
            timeout: Duration::from_secs(raw.timeout_secs.unwrap_or(10)),
            user_agent: raw
                .user_agent
                .unwrap_or_else(|| format!("rss-merge/{}", env!("CARGO_PKG_VERSION"))),
            on_fetch_error: raw.on_fetch_error.unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}

/// ~/.config/rss-merge/config.toml (platform equivalent)
pub fn default_config_path() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rss-merge")
        .join("config.toml")
}

/// Load config from `explicit` if given (it must exist), otherwise from the
/// default location if it exists, otherwise use defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let p = default_config_path();
            if !p.exists() {
                tracing::debug!(path = %p.display(), "No config file found, using defaults");
                return Ok(Config::default());
            }
            p
        }
    };

    let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let raw = parse_raw(&contents).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;

    tracing::debug!(path = %path.display(), "Loaded config file");
    let cfg = Config::resolve(raw);
    cfg.validate()?;
    Ok(cfg)
}

fn parse_raw(contents: &str) -> Result<RawConfig, toml::de::Error> {
    if contents.trim().is_empty() {
        return Ok(RawConfig::default());
    }
    toml::from_str(contents)
}
