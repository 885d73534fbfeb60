//! Configuration file support for prparty.
//!
//! Loads settings from `~/.config/prparty/config.toml` (or platform equivalent).
//! CLI arguments take precedence over config file values.

use crate::feed::{DEFAULT_FEED, FeedSource};
use crate::refresh::DEFAULT_REFRESH_SECS;
use serde::Deserialize;
use std::path::PathBuf;

/// Configuration loaded from TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Feed location: an http(s) URL or a local path.
    pub feed: Option<String>,

    /// Auto-refresh interval (seconds). Default: 20.
    pub refresh_interval_secs: Option<u64>,

    /// Ring the terminal bell on the first celebration.
    pub bell: Option<bool>,

    /// Disable the desktop notification on the first celebration.
    pub no_notifications: Option<bool>,

    /// Log level for the log file (error, warn, info, debug, trace).
    pub log_level: Option<String>,
}

/// CLI values that can override the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub feed: Option<String>,
    pub demo: bool,
    pub refresh_secs: Option<u64>,
    pub no_bell: bool,
    pub no_notifications: bool,
}

/// Effective settings after merging CLI over config over defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub source: FeedSource,
    pub refresh_secs: u64,
    pub bell: bool,
    pub desktop_notifications: bool,
    pub log_level: Option<String>,
}

impl Settings {
    pub fn resolve(cli: &Overrides, config: &Config) -> Settings {
        let source = if cli.demo {
            FeedSource::Demo
        } else {
            let location = cli
                .feed
                .as_deref()
                .or(config.feed.as_deref())
                .unwrap_or(DEFAULT_FEED);
            FeedSource::parse(location)
        };
        let refresh_secs = cli
            .refresh_secs
            .or(config.refresh_interval_secs)
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_REFRESH_SECS);
        Settings {
            source,
            refresh_secs,
            bell: !cli.no_bell && config.bell.unwrap_or(true),
            desktop_notifications: !cli.no_notifications
                && !config.no_notifications.unwrap_or(false),
            log_level: config.log_level.clone(),
        }
    }
}

/// Returns the path to the config file.
/// Platform-specific: `~/.config/prparty/config.toml` on Linux,
/// `~/Library/Application Support/prparty/config.toml` on macOS,
/// `%APPDATA%\prparty\config.toml` on Windows.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("prparty").join("config.toml"))
}

/// Load configuration from the config file.
/// Returns default config if the file doesn't exist or can't be parsed.
pub fn load_config() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };

    if !path.exists() {
        return Config::default();
    }

    // The logger is not up yet, so problems go to stderr.
    match std::fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to parse config file at {}: {}",
                    path.display(),
                    e
                );
                Config::default()
            }
        },
        Err(e) => {
            eprintln!(
                "Warning: Failed to read config file at {}: {}",
                path.display(),
                e
            );
            Config::default()
        }
    }
}
