//! Persisted light/dark preference.
//!
//! Stored as one entry of a small TOML key-value file under the user config
//! directory (`~/.config/prparty/storage.toml` on Linux). Other entries in the
//! file are left untouched.

use crate::model::Theme;
use std::path::{Path, PathBuf};

pub const THEME_KEY: &str = "prparty-theme";

#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to encode storage: {0}")]
    Encode(#[from] toml::ser::Error),
}

#[derive(Debug, Clone)]
pub struct ThemeStore {
    path: PathBuf,
}

impl ThemeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> Result<PathBuf, ThemeError> {
        let base = dirs::config_dir().ok_or(ThemeError::NoConfigDir)?;
        Ok(base.join("prparty").join("storage.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<toml::Table, ThemeError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(toml::Table::new()),
            Err(source) => {
                return Err(ThemeError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        toml::from_str(&contents).map_err(|source| ThemeError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Stored theme, or `Dark` when nothing usable is stored.
    pub fn load(&self) -> Theme {
        match self.read_entries() {
            Ok(entries) => entries
                .get(THEME_KEY)
                .and_then(toml::Value::as_str)
                .and_then(Theme::parse)
                .unwrap_or_default(),
            Err(e) => {
                log::warn!("Falling back to dark theme: {e}");
                Theme::default()
            }
        }
    }

    pub fn save(&self, theme: Theme) -> Result<(), ThemeError> {
        // An unreadable file is replaced rather than blocking the save.
        let mut entries = self.read_entries().unwrap_or_default();
        entries.insert(
            THEME_KEY.to_string(),
            toml::Value::String(theme.as_str().to_string()),
        );
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ThemeError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let encoded = toml::to_string(&entries)?;
        std::fs::write(&self.path, encoded).map_err(|source| ThemeError::Io {
            path: self.path.clone(),
            source,
        })?;
        log::debug!("Saved theme {} to {}", theme.as_str(), self.path.display());
        Ok(())
    }

    /// Persist the opposite of `current` and return it. `current` is the theme
    /// on screen, which may differ from the stored one after a `--theme` override.
    pub fn toggle(&self, current: Theme) -> Result<Theme, ThemeError> {
        let next = current.toggled();
        self.save(next)?;
        Ok(next)
    }
}
