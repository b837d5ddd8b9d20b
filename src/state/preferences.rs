//! User preference store
//!
//! A JSON file of string-keyed boolean flags. The only flag the
//! application uses is `dark-mode`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{FxError, Result};

/// Key of the dark-mode flag
pub const DARK_MODE_KEY: &str = "dark-mode";

/// Colour scheme for rendered output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn from_dark_mode(dark: bool) -> Self {
        if dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    /// Surface background colour
    pub fn background(self) -> &'static str {
        match self {
            Theme::Light => "#f3f4f6",
            Theme::Dark => "#111827",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PreferenceFile {
    #[serde(default)]
    flags: BTreeMap<String, bool>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// File-backed preference flags
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
    data: PreferenceFile,
}

impl PreferenceStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            debug!("No preference file at {}, starting empty", path.display());
            PreferenceFile::default()
        };
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value of a flag, `None` if never set
    pub fn get(&self, key: &str) -> Option<bool> {
        self.data.flags.get(key).copied()
    }

    /// Set a flag and persist immediately
    pub fn set(&mut self, key: &str, value: bool) -> Result<()> {
        self.data.flags.insert(key.to_string(), value);
        self.data.updated_at = Some(Utc::now());
        self.save()
    }

    /// When a flag was last written
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.data.updated_at
    }

    /// Dark mode as stored, falling back to `system_default` when unset
    pub fn dark_mode(&self, system_default: bool) -> bool {
        self.get(DARK_MODE_KEY).unwrap_or(system_default)
    }

    pub fn theme(&self, system_default: bool) -> Theme {
        Theme::from_dark_mode(self.dark_mode(system_default))
    }

    /// Flip dark mode, persist it and return the new value
    pub fn toggle_dark_mode(&mut self, system_default: bool) -> Result<bool> {
        let dark = !self.dark_mode(system_default);
        self.set(DARK_MODE_KEY, dark)?;
        info!("Dark mode {}", if dark { "enabled" } else { "disabled" });
        Ok(dark)
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(FxError::FileNotFound {
                    path: parent.to_path_buf(),
                });
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.data)?)?;
        Ok(())
    }
}
