//! Package manifest (`package.json`) lookup.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const MANIFEST_FILE: &str = "package.json";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub svelte: Option<String>,
    #[serde(default)]
    pub main: Option<String>,
}

impl PackageManifest {
    pub fn read(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(MANIFEST_FILE);
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Read the manifest in `dir`, treating a missing or malformed file as
    /// "no manifest".
    pub fn read_optional(dir: &Path) -> Option<Self> {
        if !dir.join(MANIFEST_FILE).is_file() {
            return None;
        }
        match Self::read(dir) {
            Ok(manifest) => Some(manifest),
            Err(err) => {
                tracing::warn!("ignoring package manifest: {}", err);
                None
            }
        }
    }

    /// Primary module entry, falling back to the markup entry.
    pub fn primary_entry(&self) -> Option<&str> {
        self.module
            .as_deref()
            .or(self.svelte.as_deref())
            .or(self.main.as_deref())
    }

    pub fn entry_path(&self, dir: &Path) -> Option<PathBuf> {
        self.primary_entry().map(|entry| dir.join(entry))
    }
}
