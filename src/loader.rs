//! Source loading: open editor buffers first, then disk.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::WalkError;

pub const MODULE_DIR_NAME: &str = "node_modules";

/// Editor buffers currently open in the host, keyed by file path.
pub trait OpenBuffers {
    fn text(&self, path: &Path) -> Option<String>;
}

/// No editor attached; everything comes from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBuffers;

impl OpenBuffers for NoBuffers {
    fn text(&self, _path: &Path) -> Option<String> {
        None
    }
}

impl OpenBuffers for HashMap<PathBuf, String> {
    fn text(&self, path: &Path) -> Option<String> {
        self.get(path).cloned()
    }
}

pub struct SourceLoader<'a> {
    buffers: &'a dyn OpenBuffers,
}

impl<'a> SourceLoader<'a> {
    pub fn new(buffers: &'a dyn OpenBuffers) -> Self {
        Self { buffers }
    }

    /// Load `path`, reporting `specifier` if it cannot be found.
    pub fn load(&self, path: &Path, specifier: &str) -> Result<String, WalkError> {
        if let Some(text) = self.buffers.text(path) {
            tracing::trace!(path = %path.display(), "loaded from open buffer");
            return Ok(text);
        }
        if !path.is_file() {
            return Err(WalkError::not_found(specifier));
        }
        fs::read_to_string(path).map_err(|err| {
            tracing::warn!(path = %path.display(), "failed to read module: {}", err);
            WalkError::not_found(specifier)
        })
    }
}

/// Nearest `node_modules` directory at or above the directory of `file`.
pub fn locate_module_dir(file: &Path) -> Option<PathBuf> {
    file.parent()?
        .ancestors()
        .map(|dir| dir.join(MODULE_DIR_NAME))
        .find(|candidate| candidate.is_dir())
}
