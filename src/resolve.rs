//! Import specifier resolution.
//!
//! Precedence, first match wins:
//! 1. relative specifiers (`./`, `../`) against the importing file,
//! 2. path aliases from the project configuration,
//! 3. bare specifiers against the package module directory.
//!
//! Resolution only looks at the filesystem; it never reads module content.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::config::AliasTable;
use crate::error::ResolveError;
use crate::manifest::PackageManifest;

/// Extensions tried for an extension-less relative specifier.
pub const RELATIVE_EXTENSIONS: [&str; 3] = [".js", ".mjs", ".ts"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub path: PathBuf,
    /// Resolved from the package module directory.
    pub is_package: bool,
}

impl Resolved {
    fn local(path: PathBuf) -> Self {
        Self {
            path,
            is_package: false,
        }
    }

    fn package(path: PathBuf) -> Self {
        Self {
            path,
            is_package: true,
        }
    }
}

pub struct PathResolver {
    module_dir: Option<PathBuf>,
    aliases: Option<AliasTable>,
}

impl PathResolver {
    pub fn new(module_dir: Option<PathBuf>, aliases: Option<AliasTable>) -> Self {
        Self {
            module_dir: module_dir.map(|dir| absolute(&dir)),
            aliases,
        }
    }

    pub fn resolve(&self, specifier: &str, importer: &Path) -> Result<Resolved, ResolveError> {
        if specifier.starts_with('.') {
            return self.resolve_relative(specifier, importer);
        }

        if let Some(path) = self.aliases.as_ref().and_then(|table| table.resolve(specifier)) {
            return Ok(Resolved::local(path));
        }

        self.resolve_package(specifier)
    }

    fn resolve_relative(&self, specifier: &str, importer: &Path) -> Result<Resolved, ResolveError> {
        let dir = importer.parent().unwrap_or(Path::new("."));
        let target = absolute(&dir.join(specifier));

        if has_extension(&target) && !target.is_dir() {
            return Ok(Resolved::local(target));
        }
        if let Some(path) = probe(&target, &RELATIVE_EXTENSIONS) {
            return Ok(Resolved::local(path));
        }

        PackageManifest::read_optional(&target)
            .and_then(|manifest| manifest.entry_path(&target))
            .map(|path| Resolved::local(normalize(&path)))
            .ok_or_else(|| not_found(specifier))
    }

    fn resolve_package(&self, specifier: &str) -> Result<Resolved, ResolveError> {
        let module_dir = self.module_dir.as_ref().ok_or_else(|| not_found(specifier))?;
        let target = normalize(&module_dir.join(specifier));

        // `chart.js`, `lodash.debounce`: dotted package directories.
        if has_extension(&target) && !target.is_dir() {
            return Ok(Resolved::package(target));
        }

        probe(&target, &[".js", ".ts"])
            .or_else(|| {
                PackageManifest::read_optional(&target)
                    .and_then(|manifest| manifest.entry_path(&target))
                    .map(|path| normalize(&path))
            })
            .or_else(|| probe(&target, &[".mjs"]))
            .or_else(|| probe(&target.join("index"), &[".js", ".ts"]))
            .map(Resolved::package)
            .ok_or_else(|| not_found(specifier))
    }
}

fn not_found(specifier: &str) -> ResolveError {
    ResolveError::NotFound {
        specifier: specifier.to_string(),
    }
}

/// First `base + ext` that is an existing file. An empty extension tests
/// `base` itself.
pub(crate) fn probe(base: &Path, extensions: &[&str]) -> Option<PathBuf> {
    extensions
        .iter()
        .map(|ext| with_suffix(base, ext))
        .find(|candidate| candidate.is_file())
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// `true` when the last path segment ends in `.<word>`.
pub fn has_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_alphanumeric() || c == '_'))
        .unwrap_or(false)
}

/// Make `path` absolute against the current directory, then normalize it.
pub fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        let cwd = std::env::current_dir().unwrap_or_default();
        normalize(&cwd.join(path))
    }
}

/// Lexically remove `.` and `..` segments.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
