//! Project configuration: path aliases from `tsconfig.json` / `jsconfig.json`.
//!
//! The file is parsed once per walk as JSON5, so comments, trailing commas
//! and single-quoted strings are accepted. Patterns keep their declaration order
//! because alias precedence depends on it (the last matching pattern wins).

use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::resolve::{normalize, probe};

pub const CONFIG_FILES: [&str; 2] = ["tsconfig.json", "jsconfig.json"];

/// Extensions tried after an alias substitution, in order.
pub const ALIAS_EXTENSIONS: [&str; 5] = ["", ".js", ".cjs", ".ts", ".svelte"];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(default)]
    compiler_options: RawCompilerOptions,
    #[serde(default)]
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    paths: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct AliasEntry {
    pub pattern: String,
    matcher: Regex,
    pub templates: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AliasTable {
    pub config_path: PathBuf,
    pub base_dir: PathBuf,
    pub entries: Vec<AliasEntry>,
}

impl AliasTable {
    /// Search upward from `start` for a project configuration file.
    /// Unreadable or malformed files are logged and treated as absent.
    pub fn discover(start: &Path) -> Option<Self> {
        let config_path = find_config(start)?;
        match Self::load(&config_path) {
            Ok(table) => {
                tracing::debug!(
                    config = %config_path.display(),
                    aliases = table.entries.len(),
                    "loaded path aliases"
                );
                Some(table)
            }
            Err(err) => {
                tracing::warn!("ignoring project configuration: {}", err);
                None
            }
        }
    }

    pub fn load(config_path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        let raw: RawConfig = json5::from_str(&content).map_err(|source| ConfigError::Json5 {
            path: config_path.to_path_buf(),
            source,
        })?;

        let config_dir = config_path.parent().unwrap_or(Path::new("."));
        let base_url = raw
            .compiler_options
            .base_url
            .or(raw.base_url)
            .unwrap_or_else(|| ".".to_string());

        let entries = raw
            .compiler_options
            .paths
            .into_iter()
            .map(|(pattern, value)| {
                let templates = match value {
                    serde_json::Value::Array(items) => items
                        .into_iter()
                        .filter_map(|item| item.as_str().map(str::to_string))
                        .collect(),
                    serde_json::Value::String(single) => vec![single],
                    _ => Vec::new(),
                };
                AliasEntry {
                    matcher: glob_to_regex(&pattern),
                    pattern,
                    templates,
                }
            })
            .collect();

        Ok(Self {
            config_path: config_path.to_path_buf(),
            base_dir: config_dir.join(base_url),
            entries,
        })
    }

    /// Resolve `specifier` through the alias patterns.
    ///
    /// Every matching pattern is tried; a later match that finds a file
    /// replaces an earlier one. Within one pattern the first template that
    /// exists wins.
    pub fn resolve(&self, specifier: &str) -> Option<PathBuf> {
        let mut found = None;
        for entry in &self.entries {
            let Some(caps) = entry.matcher.captures(specifier) else {
                continue;
            };
            let wildcard = caps.get(1).map_or("", |m| m.as_str());
            for template in &entry.templates {
                let candidate = normalize(&self.base_dir.join(template.replacen('*', wildcard, 1)));
                if let Some(path) = probe(&candidate, &ALIAS_EXTENSIONS) {
                    tracing::trace!(pattern = %entry.pattern, path = %path.display(), "alias match");
                    found = Some(path);
                    break;
                }
            }
        }
        found
    }
}

fn find_config(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

/// Compile a `paths` glob to an anchored regex; `*` captures.
pub fn glob_to_regex(pattern: &str) -> Regex {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("(.*)");
    Regex::new(&format!("^{body}$")).unwrap_or_else(|_| Regex::new("$^").unwrap())
}
