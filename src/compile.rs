//! Unit compilation: one source file in, script + style + diagnostics out.
//!
//! Failures never escape this module. A unit that fails to preprocess or
//! compile comes back with empty outputs and exactly one error diagnostic.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::diagnostic::{Diagnostic, Position};
use crate::error::CompileFailure;
use crate::markup::{ComponentCompiler, MarkupCompiler};
use crate::preprocess::Preprocessors;
use crate::transpile::{transpile, TranspileOptions};

pub const COMPONENT_EXTENSION: &str = "svelte";

lazy_static! {
    static ref LEADING_IMPORT: Regex =
        Regex::new(r#"^\s*import\b[\s\S]*?["'];?[ \t]*(?:\r?\n|$)"#).unwrap();
    static ref DEFAULT_EXPORT: Regex = Regex::new(r"\nexport default .+").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnitKind {
    Component,
    TypeScript,
    JavaScript,
    Unrecognized,
}

impl UnitKind {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(COMPONENT_EXTENSION) => UnitKind::Component,
            Some("ts") => UnitKind::TypeScript,
            Some("js") | Some("mjs") => UnitKind::JavaScript,
            _ => UnitKind::Unrecognized,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOptions {
    /// Drop the leading import declarations from the compiled script.
    pub strip_imports: bool,
    /// Replace the default export with an instantiation against `mount_target`.
    pub auto_mount: bool,
    pub mount_target: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            strip_imports: false,
            auto_mount: false,
            mount_target: "body".to_string(),
        }
    }
}

/// One compiled source file. `script` is `None` for units that produce no
/// bundle entry (unrecognized kinds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledUnit {
    pub path: PathBuf,
    pub kind: UnitKind,
    pub script: Option<String>,
    pub style: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompiledUnit {
    fn failed(path: &Path, kind: UnitKind, diagnostic: Diagnostic) -> Self {
        Self {
            path: path.to_path_buf(),
            kind,
            script: Some(String::new()),
            style: String::new(),
            diagnostics: vec![diagnostic.in_file(path)],
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

pub struct UnitCompiler {
    preprocessors: Preprocessors,
    markup: Box<dyn MarkupCompiler>,
}

impl Default for UnitCompiler {
    fn default() -> Self {
        Self::new(Preprocessors::standard(), ComponentCompiler)
    }
}

impl UnitCompiler {
    pub fn new(preprocessors: Preprocessors, markup: impl MarkupCompiler + 'static) -> Self {
        Self {
            preprocessors,
            markup: Box::new(markup),
        }
    }

    pub fn compile_component(
        &self,
        source: &str,
        path: &Path,
        options: &CompileOptions,
    ) -> CompiledUnit {
        let kind = UnitKind::Component;

        let preprocessed = match self.preprocessors.run(source, path) {
            Ok(Some(code)) => code,
            Ok(None) => {
                return CompiledUnit::failed(
                    path,
                    kind,
                    Diagnostic::error(Position::NONE, "failed to preprocess"),
                )
            }
            Err(err) => {
                return CompiledUnit::failed(path, kind, CompileFailure::from(err).to_diagnostic())
            }
        };

        let output = match self.markup.compile(&preprocessed, path) {
            Ok(output) => output,
            Err(failure) => return CompiledUnit::failed(path, kind, failure.to_diagnostic()),
        };

        let mut js = output.js;
        if options.strip_imports {
            js = strip_leading_imports(&js);
        }
        if options.auto_mount {
            js = auto_mount(&js, &options.mount_target);
        }

        tracing::debug!(
            path = %path.display(),
            warnings = output.warnings.len(),
            "compiled component"
        );

        CompiledUnit {
            path: path.to_path_buf(),
            kind,
            script: Some(js),
            style: output.css,
            diagnostics: output
                .warnings
                .into_iter()
                .map(|warning| warning.in_file(path))
                .collect(),
        }
    }

    /// Compile a unit reached through an import, dispatching on its kind.
    pub fn compile_dependency(&self, source: &str, path: &Path) -> CompiledUnit {
        let kind = UnitKind::from_path(path);
        match kind {
            UnitKind::Component => {
                self.compile_component(source, path, &CompileOptions::default())
            }
            UnitKind::TypeScript => match transpile(source, path, TranspileOptions::default()) {
                Ok(js) => CompiledUnit {
                    path: path.to_path_buf(),
                    kind,
                    script: Some(js),
                    style: String::new(),
                    diagnostics: Vec::new(),
                },
                Err(err) => CompiledUnit::failed(
                    path,
                    kind,
                    Diagnostic::error(Position::ZERO, err.message),
                ),
            },
            UnitKind::JavaScript => CompiledUnit {
                path: path.to_path_buf(),
                kind,
                script: Some(source.to_string()),
                style: String::new(),
                diagnostics: Vec::new(),
            },
            UnitKind::Unrecognized => CompiledUnit {
                path: path.to_path_buf(),
                kind,
                script: None,
                style: String::new(),
                diagnostics: Vec::new(),
            },
        }
    }
}

/// Remove the block of import declarations at the top of a script.
pub fn strip_leading_imports(js: &str) -> String {
    let mut rest = js;
    while let Some(m) = LEADING_IMPORT.find(rest) {
        rest = &rest[m.end()..];
    }
    rest.to_string()
}

/// Swap `export default ...` for an instantiation mounted on `target`.
pub fn auto_mount(js: &str, target: &str) -> String {
    let selector = serde_json::to_string(target).unwrap_or_else(|_| "\"body\"".to_string());
    let mount = format!(
        "\nnew Component({{\n\ttarget: document.querySelector({selector})\n}});"
    );
    DEFAULT_EXPORT.replace(js, regex::NoExpand(&mount)).to_string()
}
