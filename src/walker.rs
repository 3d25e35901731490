//! Bundle walker: entry compilation plus a depth-first walk of every import
//! reachable from it.
//!
//! Each walk owns its [`Bundle`]. Imports are found by a line-anchored scan
//! of the compiled script text and processed left to right; a dependency is
//! compiled, recorded, and recursed into before the next sibling import.
//! The first specifier that cannot be found aborts the whole walk.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::bundle::{Breadcrumb, Bundle};
use crate::compile::{strip_leading_imports, CompileOptions, UnitCompiler};
use crate::config::AliasTable;
use crate::error::{ConfigError, WalkError};
use crate::loader::{locate_module_dir, NoBuffers, OpenBuffers, SourceLoader};
use crate::resolve::{absolute, PathResolver};

/// Specifier served by the injected runtime-support script.
pub const RUNTIME_SPECIFIER: &str = "svelte/internal";

lazy_static! {
    /// `import ... "x"` / `import ... 'x'` at the start of a line.
    static ref IMPORT_STATEMENT: Regex = Regex::new(r#"(?m)^\s*import.+?["'](.+)["']"#).unwrap();
}

/// Import specifiers in `script`, in source order.
pub fn scan_imports(script: &str) -> Vec<String> {
    IMPORT_STATEMENT
        .captures_iter(script)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateOptions {
    /// Package module directory; located from the entry file when absent.
    pub module_dir: Option<PathBuf>,
    pub strip_imports: bool,
    pub auto_mount: bool,
    pub mount_target: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            module_dir: None,
            strip_imports: false,
            auto_mount: false,
            mount_target: "body".to_string(),
        }
    }
}

impl GenerateOptions {
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            strip_imports: self.strip_imports,
            auto_mount: self.auto_mount,
            mount_target: self.mount_target.clone(),
        }
    }
}

#[derive(Default)]
pub struct Bundler {
    compiler: UnitCompiler,
    runtime: Option<String>,
}

impl Bundler {
    pub fn new(compiler: UnitCompiler) -> Self {
        Self {
            compiler,
            runtime: None,
        }
    }

    pub fn with_runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = Some(runtime.into());
        self
    }

    /// Read the runtime-support script once; it is reused by every bundle.
    pub fn load_runtime(self, path: &Path) -> Result<Self, ConfigError> {
        let runtime = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.with_runtime(runtime))
    }

    pub fn generate(
        &self,
        source: &str,
        file_path: &Path,
        buffers: &dyn OpenBuffers,
        options: &GenerateOptions,
    ) -> Bundle {
        let file_path = absolute(file_path);

        // Imports are scanned before stripping; only the recorded entry
        // script loses them.
        let compile_options = CompileOptions {
            strip_imports: false,
            ..options.compile_options()
        };
        let mut entry = self
            .compiler
            .compile_component(source, &file_path, &compile_options);
        if entry.has_errors() {
            tracing::debug!(path = %file_path.display(), "entry failed to compile");
            return Bundle::failed(entry.diagnostics);
        }

        let module_dir = options
            .module_dir
            .clone()
            .or_else(|| locate_module_dir(&file_path));
        let config_start = module_dir
            .as_deref()
            .and_then(Path::parent)
            .or_else(|| file_path.parent())
            .map(Path::to_path_buf);
        let aliases = config_start.and_then(|start| AliasTable::discover(&start));

        let mut walk = Walk {
            compiler: &self.compiler,
            resolver: PathResolver::new(module_dir, aliases),
            loader: SourceLoader::new(buffers),
            runtime_provided: self.runtime.is_some(),
            bundle: Bundle::default(),
            in_progress: HashMap::new(),
        };

        let root = Breadcrumb::entry();
        let script = entry.script.clone().unwrap_or_default();
        if options.strip_imports {
            entry.script = entry.script.map(|js| strip_leading_imports(&js));
        }
        let recorded = entry.script.clone();
        walk.bundle.record(&root, entry);
        if let Some(runtime) = &self.runtime {
            let crumb = root.child(RUNTIME_SPECIFIER);
            walk.bundle.scripts.insert(crumb.to_string(), runtime.clone());
            walk.bundle
                .paths
                .insert(crumb.to_string(), RUNTIME_SPECIFIER.to_string());
        }
        walk.in_progress.insert(file_path.clone(), recorded);

        match walk.visit(&script, &file_path, &root) {
            Ok(()) => {
                tracing::info!(
                    entry = %file_path.display(),
                    units = walk.bundle.paths.len(),
                    diagnostics = walk.bundle.diagnostics.len(),
                    "bundle ready"
                );
                walk.bundle
            }
            Err(err) => {
                tracing::debug!(entry = %file_path.display(), "walk aborted: {}", err);
                Bundle::not_found(&err)
            }
        }
    }
}

/// Bundle `source` with the built-in compiler, no runtime script and no
/// editor buffers.
pub fn generate(source: &str, file_path: &Path, options: &GenerateOptions) -> Bundle {
    Bundler::default().generate(source, file_path, &NoBuffers, options)
}

struct Walk<'a> {
    compiler: &'a UnitCompiler,
    resolver: PathResolver,
    loader: SourceLoader<'a>,
    runtime_provided: bool,
    bundle: Bundle,
    /// Units on the current import chain and their compiled scripts.
    in_progress: HashMap<PathBuf, Option<String>>,
}

impl Walk<'_> {
    fn visit(&mut self, script: &str, file: &Path, breadcrumb: &Breadcrumb) -> Result<(), WalkError> {
        for specifier in scan_imports(script) {
            if self.runtime_provided && specifier == RUNTIME_SPECIFIER {
                continue;
            }

            let crumb = breadcrumb.child(&specifier);
            let resolved = self.resolver.resolve(&specifier, file)?;
            let path = resolved.path;

            if let Some(compiled) = self.in_progress.get(&path).cloned() {
                tracing::debug!(
                    breadcrumb = %crumb,
                    path = %path.display(),
                    "import cycle, reusing compiled unit"
                );
                self.bundle
                    .paths
                    .insert(crumb.to_string(), path.to_string_lossy().to_string());
                if let Some(compiled) = compiled {
                    self.bundle.scripts.insert(crumb.to_string(), compiled);
                }
                continue;
            }

            let content = self.loader.load(&path, &specifier)?;
            tracing::debug!(
                breadcrumb = %crumb,
                path = %path.display(),
                package = resolved.is_package,
                "resolved import"
            );

            let unit = self.compiler.compile_dependency(&content, &path);
            let compiled = unit.script.clone();
            let next = compiled
                .clone()
                .filter(|js| !js.is_empty())
                .unwrap_or(content);
            self.bundle.record(&crumb, unit);

            self.in_progress.insert(path.clone(), compiled);
            let result = self.visit(&next, &path, &crumb);
            self.in_progress.remove(&path);
            result?;
        }
        Ok(())
    }
}

#[cfg(feature = "napi")]
mod native {
    use napi_derive::napi;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::OnceLock;

    use super::{Bundler, GenerateOptions};

    static RUNTIME: OnceLock<String> = OnceLock::new();

    #[napi]
    pub fn load_runtime_native(path: String) -> napi::Result<()> {
        let runtime = std::fs::read_to_string(&path)
            .map_err(|e| napi::Error::from_reason(format!("failed to read {}: {}", path, e)))?;
        let _ = RUNTIME.set(runtime);
        Ok(())
    }

    #[napi]
    pub fn generate_native(
        code: String,
        filename: String,
        options: Option<serde_json::Value>,
        open_buffers: Option<HashMap<String, String>>,
    ) -> napi::Result<serde_json::Value> {
        let options: GenerateOptions = match options {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| napi::Error::from_reason(format!("Invalid options: {}", e)))?,
            None => GenerateOptions::default(),
        };
        let buffers: HashMap<PathBuf, String> = open_buffers
            .unwrap_or_default()
            .into_iter()
            .map(|(path, text)| (PathBuf::from(path), text))
            .collect();

        let mut bundler = Bundler::default();
        if let Some(runtime) = RUNTIME.get() {
            bundler = bundler.with_runtime(runtime.clone());
        }

        let bundle = bundler.generate(&code, Path::new(&filename), &buffers, &options);
        serde_json::to_value(bundle).map_err(|e| napi::Error::from_reason(e.to_string()))
    }
}
