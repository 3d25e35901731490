//! # Component Preview Bundler
//!
//! Compiles a tree of component source files into one in-memory bundle for
//! live preview, without an external bundler.
//!
//! ## Walk Invariants
//!
//! 1. **Breadcrumb Keys**: every bundle entry is keyed by the chain of import
//!    specifiers that reached it (`>./A.svelte>./util`). The entry file owns
//!    `""`. The same file imported from two parents yields two entries.
//!
//! 2. **Resolution Precedence**: relative specifiers, then path aliases,
//!    then the package module directory. For aliases the last matching
//!    pattern wins.
//!
//! 3. **Depth-First Order**: imports are processed in the order they appear
//!    in each unit's compiled script; a dependency's own imports are walked
//!    before its next sibling. Styles and diagnostics follow that order.
//!
//! 4. **Fatal Not-Found**: the first specifier that does not resolve to an
//!    existing file (or open buffer) discards the whole bundle and yields a
//!    single diagnostic naming it.
//!
//! 5. **Local Failures**: preprocessing and compile failures are fatal to
//!    their unit only and surface as diagnostics.
//!
//! 6. **Cycles**: a file already on the current import chain is recorded
//!    with its existing compiled output and not walked again.

#[cfg(feature = "napi")]
use napi_derive::napi;

pub mod bundle;
pub mod compile;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod markup;
pub mod preprocess;
pub mod resolve;
pub mod transpile;
pub mod walker;

#[cfg(test)]
mod bundle_tests;

pub use bundle::{Breadcrumb, Bundle};
pub use compile::{CompileOptions, CompiledUnit, UnitCompiler, UnitKind};
pub use diagnostic::{Diagnostic, Position, Severity};
pub use error::{ConfigError, ResolveError, WalkError};
pub use loader::{NoBuffers, OpenBuffers};
pub use markup::{ComponentCompiler, MarkupCompiler, MarkupOutput};
pub use preprocess::{Preprocessor, Preprocessors};
pub use resolve::{PathResolver, Resolved};
pub use walker::{generate, scan_imports, Bundler, GenerateOptions, RUNTIME_SPECIFIER};

#[cfg(feature = "napi")]
#[napi]
pub fn bundler_bridge() -> String {
    "Preview Bundler Native Bridge Connected".to_string()
}
