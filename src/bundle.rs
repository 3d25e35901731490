//! The aggregated walk output handed to the webview.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::compile::CompiledUnit;
use crate::diagnostic::Diagnostic;
use crate::error::WalkError;

pub const BREADCRUMB_SEPARATOR: char = '>';

/// Chain of import specifiers from the entry file to a unit. The entry owns
/// the empty breadcrumb; every import appends `>` + specifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Breadcrumb(String);

impl Breadcrumb {
    pub fn entry() -> Self {
        Self(String::new())
    }

    pub fn child(&self, specifier: &str) -> Self {
        Self(format!("{}{}{}", self.0, BREADCRUMB_SEPARATOR, specifier))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.matches(BREADCRUMB_SEPARATOR).count()
    }
}

impl fmt::Display for Breadcrumb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    /// Compiled script per breadcrumb.
    #[serde(rename = "js")]
    pub scripts: BTreeMap<String, String>,
    /// Styles of every visited unit, in discovery order.
    #[serde(rename = "css")]
    pub style: String,
    #[serde(rename = "err")]
    pub diagnostics: Vec<Diagnostic>,
    /// Originating file per breadcrumb.
    #[serde(rename = "sourceMap")]
    pub paths: BTreeMap<String, String>,
}

impl Bundle {
    /// A bundle carrying nothing but diagnostics.
    pub fn failed(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            diagnostics,
            ..Self::default()
        }
    }

    pub fn not_found(err: &WalkError) -> Self {
        Self::failed(vec![err.to_diagnostic()])
    }

    pub fn record(&mut self, breadcrumb: &Breadcrumb, unit: CompiledUnit) {
        self.paths.insert(
            breadcrumb.to_string(),
            unit.path.to_string_lossy().to_string(),
        );
        if let Some(script) = unit.script {
            self.scripts.insert(breadcrumb.to_string(), script);
        }
        self.style.push_str(&unit.style);
        self.diagnostics.extend(unit.diagnostics);
    }

    pub fn script(&self, breadcrumb: &str) -> Option<&str> {
        self.scripts.get(breadcrumb).map(String::as_str)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}
