//! Error types for the bundler.
//!
//! Only [`WalkError`] is allowed to unwind a whole walk. Everything else is
//! turned into a [`Diagnostic`](crate::diagnostic::Diagnostic) or a logged
//! fallback before it leaves the module that produced it.

use std::path::PathBuf;
use thiserror::Error;

use crate::diagnostic::{Diagnostic, Position};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalkError {
    #[error("module not found: {specifier}")]
    ModuleNotFound { specifier: String },
}

impl WalkError {
    pub fn not_found(specifier: impl Into<String>) -> Self {
        WalkError::ModuleNotFound {
            specifier: specifier.into(),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(Position::ZERO, self.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("cannot resolve '{specifier}'")]
    NotFound { specifier: String },
}

impl From<ResolveError> for WalkError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound { specifier } => WalkError::ModuleNotFound { specifier },
        }
    }
}

/// Failure reading a project configuration file or package manifest.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Json5 {
        path: PathBuf,
        #[source]
        source: json5::Error,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TranspileError {
    pub message: String,
    pub position: Option<Position>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CompileFailure {
    pub message: String,
    pub position: Option<Position>,
}

impl CompileFailure {
    pub fn new(message: impl Into<String>, position: Option<Position>) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.position.unwrap_or(Position::ZERO), self.message.clone())
    }
}

impl From<TranspileError> for CompileFailure {
    fn from(err: TranspileError) -> Self {
        CompileFailure {
            message: err.message,
            position: err.position,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[{preprocessor}] {message}")]
pub struct PreprocessError {
    pub preprocessor: &'static str,
    pub message: String,
    pub position: Option<Position>,
}

impl From<PreprocessError> for CompileFailure {
    fn from(err: PreprocessError) -> Self {
        CompileFailure {
            message: err.to_string(),
            position: err.position,
        }
    }
}
