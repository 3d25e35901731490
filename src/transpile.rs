//! TypeScript → JavaScript transpilation via oxc.
//!
//! Type annotations are stripped; module syntax is left as ES modules so the
//! walker can keep scanning `import` lines in the output.

use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{TransformOptions, Transformer};
use std::path::Path;

use crate::diagnostic::line_column;
use crate::error::TranspileError;

/// Output target is pinned; callers only choose import elision.
pub const TRANSPILE_TARGET: &str = "es2015";

#[derive(Debug, Clone, Copy, Default)]
pub struct TranspileOptions {
    /// Keep value imports even when the script never references them.
    /// Component scripts need this: imported components are only used from
    /// the markup, which the transpiler cannot see.
    pub preserve_value_imports: bool,
}

pub fn transpile(
    source: &str,
    path: &Path,
    options: TranspileOptions,
) -> Result<String, TranspileError> {
    let allocator = Allocator::default();
    let source_type = SourceType::ts();

    let ret = Parser::new(&allocator, source, source_type).parse();
    if let Some(err) = ret.errors.first() {
        return Err(to_transpile_error(err, source));
    }
    let mut program = ret.program;

    let mut transform_options =
        TransformOptions::from_target(TRANSPILE_TARGET).map_err(|message| TranspileError {
            message,
            position: None,
        })?;
    transform_options.typescript.only_remove_type_imports = options.preserve_value_imports;

    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();
    let ret = Transformer::new(&allocator, path, &transform_options)
        .build_with_scoping(scoping, &mut program);
    if let Some(err) = ret.errors.first() {
        return Err(to_transpile_error(err, source));
    }

    Ok(Codegen::new().build(&program).code)
}

fn to_transpile_error(err: &oxc_diagnostics::OxcDiagnostic, source: &str) -> TranspileError {
    let position = err
        .labels
        .as_ref()
        .and_then(|labels| labels.first())
        .map(|label| line_column(source, label.offset()));
    TranspileError {
        message: err.to_string(),
        position,
    }
}
