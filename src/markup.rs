//! Component markup compilation.
//!
//! The real component compiler lives outside this crate and plugs in through
//! [`MarkupCompiler`]. [`ComponentCompiler`] is the built-in stand-in: it
//! splits a component file into script, style and static markup and emits a
//! small ES module whose default export renders that markup.

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_ast::ast::Statement;
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};
use regex::Regex;
use std::ops::Range;
use std::path::Path;

use crate::diagnostic::{line_column, Diagnostic};
use crate::error::CompileFailure;
use crate::preprocess::{parse_attributes, SCRIPT_REGEX, STYLE_REGEX};

lazy_static! {
    static ref SCRIPT_OPEN: Regex = Regex::new(r"(?i)<script\b").unwrap();
    static ref STYLE_OPEN: Regex = Regex::new(r"(?i)<style\b").unwrap();
    static ref IMG_TAG: Regex = Regex::new(r"(?i)<img\b([^>]*)>").unwrap();
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupOutput {
    pub js: String,
    pub css: String,
    pub warnings: Vec<Diagnostic>,
}

pub trait MarkupCompiler: Send + Sync {
    fn compile(&self, source: &str, filename: &Path) -> Result<MarkupOutput, CompileFailure>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentCompiler;

impl MarkupCompiler for ComponentCompiler {
    fn compile(&self, source: &str, filename: &Path) -> Result<MarkupOutput, CompileFailure> {
        let script_blocks = block_ranges(source, &SCRIPT_REGEX);
        let style_blocks = block_ranges(source, &STYLE_REGEX);
        check_closed(source, &SCRIPT_OPEN, &script_blocks, "script")?;
        check_closed(source, &STYLE_OPEN, &style_blocks, "style")?;

        let mut imports = Vec::new();
        let mut body = Vec::new();
        for caps in SCRIPT_REGEX.captures_iter(source) {
            if let Some(content) = caps.get(2) {
                split_script(source, content.start(), content.as_str(), &mut imports, &mut body)?;
            }
        }

        let css = STYLE_REGEX
            .captures_iter(source)
            .filter_map(|caps| caps.get(2).map(|m| m.as_str().trim().to_string()))
            .filter(|style| !style.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        let without_scripts = SCRIPT_REGEX.replace_all(source, "");
        let markup = STYLE_REGEX.replace_all(&without_scripts, "");
        let template = serde_json::to_string(markup.trim())
            .map_err(|e| CompileFailure::new(e.to_string(), None))?;

        let mut js = String::new();
        for import in &imports {
            js.push_str(import);
            js.push('\n');
        }
        for statement in &body {
            js.push_str(statement);
            js.push('\n');
        }
        js.push_str(&format!(
            "const template = {template};\n\n\
             class Component {{\n\
             \tconstructor(options) {{\n\
             \t\tthis.target = options.target;\n\
             \t\tthis.target.insertAdjacentHTML(\"beforeend\", template);\n\
             \t}}\n\
             }}\n\n\
             export default Component;\n"
        ));

        let warnings = missing_alt_warnings(source, &script_blocks, filename);

        Ok(MarkupOutput { js, css, warnings })
    }
}

fn block_ranges(source: &str, block: &Regex) -> Vec<Range<usize>> {
    block.find_iter(source).map(|m| m.range()).collect()
}

fn check_closed(
    source: &str,
    open: &Regex,
    blocks: &[Range<usize>],
    tag: &str,
) -> Result<(), CompileFailure> {
    for m in open.find_iter(source) {
        if !blocks.iter().any(|block| block.contains(&m.start())) {
            return Err(CompileFailure::new(
                format!("<{tag}> must have a closing tag"),
                Some(line_column(source, m.start())),
            ));
        }
    }
    Ok(())
}

/// Parse one script block, sorting its statements into hoisted imports and
/// everything else. Positions are reported in file coordinates.
fn split_script(
    source: &str,
    offset: usize,
    script: &str,
    imports: &mut Vec<String>,
    body: &mut Vec<String>,
) -> Result<(), CompileFailure> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, script, SourceType::mjs()).parse();

    if let Some(err) = ret.errors.first() {
        let position = err
            .labels
            .as_ref()
            .and_then(|labels| labels.first())
            .map(|label| line_column(source, offset + label.offset()));
        return Err(CompileFailure::new(err.to_string(), position));
    }

    for directive in &ret.program.directives {
        body.push(slice(script, directive.span).to_string());
    }

    for stmt in &ret.program.body {
        let span = stmt.span();
        match stmt {
            Statement::ImportDeclaration(_) => imports.push(slice(script, span).to_string()),
            Statement::ExportDefaultDeclaration(_) => {
                return Err(CompileFailure::new(
                    "A component cannot have a default export",
                    Some(line_column(source, offset + span.start as usize)),
                ));
            }
            _ => body.push(slice(script, span).to_string()),
        }
    }

    Ok(())
}

fn slice(script: &str, span: oxc_span::Span) -> &str {
    &script[span.start as usize..span.end as usize]
}

fn missing_alt_warnings(
    source: &str,
    script_blocks: &[Range<usize>],
    filename: &Path,
) -> Vec<Diagnostic> {
    IMG_TAG
        .captures_iter(source)
        .filter_map(|caps| {
            let tag = caps.get(0)?;
            if script_blocks.iter().any(|block| block.contains(&tag.start())) {
                return None;
            }
            let attrs = parse_attributes(caps.get(1).map(|m| m.as_str()).unwrap_or(""));
            if attrs.contains_key("alt") {
                return None;
            }
            Some(
                Diagnostic::warning(
                    line_column(source, tag.start()),
                    "A11y: <img> element should have an alt attribute",
                )
                .in_file(filename),
            )
        })
        .collect()
}
