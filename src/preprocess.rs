//! Script/style/markup preprocessing ahead of component compilation.
//!
//! Preprocessors run in a fixed order: every markup hook over the whole
//! text, then every script hook over each `<script>` block, then every style
//! hook over each `<style>` block. A hook returning `Ok(None)` leaves its
//! input untouched.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

use crate::diagnostic::{line_column, Position};
use crate::error::PreprocessError;
use crate::transpile::{transpile, TranspileOptions};

lazy_static! {
    /// Script block regex
    pub(crate) static ref SCRIPT_REGEX: Regex =
        Regex::new(r"(?is)<script\b([^>]*)>([\s\S]*?)</script>").unwrap();

    /// Style block regex
    pub(crate) static ref STYLE_REGEX: Regex =
        Regex::new(r"(?is)<style\b([^>]*)>([\s\S]*?)</style>").unwrap();

    /// Attribute regex for block attributes
    static ref ATTR_REGEX: Regex =
        Regex::new(r#"(?i)([a-z0-9:-]+)(?:=(?:"([^"]*)"|'([^']*)'|([^>\s]+)))?"#).unwrap();
}

pub type Attributes = HashMap<String, String>;

pub trait Preprocessor: Send + Sync {
    fn name(&self) -> &'static str;

    fn markup(&self, _content: &str, _filename: &Path) -> Result<Option<String>, PreprocessError> {
        Ok(None)
    }

    fn script(
        &self,
        _content: &str,
        _attributes: &Attributes,
        _filename: &Path,
    ) -> Result<Option<String>, PreprocessError> {
        Ok(None)
    }

    fn style(
        &self,
        _content: &str,
        _attributes: &Attributes,
        _filename: &Path,
    ) -> Result<Option<String>, PreprocessError> {
        Ok(None)
    }
}

/// Transpiles `<script lang="ts">` blocks.
pub struct TypeScript;

impl Preprocessor for TypeScript {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn script(
        &self,
        content: &str,
        attributes: &Attributes,
        filename: &Path,
    ) -> Result<Option<String>, PreprocessError> {
        let is_typescript = matches!(
            attributes.get("lang").map(String::as_str),
            Some("ts") | Some("typescript")
        ) || attributes.get("type").map(String::as_str) == Some("text/typescript");
        if !is_typescript {
            return Ok(None);
        }

        let options = TranspileOptions {
            preserve_value_imports: true,
        };
        transpile(content, filename, options)
            .map(Some)
            .map_err(|err| PreprocessError {
                preprocessor: self.name(),
                message: err.message,
                position: err.position,
            })
    }
}

/// Compiles `<style lang="scss">` blocks.
pub struct Scss;

impl Preprocessor for Scss {
    fn name(&self) -> &'static str {
        "scss"
    }

    fn style(
        &self,
        content: &str,
        attributes: &Attributes,
        filename: &Path,
    ) -> Result<Option<String>, PreprocessError> {
        if !style_lang_is(attributes, "scss") {
            return Ok(None);
        }
        compile_sass(self.name(), content, grass::InputSyntax::Scss, filename).map(Some)
    }
}

/// Compiles `<style lang="sass">` blocks (indented syntax).
pub struct Sass;

impl Preprocessor for Sass {
    fn name(&self) -> &'static str {
        "sass"
    }

    fn style(
        &self,
        content: &str,
        attributes: &Attributes,
        filename: &Path,
    ) -> Result<Option<String>, PreprocessError> {
        if !style_lang_is(attributes, "sass") {
            return Ok(None);
        }
        compile_sass(self.name(), content, grass::InputSyntax::Sass, filename).map(Some)
    }
}

fn style_lang_is(attributes: &Attributes, lang: &str) -> bool {
    attributes.get("lang").map(String::as_str) == Some(lang)
        || attributes.get("type").map(String::as_str) == Some(format!("text/{lang}").as_str())
}

fn compile_sass(
    preprocessor: &'static str,
    content: &str,
    syntax: grass::InputSyntax,
    filename: &Path,
) -> Result<String, PreprocessError> {
    let mut options = grass::Options::default().input_syntax(syntax);
    if let Some(dir) = filename.parent() {
        options = options.load_path(dir);
    }
    grass::from_string(content.to_string(), &options).map_err(|err| PreprocessError {
        preprocessor,
        message: err.to_string(),
        position: None,
    })
}

/// Ordered preprocessor pipeline.
pub struct Preprocessors {
    list: Vec<Box<dyn Preprocessor>>,
}

impl Default for Preprocessors {
    fn default() -> Self {
        Self::standard()
    }
}

impl Preprocessors {
    pub fn empty() -> Self {
        Self { list: Vec::new() }
    }

    /// The built-in pipeline: scss, typescript, sass.
    pub fn standard() -> Self {
        Self {
            list: vec![Box::new(Scss), Box::new(TypeScript), Box::new(Sass)],
        }
    }

    pub fn with(mut self, preprocessor: impl Preprocessor + 'static) -> Self {
        self.list.push(Box::new(preprocessor));
        self
    }

    /// Run the pipeline. `Ok(None)` means nothing meaningful came out.
    pub fn run(&self, source: &str, filename: &Path) -> Result<Option<String>, PreprocessError> {
        let mut code = source.to_string();

        for preprocessor in &self.list {
            if let Some(out) = preprocessor.markup(&code, filename)? {
                code = out;
            }
        }

        code = self.rewrite_blocks(&code, &SCRIPT_REGEX, "script", filename, |p, c, a, f| {
            p.script(c, a, f)
        })?;
        code = self.rewrite_blocks(&code, &STYLE_REGEX, "style", filename, |p, c, a, f| {
            p.style(c, a, f)
        })?;

        if code.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(code))
    }

    fn rewrite_blocks<F>(
        &self,
        code: &str,
        block: &Regex,
        tag: &str,
        filename: &Path,
        hook: F,
    ) -> Result<String, PreprocessError>
    where
        F: Fn(&dyn Preprocessor, &str, &Attributes, &Path) -> Result<Option<String>, PreprocessError>,
    {
        let mut out = String::with_capacity(code.len());
        let mut last = 0;

        for caps in block.captures_iter(code) {
            let (Some(whole), Some(content)) = (caps.get(0), caps.get(2)) else {
                continue;
            };
            let attr_string = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let attributes = parse_attributes(attr_string);
            let origin = line_column(code, content.start());

            let mut body = content.as_str().to_string();
            for preprocessor in &self.list {
                match hook(preprocessor.as_ref(), &body, &attributes, filename) {
                    Ok(Some(next)) => body = next,
                    Ok(None) => {}
                    Err(mut err) => {
                        err.position = err.position.map(|inner| shift(inner, origin));
                        return Err(err);
                    }
                }
            }

            out.push_str(&code[last..whole.start()]);
            out.push_str(&format!("<{tag}{attr_string}>{body}</{tag}>"));
            last = whole.end();
        }

        out.push_str(&code[last..]);
        Ok(out)
    }
}

/// Parse `key="value"` pairs; bare attributes become `"true"`.
pub fn parse_attributes(attr_string: &str) -> Attributes {
    let mut attributes = HashMap::new();
    for attr_caps in ATTR_REGEX.captures_iter(attr_string) {
        if let Some(name) = attr_caps.get(1) {
            let value = attr_caps
                .get(2)
                .or_else(|| attr_caps.get(3))
                .or_else(|| attr_caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "true".to_string());
            attributes.insert(name.as_str().to_string(), value);
        }
    }
    attributes
}

/// Move a block-relative position into file coordinates.
fn shift(inner: Position, origin: Position) -> Position {
    if inner.line <= 1 {
        Position::new(origin.line, origin.column + inner.column)
    } else {
        Position::new(origin.line + inner.line - 1, inner.column)
    }
}
