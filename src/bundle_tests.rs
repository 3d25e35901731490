//! End-to-end walk scenarios over small on-disk projects.

#[cfg(test)]
mod tests {
    use crate::bundle::Bundle;
    use crate::diagnostic::{Position, Severity};
    use crate::loader::NoBuffers;
    use crate::walker::{generate, Bundler, GenerateOptions};
    use std::collections::HashMap;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn bundle_entry(root: &Path, rel: &str, source: &str) -> Bundle {
        let entry = write(root, rel, source);
        generate(source, &entry, &GenerateOptions::default())
    }

    fn path_of(bundle: &Bundle, crumb: &str) -> PathBuf {
        PathBuf::from(&bundle.paths[crumb])
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // END-TO-END
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_component_with_script_and_markup_dependencies() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "util.ts", "export const a: number = 1;");
        write(
            root,
            "Card.svelte",
            "<script>\nimport { format } from './format.js';\n</script>\n<p>{format(1)}</p>\n<style>p { margin: 0; }</style>",
        );
        write(root, "format.js", "export const format = (n) => `#${n}`;");

        let bundle = bundle_entry(
            root,
            "App.svelte",
            "<script>\nimport { a } from \"./util\";\nimport Card from \"./Card.svelte\";\n</script>\n<h1>{a}</h1>\n<Card />\n<style>h1 { color: red; }</style>",
        );

        assert!(!bundle.has_errors(), "{:?}", bundle.diagnostics);
        let keys: Vec<&str> = bundle.scripts.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["", ">./Card.svelte", ">./Card.svelte>./format.js", ">./util"]);

        assert_eq!(path_of(&bundle, ">./util"), root.join("util.ts"));
        assert!(bundle.script(">./util").unwrap().contains("export const a = 1"));
        assert_eq!(
            bundle.script(">./Card.svelte>./format.js"),
            Some("export const format = (n) => `#${n}`;")
        );
        assert_eq!(bundle.style, "h1 { color: red; }p { margin: 0; }");
        assert_eq!(path_of(&bundle, ""), root.join("App.svelte"));
    }

    #[test]
    fn test_generate_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "a.js", "import { b } from './b.js';\nexport const a = b;");
        write(root, "b.js", "export const b = 2;");
        write(root, "Warn.svelte", "<img src=\"x.png\">");
        let source = "<script>\nimport { a } from './a.js';\nimport W from './Warn.svelte';\n</script>\n<img src=\"y.png\">";

        let first = bundle_entry(root, "App.svelte", source);
        let second = bundle_entry(root, "App.svelte", source);
        assert_eq!(first, second);
        assert_eq!(first.diagnostics.len(), 2);
        assert!(first
            .diagnostics
            .iter()
            .all(|d| d.severity == Severity::Warning));
        // Entry warning first, then the dependency's.
        assert_eq!(first.diagnostics[0].file.as_deref(), Some(&*root.join("App.svelte").to_string_lossy()));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // BREADCRUMBS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_same_file_from_two_parents_gets_two_entries() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "shared.js", "export const s = 1;");
        write(root, "A.svelte", "<script>import { s } from './shared.js';</script><p>a</p>");
        write(root, "B.svelte", "<script>import { s } from './shared.js';</script><p>b</p>");

        let bundle = bundle_entry(
            root,
            "App.svelte",
            "<script>\nimport A from './A.svelte';\nimport B from './B.svelte';\n</script>",
        );

        assert!(!bundle.has_errors());
        let a = ">./A.svelte>./shared.js";
        let b = ">./B.svelte>./shared.js";
        assert_eq!(bundle.script(a), bundle.script(b));
        assert_eq!(path_of(&bundle, a), path_of(&bundle, b));
        assert_eq!(bundle.scripts.len(), 5);
    }

    #[test]
    fn test_extension_probing_prefers_js() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "x.js", "export const from = 'js';");
        write(root, "x.ts", "export const from: string = 'ts';");

        let bundle = bundle_entry(root, "App.svelte", "<script>import { from } from './x';</script>");
        assert_eq!(path_of(&bundle, ">./x"), root.join("x.js"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // FATAL NOT-FOUND
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_nested_missing_module_discards_bundle() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "ok.js", "export const ok = true;");
        write(root, "Child.svelte", "<script>import gone from './gone.js';</script><style>p{}</style>");

        let bundle = bundle_entry(
            root,
            "App.svelte",
            "<script>\nimport { ok } from './ok.js';\nimport Child from './Child.svelte';\n</script>\n<style>h1{}</style>",
        );

        assert!(bundle.scripts.is_empty());
        assert!(bundle.paths.is_empty());
        assert_eq!(bundle.style, "");
        assert_eq!(bundle.diagnostics.len(), 1);
        assert_eq!(bundle.diagnostics[0].message, "module not found: ./gone.js");
        assert_eq!(bundle.diagnostics[0].start, Position::ZERO);
    }

    #[test]
    fn test_unresolvable_bare_specifier_is_fatal() {
        let dir = TempDir::new().unwrap();
        let bundle = bundle_entry(
            dir.path(),
            "App.svelte",
            "<script>import confetti from 'canvas-confetti';</script>",
        );
        assert_eq!(bundle.diagnostics.len(), 1);
        assert_eq!(bundle.diagnostics[0].message, "module not found: canvas-confetti");
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // PER-UNIT FAILURES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_entry_failure_stops_before_walking() {
        let dir = TempDir::new().unwrap();
        let bundle = bundle_entry(
            dir.path(),
            "App.svelte",
            "<script>\nimport x from './does-not-exist.js';\nlet = ;\n</script>",
        );
        assert!(bundle.scripts.is_empty());
        assert_eq!(bundle.diagnostics.len(), 1);
        assert_eq!(bundle.diagnostics[0].severity, Severity::Error);
        assert_eq!(bundle.diagnostics[0].start.line, 3);
    }

    #[test]
    fn test_empty_entry_fails_to_preprocess() {
        let dir = TempDir::new().unwrap();
        let bundle = bundle_entry(dir.path(), "App.svelte", "");
        assert_eq!(bundle.diagnostics.len(), 1);
        assert_eq!(bundle.diagnostics[0].message, "failed to preprocess");
        assert_eq!(bundle.diagnostics[0].start, Position::NONE);
    }

    #[test]
    fn test_dependency_failure_keeps_walking() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "Broken.svelte", "<p>x</p><script>let a = ");
        write(root, "after.js", "export const after = 1;");

        let bundle = bundle_entry(
            root,
            "App.svelte",
            "<script>\nimport Broken from './Broken.svelte';\nimport { after } from './after.js';\n</script>",
        );

        assert!(bundle.has_errors());
        assert_eq!(bundle.diagnostics.len(), 1);
        assert_eq!(
            bundle.diagnostics[0].file.as_deref(),
            Some(&*root.join("Broken.svelte").to_string_lossy())
        );
        assert_eq!(bundle.script(">./Broken.svelte"), Some(""));
        assert_eq!(bundle.script(">./after.js"), Some("export const after = 1;"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // BUFFERS, PACKAGES, ALIASES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_open_buffer_wins_over_disk() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let util = write(root, "util.js", "export const v = 'disk';");
        let entry = write(root, "App.svelte", "<script>import { v } from './util.js';</script>");

        let mut buffers = HashMap::new();
        buffers.insert(util, "export const v = 'buffer';".to_string());

        let source = fs::read_to_string(&entry).unwrap();
        let bundle = Bundler::default().generate(&source, &entry, &buffers, &GenerateOptions::default());
        assert_eq!(bundle.script(">./util.js"), Some("export const v = 'buffer';"));
    }

    #[test]
    fn test_package_from_located_module_dir() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(
            root,
            "node_modules/ui-kit/package.json",
            r#"{ "name": "ui-kit", "svelte": "src/index.js" }"#,
        );
        write(
            root,
            "node_modules/ui-kit/src/index.js",
            "export { default as Button } from './Button.svelte';\nimport './theme.js';",
        );
        write(root, "node_modules/ui-kit/src/Button.svelte", "<button>ok</button><style>button{}</style>");
        write(root, "node_modules/ui-kit/src/theme.js", "export const theme = {};");

        let bundle = bundle_entry(
            root,
            "src/App.svelte",
            "<script>import { Button } from 'ui-kit';</script>",
        );

        assert!(!bundle.has_errors(), "{:?}", bundle.diagnostics);
        assert_eq!(
            path_of(&bundle, ">ui-kit"),
            root.join("node_modules/ui-kit/src/index.js")
        );
        assert_eq!(
            path_of(&bundle, ">ui-kit>./theme.js"),
            root.join("node_modules/ui-kit/src/theme.js")
        );
        // `export ... from` is not an import statement.
        assert!(!bundle.paths.contains_key(">ui-kit>./Button.svelte"));
    }

    #[test]
    fn test_alias_last_match_wins_during_walk() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("node_modules")).unwrap();
        write(
            root,
            "tsconfig.json",
            r#"{
                // later patterns override earlier ones
                "compilerOptions": {
                    "paths": {
                        "$lib/*": ["src/lib/*"],
                        "$lib/icons/*": ["src/icons/*"],
                    }
                }
            }"#,
        );
        write(root, "src/lib/icons/star.js", "export const star = 'lib';");
        write(root, "src/icons/star.js", "export const star = 'icons';");

        let bundle = bundle_entry(
            root,
            "src/App.svelte",
            "<script>import { star } from '$lib/icons/star';</script>",
        );

        assert_eq!(path_of(&bundle, ">$lib/icons/star"), root.join("src/icons/star.js"));
        assert_eq!(bundle.script(">$lib/icons/star"), Some("export const star = 'icons';"));
    }

    #[test]
    fn test_explicit_module_dir_option() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "vendor/modules/tiny/index.ts", "export const tiny: boolean = true;");
        let entry = write(root, "App.svelte", "<script>import { tiny } from 'tiny';</script>");

        let options = GenerateOptions {
            module_dir: Some(root.join("vendor/modules")),
            ..GenerateOptions::default()
        };
        let source = fs::read_to_string(&entry).unwrap();
        let bundle = generate(&source, &entry, &options);
        assert_eq!(path_of(&bundle, ">tiny"), root.join("vendor/modules/tiny/index.ts"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // RUNTIME & CYCLES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_runtime_is_injected_and_satisfies_its_imports() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "Child.svelte", "<script>import { noop } from 'svelte/internal';</script>");
        let entry = write(
            root,
            "App.svelte",
            "<script>\nimport { noop } from \"svelte/internal\";\nimport Child from './Child.svelte';\n</script>",
        );

        let bundler = Bundler::default().with_runtime("export function noop() {}");
        let source = fs::read_to_string(&entry).unwrap();
        let bundle = bundler.generate(&source, &entry, &NoBuffers, &GenerateOptions::default());

        assert!(!bundle.has_errors(), "{:?}", bundle.diagnostics);
        assert_eq!(bundle.script(">svelte/internal"), Some("export function noop() {}"));
        assert_eq!(bundle.paths[">svelte/internal"], "svelte/internal");
        assert!(bundle.script(">./Child.svelte").is_some());
    }

    #[test]
    fn test_import_cycle_terminates() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "a.js", "import { b } from './b.js';\nexport const a = 'a';");
        write(root, "b.js", "import { a } from './a.js';\nexport const b = 'b';");

        let bundle = bundle_entry(root, "App.svelte", "<script>import { a } from './a.js';</script>");

        assert!(!bundle.has_errors());
        let back = ">./a.js>./b.js>./a.js";
        assert_eq!(path_of(&bundle, back), root.join("a.js"));
        assert_eq!(bundle.script(back), bundle.script(">./a.js"));
        assert!(!bundle.paths.contains_key(">./a.js>./b.js>./a.js>./b.js"));
    }

    #[test]
    fn test_entry_options_are_applied() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let entry = write(root, "App.svelte", "<p>hello</p>");
        let options = GenerateOptions {
            auto_mount: true,
            mount_target: "#preview".to_string(),
            ..GenerateOptions::default()
        };
        let bundle = generate("<p>hello</p>", &entry, &options);
        let js = bundle.script("").unwrap();
        assert!(js.contains("document.querySelector(\"#preview\")"));
        assert!(!js.contains("export default"));
    }

    #[test]
    fn test_scss_style_reaches_bundle_compiled() {
        let dir = TempDir::new().unwrap();
        let bundle = bundle_entry(
            dir.path(),
            "App.svelte",
            "<p><a>x</a></p>\n<style lang=\"scss\">p { a { color: red; } }</style>",
        );
        assert!(!bundle.has_errors(), "{:?}", bundle.diagnostics);
        assert!(bundle.style.contains("p a {"));
        assert!(!bundle.style.contains("p { a"));
    }

    #[test]
    fn test_strip_imports_still_walks_dependencies() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "util.js", "export const a = 1;");
        let source = "<script>\nimport { a } from './util.js';\n</script>\n<p>{a}</p>";
        let entry = write(root, "App.svelte", source);

        let options = GenerateOptions {
            strip_imports: true,
            ..GenerateOptions::default()
        };
        let bundle = generate(source, &entry, &options);

        assert!(!bundle.has_errors(), "{:?}", bundle.diagnostics);
        let keys: Vec<&str> = bundle.scripts.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["", ">./util.js"]);
        assert!(!bundle.script("").unwrap().contains("import { a }"));
        assert_eq!(bundle.script(">./util.js"), Some("export const a = 1;"));
    }
}
