//! Script stages: every file becomes a registered CommonJS module.
//!
//! ```text
//! require.register("app/index.js", function(exports, require, module){
//! ...source...
//! });
//! require.alias("app/index.js", "app");
//! ```

use oxc::allocator::Allocator;
use oxc::parser::Parser;
use oxc::span::SourceType;

use super::{SourceFile, TextTransform};
use crate::embed::REQUIRE_JS;
use crate::resolver::normalize_relative;

/// Plain scripts, optionally syntax-checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsModules {
    parse: bool,
}

impl JsModules {
    pub fn new(parse: bool) -> Self {
        Self { parse }
    }
}

impl TextTransform for JsModules {
    fn name(&self) -> &'static str {
        "compile-js"
    }

    fn transform(&self, file: &SourceFile<'_>) -> Result<String, String> {
        let source = file.read()?;
        if self.parse {
            check_syntax(&source)
                .map_err(|err| format!("{}: {err}", file.path().display()))?;
        }
        Ok(register(file, &source))
    }
}

/// JSON files, exported as the parsed document.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonModules;

impl TextTransform for JsonModules {
    fn name(&self) -> &'static str {
        "wrap-json"
    }

    fn transform(&self, file: &SourceFile<'_>) -> Result<String, String> {
        let source = file.read()?;
        let value: serde_json::Value = serde_json::from_str(&source)
            .map_err(|err| format!("{}: {err}", file.path().display()))?;
        let body = format!("module.exports = {};", encode(&value));
        Ok(register(file, &body))
    }
}

/// Templates, exported verbatim as a string.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringModules;

impl TextTransform for StringModules {
    fn name(&self) -> &'static str {
        "stringify-template"
    }

    fn transform(&self, file: &SourceFile<'_>) -> Result<String, String> {
        let source = file.read()?;
        let body = format!("module.exports = {};", encode(&source));
        Ok(register(file, &body))
    }
}

/// Prepend the module loader to a main bundle's script.
pub fn with_loader(body: Option<String>) -> String {
    let body = body.unwrap_or_default();
    let mut out = String::with_capacity(REQUIRE_JS.len() + body.len() + 1);
    out.push_str(REQUIRE_JS);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&body);
    out
}

/// Wrap `body` in a module definition, aliasing the component entry point.
fn register(file: &SourceFile<'_>, body: &str) -> String {
    let module = file.qualified();
    let mut out = format!(
        "require.register({}, function(exports, require, module){{\n{}\n}});\n",
        encode(&module),
        body.trim_end()
    );

    let component = file.component;
    if file.normalized() == normalize_relative(&component.main) {
        out.push_str(&alias(&module, &component.id));
        if component.name != component.id {
            out.push_str(&alias(&module, &component.name));
        }
    }
    out
}

fn alias(from: &str, to: &str) -> String {
    format!("require.alias({}, {});\n", encode(from), encode(to))
}

/// JavaScript literal for a string or JSON value.
fn encode<T: serde::Serialize + ?Sized>(value: &T) -> String {
    // Serializing strings and already-parsed values cannot fail.
    serde_json::to_string(value).unwrap_or_default()
}

/// Parse `source` as a classic script, reporting the first syntax error.
fn check_syntax(source: &str) -> Result<(), String> {
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(false);
    let ret = Parser::new(&allocator, source, source_type).parse();
    match ret.errors.first() {
        Some(err) => Err(err.to_string()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Component;
    use std::fs;
    use tempfile::TempDir;

    fn fixture(files: &[(&str, &str)]) -> (TempDir, Component) {
        let dir = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let component = Component::new("component~dom@1.0.0", dir.path());
        (dir, component)
    }

    fn file<'a>(component: &'a Component, rel: &'a str) -> SourceFile<'a> {
        SourceFile {
            component,
            relative: rel,
        }
    }

    #[test]
    fn test_js_module_registration() {
        let (_dir, component) = fixture(&[("lib/util.js", "exports.x = 1;\n")]);
        let out = JsModules::new(false)
            .transform(&file(&component, "./lib/util.js"))
            .unwrap();

        assert_eq!(
            out,
            "require.register(\"component~dom@1.0.0/lib/util.js\", function(exports, require, module){\nexports.x = 1;\n});\n"
        );
    }

    #[test]
    fn test_main_file_aliased_to_id_and_name() {
        let (_dir, mut component) = fixture(&[("index.js", "module.exports = 1;")]);
        component.name = "dom".into();
        let out = JsModules::new(false)
            .transform(&file(&component, "index.js"))
            .unwrap();

        assert!(out.contains(
            r#"require.alias("component~dom@1.0.0/index.js", "component~dom@1.0.0");"#
        ));
        assert!(out.contains(r#"require.alias("component~dom@1.0.0/index.js", "dom");"#));
    }

    #[test]
    fn test_parse_js_reports_syntax_errors() {
        let (_dir, component) = fixture(&[("broken.js", "function (")]);
        let source = file(&component, "broken.js");

        assert!(JsModules::new(false).transform(&source).is_ok());
        let err = JsModules::new(true).transform(&source).unwrap_err();
        assert!(err.contains("broken.js"));
    }

    #[test]
    fn test_json_module() {
        let (_dir, component) = fixture(&[("data.json", "{ \"b\": 1, \"a\": [true] }")]);
        let out = JsonModules
            .transform(&file(&component, "data.json"))
            .unwrap();
        assert!(out.contains("module.exports = {\"b\":1,\"a\":[true]};"));

        let (_dir, component) = fixture(&[("bad.json", "{ nope")]);
        assert!(
            JsonModules
                .transform(&file(&component, "bad.json"))
                .is_err()
        );
    }

    #[test]
    fn test_template_module() {
        let (_dir, component) = fixture(&[("view.html", "<p class=\"x\">\n</p>")]);
        let out = StringModules
            .transform(&file(&component, "view.html"))
            .unwrap();
        assert!(out.contains(r#"module.exports = "<p class=\"x\">\n</p>";"#));
    }

    #[test]
    fn test_missing_file_is_error() {
        let (_dir, component) = fixture(&[]);
        let err = JsModules::new(false)
            .transform(&file(&component, "gone.js"))
            .unwrap_err();
        assert!(err.contains("gone.js"));
    }

    #[test]
    fn test_with_loader() {
        let out = with_loader(Some("x();\n".into()));
        assert!(out.starts_with(REQUIRE_JS));
        assert!(out.ends_with("x();\n"));
    }
}
