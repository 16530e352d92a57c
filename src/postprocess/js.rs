//! Script minification with oxc.

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::config::JsMinifyOptions;

/// Minify a bundle script.
///
/// Bundles are classic scripts (the loader defines a global `require`), so
/// top-level names are kept.
pub fn minify_js(source: &str, options: &JsMinifyOptions) -> Result<String, String> {
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(false);
    let ret = Parser::new(&allocator, source, source_type).parse();
    if let Some(err) = ret.errors.first() {
        return Err(err.to_string());
    }

    let mut program = ret.program;
    let minifier_options = MinifierOptions {
        mangle: options.mangle.then(MangleOptions::default),
        compress: options.compress.then(CompressOptions::smallest),
    };
    let ret = Minifier::new(minifier_options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::REQUIRE_JS;

    #[test]
    fn test_minify_keeps_globals() {
        let opts = JsMinifyOptions::default();
        let out = minify_js(REQUIRE_JS, &opts).unwrap();
        assert!(out.len() < REQUIRE_JS.len());
        assert!(out.contains("require.register"));
        assert!(!out.contains("Module loader"));
    }

    #[test]
    fn test_minify_without_mangle() {
        let opts = JsMinifyOptions {
            mangle: false,
            compress: false,
        };
        let out = minify_js("function add(first, second) {\n  return first + second;\n}\n", &opts)
            .unwrap();
        assert!(out.contains("first"));
        assert!(!out.contains("  "));
    }

    #[test]
    fn test_syntax_error() {
        assert!(minify_js("var = ;", &JsMinifyOptions::default()).is_err());
    }
}
