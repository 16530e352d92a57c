//! Optional post-processing of compiled bundle text.
//!
//! Scripts: minify. Styles: vendor-prefix, then minify. Each step is a
//! pass-through when disabled, and empty input never reaches an engine.
//! Only zero-length text counts as empty; whitespace is content.

mod css;
mod js;

pub use css::{autoprefix, browser_targets, minify_css};
pub use js::minify_js;

use lightningcss::targets::Targets;

use crate::compiler::CompileError;
use crate::config::{CssMinifyOptions, JsMinifyOptions};

/// Minify a bundle script when enabled.
pub fn postprocess_script(
    text: Option<String>,
    uglify: Option<&JsMinifyOptions>,
) -> Result<Option<String>, CompileError> {
    let Some(text) = non_empty(text) else {
        return Ok(None);
    };
    let Some(options) = uglify else {
        return Ok(Some(text));
    };
    minify_js(&text, options)
        .map(|code| non_empty(Some(code)))
        .map_err(|message| CompileError {
            stage: "minify-js",
            message,
        })
}

/// Vendor-prefix then minify a bundle stylesheet, each when enabled.
pub fn postprocess_style(
    text: Option<String>,
    prefix_targets: Option<Targets>,
    cleancss: Option<&CssMinifyOptions>,
) -> Result<Option<String>, CompileError> {
    let Some(mut text) = non_empty(text) else {
        return Ok(None);
    };

    if let Some(targets) = prefix_targets {
        text = autoprefix(&text, targets).map_err(|message| CompileError {
            stage: "autoprefix",
            message,
        })?;
    }
    if let Some(options) = cleancss {
        text = minify_css(&text, options).map_err(|message| CompileError {
            stage: "minify-css",
            message,
        })?;
    }

    Ok(non_empty(Some(text)))
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_is_pass_through() {
        let js = "var a = 1;\n".to_string();
        assert_eq!(postprocess_script(Some(js.clone()), None).unwrap(), Some(js));

        let css = "a { color: red; }\n".to_string();
        assert_eq!(
            postprocess_style(Some(css.clone()), None, None).unwrap(),
            Some(css)
        );
    }

    #[test]
    fn test_empty_input_short_circuits() {
        let opts = JsMinifyOptions::default();
        assert_eq!(postprocess_script(None, Some(&opts)).unwrap(), None);
        assert_eq!(postprocess_script(Some(String::new()), Some(&opts)).unwrap(), None);

        let css = CssMinifyOptions::default();
        assert_eq!(
            postprocess_style(Some(String::new()), Some(Targets::default()), Some(&css)).unwrap(),
            None
        );
    }

    #[test]
    fn test_whitespace_is_not_empty() {
        assert_eq!(
            postprocess_script(Some("\n".into()), None).unwrap(),
            Some("\n".to_string())
        );
        assert_eq!(
            postprocess_style(Some("  \n".into()), None, None).unwrap(),
            Some("  \n".to_string())
        );
    }

    #[test]
    fn test_minify_failure_names_stage() {
        let opts = JsMinifyOptions::default();
        let err = postprocess_script(Some("function (".into()), Some(&opts)).unwrap_err();
        assert_eq!(err.stage, "minify-js");

        let css = CssMinifyOptions::default();
        let err = postprocess_style(Some("a[ { color: red }".into()), None, Some(&css)).unwrap_err();
        assert_eq!(err.stage, "minify-css");

        let err = postprocess_style(Some("a[ { color: red }".into()), Some(Targets::default()), None)
            .unwrap_err();
        assert_eq!(err.stage, "autoprefix");
    }

    #[test]
    fn test_prefix_then_minify() {
        let targets = browser_targets(&["ie 10".to_string()]).unwrap();
        let css = CssMinifyOptions::default();
        let out = postprocess_style(
            Some(".a { user-select: none; }".into()),
            Some(targets),
            Some(&css),
        )
        .unwrap()
        .unwrap();

        assert!(out.contains("-ms-user-select:none"));
        assert!(!out.contains('\n'));
    }
}
