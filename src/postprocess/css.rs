//! Stylesheet prefixing and minification with lightningcss.

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::config::CssMinifyOptions;

/// Resolve browserslist queries into prefixing targets.
pub fn browser_targets(queries: &[String]) -> Result<Targets, String> {
    let browsers = Browsers::from_browserslist(queries.iter().map(String::as_str))
        .map_err(|err| err.to_string())?;
    Ok(browsers.map(Targets::from).unwrap_or_default())
}

/// Add vendor prefixes for `targets`; output stays readable.
pub fn autoprefix(source: &str, targets: Targets) -> Result<String, String> {
    let mut stylesheet =
        StyleSheet::parse(source, ParserOptions::default()).map_err(|err| err.to_string())?;
    stylesheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|err| err.to_string())?;
    let result = stylesheet
        .to_css(PrinterOptions {
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|err| err.to_string())?;
    Ok(result.code)
}

/// Minify a stylesheet.
pub fn minify_css(source: &str, options: &CssMinifyOptions) -> Result<String, String> {
    let mut stylesheet =
        StyleSheet::parse(source, ParserOptions::default()).map_err(|err| err.to_string())?;
    stylesheet
        .minify(MinifyOptions {
            unused_symbols: options.unused_symbols.iter().cloned().collect(),
            ..MinifyOptions::default()
        })
        .map_err(|err| err.to_string())?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|err| err.to_string())?;
    Ok(result.code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_targets() {
        assert!(browser_targets(&["defaults".to_string()]).is_ok());
        assert!(browser_targets(&["definitely not a browser".to_string()]).is_err());
    }

    #[test]
    fn test_autoprefix_output_not_minified() {
        let targets = browser_targets(&["safari 8".to_string()]).unwrap();
        let out = autoprefix(".a {\n  display: flex;\n}\n", targets).unwrap();
        assert!(out.contains("-webkit-flex"));
        assert!(out.contains('\n'));
    }

    #[test]
    fn test_minify_css() {
        let out = minify_css(".a {\n  color: #ff0000;\n}\n", &CssMinifyOptions::default()).unwrap();
        assert_eq!(out, ".a{color:red}");
    }

    #[test]
    fn test_unused_symbols_dropped() {
        let options = CssMinifyOptions {
            unused_symbols: vec!["unused".to_string()],
        };
        let out = minify_css(".used { color: red } .unused { color: blue }", &options).unwrap();
        assert!(out.contains("used"));
        assert!(!out.contains(".unused"));
    }
}
