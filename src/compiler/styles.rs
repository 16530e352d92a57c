//! Style stage: concatenate stylesheets, rewriting relative `url(...)`s.
//!
//! Static files are copied to `<bundle>/<component id>/<path>`, so a
//! reference `url(../img/a.png)` in `<id>/css/main.css` becomes
//! `url("<prefix>/<id>/img/a.png")`.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::{SourceFile, TextTransform};
use crate::resolver::{normalize_relative, parent_dir};

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*(?:"([^"]*)"|'([^']*)'|([^)'"\s]*))\s*\)"#).unwrap()
});

#[derive(Debug, Clone, Default)]
pub struct RewriteUrls {
    prefix: String,
}

impl RewriteUrls {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Rewrite every relative URL in `css`, a file at `relative` inside `id`.
    pub fn rewrite(&self, css: &str, id: &str, relative: &str) -> String {
        let base = parent_dir(relative);
        URL_RE
            .replace_all(css, |caps: &Captures| {
                let url = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .or_else(|| caps.get(3))
                    .map_or("", |m| m.as_str());
                match self.resolve(url, id, base) {
                    Some(rewritten) => format!("url(\"{rewritten}\")"),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    fn resolve(&self, url: &str, id: &str, base: &str) -> Option<String> {
        if url.is_empty() || is_absolute(url) {
            return None;
        }

        // Keep `?query` / `#hash` (font files use them for legacy IE).
        let split = url.find(['?', '#']).unwrap_or(url.len());
        let (path, suffix) = url.split_at(split);
        let joined = if base.is_empty() {
            normalize_relative(path)
        } else {
            normalize_relative(&format!("{base}/{path}"))
        };

        let target = format!("{id}/{joined}{suffix}");
        Some(if self.prefix.is_empty() {
            target
        } else {
            format!("{}/{target}", self.prefix)
        })
    }
}

fn is_absolute(url: &str) -> bool {
    url.starts_with('/') || url.starts_with('#') || url.starts_with("data:") || url.contains("://")
}

impl TextTransform for RewriteUrls {
    fn name(&self) -> &'static str {
        "rewrite-urls"
    }

    fn transform(&self, file: &SourceFile<'_>) -> Result<String, String> {
        let css = file.read()?;
        Ok(self.rewrite(&css, &file.component.id, &file.normalized()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_urls_rewritten() {
        let rw = RewriteUrls::new("");
        assert_eq!(
            rw.rewrite("a { background: url(img/a.png) }", "app", "main.css"),
            r#"a { background: url("app/img/a.png") }"#
        );
        assert_eq!(
            rw.rewrite("a { background: url('../img/a.png') }", "app", "css/main.css"),
            r#"a { background: url("app/img/a.png") }"#
        );
    }

    #[test]
    fn test_prefix_applied() {
        let rw = RewriteUrls::new("/static/");
        assert_eq!(
            rw.rewrite(r#"@font-face { src: url("f.woff?v=1#x") }"#, "owner~font@1.0.0", "f.css"),
            r#"@font-face { src: url("/static/owner~font@1.0.0/f.woff?v=1#x") }"#
        );
    }

    #[test]
    fn test_absolute_urls_untouched() {
        let rw = RewriteUrls::new("/p");
        for css in [
            "a { b: url(/abs.png) }",
            "a { b: url(http://x.org/a.png) }",
            "a { b: url(data:image/png;base64,AAAA) }",
            "a { b: url(#filter) }",
            "a { b: url() }",
        ] {
            assert_eq!(rw.rewrite(css, "app", "main.css"), css);
        }
    }
}
