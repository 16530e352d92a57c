//! URL to filesystem path resolution for the static fallback.

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// First root that holds a file for `url`.
pub fn resolve_in(url: &str, roots: &[PathBuf]) -> Option<PathBuf> {
    roots.iter().find_map(|root| resolve_path(url, root))
}

/// Resolve URL to a file under `root`, handling index.html for directories.
pub fn resolve_path(url: &str, root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url)?;
    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    // Canonical form catches escapes through symlinks.
    let canonical = root.join(&clean).canonicalize().ok()?;
    let root = root.canonicalize().ok()?;
    if !canonical.starts_with(&root) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }
    let index = canonical.join("index.html");
    index.is_file().then_some(index)
}

/// Decode, drop query and fragment, trim slashes.
fn normalize_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    Some(decoded.trim_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("index.html"), "home").unwrap();
        fs::write(dir.path().join("docs/index.html"), "docs").unwrap();
        fs::write(dir.path().join("docs/a b.txt"), "spaced").unwrap();
        dir
    }

    #[test]
    fn test_files_and_directory_index() {
        let dir = site();
        let root = dir.path().canonicalize().unwrap();

        assert_eq!(resolve_path("/", dir.path()), Some(root.join("index.html")));
        assert_eq!(resolve_path("/docs/", dir.path()), Some(root.join("docs/index.html")));
        assert_eq!(resolve_path("/docs/a%20b.txt?x=1", dir.path()), Some(root.join("docs/a b.txt")));
        assert_eq!(resolve_path("/missing.css", dir.path()), None);
    }

    #[test]
    fn test_traversal_rejected() {
        let dir = site();
        let inner = dir.path().join("docs");

        assert_eq!(resolve_path("/../index.html", &inner), None);
        assert_eq!(resolve_path("/%2e%2e/index.html", &inner), None);
    }

    #[test]
    fn test_first_root_wins() {
        let first = site();
        let second = TempDir::new().unwrap();
        fs::write(second.path().join("index.html"), "other").unwrap();
        fs::write(second.path().join("only.txt"), "only").unwrap();
        let roots = vec![first.path().to_path_buf(), second.path().to_path_buf()];

        let home = resolve_in("/index.html", &roots).unwrap();
        assert_eq!(fs::read_to_string(home).unwrap(), "home");
        let only = resolve_in("/only.txt", &roots).unwrap();
        assert_eq!(fs::read_to_string(only).unwrap(), "only");
        assert_eq!(resolve_in("/nothing", &roots), None);
    }
}
