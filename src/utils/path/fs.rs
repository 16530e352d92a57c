use std::path::{Component, Path, PathBuf};

/// Absolute form of `path`.
///
/// Existing paths are canonicalized (symlinks resolved). Paths that do not
/// exist yet, such as a build directory before the first cycle, are made
/// absolute against the current directory and cleaned of `.` and `..`.
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };
    clean(&absolute)
}

fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_existing_path_canonicalized() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a");
        std::fs::create_dir(&nested).unwrap();

        let normalized = normalize_path(&nested.join("../a/."));
        assert_eq!(normalized, nested.canonicalize().unwrap());
    }

    #[test]
    fn test_missing_path_cleaned() {
        assert_eq!(
            normalize_path(Path::new("/nowhere/sheaf/../build/./out")),
            PathBuf::from("/nowhere/build/out")
        );
    }

    #[test]
    fn test_relative_becomes_absolute() {
        assert!(normalize_path(Path::new("relative/missing")).is_absolute());
    }
}
