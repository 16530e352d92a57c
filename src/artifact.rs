//! Per-bundle artifact persistence.
//!
//! A `script.js` / `styles.css` exists on disk exactly when the bundle's last
//! build produced non-empty output of that type. Writes land in a temporary
//! sibling first and are renamed into place, so readers never see a
//! truncated artifact.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Bundle script file name.
pub const SCRIPT_FILE: &str = "script.js";
/// Bundle stylesheet file name.
pub const STYLES_FILE: &str = "styles.css";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// What [`write_artifact`] did on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactChange {
    /// New content was written.
    Written,
    /// A stale file was deleted.
    Removed,
    /// Disk already matched.
    Unchanged,
}

impl fmt::Display for ArtifactChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Written => "written",
            Self::Removed => "removed",
            Self::Unchanged => "unchanged",
        })
    }
}

/// Persist `content` at `<bundle_root>/<filename>`, or delete a stale file
/// when there is no content.
pub fn write_artifact(
    bundle_root: &Path,
    filename: &str,
    content: Option<&str>,
) -> io::Result<ArtifactChange> {
    let path = bundle_root.join(filename);

    let Some(content) = content.filter(|c| !c.is_empty()) else {
        return match fs::remove_file(&path) {
            Ok(()) => Ok(ArtifactChange::Removed),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(ArtifactChange::Unchanged),
            Err(err) => Err(err),
        };
    };

    if fs::read(&path).is_ok_and(|existing| existing == content.as_bytes()) {
        return Ok(ArtifactChange::Unchanged);
    }

    fs::create_dir_all(bundle_root)?;
    let temp = temp_path(bundle_root, filename);
    if let Err(err) = fs::write(&temp, content).and_then(|()| fs::rename(&temp, &path)) {
        let _ = fs::remove_file(&temp);
        return Err(err);
    }
    Ok(ArtifactChange::Written)
}

fn temp_path(dir: &Path, filename: &str) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    dir.join(format!(".{filename}.{}.{n}.tmp", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_unchanged() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("app");

        let change = write_artifact(&root, SCRIPT_FILE, Some("a();")).unwrap();
        assert_eq!(change, ArtifactChange::Written);
        assert_eq!(fs::read_to_string(root.join(SCRIPT_FILE)).unwrap(), "a();");

        let change = write_artifact(&root, SCRIPT_FILE, Some("a();")).unwrap();
        assert_eq!(change, ArtifactChange::Unchanged);

        let change = write_artifact(&root, SCRIPT_FILE, Some("b();")).unwrap();
        assert_eq!(change, ArtifactChange::Written);
        assert_eq!(fs::read_to_string(root.join(SCRIPT_FILE)).unwrap(), "b();");
    }

    #[test]
    fn test_empty_content_removes_stale_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(STYLES_FILE), "a{}").unwrap();

        let change = write_artifact(dir.path(), STYLES_FILE, Some("")).unwrap();
        assert_eq!(change, ArtifactChange::Removed);
        assert!(!dir.path().join(STYLES_FILE).exists());

        let change = write_artifact(dir.path(), STYLES_FILE, None).unwrap();
        assert_eq!(change, ArtifactChange::Unchanged);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        write_artifact(dir.path(), SCRIPT_FILE, Some("x")).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec![SCRIPT_FILE.to_string()]);
    }
}
