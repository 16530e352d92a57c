//! Files stage: copy static files into the bundle directory.

use std::fs;
use std::path::Path;

use super::{FileTransform, SourceFile};

/// Copies `<component dir>/<path>` to `<destination>/<id>/<path>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyFiles;

impl FileTransform for CopyFiles {
    fn name(&self) -> &'static str {
        "copy-files"
    }

    fn emit(&self, file: &SourceFile<'_>, destination: &Path) -> Result<String, String> {
        let source = file.path();
        let relative = file.qualified();
        let target = destination.join(&relative);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| format!("cannot create {}: {err}", parent.display()))?;
        }
        fs::copy(&source, &target).map_err(|err| {
            format!(
                "cannot copy {} to {}: {err}",
                source.display(),
                target.display()
            )
        })?;
        Ok(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Component;
    use tempfile::TempDir;

    #[test]
    fn test_copy_preserves_relative_path() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("fonts")).unwrap();
        fs::write(src.join("fonts/a.woff"), "woff").unwrap();

        let component = Component::new("owner~font@1.0.0", &src);
        let file = SourceFile {
            component: &component,
            relative: "./fonts/a.woff",
        };
        let out = dir.path().join("build/app");
        let written = CopyFiles.emit(&file, &out).unwrap();

        assert_eq!(written, "owner~font@1.0.0/fonts/a.woff");
        assert_eq!(fs::read_to_string(out.join(&written)).unwrap(), "woff");
    }

    #[test]
    fn test_copy_missing_source() {
        let dir = TempDir::new().unwrap();
        let component = Component::new("app", dir.path());
        let file = SourceFile {
            component: &component,
            relative: "nope.png",
        };
        let err = CopyFiles.emit(&file, &dir.path().join("out")).unwrap_err();
        assert!(err.contains("nope.png"));
    }
}
