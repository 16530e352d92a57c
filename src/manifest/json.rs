//! `component.json` document model.

use indexmap::IndexMap;
use serde::Deserialize;
use std::{fs, io, path::Path};
use thiserror::Error;

use crate::resolver::{FileSet, FileType};

/// Name of the manifest file inside every component directory.
pub const MANIFEST_FILE: &str = "component.json";

/// The fields of `component.json` this crate reads.
///
/// Everything else in the document (version, license, repo, ...) is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ComponentJson {
    pub name: Option<String>,
    pub main: Option<String>,
    /// Local components; for the boot manifest these are the bundle names.
    pub locals: Option<Vec<String>>,
    /// Directories (relative to this component) searched for locals.
    pub paths: Vec<String>,
    /// Remote dependencies: `"owner/repo": "version"`.
    pub dependencies: IndexMap<String, String>,
    pub scripts: Vec<String>,
    pub styles: Vec<String>,
    pub json: Vec<String>,
    pub templates: Vec<String>,
    pub images: Vec<String>,
    pub fonts: Vec<String>,
    pub files: Vec<String>,
}

/// Failure reading a `component.json`.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("cannot read manifest")]
    Io(#[source] io::Error),

    #[error("invalid manifest")]
    Parse(#[source] serde_json::Error),
}

impl ComponentJson {
    /// Read and parse the manifest at `path`.
    pub fn read(path: &Path) -> Result<Self, ReadError> {
        let content = fs::read_to_string(path).map_err(ReadError::Io)?;
        Self::parse(&content).map_err(ReadError::Parse)
    }

    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Declared local names (empty when the field is absent).
    pub fn local_names(&self) -> &[String] {
        self.locals.as_deref().unwrap_or_default()
    }

    /// Search paths for locals, defaulting to the component directory.
    pub fn local_paths(&self) -> Vec<&str> {
        if self.paths.is_empty() {
            vec!["."]
        } else {
            self.paths.iter().map(String::as_str).collect()
        }
    }

    /// Typed file lists.
    pub fn file_set(&self) -> FileSet {
        let mut set = FileSet::new();
        for file_type in FileType::ALL {
            set.set(file_type, self.files_of(file_type).to_vec());
        }
        set
    }

    fn files_of(&self, file_type: FileType) -> &[String] {
        match file_type {
            FileType::Scripts => &self.scripts,
            FileType::Styles => &self.styles,
            FileType::Json => &self.json,
            FileType::Templates => &self.templates,
            FileType::Images => &self.images,
            FileType::Fonts => &self.fonts,
            FileType::Files => &self.files,
        }
    }
}
