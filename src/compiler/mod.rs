//! Per-bundle asset compilation.
//!
//! Three independent pipelines, each an ordered list of `(FileType, stage)`
//! pairs:
//!
//! | Pipeline  | Stages                                        | Output          |
//! |-----------|-----------------------------------------------|-----------------|
//! | scripts   | scripts → js, json → json, templates → string | `script.js` text|
//! | styles    | styles → rewrite-urls                         | `styles.css`    |
//! | files     | images / fonts / files → copy                 | copied files    |
//!
//! Components are visited in dependency order; within a component, stages run
//! in registration order. File types without a stage are skipped.

mod files;
mod scripts;
mod styles;

pub use files::CopyFiles;
pub use scripts::{JsModules, JsonModules, StringModules, with_loader};
pub use styles::RewriteUrls;

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::resolver::{Component, FileType, normalize_relative};

// ============================================================================
// Stage interfaces
// ============================================================================

/// One declared file of a component, as seen by a stage.
#[derive(Debug, Clone, Copy)]
pub struct SourceFile<'a> {
    pub component: &'a Component,
    /// Path relative to the component directory, as declared.
    pub relative: &'a str,
}

impl SourceFile<'_> {
    /// Absolute path on disk.
    pub fn path(&self) -> PathBuf {
        self.component.path_of(self.relative)
    }

    /// Normalized path relative to the component directory.
    pub fn normalized(&self) -> String {
        normalize_relative(self.relative)
    }

    /// Module / output name: `<component id>/<normalized path>`.
    pub fn qualified(&self) -> String {
        format!("{}/{}", self.component.id, self.normalized())
    }

    pub fn read(&self) -> Result<String, String> {
        let path = self.path();
        std::fs::read_to_string(&path).map_err(|err| format!("cannot read {}: {err}", path.display()))
    }
}

/// Stage turning one file into a chunk of bundle text.
pub trait TextTransform: Send + Sync {
    fn name(&self) -> &'static str;
    fn transform(&self, file: &SourceFile<'_>) -> Result<String, String>;
}

/// Stage emitting one file into the bundle's output directory.
pub trait FileTransform: Send + Sync {
    fn name(&self) -> &'static str;
    /// Returns the written path, relative to `destination`.
    fn emit(&self, file: &SourceFile<'_>, destination: &Path) -> Result<String, String>;
}

/// A stage failed on some file.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CompileError {
    pub stage: &'static str,
    pub message: String,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Ordered `(file type, stage)` pairs.
pub struct Pipeline<T: ?Sized> {
    stages: Vec<(FileType, Box<T>)>,
}

pub type TextPipeline = Pipeline<dyn TextTransform>;
pub type FilePipeline = Pipeline<dyn FileTransform>;

impl<T: ?Sized> Default for Pipeline<T> {
    fn default() -> Self {
        Self { stages: Vec::new() }
    }
}

impl<T: ?Sized> Pipeline<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage for `file_type`.
    pub fn use_stage(mut self, file_type: FileType, stage: Box<T>) -> Self {
        self.stages.push((file_type, stage));
        self
    }

    /// Every `(stage, file)` pair in compile order.
    fn each<'a>(
        &'a self,
        components: &'a [&'a Component],
    ) -> impl Iterator<Item = (&'a T, SourceFile<'a>)> + 'a {
        components.iter().flat_map(move |component| {
            self.stages.iter().flat_map(move |(file_type, stage)| {
                component
                    .files
                    .get(*file_type)
                    .iter()
                    .map(move |relative| {
                        let file = SourceFile {
                            component,
                            relative,
                        };
                        (stage.as_ref(), file)
                    })
            })
        })
    }
}

impl TextPipeline {
    /// Concatenate every stage output; `None` when nothing was produced.
    pub fn run(&self, components: &[&Component]) -> Result<Option<String>, CompileError> {
        let mut out = String::new();
        for (stage, file) in self.each(components) {
            let chunk = stage.transform(&file).map_err(|message| CompileError {
                stage: stage.name(),
                message,
            })?;
            if chunk.is_empty() {
                continue;
            }
            out.push_str(&chunk);
            if !chunk.ends_with('\n') {
                out.push('\n');
            }
        }
        Ok((!out.is_empty()).then_some(out))
    }
}

impl FilePipeline {
    /// Emit every file into `destination`, returning written relative paths.
    pub fn run(
        &self,
        components: &[&Component],
        destination: &Path,
    ) -> Result<Vec<String>, CompileError> {
        self.each(components)
            .map(|(stage, file)| {
                stage.emit(&file, destination).map_err(|message| CompileError {
                    stage: stage.name(),
                    message,
                })
            })
            .collect()
    }
}

// ============================================================================
// Compiler
// ============================================================================

/// Settings the standard stages need.
#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    /// Syntax-check scripts before wrapping them.
    pub parse_js: bool,
    /// Prefix for rewritten stylesheet URLs.
    pub prefix: String,
}

/// The three pipelines used for every bundle.
pub struct Compiler {
    pub scripts: TextPipeline,
    pub styles: TextPipeline,
    pub files: FilePipeline,
}

impl Compiler {
    /// Standard stage layout.
    pub fn new(options: &CompilerOptions) -> Self {
        Self {
            scripts: TextPipeline::new()
                .use_stage(FileType::Scripts, Box::new(JsModules::new(options.parse_js)))
                .use_stage(FileType::Json, Box::new(JsonModules))
                .use_stage(FileType::Templates, Box::new(StringModules)),
            styles: TextPipeline::new()
                .use_stage(FileType::Styles, Box::new(RewriteUrls::new(&options.prefix))),
            files: FilePipeline::new()
                .use_stage(FileType::Images, Box::new(CopyFiles))
                .use_stage(FileType::Fonts, Box::new(CopyFiles))
                .use_stage(FileType::Files, Box::new(CopyFiles)),
        }
    }

    /// Compile the bundle script. The main bundle always starts with the
    /// module loader, even when its own content is empty.
    pub fn scripts(
        &self,
        components: &[&Component],
        is_main: bool,
    ) -> Result<Option<String>, CompileError> {
        let body = self.scripts.run(components)?;
        Ok(if is_main { Some(with_loader(body)) } else { body })
    }

    pub fn styles(&self, components: &[&Component]) -> Result<Option<String>, CompileError> {
        self.styles.run(components)
    }

    pub fn files(
        &self,
        components: &[&Component],
        bundle_root: &Path,
    ) -> Result<Vec<String>, CompileError> {
        self.files.run(components, bundle_root)
    }
}
