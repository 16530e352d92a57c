//! Test fixtures: an on-disk component tree with an in-memory graph, and a
//! resolver that counts its calls.

use parking_lot::{Condvar, Mutex};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

use crate::config::BundlerOptions;
use crate::manifest::Manifest;
use crate::resolver::{
    Component, DependencyGraph, FileType, Resolve, ResolveError, ResolveOptions,
};

/// Boot tree used by build and router tests:
///
/// ```text
/// app    index.js, app.css, img/logo.svg  → shared
/// shared index.js
/// admin  index.js
/// user   user.css
/// ```
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn scenario() -> Self {
        let fixture = Self {
            dir: TempDir::new().unwrap(),
        };
        fixture.write(
            "component.json",
            r#"{ "locals": ["app", "admin", "user"] }"#,
        );
        fixture.write("app/index.js", "require('shared');\nmodule.exports = 'app';\n");
        fixture.write("app/app.css", ".logo { background: url(img/logo.svg); }\n");
        fixture.write("app/img/logo.svg", "<svg/>");
        fixture.write("shared/index.js", "module.exports = 'shared';\n");
        fixture.write("admin/index.js", "module.exports = 'admin';\n");
        fixture.write("user/user.css", ".user { color: #00ff00; }\n");
        fixture
    }

    pub fn boot_dir(&self) -> PathBuf {
        self.dir.path().join("boot")
    }

    pub fn build_dir(&self) -> PathBuf {
        self.dir.path().join("build")
    }

    /// Write a file relative to the boot directory.
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.boot_dir().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Default options for this tree, nothing post-processed.
    pub fn options(&self) -> BundlerOptions {
        BundlerOptions::new(self.boot_dir(), self.build_dir())
    }

    pub fn manifest(&self) -> Manifest {
        let manifest = Manifest::load(&self.boot_dir()).unwrap();
        manifest.ensure_build_dirs(&self.build_dir()).unwrap();
        manifest
    }

    pub fn resolver(&self) -> CountingResolver {
        CountingResolver::new(self.graph())
    }

    /// The resolved graph matching the files on disk.
    pub fn graph(&self) -> DependencyGraph {
        let boot = self.boot_dir();
        let mut root = Component::new("boot", &boot);
        root.dependencies = vec!["app".into(), "admin".into(), "user".into()];

        let mut graph = DependencyGraph::new(root);
        graph.insert(component(
            &boot,
            "app",
            &[
                (FileType::Scripts, "index.js"),
                (FileType::Styles, "app.css"),
                (FileType::Images, "img/logo.svg"),
            ],
            &["shared"],
        ));
        graph.insert(component(&boot, "shared", &[(FileType::Scripts, "index.js")], &[]));
        graph.insert(component(&boot, "admin", &[(FileType::Scripts, "index.js")], &[]));
        graph.insert(component(&boot, "user", &[(FileType::Styles, "user.css")], &[]));
        graph
    }

    /// [`Self::graph`] with one component's scripts removed.
    pub fn graph_without_scripts(&self, id: &str) -> DependencyGraph {
        self.edit(id, |c| c.files.set(FileType::Scripts, Vec::new()))
    }

    /// [`Self::graph`] with a json file added to one component.
    pub fn graph_with_json(&self, id: &str, file: &str) -> DependencyGraph {
        self.edit(id, |c| c.files.set(FileType::Json, vec![file.to_string()]))
    }

    fn edit(&self, id: &str, f: impl FnOnce(&mut Component)) -> DependencyGraph {
        let mut graph = self.graph();
        let mut component = graph.get(id).unwrap().clone();
        f(&mut component);
        graph.insert(component);
        graph
    }

    /// Every file under the build directory with its bytes.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        let mut files = BTreeMap::new();
        collect(&self.build_dir(), &self.build_dir(), &mut files);
        files
    }
}

fn component(
    boot: &Path,
    id: &str,
    files: &[(FileType, &str)],
    deps: &[&str],
) -> Component {
    let mut component = Component::new(id, boot.join(id));
    for file_type in FileType::ALL {
        let list = files
            .iter()
            .filter(|(t, _)| *t == file_type)
            .map(|(_, f)| (*f).to_string())
            .collect();
        component.files.set(file_type, list);
    }
    component.dependencies = deps.iter().map(|d| (*d).to_string()).collect();
    component
}

fn collect(root: &Path, dir: &Path, files: &mut BTreeMap<String, Vec<u8>>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect(root, &path, files);
        } else {
            let rel = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
            files.insert(rel, fs::read(&path).unwrap());
        }
    }
}

/// Resolver returning a fixed graph and counting calls.
#[derive(Clone)]
pub struct CountingResolver {
    inner: Arc<ResolverState>,
}

struct ResolverState {
    graph: Mutex<DependencyGraph>,
    missing: Mutex<Option<String>>,
    calls: AtomicUsize,
    held: Mutex<bool>,
    released: Condvar,
}

impl CountingResolver {
    pub fn new(graph: DependencyGraph) -> Self {
        Self {
            inner: Arc::new(ResolverState {
                graph: Mutex::new(graph),
                missing: Mutex::new(None),
                calls: AtomicUsize::new(0),
                held: Mutex::new(false),
                released: Condvar::new(),
            }),
        }
    }

    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    /// Graph returned from now on.
    pub fn replace(&self, graph: DependencyGraph) {
        *self.inner.graph.lock() = graph;
    }

    /// Fail every call with a missing local named `name`.
    pub fn fail_with_missing(&self, name: &str) {
        *self.inner.missing.lock() = Some(name.to_string());
    }

    /// Block every call inside `resolve` until [`Self::release`].
    pub fn hold(&self) {
        *self.inner.held.lock() = true;
    }

    pub fn release(&self) {
        *self.inner.held.lock() = false;
        self.inner.released.notify_all();
    }
}

impl Resolve for CountingResolver {
    fn resolve(
        &self,
        _boot: &Path,
        _options: &ResolveOptions,
    ) -> Result<DependencyGraph, ResolveError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        let mut held = self.inner.held.lock();
        while *held {
            self.inner.released.wait(&mut held);
        }
        drop(held);
        if let Some(name) = self.inner.missing.lock().clone() {
            return Err(ResolveError::MissingLocal {
                name,
                parent: "boot".into(),
                searched: "test".into(),
            });
        }
        Ok(self.inner.graph.lock().clone())
    }
}
