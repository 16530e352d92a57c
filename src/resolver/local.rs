//! Filesystem resolver for `component.json` trees.
//!
//! ```text
//! boot/
//! ├── component.json            { "locals": ["app"], "dependencies": {...} }
//! ├── app/component.json        local, found through `paths`
//! └── components/
//!     └── owner/repo/1.0.0/     installed remote → id `owner~repo@1.0.0`
//! ```

use rustc_hash::FxHashSet;
use std::{
    cmp::Ordering,
    fs,
    path::{Path, PathBuf},
};

use super::{Component, ComponentId, DependencyGraph, Resolve, ResolveError, ResolveOptions};
use crate::log;
use crate::manifest::{ComponentJson, MANIFEST_FILE, ReadError};

/// Directory (under boot) holding installed remote components.
const INSTALL_DIR: &str = "components";

/// Resolves locals through `paths` and remotes through `<boot>/components`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalResolver;

impl Resolve for LocalResolver {
    fn resolve(
        &self,
        boot: &Path,
        options: &ResolveOptions,
    ) -> Result<DependencyGraph, ResolveError> {
        let json = read_manifest(boot)?;
        let root_id = json.name.clone().unwrap_or_else(|| "boot".into());
        let mut session = Session {
            boot,
            options,
            root_id: root_id.clone(),
            seen: FxHashSet::from_iter([root_id.clone()]),
            components: Vec::new(),
        };

        let root = session.component(root_id, boot.to_path_buf(), &json)?;

        let mut graph = DependencyGraph::new(root);
        for component in session.components {
            graph.insert(component);
        }

        if let Some(id) = graph.find_cycle() {
            return Err(ResolveError::Cycle(id));
        }
        Ok(graph)
    }
}

/// State of one resolution pass.
struct Session<'a> {
    boot: &'a Path,
    options: &'a ResolveOptions,
    /// Id of the boot component; no local may take it.
    root_id: ComponentId,
    /// Ids already loaded or being loaded.
    seen: FxHashSet<ComponentId>,
    /// Every resolved component except the root.
    components: Vec<Component>,
}

impl Session<'_> {
    /// Build a component and, recursively, everything it depends on.
    fn component(
        &mut self,
        id: ComponentId,
        dir: PathBuf,
        json: &ComponentJson,
    ) -> Result<Component, ResolveError> {
        let mut dependencies = Vec::new();

        for (repo, version) in &json.dependencies {
            let (dep_id, dep_dir) = self.locate_remote(repo, version)?;
            if self.seen.insert(dep_id.clone()) {
                let dep_json = read_manifest(&dep_dir)?;
                let mut dep = self.component(dep_id.clone(), dep_dir, &dep_json)?;
                if dep_json.name.is_none() {
                    dep.name = repo_name(repo).to_string();
                }
                self.components.push(dep);
            }
            dependencies.push(dep_id);
        }

        for name in json.local_names() {
            if *name == self.root_id {
                return Err(ResolveError::RootNameClash {
                    name: name.clone(),
                    parent: id,
                });
            }
            let dep_dir = self.locate_local(&id, &dir, json, name)?;
            if self.seen.insert(name.clone()) {
                let dep_json = read_manifest(&dep_dir)?;
                let dep = self.component(name.clone(), dep_dir, &dep_json)?;
                self.components.push(dep);
            }
            dependencies.push(name.clone());
        }

        let mut component = Component::new(id, dir);
        if let Some(name) = &json.name {
            component.name = name.clone();
        }
        if let Some(main) = &json.main {
            component.main = main.clone();
        }
        component.files = json.file_set();
        component.dependencies = dependencies;
        Ok(component)
    }

    fn locate_local(
        &self,
        parent: &str,
        dir: &Path,
        json: &ComponentJson,
        name: &str,
    ) -> Result<PathBuf, ResolveError> {
        let candidates: Vec<PathBuf> = json
            .local_paths()
            .into_iter()
            .map(|p| dir.join(p).join(name))
            .collect();

        candidates
            .iter()
            .find(|c| c.join(MANIFEST_FILE).is_file())
            .cloned()
            .ok_or_else(|| ResolveError::MissingLocal {
                name: name.to_string(),
                parent: parent.to_string(),
                searched: candidates
                    .iter()
                    .map(|c| c.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Find an installed remote, installing it from a mirror when allowed.
    fn locate_remote(
        &self,
        repo: &str,
        version: &str,
    ) -> Result<(ComponentId, PathBuf), ResolveError> {
        let Some((owner, name)) = repo.split_once('/') else {
            return Err(ResolveError::InvalidRemote(repo.to_string()));
        };
        if !is_path_segment(owner) || !is_path_segment(name) {
            return Err(ResolveError::InvalidRemote(repo.to_string()));
        }
        if version != "*" && !is_path_segment(version) {
            return Err(ResolveError::InvalidVersion {
                name: repo.to_string(),
                version: version.to_string(),
            });
        }

        let installed = self.boot.join(INSTALL_DIR).join(owner).join(name);
        if let Some(found) = pick_version(&installed, version) {
            return Ok((remote_id(owner, name, &found), installed.join(found)));
        }

        if self.options.install {
            for mirror in &self.options.remotes {
                let source = mirror.join(owner).join(name);
                if let Some(found) = pick_version(&source, version) {
                    let target = installed.join(&found);
                    copy_dir_recursive(&source.join(&found), &target)?;
                    log!("install"; "{}@{}", repo, found);
                    return Ok((remote_id(owner, name, &found), target));
                }
            }
        }

        Err(ResolveError::NotInstalled {
            name: repo.to_string(),
            version: version.to_string(),
        })
    }
}

fn read_manifest(dir: &Path) -> Result<ComponentJson, ResolveError> {
    let path = dir.join(MANIFEST_FILE);
    if !path.is_file() {
        return Err(ResolveError::ManifestNotFound(dir.to_path_buf()));
    }
    ComponentJson::read(&path).map_err(|err| match err {
        ReadError::Io(source) => ResolveError::Io { path, source },
        ReadError::Parse(source) => ResolveError::Manifest { path, source },
    })
}

fn remote_id(owner: &str, name: &str, version: &str) -> ComponentId {
    format!("{owner}~{name}@{version}")
}

fn repo_name(repo: &str) -> &str {
    repo.rsplit('/').next().unwrap_or(repo)
}

/// A name usable as exactly one directory below its parent.
fn is_path_segment(s: &str) -> bool {
    !s.is_empty() && s != "." && s != ".." && !s.contains(['/', '\\'])
}

/// Order version directory names: dotted numbers compare numerically
/// (`1.10.0` > `1.9.0`), an optional leading `v` is ignored, and numeric
/// versions sort above anything else.
fn compare_versions(a: &str, b: &str) -> Ordering {
    fn numeric(v: &str) -> Option<Vec<u64>> {
        let v = v.strip_prefix('v').unwrap_or(v);
        v.split('.').map(|part| part.parse().ok()).collect()
    }

    match (numeric(a), numeric(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// Select a version directory under `dir` holding a `component.json`.
///
/// `*` picks the greatest installed version (see [`compare_versions`]).
fn pick_version(dir: &Path, version: &str) -> Option<String> {
    if version != "*" {
        return dir
            .join(version)
            .join(MANIFEST_FILE)
            .is_file()
            .then(|| version.to_string());
    }

    fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .filter(|entry| entry.path().join(MANIFEST_FILE).is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .max_by(|a, b| compare_versions(a, b))
}

/// Recursively copy a component directory into the install location.
fn copy_dir_recursive(src_dir: &Path, dest_dir: &Path) -> Result<(), ResolveError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| ResolveError::Io { path, source }
    };

    fs::create_dir_all(dest_dir).map_err(io_err(dest_dir))?;
    for entry in fs::read_dir(src_dir).map_err(io_err(src_dir))? {
        let entry = entry.map_err(io_err(src_dir))?;
        let src_path = entry.path();
        let dest_path = dest_dir.join(entry.file_name());

        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dest_path)?;
        } else {
            fs::copy(&src_path, &dest_path).map_err(io_err(&src_path))?;
        }
    }
    Ok(())
}
