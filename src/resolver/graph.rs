//! Resolved component graph.
//!
//! The graph is produced once per build cycle and only read afterwards.
//! Components are keyed by id; edges point from a component to the
//! components it depends on.

use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;
use std::path::PathBuf;

/// Identifier of a component inside a graph.
///
/// Locals use their declared name, remotes `owner~repo@version`. The id is
/// also the directory name used for the component's static files in build
/// output and the module prefix in compiled scripts.
pub type ComponentId = String;

/// Kind of file a component declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Scripts,
    Styles,
    Json,
    Templates,
    Images,
    Fonts,
    Files,
}

impl FileType {
    pub const ALL: [Self; 7] = [
        Self::Scripts,
        Self::Styles,
        Self::Json,
        Self::Templates,
        Self::Images,
        Self::Fonts,
        Self::Files,
    ];
}

/// Typed file lists of one component, paths relative to the component dir.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    entries: FxHashMap<FileType, Vec<String>>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files of the given type, in declaration order.
    pub fn get(&self, file_type: FileType) -> &[String] {
        self.entries.get(&file_type).map_or(&[], Vec::as_slice)
    }

    pub fn set(&mut self, file_type: FileType, files: Vec<String>) {
        if files.is_empty() {
            self.entries.remove(&file_type);
        } else {
            self.entries.insert(file_type, files);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A resolved component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub id: ComponentId,
    /// Short name used for `require("<name>")` aliases.
    pub name: String,
    /// Directory holding the component's `component.json` and files.
    pub dir: PathBuf,
    /// Module entry point, relative to `dir`.
    pub main: String,
    pub files: FileSet,
    /// Direct dependencies, in declaration order (remotes first, then locals).
    pub dependencies: Vec<ComponentId>,
}

impl Component {
    pub fn new(id: impl Into<ComponentId>, dir: impl Into<PathBuf>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            dir: dir.into(),
            main: "index.js".into(),
            files: FileSet::new(),
            dependencies: Vec::new(),
        }
    }

    /// Absolute path of a file declared by this component.
    pub fn path_of(&self, relative: &str) -> PathBuf {
        self.dir.join(relative)
    }
}

/// Resolved graph of components rooted at the boot component.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    root: ComponentId,
    components: FxHashMap<ComponentId, Component>,
}

impl DependencyGraph {
    /// Create a graph containing only the root component.
    pub fn new(root: Component) -> Self {
        let id = root.id.clone();
        let mut components = FxHashMap::default();
        components.insert(id.clone(), root);
        Self {
            root: id,
            components,
        }
    }

    /// Insert or replace a component.
    pub fn insert(&mut self, component: Component) {
        self.components.insert(component.id.clone(), component);
    }

    pub fn root(&self) -> &Component {
        // The root is inserted by `new` and never removed.
        &self.components[&self.root]
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<&Component> {
        self.components.get(id)
    }

    #[cfg(test)]
    pub fn contains(&self, id: &str) -> bool {
        self.components.contains_key(id)
    }

    /// Components reachable from `start` (inclusive), dependencies first.
    ///
    /// Each component appears once even when reachable along several paths.
    /// Dangling edges are skipped.
    pub fn dependency_order<'a>(&'a self, start: &str) -> Vec<&'a Component> {
        let mut order = Vec::new();
        let mut visited = FxHashSet::default();
        self.visit(start, &mut visited, &mut order);
        order
    }

    fn visit<'a>(
        &'a self,
        id: &str,
        visited: &mut FxHashSet<&'a str>,
        order: &mut Vec<&'a Component>,
    ) {
        let Some(component) = self.components.get(id) else {
            return;
        };
        if !visited.insert(component.id.as_str()) {
            return;
        }
        for dep in &component.dependencies {
            self.visit(dep, visited, order);
        }
        order.push(component);
    }

    /// Find the first dependency cycle, returning the id where it closes.
    pub fn find_cycle(&self) -> Option<ComponentId> {
        let mut done = FxHashSet::default();
        let mut stack = FxHashSet::default();
        self.cycle_from(&self.root, &mut done, &mut stack)
    }

    fn cycle_from<'a>(
        &'a self,
        id: &'a str,
        done: &mut FxHashSet<&'a str>,
        stack: &mut FxHashSet<&'a str>,
    ) -> Option<ComponentId> {
        if done.contains(id) {
            return None;
        }
        if !stack.insert(id) {
            return Some(id.to_string());
        }
        if let Some(component) = self.components.get(id) {
            for dep in &component.dependencies {
                if let Some(cycle) = self.cycle_from(dep, done, stack) {
                    return Some(cycle);
                }
            }
        }
        stack.remove(id);
        done.insert(id);
        None
    }
}

/// Normalize a slash-separated relative path, resolving `.` and `..`.
///
/// Leading `..` segments that would escape the root are dropped.
pub fn normalize_relative(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// Directory part of a slash-separated relative path (empty for top level).
pub fn parent_dir(path: &str) -> &str {
    path.rfind('/').map_or("", |i| &path[..i])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(id: &str, deps: &[&str]) -> Component {
        let mut c = Component::new(id, format!("/src/{id}"));
        c.dependencies = deps.iter().map(|d| (*d).to_string()).collect();
        c
    }

    fn diamond() -> DependencyGraph {
        // boot -> app -> {ui, util}, ui -> util
        let mut graph = DependencyGraph::new(component("boot", &["app"]));
        graph.insert(component("app", &["ui", "util"]));
        graph.insert(component("ui", &["util"]));
        graph.insert(component("util", &[]));
        graph
    }

    #[test]
    fn test_dependency_order_dependencies_first() {
        let graph = diamond();
        let ids: Vec<_> = graph
            .dependency_order("app")
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["util", "ui", "app"]);
    }

    #[test]
    fn test_dependency_order_unknown_start() {
        let graph = diamond();
        assert!(graph.dependency_order("missing").is_empty());
    }

    #[test]
    fn test_find_cycle() {
        let mut graph = diamond();
        assert_eq!(graph.find_cycle(), None);

        graph.insert(component("util", &["app"]));
        assert!(graph.find_cycle().is_some());
    }

    #[test]
    fn test_file_set_empty_lists_are_dropped() {
        let mut files = FileSet::new();
        files.set(FileType::Scripts, vec![]);
        assert!(files.is_empty());
        files.set(FileType::Scripts, vec!["index.js".into()]);
        assert_eq!(files.get(FileType::Scripts), ["index.js".to_string()]);
        assert!(files.get(FileType::Styles).is_empty());
    }

    #[test]
    fn test_normalize_relative() {
        assert_eq!(normalize_relative("./img/../fonts/a.woff"), "fonts/a.woff");
        assert_eq!(normalize_relative("../../a.png"), "a.png");
        assert_eq!(normalize_relative("css//b.png"), "css/b.png");
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir("css/main.css"), "css");
        assert_eq!(parent_dir("main.css"), "");
    }
}
