//! Bundle partitioning.
//!
//! Each bundle name is a local of the boot component. A bundle holds every
//! component reachable from that local, dependencies first. Components
//! shared by several bundles are repeated in each of them, so every
//! bundle's `script.js` / `styles.css` is self-contained.

use indexmap::IndexMap;

use crate::resolver::{Component, DependencyGraph};

/// Bundle name → components to compile, in dependency order.
pub type BundleAssignment<'g> = IndexMap<String, Vec<&'g Component>>;

/// Group graph components into the named bundles.
///
/// Every name gets an entry, even when nothing is reachable: an empty
/// bundle still has to be compiled so stale artifacts get removed.
/// The main (first) bundle also carries the boot component's own files.
pub fn partition<'g>(graph: &'g DependencyGraph, bundle_names: &[String]) -> BundleAssignment<'g> {
    let root = graph.root();
    let mut bundles = IndexMap::with_capacity(bundle_names.len());

    for (index, name) in bundle_names.iter().enumerate() {
        let mut components = if root.dependencies.contains(name) {
            graph.dependency_order(name)
        } else {
            Vec::new()
        };

        if index == 0 && !root.files.is_empty() {
            components.push(root);
        }

        bundles.insert(name.clone(), components);
    }

    bundles
}
