//! Durable cross-refresh navigation state.
//!
//! Paths are sequences of node names, never object references: every refresh
//! discards the previous tree wholesale, so anything that must survive is
//! re-resolved by name against the freshly built tree.

use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::tree::{ObjectTreeModel, TreeNode};

/// Cross-refresh memory for one document's panel session.
#[derive(Default)]
pub struct NavigationState {
    /// Tree paths the user has expanded
    pub expanded_tree_paths: FxHashSet<Vec<String>>,
    /// Tree path of the selected node, if any
    pub selected_tree_path: Option<Vec<String>>,
    /// Names selected at each drill-down level
    pub selected_table_path: Vec<String>,
}

impl NavigationState {
    /// Empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an expansion.
    pub fn note_expanded(&mut self, path: Vec<String>) {
        self.expanded_tree_paths.insert(path);
    }

    /// Record a collapse.
    pub fn note_collapsed(&mut self, path: &[String]) {
        self.expanded_tree_paths.remove(path);
    }

    /// Record (or clear) the tree selection.
    pub fn note_tree_selection(&mut self, path: Option<Vec<String>>) {
        self.selected_tree_path = path;
    }
}

/// Resolve a remembered name path against a freshly rebuilt tree.
///
/// Returns the longest resolvable prefix of nodes starting at the root; the
/// first path segment is the root's own (empty) name. An empty result means
/// the model currently has no root or the path was empty.
pub fn resolve_path(model: &ObjectTreeModel, path: &[String]) -> Vec<Rc<TreeNode>> {
    if path.is_empty() {
        return Vec::new();
    }
    let Some(root) = model.root() else {
        return Vec::new();
    };
    let mut resolved = vec![root];
    // first segment is the root itself
    for name in &path[1..] {
        let Some(next) = resolved
            .last()
            .and_then(|node| node.child_named(name))
        else {
            break;
        };
        resolved.push(next);
    }
    resolved
}

/// Names along a resolved node path, usable as a fresh name path.
pub fn path_names(nodes: &[Rc<TreeNode>]) -> Vec<String> {
    nodes.iter().map(|n| n.name().to_string()).collect()
}
