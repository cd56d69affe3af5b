//! Tree node model over the host compiler's tree.
//!
//! The model rebuilds every children list from scratch on each refresh; the
//! compiler offers no incremental update API and per-file trees are small.
//! What it preserves is identity: the root wrapper is kept when the
//! re-fetched root is the same allocation, and child labels are recovered by
//! identity-matching the host's child enumeration against the reflective
//! traversal of the parent, because the host's own child walk does not
//! report field names.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::reflect::{traverse, TypeRegistry};
use crate::value::Value;

/// A named wrapper around one compiler-tree element.
pub struct TreeNode {
    name: String,
    value: Value,
    children: RefCell<Vec<Rc<TreeNode>>>,
}

impl TreeNode {
    fn new(name: String, value: Value) -> Rc<Self> {
        Rc::new(Self {
            name,
            value,
            children: RefCell::new(Vec::new()),
        })
    }

    /// Property name this node was reached through; empty for the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapped compiler object.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Current children, in the order the host visited them.
    pub fn children(&self) -> Vec<Rc<TreeNode>> {
        self.children.borrow().clone()
    }

    /// Child with the given name, if present.
    pub fn child_named(&self, name: &str) -> Option<Rc<TreeNode>> {
        self.children
            .borrow()
            .iter()
            .find(|c| c.name == name)
            .cloned()
    }

    /// Cell label: `name: Type @addr`, plus the host's status label when the
    /// object carries one. Placeholder names and the root's empty name are
    /// not shown.
    pub fn label(&self) -> String {
        let mut out = String::new();
        if !(self.name.is_empty() || self.name.starts_with('<')) {
            out.push_str(&self.name);
            out.push_str(": ");
        }
        out.push_str(&self.value.type_label());
        if !self.value.is_data() {
            if let Some(id) = self.value.identity() {
                let _ = write!(out, " @{:x}", id);
            }
        }
        if let Some(status) = self.value.as_object().and_then(|o| o.status_label()) {
            out.push(' ');
            out.push_str(&status);
        }
        out
    }
}

/// External accessor producing the current tree root for the bound document.
pub type RootAccessor = Box<dyn Fn() -> Option<Value>>;

/// Hierarchical data source the host UI's tree widget binds to.
pub struct ObjectTreeModel {
    registry: Rc<TypeRegistry>,
    root_of: RootAccessor,
    root: RefCell<Option<Rc<TreeNode>>>,
    listeners: RefCell<Vec<Box<dyn Fn()>>>,
}

impl ObjectTreeModel {
    /// Build a model over the given root accessor and refresh it once.
    pub fn new(registry: Rc<TypeRegistry>, root_of: RootAccessor) -> Self {
        let model = Self {
            registry,
            root_of,
            root: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
        };
        model.refresh();
        model
    }

    /// Current root node, if the host produced one.
    pub fn root(&self) -> Option<Rc<TreeNode>> {
        self.root.borrow().clone()
    }

    /// Children of a node. Part of the data-source contract.
    pub fn children_of(&self, node: &Rc<TreeNode>) -> Vec<Rc<TreeNode>> {
        node.children()
    }

    /// Register a structure-changed listener, notified after every refresh.
    pub fn on_structure_changed(&self, listener: impl Fn() + 'static) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    /// Re-fetch the root and rebuild the whole tree.
    ///
    /// The root wrapper survives when the host hands back the identical root
    /// object, so identity-keyed state downstream stays valid. Children are
    /// always rebuilt.
    pub fn refresh(&self) {
        let fetched = (self.root_of)();
        {
            let mut slot = self.root.borrow_mut();
            match fetched {
                Some(value) => {
                    let keep = slot
                        .as_ref()
                        .map_or(false, |root| root.value.same_object(&value));
                    if !keep {
                        *slot = Some(TreeNode::new(String::new(), value));
                    }
                }
                None => {
                    debug!("host produced no tree root; clearing model");
                    *slot = None;
                }
            }
        }
        if let Some(root) = self.root() {
            self.rebuild_children(&root);
        }
        self.notify_structure_changed();
    }

    fn rebuild_children(&self, node: &Rc<TreeNode>) {
        // candidate labels from the reflective traversal, keyed by identity
        let mut labels: FxHashMap<usize, String> = FxHashMap::default();
        for entry in traverse(&self.registry, &node.value) {
            let Some(value) = entry.value else { continue };
            if value.is_tree_element() {
                if let Some(id) = value.identity() {
                    labels.insert(id, entry.name);
                }
            } else if let Value::Seq(items) = &value {
                for (i, item) in items.iter().enumerate() {
                    if item.is_tree_element() {
                        if let Some(id) = item.identity() {
                            labels.insert(id, format!("{}[{}]", entry.name, i));
                        }
                    }
                }
            }
        }

        // actual hierarchy from the host's child visitor
        let mut rebuilt: Vec<Rc<TreeNode>> = Vec::new();
        let mut placeholder = 0usize;
        if let Some(tree) = node.value.as_tree_element() {
            tree.accept_children(&mut |child: Value| {
                let name = child
                    .identity()
                    .and_then(|id| labels.get(&id).cloned())
                    .unwrap_or_else(|| {
                        let name = format!("<prop{}>", placeholder);
                        placeholder += 1;
                        name
                    });
                rebuilt.push(TreeNode::new(name, child));
            });
        }
        *node.children.borrow_mut() = rebuilt;

        for child in node.children() {
            self.rebuild_children(&child);
        }
    }

    fn notify_structure_changed(&self) {
        for listener in self.listeners.borrow().iter() {
            listener();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{ir_node, IrNode};
    use std::cell::Cell;

    fn two_level_root() -> Value {
        let leaf = ir_node("Literal", vec![]);
        let body = ir_node("Block", vec![("stmt", leaf)]);
        ir_node("FnDecl", vec![("body", body)])
    }

    #[test]
    fn test_children_are_labeled_from_traversal() {
        let registry = Rc::new(TypeRegistry::new());
        let root_value = two_level_root();
        let model = ObjectTreeModel::new(registry, Box::new(move || Some(root_value.clone())));

        let root = model.root().unwrap();
        assert_eq!(root.name(), "");
        let children = root.children();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name(), "body");
        let grandchildren = children[0].children();
        assert_eq!(grandchildren.len(), 1);
        assert_eq!(grandchildren[0].name(), "stmt");
    }

    #[test]
    fn test_unmatched_children_get_placeholder_names() {
        let registry = Rc::new(TypeRegistry::new());
        // children visited by the host but not reachable through any
        // reflective property
        let hidden_a = ir_node("Synthetic", vec![]);
        let hidden_b = ir_node("Synthetic", vec![]);
        let root_value = Value::object(Rc::new(IrNode::with_hidden_children(
            "File",
            vec![hidden_a, hidden_b],
        )));
        let model = ObjectTreeModel::new(registry, Box::new(move || Some(root_value.clone())));

        let names: Vec<String> = model
            .root()
            .unwrap()
            .children()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["<prop0>", "<prop1>"]);
    }

    #[test]
    fn test_sequence_valued_properties_get_indexed_names() {
        let registry = Rc::new(TypeRegistry::new());
        let first = ir_node("Param", vec![]);
        let second = ir_node("Param", vec![]);
        let root_value = Value::object(Rc::new(IrNode::with_seq_property(
            "FnDecl",
            "params",
            vec![first, second],
        )));
        let model = ObjectTreeModel::new(registry, Box::new(move || Some(root_value.clone())));

        let names: Vec<String> = model
            .root()
            .unwrap()
            .children()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["params[0]", "params[1]"]);
    }

    #[test]
    fn test_refresh_keeps_root_wrapper_for_identical_root() {
        let registry = Rc::new(TypeRegistry::new());
        let root_value = two_level_root();
        let model = ObjectTreeModel::new(registry, Box::new(move || Some(root_value.clone())));

        let before = model.root().unwrap();
        model.refresh();
        let after = model.root().unwrap();
        assert!(Rc::ptr_eq(&before, &after));
        assert!(before.value().same_object(after.value()));
    }

    #[test]
    fn test_refresh_replaces_root_wrapper_for_new_root() {
        let registry = Rc::new(TypeRegistry::new());
        let generation = Rc::new(Cell::new(0));
        let gen = generation.clone();
        let model = ObjectTreeModel::new(
            registry,
            Box::new(move || {
                gen.set(gen.get() + 1);
                Some(two_level_root())
            }),
        );

        let before = model.root().unwrap();
        model.refresh();
        let after = model.root().unwrap();
        assert!(!Rc::ptr_eq(&before, &after));
        assert!(generation.get() >= 2);
    }

    #[test]
    fn test_refresh_notifies_structure_listeners() {
        let registry = Rc::new(TypeRegistry::new());
        let root_value = two_level_root();
        let model = ObjectTreeModel::new(registry, Box::new(move || Some(root_value.clone())));
        let notified = Rc::new(Cell::new(0));
        let seen = notified.clone();
        model.on_structure_changed(move || seen.set(seen.get() + 1));

        model.refresh();
        model.refresh();
        assert_eq!(notified.get(), 2);
    }

    struct PhasedDecl;

    impl crate::value::HostObject for PhasedDecl {
        fn type_label(&self) -> &str {
            "FnDecl"
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn status_label(&self) -> Option<String> {
            Some("BODY_RESOLVED".to_string())
        }

        fn as_tree(&self) -> Option<&dyn crate::value::TreeElement> {
            Some(self)
        }
    }

    impl crate::value::TreeElement for PhasedDecl {
        fn accept_children(&self, _visitor: &mut dyn FnMut(Value)) {}
    }

    #[test]
    fn test_label_appends_status_for_phased_nodes() {
        let registry = Rc::new(TypeRegistry::new());
        let root_value = Value::object(Rc::new(PhasedDecl));
        let model = ObjectTreeModel::new(registry, Box::new(move || Some(root_value.clone())));
        let label = model.root().unwrap().label();
        assert!(label.starts_with("FnDecl @"));
        assert!(label.ends_with(" BODY_RESOLVED"));
    }

    #[test]
    fn test_label_includes_name_type_and_identity() {
        let registry = Rc::new(TypeRegistry::new());
        let root_value = two_level_root();
        let model = ObjectTreeModel::new(registry, Box::new(move || Some(root_value.clone())));

        let root = model.root().unwrap();
        assert!(root.label().starts_with("FnDecl @"));
        let child = &root.children()[0];
        assert!(child.label().starts_with("body: Block @"));
    }
}
