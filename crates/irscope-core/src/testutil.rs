//! Synthetic host objects for unit tests: a minimal IR node type exposing
//! the same capabilities a real host adapter would.

use std::any::Any;
use std::rc::Rc;

use crate::reflect::AccessError;
use crate::value::{AccessorName, HostObject, Span, TreeElement, Value};

/// Fake compiler-tree node with named child properties.
pub struct IrNode {
    label: &'static str,
    props: Vec<(&'static str, Value)>,
    seq_prop: Option<(&'static str, Vec<Value>)>,
    hidden: Vec<Value>,
    span: Option<Span>,
}

impl IrNode {
    /// Node whose children are all reachable as named properties.
    pub fn new(label: &'static str, props: Vec<(&'static str, Value)>) -> Self {
        Self {
            label,
            props,
            seq_prop: None,
            hidden: Vec::new(),
            span: None,
        }
    }

    /// Node whose children are visited by the tree walk but not exposed
    /// through any property.
    pub fn with_hidden_children(label: &'static str, hidden: Vec<Value>) -> Self {
        Self {
            label,
            props: Vec::new(),
            seq_prop: None,
            hidden,
            span: None,
        }
    }

    /// Node with a single sequence-valued property containing its children.
    pub fn with_seq_property(
        label: &'static str,
        name: &'static str,
        items: Vec<Value>,
    ) -> Self {
        Self {
            label,
            props: Vec::new(),
            seq_prop: Some((name, items)),
            hidden: Vec::new(),
            span: None,
        }
    }

}

impl HostObject for IrNode {
    fn type_label(&self) -> &str {
        self.label
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn accessor_names(&self) -> Vec<AccessorName> {
        let mut names: Vec<AccessorName> =
            self.props.iter().map(|(n, _)| AccessorName::own(n)).collect();
        if let Some((name, _)) = &self.seq_prop {
            names.push(AccessorName::own(name));
        }
        names
    }

    fn get_accessor(&self, name: &str) -> Result<Option<Value>, AccessError> {
        if let Some((_, value)) = self.props.iter().find(|(n, _)| *n == name) {
            return Ok(Some(value.clone()));
        }
        if let Some((seq_name, items)) = &self.seq_prop {
            if *seq_name == name {
                return Ok(Some(Value::seq(items.clone())));
            }
        }
        Err(AccessError::NoSuchMember)
    }

    fn span(&self) -> Option<Span> {
        self.span
    }

    fn as_tree(&self) -> Option<&dyn TreeElement> {
        Some(self)
    }
}

impl TreeElement for IrNode {
    fn accept_children(&self, visitor: &mut dyn FnMut(Value)) {
        for (_, value) in &self.props {
            if value.is_tree_element() {
                visitor(value.clone());
            }
        }
        if let Some((_, items)) = &self.seq_prop {
            for item in items {
                if item.is_tree_element() {
                    visitor(item.clone());
                }
            }
        }
        for child in &self.hidden {
            visitor(child.clone());
        }
    }
}

/// Shorthand for a tree-element value.
pub fn ir_node(label: &'static str, props: Vec<(&'static str, Value)>) -> Value {
    Value::object(Rc::new(IrNode::new(label, props)))
}
