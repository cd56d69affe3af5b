//! irscope core: reflective exploration of a host compiler's internal tree.
//!
//! This crate is the host-independent half of the inspector:
//! - a type-erased [`Value`] handle and capability traits for opaque host
//!   objects ([`HostObject`], [`TreeElement`])
//! - generic reflective traversal with a registry strategy and a fallback
//!   strategy ([`reflect`])
//! - the tree node model with identity-preserving refresh ([`tree`])
//! - the drill-down viewer chain ([`viewer`])
//! - durable name-path navigation state and replay ([`state`])
//!
//! Host integration (sessions, refresh orchestration, rendering) lives in
//! the `irscope-panel` crate.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod reflect;
pub mod state;
pub mod tree;
pub mod value;
pub mod viewer;

#[cfg(test)]
mod testutil;

pub use reflect::attrs::{AttrMap, AttrRegistry};
pub use reflect::{
    traverse, traverse_filtered, AccessError, ClassMetadata, PropertyAccessor, PropertyEntry,
    PropertyIter, TypeRegistry,
};
pub use state::{path_names, resolve_path, NavigationState};
pub use tree::{ObjectTreeModel, RootAccessor, TreeNode};
pub use value::{AccessorName, HostObject, Recompute, Span, TreeElement, Value};
pub use viewer::{KeyColumn, PropertyRow, TableViewer, ViewerChain, ERROR_ROW, STALE_ROW};
