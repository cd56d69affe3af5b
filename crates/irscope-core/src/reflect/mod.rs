//! Generic reflective traversal of inspected values.
//!
//! Two introspection strategies live behind one entry point so call sites
//! never learn which of them produced a property:
//!
//! - primary: the [`TypeRegistry`], per-type accessor metadata registered by
//!   the host adapter (see [`registry`]);
//! - fallback: the object's own accessor enumeration through
//!   [`crate::value::HostObject::accessor_names`], used when the concrete
//!   type has no registry entry.
//!
//! Container values (sequences, maps, attribute maps) bypass both strategies
//! and use fixed extraction policies (see [`traverse`]).

pub mod attrs;
mod registry;
mod traverse;

pub use registry::{AccessError, ClassMetadata, PropertyAccessor, TypeRegistry};
pub use traverse::{traverse, traverse_filtered, PropertyEntry, PropertyIter};
