//! Primary introspection strategy: per-type accessor metadata.
//!
//! The host adapter registers one [`ClassMetadata`] per concrete node type,
//! with typed zero-arg accessor closures and an optional parent link. The
//! parent chain is what gives traversal its most-specific-first member
//! ordering without the UI having to curate anything.

use std::any::{Any, TypeId};
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::value::Value;

/// Why a property access yielded nothing.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AccessError {
    /// The member does not exist on the receiver
    #[error("no such member")]
    NoSuchMember,

    /// The receiver was not of the type the accessor was registered for
    #[error("receiver type mismatch")]
    TypeMismatch,

    /// The accessor is not usable in the object's current state
    #[error("accessor failed: {0}")]
    Failed(String),
}

pub(crate) type Getter = Rc<dyn Fn(&dyn Any) -> Result<Option<Value>, AccessError>>;

/// A single registered zero-arg accessor.
#[derive(Clone)]
pub struct PropertyAccessor {
    name: &'static str,
    getter: Getter,
}

impl PropertyAccessor {
    /// Wrap a typed accessor closure. The receiver is downcast before the
    /// closure runs; a mismatch surfaces as [`AccessError::TypeMismatch`].
    pub fn new<T, F>(name: &'static str, get: F) -> Self
    where
        T: 'static,
        F: Fn(&T) -> Result<Option<Value>, AccessError> + 'static,
    {
        let getter: Getter = Rc::new(move |any: &dyn Any| match any.downcast_ref::<T>() {
            Some(obj) => get(obj),
            None => Err(AccessError::TypeMismatch),
        });
        Self { name, getter }
    }

    /// Member name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn getter(&self) -> Getter {
        self.getter.clone()
    }
}

/// Metadata for one registered host type.
pub struct ClassMetadata {
    name: &'static str,
    parent: Option<TypeId>,
    properties: Vec<PropertyAccessor>,
}

impl ClassMetadata {
    /// Start metadata for a type with the given display name.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            parent: None,
            properties: Vec::new(),
        }
    }

    /// Declare the ancestor type whose members follow this type's own in
    /// traversal order.
    pub fn parent<P: 'static>(mut self) -> Self {
        self.parent = Some(TypeId::of::<P>());
        self
    }

    /// Register a zero-arg accessor. `T` must be the concrete type this
    /// metadata is registered under (or the receiver downcast fails at
    /// access time).
    pub fn property<T, F>(mut self, name: &'static str, get: F) -> Self
    where
        T: 'static,
        F: Fn(&T) -> Result<Option<Value>, AccessError> + 'static,
    {
        self.properties.push(PropertyAccessor::new(name, get));
        self
    }

    /// Display name of the type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Registered accessors, in registration order.
    pub fn properties(&self) -> &[PropertyAccessor] {
        &self.properties
    }

    pub(crate) fn parent_id(&self) -> Option<TypeId> {
        self.parent
    }
}

/// Registry mapping concrete host types to their metadata.
#[derive(Default)]
pub struct TypeRegistry {
    classes: FxHashMap<TypeId, ClassMetadata>,
}

impl TypeRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register metadata for `T`, replacing any previous entry.
    pub fn register<T: 'static>(&mut self, metadata: ClassMetadata) {
        self.classes.insert(TypeId::of::<T>(), metadata);
    }

    /// Metadata for a type id, if registered.
    pub fn lookup(&self, type_id: TypeId) -> Option<&ClassMetadata> {
        self.classes.get(&type_id)
    }

    /// Metadata chain from the concrete type toward its ancestors.
    ///
    /// Guarded against parent cycles; a cycle truncates the chain at the
    /// first repeated type.
    pub fn chain(&self, type_id: TypeId) -> Vec<&ClassMetadata> {
        let mut chain = Vec::new();
        let mut seen = FxHashSet::default();
        let mut current = Some(type_id);
        while let Some(id) = current {
            if !seen.insert(id) {
                break;
            }
            match self.classes.get(&id) {
                Some(metadata) => {
                    current = metadata.parent_id();
                    chain.push(metadata);
                }
                None => break,
            }
        }
        chain
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no types are registered.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
