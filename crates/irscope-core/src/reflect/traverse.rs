//! The traversal entry point shared by the tree model and the viewers.
//!
//! `traverse` enumerates the zero-arg accessor-shaped members of a value.
//! Every accessor invocation is individually guarded: a `Result` error or a
//! panic inside a host getter skips that member and nothing else. Traversal
//! itself terminates and never panics, whatever the host objects do.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use tracing::trace;

use super::registry::{Getter, TypeRegistry};
use crate::value::{HostObject, Recompute, Value};

/// One traversable property of an inspected value.
pub struct PropertyEntry {
    /// Display name
    pub name: String,
    /// Property value; `None` when the accessor produced nothing
    pub value: Option<Value>,
    /// Re-invokes the underlying accessor; absent for container entries
    pub recompute: Option<Recompute>,
}

/// Members excluded from every traversal: self-referential or noisy members
/// (equality, hashing, cloning, string conversion) that would drown the
/// interesting structure.
static SKIP_MEMBER_NAMES: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "clone",
        "copy",
        "to_string",
        "to_owned",
        "to_debug_string",
        "hash",
        "type_id",
        "as_any",
        "eq",
        "cmp",
        "partial_cmp",
        "fmt",
        "dump",
    ]
    .into_iter()
    .collect()
});

/// Lazy property sequence returned by [`traverse`]. Member lists are fixed
/// up front; accessor values are computed as the iterator is pulled.
pub struct PropertyIter {
    inner: Box<dyn Iterator<Item = PropertyEntry>>,
}

impl PropertyIter {
    fn empty() -> Self {
        Self {
            inner: Box::new(std::iter::empty()),
        }
    }

    fn from_vec(entries: Vec<PropertyEntry>) -> Self {
        Self {
            inner: Box::new(entries.into_iter()),
        }
    }
}

impl Iterator for PropertyIter {
    type Item = PropertyEntry;

    fn next(&mut self) -> Option<PropertyEntry> {
        self.inner.next()
    }
}

/// Enumerate the traversable properties of `value`.
///
/// Host objects go through the type registry when their concrete type is
/// registered, and through their own accessor enumeration otherwise. Members
/// declared on more specific types come before members declared on
/// ancestors; names repeated further up the chain are dropped. Containers
/// use fixed extraction policies instead: sequence elements become
/// positionally named entries, map entries are named by a rendering of the
/// key, attribute maps yield one entry per populated slot in registry order.
pub fn traverse(registry: &TypeRegistry, value: &Value) -> PropertyIter {
    traverse_filtered(registry, value, |_| true)
}

/// [`traverse`] with a caller-supplied member name filter, composed with the
/// fixed exclusion set. The filter applies to accessor-backed members only,
/// not to container entries.
pub fn traverse_filtered(
    registry: &TypeRegistry,
    value: &Value,
    name_filter: impl Fn(&str) -> bool,
) -> PropertyIter {
    match value {
        Value::Seq(items) => PropertyIter::from_vec(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| PropertyEntry {
                    name: i.to_string(),
                    value: Some(item.clone()),
                    recompute: None,
                })
                .collect(),
        ),
        Value::Map(entries) => PropertyIter::from_vec(
            entries
                .iter()
                .map(|(key, value)| PropertyEntry {
                    name: key.preview(),
                    value: Some(value.clone()),
                    recompute: None,
                })
                .collect(),
        ),
        Value::Attrs(attrs) => PropertyIter::from_vec(
            attrs
                .entries()
                .into_iter()
                .map(|(name, value)| PropertyEntry {
                    name: name.to_string(),
                    value: Some(value),
                    recompute: None,
                })
                .collect(),
        ),
        Value::Object(obj) => traverse_object(registry, obj, name_filter),
        _ => PropertyIter::empty(),
    }
}

fn traverse_object(
    registry: &TypeRegistry,
    obj: &Rc<dyn HostObject>,
    name_filter: impl Fn(&str) -> bool,
) -> PropertyIter {
    let chain = registry.chain(obj.as_any().type_id());
    let accessors: Vec<(String, Getter)> = if chain.is_empty() {
        fallback_accessors(obj, name_filter)
    } else {
        let mut seen = FxHashSet::default();
        let mut list = Vec::new();
        for metadata in chain {
            for accessor in metadata.properties() {
                let name = accessor.name();
                if SKIP_MEMBER_NAMES.contains(name) || !name_filter(name) || !seen.insert(name) {
                    continue;
                }
                list.push((name.to_string(), accessor.getter()));
            }
        }
        list
    };

    let receiver = obj.clone();
    let iter = accessors.into_iter().filter_map(move |(name, getter)| {
        let value = invoke_guarded(&receiver, &getter)?;
        let recompute: Recompute = {
            let receiver = receiver.clone();
            let getter = getter.clone();
            Rc::new(move || invoke_guarded(&receiver, &getter).flatten())
        };
        Some(PropertyEntry {
            name,
            value,
            recompute: Some(recompute),
        })
    });
    PropertyIter {
        inner: Box::new(iter),
    }
}

/// Secondary strategy: the object enumerates its own accessors. Same
/// exclusion filtering, most-specific-first ordering, and name dedup as the
/// registry path.
fn fallback_accessors(
    obj: &Rc<dyn HostObject>,
    name_filter: impl Fn(&str) -> bool,
) -> Vec<(String, Getter)> {
    // enumeration is itself a host call and gets the same guarding
    let mut names = catch_unwind(AssertUnwindSafe(|| obj.accessor_names())).unwrap_or_else(|_| {
        trace!("fallback accessor enumeration panicked");
        Vec::new()
    });
    names.sort_by_key(|a| a.declared_depth);

    let mut seen = FxHashSet::default();
    let mut list = Vec::new();
    for accessor in names {
        let name = accessor.name;
        if SKIP_MEMBER_NAMES.contains(name) || !name_filter(name) || !seen.insert(name) {
            continue;
        }
        let getter: Getter = {
            let receiver = obj.clone();
            Rc::new(move |_any: &dyn Any| receiver.get_accessor(name))
        };
        list.push((name.to_string(), getter));
    }
    list
}

/// Invoke a getter with both failure channels guarded. `None` means the
/// member is skipped; `Some(None)` is a member that exists but currently has
/// no value.
fn invoke_guarded(receiver: &Rc<dyn HostObject>, getter: &Getter) -> Option<Option<Value>> {
    match catch_unwind(AssertUnwindSafe(|| (**getter)(receiver.as_any()))) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            trace!(error = %err, "skipping member that failed to evaluate");
            None
        }
        Err(_) => {
            trace!("skipping member whose accessor panicked");
            None
        }
    }
}
