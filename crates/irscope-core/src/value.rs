//! Type-erased value handle for inspected objects.
//!
//! The inspector does not know the host compiler's node types at compile
//! time. Everything it displays is reached through [`Value`]: primitives are
//! carried inline, containers and host objects sit behind `Rc` so identity
//! (the allocation address) is stable for as long as the host keeps the
//! object alive. Identity comparison is the only equality the inspector ever
//! performs on host objects; deep comparison of compiler state is never safe.

use std::any::Any;
use std::fmt;
use std::fmt::Write as _;
use std::rc::Rc;

use crate::reflect::attrs::AttrMap;
use crate::reflect::AccessError;

/// Byte range in a source document, used for editor highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start offset, inclusive
    pub start: usize,
    /// End offset, exclusive
    pub end: usize,
}

impl Span {
    /// Create a span from byte offsets.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Closure re-invoking the accessor behind a property row on demand.
///
/// Attached only to rows backed by accessors that may be expensive or
/// phase-dependent to evaluate; never invoked implicitly by a render pass.
pub type Recompute = Rc<dyn Fn() -> Option<Value>>;

/// Capability the host's compiler-tree node types satisfy.
///
/// The host's child enumeration does not report field names; the tree model
/// recovers labels by cross-referencing the visited children against the
/// reflective traversal of the parent.
pub trait TreeElement {
    /// Visit the node's structural children in order.
    fn accept_children(&self, visitor: &mut dyn FnMut(Value));
}

/// A fallback accessor name plus the distance to the type that declared it
/// (0 = the concrete type). Depth keeps most-specific members first when the
/// fallback introspection strategy is in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorName {
    /// Member name
    pub name: &'static str,
    /// Distance from the concrete type to the declaring type
    pub declared_depth: u32,
}

impl AccessorName {
    /// Accessor declared on the concrete type itself.
    pub fn own(name: &'static str) -> Self {
        Self {
            name,
            declared_depth: 0,
        }
    }

    /// Accessor declared `depth` supertypes up from the concrete type.
    pub fn inherited(name: &'static str, depth: u32) -> Self {
        Self {
            name,
            declared_depth: depth,
        }
    }
}

/// Capability surface of an opaque host object.
///
/// `type_label` and `as_any` are mandatory; everything else defaults to a
/// neutral answer so host adapters implement only what their objects carry.
pub trait HostObject: Any {
    /// Short type name shown in the UI.
    fn type_label(&self) -> &str;

    /// Upcast used for registry lookups and accessor downcasts.
    fn as_any(&self) -> &dyn Any;

    /// Fallback introspection: public zero-arg accessor names, paired with
    /// [`HostObject::get_accessor`]. Consulted only when the concrete type
    /// has no registry entry.
    fn accessor_names(&self) -> Vec<AccessorName> {
        Vec::new()
    }

    /// Invoke a fallback accessor by name.
    fn get_accessor(&self, _name: &str) -> Result<Option<Value>, AccessError> {
        Err(AccessError::NoSuchMember)
    }

    /// Whether the object is still structurally valid. Compiler objects are
    /// routinely invalidated by edits after they were captured.
    fn is_valid(&self) -> bool {
        true
    }

    /// Source range carried by the object, if any.
    fn span(&self) -> Option<Span> {
        None
    }

    /// Extra status rendered after the type label, e.g. a resolution phase.
    fn status_label(&self) -> Option<String> {
        None
    }

    /// Whether the object renders by content rather than as `Type @addr`.
    fn is_data_like(&self) -> bool {
        false
    }

    /// Tree capability, if this object is a compiler-tree node.
    fn as_tree(&self) -> Option<&dyn TreeElement> {
        None
    }
}

/// Type-erased handle over anything the inspector can display.
#[derive(Clone)]
pub enum Value {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// String
    Str(Rc<str>),
    /// Ordered sequence
    Seq(Rc<Vec<Value>>),
    /// Key-value entries in insertion order
    Map(Rc<Vec<(Value, Value)>>),
    /// Attribute-array-style container
    Attrs(Rc<AttrMap>),
    /// Opaque host object
    Object(Rc<dyn HostObject>),
}

impl Value {
    /// Wrap a string.
    pub fn str(s: impl Into<Rc<str>>) -> Self {
        Value::Str(s.into())
    }

    /// Wrap a sequence.
    pub fn seq(items: Vec<Value>) -> Self {
        Value::Seq(Rc::new(items))
    }

    /// Wrap key-value entries.
    pub fn map(entries: Vec<(Value, Value)>) -> Self {
        Value::Map(Rc::new(entries))
    }

    /// Wrap an attribute map.
    pub fn attrs(attrs: AttrMap) -> Self {
        Value::Attrs(Rc::new(attrs))
    }

    /// Wrap a host object.
    pub fn object(obj: Rc<dyn HostObject>) -> Self {
        Value::Object(obj)
    }

    /// The host object behind this value, if it is one.
    pub fn as_object(&self) -> Option<&Rc<dyn HostObject>> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// The tree capability of the object behind this value, if any.
    pub fn as_tree_element(&self) -> Option<&dyn TreeElement> {
        match self {
            Value::Object(obj) => obj.as_tree(),
            _ => None,
        }
    }

    /// Whether this value is a compiler-tree node.
    pub fn is_tree_element(&self) -> bool {
        self.as_tree_element().is_some()
    }

    /// Identity of the referenced allocation, if the value has one.
    ///
    /// Primitives have no identity; everything behind an `Rc` is identified
    /// by its allocation address.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) => None,
            Value::Str(s) => Some(Rc::as_ptr(s) as *const () as usize),
            Value::Seq(s) => Some(Rc::as_ptr(s) as *const () as usize),
            Value::Map(m) => Some(Rc::as_ptr(m) as *const () as usize),
            Value::Attrs(a) => Some(Rc::as_ptr(a) as *const () as usize),
            Value::Object(o) => Some(Rc::as_ptr(o) as *const () as usize),
        }
    }

    /// Identity comparison. Reference-counted values compare by allocation
    /// address, primitives by value; a primitive never equals a reference.
    pub fn same_object(&self, other: &Value) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => match (self, other) {
                (Value::Null, Value::Null) => true,
                (Value::Bool(a), Value::Bool(b)) => a == b,
                (Value::Int(a), Value::Int(b)) => a == b,
                (Value::Float(a), Value::Float(b)) => a == b,
                _ => false,
            },
            _ => false,
        }
    }

    /// Short type name of the value.
    pub fn type_label(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "string".to_string(),
            Value::Seq(_) => "seq".to_string(),
            Value::Map(_) => "map".to_string(),
            Value::Attrs(_) => "attrs".to_string(),
            Value::Object(o) => o.type_label().to_string(),
        }
    }

    /// Whether the value renders by content. Data-like values omit the
    /// `@addr` identity suffix in labels.
    pub fn is_data(&self) -> bool {
        match self {
            Value::Object(o) => o.is_data_like(),
            _ => true,
        }
    }

    /// Type label plus identity suffix for non-data values, e.g. `FnDecl @3f9a10`.
    pub fn type_and_id(&self) -> String {
        match self.identity() {
            Some(id) if !self.is_data() => format!("{} @{:x}", self.type_label(), id),
            _ => self.type_label(),
        }
    }

    /// One-line value preview for table cells.
    pub fn preview(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s),
            Value::Seq(items) => {
                f.write_char('[')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_char(']')
            }
            Value::Map(entries) => {
                f.write_char('{')?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_char('}')
            }
            Value::Attrs(attrs) => {
                f.write_char('{')?;
                for (i, (name, value)) in attrs.entries().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                f.write_char('}')
            }
            Value::Object(_) => f.write_str(&self.type_and_id()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({})", self)
    }
}
