//! Loosely-typed tree + mapped object handles.
//!
//! A [`Node`] is both what the engine consumes (the decoded JSON tree) and
//! what it produces: composite targets come back as [`Node::Object`] leaves
//! holding an [`Instance`], everything else stays plain data.
use std::any::Any;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Number, Value};

use crate::error::AccessError;
use crate::mapper::ObjectMapper;
use crate::type_ref::ScalarKind;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default)]
pub enum Node {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Node>),
    Map(IndexMap<String, Node>),
    Object(Instance),
}

/// A mapping target the engine can instantiate and populate.
///
/// Implementations are the "declared accessor table" of a class: the engine
/// never reaches into fields directly, it goes through `get`/`set` (wrapped
/// by [`PropertyAccess`](crate::introspect::PropertyAccess)).
pub trait Object: Any + Send + Sync + fmt::Debug {
    fn class_name(&self) -> &str;

    fn get(&self, property: &str) -> Option<Node>;

    fn set(&mut self, property: &str, value: Node) -> Result<(), AccessError>;

    /// Spread-argument setter, tried when `set` refuses a list and variadic
    /// setters are enabled.
    fn set_variadic(&mut self, property: &str, _values: Vec<Node>) -> Result<(), AccessError> {
        Err(AccessError::no_such_property(property, self.class_name()))
    }

    /// Re-encode to a JSON tree. Also the basis of [`Instance`] equality.
    fn to_json(&self) -> Value;

    fn deserializer_aware(&mut self) -> Option<&mut dyn DeserializerAware> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Lets an object observe its own construction and completed population.
pub trait DeserializerAware {
    /// Called directly after the instance has been created, before any
    /// property is set.
    fn instantiated(&mut self, mapper: &ObjectMapper);

    /// Called after the last property has been set.
    fn deserialized(&mut self, mapper: &ObjectMapper);
}

/// Shared handle to a mapped object.
///
/// Cloning the handle does not clone the object: an instance passed in as a
/// target is populated in place and the caller observes the result through
/// its own clone.
#[derive(Clone)]
pub struct Instance(Arc<RwLock<Box<dyn Object>>>);

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Instance {
    pub fn new(object: impl Object) -> Self {
        Self::from_box(Box::new(object))
    }

    pub fn from_box(object: Box<dyn Object>) -> Self {
        Instance(Arc::new(RwLock::new(object)))
    }

    pub fn class_name(&self) -> String {
        self.read().class_name().to_owned()
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Box<dyn Object>> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Box<dyn Object>> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, property: &str) -> Option<Node> {
        self.read().get(property)
    }

    pub fn to_json(&self) -> Value {
        self.read().to_json()
    }

    /// Run `f` against the concrete object if it is a `T`.
    pub fn with<T: Object, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.read();
        guard.as_any().downcast_ref::<T>().map(f)
    }

    pub fn with_mut<T: Object, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut guard = self.write();
        guard.as_any_mut().downcast_mut::<T>().map(f)
    }

    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn notify_instantiated(&self, mapper: &ObjectMapper) {
        if let Some(aware) = self.write().deserializer_aware() {
            aware.instantiated(mapper);
        }
    }

    pub(crate) fn notify_deserialized(&self, mapper: &ObjectMapper) {
        if let Some(aware) = self.write().deserializer_aware() {
            aware.deserialized(mapper);
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self.read(), f)
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let (a, b) = (self.read(), other.read());
        a.class_name() == b.class_name() && a.to_json() == b.to_json()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Null, Node::Null) => true,
            (Node::Bool(a), Node::Bool(b)) => a == b,
            (Node::Int(a), Node::Int(b)) => a == b,
            (Node::Float(a), Node::Float(b)) => a == b,
            (Node::String(a), Node::String(b)) => a == b,
            (Node::List(a), Node::List(b)) => a == b,
            (Node::Map(a), Node::Map(b)) => a == b,
            (Node::Object(a), Node::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Node {
    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Node::Bool(_) | Node::Int(_) | Node::Float(_) | Node::String(_))
    }

    /// Ordered map or sequence.
    pub fn is_container(&self) -> bool {
        matches!(self, Node::List(_) | Node::Map(_))
    }

    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Node::Bool(_) => Some(ScalarKind::Boolean),
            Node::Int(_) => Some(ScalarKind::Integer),
            Node::Float(_) => Some(ScalarKind::Float),
            Node::String(_) => Some(ScalarKind::String),
            _ => None,
        }
    }

    /// Name of the runtime kind, used in error messages.
    pub fn kind_name(&self) -> String {
        match self {
            Node::Null => "null".into(),
            Node::List(_) => "array".into(),
            Node::Map(_) => "object".into(),
            Node::Object(instance) => instance.class_name(),
            scalar => scalar.scalar_kind().map(|k| k.to_string()).unwrap_or_default(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Node::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// Number of entries of a container, `None` for anything else.
    pub fn entry_count(&self) -> Option<usize> {
        match self {
            Node::List(items) => Some(items.len()),
            Node::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// `(key, value)` pairs in source order. Sequences are keyed by index,
    /// foreign objects by their encoded properties, scalars by `"0"`.
    pub fn into_entries(self) -> Vec<(String, Node)> {
        match self {
            Node::Null => Vec::new(),
            Node::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            Node::Map(entries) => entries.into_iter().collect(),
            Node::Object(instance) => Node::from(instance.to_json()).into_entries(),
            scalar => vec![("0".to_owned(), scalar)],
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Int(i) => Value::from(*i),
            Node::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            Node::String(s) => Value::String(s.clone()),
            Node::List(items) => Value::Array(items.iter().map(Node::to_json).collect()),
            Node::Map(entries) => Value::Object(
                entries.iter().map(|(k, v)| (k.clone(), v.to_json())).collect::<Map<_, _>>(),
            ),
            Node::Object(instance) => instance.to_json(),
        }
    }
}

/// Numeric-string test: optional sign, digits with optional fraction,
/// optional exponent, leading whitespace tolerated. `"inf"`/`"NaN"` are not numeric.
pub(crate) fn is_numeric(s: &str) -> bool {
    static NUMERIC: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("numeric pattern")
    });
    NUMERIC.is_match(s)
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Node::Int(i),
                None => Node::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Node::String(s),
            Value::Array(xs) => Node::List(xs.into_iter().map(Node::from).collect()),
            Value::Object(m) => Node::Map(m.into_iter().map(|(k, v)| (k, Node::from(v))).collect()),
        }
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::String(s.to_owned())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::String(s)
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}

impl From<i64> for Node {
    fn from(i: i64) -> Self {
        Node::Int(i)
    }
}

impl From<f64> for Node {
    fn from(f: f64) -> Self {
        Node::Float(f)
    }
}

impl From<Instance> for Node {
    fn from(instance: Instance) -> Self {
        Node::Object(instance)
    }
}

// ------------------------------- Tests ------------------------------------ //
