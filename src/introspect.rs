//! Capabilities the engine consumes: structural introspection of classes,
//! per-property annotations, and property access on concrete objects.
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::AccessError;
use crate::node::{Node, Object};
use crate::type_ref::ScalarKind;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredKind {
    Scalar(ScalarKind),
    Class(String),
    CollectionOf(Box<DeclaredType>),
    /// No usable type information; values pass through untouched.
    Mixed,
}

/// One declared type of a property. Union-typed properties declare several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredType {
    pub kind: DeclaredKind,
    pub nullable: bool,
}

pub type Factory = Arc<dyn Fn() -> Box<dyn Object> + Send + Sync>;
pub type SingleValueFactory = Arc<dyn Fn(Node) -> Result<Box<dyn Object>, String> + Send + Sync>;

/// Constructor taking the entire (scalar) source value as its only argument.
#[derive(Clone)]
pub struct SingleValueConstructor {
    /// Declared parameter kind; the raw value is coerced to it first.
    pub param: Option<ScalarKind>,
    pub build: SingleValueFactory,
}

/// The ways a class can be brought into existence.
#[derive(Clone, Default)]
pub struct Constructors {
    /// No-argument constructor.
    pub default: Option<Factory>,
    pub single_value: Option<SingleValueConstructor>,
    /// Construction that skips constructor logic, used when there is no
    /// default constructor and the options allow it.
    pub blank: Option<Factory>,
}

pub trait Introspector: Send + Sync {
    /// Declared properties in declaration order.
    fn properties(&self, class: &str) -> Vec<String>;

    fn declared_types(&self, class: &str, property: &str) -> Vec<DeclaredType>;

    fn is_writable(&self, class: &str, property: &str) -> bool;

    /// Capability/interface names the class implements, in lookup order.
    fn interfaces(&self, _class: &str) -> Vec<String> {
        Vec::new()
    }

    /// Class behaves as an ordered map container.
    fn is_collection_like(&self, _class: &str) -> bool {
        false
    }

    /// Class accepts properties it does not declare.
    fn is_open(&self, _class: &str) -> bool {
        false
    }

    /// Class is an enumeration: built from a scalar case, never populated.
    fn is_enum(&self, _class: &str) -> bool {
        false
    }

    /// `None` for classes this introspector does not know.
    fn constructors(&self, class: &str) -> Option<Constructors>;
}

pub trait AnnotationSource: Send + Sync {
    fn is_required(&self, class: &str, property: &str) -> bool;
}

pub trait PropertyAccess: Send + Sync {
    fn get_value(&self, object: &dyn Object, property: &str) -> Result<Node, AccessError>;

    fn set_value(&self, object: &mut dyn Object, property: &str, value: Node) -> Result<(), AccessError>;
}

/// Default accessor: goes through the object's own `get`/`set`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectAccess {
    variadic_setters: bool,
}

/// Memoizing wrapper around another introspector.
///
/// Caches live as long as the wrapper; concurrent misses may compute the
/// same entry twice, the last write wins.
pub struct CachedIntrospector {
    inner: Arc<dyn Introspector>,
    properties: DashMap<String, Vec<String>>,
    types: DashMap<(String, String), Vec<DeclaredType>>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl DeclaredType {
    pub fn scalar(kind: ScalarKind) -> Self {
        Self { kind: DeclaredKind::Scalar(kind), nullable: false }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self { kind: DeclaredKind::Class(name.into()), nullable: false }
    }

    pub fn collection_of(element: DeclaredType) -> Self {
        Self { kind: DeclaredKind::CollectionOf(Box::new(element)), nullable: false }
    }

    pub fn mixed() -> Self {
        Self { kind: DeclaredKind::Mixed, nullable: true }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

impl fmt::Debug for Constructors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructors")
            .field("default", &self.default.is_some())
            .field("single_value", &self.single_value.as_ref().map(|c| c.param))
            .field("blank", &self.blank.is_some())
            .finish()
    }
}

impl ObjectAccess {
    pub fn new(variadic_setters: bool) -> Self {
        Self { variadic_setters }
    }
}

impl PropertyAccess for ObjectAccess {
    fn get_value(&self, object: &dyn Object, property: &str) -> Result<Node, AccessError> {
        object
            .get(property)
            .ok_or_else(|| AccessError::no_such_property(property, object.class_name()))
    }

    fn set_value(&self, object: &mut dyn Object, property: &str, value: Node) -> Result<(), AccessError> {
        let spread = match (&value, self.variadic_setters) {
            (Node::List(items), true) => Some(items.clone()),
            _ => None,
        };
        match object.set(property, value) {
            Err(err @ AccessError::InvalidArgument { .. }) => match spread {
                Some(items) => object.set_variadic(property, items).map_err(|_| err),
                None => Err(err),
            },
            other => other,
        }
    }
}

impl CachedIntrospector {
    pub fn new(inner: Arc<dyn Introspector>) -> Self {
        Self { inner, properties: DashMap::new(), types: DashMap::new() }
    }
}

impl Introspector for CachedIntrospector {
    fn properties(&self, class: &str) -> Vec<String> {
        if let Some(hit) = self.properties.get(class) {
            return hit.clone();
        }
        let properties = self.inner.properties(class);
        self.properties.insert(class.to_owned(), properties.clone());
        properties
    }

    fn declared_types(&self, class: &str, property: &str) -> Vec<DeclaredType> {
        let key = (class.to_owned(), property.to_owned());
        if let Some(hit) = self.types.get(&key) {
            return hit.clone();
        }
        let types = self.inner.declared_types(class, property);
        self.types.insert(key, types.clone());
        types
    }

    fn is_writable(&self, class: &str, property: &str) -> bool {
        self.inner.is_writable(class, property)
    }

    fn interfaces(&self, class: &str) -> Vec<String> {
        self.inner.interfaces(class)
    }

    fn is_collection_like(&self, class: &str) -> bool {
        self.inner.is_collection_like(class)
    }

    fn is_open(&self, class: &str) -> bool {
        self.inner.is_open(class)
    }

    fn is_enum(&self, class: &str) -> bool {
        self.inner.is_enum(class)
    }

    fn constructors(&self, class: &str) -> Option<Constructors> {
        self.inner.constructors(class)
    }
}

// ------------------------------- Tests ------------------------------------ //
