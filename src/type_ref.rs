//! Type references: what a value should be mapped into.
use std::fmt;
use std::str::FromStr;

use crate::introspect::{DeclaredKind, DeclaredType};
use crate::node::Instance;

/// The four scalar kinds a declared type can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Integer,
    Float,
    String,
    Boolean,
}

/// What container a [`TypeRef::Collection`] builds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContainerKind {
    /// Ordered map keyed by the source keys (sequence indexes become `"0"`, `"1"`, ...).
    #[default]
    OrderedMap,
    /// A list for sequence sources, a map for map sources.
    Plain,
    /// A collection-like class, instantiated through the introspector and
    /// filled by indexed insertion.
    Class(String),
}

#[derive(Debug, Clone)]
pub enum TypeRef {
    Scalar {
        kind: ScalarKind,
        nullable: bool,
    },
    /// New instance of a named class.
    Class {
        name: String,
        nullable: bool,
    },
    /// Existing instance, populated in place. Always nullable.
    Object(Instance),
    Collection {
        /// `None` passes elements through untouched.
        element: Option<Box<TypeRef>>,
        container: ContainerKind,
        nullable: bool,
    },
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl ScalarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScalarKind::Integer => "integer",
            ScalarKind::Float => "float",
            ScalarKind::String => "string",
            ScalarKind::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScalarKind {
    type Err = ();

    /// Accepts the canonical names plus the usual aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" | "integer" => Ok(ScalarKind::Integer),
            "float" | "double" => Ok(ScalarKind::Float),
            "string" => Ok(ScalarKind::String),
            "bool" | "boolean" => Ok(ScalarKind::Boolean),
            _ => Err(()),
        }
    }
}

impl TypeRef {
    pub fn scalar(kind: ScalarKind) -> Self {
        TypeRef::Scalar { kind, nullable: false }
    }

    pub fn class(name: impl Into<String>) -> Self {
        TypeRef::Class { name: name.into(), nullable: false }
    }

    /// Collection into the default ordered map container.
    pub fn collection(element: TypeRef) -> Self {
        TypeRef::Collection {
            element: Some(Box::new(element)),
            container: ContainerKind::OrderedMap,
            nullable: false,
        }
    }

    /// Collection into a plain list/map.
    pub fn list_of(element: TypeRef) -> Self {
        TypeRef::Collection {
            element: Some(Box::new(element)),
            container: ContainerKind::Plain,
            nullable: false,
        }
    }

    /// Collection into an instance of the collection-like class `container`.
    pub fn container(element: Option<TypeRef>, container: impl Into<String>) -> Self {
        TypeRef::Collection {
            element: element.map(Box::new),
            container: ContainerKind::Class(container.into()),
            nullable: false,
        }
    }

    /// Same reference, accepting `null`.
    pub fn nullable(self) -> Self {
        match self {
            TypeRef::Scalar { kind, .. } => TypeRef::Scalar { kind, nullable: true },
            TypeRef::Class { name, .. } => TypeRef::Class { name, nullable: true },
            TypeRef::Collection { element, container, .. } => TypeRef::Collection { element, container, nullable: true },
            object @ TypeRef::Object(_) => object,
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            TypeRef::Scalar { nullable, .. }
            | TypeRef::Class { nullable, .. }
            | TypeRef::Collection { nullable, .. } => *nullable,
            TypeRef::Object(_) => true,
        }
    }

    /// Nominal class this reference targets, if any.
    pub fn class_name(&self) -> Option<String> {
        match self {
            TypeRef::Class { name, .. } => Some(name.clone()),
            TypeRef::Object(instance) => Some(instance.class_name()),
            TypeRef::Scalar { .. } | TypeRef::Collection { .. } => None,
        }
    }

    /// Human readable name: `integer`, `Popo`, `array<Popo>`, `map<integer>`, `Bag<mixed>`.
    pub fn type_name(&self) -> String {
        match self {
            TypeRef::Scalar { kind, .. } => kind.to_string(),
            TypeRef::Class { name, .. } => name.clone(),
            TypeRef::Object(instance) => instance.class_name(),
            TypeRef::Collection { element, container, .. } => {
                let element = element.as_ref().map_or_else(|| "mixed".to_owned(), |e| e.type_name());
                match container {
                    ContainerKind::OrderedMap => format!("map<{element}>"),
                    ContainerKind::Plain => format!("array<{element}>"),
                    ContainerKind::Class(name) => format!("{name}<{element}>"),
                }
            }
        }
    }

    /// Reference for a declared property type. `None` when the declaration
    /// carries no usable type information (`mixed`).
    pub fn from_declared(declared: &DeclaredType) -> Option<TypeRef> {
        let nullable = declared.nullable;
        match &declared.kind {
            DeclaredKind::Mixed => None,
            DeclaredKind::Scalar(kind) => Some(TypeRef::Scalar { kind: *kind, nullable }),
            DeclaredKind::Class(name) => Some(TypeRef::Class { name: name.clone(), nullable }),
            DeclaredKind::CollectionOf(element) => Some(TypeRef::Collection {
                element: TypeRef::from_declared(element).map(Box::new),
                container: ContainerKind::Plain,
                nullable,
            }),
        }
    }
}

impl From<&str> for TypeRef {
    /// A bare type name: scalar kind names become [`TypeRef::Scalar`], any
    /// other name a [`TypeRef::Class`].
    fn from(name: &str) -> Self {
        match name.parse::<ScalarKind>() {
            Ok(kind) => TypeRef::scalar(kind),
            Err(()) => TypeRef::class(name),
        }
    }
}

impl From<String> for TypeRef {
    fn from(name: String) -> Self {
        TypeRef::from(name.as_str())
    }
}

impl From<Instance> for TypeRef {
    fn from(instance: Instance) -> Self {
        TypeRef::Object(instance)
    }
}

impl From<ScalarKind> for TypeRef {
    fn from(kind: ScalarKind) -> Self {
        TypeRef::scalar(kind)
    }
}

// ------------------------------- Tests ------------------------------------ //
