//! JSON data binding: map decoded JSON trees onto typed object graphs.
//!
//! ```text
//! JSON text ─▶ Node tree ─▶ ObjectMapper::map(value, TypeRef) ─▶ Node::Object(Instance)
//!                                │
//!                                ├─ naming mappers      (key ─▶ property name)
//!                                ├─ value type resolvers (interface ─▶ concrete class)
//!                                ├─ override mappers    (class ─▶ custom TypeMapper)
//!                                └─ Introspector / AnnotationSource / PropertyAccess
//! ```
//!
//! Classes are described to the engine through the [`Introspector`] and
//! [`AnnotationSource`] capabilities; [`ClassRegistry`] is the built-in,
//! declarative implementation (Rust builders or JSON schema files).
pub mod error;
pub mod introspect;
pub mod mapper;
pub mod naming;
pub mod node;
pub mod options;
pub mod path_de;
pub mod registry;
pub mod resolver;
pub mod type_ref;

pub use error::{AccessError, Error, ErrorKind, Result};
pub use introspect::{
    AnnotationSource, CachedIntrospector, Constructors, DeclaredKind, DeclaredType, Introspector, ObjectAccess,
    PropertyAccess,
};
pub use mapper::{DateTime, DateTimeTypeMapper, NoopTypeMapper, ObjectMapper, TypeMapper};
pub use naming::{CamelCase, DefaultCase, NamingMapper, SnakeCase};
pub use node::{DeserializerAware, Instance, Node, Object};
pub use options::{Options, UnknownPropertyHandler};
pub use registry::{ClassDef, ClassRegistry, EnumCase, PropertyDef, Record};
pub use resolver::{SimpleValueTypeResolver, ValueTypeResolver};
pub use type_ref::{ContainerKind, ScalarKind, TypeRef};
