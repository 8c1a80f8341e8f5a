//! The mapping engine.
//!
//! [`ObjectMapper`] owns the registries (naming mappers, value type
//! resolvers, override mappers) and the dispatch rule that picks a
//! [`TypeMapper`] for every `(value, type reference)` pair. The built-in
//! mappers recurse back through [`ObjectMapper::map_node`] for every nested
//! value, so a mapping call is one depth-first walk over the source tree.
//!
//! Registries are configured through `&mut self`; once shared (e.g. behind an
//! `Arc`) the engine is read-only and safe to use from many threads.
pub mod collection;
pub mod datetime;
pub mod object;
pub mod scalar;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::introspect::{AnnotationSource, Introspector, ObjectAccess, PropertyAccess};
use crate::naming::{DefaultCase, NamingMapper};
use crate::node::{Instance, Node};
use crate::options::Options;
use crate::registry::ClassRegistry;
use crate::resolver::ValueTypeResolver;
use crate::type_ref::TypeRef;

pub use collection::CollectionTypeMapper;
pub use datetime::{DateTime, DateTimeTypeMapper};
pub use object::ObjectTypeMapper;
pub use scalar::ScalarTypeMapper;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Maps one value onto one type reference.
///
/// `key` is the source key the value was found under, if any; it only
/// feeds error context.
pub trait TypeMapper: Send + Sync {
    fn map(&self, mapper: &ObjectMapper, value: Node, ty: Option<&TypeRef>, key: Option<&str>) -> Result<Node>;
}

/// Identity mapper; the dispatcher's fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTypeMapper;

pub struct ObjectMapper {
    options: Options,
    introspector: Arc<dyn Introspector>,
    annotations: Arc<dyn AnnotationSource>,
    accessor: Arc<dyn PropertyAccess>,
    naming_mappers: Vec<Arc<dyn NamingMapper>>,
    value_type_resolvers: Vec<Arc<dyn ValueTypeResolver>>,
    override_mappers: IndexMap<String, Arc<dyn TypeMapper>>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl TypeMapper for NoopTypeMapper {
    fn map(&self, _mapper: &ObjectMapper, value: Node, _ty: Option<&TypeRef>, _key: Option<&str>) -> Result<Node> {
        Ok(value)
    }
}

impl ObjectMapper {
    /// Engine backed by a declarative [`ClassRegistry`].
    pub fn new(options: Options, registry: Arc<ClassRegistry>) -> Self {
        Self::with_capabilities(options, registry.clone(), registry)
    }

    pub fn with_capabilities(
        options: Options,
        introspector: Arc<dyn Introspector>,
        annotations: Arc<dyn AnnotationSource>,
    ) -> Self {
        let accessor = Arc::new(ObjectAccess::new(options.variadic_setters));
        Self {
            options,
            introspector,
            annotations,
            accessor,
            naming_mappers: Vec::new(),
            value_type_resolvers: Vec::new(),
            override_mappers: IndexMap::new(),
        }
    }

    /// Replace the default [`ObjectAccess`] property accessor.
    pub fn with_accessor(mut self, accessor: Arc<dyn PropertyAccess>) -> Self {
        self.accessor = accessor;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn introspector(&self) -> &dyn Introspector {
        self.introspector.as_ref()
    }

    pub fn annotations(&self) -> &dyn AnnotationSource {
        self.annotations.as_ref()
    }

    pub fn accessor(&self) -> &dyn PropertyAccess {
        self.accessor.as_ref()
    }

    // ------------------------------ Registries ------------------------------ //

    pub fn add_naming_mapper(&mut self, naming_mapper: impl NamingMapper + 'static) -> &mut Self {
        self.naming_mappers.push(Arc::new(naming_mapper));
        self
    }

    pub fn add_value_type_resolver(&mut self, resolver: impl ValueTypeResolver + 'static) -> &mut Self {
        self.value_type_resolvers.push(Arc::new(resolver));
        self
    }

    /// Route every value targeting `class` (or a class implementing the
    /// interface `class`) to `type_mapper`. Replaces a previous registration.
    pub fn set_override_mapper(
        &mut self,
        class: impl Into<String>,
        type_mapper: impl TypeMapper + 'static,
    ) -> &mut Self {
        self.override_mappers.insert(class.into(), Arc::new(type_mapper));
        self
    }

    // ----------------------------- Entry points ----------------------------- //

    /// Map `value` onto `ty`. A [`Node::String`] value is decoded as JSON text
    /// first and must hold an array or an object.
    pub fn map<T: Into<TypeRef>>(&self, value: impl Into<Node>, ty: T) -> Result<Node> {
        self.map_with(value.into(), Some(ty.into()), true)
    }

    /// Pass-through/scalar-only mapping without a target type.
    pub fn map_untyped(&self, value: impl Into<Node>) -> Result<Node> {
        self.map_with(value.into(), None, true)
    }

    pub fn map_with(&self, value: Node, ty: Option<TypeRef>, decode_strings: bool) -> Result<Node> {
        if let Some(TypeRef::Class { name, .. }) = &ty {
            if name.trim().is_empty() {
                return Err(Error::InvalidInput("type name must not be empty".into()));
            }
        }
        let value = match value {
            Node::String(text) if decode_strings => decode(&text)?,
            other => other,
        };
        self.map_node(value, ty.as_ref(), None)
    }

    /// One recursion step: dispatch and map. Built-in mappers call this for
    /// every nested value.
    pub fn map_node(&self, value: Node, ty: Option<&TypeRef>, key: Option<&str>) -> Result<Node> {
        self.dispatch(&value, ty).map(self, value, ty, key)
    }

    /// Pick the mapper for a `(value, type reference)` pair.
    pub fn dispatch(&self, value: &Node, ty: Option<&TypeRef>) -> &dyn TypeMapper {
        let Some(ty) = ty else {
            if value.is_container() {
                trace!(route = "collection", "untyped container");
                return &CollectionTypeMapper;
            }
            if value.is_scalar() {
                trace!(route = "scalar", "untyped scalar");
                return &ScalarTypeMapper;
            }
            return &NoopTypeMapper;
        };

        if let TypeRef::Collection { .. } = ty {
            trace!(route = "collection", target = %ty.type_name());
            return &CollectionTypeMapper;
        }
        if let Some(class) = ty.class_name() {
            if let Some(type_mapper) = self.override_mapper(&class) {
                trace!(route = "override", target = %class);
                return type_mapper;
            }
            if self.introspector.is_collection_like(&class) {
                trace!(route = "collection", target = %class, "collection-like class");
                return &CollectionTypeMapper;
            }
        }
        match ty {
            TypeRef::Scalar { .. } => {
                trace!(route = "scalar", target = %ty.type_name());
                &ScalarTypeMapper
            }
            TypeRef::Class { .. } | TypeRef::Object(_) => {
                trace!(route = "object", target = %ty.type_name());
                &ObjectTypeMapper
            }
            TypeRef::Collection { .. } => &CollectionTypeMapper,
        }
    }

    // ----------------------- Shared steps for mappers ----------------------- //

    /// Override registered for `class` itself, else for the first of its
    /// interfaces that has one.
    fn override_mapper(&self, class: &str) -> Option<&dyn TypeMapper> {
        if self.override_mappers.is_empty() {
            return None;
        }
        if let Some(type_mapper) = self.override_mappers.get(class) {
            return Some(type_mapper.as_ref());
        }
        self.introspector
            .interfaces(class)
            .iter()
            .find_map(|interface| self.override_mappers.get(interface))
            .map(|type_mapper| type_mapper.as_ref())
    }

    /// Candidate property names for a source key: every registered naming
    /// mapper in registration order, then the key as-is. Duplicates dropped.
    pub fn candidate_names(&self, key: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.naming_mappers.len() + 1);
        let resolved = self
            .naming_mappers
            .iter()
            .filter_map(|naming_mapper| naming_mapper.resolve(key))
            .chain(DefaultCase.resolve(key));
        for name in resolved {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// First value type resolver with an opinion wins; `class` otherwise.
    pub fn resolve_value_type(&self, class: &str, value: &Node) -> String {
        self.value_type_resolvers
            .iter()
            .find_map(|resolver| resolver.resolve(class, value))
            .inspect(|resolved| trace!(from = class, to = %resolved, "resolved value type"))
            .unwrap_or_else(|| class.to_owned())
    }

    /// Create an instance of `class` for `value` and fire `instantiated`.
    ///
    /// Returns `true` alongside the instance when it was built by a
    /// single-value constructor, i.e. it must not be populated.
    pub(crate) fn instantiate(&self, class: &str, value: &Node) -> Result<(Instance, bool)> {
        let failed = |reason: String| Error::InstantiationFailed { class: class.to_owned(), reason };
        let constructors = self
            .introspector
            .constructors(class)
            .ok_or_else(|| failed("unknown class".into()))?;

        let (object, ctor_arg) = match (&constructors.single_value, value.is_scalar()) {
            (Some(single), true) => {
                let arg = match single.param {
                    Some(kind) => scalar::coerce(value.clone(), kind, self.options.strict_types, None, Some(class))?,
                    None => value.clone(),
                };
                ((single.build)(arg).map_err(failed)?, true)
            }
            _ => match (&constructors.default, &constructors.blank) {
                (Some(default), _) => (default(), false),
                (None, Some(blank)) if !self.options.instantiate_require_constructor => {
                    debug!(class, "no default constructor, instantiating without one");
                    (blank(), false)
                }
                _ => return Err(failed("no default constructor".into())),
            },
        };

        let instance = Instance::from_box(object);
        instance.notify_instantiated(self);
        Ok((instance, ctor_arg))
    }

    /// Apply the unknown property policy to a source key nothing took.
    ///
    /// `Some(name)` when the handler claimed the key under `name`.
    pub(crate) fn handle_unmapped(&self, target: &Instance, class: &str, key: &str, value: &Node) -> Result<Option<String>> {
        debug!(property = key, class, "handling unmapped property");
        if let Some(handler) = &self.options.unknown_property_handler {
            if let Some(mapped) = handler(target, key, value) {
                return Ok(Some(mapped));
            }
        }
        if !self.options.ignore_unknown_properties {
            return Err(Error::UnmappedProperty { property: key.to_owned(), class: class.to_owned() });
        }
        Ok(None)
    }

    /// Fail for the first required property of `class` not in `mapped`.
    pub(crate) fn verify_required(&self, class: &str, mapped: &[String]) -> Result<()> {
        let missing = self
            .introspector
            .properties(class)
            .into_iter()
            .find(|property| self.annotations.is_required(class, property) && !mapped.contains(property));
        match missing {
            Some(property) => Err(Error::MissingRequiredProperty { property, class: class.to_owned() }),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ObjectMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectMapper")
            .field("options", &self.options)
            .field("naming_mappers", &self.naming_mappers.len())
            .field("value_type_resolvers", &self.value_type_resolvers.len())
            .field("override_mappers", &self.override_mappers.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn decode(text: &str) -> Result<Node> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| Error::InvalidInput(format!("undecodable JSON text: {err}")))?;
    match value {
        Value::Array(_) | Value::Object(_) => Ok(Node::from(value)),
        other => Err(Error::InvalidInput(format!(
            "expected JSON text to decode to an array or object; actual={}",
            Node::from(other).kind_name()
        ))),
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::introspect::DeclaredType;
    use crate::naming::{CamelCase, SnakeCase};
    use crate::registry::ClassDef;
    use crate::type_ref::ScalarKind;
    use serde_json::json;

    struct Upper;

    impl TypeMapper for Upper {
        fn map(&self, _mapper: &ObjectMapper, value: Node, _ty: Option<&TypeRef>, _key: Option<&str>) -> Result<Node> {
            Ok(Node::from(value.as_str().unwrap_or_default().to_uppercase()))
        }
    }

    fn registry() -> Arc<ClassRegistry> {
        Arc::new(
            ClassRegistry::new()
                .with(
                    ClassDef::record("SimplePopo")
                        .property("proInt", DeclaredType::scalar(ScalarKind::Integer))
                        .interface("Shouting"),
                )
                .with(ClassDef::record("Bag").container()),
        )
    }

    #[test]
    fn collection_like_classes_take_the_collection_route() {
        let mapper = ObjectMapper::new(Options::default(), registry());
        let list = Node::from(json!(["x", "y"]));

        let bag = mapper.map(list.clone(), "Bag").unwrap();
        assert_eq!(bag.to_json(), json!({"0": "x", "1": "y"}));

        let err = mapper.map(list, "SimplePopo").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncompatibleType);
    }

    #[test]
    fn overrides_match_class_or_interface() {
        let mut mapper = ObjectMapper::new(Options::default(), registry());
        mapper.set_override_mapper("Shouting", Upper);
        let shouted = mapper.map_with(Node::from("hey"), Some(TypeRef::class("SimplePopo")), false).unwrap();
        assert_eq!(shouted, Node::from("HEY"));

        mapper.set_override_mapper("Loud", Upper);
        let shouted = mapper.map_with(Node::from("ho"), Some(TypeRef::class("Loud")), false).unwrap();
        assert_eq!(shouted, Node::from("HO"));

        let scalar = mapper.map_with(Node::from(1), Some(TypeRef::scalar(ScalarKind::String)), false);
        assert_eq!(scalar.unwrap_err().kind(), ErrorKind::IncompatibleType);
    }

    #[test]
    fn candidate_names_follow_registration_order() {
        let mut mapper = ObjectMapper::new(Options::default(), registry());
        assert_eq!(mapper.candidate_names("pro_int"), ["pro_int"]);

        mapper.add_naming_mapper(SnakeCase::default()).add_naming_mapper(CamelCase::default());
        assert_eq!(mapper.candidate_names("pro_int"), ["proInt", "pro_int"]);
        assert_eq!(mapper.candidate_names("proInt"), ["pro_int", "proInt"]);
    }

    #[test]
    fn text_values_are_decoded() {
        let mapper = ObjectMapper::new(Options::default(), registry());
        let popo = mapper.map(r#"{"proInt": 3}"#, "SimplePopo").unwrap();
        assert_eq!(popo.to_json(), json!({"proInt": 3}));

        let err = mapper.map("42", "SimplePopo").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = mapper.map("{nope", "SimplePopo").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = mapper.map(json!({}), "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let raw = mapper.map_with(Node::from("42"), None, false).unwrap();
        assert_eq!(raw, Node::from("42"));
    }

    #[test]
    fn untyped_values_pass_through() {
        let mapper = ObjectMapper::new(Options::default(), registry());
        let value = json!({"a": [1, {"b": null}], "c": "d"});
        assert_eq!(mapper.map_untyped(value.clone()).unwrap().to_json(), value);
    }

    #[test]
    fn unknown_classes_fail_to_instantiate() {
        let mapper = ObjectMapper::new(Options::default(), registry());
        let err = mapper.map(json!({}), "Nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InstantiationFailed);
        assert!(err.to_string().contains("class=Nope"));
    }

    #[test]
    fn engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ObjectMapper>();
    }
}
