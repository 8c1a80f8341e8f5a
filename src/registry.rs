//! Declarative class registry.
//!
//! [`ClassRegistry`] is the built-in [`Introspector`] + [`AnnotationSource`]:
//! classes are declared up front, either from Rust (`ClassDef` builders,
//! optionally backed by native [`Object`] types) or from a JSON schema file
//! whose classes are materialized as [`Record`] property bags.
use std::any::Any;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AccessError, Error, Result};
use crate::introspect::{
    AnnotationSource, Constructors, DeclaredKind, DeclaredType, Factory, Introspector, SingleValueConstructor,
};
use crate::node::{Node, Object};
use crate::type_ref::ScalarKind;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Generic property bag; accepts any property name.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    class: String,
    fields: IndexMap<String, Node>,
}

/// One case of an enumeration class; re-encodes as its case string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumCase {
    class: String,
    case: String,
}

#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub types: Vec<DeclaredType>,
    pub required: bool,
    pub writable: bool,
}

#[derive(Debug, Clone)]
pub struct ClassDef {
    name: String,
    properties: IndexMap<String, PropertyDef>,
    interfaces: Vec<String>,
    container: bool,
    open: bool,
    enumeration: bool,
    constructors: Constructors,
}

#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: IndexMap<String, ClassDef>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Record {
    pub fn new(class: impl Into<String>) -> Self {
        Self { class: class.into(), fields: IndexMap::new() }
    }

    pub fn fields(&self) -> &IndexMap<String, Node> {
        &self.fields
    }
}

impl Object for Record {
    fn class_name(&self) -> &str {
        &self.class
    }

    fn get(&self, property: &str) -> Option<Node> {
        self.fields.get(property).cloned()
    }

    fn set(&mut self, property: &str, value: Node) -> Result<(), AccessError> {
        self.fields.insert(property.to_owned(), value);
        Ok(())
    }

    fn to_json(&self) -> Value {
        Value::Object(self.fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl EnumCase {
    pub fn case(&self) -> &str {
        &self.case
    }
}

impl Object for EnumCase {
    fn class_name(&self) -> &str {
        &self.class
    }

    fn get(&self, property: &str) -> Option<Node> {
        matches!(property, "name" | "value").then(|| Node::from(self.case.as_str()))
    }

    fn set(&mut self, property: &str, _value: Node) -> Result<(), AccessError> {
        Err(AccessError::no_such_property(property, &self.class))
    }

    fn to_json(&self) -> Value {
        Value::String(self.case.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl PropertyDef {
    pub fn new(types: impl IntoIterator<Item = DeclaredType>) -> Self {
        Self { types: types.into_iter().collect(), required: false, writable: true }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }
}

impl ClassDef {
    /// A class without any constructor; add them with the builder methods.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: IndexMap::new(),
            interfaces: Vec::new(),
            container: false,
            open: false,
            enumeration: false,
            constructors: Constructors::default(),
        }
    }

    /// A class materialized as [`Record`]s.
    pub fn record(name: impl Into<String>) -> Self {
        let name = name.into();
        let class = name.clone();
        let factory: Factory = Arc::new(move || Box::new(Record::new(class.clone())));
        let mut def = Self::new(name);
        def.constructors.default = Some(factory.clone());
        def.constructors.blank = Some(factory);
        def
    }

    /// A class backed by the native type `T`.
    pub fn native<T: Object + Default>(name: impl Into<String>) -> Self {
        let factory: Factory = Arc::new(|| Box::new(T::default()));
        let mut def = Self::new(name);
        def.constructors.default = Some(factory.clone());
        def.constructors.blank = Some(factory);
        def
    }

    /// An enumeration with the given cases. A scalar naming a case builds
    /// an [`EnumCase`]; anything else is rejected.
    pub fn enumeration<S: Into<String>>(name: impl Into<String>, cases: impl IntoIterator<Item = S>) -> Self {
        let name = name.into();
        let cases: Vec<String> = cases.into_iter().map(Into::into).collect();
        let class = name.clone();
        let mut def = Self::new(name);
        def.enumeration = true;
        def.single_value_constructor(Some(ScalarKind::String), move |value| {
            let case = value.as_str().unwrap_or_default();
            if !cases.iter().any(|c| c == case) {
                return Err(format!("unknown case {case:?}, expected one of {}", cases.join("|")));
            }
            Ok(Box::new(EnumCase { class: class.clone(), case: case.to_owned() }))
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn property(self, name: impl Into<String>, ty: DeclaredType) -> Self {
        self.property_def(name, PropertyDef::new([ty]))
    }

    pub fn property_def(mut self, name: impl Into<String>, def: PropertyDef) -> Self {
        self.properties.insert(name.into(), def);
        self
    }

    pub fn interface(mut self, name: impl Into<String>) -> Self {
        self.interfaces.push(name.into());
        self
    }

    /// Ordered map container: collection-like and open.
    pub fn container(mut self) -> Self {
        self.container = true;
        self.open = true;
        self
    }

    pub fn open(mut self) -> Self {
        self.open = true;
        self
    }

    pub fn default_constructor(mut self, f: impl Fn() -> Box<dyn Object> + Send + Sync + 'static) -> Self {
        self.constructors.default = Some(Arc::new(f));
        self
    }

    pub fn without_default_constructor(mut self) -> Self {
        self.constructors.default = None;
        self
    }

    pub fn blank_constructor(mut self, f: impl Fn() -> Box<dyn Object> + Send + Sync + 'static) -> Self {
        self.constructors.blank = Some(Arc::new(f));
        self
    }

    pub fn single_value_constructor(
        mut self,
        param: Option<ScalarKind>,
        f: impl Fn(Node) -> Result<Box<dyn Object>, String> + Send + Sync + 'static,
    ) -> Self {
        self.constructors.single_value = Some(SingleValueConstructor { param, build: Arc::new(f) });
        self
    }
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, def: ClassDef) -> &mut Self {
        self.classes.insert(def.name.clone(), def);
        self
    }

    pub fn with(mut self, def: ClassDef) -> Self {
        self.register(def);
        self
    }

    pub fn get(&self, class: &str) -> Option<&ClassDef> {
        self.classes.get(class)
    }

    pub fn from_schema_str(src: &str) -> Result<Self> {
        let file: SchemaFile = crate::path_de::from_str_with_path(src)?;
        file.into_registry()
    }

    pub fn from_schema_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|err| Error::InvalidInput(format!("unable to read schema {}: {err}", path.display())))?;
        let file: SchemaFile = crate::path_de::from_slice_with_path(&bytes)?;
        file.into_registry()
    }

    fn property(&self, class: &str, property: &str) -> Option<&PropertyDef> {
        self.classes.get(class)?.properties.get(property)
    }
}

impl Introspector for ClassRegistry {
    fn properties(&self, class: &str) -> Vec<String> {
        self.classes
            .get(class)
            .map(|def| def.properties.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn declared_types(&self, class: &str, property: &str) -> Vec<DeclaredType> {
        self.property(class, property).map(|p| p.types.clone()).unwrap_or_default()
    }

    fn is_writable(&self, class: &str, property: &str) -> bool {
        self.property(class, property).is_some_and(|p| p.writable)
    }

    fn interfaces(&self, class: &str) -> Vec<String> {
        self.classes.get(class).map(|def| def.interfaces.clone()).unwrap_or_default()
    }

    fn is_collection_like(&self, class: &str) -> bool {
        self.classes.get(class).is_some_and(|def| def.container)
    }

    fn is_open(&self, class: &str) -> bool {
        self.classes.get(class).is_some_and(|def| def.open)
    }

    fn is_enum(&self, class: &str) -> bool {
        self.classes.get(class).is_some_and(|def| def.enumeration)
    }

    fn constructors(&self, class: &str) -> Option<Constructors> {
        self.classes.get(class).map(|def| def.constructors.clone())
    }
}

impl AnnotationSource for ClassRegistry {
    fn is_required(&self, class: &str, property: &str) -> bool {
        self.property(class, property).is_some_and(|p| p.required)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SCHEMA FILES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaFile {
    classes: IndexMap<String, ClassSpec>,
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct ClassSpec {
    properties: IndexMap<String, PropertySpec>,
    interfaces: Vec<String>,
    container: bool,
    open: bool,
    constructor: ConstructorSpec,
    /// Makes the class an enumeration of these cases.
    cases: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PropertySpec {
    Short(TypeSpec),
    Full(PropertyFull),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PropertyFull {
    #[serde(rename = "type", default)]
    ty: Option<TypeSpec>,
    #[serde(default)]
    required: bool,
    #[serde(default = "writable_by_default")]
    writable: bool,
}

/// `"integer"`, `"?string"`, `"Popo"`, `"mixed"`, `{"list": T}`, `[T1, T2, "null"]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum TypeSpec {
    Name(String),
    List(ListSpec),
    Union(Vec<TypeSpec>),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ListSpec {
    list: Box<TypeSpec>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "lowercase")]
enum ConstructorSpec {
    #[default]
    Default,
    None,
    /// Single-value constructor storing the raw value into the named property.
    Value(String),
}

fn writable_by_default() -> bool {
    true
}

impl SchemaFile {
    fn into_registry(self) -> Result<ClassRegistry> {
        let mut registry = ClassRegistry::new();
        for (name, spec) in self.classes {
            registry.register(spec.into_class_def(name)?);
        }
        Ok(registry)
    }
}

impl ClassSpec {
    fn into_class_def(self, name: String) -> Result<ClassDef> {
        if let Some(cases) = self.cases {
            if !self.properties.is_empty() {
                return Err(Error::InvalidInput(format!("enumeration {name} cannot declare properties")));
            }
            let mut def = ClassDef::enumeration(name, cases);
            def.interfaces = self.interfaces;
            return Ok(def);
        }
        let mut def = ClassDef::record(name.clone());
        for (property, spec) in self.properties {
            let (ty, required, writable) = match spec {
                PropertySpec::Short(ty) => (Some(ty), false, true),
                PropertySpec::Full(full) => (full.ty, full.required, full.writable),
            };
            let types = match ty {
                Some(ty) => ty.declared_types()?,
                None => Vec::new(),
            };
            def.properties.insert(property, PropertyDef { types, required, writable });
        }
        def.interfaces = self.interfaces;
        if self.container {
            def = def.container();
        }
        if self.open {
            def = def.open();
        }
        match self.constructor {
            ConstructorSpec::Default => {}
            ConstructorSpec::None => def = def.without_default_constructor(),
            ConstructorSpec::Value(property) => {
                let param = def.properties.get(&property).and_then(|p| {
                    p.types.iter().find_map(|t| match t.kind {
                        DeclaredKind::Scalar(kind) => Some(kind),
                        _ => None,
                    })
                });
                let class = name.clone();
                def = def.without_default_constructor().single_value_constructor(param, move |value| {
                    let mut record = Record::new(class.clone());
                    record.fields.insert(property.clone(), value);
                    Ok(Box::new(record))
                });
            }
        }
        Ok(def)
    }
}

impl TypeSpec {
    fn declared_types(self) -> Result<Vec<DeclaredType>> {
        match self {
            TypeSpec::Name(name) => Ok(parse_type_name(&name).into_iter().collect()),
            TypeSpec::List(ListSpec { list }) => {
                let mut element = list.declared_types()?;
                if element.len() != 1 {
                    return Err(Error::InvalidInput(
                        "collection element must be a single, non-null type".into(),
                    ));
                }
                Ok(vec![DeclaredType::collection_of(element.remove(0))])
            }
            TypeSpec::Union(members) => {
                let mut nullable = false;
                let mut types = Vec::new();
                for member in members {
                    if matches!(&member, TypeSpec::Name(n) if n == "null") {
                        nullable = true;
                        continue;
                    }
                    types.extend(member.declared_types()?);
                }
                if nullable {
                    types.iter_mut().for_each(|t| t.nullable = true);
                }
                Ok(types)
            }
        }
    }
}

/// `None` for the bare `"null"` type.
fn parse_type_name(name: &str) -> Option<DeclaredType> {
    let (name, nullable) = match name.strip_prefix('?') {
        Some(rest) => (rest, true),
        None => (name, false),
    };
    let declared = match name {
        "null" => return None,
        "mixed" => DeclaredType::mixed(),
        other => match other.parse::<ScalarKind>() {
            Ok(kind) => DeclaredType::scalar(kind),
            Err(()) => DeclaredType::class(other),
        },
    };
    Some(if nullable { declared.nullable() } else { declared })
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"{
        "classes": {
            "SimplePopo": {
                "properties": {
                    "proInt": {"type": "int", "required": true},
                    "proString": "?string",
                    "tags": {"list": "string"},
                    "either": ["integer", "string", "null"],
                    "anything": "mixed",
                    "id": {"type": "integer", "writable": false}
                },
                "interfaces": ["PopoInterface"]
            },
            "Email": {
                "properties": {"address": "string"},
                "constructor": {"value": "address"}
            },
            "Bag": {"container": true},
            "NoCtor": {"constructor": "none"}
        }
    }"#;

    #[test]
    fn loads_classes_from_schema() {
        let registry = ClassRegistry::from_schema_str(SCHEMA).unwrap();
        assert_eq!(
            registry.properties("SimplePopo"),
            ["proInt", "proString", "tags", "either", "anything", "id"]
        );
        assert!(registry.is_required("SimplePopo", "proInt"));
        assert!(!registry.is_required("SimplePopo", "proString"));
        assert!(!registry.is_writable("SimplePopo", "id"));
        assert!(registry.is_writable("SimplePopo", "proInt"));
        assert_eq!(registry.interfaces("SimplePopo"), ["PopoInterface"]);

        assert_eq!(
            registry.declared_types("SimplePopo", "proInt"),
            [DeclaredType::scalar(ScalarKind::Integer)]
        );
        assert_eq!(
            registry.declared_types("SimplePopo", "proString"),
            [DeclaredType::scalar(ScalarKind::String).nullable()]
        );
        assert_eq!(
            registry.declared_types("SimplePopo", "tags"),
            [DeclaredType::collection_of(DeclaredType::scalar(ScalarKind::String))]
        );
        let either = registry.declared_types("SimplePopo", "either");
        assert_eq!(either.len(), 2);
        assert!(either.iter().all(|t| t.nullable));
        assert_eq!(registry.declared_types("SimplePopo", "anything"), [DeclaredType::mixed()]);
    }

    #[test]
    fn constructor_shapes() {
        let registry = ClassRegistry::from_schema_str(SCHEMA).unwrap();

        let email = registry.constructors("Email").unwrap();
        assert!(email.default.is_none());
        let single = email.single_value.unwrap();
        assert_eq!(single.param, Some(ScalarKind::String));
        let object = (single.build)(Node::from("a@b.c")).unwrap();
        assert_eq!(object.get("address"), Some(Node::from("a@b.c")));

        let no_ctor = registry.constructors("NoCtor").unwrap();
        assert!(no_ctor.default.is_none());
        assert!(no_ctor.blank.is_some());

        assert!(registry.is_collection_like("Bag"));
        assert!(registry.is_open("Bag"));
        assert!(registry.constructors("Unknown").is_none());
    }

    #[test]
    fn enumerations_from_schema() {
        let registry =
            ClassRegistry::from_schema_str(r#"{"classes": {"Colour": {"cases": ["RED", "BLUE"]}}}"#).unwrap();
        assert!(registry.is_enum("Colour"));
        assert!(registry.constructors("Colour").unwrap().default.is_none());

        let build = registry.constructors("Colour").unwrap().single_value.unwrap().build;
        let blue = build(Node::from("BLUE")).unwrap();
        assert_eq!(blue.to_json(), serde_json::json!("BLUE"));
        assert_eq!(blue.get("name"), Some(Node::from("BLUE")));
        assert!(build(Node::from("GREEN")).unwrap_err().contains("RED|BLUE"));

        let err = ClassRegistry::from_schema_str(
            r#"{"classes": {"Colour": {"cases": ["RED"], "properties": {"hex": "string"}}}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("cannot declare properties"), "{err}");
    }

    #[test]
    fn rejects_unknown_schema_keys() {
        let err = ClassRegistry::from_schema_str(r#"{"classes": {"A": {"propertes": {}}}}"#).unwrap_err();
        assert!(err.to_string().contains("classes.A"), "{err}");
    }

    #[test]
    fn records_accept_any_property() {
        let mut record = Record::new("Popo");
        record.set("whatever", Node::Int(1)).unwrap();
        assert_eq!(record.to_json(), serde_json::json!({"whatever": 1}));
        assert_eq!(record.fields().len(), 1);
    }
}
