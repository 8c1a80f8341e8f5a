//! Shared fixtures: a handful of native classes plus a registry declaring them.
#![allow(dead_code)]

use std::any::Any;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Value, json};

use json_binder::{
    AccessError, ClassDef, ClassRegistry, DeclaredType, DeserializerAware, Node, Object, ObjectMapper, Options,
    PropertyDef, ScalarKind,
};

macro_rules! object_plumbing {
    () => {
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    };
}

fn invalid(property: &str, value: &Node) -> AccessError {
    AccessError::invalid_argument(property, format!("unexpected {}", value.kind_name()))
}

fn opt<T: Into<Node> + Clone>(value: &Option<T>) -> Node {
    value.clone().map_or(Node::Null, Into::into)
}

// ------------------------------- SimplePopo -------------------------------- //

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimplePopo {
    pub pro_int: Option<i64>,
    pub pro_float: Option<f64>,
    pub pro_string: Option<String>,
    pub pro_bool: Option<bool>,
    pub pro_arr: Vec<String>,
}

impl Object for SimplePopo {
    fn class_name(&self) -> &str {
        "SimplePopo"
    }

    fn get(&self, property: &str) -> Option<Node> {
        match property {
            "proInt" => Some(opt(&self.pro_int)),
            "proFloat" => Some(opt(&self.pro_float)),
            "proString" => Some(opt(&self.pro_string)),
            "proBool" => Some(opt(&self.pro_bool)),
            "proArr" => Some(Node::List(self.pro_arr.iter().map(|s| Node::from(s.as_str())).collect())),
            _ => None,
        }
    }

    fn set(&mut self, property: &str, value: Node) -> Result<(), AccessError> {
        match (property, value) {
            ("proInt", Node::Int(i)) => self.pro_int = Some(i),
            ("proInt", Node::Null) => self.pro_int = None,
            ("proFloat", Node::Float(f)) => self.pro_float = Some(f),
            ("proString", Node::String(s)) => self.pro_string = Some(s),
            ("proString", Node::Null) => self.pro_string = None,
            ("proBool", Node::Bool(b)) => self.pro_bool = Some(b),
            ("proArr", Node::List(items)) => {
                self.pro_arr = items.iter().filter_map(|n| n.as_str().map(str::to_owned)).collect();
            }
            (name @ ("proInt" | "proFloat" | "proString" | "proBool" | "proArr"), other) => {
                return Err(invalid(name, &other));
            }
            (name, _) => return Err(AccessError::no_such_property(name, "SimplePopo")),
        }
        Ok(())
    }

    fn to_json(&self) -> Value {
        let mut out = serde_json::Map::new();
        if let Some(i) = self.pro_int {
            out.insert("proInt".into(), json!(i));
        }
        if let Some(f) = self.pro_float {
            out.insert("proFloat".into(), json!(f));
        }
        if let Some(s) = &self.pro_string {
            out.insert("proString".into(), json!(s));
        }
        if let Some(b) = self.pro_bool {
            out.insert("proBool".into(), json!(b));
        }
        if !self.pro_arr.is_empty() {
            out.insert("proArr".into(), json!(self.pro_arr));
        }
        Value::Object(out)
    }

    object_plumbing!();
}

// -------------------------- DeserializerAwarePopo --------------------------- //

/// Records `i:<proString>` on instantiation and `d:<proString>` when done.
#[derive(Debug, Clone, PartialEq)]
pub struct DeserializerAwarePopo {
    pub pro_string: String,
    pub aware: String,
}

impl Default for DeserializerAwarePopo {
    fn default() -> Self {
        Self { pro_string: "null".into(), aware: String::new() }
    }
}

impl DeserializerAware for DeserializerAwarePopo {
    fn instantiated(&mut self, _mapper: &ObjectMapper) {
        self.aware.push_str(&format!("i:{}", self.pro_string));
    }

    fn deserialized(&mut self, _mapper: &ObjectMapper) {
        self.aware.push_str(&format!("d:{}", self.pro_string));
    }
}

impl Object for DeserializerAwarePopo {
    fn class_name(&self) -> &str {
        "DeserializerAwarePopo"
    }

    fn get(&self, property: &str) -> Option<Node> {
        match property {
            "proString" => Some(Node::from(self.pro_string.as_str())),
            "aware" => Some(Node::from(self.aware.as_str())),
            _ => None,
        }
    }

    fn set(&mut self, property: &str, value: Node) -> Result<(), AccessError> {
        match (property, value) {
            ("proString", Node::String(s)) => {
                self.pro_string = s;
                Ok(())
            }
            ("proString", other) => Err(invalid(property, &other)),
            _ => Err(AccessError::no_such_property(property, "DeserializerAwarePopo")),
        }
    }

    fn to_json(&self) -> Value {
        json!({"proString": self.pro_string})
    }

    fn deserializer_aware(&mut self) -> Option<&mut dyn DeserializerAware> {
        Some(self)
    }

    object_plumbing!();
}

// ----------------------- DeserializerAwareCollection ----------------------- //

/// Ordered container recording its size on both lifecycle events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeserializerAwareCollection {
    pub entries: IndexMap<String, Node>,
    pub aware: String,
}

impl DeserializerAware for DeserializerAwareCollection {
    fn instantiated(&mut self, _mapper: &ObjectMapper) {
        self.aware.push_str(&format!("i:{}", self.entries.len()));
    }

    fn deserialized(&mut self, _mapper: &ObjectMapper) {
        self.aware.push_str(&format!("d:{}", self.entries.len()));
    }
}

impl Object for DeserializerAwareCollection {
    fn class_name(&self) -> &str {
        "DeserializerAwareCollection"
    }

    fn get(&self, property: &str) -> Option<Node> {
        self.entries.get(property).cloned()
    }

    fn set(&mut self, property: &str, value: Node) -> Result<(), AccessError> {
        self.entries.insert(property.to_owned(), value);
        Ok(())
    }

    fn to_json(&self) -> Value {
        Node::Map(self.entries.clone()).to_json()
    }

    fn deserializer_aware(&mut self) -> Option<&mut dyn DeserializerAware> {
        Some(self)
    }

    object_plumbing!();
}

// ---------------------------- Constructor shapes ---------------------------- //

/// Optional single-value constructor: `SingleValuePopo(value = None)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SingleValuePopo {
    pub value: Option<String>,
}

impl Object for SingleValuePopo {
    fn class_name(&self) -> &str {
        "SingleValuePopo"
    }

    fn get(&self, property: &str) -> Option<Node> {
        (property == "value").then(|| opt(&self.value))
    }

    fn set(&mut self, property: &str, value: Node) -> Result<(), AccessError> {
        match (property, value) {
            ("value", Node::String(s)) => {
                self.value = Some(s);
                Ok(())
            }
            ("value", other) => Err(invalid(property, &other)),
            _ => Err(AccessError::no_such_property(property, "SingleValuePopo")),
        }
    }

    fn to_json(&self) -> Value {
        json!({"value": self.value})
    }

    object_plumbing!();
}

/// Only constructor takes the value; `value` has no setter.
#[derive(Debug, Clone, PartialEq)]
pub struct NoDefaultCtorPopo {
    pub value: Option<String>,
    pub other: bool,
}

impl NoDefaultCtorPopo {
    pub fn new(value: String) -> Self {
        Self { value: Some(value), other: true }
    }

    /// Field defaults without running the constructor.
    pub fn blank() -> Self {
        Self { value: None, other: true }
    }
}

impl Object for NoDefaultCtorPopo {
    fn class_name(&self) -> &str {
        "NoDefaultCtorPopo"
    }

    fn get(&self, property: &str) -> Option<Node> {
        match property {
            "value" => Some(opt(&self.value)),
            "other" => Some(Node::Bool(self.other)),
            _ => None,
        }
    }

    fn set(&mut self, property: &str, value: Node) -> Result<(), AccessError> {
        match (property, value) {
            ("other", Node::Bool(b)) => {
                self.other = b;
                Ok(())
            }
            ("other", other) => Err(invalid(property, &other)),
            _ => Err(AccessError::no_such_property(property, "NoDefaultCtorPopo")),
        }
    }

    fn to_json(&self) -> Value {
        json!({"value": self.value, "other": self.other})
    }

    object_plumbing!();
}

/// Setter only accepts the values spread out: `setItems(...$items)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariadicPopo {
    pub items: Vec<i64>,
}

impl Object for VariadicPopo {
    fn class_name(&self) -> &str {
        "VariadicPopo"
    }

    fn get(&self, property: &str) -> Option<Node> {
        (property == "items").then(|| Node::List(self.items.iter().map(|i| Node::Int(*i)).collect()))
    }

    fn set(&mut self, property: &str, value: Node) -> Result<(), AccessError> {
        match property {
            "items" => Err(invalid(property, &value)),
            _ => Err(AccessError::no_such_property(property, "VariadicPopo")),
        }
    }

    fn set_variadic(&mut self, property: &str, values: Vec<Node>) -> Result<(), AccessError> {
        if property != "items" {
            return Err(AccessError::no_such_property(property, "VariadicPopo"));
        }
        self.items = values.iter().filter_map(Node::as_i64).collect();
        Ok(())
    }

    fn to_json(&self) -> Value {
        json!({"items": self.items})
    }

    object_plumbing!();
}

// -------------------------------- Registry --------------------------------- //

fn scalar(kind: ScalarKind) -> DeclaredType {
    DeclaredType::scalar(kind)
}

pub fn registry() -> ClassRegistry {
    ClassRegistry::new()
        .with(
            ClassDef::native::<SimplePopo>("SimplePopo")
                .property_def("proInt", PropertyDef::new([scalar(ScalarKind::Integer).nullable()]).required())
                .property("proFloat", scalar(ScalarKind::Float))
                .property("proString", scalar(ScalarKind::String).nullable())
                .property("proBool", scalar(ScalarKind::Boolean))
                .property("proArr", DeclaredType::collection_of(scalar(ScalarKind::String)))
                .interface("PopoInterface"),
        )
        .with(
            ClassDef::record("AnotherPopo")
                .property("foo", scalar(ScalarKind::String))
                .interface("PopoInterface"),
        )
        .with(
            ClassDef::record("NestedPopo")
                .property("proNested", DeclaredType::class("SimplePopo").nullable())
                .property("proArr", DeclaredType::collection_of(DeclaredType::class("SimplePopo")))
                .property("proIface", DeclaredType::class("PopoInterface"))
                .property("proMixed", DeclaredType::mixed()),
        )
        .with(
            ClassDef::record("UnionPopo").property_def(
                "value",
                PropertyDef::new([
                    scalar(ScalarKind::Integer),
                    scalar(ScalarKind::Boolean),
                    DeclaredType::class("SimplePopo"),
                ]),
            ),
        )
        .with(
            ClassDef::native::<DeserializerAwarePopo>("DeserializerAwarePopo")
                .property("proString", scalar(ScalarKind::String).nullable()),
        )
        .with(ClassDef::native::<DeserializerAwareCollection>("DeserializerAwareCollection").container())
        .with(
            ClassDef::native::<SingleValuePopo>("SingleValuePopo")
                .property("value", scalar(ScalarKind::String).nullable())
                .single_value_constructor(Some(ScalarKind::String), |value| {
                    Ok(Box::new(SingleValuePopo { value: value.as_str().map(str::to_owned) }))
                }),
        )
        .with(
            ClassDef::new("NoDefaultCtorPopo")
                .property_def("value", PropertyDef::new([scalar(ScalarKind::String)]).read_only())
                .property("other", scalar(ScalarKind::Boolean))
                .single_value_constructor(Some(ScalarKind::String), |value| match value {
                    Node::String(s) => Ok(Box::new(NoDefaultCtorPopo::new(s))),
                    other => Err(format!("expected string, got {}", other.kind_name())),
                })
                .blank_constructor(|| Box::new(NoDefaultCtorPopo::blank())),
        )
        .with(ClassDef::enumeration("StatusEnumStringBacked", ["draft", "published", "archived"]))
        .with(ClassDef::enumeration("PlainEnum", ["RED", "GREEN", "BLUE"]))
        .with(
            ClassDef::record("EnumPopo")
                .property("status", DeclaredType::class("StatusEnumStringBacked").nullable())
                .property("colour", DeclaredType::class("PlainEnum").nullable()),
        )
        .with(
            ClassDef::native::<VariadicPopo>("VariadicPopo")
                .property("items", DeclaredType::collection_of(scalar(ScalarKind::Integer))),
        )
}

pub fn mapper(options: Options) -> ObjectMapper {
    ObjectMapper::new(options, Arc::new(registry()))
}
