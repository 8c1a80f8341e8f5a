//! Instantiates a class and populates it property by property.
use tracing::debug;

use super::{ObjectMapper, TypeMapper, scalar};
use crate::error::{AccessError, Error, Result};
use crate::node::{Instance, Node};
use crate::type_ref::{ScalarKind, TypeRef};

#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectTypeMapper;

/// Where a source key lands on the target.
enum Slot {
    /// Declared, writable property.
    Declared(String),
    /// Undeclared key on an open class.
    Open(String),
}

impl TypeMapper for ObjectTypeMapper {
    fn map(&self, mapper: &ObjectMapper, value: Node, ty: Option<&TypeRef>, key: Option<&str>) -> Result<Node> {
        let Some(ty) = ty else { return Ok(value) };
        if value.is_null() {
            return Ok(value);
        }

        let (target, class, ctor_arg) = match ty {
            TypeRef::Object(instance) => (instance.clone(), instance.class_name(), false),
            TypeRef::Class { name, .. } => {
                let resolved = mapper.resolve_value_type(name, &value);
                if let Node::Object(existing) = &value {
                    if existing.class_name() == resolved {
                        return Ok(value);
                    }
                }
                if let Ok(kind) = resolved.parse::<ScalarKind>() {
                    return scalar::coerce(value, kind, mapper.options().strict_types, key, None);
                }
                if value.is_scalar() {
                    if mapper.introspector().is_enum(&resolved) {
                        return enum_case(mapper, &resolved, value, key);
                    }
                    if mapper.options().strict_types {
                        return Err(Error::incompatible(key, Some(&resolved), value.kind_name(), "object"));
                    }
                }
                let (instance, ctor_arg) = mapper.instantiate(&resolved, &value)?;
                (instance, resolved, ctor_arg)
            }
            other => return Err(Error::UnexpectedTypeReference { mapper: "object", found: other.type_name() }),
        };

        if ctor_arg {
            target.notify_deserialized(mapper);
            return Ok(Node::Object(target));
        }

        let entries = match value {
            Node::Map(entries) => entries.into_iter().collect(),
            other if mapper.options().strict_types => {
                return Err(Error::incompatible(key, Some(&class), other.kind_name(), "object"));
            }
            other @ (Node::List(_) | Node::Object(_)) => other.into_entries(),
            _ => Vec::new(),
        };

        populate(mapper, &target, &class, entries)?;

        target.notify_deserialized(mapper);
        Ok(Node::Object(target))
    }
}

/// Build the enumeration case named by a scalar; enumerations take scalars
/// whatever the strictness.
fn enum_case(mapper: &ObjectMapper, class: &str, value: Node, key: Option<&str>) -> Result<Node> {
    let actual = value.kind_name();
    let (instance, _) = mapper.instantiate(class, &value).map_err(|err| match err {
        Error::InstantiationFailed { reason, .. } => {
            debug!(?key, class, %reason, "not an enumeration case");
            Error::incompatible(key, Some(class), actual, class)
        }
        other => other,
    })?;
    instance.notify_deserialized(mapper);
    Ok(Node::Object(instance))
}

fn populate(mapper: &ObjectMapper, target: &Instance, class: &str, entries: Vec<(String, Node)>) -> Result<()> {
    let introspector = mapper.introspector();
    let properties = introspector.properties(class);
    let open = introspector.is_open(class);
    let mut mapped: Vec<String> = Vec::new();

    for (source_key, raw) in entries {
        let slot = mapper.candidate_names(&source_key).into_iter().find_map(|name| {
            if properties.contains(&name) {
                if introspector.is_writable(class, &name) {
                    return Some(Slot::Declared(name));
                }
                debug!(property = %name, class, "unwritable property");
                None
            } else if open {
                Some(Slot::Open(name))
            } else {
                None
            }
        });

        let (name, value) = match slot {
            Some(Slot::Declared(name)) => {
                let value = map_value(mapper, class, &name, raw)?;
                (name, value)
            }
            Some(Slot::Open(name)) => {
                let value = mapper.map_node(raw, None, Some(&name))?;
                (name, value)
            }
            None => {
                mapped.extend(mapper.handle_unmapped(target, class, &source_key, &raw)?);
                continue;
            }
        };

        let outcome = {
            let mut object = target.write();
            mapper.accessor().set_value(&mut **object, &name, value.clone())
        };
        match outcome {
            Ok(()) => mapped.push(name),
            Err(AccessError::NoSuchProperty { .. }) => {
                mapped.extend(mapper.handle_unmapped(target, class, &source_key, &value)?);
            }
            Err(AccessError::InvalidArgument { reason, .. }) => {
                return Err(Error::incompatible(Some(&name), Some(class), value.kind_name(), reason));
            }
        }
    }

    if mapper.options().verify_required_properties {
        mapper.verify_required(class, &mapped)?;
    }
    Ok(())
}

/// Map one property value against the property's declared type(s).
///
/// Union-typed properties try each declared type in order; the first that
/// maps wins.
fn map_value(mapper: &ObjectMapper, class: &str, property: &str, raw: Node) -> Result<Node> {
    let declared = mapper.introspector().declared_types(class, property);
    let candidates: Vec<Option<TypeRef>> = if declared.is_empty() {
        vec![None]
    } else {
        declared.iter().map(TypeRef::from_declared).collect()
    };

    let accepts_null = candidates.iter().any(|c| c.as_ref().is_none_or(TypeRef::is_nullable));
    if raw.is_null() && !accepts_null && mapper.options().strict_null {
        return Err(Error::UnmappableNull { property: property.to_owned(), class: class.to_owned() });
    }

    if let [only] = candidates.as_slice() {
        return mapper.map_node(raw, only.as_ref(), Some(property));
    }

    for candidate in &candidates {
        match mapper.map_node(raw.clone(), candidate.as_ref(), Some(property)) {
            Ok(value) => return Ok(value),
            Err(err) => debug!(property, class, candidate = %type_name(candidate), %err, "union candidate rejected"),
        }
    }
    let expected = candidates.iter().map(type_name).collect::<Vec<_>>().join(", ");
    Err(Error::incompatible(Some(property), Some(class), raw.kind_name(), expected))
}

fn type_name(candidate: &Option<TypeRef>) -> String {
    candidate.as_ref().map_or_else(|| "mixed".to_owned(), TypeRef::type_name)
}

// ------------------------------- Tests ------------------------------------ //
