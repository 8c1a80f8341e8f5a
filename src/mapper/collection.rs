//! Builds containers from sequences and maps, mapping every element.
use indexmap::IndexMap;

use super::{ObjectMapper, TypeMapper};
use crate::error::{AccessError, Error, Result};
use crate::node::{Instance, Node};
use crate::type_ref::{ContainerKind, TypeRef};

#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionTypeMapper;

impl TypeMapper for CollectionTypeMapper {
    fn map(&self, mapper: &ObjectMapper, value: Node, ty: Option<&TypeRef>, key: Option<&str>) -> Result<Node> {
        if value.is_scalar() && mapper.options().strict_collections {
            return Err(Error::IncompatibleCollection { property: key.map(str::to_owned), actual: value.kind_name() });
        }
        let Some(ty) = ty else { return Ok(value) };
        if value.is_null() {
            return Ok(value);
        }

        match ty {
            TypeRef::Collection { element, container, .. } => {
                let element = element.as_deref();
                match container {
                    ContainerKind::Plain => match value {
                        Node::List(items) => items
                            .into_iter()
                            .enumerate()
                            .map(|(i, item)| mapper.map_node(item, element, Some(&i.to_string())))
                            .collect::<Result<Vec<_>>>()
                            .map(Node::List),
                        scalar if scalar.is_scalar() => {
                            mapper.map_node(scalar, element, Some("0")).map(|item| Node::List(vec![item]))
                        }
                        other => map_entries(mapper, other, element),
                    },
                    ContainerKind::OrderedMap => map_entries(mapper, value, element),
                    ContainerKind::Class(name) => {
                        let class = mapper.resolve_value_type(name, &value);
                        let (container, _) = mapper.instantiate(&class, &value)?;
                        fill(mapper, container, &class, value, element)
                    }
                }
            }
            TypeRef::Class { name, .. } => {
                let class = mapper.resolve_value_type(name, &value);
                let (container, _) = mapper.instantiate(&class, &value)?;
                fill(mapper, container, &class, value, None)
            }
            TypeRef::Object(instance) => {
                let class = instance.class_name();
                fill(mapper, instance.clone(), &class, value, None)
            }
            TypeRef::Scalar { .. } => {
                Err(Error::UnexpectedTypeReference { mapper: "collection", found: ty.type_name() })
            }
        }
    }
}

fn map_entries(mapper: &ObjectMapper, value: Node, element: Option<&TypeRef>) -> Result<Node> {
    value
        .into_entries()
        .into_iter()
        .map(|(key, item)| Ok((key.clone(), mapper.map_node(item, element, Some(&key))?)))
        .collect::<Result<IndexMap<_, _>>>()
        .map(Node::Map)
}

/// Indexed insertion into an instantiated container, one `set_value` per
/// entry, then `deserialized`.
fn fill(
    mapper: &ObjectMapper,
    container: Instance,
    class: &str,
    value: Node,
    element: Option<&TypeRef>,
) -> Result<Node> {
    for (key, item) in value.into_entries() {
        let item = mapper.map_node(item, element, Some(&key))?;
        let actual = item.kind_name();
        let mut object = container.write();
        mapper
            .accessor()
            .set_value(&mut **object, &key, item)
            .map_err(|err| rejected(err, class, actual))?;
    }
    container.notify_deserialized(mapper);
    Ok(Node::Object(container))
}

fn rejected(err: AccessError, class: &str, actual: String) -> Error {
    let (AccessError::NoSuchProperty { property, .. } | AccessError::InvalidArgument { property, .. }) = &err;
    Error::IncompatibleType {
        property: Some(property.clone()),
        class: Some(class.to_owned()),
        actual,
        expected: err.to_string(),
    }
}

// ------------------------------- Tests ------------------------------------ //
