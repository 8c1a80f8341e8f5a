//! Scalar coercion.
//!
//! A value of the expected kind is accepted as is. Otherwise the value's kind
//! has to be compatible with the expected one:
//!
//! | expected  | strict                  | lenient adds                    |
//! |-----------|-------------------------|---------------------------------|
//! | `integer` | integral float          | any float, numeric string       |
//! | `float`   | integer                 | numeric string                  |
//! | `boolean` |                         | bool-ish or numeric string, numbers |
//! | `string`  |                         | integer, float, boolean         |
//!
//! Incompatible values fail in strict mode; in lenient mode a best-effort
//! cast is attempted and only an impossible cast fails.
use tracing::trace;

use super::{ObjectMapper, TypeMapper};
use crate::error::{Error, Result};
use crate::node::{Node, is_numeric};
use crate::type_ref::{ScalarKind, TypeRef};

#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarTypeMapper;

impl TypeMapper for ScalarTypeMapper {
    fn map(&self, mapper: &ObjectMapper, value: Node, ty: Option<&TypeRef>, key: Option<&str>) -> Result<Node> {
        match ty {
            None => Ok(value),
            Some(TypeRef::Scalar { kind, .. }) => coerce(value, *kind, mapper.options().strict_types, key, None),
            Some(other) => Err(Error::UnexpectedTypeReference { mapper: "scalar", found: other.type_name() }),
        }
    }
}

/// Coerce `value` to `kind`. `null` passes through; nullability is the
/// caller's business.
pub(crate) fn coerce(
    value: Node,
    kind: ScalarKind,
    strict: bool,
    key: Option<&str>,
    class: Option<&str>,
) -> Result<Node> {
    if value.is_null() {
        return Ok(value);
    }
    let incompatible = |value: &Node| Error::incompatible(key, class, value.kind_name(), kind.as_str());

    match value.scalar_kind() {
        None => return Err(incompatible(&value)),
        Some(actual) if actual == kind => return Ok(value),
        Some(_) => {}
    }
    if !is_compatible(&value, kind, strict) {
        if strict {
            return Err(incompatible(&value));
        }
        trace!(?key, from = %value.kind_name(), to = %kind, "lenient cast");
    }
    cast(&value, kind).ok_or_else(|| incompatible(&value))
}

fn is_compatible(value: &Node, kind: ScalarKind, strict: bool) -> bool {
    match (kind, value) {
        (ScalarKind::Integer, Node::Float(f)) => !strict || (f.is_finite() && f.fract() == 0.0),
        (ScalarKind::Float, Node::Int(_)) => true,
        (ScalarKind::Integer | ScalarKind::Float, Node::String(s)) => !strict && is_numeric(s),
        (ScalarKind::Boolean, Node::String(s)) => !strict && (is_numeric(s) || parse_bool(s).is_some()),
        (ScalarKind::Boolean, Node::Int(_) | Node::Float(_)) => !strict,
        (ScalarKind::String, Node::Int(_) | Node::Float(_) | Node::Bool(_)) => !strict,
        _ => false,
    }
}

/// `None` when the value cannot be represented as `kind` at all.
fn cast(value: &Node, kind: ScalarKind) -> Option<Node> {
    match kind {
        ScalarKind::Integer => match value {
            Node::Int(i) => Some(Node::Int(*i)),
            Node::Bool(b) => Some(Node::Int(i64::from(*b))),
            Node::Float(f) => truncate(*f),
            Node::String(s) if is_numeric(s) => s.trim().parse::<f64>().ok().and_then(truncate),
            _ => None,
        },
        ScalarKind::Float => match value {
            Node::Float(f) => Some(Node::Float(*f)),
            Node::Int(i) => Some(Node::Float(*i as f64)),
            Node::Bool(b) => Some(Node::Float(f64::from(u8::from(*b)))),
            Node::String(s) if is_numeric(s) => s.trim().parse::<f64>().ok().map(Node::Float),
            _ => None,
        },
        ScalarKind::Boolean => match value {
            Node::Bool(b) => Some(Node::Bool(*b)),
            Node::Int(i) => Some(Node::Bool(*i != 0)),
            Node::Float(f) => Some(Node::Bool(*f != 0.0)),
            Node::String(s) if is_numeric(s) => s.trim().parse::<f64>().ok().map(|f| Node::Bool(f != 0.0)),
            Node::String(s) => parse_bool(s).map(Node::Bool),
            _ => None,
        },
        ScalarKind::String => match value {
            Node::String(s) => Some(Node::String(s.clone())),
            Node::Int(i) => Some(Node::String(i.to_string())),
            Node::Float(f) => Some(Node::String(f.to_string())),
            Node::Bool(b) => Some(Node::String(b.to_string())),
            _ => None,
        },
    }
}

fn truncate(f: f64) -> Option<Node> {
    (f.is_finite() && f.abs() < i64::MAX as f64).then(|| Node::Int(f.trunc() as i64))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "true" => Some(true),
        "false" | "" => Some(false),
        _ => None,
    }
}

// ------------------------------- Tests ------------------------------------ //
