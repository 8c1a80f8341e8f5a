//! Date/time override mapper.
//!
//! Register with `set_override_mapper("DateTime", DateTimeTypeMapper)` so
//! properties declared as `DateTime` are built from text or Unix timestamps
//! instead of being populated like a regular class.
use std::any::Any;

use chrono::{NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

use super::{ObjectMapper, TypeMapper};
use crate::error::{AccessError, Error, Result};
use crate::node::{Instance, Node, Object, is_numeric};
use crate::type_ref::TypeRef;

pub const DATE_TIME_CLASS: &str = "DateTime";

/// A point in time, UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime(chrono::DateTime<Utc>);

#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeTypeMapper;

impl DateTime {
    pub fn new(at: chrono::DateTime<Utc>) -> Self {
        Self(at)
    }

    pub fn value(&self) -> chrono::DateTime<Utc> {
        self.0
    }

    /// RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC), `YYYY-MM-DD` (midnight UTC)
    /// or a numeric Unix timestamp.
    pub fn parse(text: &str) -> Option<Self> {
        if is_numeric(text) {
            return text.trim().parse::<f64>().ok().and_then(Self::from_timestamp);
        }
        let text = text.trim();
        if let Ok(at) = chrono::DateTime::parse_from_rfc3339(text) {
            return Some(Self(at.with_timezone(&Utc)));
        }
        if let Ok(at) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
            return Some(Self(at.and_utc()));
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|at| Self(at.and_utc()))
    }

    pub fn from_timestamp(seconds: f64) -> Option<Self> {
        if !seconds.is_finite() {
            return None;
        }
        let whole = seconds.floor();
        let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
        chrono::DateTime::from_timestamp(whole as i64, nanos).map(Self)
    }
}

impl Object for DateTime {
    fn class_name(&self) -> &str {
        DATE_TIME_CLASS
    }

    fn get(&self, property: &str) -> Option<Node> {
        match property {
            "timestamp" => Some(Node::Int(self.0.timestamp())),
            _ => None,
        }
    }

    fn set(&mut self, property: &str, _value: Node) -> Result<(), AccessError> {
        Err(AccessError::no_such_property(property, DATE_TIME_CLASS))
    }

    fn to_json(&self) -> Value {
        Value::String(self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl TypeMapper for DateTimeTypeMapper {
    fn map(&self, _mapper: &ObjectMapper, value: Node, _ty: Option<&TypeRef>, key: Option<&str>) -> Result<Node> {
        let parsed = match &value {
            Node::Null => return Ok(value),
            Node::Object(instance) if instance.with(|_: &DateTime| ()).is_some() => return Ok(value),
            Node::Int(seconds) => DateTime::from_timestamp(*seconds as f64),
            Node::Float(seconds) => DateTime::from_timestamp(*seconds),
            Node::String(text) => DateTime::parse(text),
            _ => None,
        };
        parsed
            .map(|at| Node::Object(Instance::new(at)))
            .ok_or_else(|| Error::incompatible(key, None, value.kind_name(), DATE_TIME_CLASS))
    }
}

// ------------------------------- Tests ------------------------------------ //
