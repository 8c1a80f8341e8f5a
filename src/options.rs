//! Engine configuration, read once per `map` call.
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::node::{Instance, Node};

/// Callback for source keys that match no target property.
///
/// Receives `(target, key, value)`. Returning `Some(name)` marks the key as
/// mapped under `name` (the handler took care of it); `None` leaves it
/// unmapped and the `ignore_unknown_properties` policy applies.
pub type UnknownPropertyHandler = Arc<dyn Fn(&Instance, &str, &Node) -> Option<String> + Send + Sync>;

#[derive(Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Reject scalar juggling (numeric strings, string <-> bool, ...).
    pub strict_types: bool,
    /// Reject scalars where a collection is expected.
    pub strict_collections: bool,
    /// Reject `null` for properties that are not declared nullable.
    pub strict_null: bool,
    pub ignore_unknown_properties: bool,
    pub verify_required_properties: bool,
    /// Fail instead of bypassing the constructor when a class has no
    /// default constructor.
    pub instantiate_require_constructor: bool,
    pub variadic_setters: bool,
    #[serde(skip)]
    pub unknown_property_handler: Option<UnknownPropertyHandler>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            strict_types: true,
            strict_collections: true,
            strict_null: true,
            ignore_unknown_properties: true,
            verify_required_properties: false,
            instantiate_require_constructor: true,
            variadic_setters: false,
            unknown_property_handler: None,
        }
    }
}

impl Options {
    /// Everything lenient: scalar juggling, scalar collections, nulls anywhere.
    pub fn lenient() -> Self {
        Self {
            strict_types: false,
            strict_collections: false,
            strict_null: false,
            ..Self::default()
        }
    }

    pub fn with_unknown_property_handler(
        mut self,
        handler: impl Fn(&Instance, &str, &Node) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.unknown_property_handler = Some(Arc::new(handler));
        self
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("strict_types", &self.strict_types)
            .field("strict_collections", &self.strict_collections)
            .field("strict_null", &self.strict_null)
            .field("ignore_unknown_properties", &self.ignore_unknown_properties)
            .field("verify_required_properties", &self.verify_required_properties)
            .field("instantiate_require_constructor", &self.instantiate_require_constructor)
            .field("variadic_setters", &self.variadic_setters)
            .field("unknown_property_handler", &self.unknown_property_handler.is_some())
            .finish()
    }
}
