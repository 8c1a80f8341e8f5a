//! Error taxonomy of the mapping engine.
//!
//! Every failure aborts the current `map` call. The variants carry the
//! structured context (property, class, observed/expected type) and render
//! it in the `key=value` message style callers grep for.

/// Result alias used across the engine.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed call: undecodable text, wrong top-level shape, empty type name.
    #[error("Invalid input; {0}")]
    InvalidInput(String),

    #[error(
        "Incompatible data type; name={}, class={}, type={}, expected={}",
        na(.property), na(.class), .actual, .expected
    )]
    IncompatibleType {
        property: Option<String>,
        class: Option<String>,
        actual: String,
        expected: String,
    },

    #[error("Invalid collection value; name={}, type={}", na(.property), .actual)]
    IncompatibleCollection {
        property: Option<String>,
        actual: String,
    },

    #[error("Unmappable null value; name={property}, class={class}")]
    UnmappableNull { property: String, class: String },

    #[error("Unmapped property; name={property}, class={class}")]
    UnmappedProperty { property: String, class: String },

    #[error("Missing required property; name={property}, class={class}")]
    MissingRequiredProperty { property: String, class: String },

    #[error("Unable to instantiate value object; class={class}, reason={reason}")]
    InstantiationFailed { class: String, reason: String },

    /// A mapper was handed a type reference variant it cannot handle.
    /// Always a programming error.
    #[error("Unexpected type reference; mapper={mapper}, type={found}")]
    UnexpectedTypeReference { mapper: &'static str, found: String },
}

/// Discriminant-only view of [`Error`], handy for matching in callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    IncompatibleType,
    IncompatibleCollection,
    UnmappableNull,
    UnmappedProperty,
    MissingRequiredProperty,
    InstantiationFailed,
    UnexpectedTypeReference,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::IncompatibleType { .. } => ErrorKind::IncompatibleType,
            Error::IncompatibleCollection { .. } => ErrorKind::IncompatibleCollection,
            Error::UnmappableNull { .. } => ErrorKind::UnmappableNull,
            Error::UnmappedProperty { .. } => ErrorKind::UnmappedProperty,
            Error::MissingRequiredProperty { .. } => ErrorKind::MissingRequiredProperty,
            Error::InstantiationFailed { .. } => ErrorKind::InstantiationFailed,
            Error::UnexpectedTypeReference { .. } => ErrorKind::UnexpectedTypeReference,
        }
    }

    pub(crate) fn incompatible(
        property: Option<&str>,
        class: Option<&str>,
        actual: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Error::IncompatibleType {
            property: property.map(str::to_owned),
            class: class.map(str::to_owned),
            actual: actual.into(),
            expected: expected.into(),
        }
    }
}

/// Failure reported by a [`PropertyAccess`](crate::introspect::PropertyAccess) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// The access layer has no such property. The object mapper treats the
    /// source key as unmapped instead of failing.
    #[error("no such property; name={property}, class={class}")]
    NoSuchProperty { property: String, class: String },

    /// The setter exists but refused the value.
    #[error("invalid argument; name={property}, reason={reason}")]
    InvalidArgument { property: String, reason: String },
}

impl AccessError {
    pub fn no_such_property(property: &str, class: &str) -> Self {
        AccessError::NoSuchProperty { property: property.to_owned(), class: class.to_owned() }
    }

    pub fn invalid_argument(property: &str, reason: impl Into<String>) -> Self {
        AccessError::InvalidArgument { property: property.to_owned(), reason: reason.into() }
    }
}

fn na(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("N/A")
}

// ------------------------------- Tests ------------------------------------ //
