//! Naming resolution: reconcile incoming key names with target property names.
//!
//! A [`NamingMapper`] returns `None` when it does not apply to a name, which
//! is different from "the name is unchanged". The engine asks every
//! registered mapper in registration order and finally [`DefaultCase`].
pub mod camel;
pub mod snake;

pub use camel::CamelCase;
pub use snake::SnakeCase;

pub trait NamingMapper: Send + Sync {
    fn resolve(&self, name: &str) -> Option<String>;
}

/// As-is naming; always registered and always tried last.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCase;

impl NamingMapper for DefaultCase {
    fn resolve(&self, name: &str) -> Option<String> {
        Some(name.to_owned())
    }
}

/// `None` when the conversion did not change anything.
pub(crate) fn changed(converted: String, name: &str) -> Option<String> {
    (converted != name).then_some(converted)
}

// ------------------------------- Tests ------------------------------------ //
