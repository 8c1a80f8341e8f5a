//! Value type resolvers: turn an abstract/interface class name into a
//! concrete one by looking at the shape of the raw value.
use crate::node::Node;

pub trait ValueTypeResolver: Send + Sync {
    /// A concrete class name (or a scalar kind name such as `"integer"`), or
    /// `None` if this resolver has no opinion.
    fn resolve(&self, class_name: &str, value: &Node) -> Option<String>;
}

impl<F> ValueTypeResolver for F
where
    F: Fn(&str, &Node) -> Option<String> + Send + Sync,
{
    fn resolve(&self, class_name: &str, value: &Node) -> Option<String> {
        self(class_name, value)
    }
}

/// Fixed `from` -> `to` mapping, applied when the value is map-shaped.
#[derive(Debug, Clone)]
pub struct SimpleValueTypeResolver {
    from: String,
    to: String,
}

impl SimpleValueTypeResolver {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { from: from.into(), to: to.into() }
    }
}

impl ValueTypeResolver for SimpleValueTypeResolver {
    fn resolve(&self, class_name: &str, value: &Node) -> Option<String> {
        (matches!(value, Node::Map(_)) && class_name == self.from).then(|| self.to.clone())
    }
}
