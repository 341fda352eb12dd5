//! Mapping from vertex attribute names to shader input locations.

use std::collections::HashMap;

/// Resolves the shader location of a named vertex attribute.
///
/// This usually wraps the reflection data of the shader program currently in use.
pub trait AttributeResolver {
    /// The location of the attribute `name`, or `None` if the shader doesn't use it.
    fn resolve_attribute_location(&self, name: &str) -> Option<u32>;
}

/// An [`AttributeResolver`] backed by an explicit name-to-location table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderAttributes {
    locations: HashMap<String, u32>,
}

impl ShaderAttributes {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the attribute `name` at `location`.
    pub fn with(mut self, name: impl Into<String>, location: u32) -> Self {
        self.insert(name, location);
        self
    }

    /// Sets the location of the attribute `name`, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, location: u32) {
        let _ = self.locations.insert(name.into(), location);
    }

    /// Number of known attributes.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether no attribute is known.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl AttributeResolver for ShaderAttributes {
    fn resolve_attribute_location(&self, name: &str) -> Option<u32> {
        self.locations.get(name).copied()
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for ShaderAttributes {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        ShaderAttributes {
            locations: iter.into_iter().map(|(n, l)| (n.into(), l)).collect(),
        }
    }
}
