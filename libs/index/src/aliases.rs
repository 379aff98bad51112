//! Public field names to index field names

use std::collections::HashMap;

/// Maps logical field names used by clients onto stored index fields.
/// Unmapped names resolve to themselves.
#[derive(Debug, Clone, Default)]
pub struct FieldAliases {
    aliases: HashMap<String, String>,
}

impl FieldAliases {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        Self { aliases }
    }

    /// The mapped index field, if an alias exists.
    pub fn resolve(&self, field: &str) -> Option<&str> {
        self.aliases.get(field).map(String::as_str)
    }

    pub fn resolve_or_same<'a>(&'a self, field: &'a str) -> &'a str {
        self.resolve(field).unwrap_or(field)
    }
}

impl FromIterator<(String, String)> for FieldAliases {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
