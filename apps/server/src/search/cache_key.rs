use crate::models::{Constraint, View};
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Hex SHA-256 digest identifying a cached view result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key of a view's full result under a constraint set.
    ///
    /// Constraint ids do not take part, and the constraints are sorted, so
    /// equal constraint sets give equal keys. `requiredkeys` never takes part;
    /// `page` is dropped when `strip_page` is set, so every page of a
    /// sliced result shares one key.
    pub fn derive(
        constraints: &BTreeMap<String, Constraint>,
        view: &View,
        strip_page: bool,
    ) -> Self {
        let mut canonical: Vec<String> = constraints
            .values()
            .map(|c| c.to_json().to_string())
            .collect();
        canonical.sort();

        let mut view_json = view.to_json();
        if let JsonValue::Object(map) = &mut view_json {
            map.remove("requiredkeys");
            if strip_page {
                map.remove("page");
            }
        }
        canonical.push(view_json.to_string());

        Self::digest(canonical.iter().map(String::as_bytes))
    }

    /// Digest of an ordered sequence of byte strings.
    pub fn digest<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part);
        }
        CacheKey(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
