//! Boolean query expressions understood by an [`IndexEngine`](crate::IndexEngine)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "lowercase")]
pub enum IndexQuery {
    /// Matches every document.
    Every,
    /// Field equals value. On text fields the value is matched as a
    /// lower-cased token sequence.
    Term { field: String, value: String },
    /// Inclusive numeric range on a field.
    Range { field: String, low: i64, high: i64 },
    And(Vec<IndexQuery>),
    /// An empty `Or` matches nothing.
    Or(Vec<IndexQuery>),
    Not(Box<IndexQuery>),
}

impl IndexQuery {
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn range(field: impl Into<String>, low: i64, high: i64) -> Self {
        Self::Range {
            field: field.into(),
            low,
            high,
        }
    }

    /// Conjoin a list of queries; an empty list matches everything and a
    /// single query is returned as is.
    pub fn and_all(mut queries: Vec<IndexQuery>) -> Self {
        match queries.len() {
            0 => Self::Every,
            1 => queries.remove(0),
            _ => Self::And(queries),
        }
    }

    /// Disjoin a list of queries; a single query is returned as is.
    pub fn or_all(mut queries: Vec<IndexQuery>) -> Self {
        match queries.len() {
            1 => queries.remove(0),
            _ => Self::Or(queries),
        }
    }

    /// `self AND other`, skipping a redundant match-all on either side.
    pub fn and(self, other: IndexQuery) -> Self {
        match (self, other) {
            (Self::Every, q) | (q, Self::Every) => q,
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), q) => {
                left.push(q);
                Self::And(left)
            }
            (q, other) => Self::And(vec![q, other]),
        }
    }
}
