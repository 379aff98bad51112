//! Event index boundary for the query layer
//!
//! Defines what the orchestration code needs from a search index:
//! - [`IndexQuery`]: boolean query expressions (term, OR, AND, NOT, range, match-all)
//! - [`IndexEngine`]: executing a query for all hits or for one sorted page
//! - [`FieldAliases`] and [`TextParser`]: public field names and free-text queries
//!
//! [`MemoryIndex`] is an engine over documents held in memory, loaded from a
//! JSON-lines corpus with [`load_documents`].

pub mod aliases;
pub mod document;
pub mod engine;
pub mod error;
pub mod loader;
pub mod memory;
pub mod query;
pub mod text;

pub use aliases::FieldAliases;
pub use document::Document;
pub use engine::{IndexEngine, PageRequest, SearchPage};
pub use error::{Error, Result};
pub use loader::{load_documents, parse_documents};
pub use memory::{MemoryIndex, Schema};
pub use query::IndexQuery;
pub use text::{SimpleTextParser, TextParser};

/// Suffix of the tokenized shadow of a keyword field.
pub const FREE_TEXT_SUFFIX: &str = "_text";
