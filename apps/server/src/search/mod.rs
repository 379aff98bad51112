//! Translation of query constraints into index queries, and the cache keys
//! derived from them.

mod cache_key;
mod compiler;

pub use cache_key::CacheKey;
pub use compiler::ConstraintCompiler;
