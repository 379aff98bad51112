//! Query orchestration: view planning, cache lookups, view computation and
//! result pagination.

pub mod plan;
pub mod querier;
pub mod views;

pub use plan::{Pagination, ViewPlan};
pub use querier::{CacheSizes, Querier};
