//! Lensing - query and cache orchestration over an event index
//!
//! Clients post a query made of named constraints and named views. The
//! [`Querier`](services::Querier) compiles the constraints into one index
//! query, answers every view against it and keeps three caches:
//! - full results of unconstrained queries
//! - unsliced results of views paginated by the server
//! - t-SNE coordinates

#![allow(
    clippy::large_enum_variant, // View results are returned by value
)]

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod request_context;
pub mod search;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use services::Querier;
pub use state::AppState;
