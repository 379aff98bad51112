//! Route tables

pub mod metrics;
pub mod query;
