//! Wire models for queries and view results

pub mod query;
pub mod result;

pub use query::{Constraint, JoinMode, PlotTimelineView, Query, View};
pub use result::{
    CoordinatesResult, CountsResult, Description, DescriptionsResult, LinksResult, Point,
    QueryResponse, RefPointLink, ResultField, TimelineResult, TimelineTable, TsnePoint,
    ViewError, ViewResult,
};
