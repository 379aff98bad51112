//! View computation against the index
//!
//! Count views share one index scan; every other view runs its own search.

mod counts;
mod descriptions;
mod links;
mod timeline;
mod tsne;

pub use counts::{count_field_values, CountRequest, TOO_MANY_EVENTS};
pub use descriptions::descriptions;
pub use links::reference_point_links;
pub use timeline::plot_timeline;
pub use tsne::tsne_coordinates;

use crate::config::QuerierSettings;
use lensing_index::{FieldAliases, IndexEngine, IndexQuery};

/// What every view handler reads: the engine, the compiled constraints and
/// the querier settings.
#[derive(Clone, Copy)]
pub struct ViewContext<'a> {
    pub engine: &'a dyn IndexEngine,
    pub query: &'a IndexQuery,
    pub settings: &'a QuerierSettings,
    pub aliases: &'a FieldAliases,
}
