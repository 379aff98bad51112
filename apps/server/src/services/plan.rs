//! Per-view execution plans
//!
//! A plan is worked out once per view per request and decides which caches
//! the view may be served from and whether its result is sliced into pages
//! here rather than by the index.

use crate::config::QuerierSettings;
use crate::models::{Constraint, ResultField, View};
use crate::search::CacheKey;
use std::collections::{BTreeMap, BTreeSet};

/// Slicing of a full result into one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub field: ResultField,
    pub page_size: usize,
    pub page: usize,
    pub required_keys: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewPlan {
    /// Present whenever the view may be cached or sliced.
    pub cache_key: Option<CacheKey>,
    /// The full result belongs in the full result cache.
    pub should_cache: bool,
    pub pagination: Option<Pagination>,
}

impl ViewPlan {
    pub fn build(
        settings: &QuerierSettings,
        constraints: &BTreeMap<String, Constraint>,
        view: &View,
    ) -> Self {
        let should_cache = should_cache(settings, constraints, view);
        let pagination = how_to_paginate(settings, view).map(|(field, page_size)| Pagination {
            field,
            page_size,
            page: view.page().unwrap_or(0),
            required_keys: view.required_keys(),
        });
        let cache_key = (should_cache || pagination.is_some())
            .then(|| CacheKey::derive(constraints, view, pagination.is_some()));

        Self {
            cache_key,
            should_cache,
            pagination,
        }
    }
}

/// Only unconstrained queries are cached in full; of those, description
/// pages only up to the primed depth.
pub fn should_cache(
    settings: &QuerierSettings,
    constraints: &BTreeMap<String, Constraint>,
    view: &View,
) -> bool {
    if !constraints.is_empty() {
        return false;
    }
    match view {
        View::Descriptions { page } => {
            page.unwrap_or(0) < settings.num_initial_description_pages_to_cache
        }
        _ => true,
    }
}

/// The result list to slice and the page size, for views paginated here
/// instead of by the index. Value counts always are; year, reference point
/// and link views only when they ask for a page.
pub fn how_to_paginate(settings: &QuerierSettings, view: &View) -> Option<(ResultField, usize)> {
    match view {
        View::CountByFieldValue { .. } => {
            Some((ResultField::Counts, settings.count_by_field_value_page_size))
        }
        View::CountByYear { page: Some(_), .. } => {
            Some((ResultField::Counts, settings.count_by_year_page_size))
        }
        View::CountByReferencePoint { page: Some(_), .. } => Some((
            ResultField::Counts,
            settings.count_by_referencepoint_page_size,
        )),
        View::ReferencePointLinks { page: Some(_), .. } => {
            Some((ResultField::Links, settings.referencepointlinks_page_size))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_constraints() -> BTreeMap<String, Constraint> {
        BTreeMap::new()
    }

    fn one_constraint() -> BTreeMap<String, Constraint> {
        [(
            "c".to_string(),
            Constraint::TextSearch {
                text: "strike".to_string(),
            },
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn description_pages_cached_up_to_depth() {
        let settings = QuerierSettings::default();
        assert!(should_cache(&settings, &no_constraints(), &View::descriptions(None)));
        assert!(should_cache(&settings, &no_constraints(), &View::descriptions(Some(9))));
        assert!(!should_cache(&settings, &no_constraints(), &View::descriptions(Some(10))));
        assert!(!should_cache(&settings, &one_constraint(), &View::descriptions(Some(0))));
    }

    #[test]
    fn year_counts_paginate_only_when_paged() {
        let settings = QuerierSettings::default();
        let unpaged = View::CountByYear {
            page: None,
            requiredkeys: BTreeSet::new(),
        };
        let paged = View::CountByYear {
            page: Some(0),
            requiredkeys: BTreeSet::new(),
        };
        assert_eq!(how_to_paginate(&settings, &unpaged), None);
        assert_eq!(
            how_to_paginate(&settings, &paged),
            Some((ResultField::Counts, 50))
        );
        assert_eq!(
            how_to_paginate(&settings, &View::count_by_field("person")),
            Some((ResultField::Counts, 50))
        );
    }

    #[test]
    fn constrained_descriptions_get_no_key() {
        let plan = ViewPlan::build(
            &QuerierSettings::default(),
            &one_constraint(),
            &View::descriptions(Some(0)),
        );
        assert_eq!(plan.cache_key, None);
        assert!(!plan.should_cache);
        assert_eq!(plan.pagination, None);
    }

    #[test]
    fn constrained_field_counts_are_sliced() {
        let view = View::CountByFieldValue {
            field: "person".to_string(),
            page: Some(2),
            requiredkeys: ["Ada".to_string()].into_iter().collect(),
        };
        let plan = ViewPlan::build(&QuerierSettings::default(), &one_constraint(), &view);
        assert!(!plan.should_cache);
        assert!(plan.cache_key.is_some());
        let pagination = plan.pagination.unwrap();
        assert_eq!(pagination.page, 2);
        assert!(pagination.required_keys.contains("Ada"));
    }
}
