//! Query handling
//!
//! The [`Querier`] owns the settings, the caches and the constraint compiler.
//! For every query it compiles the constraints once, plans each view, serves
//! what it can from the caches, computes the rest (all count views in one
//! shared scan), writes results back and slices result-paginated views.
//!
//! Failures are contained per view: a failing view gets an `error` entry
//! while its siblings are still answered. Only a failure while reading or
//! compiling the constraints turns every view into an error.

use crate::config::QuerierSettings;
use crate::metrics;
use crate::models::{CoordinatesResult, Query, QueryResponse, View, ViewResult};
use crate::search::{CacheKey, ConstraintCompiler};
use crate::services::plan::ViewPlan;
use crate::services::views::{self, CountRequest, ViewContext};
use crate::{Error, Result};
use lensing_cache::{Cache, CompleteCache, FifoCache};
use lensing_index::{FieldAliases, IndexEngine, IndexQuery, TextParser};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Where a view's result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Cache,
    ResultCache,
    Computed,
    Error,
}

impl Source {
    fn as_str(&self) -> &'static str {
        match self {
            Source::Cache => "cache",
            Source::ResultCache => "result_cache",
            Source::Computed => "computed",
            Source::Error => "error",
        }
    }
}

/// Entry counts of the querier's caches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheSizes {
    pub full_result: usize,
    pub result_pagination: usize,
    pub tsne: usize,
}

pub struct Querier {
    settings: QuerierSettings,
    engine: Arc<dyn IndexEngine>,
    aliases: FieldAliases,
    compiler: ConstraintCompiler,
    /// Full results of unconstrained queries.
    full_result_cache: CompleteCache<CacheKey, Arc<ViewResult>>,
    /// Unsliced results of result-paginated views.
    result_pagination_cache: FifoCache<CacheKey, Arc<ViewResult>>,
    tsne_cache: FifoCache<CacheKey, Arc<CoordinatesResult>>,
}

impl Querier {
    pub fn new(
        settings: QuerierSettings,
        engine: Arc<dyn IndexEngine>,
        aliases: FieldAliases,
        parser: Arc<dyn TextParser>,
    ) -> Self {
        let compiler = ConstraintCompiler::new(
            aliases.clone(),
            parser,
            settings.year_field.clone(),
            settings.referencepoint_field.clone(),
        );
        Self {
            result_pagination_cache: FifoCache::new(settings.result_pagination_cache_size),
            tsne_cache: FifoCache::new(settings.tsne_cache_size),
            full_result_cache: CompleteCache::new(),
            compiler,
            aliases,
            engine,
            settings,
        }
    }

    /// Answer a query. Never fails as a whole: errors are reported per view.
    pub async fn handle(&self, query: &Query) -> QueryResponse {
        self.handle_with_limit(query, self.settings.max_items_to_count_over)
            .await
    }

    /// Answer a query given as raw JSON. Fails only when the body is not a
    /// query at all.
    pub async fn handle_json(&self, body: JsonValue) -> Result<QueryResponse> {
        let query: Query =
            serde_json::from_value(body).map_err(|e| Error::InvalidQuery(e.to_string()))?;
        Ok(self.handle(&query).await)
    }

    /// Warm the caches with the unconstrained queries clients open with.
    /// The count limit is lifted while priming.
    pub async fn prime(&self) -> CacheSizes {
        let start = Instant::now();
        let mut failed = 0;
        for query in self.queries_to_prime() {
            let response = self.handle_with_limit(&query, None).await;
            failed += response.values().filter(|r| r.is_error()).count();
        }
        let sizes = self.cache_sizes();
        if failed > 0 {
            tracing::warn!(failed, "Some views failed while priming");
        }
        tracing::info!(
            full_result = sizes.full_result,
            result_pagination = sizes.result_pagination,
            duration_ms = start.elapsed().as_millis() as u64,
            "Primed query caches"
        );
        sizes
    }

    pub fn queries_to_prime(&self) -> Vec<Query> {
        let mut views: Vec<View> = self
            .settings
            .fields_to_prime
            .iter()
            .map(View::count_by_field)
            .collect();
        views.push(View::CountByYear {
            page: None,
            requiredkeys: Default::default(),
        });
        views.push(View::CountByReferencePoint {
            page: None,
            requiredkeys: Default::default(),
        });
        views.push(View::descriptions(None));
        for page in 0..self.settings.num_initial_description_pages_to_cache {
            views.push(View::descriptions(Some(page)));
        }

        let query = views
            .iter()
            .enumerate()
            .fold(Query::new(), |query, (i, view)| query.with_view(i.to_string(), view));
        vec![query]
    }

    pub fn clear_caches(&self) {
        self.full_result_cache.clear();
        self.result_pagination_cache.clear();
        self.tsne_cache.clear();
        self.record_cache_sizes();
    }

    pub fn cache_sizes(&self) -> CacheSizes {
        CacheSizes {
            full_result: self.full_result_cache.len(),
            result_pagination: self.result_pagination_cache.len(),
            tsne: self.tsne_cache.len(),
        }
    }

    async fn handle_with_limit(&self, query: &Query, max_items: Option<usize>) -> QueryResponse {
        let start = Instant::now();
        let (response, status) = match self.handle_all(query, max_items).await {
            Ok(response) => (response, "ok"),
            Err(e) => {
                tracing::error!(error = %e, "Error while handling query");
                let flag = e.client_message();
                let response = query
                    .views
                    .keys()
                    .map(|view_id| (view_id.clone(), ViewResult::error(flag.clone())))
                    .collect();
                (response, "rejected")
            }
        };

        metrics::QUERIES_TOTAL.with_label_values(&[status]).inc();
        metrics::QUERY_DURATION_SECONDS
            .with_label_values(&[status])
            .observe(start.elapsed().as_secs_f64());
        self.record_cache_sizes();
        response
    }

    async fn handle_all(&self, query: &Query, max_items: Option<usize>) -> Result<QueryResponse> {
        let constraints = query.parse_constraints()?;
        let index_query = self.compiler.compile(&constraints)?;

        let mut results: BTreeMap<String, Arc<ViewResult>> = BTreeMap::new();
        let mut plans: BTreeMap<String, ViewPlan> = BTreeMap::new();
        let mut needed: BTreeMap<String, View> = BTreeMap::new();

        for (view_id, raw) in &query.views {
            let view = match View::from_json(view_id, raw) {
                Ok(view) => view,
                Err(e) => {
                    tracing::error!(view_id = %view_id, error = %e, "Error while reading a view");
                    record_view("unknown", Source::Error);
                    results.insert(
                        view_id.clone(),
                        Arc::new(ViewResult::error(e.client_message())),
                    );
                    continue;
                }
            };

            let plan = ViewPlan::build(&self.settings, &constraints, &view);
            match self.lookup(&plan) {
                Some((result, source)) => {
                    tracing::debug!(
                        view_id = %view_id,
                        view_type = view.type_name(),
                        source = source.as_str(),
                        "Handling view from cache"
                    );
                    record_view(view.type_name(), source);
                    results.insert(view_id.clone(), result);
                }
                None => {
                    tracing::debug!(
                        view_id = %view_id,
                        view_type = view.type_name(),
                        "Generating view"
                    );
                    needed.insert(view_id.clone(), view);
                }
            }
            plans.insert(view_id.clone(), plan);
        }

        let generated = self.generate_views(&needed, &index_query, max_items).await;
        for (view_id, result) in generated {
            let view_type = needed.get(&view_id).map_or("unknown", View::type_name);
            let result = Arc::new(result);
            if result.is_error() {
                record_view(view_type, Source::Error);
            } else {
                record_view(view_type, Source::Computed);
                if let Some(plan) = plans.get(&view_id).filter(|p| p.should_cache) {
                    if let Some(key) = &plan.cache_key {
                        self.full_result_cache.set(key.clone(), Arc::clone(&result));
                    }
                }
            }
            results.insert(view_id, result);
        }

        let mut response = QueryResponse::new();
        for (view_id, result) in results {
            let paged = match plans.get(&view_id) {
                Some(ViewPlan {
                    cache_key: Some(key),
                    pagination: Some(pagination),
                    ..
                }) if !result.is_error() => {
                    self.result_pagination_cache
                        .set(key.clone(), Arc::clone(&result));
                    result.paginate(
                        pagination.field,
                        pagination.page,
                        pagination.page_size,
                        &pagination.required_keys,
                    )
                }
                _ => Arc::try_unwrap(result).unwrap_or_else(|shared| (*shared).clone()),
            };
            response.insert(view_id, paged);
        }
        Ok(response)
    }

    fn lookup(&self, plan: &ViewPlan) -> Option<(Arc<ViewResult>, Source)> {
        let key = plan.cache_key.as_ref()?;
        if plan.should_cache {
            if let Some(hit) = self.full_result_cache.get(key) {
                return Some((hit, Source::Cache));
            }
        }
        if plan.pagination.is_some() {
            if let Some(hit) = self.result_pagination_cache.get(key) {
                return Some((hit, Source::ResultCache));
            }
        }
        None
    }

    fn context<'a>(&'a self, query: &'a IndexQuery) -> ViewContext<'a> {
        ViewContext {
            engine: self.engine.as_ref(),
            query,
            settings: &self.settings,
            aliases: &self.aliases,
        }
    }

    /// Compute the views no cache could answer. Count views go into one
    /// shared scan; the others run one after another.
    async fn generate_views(
        &self,
        needed: &BTreeMap<String, View>,
        query: &IndexQuery,
        max_items: Option<usize>,
    ) -> BTreeMap<String, ViewResult> {
        let mut results = BTreeMap::new();
        let mut count_requests = Vec::new();

        for (view_id, view) in needed {
            let field = match view {
                View::CountByFieldValue { field, .. } => {
                    Some(self.aliases.resolve_or_same(field).to_string())
                }
                View::CountByYear { .. } => Some(self.settings.year_field.clone()),
                View::CountByReferencePoint { .. } => {
                    Some(self.settings.referencepoint_field.clone())
                }
                _ => None,
            };
            if let Some(field) = field {
                count_requests.push(CountRequest {
                    view_id: view_id.clone(),
                    field,
                });
                continue;
            }

            let result = match self.generate_independent_view(view, query).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(
                        view_id = %view_id,
                        view_type = view.type_name(),
                        error = %e,
                        "Error while generating a view"
                    );
                    ViewResult::error(e.client_message())
                }
            };
            results.insert(view_id.clone(), result);
        }

        if !count_requests.is_empty() {
            match views::count_field_values(self.context(query), &count_requests, max_items).await {
                Ok(tables) => {
                    results.extend(
                        tables
                            .into_iter()
                            .map(|(view_id, counts)| (view_id, ViewResult::Counts(counts))),
                    );
                }
                Err(e) => {
                    tracing::error!(
                        views = count_requests.len(),
                        error = %e,
                        "Error while generating count views"
                    );
                    let flag = e.client_message();
                    for request in count_requests {
                        results.insert(request.view_id, ViewResult::error(flag.clone()));
                    }
                }
            }
        }

        results
    }

    async fn generate_independent_view(
        &self,
        view: &View,
        query: &IndexQuery,
    ) -> Result<ViewResult> {
        let ctx = self.context(query);
        match view {
            View::Descriptions { page } => Ok(ViewResult::Descriptions(
                views::descriptions(ctx, page.unwrap_or(0)).await?,
            )),
            View::ReferencePointLinks { .. } => Ok(ViewResult::Links(
                views::reference_point_links(ctx).await?,
            )),
            View::TsneCoordinates {} => {
                let coordinates = self.tsne_coordinates(view, ctx).await?;
                Ok(ViewResult::Coordinates((*coordinates).clone()))
            }
            View::PlotTimeline(timeline) => Ok(ViewResult::Timeline(
                views::plot_timeline(ctx, timeline).await?,
            )),
            View::CountByFieldValue { .. }
            | View::CountByYear { .. }
            | View::CountByReferencePoint { .. } => Err(Error::Internal(format!(
                "{} views are computed in the shared count scan",
                view.type_name()
            ))),
        }
    }

    /// Coordinates are cached on their own, by view and compiled query, for
    /// constrained queries too.
    async fn tsne_coordinates(
        &self,
        view: &View,
        ctx: ViewContext<'_>,
    ) -> Result<Arc<CoordinatesResult>> {
        let view_json = view.to_json().to_string();
        let query_json = serde_json::to_string(ctx.query)
            .map_err(|e| Error::Internal(format!("cannot serialize index query: {e}")))?;
        let key = CacheKey::digest([view_json.as_bytes(), query_json.as_bytes()]);

        if let Some(hit) = self.tsne_cache.get(&key) {
            tracing::debug!("Using cached t-SNE coordinates");
            return Ok(hit);
        }
        let computed = Arc::new(views::tsne_coordinates(ctx).await?);
        self.tsne_cache.set(key, Arc::clone(&computed));
        Ok(computed)
    }

    /// Publish the cache sizes to the cache gauge.
    pub fn record_cache_sizes(&self) {
        let sizes = self.cache_sizes();
        for (cache, size) in [
            ("full_result", sizes.full_result),
            ("result_pagination", sizes.result_pagination),
            ("tsne", sizes.tsne),
        ] {
            metrics::CACHE_ENTRIES
                .with_label_values(&[cache])
                .set(size as i64);
        }
    }
}

fn record_view(view_type: &str, source: Source) {
    metrics::VIEWS_TOTAL
        .with_label_values(&[view_type, source.as_str()])
        .inc();
}
