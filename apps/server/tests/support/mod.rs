pub mod assertions;
pub mod fixtures;

use anyhow::Context as _;
use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use lensing::{api::create_router, state::build_querier, AppState, Config};
use lensing_index::{
    Document, IndexEngine, IndexQuery, MemoryIndex, PageRequest, Schema, SearchPage,
};
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt as _;

pub use assertions::*;
pub use fixtures::*;

/// In-memory engine that counts the searches it serves.
pub struct CountingEngine {
    inner: MemoryIndex,
    calls: AtomicUsize,
}

impl CountingEngine {
    pub fn new(documents: Vec<Document>, schema: Schema) -> Self {
        Self {
            inner: MemoryIndex::new(documents, schema),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IndexEngine for CountingEngine {
    async fn search_all(
        &self,
        query: &IndexQuery,
        fields: &[String],
    ) -> lensing_index::Result<Vec<Document>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.search_all(query, fields).await
    }

    async fn search_page(
        &self,
        query: &IndexQuery,
        request: &PageRequest,
    ) -> lensing_index::Result<SearchPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.search_page(query, request).await
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub engine: Arc<CountingEngine>,
}

impl TestApp {
    pub fn new(documents: Vec<Document>) -> Self {
        Self::new_with_config(documents, |_| {})
    }

    pub fn new_with_config(documents: Vec<Document>, configure: impl FnOnce(&mut Config)) -> Self {
        let mut config = Config::default();
        configure(&mut config);

        let schema = Schema::new(config.index.text_fields.iter().cloned());
        let engine = Arc::new(CountingEngine::new(documents, schema.clone()));
        let querier = build_querier(config.querier.clone(), engine.clone(), schema);
        let state = AppState::from_parts(config, querier);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            engine,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json")
            .body(match body {
                Some(bytes) => Body::from(bytes),
                None => Body::empty(),
            })
            .context("build request")?;

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .context("dispatch request")?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .context("read response body")?;

        Ok((status, headers, body))
    }

    /// POST a query and decode the JSON response.
    pub async fn query(&self, query: &JsonValue) -> anyhow::Result<(StatusCode, JsonValue)> {
        let body = Bytes::from(serde_json::to_vec(query)?);
        let (status, _headers, body) = self.request(Method::POST, "/query", Some(body)).await?;
        let json = serde_json::from_slice(&body).context("response is JSON")?;
        Ok((status, json))
    }
}
