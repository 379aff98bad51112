//! Static configuration
//!
//! Loaded once at startup from an optional TOML file (`LENSING_CONFIG`,
//! default `config.toml`) overlaid with `LENSING__SECTION__KEY` environment
//! variables. Every section rejects unknown keys, so a misspelled option
//! fails the load instead of silently falling back to a default.

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub index: IndexConfig,
    pub querier: QuerierSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted query body in bytes.
    pub max_request_body_size: usize,
    /// Allowed CORS origins; `*` allows any origin, empty emits no CORS headers.
    pub cors_origins: Vec<String>,
    /// Warm the caches before accepting requests.
    pub prime_on_start: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 1500,
            max_request_body_size: 2 * 1024 * 1024,
            cors_origins: vec!["*".to_string()],
            prime_on_start: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    pub file_enabled: bool,
    pub file_directory: String,
    pub file_prefix: String,
    /// daily, hourly, minutely or never
    pub file_rotation: String,
    pub opentelemetry_enabled: bool,
    pub otlp_endpoint: String,
    pub otlp_timeout_seconds: u64,
    pub trace_sample_ratio: f64,
    pub service_name: String,
    pub service_version: Option<String>,
    pub deployment_environment: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_enabled: false,
            file_directory: "logs".to_string(),
            file_prefix: "lensing".to_string(),
            file_rotation: "daily".to_string(),
            opentelemetry_enabled: false,
            otlp_endpoint: "http://localhost:4317".to_string(),
            otlp_timeout_seconds: 10,
            trace_sample_ratio: 1.0,
            service_name: "lensing".to_string(),
            service_version: None,
            deployment_environment: "development".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    /// JSON-lines corpus file.
    pub path: PathBuf,
    /// Fields matched as tokenized text rather than exact keywords.
    pub text_fields: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/events.jsonl"),
            text_fields: vec!["description".to_string()],
        }
    }
}

/// Settings read once per [`Querier`](crate::services::Querier).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuerierSettings {
    /// Number of events on a page of descriptions
    pub description_page_size: usize,
    /// Number of entries on a page of count by field value results
    pub count_by_field_value_page_size: usize,
    /// Number of entries on a page of count by year results
    pub count_by_year_page_size: usize,
    /// Number of entries on a page of count by reference point results
    pub count_by_referencepoint_page_size: usize,
    /// Number of entries on a page of reference point links results
    pub referencepointlinks_page_size: usize,
    /// Description pages of the empty-constraint query kept in the full result cache
    pub num_initial_description_pages_to_cache: usize,
    /// Capacity of the result pagination cache
    pub result_pagination_cache_size: usize,
    /// Capacity of the t-SNE coordinate cache
    pub tsne_cache_size: usize,
    /// Fields to prime the cache with
    pub fields_to_prime: Vec<String>,
    /// Fields searched by unqualified free-text terms
    pub fields_for_text_searches: Vec<String>,
    /// Matching events to count over before giving up; `None` means no cap
    pub max_items_to_count_over: Option<usize>,
    /// Co-occurring entities folded into a plot timeline
    pub plottimeline_max_cooccurring_entities: usize,
    pub year_field: String,
    pub referencepoint_field: String,
    /// Stored fields returned for each description
    pub description_fields: Vec<String>,
    pub tsne_coordinates_field: String,
    pub tsne_text_field: String,
    /// Public field names mapped to index field names. Kept as a list of
    /// tables because configuration map keys are lower-cased on load.
    pub field_aliases: Vec<FieldAlias>,
}

/// One `[[querier.field_aliases]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldAlias {
    pub from: String,
    pub to: String,
}

impl QuerierSettings {
    pub fn alias_map(&self) -> HashMap<String, String> {
        self.field_aliases
            .iter()
            .map(|alias| (alias.from.clone(), alias.to.clone()))
            .collect()
    }
}

impl Default for QuerierSettings {
    fn default() -> Self {
        Self {
            description_page_size: 25,
            count_by_field_value_page_size: 50,
            count_by_year_page_size: 50,
            count_by_referencepoint_page_size: 50,
            referencepointlinks_page_size: 50,
            num_initial_description_pages_to_cache: 10,
            result_pagination_cache_size: 100,
            tsne_cache_size: 100,
            fields_to_prime: Vec::new(),
            fields_for_text_searches: vec!["description".to_string()],
            max_items_to_count_over: Some(1000),
            plottimeline_max_cooccurring_entities: 10,
            year_field: "year".to_string(),
            referencepoint_field: "referencePoints".to_string(),
            description_fields: vec![
                "year".to_string(),
                "descriptionHtml".to_string(),
                "eventRoot".to_string(),
            ],
            tsne_coordinates_field: "tsneCoordinates".to_string(),
            tsne_text_field: "description".to_string(),
            field_aliases: Vec::new(),
        }
    }
}

impl Config {
    /// Load from `config.toml` (or `LENSING_CONFIG`) and `LENSING__*` variables.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let path = std::env::var("LENSING_CONFIG").unwrap_or_else(|_| "config.toml".to_string());

        let settings = config::Config::builder()
            .add_source(config::File::from(PathBuf::from(&path)).required(false))
            .add_source(
                config::Environment::with_prefix("LENSING")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Parse a TOML document, applying the same defaults and key checks as [`Config::load`].
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let q = &self.querier;
        let page_sizes = [
            ("description_page_size", q.description_page_size),
            (
                "count_by_field_value_page_size",
                q.count_by_field_value_page_size,
            ),
            ("count_by_year_page_size", q.count_by_year_page_size),
            (
                "count_by_referencepoint_page_size",
                q.count_by_referencepoint_page_size,
            ),
            (
                "referencepointlinks_page_size",
                q.referencepointlinks_page_size,
            ),
        ];
        for (name, size) in page_sizes {
            if size == 0 {
                return Err(Error::Config(format!("querier.{name} must be positive")));
            }
        }
        if q.year_field.is_empty() || q.referencepoint_field.is_empty() {
            return Err(Error::Config(
                "querier.year_field and querier.referencepoint_field must be set".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.logging.trace_sample_ratio) {
            return Err(Error::Config(
                "logging.trace_sample_ratio must be within 0.0..=1.0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| Error::Config(format!("invalid listen address: {e}")))
    }
}
