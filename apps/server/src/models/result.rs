//! View results as sent to clients

use crate::error::ErrorFlag;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, BTreeSet};

/// View id to that view's result.
pub type QueryResponse = BTreeMap<String, ViewResult>;

/// `field -> value -> year -> cluster values seen that year`
pub type TimelineTable = BTreeMap<String, BTreeMap<String, BTreeMap<String, BTreeSet<String>>>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ViewResult {
    Counts(CountsResult),
    Descriptions(DescriptionsResult),
    Links(LinksResult),
    Coordinates(CoordinatesResult),
    Timeline(TimelineResult),
    Error(ViewError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountsResult {
    /// `(value, count)` pairs, highest count first.
    pub counts: Vec<(String, u64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub more: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptionsResult {
    pub descriptions: Vec<Description>,
    pub more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Description {
    pub dbid: String,
    #[serde(flatten)]
    pub fields: Map<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinksResult {
    pub links: Vec<RefPointLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub more: Option<bool>,
}

/// Number of events citing both reference points. The pair is ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefPointLink {
    pub refpoints: (String, String),
    pub count: u64,
}

impl RefPointLink {
    pub fn key(&self) -> String {
        format!("{}|{}", self.refpoints.0, self.refpoints.1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinatesResult {
    pub coordinates: Vec<TsnePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TsnePoint {
    pub id: String,
    pub coordinates: Point,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineResult {
    pub timeline: TimelineTable,
    pub num_cooccurring_entities: usize,
    pub num_included_cooccurring_entities: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewError {
    pub error: ErrorFlag,
}

/// Result list that can be sliced for result pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultField {
    Counts,
    Links,
}

impl ResultField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultField::Counts => "counts",
            ResultField::Links => "links",
        }
    }
}

impl ViewResult {
    pub fn error(flag: ErrorFlag) -> Self {
        ViewResult::Error(ViewError { error: flag })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ViewResult::Error(_))
    }

    /// One page of the `field` list of a full result. Entries whose key is in
    /// `required` are kept even when off the page: those before the window
    /// are put in front of it, those after are appended. Results without
    /// that list are returned unchanged.
    pub fn paginate(
        &self,
        field: ResultField,
        page: usize,
        page_size: usize,
        required: &BTreeSet<String>,
    ) -> ViewResult {
        match (field, self) {
            (ResultField::Counts, ViewResult::Counts(result)) => {
                let (counts, more) =
                    slice_with_required(&result.counts, page, page_size, required, |(value, _)| {
                        value.clone()
                    });
                ViewResult::Counts(CountsResult {
                    counts,
                    more: Some(more),
                })
            }
            (ResultField::Links, ViewResult::Links(result)) => {
                let (links, more) =
                    slice_with_required(&result.links, page, page_size, required, RefPointLink::key);
                ViewResult::Links(LinksResult {
                    links,
                    more: Some(more),
                })
            }
            _ => self.clone(),
        }
    }
}

fn slice_with_required<T: Clone>(
    entries: &[T],
    page: usize,
    page_size: usize,
    required: &BTreeSet<String>,
    key: impl Fn(&T) -> String,
) -> (Vec<T>, bool) {
    let len = entries.len();
    let start = page.saturating_mul(page_size).min(len);
    let end = start.saturating_add(page_size).min(len);
    let is_required = |entry: &&T| !required.is_empty() && required.contains(&key(entry));

    let mut sliced: Vec<T> = entries[..start].iter().filter(is_required).cloned().collect();
    sliced.extend_from_slice(&entries[start..end]);
    sliced.extend(entries[end..].iter().filter(is_required).cloned());
    (sliced, end < len)
}
