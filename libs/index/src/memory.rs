//! In-memory event index
//!
//! Evaluates [`IndexQuery`] expressions by scanning documents in load order.
//! Suitable for corpora that fit in memory and for tests.

use crate::{
    Document, IndexEngine, IndexQuery, PageRequest, Result, SearchPage, FREE_TEXT_SUFFIX,
};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Field typing for the in-memory engine.
///
/// Text fields match terms as lower-cased token sequences; every other field
/// is a keyword field matched by exact value.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    text_fields: HashSet<String>,
}

impl Schema {
    pub fn new<I, S>(text_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            text_fields: text_fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_text_field(&self, field: &str) -> bool {
        self.text_fields.contains(field)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    documents: Vec<Document>,
    schema: Schema,
}

impl MemoryIndex {
    pub fn new(documents: Vec<Document>, schema: Schema) -> Self {
        Self { documents, schema }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn matching<'a>(&'a self, query: &'a IndexQuery) -> impl Iterator<Item = &'a Document> + 'a {
        self.documents
            .iter()
            .filter(move |doc| self.matches(doc, query))
    }

    fn matches(&self, doc: &Document, query: &IndexQuery) -> bool {
        match query {
            IndexQuery::Every => true,
            IndexQuery::Term { field, value } => self.matches_term(doc, field, value),
            IndexQuery::Range { field, low, high } => doc.values(field).iter().any(|v| {
                v.trim()
                    .parse::<f64>()
                    .map(|n| n >= *low as f64 && n <= *high as f64)
                    .unwrap_or(false)
            }),
            IndexQuery::And(parts) => parts.iter().all(|q| self.matches(doc, q)),
            IndexQuery::Or(parts) => parts.iter().any(|q| self.matches(doc, q)),
            IndexQuery::Not(inner) => !self.matches(doc, inner),
        }
    }

    fn matches_term(&self, doc: &Document, field: &str, value: &str) -> bool {
        if self.schema.is_text_field(field) {
            return contains_phrase(&doc.values(field), value);
        }
        if let Some(base) = field.strip_suffix(FREE_TEXT_SUFFIX) {
            if !doc.fields.contains_key(field) {
                return contains_phrase(&doc.values(base), value);
            }
        }
        doc.values(field).iter().any(|v| v == value)
    }
}

/// Lower-cased alphanumeric tokens.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn contains_phrase(values: &[String], phrase: &str) -> bool {
    let wanted = tokenize(phrase);
    if wanted.is_empty() {
        return false;
    }
    values.iter().any(|value| {
        let tokens = tokenize(value);
        tokens
            .windows(wanted.len())
            .any(|window| window == wanted.as_slice())
    })
}

fn compare_sort_values(a: Option<&String>, b: Option<&String>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match (a.parse::<f64>(), b.parse::<f64>()) {
            (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => a.cmp(b),
        },
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl IndexEngine for MemoryIndex {
    async fn search_all(&self, query: &IndexQuery, fields: &[String]) -> Result<Vec<Document>> {
        let hits: Vec<Document> = self
            .matching(query)
            .map(|doc| doc.projection(fields))
            .collect();
        tracing::trace!(hits = hits.len(), "memory index search");
        Ok(hits)
    }

    async fn search_page(&self, query: &IndexQuery, request: &PageRequest) -> Result<SearchPage> {
        let mut matched: Vec<(Option<String>, &Document)> = self
            .matching(query)
            .filter_map(|doc| {
                let key = doc.values(&request.sort_field).into_iter().next();
                key.is_some().then_some((key, doc))
            })
            .collect();

        // Stable sort keeps load order among equal keys.
        matched.sort_by(|(a, _), (b, _)| compare_sort_values(b.as_ref(), a.as_ref()));

        let start = request.page.saturating_mul(request.page_size);
        let end = start.saturating_add(request.page_size).min(matched.len());
        let hits = if start < matched.len() {
            matched[start..end]
                .iter()
                .map(|(_, doc)| doc.projection(&request.fields))
                .collect()
        } else {
            Vec::new()
        };

        Ok(SearchPage {
            hits,
            is_last_page: end >= matched.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn corpus() -> MemoryIndex {
        let docs = vec![
            Document::new("e1")
                .with("year", 1990)
                .with("location", json!(["Paris", "Lyon"]))
                .with("description", "Strike at the Renault factory"),
            Document::new("e2")
                .with("year", 1992)
                .with("location", json!(["Berlin"]))
                .with("description", "Wall anniversary celebrations"),
            Document::new("e3")
                .with("year", 1991)
                .with("location", json!(["New York"]))
                .with("description", "Renault opens office"),
        ];
        MemoryIndex::new(docs, Schema::new(["description"]))
    }

    fn ids(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.id.as_str()).collect()
    }

    #[tokio::test]
    async fn keyword_terms_match_exactly() {
        let index = corpus();
        let hits = index
            .search_all(&IndexQuery::term("location", "Paris"), &[])
            .await
            .unwrap();
        assert_eq!(ids(&hits), vec!["e1"]);

        let hits = index
            .search_all(&IndexQuery::term("location", "paris"), &[])
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn text_fields_match_tokens() {
        let index = corpus();
        let hits = index
            .search_all(&IndexQuery::term("description", "renault"), &[])
            .await
            .unwrap();
        assert_eq!(ids(&hits), vec!["e1", "e3"]);
    }

    #[tokio::test]
    async fn shadow_text_field_tokenizes_keywords() {
        let index = corpus();
        let hits = index
            .search_all(&IndexQuery::term("location_text", "york"), &[])
            .await
            .unwrap();
        assert_eq!(ids(&hits), vec!["e3"]);
    }

    #[tokio::test]
    async fn range_is_inclusive() {
        let index = corpus();
        let hits = index
            .search_all(&IndexQuery::range("year", 1990, 1991), &[])
            .await
            .unwrap();
        assert_eq!(ids(&hits), vec!["e1", "e3"]);
    }

    #[tokio::test]
    async fn empty_or_matches_nothing() {
        let index = corpus();
        let hits = index.search_all(&IndexQuery::Or(vec![]), &[]).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn pages_sort_descending_with_last_page_flag() {
        let index = corpus();
        let request = PageRequest {
            page: 0,
            page_size: 2,
            sort_field: "year".to_string(),
            fields: vec!["year".to_string()],
        };
        let page = index.search_page(&IndexQuery::Every, &request).await.unwrap();
        assert_eq!(ids(&page.hits), vec!["e2", "e3"]);
        assert!(!page.is_last_page);
        assert!(page.hits[0].get("location").is_none());

        let page = index
            .search_page(&IndexQuery::Every, &PageRequest { page: 1, ..request })
            .await
            .unwrap();
        assert_eq!(ids(&page.hits), vec!["e1"]);
        assert!(page.is_last_page);
    }
}
