use super::ViewContext;
use crate::models::CountsResult;
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

pub const TOO_MANY_EVENTS: &str = "too many matching events, narrow the query more";

/// A count view in a shared scan: its id and the index field it counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountRequest {
    pub view_id: String,
    pub field: String,
}

/// Count the values of several fields over one scan of the matching events.
///
/// A document counts once per distinct value, however often the value
/// repeats in it. Tables are sorted by count descending, equal counts in the
/// order their values were first seen. Only events carrying at least one of
/// the counted fields take part; more of them than `max_items` fails the
/// whole batch.
pub async fn count_field_values(
    ctx: ViewContext<'_>,
    requests: &[CountRequest],
    max_items: Option<usize>,
) -> Result<BTreeMap<String, CountsResult>> {
    let mut fields: Vec<String> = Vec::new();
    for request in requests {
        if !fields.contains(&request.field) {
            fields.push(request.field.clone());
        }
    }

    let documents = ctx.engine.search_all(ctx.query, &fields).await?;

    let mut tallies: Vec<Tally<String>> = requests.iter().map(|_| Tally::default()).collect();
    let mut counted = 0usize;
    for document in &documents {
        if !fields.iter().any(|f| !document.values(f).is_empty()) {
            continue;
        }
        counted += 1;
        if matches!(max_items, Some(max) if counted > max) {
            return Err(Error::QueryHandling(TOO_MANY_EVENTS.to_string()));
        }
        for (request, tally) in requests.iter().zip(tallies.iter_mut()) {
            let mut seen = HashSet::new();
            for value in document.values(&request.field) {
                if seen.insert(value.clone()) {
                    tally.add(value);
                }
            }
        }
    }

    tracing::debug!(
        events = counted,
        views = requests.len(),
        "Counted field values"
    );

    Ok(requests
        .iter()
        .zip(tallies)
        .map(|(request, tally)| {
            (
                request.view_id.clone(),
                CountsResult {
                    counts: tally.into_sorted(),
                    more: None,
                },
            )
        })
        .collect())
}

/// Counter that remembers first-seen order.
pub(super) struct Tally<K> {
    positions: HashMap<K, usize>,
    counts: Vec<(K, u64)>,
}

impl<K> Default for Tally<K> {
    fn default() -> Self {
        Self {
            positions: HashMap::new(),
            counts: Vec::new(),
        }
    }
}

impl<K: Hash + Eq + Clone> Tally<K> {
    pub(super) fn add(&mut self, key: K) {
        match self.positions.get(&key) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.positions.insert(key.clone(), self.counts.len());
                self.counts.push((key, 1));
            }
        }
    }

    pub(super) fn len(&self) -> usize {
        self.counts.len()
    }

    pub(super) fn into_first_seen(self) -> Vec<(K, u64)> {
        self.counts
    }

    /// Counts descending; the sort is stable so ties keep first-seen order.
    pub(super) fn into_sorted(mut self) -> Vec<(K, u64)> {
        self.counts.sort_by(|a, b| b.1.cmp(&a.1));
        self.counts
    }
}
