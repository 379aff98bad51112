use super::counts::Tally;
use super::ViewContext;
use crate::models::{LinksResult, RefPointLink};
use crate::Result;
use std::collections::BTreeSet;

/// Counts, for every pair of distinct reference points, the matching events
/// citing both. Pairs are ordered lexicographically so `(a, b)` and `(b, a)`
/// are one pair. Links come out in first-seen order.
pub async fn reference_point_links(ctx: ViewContext<'_>) -> Result<LinksResult> {
    let field = ctx.settings.referencepoint_field.clone();
    let documents = ctx
        .engine
        .search_all(ctx.query, std::slice::from_ref(&field))
        .await?;

    let mut tally = Tally::default();
    for document in &documents {
        let points: Vec<String> = document
            .values(&field)
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                tally.add((a.clone(), b.clone()));
            }
        }
    }
    tracing::debug!(pairs = tally.len(), "Counted reference point links");

    Ok(LinksResult {
        links: tally
            .into_first_seen()
            .into_iter()
            .map(|(refpoints, count)| RefPointLink { refpoints, count })
            .collect(),
        more: None,
    })
}
