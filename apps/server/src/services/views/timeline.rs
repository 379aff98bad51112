use super::counts::Tally;
use super::ViewContext;
use crate::models::{JoinMode, PlotTimelineView, TimelineResult, TimelineTable};
use crate::Result;
use lensing_index::IndexQuery;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Timeline of cluster values per entity and year.
///
/// When co-occurrences are requested, the events carrying the entities
/// (any of them, or all of them for [`JoinMode::And`]) are scanned for other
/// values of the co-occurrence fields. The most frequent ones are added to
/// the plotted entities before the timeline is built.
pub async fn plot_timeline(
    ctx: ViewContext<'_>,
    view: &PlotTimelineView,
) -> Result<TimelineResult> {
    let mut entities: BTreeMap<String, BTreeSet<String>> = view
        .entities
        .iter()
        .map(|(field, values)| (field.clone(), values.iter().cloned().collect()))
        .collect();

    let mut num_cooccurring = 0;
    let mut num_included = 0;
    if let Some(mode) = view.cooccurrences {
        let fields = view
            .cooccurrence_fields
            .clone()
            .unwrap_or_else(|| entities.keys().cloned().collect());
        let ranked = cooccurring_entities(ctx, &entities, mode, &fields).await?;
        num_cooccurring = ranked.len();
        for (field, value) in ranked
            .into_iter()
            .take(ctx.settings.plottimeline_max_cooccurring_entities)
        {
            entities.entry(field).or_default().insert(value);
            num_included += 1;
        }
    }

    let timeline = build_timeline(ctx, &entities, &view.cluster_field).await?;
    tracing::debug!(
        entities = entities.values().map(BTreeSet::len).sum::<usize>(),
        cooccurring = num_cooccurring,
        included = num_included,
        "Built plot timeline"
    );

    Ok(TimelineResult {
        timeline,
        num_cooccurring_entities: num_cooccurring,
        num_included_cooccurring_entities: num_included,
    })
}

fn entity_terms(
    ctx: ViewContext<'_>,
    entities: &BTreeMap<String, BTreeSet<String>>,
) -> Vec<IndexQuery> {
    entities
        .iter()
        .flat_map(|(field, values)| {
            let field = ctx.aliases.resolve_or_same(field).to_string();
            values
                .iter()
                .map(move |value| IndexQuery::term(field.clone(), value.clone()))
        })
        .collect()
}

/// Other `(field, value)` pairs on the events carrying the entities, most
/// frequent first. Each event counts a pair once.
async fn cooccurring_entities(
    ctx: ViewContext<'_>,
    entities: &BTreeMap<String, BTreeSet<String>>,
    mode: JoinMode,
    fields: &[String],
) -> Result<Vec<(String, String)>> {
    let terms = entity_terms(ctx, entities);
    let joined = match mode {
        JoinMode::Or => IndexQuery::or_all(terms),
        JoinMode::And => IndexQuery::and_all(terms),
    };
    let query = ctx.query.clone().and(joined);
    let index_fields: Vec<String> = fields
        .iter()
        .map(|f| ctx.aliases.resolve_or_same(f).to_string())
        .collect();
    let documents = ctx.engine.search_all(&query, &index_fields).await?;

    let mut tally = Tally::default();
    for document in &documents {
        let mut seen = HashSet::new();
        for (field, index_field) in fields.iter().zip(&index_fields) {
            for value in document.values(index_field) {
                let is_entity = entities.get(field).is_some_and(|v| v.contains(&value));
                if !is_entity && seen.insert((field.clone(), value.clone())) {
                    tally.add((field.clone(), value));
                }
            }
        }
    }

    Ok(tally
        .into_sorted()
        .into_iter()
        .map(|(pair, _)| pair)
        .collect())
}

async fn build_timeline(
    ctx: ViewContext<'_>,
    entities: &BTreeMap<String, BTreeSet<String>>,
    cluster_field: &str,
) -> Result<TimelineTable> {
    let mut table: TimelineTable = entities
        .iter()
        .map(|(field, values)| {
            (
                field.clone(),
                values
                    .iter()
                    .map(|value| (value.clone(), BTreeMap::new()))
                    .collect(),
            )
        })
        .collect();

    let year_field = ctx.settings.year_field.clone();
    let cluster_index_field = ctx.aliases.resolve_or_same(cluster_field).to_string();
    let mut fields = vec![year_field.clone(), cluster_index_field.clone()];
    for field in entities.keys() {
        fields.push(ctx.aliases.resolve_or_same(field).to_string());
    }

    let query = ctx
        .query
        .clone()
        .and(IndexQuery::or_all(entity_terms(ctx, entities)));
    let documents = ctx.engine.search_all(&query, &fields).await?;

    for document in &documents {
        let Some(year) = document.values(&year_field).into_iter().next() else {
            continue;
        };
        let clusters = document.values(&cluster_index_field);
        for (field, values) in entities {
            let Some(rows) = table.get_mut(field) else {
                continue;
            };
            for value in document.values(ctx.aliases.resolve_or_same(field)) {
                if !values.contains(&value) {
                    continue;
                }
                if let Some(years) = rows.get_mut(&value) {
                    years
                        .entry(year.clone())
                        .or_default()
                        .extend(clusters.iter().cloned());
                }
            }
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuerierSettings;
    use lensing_index::{Document, FieldAliases, MemoryIndex, Schema};
    use serde_json::json;

    fn index() -> MemoryIndex {
        MemoryIndex::new(
            vec![
                Document::new("e1")
                    .with("year", 1990)
                    .with("person", json!(["Ada", "Grace"]))
                    .with("eventRoot", "meet"),
                Document::new("e2")
                    .with("year", 1990)
                    .with("person", json!(["Ada"]))
                    .with("eventRoot", "talk"),
                Document::new("e3")
                    .with("year", 1992)
                    .with("person", json!(["Ada", "Grace", "Linus"]))
                    .with("eventRoot", "meet"),
                Document::new("e4")
                    .with("year", 1993)
                    .with("person", json!(["Linus"]))
                    .with("eventRoot", "code"),
            ],
            Schema::default(),
        )
    }

    fn view(cooccurrences: Option<JoinMode>) -> PlotTimelineView {
        PlotTimelineView {
            cluster_field: "eventRoot".to_string(),
            entities: [("person".to_string(), vec!["Ada".to_string()])]
                .into_iter()
                .collect(),
            cooccurrences,
            cooccurrence_fields: None,
        }
    }

    async fn run(view: &PlotTimelineView, max: usize) -> TimelineResult {
        let index = index();
        let settings = QuerierSettings {
            plottimeline_max_cooccurring_entities: max,
            ..QuerierSettings::default()
        };
        let aliases = FieldAliases::default();
        let ctx = ViewContext {
            engine: &index,
            query: &IndexQuery::Every,
            settings: &settings,
            aliases: &aliases,
        };
        plot_timeline(ctx, view).await.unwrap()
    }

    #[tokio::test]
    async fn timeline_groups_clusters_by_year() {
        let result = run(&view(None), 10).await;
        let ada = &result.timeline["person"]["Ada"];
        assert_eq!(
            ada["1990"],
            BTreeSet::from(["meet".to_string(), "talk".to_string()])
        );
        assert_eq!(ada["1992"].len(), 1);
        assert!(!ada.contains_key("1993"));
        assert_eq!(result.num_cooccurring_entities, 0);
    }

    #[tokio::test]
    async fn top_cooccurring_entities_are_folded_in() {
        let result = run(&view(Some(JoinMode::Or)), 1).await;
        // Grace co-occurs with Ada twice, Linus once.
        assert_eq!(result.num_cooccurring_entities, 2);
        assert_eq!(result.num_included_cooccurring_entities, 1);
        assert!(result.timeline["person"].contains_key("Grace"));
        assert!(!result.timeline["person"].contains_key("Linus"));
    }

    #[tokio::test]
    async fn serializes_with_camel_case_counts() {
        let result = run(&view(Some(JoinMode::Or)), 10).await;
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["numCooccurringEntities"], json!(2));
        assert_eq!(json["numIncludedCooccurringEntities"], json!(2));
        assert_eq!(json["timeline"]["person"]["Linus"]["1993"], json!(["code"]));
    }
}
