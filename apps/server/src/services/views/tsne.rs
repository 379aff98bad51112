use super::ViewContext;
use crate::models::{CoordinatesResult, Point, TsnePoint};
use crate::Result;
use lensing_index::Document;
use serde_json::Value as JsonValue;

/// Precomputed 2D embedding coordinates of the matching events. Events
/// without usable coordinates are left out.
pub async fn tsne_coordinates(ctx: ViewContext<'_>) -> Result<CoordinatesResult> {
    let coordinates_field = &ctx.settings.tsne_coordinates_field;
    let text_field = &ctx.settings.tsne_text_field;
    let documents = ctx
        .engine
        .search_all(ctx.query, &[coordinates_field.clone(), text_field.clone()])
        .await?;

    let coordinates: Vec<TsnePoint> = documents
        .iter()
        .filter_map(|doc| {
            let point = read_point(doc.get(coordinates_field)?)?;
            Some(TsnePoint {
                id: doc.id.clone(),
                coordinates: point,
                text: first_text(doc, text_field),
            })
        })
        .collect();

    tracing::debug!(
        events = documents.len(),
        points = coordinates.len(),
        "Collected t-SNE coordinates"
    );
    Ok(CoordinatesResult { coordinates })
}

/// Accepts `{"x": .., "y": ..}` or `[x, y]`.
fn read_point(value: &JsonValue) -> Option<Point> {
    match value {
        JsonValue::Object(map) => Some(Point {
            x: map.get("x")?.as_f64()?,
            y: map.get("y")?.as_f64()?,
        }),
        JsonValue::Array(items) if items.len() == 2 => Some(Point {
            x: items[0].as_f64()?,
            y: items[1].as_f64()?,
        }),
        _ => None,
    }
}

fn first_text(doc: &Document, field: &str) -> String {
    doc.values(field).into_iter().next().unwrap_or_default()
}
