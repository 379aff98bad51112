use lensing_index::Document;
use serde_json::json;

/// Three events in 1990, 1990 and 1991.
pub fn three_year_corpus() -> Vec<Document> {
    vec![
        Document::new("e1")
            .with("year", 1990)
            .with("description", "Dock workers strike in Paris")
            .with("person", json!(["Ada"])),
        Document::new("e2")
            .with("year", 1990)
            .with("description", "Port closed after the strike")
            .with("person", json!(["Ada", "Grace"])),
        Document::new("e3")
            .with("year", 1991)
            .with("description", "Elections held")
            .with("person", json!(["Linus"])),
    ]
}

/// `count` events whose `person` field lists `p00..=pNN`, so `p00` occurs
/// `count` times, `p01` one time fewer and so on.
pub fn descending_people_corpus(count: usize) -> Vec<Document> {
    (0..count)
        .map(|i| {
            let people: Vec<String> = (0..=i).map(|p| format!("p{p:02}")).collect();
            Document::new(format!("e{i}"))
                .with("year", 1900 + i as i64)
                .with("person", json!(people))
        })
        .collect()
}

pub fn event_with_points(id: &str, points: &[&str]) -> Document {
    Document::new(id)
        .with("year", 2001)
        .with("referencePoints", json!(points))
}
