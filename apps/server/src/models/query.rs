//! Query wire model
//!
//! A query is a set of constraints plus a set of named views. Both maps
//! arrive as raw JSON and are parsed entry by entry, so that a malformed view
//! can fail on its own while a malformed constraint fails the whole query.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub constraints: BTreeMap<String, JsonValue>,
    pub views: BTreeMap<String, JsonValue>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constraint(mut self, id: impl Into<String>, constraint: &Constraint) -> Self {
        self.constraints.insert(id.into(), constraint.to_json());
        self
    }

    pub fn with_view(mut self, id: impl Into<String>, view: &View) -> Self {
        self.views.insert(id.into(), view.to_json());
        self
    }

    /// Parse every constraint, failing on the first bad one.
    pub fn parse_constraints(&self) -> Result<BTreeMap<String, Constraint>> {
        self.constraints
            .iter()
            .map(|(id, value)| Ok((id.clone(), Constraint::from_json(id, value)?)))
            .collect()
    }
}

/// Filter on the matching events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Constraint {
    FieldValue { field: String, value: String },
    TextSearch { text: String },
    /// Inclusive year range.
    TimeRange { low: i64, high: i64 },
    /// Events citing any of the points.
    ReferencePoints { points: BTreeSet<String> },
}

impl Constraint {
    const TYPES: [&'static str; 4] = ["fieldvalue", "textsearch", "timerange", "referencepoints"];

    pub fn from_json(id: &str, value: &JsonValue) -> Result<Self> {
        let kind = type_of(value);
        if !Self::TYPES.contains(&kind) {
            return Err(Error::UnknownConstraint(kind.to_string()));
        }
        serde_json::from_value(value.clone())
            .map_err(|e| Error::InvalidQuery(format!("constraint \"{id}\": {e}")))
    }

    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Constraint::FieldValue { .. } => "fieldvalue",
            Constraint::TextSearch { .. } => "textsearch",
            Constraint::TimeRange { .. } => "timerange",
            Constraint::ReferencePoints { .. } => "referencepoints",
        }
    }
}

/// How the entities of a plot timeline are joined when looking for
/// co-occurring entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinMode {
    #[default]
    Or,
    And,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotTimelineView {
    pub cluster_field: String,
    /// Field to the entity values plotted on it.
    pub entities: BTreeMap<String, Vec<String>>,
    /// Absent means no co-occurring entities are added.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooccurrences: Option<JoinMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooccurrence_fields: Option<Vec<String>>,
}

/// Analytical view requested over the matching events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum View {
    CountByFieldValue {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        page: Option<usize>,
        #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
        requiredkeys: BTreeSet<String>,
    },
    CountByYear {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        page: Option<usize>,
        #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
        requiredkeys: BTreeSet<String>,
    },
    CountByReferencePoint {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        page: Option<usize>,
        #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
        requiredkeys: BTreeSet<String>,
    },
    Descriptions {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        page: Option<usize>,
    },
    ReferencePointLinks {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        page: Option<usize>,
        #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
        requiredkeys: BTreeSet<String>,
    },
    TsneCoordinates {},
    PlotTimeline(PlotTimelineView),
}

impl View {
    const TYPES: [&'static str; 7] = [
        "countbyfieldvalue",
        "countbyyear",
        "countbyreferencepoint",
        "descriptions",
        "referencepointlinks",
        "tsnecoordinates",
        "plottimeline",
    ];

    pub fn from_json(id: &str, value: &JsonValue) -> Result<Self> {
        let kind = type_of(value);
        if !Self::TYPES.contains(&kind) {
            return Err(Error::UnknownView(kind.to_string()));
        }
        serde_json::from_value(value.clone())
            .map_err(|e| Error::InvalidQuery(format!("view \"{id}\": {e}")))
    }

    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }

    pub fn count_by_field(field: impl Into<String>) -> Self {
        View::CountByFieldValue {
            field: field.into(),
            page: None,
            requiredkeys: BTreeSet::new(),
        }
    }

    pub fn descriptions(page: Option<usize>) -> Self {
        View::Descriptions { page }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            View::CountByFieldValue { .. } => "countbyfieldvalue",
            View::CountByYear { .. } => "countbyyear",
            View::CountByReferencePoint { .. } => "countbyreferencepoint",
            View::Descriptions { .. } => "descriptions",
            View::ReferencePointLinks { .. } => "referencepointlinks",
            View::TsneCoordinates {} => "tsnecoordinates",
            View::PlotTimeline(_) => "plottimeline",
        }
    }

    pub fn page(&self) -> Option<usize> {
        match self {
            View::CountByFieldValue { page, .. }
            | View::CountByYear { page, .. }
            | View::CountByReferencePoint { page, .. }
            | View::Descriptions { page }
            | View::ReferencePointLinks { page, .. } => *page,
            View::TsneCoordinates {} | View::PlotTimeline(_) => None,
        }
    }

    pub fn required_keys(&self) -> BTreeSet<String> {
        match self {
            View::CountByFieldValue { requiredkeys, .. }
            | View::CountByYear { requiredkeys, .. }
            | View::CountByReferencePoint { requiredkeys, .. }
            | View::ReferencePointLinks { requiredkeys, .. } => requiredkeys.clone(),
            _ => BTreeSet::new(),
        }
    }
}

fn type_of(value: &JsonValue) -> &str {
    value.get("type").and_then(JsonValue::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_wire_constraints() {
        let c = Constraint::from_json("c1", &json!({"type": "timerange", "low": 1990, "high": 1995}))
            .unwrap();
        assert_eq!(c, Constraint::TimeRange { low: 1990, high: 1995 });

        let c = Constraint::from_json(
            "c2",
            &json!({"type": "referencepoints", "points": ["b", "a", "b"]}),
        )
        .unwrap();
        assert_eq!(
            c,
            Constraint::ReferencePoints {
                points: ["a".to_string(), "b".to_string()].into_iter().collect()
            }
        );
    }

    #[test]
    fn unknown_constraint_type_is_distinct_from_malformed() {
        assert!(matches!(
            Constraint::from_json("c", &json!({"type": "bogus"})),
            Err(Error::UnknownConstraint(t)) if t == "bogus"
        ));
        assert!(matches!(
            Constraint::from_json("c", &json!({"type": "fieldvalue"})),
            Err(Error::InvalidQuery(_))
        ));
    }

    #[test]
    fn parses_wire_views() {
        let v = View::from_json(
            "v",
            &json!({"type": "countbyfieldvalue", "field": "location", "page": 2, "requiredkeys": ["Paris"]}),
        )
        .unwrap();
        assert_eq!(v.type_name(), "countbyfieldvalue");
        assert_eq!(v.page(), Some(2));
        assert!(v.required_keys().contains("Paris"));

        let v = View::from_json("v", &json!({"type": "tsnecoordinates"})).unwrap();
        assert_eq!(v, View::TsneCoordinates {});
    }

    #[test]
    fn plot_timeline_uses_camel_case() {
        let v = View::from_json(
            "v",
            &json!({
                "type": "plottimeline",
                "clusterField": "eventRoot",
                "entities": {"person": ["Ada"]},
                "cooccurrences": "and",
                "cooccurrenceFields": ["location"]
            }),
        )
        .unwrap();
        match v {
            View::PlotTimeline(timeline) => {
                assert_eq!(timeline.cluster_field, "eventRoot");
                assert_eq!(timeline.cooccurrences, Some(JoinMode::And));
                assert_eq!(timeline.cooccurrence_fields, Some(vec!["location".to_string()]));
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn unknown_view_type_is_reported() {
        assert!(matches!(
            View::from_json("v", &json!({"type": "histogram"})),
            Err(Error::UnknownView(t)) if t == "histogram"
        ));
    }

    #[test]
    fn query_without_constraints_deserializes() {
        let q: Query = serde_json::from_value(json!({"views": {"v1": {"type": "countbyyear"}}})).unwrap();
        assert!(q.constraints.is_empty());
        assert!(q.parse_constraints().unwrap().is_empty());
    }
}
