use crate::models::Constraint;
use crate::Result;
use lensing_index::{FieldAliases, IndexQuery, TextParser};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Compiles query constraints into one conjunctive [`IndexQuery`].
#[derive(Clone)]
pub struct ConstraintCompiler {
    aliases: FieldAliases,
    parser: Arc<dyn TextParser>,
    year_field: String,
    referencepoint_field: String,
}

impl ConstraintCompiler {
    pub fn new(
        aliases: FieldAliases,
        parser: Arc<dyn TextParser>,
        year_field: impl Into<String>,
        referencepoint_field: impl Into<String>,
    ) -> Self {
        Self {
            aliases,
            parser,
            year_field: year_field.into(),
            referencepoint_field: referencepoint_field.into(),
        }
    }

    /// AND of every constraint; no constraints match every event.
    pub fn compile(&self, constraints: &BTreeMap<String, Constraint>) -> Result<IndexQuery> {
        let mut parts = Vec::with_capacity(constraints.len());
        for (id, constraint) in constraints {
            let compiled = self.compile_one(constraint)?;
            tracing::debug!(
                constraint_id = %id,
                constraint_type = constraint.type_name(),
                "Compiled constraint"
            );
            parts.push(compiled);
        }
        Ok(IndexQuery::and_all(parts))
    }

    pub fn compile_one(&self, constraint: &Constraint) -> Result<IndexQuery> {
        let query = match constraint {
            Constraint::FieldValue { field, value } => {
                IndexQuery::term(self.aliases.resolve_or_same(field), value.clone())
            }
            Constraint::TextSearch { text } => self.parser.parse(text)?,
            Constraint::TimeRange { low, high } => {
                IndexQuery::range(self.year_field.clone(), *low, *high)
            }
            Constraint::ReferencePoints { points } => IndexQuery::Or(
                points
                    .iter()
                    .map(|point| IndexQuery::term(self.referencepoint_field.clone(), point.clone()))
                    .collect(),
            ),
        };
        Ok(query)
    }
}
