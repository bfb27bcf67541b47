//! Training artifacts consumed at inference time.
//!
//! An [`ArtifactBundle`] is built once at startup and shared read-only by every
//! prediction. Construction checks the invariants that tie its pieces
//! together, so a bundle that exists is always internally consistent.

mod load;
mod vocabulary;

pub use load::{
    ArtifactLoad, ArtifactProblem, ArtifactStore, COLUMNS_FILE, METRICS_FILE, OPENING_MODEL_FILE,
    PERSON_POWER_FILE, REVENUE_MODEL_FILE, VOCABULARY_FILE,
};
pub use vocabulary::GenreVocabulary;

use crate::model::{DualRegressor, ModelParseError, Target};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid model {path:?}: {source}")]
    Model {
        path: PathBuf,
        source: ModelParseError,
    },

    #[error("Feature schema has {schema} columns but model '{model}' expects {expected}")]
    WidthMismatch {
        model: &'static str,
        schema: usize,
        expected: usize,
    },

    #[error("Feature schema lists column '{0}' more than once")]
    DuplicateColumn(String),

    #[error("Genre token '{0}' is missing from the feature schema")]
    TokenNotInSchema(String),

    #[error("Metrics table has no entry for target '{0}'")]
    MissingMetrics(&'static str),
}

/// Ordered feature column names, in training order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>) -> Self {
        FeatureSchema { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

/// Historical revenue association per crew member name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct PersonPowerTable {
    powers: HashMap<String, f64>,
}

impl PersonPowerTable {
    pub fn new(powers: HashMap<String, f64>) -> Self {
        PersonPowerTable { powers }
    }

    /// Unknown names contribute nothing.
    pub fn power_of(&self, name: &str) -> f64 {
        self.powers.get(name).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.powers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.powers.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetMetrics {
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    #[serde(rename = "MAE")]
    pub mae: f64,
    #[serde(rename = "R2")]
    pub r2: f64,
}

/// Held-out evaluation metrics keyed by target. The original document is
/// kept so that it can be served back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsTable {
    raw: serde_json::Value,
    targets: BTreeMap<String, TargetMetrics>,
}

impl MetricsTable {
    pub fn from_value(raw: serde_json::Value) -> Result<Self, serde_json::Error> {
        let targets = serde_json::from_value(raw.clone())?;
        Ok(MetricsTable { raw, targets })
    }

    pub fn get(&self, target: Target) -> Option<&TargetMetrics> {
        self.targets.get(target.metrics_key())
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.raw
    }
}

impl Serialize for MetricsTable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    models: DualRegressor,
    vocabulary: GenreVocabulary,
    person_power: PersonPowerTable,
    schema: FeatureSchema,
    metrics: MetricsTable,
    opening_rmse: f64,
    revenue_rmse: f64,
}

impl ArtifactBundle {
    pub fn new(
        models: DualRegressor,
        vocabulary: GenreVocabulary,
        person_power: PersonPowerTable,
        schema: FeatureSchema,
        metrics: MetricsTable,
    ) -> Result<Self, ArtifactError> {
        let mut seen = HashSet::new();
        for column in schema.columns() {
            if !seen.insert(column.as_str()) {
                return Err(ArtifactError::DuplicateColumn(column.clone()));
            }
        }

        for target in Target::ALL {
            let expected = models.model(target).num_features();
            if expected != schema.len() {
                return Err(ArtifactError::WidthMismatch {
                    model: target.model_key(),
                    schema: schema.len(),
                    expected,
                });
            }
        }

        let rmse = |target: Target| {
            metrics
                .get(target)
                .map(|m| m.rmse)
                .ok_or(ArtifactError::MissingMetrics(target.metrics_key()))
        };
        let opening_rmse = rmse(Target::OpeningWeekend)?;
        let revenue_rmse = rmse(Target::Revenue)?;

        if let Some(token) = vocabulary
            .tokens()
            .iter()
            .find(|token| !seen.contains(token.as_str()))
        {
            return Err(ArtifactError::TokenNotInSchema(token.clone()));
        }

        Ok(ArtifactBundle {
            models,
            vocabulary,
            person_power,
            schema,
            metrics,
            opening_rmse,
            revenue_rmse,
        })
    }

    pub fn models(&self) -> &DualRegressor {
        &self.models
    }

    pub fn vocabulary(&self) -> &GenreVocabulary {
        &self.vocabulary
    }

    pub fn person_power(&self) -> &PersonPowerTable {
        &self.person_power
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn metrics(&self) -> &MetricsTable {
        &self.metrics
    }

    /// Held-out RMSE of a target, present for every bundle.
    pub fn rmse(&self, target: Target) -> f64 {
        match target {
            Target::OpeningWeekend => self.opening_rmse,
            Target::Revenue => self.revenue_rmse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, Tree, TreeEnsemble};
    use serde_json::json;

    fn constant_model(num_features: usize) -> TreeEnsemble {
        TreeEnsemble::new(1.0, num_features, vec![Tree::new(vec![Node::leaf(0.0, 1.0)])])
            .unwrap()
    }

    fn metrics() -> MetricsTable {
        MetricsTable::from_value(json!({
            "opening_weekend": {"RMSE": 10.0, "MAE": 5.0, "R2": 0.5},
            "revenue": {"RMSE": 20.0, "MAE": 15.0, "R2": 0.7}
        }))
        .unwrap()
    }

    fn schema(columns: &[&str]) -> FeatureSchema {
        FeatureSchema::new(columns.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn accepts_consistent_pieces() {
        let bundle = ArtifactBundle::new(
            DualRegressor::new(constant_model(2), constant_model(2)),
            GenreVocabulary::new(vec!["drama".to_string()]),
            PersonPowerTable::default(),
            schema(&["log_budget", "drama"]),
            metrics(),
        )
        .unwrap();

        assert_eq!(bundle.schema().position("drama"), Some(1));
        assert_eq!(bundle.metrics().get(Target::Revenue).unwrap().rmse, 20.0);
        assert_eq!(bundle.rmse(Target::OpeningWeekend), 10.0);
        assert_eq!(bundle.rmse(Target::Revenue), 20.0);
    }

    #[test]
    fn rejects_schema_width_mismatch() {
        let result = ArtifactBundle::new(
            DualRegressor::new(constant_model(2), constant_model(3)),
            GenreVocabulary::new(vec![]),
            PersonPowerTable::default(),
            schema(&["a", "b"]),
            metrics(),
        );
        assert!(matches!(
            result,
            Err(ArtifactError::WidthMismatch {
                model: "revenue",
                schema: 2,
                expected: 3
            })
        ));
    }

    #[test]
    fn rejects_vocabulary_token_outside_schema() {
        let result = ArtifactBundle::new(
            DualRegressor::new(constant_model(1), constant_model(1)),
            GenreVocabulary::new(vec!["horror".to_string()]),
            PersonPowerTable::default(),
            schema(&["log_budget"]),
            metrics(),
        );
        assert!(matches!(result, Err(ArtifactError::TokenNotInSchema(t)) if t == "horror"));
    }

    #[test]
    fn rejects_metrics_without_target() {
        let metrics = MetricsTable::from_value(json!({
            "revenue": {"RMSE": 20.0, "MAE": 15.0, "R2": 0.7}
        }))
        .unwrap();
        let result = ArtifactBundle::new(
            DualRegressor::new(constant_model(1), constant_model(1)),
            GenreVocabulary::new(vec![]),
            PersonPowerTable::default(),
            schema(&["log_budget"]),
            metrics,
        );
        assert!(matches!(
            result,
            Err(ArtifactError::MissingMetrics("opening_weekend"))
        ));
    }

    #[test]
    fn metrics_serialize_verbatim() {
        let raw = json!({
            "revenue": {"RMSE": 20.0, "MAE": 15.0, "R2": 0.7},
            "opening_weekend": {"RMSE": 10.0, "MAE": 5.0, "R2": 0.5, "extra": "kept"}
        });
        let table = MetricsTable::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&table).unwrap(), raw);
    }

    #[test]
    fn unknown_person_has_no_power() {
        let table = PersonPowerTable::new(HashMap::from([("Known".to_string(), 5.0)]));
        assert_eq!(table.power_of("Known"), 5.0);
        assert_eq!(table.power_of("Stranger"), 0.0);
    }
}
