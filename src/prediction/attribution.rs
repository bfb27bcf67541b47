//! Ranks per-feature contributions of the revenue model for one input row.

use super::FeatureVector;
use crate::artifacts::FeatureSchema;
use crate::model::{tree_shap, TreeEnsemble};
use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

pub const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Error, PartialEq)]
pub enum AttributionError {
    #[error("Model has no trees")]
    EmptyModel,

    #[error("Model expects {expected} features, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("Contribution of '{0}' is not finite")]
    NonFinite(String),
}

/// Feature name to signed contribution, largest magnitude first. Serializes
/// as a JSON object that keeps this order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributionMap {
    entries: Vec<(String, f64)>,
}

impl AttributionMap {
    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(name, _)| name == feature)
            .map(|(_, value)| *value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for AttributionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone)]
pub struct AttributionEngine {
    top_k: usize,
}

impl Default for AttributionEngine {
    fn default() -> Self {
        AttributionEngine::new(DEFAULT_TOP_K)
    }
}

impl AttributionEngine {
    pub fn new(top_k: usize) -> Self {
        AttributionEngine { top_k }
    }

    /// The `top_k` contributions by absolute value. Equal magnitudes keep
    /// schema column order.
    pub fn explain(
        &self,
        model: &TreeEnsemble,
        schema: &FeatureSchema,
        features: &FeatureVector,
    ) -> Result<AttributionMap, AttributionError> {
        if model.trees().is_empty() {
            return Err(AttributionError::EmptyModel);
        }
        if model.num_features() != features.len() || schema.len() != features.len() {
            return Err(AttributionError::WidthMismatch {
                expected: model.num_features(),
                actual: features.len(),
            });
        }

        let phi = tree_shap::shap_values(model, features.values());
        let mut ranked = Vec::with_capacity(phi.len());
        for (column, value) in schema.columns().iter().zip(phi) {
            if !value.is_finite() {
                return Err(AttributionError::NonFinite(column.clone()));
            }
            ranked.push((column.clone(), value));
        }

        ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        ranked.truncate(self.top_k);
        Ok(AttributionMap { entries: ranked })
    }
}
