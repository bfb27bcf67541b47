//! Test fixture creation
//!
//! Writes a complete artifact directory (two tree ensembles, vocabulary,
//! person power table, feature schema, metrics) into a temporary directory.
//!
//! Both models split on `log_budget` at ln(1 + BIG_BUDGET) and add a bonus
//! tree on one genre column, so every prediction can be computed by hand.

use super::constants::*;
use anyhow::Result;
use boxoffice_server::artifacts::{
    COLUMNS_FILE, METRICS_FILE, OPENING_MODEL_FILE, PERSON_POWER_FILE, REVENUE_MODEL_FILE,
    VOCABULARY_FILE,
};
use boxoffice_server::MovieDescriptor;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

/// Which artifacts a fixture directory contains.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArtifactFixture {
    /// Every artifact, consistent.
    Complete,
    /// Models present, genre vocabulary missing.
    WithoutVocabulary,
    /// Only the metrics table.
    WithoutModels,
}

fn column(name: &str) -> usize {
    COLUMNS
        .iter()
        .position(|c| *c == name)
        .expect("Fixture column missing")
}

/// Single tree ensemble: budget split plus a bonus on `bonus_column`.
fn model_json(small_leaf: f64, big_leaf: f64, bonus_column: &str, bonus: f64) -> Value {
    let (small_cover, big_cover) = BUDGET_SPLIT_COVER;
    json!({
        "base_score": 0.0,
        "num_features": COLUMNS.len(),
        "trees": [
            {
                "nodes": [
                    {"id": 0, "feature": column("log_budget"), "threshold": BIG_BUDGET.ln_1p(),
                     "left": 1, "right": 2, "cover": small_cover + big_cover},
                    {"id": 1, "leaf": small_leaf, "cover": small_cover},
                    {"id": 2, "leaf": big_leaf, "cover": big_cover}
                ]
            },
            {
                "nodes": [
                    {"id": 0, "feature": column(bonus_column), "threshold": 0.5,
                     "left": 1, "right": 2, "cover": 10.0},
                    {"id": 1, "leaf": 0.0, "cover": 5.0},
                    {"id": 2, "leaf": bonus, "cover": 5.0}
                ]
            }
        ]
    })
}

fn write_json(dir: &Path, file: &str, value: &Value) -> Result<()> {
    std::fs::write(dir.join(file), serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Creates a temporary artifact directory.
///
/// Returns the TempDir, which must be kept alive for as long as the
/// directory is in use.
pub fn create_test_artifacts(fixture: ArtifactFixture) -> Result<TempDir> {
    let dir = TempDir::new()?;
    let path = dir.path();

    write_json(
        path,
        METRICS_FILE,
        &json!({
            "opening_weekend": {"RMSE": OPENING_RMSE, "MAE": 3_000_000.0, "R2": 0.71},
            "revenue": {"RMSE": REVENUE_RMSE, "MAE": 12_000_000.0, "R2": 0.78}
        }),
    )?;

    if fixture == ArtifactFixture::WithoutModels {
        return Ok(dir);
    }

    write_json(
        path,
        OPENING_MODEL_FILE,
        &model_json(
            OPENING_SMALL_LEAF,
            OPENING_BIG_LEAF,
            "action",
            OPENING_ACTION_BONUS,
        ),
    )?;
    write_json(
        path,
        REVENUE_MODEL_FILE,
        &model_json(
            REVENUE_SMALL_LEAF,
            REVENUE_BIG_LEAF,
            "adventure",
            REVENUE_ADVENTURE_BONUS,
        ),
    )?;
    write_json(path, COLUMNS_FILE, &json!(COLUMNS))?;
    write_json(
        path,
        PERSON_POWER_FILE,
        &json!({ (STAR_NAME): STAR_POWER, "Supporting Actor": 1_000_000.0 }),
    )?;

    if fixture != ArtifactFixture::WithoutVocabulary {
        write_json(path, VOCABULARY_FILE, &json!({ "tokens": GENRE_TOKENS }))?;
    }

    Ok(dir)
}

/// The reference descriptor: budget 50M, unknown crew, "Action, Adventure",
/// score 75, released 2023-01-01.
#[allow(dead_code)]
pub fn reference_movie() -> MovieDescriptor {
    MovieDescriptor {
        title: Some("Reference Movie".to_string()),
        budget: 50_000_000.0,
        is_estimated_budget: false,
        release_date: "2023-01-01".to_string(),
        genres: "Action, Adventure".to_string(),
        crew: "Unknown,Actor".to_string(),
        score: Some(75.0),
    }
}
