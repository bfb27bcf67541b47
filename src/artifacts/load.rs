//! Artifact directory loading.
//!
//! Every artifact file is loaded independently and failures are collected as
//! problems instead of aborting, so the server can still start (and report
//! what is wrong) when the offline trainer produced an incomplete directory.

use super::{
    ArtifactBundle, ArtifactError, FeatureSchema, GenreVocabulary, MetricsTable,
    PersonPowerTable,
};
use crate::model::{DualRegressor, TreeEnsemble};
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const OPENING_MODEL_FILE: &str = "model_opening.json";
pub const REVENUE_MODEL_FILE: &str = "model_revenue.json";
pub const VOCABULARY_FILE: &str = "genre_vocabulary.json";
pub const PERSON_POWER_FILE: &str = "person_power.json";
pub const COLUMNS_FILE: &str = "model_columns.json";
pub const METRICS_FILE: &str = "metrics.json";

#[derive(Debug)]
pub struct ArtifactProblem {
    pub artifact: &'static str,
    pub error: ArtifactError,
}

impl fmt::Display for ArtifactProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.artifact, self.error)
    }
}

/// Outcome of loading an artifact directory.
#[derive(Debug)]
pub enum ArtifactLoad {
    /// Every artifact loaded and the bundle is consistent.
    Ready(ArtifactBundle),
    /// At least one model loaded, but the bundle is incomplete or
    /// inconsistent. Predictions degrade to all-zero results.
    Degraded {
        metrics: Option<MetricsTable>,
        problems: Vec<ArtifactProblem>,
    },
    /// No usable model at all.
    Unavailable {
        metrics: Option<MetricsTable>,
        problems: Vec<ArtifactProblem>,
    },
}

impl ArtifactLoad {
    pub fn metrics(&self) -> Option<&MetricsTable> {
        match self {
            ArtifactLoad::Ready(bundle) => Some(bundle.metrics()),
            ArtifactLoad::Degraded { metrics, .. } | ArtifactLoad::Unavailable { metrics, .. } => {
                metrics.as_ref()
            }
        }
    }

    pub fn problems(&self) -> &[ArtifactProblem] {
        match self {
            ArtifactLoad::Ready(_) => &[],
            ArtifactLoad::Degraded { problems, .. }
            | ArtifactLoad::Unavailable { problems, .. } => problems,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            ArtifactLoad::Ready(_) => "ready",
            ArtifactLoad::Degraded { .. } => "degraded",
            ArtifactLoad::Unavailable { .. } => "unavailable",
        }
    }
}

pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        ArtifactStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load(&self) -> ArtifactLoad {
        info!("Loading artifacts from {:?}...", self.dir);
        let mut problems = Vec::new();

        let opening = self.collect(&mut problems, OPENING_MODEL_FILE, |p| self.load_model(p));
        let revenue = self.collect(&mut problems, REVENUE_MODEL_FILE, |p| self.load_model(p));
        let vocabulary = self.collect(&mut problems, VOCABULARY_FILE, |p| {
            self.read_json::<GenreVocabulary>(p)
        });
        let person_power = self.collect(&mut problems, PERSON_POWER_FILE, |p| {
            self.read_json::<PersonPowerTable>(p)
        });
        let schema = self.collect(&mut problems, COLUMNS_FILE, |p| {
            self.read_json::<FeatureSchema>(p)
        });
        let metrics = self.collect(&mut problems, METRICS_FILE, |p| {
            let raw = self.read_json::<serde_json::Value>(p)?;
            MetricsTable::from_value(raw).map_err(|source| ArtifactError::Json {
                path: self.dir.join(p),
                source,
            })
        });

        let any_model = opening.is_some() || revenue.is_some();

        let bundle = match (opening, revenue, vocabulary, person_power, schema, metrics.clone()) {
            (
                Some(opening),
                Some(revenue),
                Some(vocabulary),
                Some(person_power),
                Some(schema),
                Some(metrics),
            ) => match ArtifactBundle::new(
                DualRegressor::new(opening, revenue),
                vocabulary,
                person_power,
                schema,
                metrics,
            ) {
                Ok(bundle) => Some(bundle),
                Err(error) => {
                    problems.push(ArtifactProblem {
                        artifact: "bundle",
                        error,
                    });
                    None
                }
            },
            _ => None,
        };

        let load = match bundle {
            Some(bundle) => ArtifactLoad::Ready(bundle),
            None if any_model => ArtifactLoad::Degraded { metrics, problems },
            None => ArtifactLoad::Unavailable { metrics, problems },
        };

        match &load {
            ArtifactLoad::Ready(bundle) => info!(
                "Artifacts loaded: {} feature columns, {} genre tokens, {} known people.",
                bundle.schema().len(),
                bundle.vocabulary().len(),
                bundle.person_power().len()
            ),
            _ => {
                warn!(
                    "Artifacts are {}, found {} problems:",
                    load.status(),
                    load.problems().len()
                );
                for problem in load.problems() {
                    warn!("- {}", problem);
                }
            }
        }

        load
    }

    fn collect<T, F>(
        &self,
        problems: &mut Vec<ArtifactProblem>,
        artifact: &'static str,
        loader: F,
    ) -> Option<T>
    where
        F: FnOnce(&'static str) -> Result<T, ArtifactError>,
    {
        match loader(artifact) {
            Ok(value) => Some(value),
            Err(error) => {
                problems.push(ArtifactProblem { artifact, error });
                None
            }
        }
    }

    fn read_to_string(&self, file: &str) -> Result<String, ArtifactError> {
        let path = self.dir.join(file);
        std::fs::read_to_string(&path).map_err(|source| ArtifactError::Io { path, source })
    }

    fn read_json<T: DeserializeOwned>(&self, file: &str) -> Result<T, ArtifactError> {
        let content = self.read_to_string(file)?;
        serde_json::from_str(&content).map_err(|source| ArtifactError::Json {
            path: self.dir.join(file),
            source,
        })
    }

    fn load_model(&self, file: &str) -> Result<TreeEnsemble, ArtifactError> {
        let content = self.read_to_string(file)?;
        TreeEnsemble::from_json(&content).map_err(|source| ArtifactError::Model {
            path: self.dir.join(file),
            source,
        })
    }
}
