//! Turns a [`MovieDescriptor`] into the numeric row the models were trained on.
//!
//! Values are produced by feature name and placed at the position the
//! artifact's feature schema assigns to that name. A schema that names a
//! column the encoder does not produce (or the other way round) is an error,
//! never a silent shift of the remaining columns.

use super::MovieDescriptor;
use crate::artifacts::{ArtifactBundle, FeatureSchema, PersonPowerTable};
use chrono::{DateTime, Datelike, NaiveDate};
use thiserror::Error;
use tracing::debug;

pub const LOG_BUDGET: &str = "log_budget";
pub const RELEASE_YEAR: &str = "release_year";
pub const RELEASE_MONTH: &str = "release_month";
pub const RELEASE_QUARTER: &str = "release_quarter";
pub const LOG_STAR_POWER: &str = "log_star_power";
pub const SCORE: &str = "score";

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

#[derive(Debug, Error, PartialEq)]
pub enum EncodeError {
    #[error("Feature schema column '{0}' is not produced by the encoder")]
    UnknownColumn(String),

    #[error("Encoded feature '{0}' has no column in the feature schema")]
    UnmappedFeature(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseDate {
    pub year: i32,
    pub month: u32,
    pub quarter: u32,
}

impl ReleaseDate {
    pub const FALLBACK: ReleaseDate = ReleaseDate {
        year: 2023,
        month: 1,
        quarter: 1,
    };

    fn from_date<D: Datelike>(date: &D) -> Self {
        ReleaseDate {
            year: date.year(),
            month: date.month(),
            quarter: (date.month() - 1) / 3 + 1,
        }
    }
}

/// Parses `YYYY-MM-DD`, `MM/DD/YYYY` or an RFC 3339 timestamp. Anything else
/// falls back to [`ReleaseDate::FALLBACK`].
pub fn parse_release_date(raw: &str) -> ReleaseDate {
    let raw = raw.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return ReleaseDate::from_date(&date);
        }
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return ReleaseDate::from_date(&timestamp.date_naive());
    }
    debug!("Unparseable release date '{}', using fallback", raw);
    ReleaseDate::FALLBACK
}

/// Mean power of the crew names, before the log transform.
///
/// The crew string is read as strictly alternating `name, role` tokens, so
/// tokens 0, 2, 4, ... are names. A missing role shifts every following name
/// onto a role slot; this matches how the table was built at training time.
pub fn star_power(crew: &str, table: &PersonPowerTable) -> f64 {
    if crew.trim().is_empty() {
        return 0.0;
    }
    let names: Vec<&str> = crew.split(',').map(str::trim).step_by(2).collect();
    if names.is_empty() {
        return 0.0;
    }
    let total: f64 = names.iter().map(|name| table.power_of(name)).sum();
    total / names.len() as f64
}

/// `"Science Fiction, Action"` becomes `"Science_Fiction Action"`, so that
/// multi-word genres stay single vocabulary tokens.
pub fn genre_document(genres: &str) -> String {
    genres
        .split(',')
        .map(|genre| genre.trim().replace(' ', "_"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One encoded input row, ordered like the feature schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
    log_star_power: f64,
}

impl FeatureVector {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn log_star_power(&self) -> f64 {
        self.log_star_power
    }

    pub fn get(&self, schema: &FeatureSchema, column: &str) -> Option<f64> {
        schema
            .position(column)
            .and_then(|index| self.values.get(index).copied())
    }
}

pub struct FeatureEncoder<'a> {
    bundle: &'a ArtifactBundle,
}

impl<'a> FeatureEncoder<'a> {
    pub fn new(bundle: &'a ArtifactBundle) -> Self {
        FeatureEncoder { bundle }
    }

    pub fn encode(&self, descriptor: &MovieDescriptor) -> Result<FeatureVector, EncodeError> {
        let date = parse_release_date(&descriptor.release_date);
        let log_star_power = star_power(&descriptor.crew, self.bundle.person_power()).ln_1p();

        let mut named = vec![
            (LOG_BUDGET, descriptor.budget.ln_1p()),
            (RELEASE_YEAR, date.year as f64),
            (RELEASE_MONTH, date.month as f64),
            (RELEASE_QUARTER, date.quarter as f64),
            (LOG_STAR_POWER, log_star_power),
            (SCORE, descriptor.score()),
        ];
        named.extend(
            self.bundle
                .vocabulary()
                .transform(&genre_document(&descriptor.genres)),
        );

        let schema = self.bundle.schema();
        let mut values = vec![0.0; schema.len()];
        let mut assigned = vec![false; schema.len()];
        for (name, value) in named {
            let index = schema
                .position(name)
                .ok_or_else(|| EncodeError::UnmappedFeature(name.to_string()))?;
            values[index] = value;
            assigned[index] = true;
        }
        if let Some(index) = assigned.iter().position(|done| !done) {
            return Err(EncodeError::UnknownColumn(schema.columns()[index].clone()));
        }

        Ok(FeatureVector {
            values,
            log_star_power,
        })
    }
}
