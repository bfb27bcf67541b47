//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When the fixture artifacts change, update only this file.
#![allow(dead_code)]

// ============================================================================
// Fixture Schema
// ============================================================================

/// Feature columns of the fixture artifacts, in training order.
pub const COLUMNS: [&str; 9] = [
    "log_budget",
    "release_year",
    "release_month",
    "release_quarter",
    "log_star_power",
    "score",
    "action",
    "adventure",
    "drama",
];

/// Genre tokens of the fixture vocabulary.
pub const GENRE_TOKENS: [&str; 3] = ["action", "adventure", "drama"];

/// Crew member with a known historical power.
pub const STAR_NAME: &str = "Famous Star";

/// Power of [`STAR_NAME`], chosen so that ln(1 + power) / 20 * 100 lands near 90.
pub const STAR_POWER: f64 = 80_000_000.0;

// ============================================================================
// Fixture Models
// ============================================================================

/// Budgets at or above this reach the high leaves of both models.
pub const BIG_BUDGET: f64 = 100_000_000.0;

pub const OPENING_SMALL_LEAF: f64 = 30_000_000.0;
pub const OPENING_BIG_LEAF: f64 = 250_000_000.0;
pub const OPENING_ACTION_BONUS: f64 = 5_000_000.0;

pub const REVENUE_SMALL_LEAF: f64 = 90_000_000.0;
pub const REVENUE_BIG_LEAF: f64 = 700_000_000.0;
pub const REVENUE_ADVENTURE_BONUS: f64 = 20_000_000.0;

/// Training weight on each side of the budget split (small, big).
pub const BUDGET_SPLIT_COVER: (f64, f64) = (6.0, 4.0);

pub const OPENING_RMSE: f64 = 5_000_000.0;
pub const REVENUE_RMSE: f64 = 20_000_000.0;

// ============================================================================
// Media
// ============================================================================

/// Title the stub media provider knows, with trailers and high trailer views.
pub const HYPED_TITLE: &str = "Dune: Part Two";

pub const HYPED_TRAILER_VIEWS: u64 = 150_000_000;

// ============================================================================
// Timeouts
// ============================================================================

pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
