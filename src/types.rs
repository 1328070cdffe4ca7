use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Scraped page
// ---------------------------------------------------------------------------

/// One row of the game's prize table, kept as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeTier {
    pub value: String,
    pub remaining: String,
}

/// Everything the extractor pulls out of one page load.
#[derive(Debug, Clone, PartialEq)]
pub struct PrizeSnapshot {
    pub game_name: String,
    pub prize_amount: Decimal,
    /// Page's "As of" time, or the local clock when the page has none.
    pub observed_at: NaiveDateTime,
    pub tiers: Vec<PrizeTier>,
}

// ---------------------------------------------------------------------------
// Stored observation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PrizeObservation {
    pub id: i64,
    pub observed_at: NaiveDateTime,
    pub game_name: String,
    pub url: String,
    pub prize_amount: Decimal,
    pub ticket_contribution: Option<Decimal>,
    pub ticket_price: Option<Decimal>,
    pub implied_sales_estimate: Option<Decimal>,
    pub implied_hourly_sales: Option<Decimal>,
    pub tiers: Vec<PrizeTier>,
}

/// A row about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewObservation {
    pub observed_at: NaiveDateTime,
    pub game_name: String,
    pub url: String,
    pub prize_amount: Decimal,
    pub ticket_contribution: Option<Decimal>,
    pub ticket_price: Option<Decimal>,
    pub implied_sales_estimate: Option<Decimal>,
    pub implied_hourly_sales: Option<Decimal>,
    pub tiers: Vec<PrizeTier>,
}

// ---------------------------------------------------------------------------
// Game / policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameProperties {
    /// Amount of each ticket that moves the displayed prize pool.
    pub ticket_contribution: Decimal,
    pub ticket_price: Decimal,
}

/// What to do when a pass sees the same value as the last stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Write nothing if the last row has the same timestamp or the same prize.
    #[default]
    Skip,
    /// Write a row on every pass.
    Always,
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DuplicatePolicy::Skip => "skip",
            DuplicatePolicy::Always => "always",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(DuplicatePolicy::Skip),
            "always" => Ok(DuplicatePolicy::Always),
            other => Err(AppError::Config(format!(
                "DUPLICATE_POLICY must be 'skip' or 'always', got {other:?}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Pass result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    SameTimestamp,
    SamePrize,
    /// Snapshot is older than the last stored row.
    OutOfOrder,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkipReason::SameTimestamp => "same_timestamp",
            SkipReason::SamePrize => "same_prize",
            SkipReason::OutOfOrder => "out_of_order",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Inserted(PrizeObservation),
    Skipped(SkipReason),
    /// Dry run: the row that would have been written.
    DryRun(NewObservation),
}
