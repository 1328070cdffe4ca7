//! Row types for the `live_prizes` table.
//! Money columns are TEXT so decimals survive SQLite untouched.
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::error::{AppError, Result};
use crate::types::{PrizeObservation, PrizeTier};

#[derive(Debug, sqlx::FromRow)]
pub struct ObservationRow {
    pub id: i64,
    pub observed_at: NaiveDateTime,
    pub game_name: String,
    pub url: String,
    pub prize_amount: String,
    pub ticket_contribution: Option<String>,
    pub ticket_price: Option<String>,
    pub implied_sales_estimate: Option<String>,
    pub implied_hourly_sales: Option<String>,
    pub prize_tiers: String,
}

/// Column list matching `ObservationRow`.
pub const OBSERVATION_COLUMNS: &str = "id, observed_at, game_name, url, prize_amount, \
     ticket_contribution, ticket_price, implied_sales_estimate, implied_hourly_sales, prize_tiers";

impl TryFrom<ObservationRow> for PrizeObservation {
    type Error = AppError;

    fn try_from(row: ObservationRow) -> Result<Self> {
        let tiers: Vec<PrizeTier> = serde_json::from_str(&row.prize_tiers)?;
        Ok(PrizeObservation {
            id: row.id,
            observed_at: row.observed_at,
            prize_amount: decode_decimal(row.id, "prize_amount", &row.prize_amount)?,
            ticket_contribution: decode_opt(row.id, "ticket_contribution", row.ticket_contribution)?,
            ticket_price: decode_opt(row.id, "ticket_price", row.ticket_price)?,
            implied_sales_estimate: decode_opt(row.id, "implied_sales_estimate", row.implied_sales_estimate)?,
            implied_hourly_sales: decode_opt(row.id, "implied_hourly_sales", row.implied_hourly_sales)?,
            game_name: row.game_name,
            url: row.url,
            tiers,
        })
    }
}

pub fn encode_decimal(d: Option<Decimal>) -> Option<String> {
    d.map(|d| d.normalize().to_string())
}

fn decode_decimal(id: i64, column: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).map_err(|_| AppError::InvalidRow(format!("row {id}: {column} = {raw:?}")))
}

fn decode_opt(id: i64, column: &str, raw: Option<String>) -> Result<Option<Decimal>> {
    raw.map(|r| decode_decimal(id, column, &r)).transpose()
}
