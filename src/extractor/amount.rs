use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::{AppError, Result};

/// First `$1,234,567` (optionally with cents) in the text.
static CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\s*([\d,]+(?:\.\d+)?)").expect("currency pattern compiles"));

/// Parse the first dollar amount found in `text`, e.g. `"Est. $1,234,567"` → 1234567.
pub fn parse_currency(text: &str) -> Result<Decimal> {
    let raw = CURRENCY_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| AppError::parse(format!("no dollar amount in {:?}", text.trim())))?;

    let digits: String = raw.chars().filter(|c| *c != ',').collect();
    Decimal::from_str(&digits)
        .map_err(|_| AppError::parse(format!("unreadable dollar amount {raw:?}")))
}
