use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{AppError, Result};
use crate::types::{DuplicatePolicy, GameProperties};

/// Fast Play game page for DIAMONDS AND GOLD.
pub const PRIZE_URL: &str = "https://www.palottery.pa.gov/Fast-Play/View-Game.aspx?id=5217";

/// The lottery site rejects requests without a browser-like agent.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Request timeout for the page fetch (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Rows of the page's prize table that are kept.
pub const MAX_PRIZE_TIERS: usize = 6;

/// Rows logged after a pass.
pub const RECENT_LIMIT: i64 = 5;

/// Per-ticket prize-pool contribution of the default game.
pub const DEFAULT_TICKET_CONTRIBUTION: &str = "2.4";

/// Ticket price of the default game.
pub const DEFAULT_TICKET_PRICE: &str = "30";

#[derive(Debug, Clone)]
pub struct Config {
    /// sqlx connection string (DATABASE_URL), e.g. `sqlite:prizes.db`
    pub database_url: String,
    pub prize_url: String,
    pub log_level: String,
    pub game: GameProperties,
    pub duplicate_policy: DuplicatePolicy,
    /// Log the row instead of inserting it (DRY_RUN)
    pub dry_run: bool,
    /// Rows logged after the pass; 0 disables (RECENT_LIMIT)
    pub recent_limit: i64,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup so tests don't touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::Config("DATABASE_URL environment variable is not set".to_string()))?;

        let ticket_contribution = parse_decimal(
            "TICKET_CONTRIBUTION",
            &lookup("TICKET_CONTRIBUTION").unwrap_or_else(|| DEFAULT_TICKET_CONTRIBUTION.to_string()),
        )?;
        if ticket_contribution <= Decimal::ZERO {
            return Err(AppError::Config("TICKET_CONTRIBUTION must be positive".to_string()));
        }

        Ok(Self {
            database_url,
            prize_url: lookup("PRIZE_URL").unwrap_or_else(|| PRIZE_URL.to_string()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            game: GameProperties {
                ticket_contribution,
                ticket_price: parse_decimal(
                    "TICKET_PRICE",
                    &lookup("TICKET_PRICE").unwrap_or_else(|| DEFAULT_TICKET_PRICE.to_string()),
                )?,
            },
            duplicate_policy: match lookup("DUPLICATE_POLICY") {
                Some(v) => v.parse()?,
                None => DuplicatePolicy::default(),
            },
            dry_run: match lookup("DRY_RUN") {
                Some(v) => parse_bool("DRY_RUN", &v)?,
                None => false,
            },
            recent_limit: lookup("RECENT_LIMIT")
                .unwrap_or_else(|| RECENT_LIMIT.to_string())
                .parse::<i64>()
                .ok()
                .filter(|n| *n >= 0)
                .ok_or_else(|| AppError::Config("RECENT_LIMIT must be a non-negative integer".to_string()))?,
            http_timeout_secs: lookup("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|| HTTP_TIMEOUT_SECS.to_string())
                .parse::<u64>()
                .map_err(|_| AppError::Config("HTTP_TIMEOUT_SECS must be a whole number of seconds".to_string()))?,
        })
    }
}

fn parse_decimal(key: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw.trim())
        .map_err(|_| AppError::Config(format!("{key} must be a decimal number, got {raw:?}")))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(AppError::Config(format!("{key} must be true or false, got {raw:?}"))),
    }
}
