use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::db::models::{encode_decimal, ObservationRow, OBSERVATION_COLUMNS};
use crate::error::Result;
use crate::estimator::{self, PriorPoint};
use crate::types::{
    DuplicatePolicy, GameProperties, NewObservation, PrizeObservation, PrizeSnapshot,
    RecordOutcome, SkipReason,
};

/// Reads and appends `live_prizes` rows. Never updates or deletes.
#[derive(Clone)]
pub struct PrizeRecorder {
    pool: SqlitePool,
}

impl PrizeRecorder {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Compare `snap` with the last stored row for its game and append a new
    /// row unless the policy says to skip. In dry-run mode nothing is written.
    pub async fn record(
        &self,
        snap: &PrizeSnapshot,
        url: &str,
        game: &GameProperties,
        policy: DuplicatePolicy,
        dry_run: bool,
    ) -> Result<RecordOutcome> {
        let previous = self.latest(&snap.game_name).await?;

        if let Some(reason) = skip_reason(previous.as_ref(), snap, policy) {
            info!(
                event = "SKIPPED",
                game = %snap.game_name,
                prize = %snap.prize_amount,
                reason = %reason,
                "Skipping record at {}",
                snap.observed_at,
            );
            return Ok(RecordOutcome::Skipped(reason));
        }

        let prior = previous.as_ref().map(|p| PriorPoint {
            observed_at: p.observed_at,
            prize_amount: p.prize_amount,
            ticket_contribution: p.ticket_contribution,
        });
        let est = estimator::estimate(prior, snap.prize_amount, snap.observed_at, game.ticket_contribution);

        if let Some(p) = &previous {
            let elapsed_min = (snap.observed_at - p.observed_at).num_seconds() as f64 / 60.0;
            info!(
                "Prize difference: ${} | elapsed: {:.2} min | implied sales: {} | hourly: {}",
                fmt_opt(snap.prize_amount.checked_sub(p.prize_amount)),
                elapsed_min,
                fmt_opt(est.tickets),
                fmt_opt(est.hourly),
            );
        }

        let new = NewObservation {
            observed_at: snap.observed_at,
            game_name: snap.game_name.clone(),
            url: url.to_string(),
            prize_amount: snap.prize_amount,
            ticket_contribution: Some(game.ticket_contribution),
            ticket_price: Some(game.ticket_price),
            implied_sales_estimate: est.tickets,
            implied_hourly_sales: est.hourly,
            tiers: snap.tiers.clone(),
        };

        if dry_run {
            info!(
                event = "DRY_RUN",
                game = %new.game_name,
                prize = %new.prize_amount,
                estimate = %fmt_opt(new.implied_sales_estimate),
                "Dry run, would insert row at {}",
                new.observed_at,
            );
            return Ok(RecordOutcome::DryRun(new));
        }

        let stored = self.insert(&new).await?;
        info!(
            event = "INSERTED",
            id = stored.id,
            game = %stored.game_name,
            prize = %stored.prize_amount,
            estimate = %fmt_opt(stored.implied_sales_estimate),
            url = %stored.url,
            "Added new record at {}",
            stored.observed_at,
        );
        Ok(RecordOutcome::Inserted(stored))
    }

    /// Most recent row for `game`, by observation time then insertion order.
    pub async fn latest(&self, game: &str) -> Result<Option<PrizeObservation>> {
        let sql = format!(
            "SELECT {OBSERVATION_COLUMNS} FROM live_prizes \
             WHERE game_name = ? ORDER BY observed_at DESC, id DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, ObservationRow>(&sql)
            .bind(game)
            .fetch_optional(&self.pool)
            .await?;
        row.map(PrizeObservation::try_from).transpose()
    }

    /// Newest rows across all games, newest first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<PrizeObservation>> {
        let sql = format!(
            "SELECT {OBSERVATION_COLUMNS} FROM live_prizes \
             ORDER BY observed_at DESC, id DESC LIMIT ?"
        );
        let rows = sqlx::query_as::<_, ObservationRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(PrizeObservation::try_from).collect()
    }

    #[cfg(test)]
    pub async fn count(&self, game: &str) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM live_prizes WHERE game_name = ?")
            .bind(game)
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn insert(&self, obs: &NewObservation) -> Result<PrizeObservation> {
        let tiers = serde_json::to_string(&obs.tiers)?;
        let recorded_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO live_prizes (
                observed_at, game_name, url, prize_amount,
                ticket_contribution, ticket_price,
                implied_sales_estimate, implied_hourly_sales,
                prize_tiers, recorded_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(obs.observed_at)
        .bind(&obs.game_name)
        .bind(&obs.url)
        .bind(obs.prize_amount.normalize().to_string())
        .bind(encode_decimal(obs.ticket_contribution))
        .bind(encode_decimal(obs.ticket_price))
        .bind(encode_decimal(obs.implied_sales_estimate))
        .bind(encode_decimal(obs.implied_hourly_sales))
        .bind(tiers)
        .bind(recorded_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, "row inserted");

        Ok(PrizeObservation {
            id,
            observed_at: obs.observed_at,
            game_name: obs.game_name.clone(),
            url: obs.url.clone(),
            prize_amount: obs.prize_amount,
            ticket_contribution: obs.ticket_contribution,
            ticket_price: obs.ticket_price,
            implied_sales_estimate: obs.implied_sales_estimate,
            implied_hourly_sales: obs.implied_hourly_sales,
            tiers: obs.tiers.clone(),
        })
    }
}

/// Why `snap` should not be written, judged against the last row.
/// A snapshot older than the last row is refused under every policy.
pub fn skip_reason(
    previous: Option<&PrizeObservation>,
    snap: &PrizeSnapshot,
    policy: DuplicatePolicy,
) -> Option<SkipReason> {
    let prev = previous?;
    if snap.observed_at < prev.observed_at {
        return Some(SkipReason::OutOfOrder);
    }
    if policy == DuplicatePolicy::Always {
        return None;
    }
    if prev.observed_at == snap.observed_at {
        Some(SkipReason::SameTimestamp)
    } else if prev.prize_amount == snap.prize_amount {
        Some(SkipReason::SamePrize)
    } else {
        None
    }
}

pub fn fmt_opt<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "n/a".to_string())
}
