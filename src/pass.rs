use chrono::Local;
use tracing::info;

use crate::config::Config;
use crate::db::recorder::fmt_opt;
use crate::db::PrizeRecorder;
use crate::error::Result;
use crate::extractor::extract_snapshot;
use crate::fetcher::fetch_page;
use crate::types::RecordOutcome;

/// One scrape: fetch → extract → record. Any failure ends the pass.
pub async fn run_once(cfg: &Config, recorder: &PrizeRecorder) -> Result<RecordOutcome> {
    let body = fetch_page(cfg).await?;

    let snapshot = extract_snapshot(&body, Local::now().naive_local())?;
    info!(
        game = %snapshot.game_name,
        prize = %snapshot.prize_amount,
        tiers = snapshot.tiers.len(),
        "Scraped top prize ${} as of {}",
        snapshot.prize_amount,
        snapshot.observed_at,
    );

    recorder
        .record(
            &snapshot,
            &cfg.prize_url,
            &cfg.game,
            cfg.duplicate_policy,
            cfg.dry_run,
        )
        .await
}

/// Log the newest `limit` rows so an operator can see rows landing.
pub async fn log_recent(recorder: &PrizeRecorder, limit: i64) -> Result<()> {
    if limit == 0 {
        return Ok(());
    }

    let rows = recorder.recent(limit).await?;
    if rows.is_empty() {
        info!("No entries in live_prizes yet");
        return Ok(());
    }

    info!("Most recent {} entries:", rows.len());
    for r in &rows {
        let tiers: Vec<String> = r
            .tiers
            .iter()
            .map(|t| format!("{}={}", t.value, t.remaining))
            .collect();
        info!(
            "  {} | {:<20} | ${:<12} | price: ${:<4} | sales: {:<8} | hourly: {:<8} | tiers: {}",
            r.observed_at.format("%Y-%m-%d %H:%M:%S"),
            r.game_name,
            r.prize_amount,
            fmt_opt(r.ticket_price),
            fmt_opt(r.implied_sales_estimate),
            fmt_opt(r.implied_hourly_sales),
            tiers.join(", "),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::test_support::{at, memory_pool, spawn_fixture_server, test_config, GAME_PAGE};
    use crate::types::{DuplicatePolicy, PrizeObservation, SkipReason};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const GAME: &str = "DIAMONDS AND GOLD";

    fn inserted(outcome: RecordOutcome) -> PrizeObservation {
        match outcome {
            RecordOutcome::Inserted(obs) => obs,
            other => panic!("expected Inserted, got {other:?}"),
        }
    }

    /// The fixture page with a different prize and "As of" stamp.
    fn page_with(prize: &str, stamp: &str) -> String {
        GAME_PAGE
            .replace("Est. $1,234,567", &format!("Est. ${prize}"))
            .replace("As of 5/28/2025 1:29:54 PM", &format!("As of {stamp}"))
    }

    #[tokio::test]
    async fn first_pass_inserts_row_without_estimate() {
        let server = spawn_fixture_server().await;
        let cfg = test_config(&server.url("/game"));
        let recorder = PrizeRecorder::new(memory_pool().await);

        let obs = inserted(run_once(&cfg, &recorder).await.unwrap());
        assert_eq!(obs.game_name, GAME);
        assert_eq!(obs.prize_amount, dec!(1234567));
        assert_eq!(obs.observed_at, at(2025, 5, 28, 13, 29, 54));
        assert_eq!(obs.implied_sales_estimate, None);
        assert_eq!(obs.url, cfg.prize_url);
        assert_eq!(obs.tiers.len(), 6);

        log_recent(&recorder, cfg.recent_limit).await.unwrap();
    }

    #[tokio::test]
    async fn unchanged_page_twice_writes_one_row_under_skip() {
        let server = spawn_fixture_server().await;
        let cfg = test_config(&server.url("/game"));
        let recorder = PrizeRecorder::new(memory_pool().await);

        run_once(&cfg, &recorder).await.unwrap();
        let second = run_once(&cfg, &recorder).await.unwrap();

        assert_eq!(second, RecordOutcome::Skipped(SkipReason::SameTimestamp));
        assert_eq!(recorder.count(GAME).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unchanged_page_twice_writes_two_rows_under_always() {
        let server = spawn_fixture_server().await;
        let mut cfg = test_config(&server.url("/game"));
        cfg.duplicate_policy = DuplicatePolicy::Always;
        let recorder = PrizeRecorder::new(memory_pool().await);

        run_once(&cfg, &recorder).await.unwrap();
        run_once(&cfg, &recorder).await.unwrap();

        let rows = recorder.recent(10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].observed_at, rows[1].observed_at);
        assert_eq!(rows[0].prize_amount, rows[1].prize_amount);
        assert_eq!(rows[0].tiers, rows[1].tiers);
    }

    #[tokio::test]
    async fn changed_page_records_sales_estimate() {
        let server = spawn_fixture_server().await;
        let cfg = test_config(&server.url("/game"));
        let recorder = PrizeRecorder::new(memory_pool().await);

        server.set_page(page_with("1,000,000", "5/28/2025 1:00:00 PM"));
        run_once(&cfg, &recorder).await.unwrap();

        server.set_page(page_with("999,976", "5/28/2025 1:30:00 PM"));
        let obs = inserted(run_once(&cfg, &recorder).await.unwrap());
        assert_eq!(obs.implied_sales_estimate, Some(dec!(10)));
        assert_eq!(obs.implied_hourly_sales, Some(dec!(20)));

        server.set_page(page_with("1,000,500", "5/28/2025 1:31:00 PM"));
        let obs = inserted(run_once(&cfg, &recorder).await.unwrap());
        assert_eq!(obs.implied_sales_estimate, Some(Decimal::ZERO));
    }

    #[tokio::test]
    async fn layout_change_fails_with_parse_error_and_writes_nothing() {
        let server = spawn_fixture_server().await;
        let cfg = test_config(&server.url("/game"));
        let recorder = PrizeRecorder::new(memory_pool().await);

        server.set_page("<html><body><h3>Diamonds and Gold</h3>Down for maintenance</body></html>");
        let err = run_once(&cfg, &recorder).await.unwrap_err();
        assert!(matches!(err, AppError::Parse(_)), "got {err:?}");
        assert!(recorder.recent(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_fails_with_network_error() {
        let server = spawn_fixture_server().await;
        let cfg = test_config(&server.url("/broken"));
        let recorder = PrizeRecorder::new(memory_pool().await);

        let err = run_once(&cfg, &recorder).await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn dry_run_pass_leaves_table_empty() {
        let server = spawn_fixture_server().await;
        let mut cfg = test_config(&server.url("/game"));
        cfg.dry_run = true;
        let recorder = PrizeRecorder::new(memory_pool().await);

        let outcome = run_once(&cfg, &recorder).await.unwrap();
        assert!(matches!(outcome, RecordOutcome::DryRun(_)));
        assert_eq!(recorder.count(GAME).await.unwrap(), 0);
        log_recent(&recorder, 5).await.unwrap();
    }
}
