mod config;
mod db;
mod error;
mod estimator;
mod extractor;
mod fetcher;
mod pass;
mod types;

#[cfg(test)]
mod test_support;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::db::PrizeRecorder;
use crate::error::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    info!(
        "Starting live prize scraper (policy: {}, dry run: {})",
        cfg.duplicate_policy, cfg.dry_run
    );

    let pool = db::open(&cfg.database_url).await?;
    let recorder = PrizeRecorder::new(pool.clone());

    pass::run_once(&cfg, &recorder).await?;
    pass::log_recent(&recorder, cfg.recent_limit).await?;

    pool.close().await;
    info!("Scraping complete");
    Ok(())
}
