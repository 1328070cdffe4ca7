//! Fixtures shared by the unit tests: a captured game page, an in-memory
//! database with the real schema, and a local HTTP server that serves pages.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::get;
use axum::Router;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::types::{DuplicatePolicy, GameProperties};
use rust_decimal_macros::dec;

pub const GAME_PAGE: &str = include_str!("../fixtures/game_page.html");

pub fn at(year: i32, month: u32, day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

pub async fn memory_pool() -> SqlitePool {
    crate::db::open("sqlite::memory:").await.unwrap()
}

pub fn test_config(prize_url: &str) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        prize_url: prize_url.to_string(),
        log_level: "debug".to_string(),
        game: GameProperties {
            ticket_contribution: dec!(2.4),
            ticket_price: dec!(30),
        },
        duplicate_policy: DuplicatePolicy::Skip,
        dry_run: false,
        recent_limit: 5,
        http_timeout_secs: 5,
    }
}

/// Serves `/game` (swappable body), `/echo-agent` and `/broken` on 127.0.0.1.
pub struct FixtureServer {
    base: String,
    page: Arc<Mutex<String>>,
}

impl FixtureServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    pub fn set_page(&self, body: impl Into<String>) {
        *self.page.lock().unwrap() = body.into();
    }
}

pub async fn spawn_fixture_server() -> FixtureServer {
    let page = Arc::new(Mutex::new(GAME_PAGE.to_string()));

    let app = Router::new()
        .route(
            "/game",
            get(|State(page): State<Arc<Mutex<String>>>| async move {
                let body = page.lock().unwrap().clone();
                body
            }),
        )
        .route(
            "/echo-agent",
            get(|headers: HeaderMap| async move {
                headers
                    .get(header::USER_AGENT)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            }),
        )
        .route(
            "/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream down") }),
        )
        .with_state(Arc::clone(&page));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    FixtureServer {
        base: format!("http://{addr}"),
        page,
    }
}
