use std::time::Duration;

use tracing::{debug, info};

use crate::config::{Config, USER_AGENT};
use crate::error::Result;

/// Fetch the game page body as text.
/// Any transport failure or non-2xx status is a `Network` error; the next
/// scheduled run is the retry.
pub async fn fetch_page(cfg: &Config) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.http_timeout_secs))
        .user_agent(USER_AGENT)
        .build()?;

    info!("Fetching {}", cfg.prize_url);
    let resp = client.get(&cfg.prize_url).send().await?.error_for_status()?;
    let status = resp.status();
    let body = resp.text().await?;
    debug!(status = %status, bytes = body.len(), "page fetched");

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::test_support::{spawn_fixture_server, test_config, GAME_PAGE};

    #[tokio::test]
    async fn returns_body_on_success() {
        let server = spawn_fixture_server().await;
        let cfg = test_config(&server.url("/game"));

        let body = fetch_page(&cfg).await.unwrap();
        assert_eq!(body, GAME_PAGE);
    }

    #[tokio::test]
    async fn sends_browser_user_agent() {
        let server = spawn_fixture_server().await;
        let cfg = test_config(&server.url("/echo-agent"));

        let body = fetch_page(&cfg).await.unwrap();
        assert_eq!(body, USER_AGENT);
    }

    #[tokio::test]
    async fn server_error_is_network_error() {
        let server = spawn_fixture_server().await;
        let cfg = test_config(&server.url("/broken"));

        let err = fetch_page(&cfg).await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        // Port 9 on loopback is the discard port and is not served here.
        let cfg = test_config("http://127.0.0.1:9/game");

        let err = fetch_page(&cfg).await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)), "got {err:?}");
    }
}
