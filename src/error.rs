use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid stored row: {0}")]
    InvalidRow(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn parse(msg: impl Into<String>) -> Self {
        AppError::Parse(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
