//! Error types for the ranking service

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RankingError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Store failed: {0}")]
    StoreFailed(String),

    #[error("Refresh already in progress for {0}")]
    RefreshInProgress(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Export failed: {0}")]
    Export(String),
}

/// Per-record failure while normalizing; the record is skipped and the batch continues
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Unknown position: {0}")]
    UnknownPosition(String),
}

impl From<sqlx::Error> for RankingError {
    fn from(err: sqlx::Error) -> Self {
        RankingError::StoreFailed(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for RankingError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        RankingError::StoreFailed(format!("migration failed: {}", err))
    }
}

impl From<ktc_scraper::ScraperError> for RankingError {
    fn from(err: ktc_scraper::ScraperError) -> Self {
        RankingError::SourceUnavailable(format!("KTC: {}", err))
    }
}

impl From<sleeper_client::SleeperError> for RankingError {
    fn from(err: sleeper_client::SleeperError) -> Self {
        match err {
            sleeper_client::SleeperError::NotFound { resource } => RankingError::NotFound(resource),
            other => RankingError::SourceUnavailable(format!("Sleeper: {}", other)),
        }
    }
}

pub type Result<T> = std::result::Result<T, RankingError>;
