//! Error types for the KTC scraper

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("KTC returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Could not find playersArray in page source")]
    MissingPlayersArray,

    #[error("Failed to parse playersArray: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid selector: {0}")]
    Selector(String),
}

pub type Result<T> = std::result::Result<T, ScraperError>;
