//! Error types for the Sleeper client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SleeperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sleeper API error: {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Sleeper resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Failed to decode Sleeper response: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SleeperError>;
