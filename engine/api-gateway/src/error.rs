//! Response envelopes and error mapping for the REST API

use ranking_service::RankingError;
use serde::Serialize;
use std::convert::Infallible;
use tracing::{error, warn};
use warp::http::StatusCode;
use warp::{Rejection, Reply};

/// Successful response body
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub status: &'static str,
    pub data: T,
    pub timestamp: String,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { status: "success", data, timestamp: chrono::Utc::now().to_rfc3339() }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub error: ErrorDetail,
    pub timestamp: String,
}

/// Error detail
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            status: "error",
            error: ErrorDetail { code: code.to_string(), message: message.into() },
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Service error carried through warp's rejection path
#[derive(Debug)]
pub struct ApiError(pub RankingError);

impl warp::reject::Reject for ApiError {}

impl From<RankingError> for ApiError {
    fn from(err: RankingError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            RankingError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            RankingError::NotFound(_) => StatusCode::NOT_FOUND,
            RankingError::RefreshInProgress(_) => StatusCode::CONFLICT,
            RankingError::SourceUnavailable(_) => StatusCode::BAD_GATEWAY,
            RankingError::StoreFailed(_) | RankingError::Export(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match &self.0 {
            RankingError::InvalidParameter(_) => "INVALID_PARAMETER",
            RankingError::NotFound(_) => "NOT_FOUND",
            RankingError::RefreshInProgress(_) => "REFRESH_IN_PROGRESS",
            RankingError::SourceUnavailable(_) => "SOURCE_UNAVAILABLE",
            RankingError::StoreFailed(_) => "STORE_FAILED",
            RankingError::Export(_) => "EXPORT_FAILED",
        }
    }

    /// Message safe to return to clients; store and export detail stays in the log
    pub fn public_message(&self) -> String {
        match &self.0 {
            RankingError::StoreFailed(_) => "Database operation failed".to_string(),
            RankingError::Export(_) => "Export failed".to_string(),
            RankingError::SourceUnavailable(_) => "Upstream data source unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

/// Reject with a service error
pub fn reject(err: RankingError) -> Rejection {
    warp::reject::custom(ApiError(err))
}

/// Turn every rejection into the error envelope
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, body) = if let Some(api_error) = err.find::<ApiError>() {
        let status = api_error.status();
        if status.is_server_error() || status == StatusCode::BAD_GATEWAY {
            error!("Request failed: {}", api_error.0);
        } else {
            warn!("Request rejected: {}", api_error.0);
        }
        (status, ErrorResponse::new(api_error.code(), api_error.public_message()))
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, ErrorResponse::new("NOT_FOUND", "Route not found"))
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, ErrorResponse::new("INVALID_PARAMETER", e.to_string()))
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, ErrorResponse::new("METHOD_NOT_ALLOWED", "Method not allowed"))
    } else {
        error!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new("INTERNAL_ERROR", "Internal server error"))
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}
