//! API Gateway
//!
//! warp routes over the ranking service: KTC refresh/query/cleanup and the
//! cached Sleeper player, league and research endpoints. Every response is
//! wrapped in a `{status, data|error, timestamp}` envelope.

pub mod config;
pub mod error;
pub mod logging;
pub mod rest_api;

pub use config::GatewayConfig;
pub use error::{handle_rejection, ApiError};
pub use rest_api::{create_routes, AppState};
