//! Sleeper Client
//!
//! Read-only access to the Sleeper fantasy API: the NFL player directory,
//! league metadata, rosters, users, weekly matchups and research data.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::SleeperClient;
pub use config::SleeperConfig;
pub use error::SleeperError;
pub use types::{
    LeagueBundle, NflState, SleeperLeague, SleeperMatchup, SleeperPlayer, SleeperPlayers,
    SleeperRoster, SleeperUser,
};
