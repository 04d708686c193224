//! KTC Scraper
//!
//! Fetches KeepTradeCut dynasty and redraft ranking pages and decodes the
//! `playersArray` embedded in them into typed records.

pub mod error;
pub mod scraper;
pub mod types;

pub use error::ScraperError;
pub use crate::scraper::{extract_players_array, KtcScraper, DYNASTY_URL, FANTASY_URL};
pub use types::{KtcPlayer, KtcRankings, KtcTepValues, KtcValues, RankingPage};
