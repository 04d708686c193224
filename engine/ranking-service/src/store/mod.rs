//! Cache storage
//!
//! Three traits cover the cached data: ranking snapshots partitioned by
//! configuration, platform profiles, and league data (leagues, weekly
//! matchups, research). `PgStore` persists to PostgreSQL; `MemoryStore`
//! keeps everything in process with the same semantics.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

use crate::error::{RankingError, Result};
use crate::model::{
    ConfigurationCount, LeagueSnapshot, PlayerProfile, RankedPlayer, RankingConfiguration,
    ResearchSnapshot, RowKey, WeeklyStatSnapshot,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertOutcome {
    pub created: usize,
    pub updated: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplaceOutcome {
    pub deleted: usize,
    pub inserted: usize,
}

/// Ranking snapshots, one partition per configuration.
///
/// Rows are keyed by (matching name, position, team) within a partition.
/// A write whose batch repeats a key fails as a whole and leaves the
/// partition untouched.
#[async_trait]
pub trait RankingStore: Send + Sync {
    /// Insert new rows and overwrite existing ones; rows not in the batch stay
    async fn upsert(
        &self,
        configuration: &RankingConfiguration,
        players: &[RankedPlayer],
    ) -> Result<UpsertOutcome>;

    /// Delete the partition and insert the batch in a single transaction
    async fn replace(
        &self,
        configuration: &RankingConfiguration,
        players: &[RankedPlayer],
    ) -> Result<ReplaceOutcome>;

    /// Rows ordered by overall rank, ties broken by name
    async fn query(&self, configuration: &RankingConfiguration) -> Result<Vec<RankedPlayer>>;

    async fn delete(&self, configuration: &RankingConfiguration) -> Result<u64>;

    async fn last_updated(
        &self,
        configuration: &RankingConfiguration,
    ) -> Result<Option<DateTime<Utc>>>;

    async fn configuration_counts(&self) -> Result<Vec<ConfigurationCount>>;

    async fn health_check(&self) -> Result<()>;
}

/// Platform profiles keyed by platform player id
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn upsert_profiles(&self, profiles: &[PlayerProfile]) -> Result<UpsertOutcome>;

    async fn profiles(&self) -> Result<Vec<PlayerProfile>>;
}

#[async_trait]
pub trait LeagueStore: Send + Sync {
    /// Upsert the league and replace its rosters and users
    async fn save_league(&self, snapshot: &LeagueSnapshot) -> Result<()>;

    async fn league(&self, league_id: &str) -> Result<Option<LeagueSnapshot>>;

    /// Replace the matchups cached for (league, season, week)
    async fn save_matchups(&self, snapshot: &WeeklyStatSnapshot) -> Result<()>;

    async fn matchups(
        &self,
        league_id: &str,
        season: &str,
        week: u32,
    ) -> Result<Option<WeeklyStatSnapshot>>;

    /// Replace the research cached for (season, week, league type)
    async fn save_research(&self, snapshot: &ResearchSnapshot) -> Result<()>;

    async fn research(
        &self,
        season: &str,
        week: u32,
        league_type: u32,
    ) -> Result<Option<ResearchSnapshot>>;
}

/// Everything the services need from one backend
pub trait CacheStore: RankingStore + ProfileStore + LeagueStore {}

impl<T: RankingStore + ProfileStore + LeagueStore> CacheStore for T {}

/// Ordering shared by every backend's `query`
pub(crate) fn sort_rankings(players: &mut [RankedPlayer]) {
    players.sort_by(|a, b| {
        a.snapshot
            .overall_rank
            .cmp(&b.snapshot.overall_rank)
            .then_with(|| a.identity.name.cmp(&b.identity.name))
    });
}

/// Tracks row keys while a batch is written; a repeat aborts the write
#[derive(Debug, Default)]
pub(crate) struct BatchKeys {
    seen: HashSet<RowKey>,
}

impl BatchKeys {
    pub(crate) fn check(&mut self, player: &RankedPlayer) -> Result<RowKey> {
        let key = player.identity.row_key();
        if !self.seen.insert(key.clone()) {
            return Err(RankingError::StoreFailed(format!(
                "duplicate row key {} ({}, {}) in batch",
                player.identity.name,
                player.identity.position,
                player.identity.team.as_deref().unwrap_or("-")
            )));
        }
        Ok(key)
    }
}

pub(crate) fn profile_key(profile: &PlayerProfile) -> Result<&str> {
    profile.platform_player_id.as_deref().ok_or_else(|| {
        RankingError::StoreFailed(format!("profile {} has no platform id", profile.identity.name))
    })
}
