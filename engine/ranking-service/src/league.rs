//! League, matchup and research caching

use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::error::{RankingError, Result};
use crate::model::{LeagueSnapshot, ResearchSnapshot, WeeklyStatSnapshot};
use crate::source::LeagueSource;
use crate::store::CacheStore;

pub const MAX_WEEK: u32 = 18;

/// Default research league type (dynasty)
pub const DEFAULT_RESEARCH_LEAGUE_TYPE: u32 = 2;

fn validate_week(week: u32) -> Result<()> {
    if week == 0 || week > MAX_WEEK {
        return Err(RankingError::InvalidParameter(format!(
            "week must be between 1 and {}, got {}",
            MAX_WEEK, week
        )));
    }
    Ok(())
}

fn validate_season(season: &str) -> Result<()> {
    if season.len() != 4 || !season.chars().all(|c| c.is_ascii_digit()) {
        return Err(RankingError::InvalidParameter(format!(
            "season must be a four digit year, got '{}'",
            season
        )));
    }
    Ok(())
}

pub struct LeagueSync {
    store: Arc<dyn CacheStore>,
    source: Arc<dyn LeagueSource>,
}

impl LeagueSync {
    pub fn new(store: Arc<dyn CacheStore>, source: Arc<dyn LeagueSource>) -> Self {
        Self { store, source }
    }

    /// Liveness of the league source; the cache is not consulted
    pub async fn source_reachable(&self) -> bool {
        self.source.is_reachable().await
    }

    /// Fetch league info, rosters and users and cache them together
    pub async fn refresh_league(&self, league_id: &str) -> Result<LeagueSnapshot> {
        let bundle = self.source.fetch_league(league_id).await?;
        let snapshot = LeagueSnapshot {
            league_id: league_id.to_string(),
            league: bundle.league,
            rosters: bundle.rosters,
            users: bundle.users,
            last_updated: Utc::now(),
        };
        self.store.save_league(&snapshot).await?;
        info!(
            "Cached league {} ({} rosters, {} users)",
            league_id,
            snapshot.rosters.len(),
            snapshot.users.len()
        );
        Ok(snapshot)
    }

    pub async fn league(&self, league_id: &str) -> Result<LeagueSnapshot> {
        self.store
            .league(league_id)
            .await?
            .ok_or_else(|| RankingError::NotFound(format!("league {} is not cached", league_id)))
    }

    pub async fn refresh_matchups(
        &self,
        league_id: &str,
        season: &str,
        week: u32,
    ) -> Result<WeeklyStatSnapshot> {
        validate_season(season)?;
        validate_week(week)?;

        let matchups = self.source.fetch_matchups(league_id, week).await?;
        let snapshot = WeeklyStatSnapshot {
            league_id: league_id.to_string(),
            season: season.to_string(),
            week,
            matchups,
            last_updated: Utc::now(),
        };
        self.store.save_matchups(&snapshot).await?;
        info!(
            "Cached {} matchups for league {} week {} of {}",
            snapshot.matchups.len(),
            league_id,
            week,
            season
        );
        Ok(snapshot)
    }

    pub async fn matchups(&self, league_id: &str, season: &str, week: u32) -> Result<WeeklyStatSnapshot> {
        validate_season(season)?;
        validate_week(week)?;
        self.store.matchups(league_id, season, week).await?.ok_or_else(|| {
            RankingError::NotFound(format!(
                "no matchups cached for league {} week {} of {}",
                league_id, week, season
            ))
        })
    }

    pub async fn refresh_research(
        &self,
        season: &str,
        week: u32,
        league_type: u32,
    ) -> Result<ResearchSnapshot> {
        validate_season(season)?;
        validate_week(week)?;

        let players = self.source.fetch_research(season, week, league_type).await?;
        let snapshot = ResearchSnapshot {
            season: season.to_string(),
            week,
            league_type,
            players,
            last_updated: Utc::now(),
        };
        self.store.save_research(&snapshot).await?;
        info!(
            "Cached research for {} players ({} week {}, league type {})",
            snapshot.players.len(),
            season,
            week,
            league_type
        );
        Ok(snapshot)
    }

    pub async fn research(&self, season: &str, week: u32, league_type: u32) -> Result<ResearchSnapshot> {
        validate_season(season)?;
        validate_week(week)?;
        self.store.research(season, week, league_type).await?.ok_or_else(|| {
            RankingError::NotFound(format!(
                "no research cached for {} week {} (league type {})",
                season, week, league_type
            ))
        })
    }
}
