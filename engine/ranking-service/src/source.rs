//! Seams over the external data sources

use async_trait::async_trait;
use std::collections::HashMap;

use ktc_scraper::{KtcRankings, KtcScraper, RankingPage};
use sleeper_client::{LeagueBundle, SleeperClient, SleeperMatchup, SleeperPlayer};

use crate::error::Result;
use crate::model::RankingConfiguration;

/// Raw ranking records for a configuration
#[async_trait]
pub trait RankingSource: Send + Sync {
    async fn fetch_rankings(&self, configuration: &RankingConfiguration) -> Result<KtcRankings>;
}

/// Raw platform player directory
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profiles(&self) -> Result<Vec<SleeperPlayer>>;
}

#[async_trait]
pub trait LeagueSource: Send + Sync {
    async fn fetch_league(&self, league_id: &str) -> Result<LeagueBundle>;

    async fn fetch_matchups(&self, league_id: &str, week: u32) -> Result<Vec<SleeperMatchup>>;

    async fn fetch_research(
        &self,
        season: &str,
        week: u32,
        league_type: u32,
    ) -> Result<HashMap<String, serde_json::Value>>;

    /// Whether the platform API answers at all
    async fn is_reachable(&self) -> bool;
}

#[async_trait]
impl RankingSource for KtcScraper {
    async fn fetch_rankings(&self, configuration: &RankingConfiguration) -> Result<KtcRankings> {
        let page = RankingPage::from_redraft(configuration.is_redraft());
        Ok(self.scrape_rankings(page).await?)
    }
}

#[async_trait]
impl ProfileSource for SleeperClient {
    async fn fetch_profiles(&self) -> Result<Vec<SleeperPlayer>> {
        Ok(self.get_players().await?.players)
    }
}

#[async_trait]
impl LeagueSource for SleeperClient {
    async fn fetch_league(&self, league_id: &str) -> Result<LeagueBundle> {
        Ok(self.get_league_bundle(league_id).await?)
    }

    async fn fetch_matchups(&self, league_id: &str, week: u32) -> Result<Vec<SleeperMatchup>> {
        Ok(self.get_matchups(league_id, week).await?)
    }

    async fn fetch_research(
        &self,
        season: &str,
        week: u32,
        league_type: u32,
    ) -> Result<HashMap<String, serde_json::Value>> {
        Ok(self.get_research(season, week, league_type).await?)
    }

    async fn is_reachable(&self) -> bool {
        SleeperClient::health_check(self).await
    }
}
