//! Sleeper API integration

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::{debug, error, info};

use crate::config::SleeperConfig;
use crate::error::{Result, SleeperError};
use crate::types::{
    LeagueBundle, NflState, SleeperLeague, SleeperMatchup, SleeperPlayers, SleeperRoster,
    SleeperUser,
};

/// Sleeper API client
#[derive(Debug, Clone)]
pub struct SleeperClient {
    config: SleeperConfig,
    client: reqwest::Client,
}

impl SleeperClient {
    /// Create a new Sleeper API client
    pub fn new(config: SleeperConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &SleeperConfig {
        &self.config
    }

    /// Get every NFL player Sleeper knows about
    pub async fn get_players(&self) -> Result<SleeperPlayers> {
        let url = format!("{}/players/nfl", self.config.api_base_url);
        let raw: HashMap<String, serde_json::Value> = self.get_json(&url).await?;
        info!("Fetched {} Sleeper player entries", raw.len());

        let players = SleeperPlayers::from_map(raw);
        if players.undecodable > 0 {
            info!("Skipped {} undecodable Sleeper player entries", players.undecodable);
        }
        Ok(players)
    }

    /// Get league information. Sleeper answers `null` for unknown leagues.
    pub async fn get_league(&self, league_id: &str) -> Result<SleeperLeague> {
        let url = format!("{}/league/{}", self.config.api_base_url, league_id);
        let league: Option<SleeperLeague> = self.get_json(&url).await?;
        league.ok_or_else(|| SleeperError::NotFound { resource: format!("league {}", league_id) })
    }

    /// Get league rosters
    pub async fn get_rosters(&self, league_id: &str) -> Result<Vec<SleeperRoster>> {
        let url = format!("{}/league/{}/rosters", self.config.api_base_url, league_id);
        let rosters: Option<Vec<SleeperRoster>> = self.get_json(&url).await?;
        Ok(rosters.unwrap_or_default())
    }

    /// Get league users
    pub async fn get_users(&self, league_id: &str) -> Result<Vec<SleeperUser>> {
        let url = format!("{}/league/{}/users", self.config.api_base_url, league_id);
        let users: Option<Vec<SleeperUser>> = self.get_json(&url).await?;
        Ok(users.unwrap_or_default())
    }

    /// Get league info, rosters and users in one go
    pub async fn get_league_bundle(&self, league_id: &str) -> Result<LeagueBundle> {
        let league = self.get_league(league_id).await?;
        let (rosters, users) = tokio::join!(self.get_rosters(league_id), self.get_users(league_id));
        Ok(LeagueBundle { league, rosters: rosters?, users: users? })
    }

    /// Get matchups for a specific week
    pub async fn get_matchups(&self, league_id: &str, week: u32) -> Result<Vec<SleeperMatchup>> {
        let url = format!("{}/league/{}/matchups/{}", self.config.api_base_url, league_id, week);
        let matchups: Option<Vec<SleeperMatchup>> = self.get_json(&url).await?;
        Ok(matchups.unwrap_or_default())
    }

    /// Get per-player research data for a regular-season week
    pub async fn get_research(
        &self,
        season: &str,
        week: u32,
        league_type: u32,
    ) -> Result<HashMap<String, serde_json::Value>> {
        let url = format!(
            "{}/players/nfl/research/regular/{}/{}?league_type={}",
            self.config.research_base_url, season, week, league_type
        );
        let research: Option<HashMap<String, serde_json::Value>> = self.get_json(&url).await?;
        Ok(research.unwrap_or_default())
    }

    /// Get current NFL state
    pub async fn get_nfl_state(&self) -> Result<NflState> {
        let url = format!("{}/state/nfl", self.config.api_base_url);
        self.get_json(&url).await
    }

    /// Check if the Sleeper API is reachable
    pub async fn health_check(&self) -> bool {
        self.get_nfl_state().await.is_ok()
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SleeperError::NotFound { resource: url.to_string() });
        }
        if !status.is_success() {
            error!("Sleeper API error: {} for {}", status, url);
            return Err(SleeperError::Status { status: status.as_u16(), url: url.to_string() });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_uses_configured_urls() {
        let config = SleeperConfig {
            api_base_url: "http://localhost:9".to_string(),
            research_base_url: "http://localhost:9".to_string(),
            timeout_secs: 1,
        };
        let client = SleeperClient::new(config).unwrap();
        assert_eq!(client.config().api_base_url, "http://localhost:9");
    }

    #[tokio::test]
    async fn test_unreachable_api_is_http_error() {
        let config = SleeperConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            research_base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
        };
        let client = SleeperClient::new(config).unwrap();
        let err = client.get_league("123").await.unwrap_err();
        assert!(matches!(err, SleeperError::Http(_)));
    }
}
