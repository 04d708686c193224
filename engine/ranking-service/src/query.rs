//! Read path over the cache. Never triggers a refresh.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::merge::merge;
use crate::model::{ConfigurationCount, MatchKey, MergedPlayer, RankedPlayer, RankingConfiguration};
use crate::store::CacheStore;

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_rankings: i64,
    pub configurations: Vec<ConfigurationCount>,
}

#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn CacheStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Cached rows for a configuration in rank order; empty if never refreshed
    pub async fn rankings(&self, configuration: &RankingConfiguration) -> Result<Vec<RankedPlayer>> {
        self.store.query(configuration).await
    }

    /// Cached rankings joined with cached profiles. Each player also carries
    /// its snapshots from the other cached configurations of the same league
    /// format, so a redraft read shows the dynasty values alongside.
    pub async fn players(&self, configuration: &RankingConfiguration) -> Result<Vec<MergedPlayer>> {
        let rankings = self.store.query(configuration).await?;
        let profiles = self.store.profiles().await?;
        let mut players = merge(&profiles, &rankings, configuration).players;

        for sibling in configuration.siblings() {
            let rows = self.store.query(&sibling).await?;
            if rows.is_empty() {
                continue;
            }
            let mut by_key: HashMap<MatchKey, &RankedPlayer> = HashMap::with_capacity(rows.len());
            for row in &rows {
                by_key.entry(row.identity.match_key()).or_insert(row);
            }
            let mut attached = 0;
            for player in players.iter_mut() {
                if let Some(row) = by_key.get(&player.match_key()) {
                    player.attach_ranking(row, &sibling);
                    attached += 1;
                }
            }
            debug!("Attached {} snapshots from {} to {} players", attached, sibling, configuration);
        }

        Ok(players)
    }

    pub async fn last_updated(
        &self,
        configuration: &RankingConfiguration,
    ) -> Result<Option<DateTime<Utc>>> {
        self.store.last_updated(configuration).await
    }

    pub async fn stats(&self) -> Result<CacheStats> {
        let configurations = self.store.configuration_counts().await?;
        let total_rankings = configurations.iter().map(|c| c.players).sum();
        Ok(CacheStats { total_rankings, configurations })
    }

    pub async fn health_check(&self) -> Result<()> {
        self.store.health_check().await
    }
}
