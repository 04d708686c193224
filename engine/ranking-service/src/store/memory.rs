//! In-process cache store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

use super::{
    profile_key, sort_rankings, BatchKeys, LeagueStore, ProfileStore, RankingStore,
    ReplaceOutcome, UpsertOutcome,
};
use crate::error::{RankingError, Result};
use crate::model::{
    ConfigurationCount, LeagueSnapshot, PlayerProfile, RankedPlayer, RankingConfiguration,
    ResearchSnapshot, RowKey, WeeklyStatSnapshot,
};

#[derive(Debug, Default)]
struct Partition {
    rows: HashMap<RowKey, RankedPlayer>,
    last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    rankings: HashMap<RankingConfiguration, Partition>,
    profiles: HashMap<String, PlayerProfile>,
    leagues: HashMap<String, LeagueSnapshot>,
    matchups: HashMap<(String, String, u32), WeeklyStatSnapshot>,
    research: HashMap<(String, u32, u32), ResearchSnapshot>,
}

/// Cache store held in memory. Each write stages its rows before touching
/// shared state, so a failed batch leaves the previous contents in place.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn stage(players: &[RankedPlayer]) -> Result<Vec<(RowKey, RankedPlayer)>> {
    let mut keys = BatchKeys::default();
    players
        .iter()
        .map(|player| Ok((keys.check(player)?, player.clone())))
        .collect()
}

#[async_trait]
impl RankingStore for MemoryStore {
    async fn upsert(
        &self,
        configuration: &RankingConfiguration,
        players: &[RankedPlayer],
    ) -> Result<UpsertOutcome> {
        let staged = stage(players)?;

        let mut state = self.state.write();
        let partition = state.rankings.entry(*configuration).or_default();
        let mut outcome = UpsertOutcome::default();
        for (key, player) in staged {
            if partition.rows.insert(key, player).is_some() {
                outcome.updated += 1;
            } else {
                outcome.created += 1;
            }
        }
        partition.last_updated = Some(Utc::now());
        Ok(outcome)
    }

    async fn replace(
        &self,
        configuration: &RankingConfiguration,
        players: &[RankedPlayer],
    ) -> Result<ReplaceOutcome> {
        let staged = stage(players)?;
        let inserted = staged.len();

        let mut state = self.state.write();
        let previous = state.rankings.insert(
            *configuration,
            Partition { rows: staged.into_iter().collect(), last_updated: Some(Utc::now()) },
        );
        let deleted = previous.map(|p| p.rows.len()).unwrap_or(0);
        Ok(ReplaceOutcome { deleted, inserted })
    }

    async fn query(&self, configuration: &RankingConfiguration) -> Result<Vec<RankedPlayer>> {
        let state = self.state.read();
        let mut players: Vec<RankedPlayer> = state
            .rankings
            .get(configuration)
            .map(|p| p.rows.values().cloned().collect())
            .unwrap_or_default();
        sort_rankings(&mut players);
        Ok(players)
    }

    async fn delete(&self, configuration: &RankingConfiguration) -> Result<u64> {
        let removed = self.state.write().rankings.remove(configuration);
        Ok(removed.map(|p| p.rows.len() as u64).unwrap_or(0))
    }

    async fn last_updated(
        &self,
        configuration: &RankingConfiguration,
    ) -> Result<Option<DateTime<Utc>>> {
        Ok(self.state.read().rankings.get(configuration).and_then(|p| p.last_updated))
    }

    async fn configuration_counts(&self) -> Result<Vec<ConfigurationCount>> {
        let state = self.state.read();
        let mut counts: Vec<ConfigurationCount> = state
            .rankings
            .iter()
            .filter(|(_, partition)| !partition.rows.is_empty())
            .map(|(configuration, partition)| ConfigurationCount {
                configuration: *configuration,
                key: configuration.key(),
                players: partition.rows.len() as i64,
                last_updated: partition.last_updated,
            })
            .collect();
        counts.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(counts)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn upsert_profiles(&self, profiles: &[PlayerProfile]) -> Result<UpsertOutcome> {
        let mut staged: HashMap<String, PlayerProfile> = HashMap::with_capacity(profiles.len());
        for profile in profiles {
            let id = profile_key(profile)?;
            if staged.insert(id.to_string(), profile.clone()).is_some() {
                return Err(RankingError::StoreFailed(format!(
                    "duplicate platform id {} in batch",
                    id
                )));
            }
        }

        let mut state = self.state.write();
        let mut outcome = UpsertOutcome::default();
        for (id, profile) in staged {
            if state.profiles.insert(id, profile).is_some() {
                outcome.updated += 1;
            } else {
                outcome.created += 1;
            }
        }
        Ok(outcome)
    }

    async fn profiles(&self) -> Result<Vec<PlayerProfile>> {
        let mut profiles: Vec<PlayerProfile> = self.state.read().profiles.values().cloned().collect();
        profiles.sort_by(|a, b| {
            a.identity
                .name
                .cmp(&b.identity.name)
                .then_with(|| a.platform_player_id.cmp(&b.platform_player_id))
        });
        Ok(profiles)
    }
}

#[async_trait]
impl LeagueStore for MemoryStore {
    async fn save_league(&self, snapshot: &LeagueSnapshot) -> Result<()> {
        self.state.write().leagues.insert(snapshot.league_id.clone(), snapshot.clone());
        Ok(())
    }

    async fn league(&self, league_id: &str) -> Result<Option<LeagueSnapshot>> {
        Ok(self.state.read().leagues.get(league_id).cloned())
    }

    async fn save_matchups(&self, snapshot: &WeeklyStatSnapshot) -> Result<()> {
        let key = (snapshot.league_id.clone(), snapshot.season.clone(), snapshot.week);
        self.state.write().matchups.insert(key, snapshot.clone());
        Ok(())
    }

    async fn matchups(
        &self,
        league_id: &str,
        season: &str,
        week: u32,
    ) -> Result<Option<WeeklyStatSnapshot>> {
        let key = (league_id.to_string(), season.to_string(), week);
        Ok(self.state.read().matchups.get(&key).cloned())
    }

    async fn save_research(&self, snapshot: &ResearchSnapshot) -> Result<()> {
        let key = (snapshot.season.clone(), snapshot.week, snapshot.league_type);
        self.state.write().research.insert(key, snapshot.clone());
        Ok(())
    }

    async fn research(
        &self,
        season: &str,
        week: u32,
        league_type: u32,
    ) -> Result<Option<ResearchSnapshot>> {
        Ok(self.state.read().research.get(&(season.to_string(), week, league_type)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PlayerIdentity, Position, RankingSnapshot};

    fn config() -> RankingConfiguration {
        RankingConfiguration::from_params(Some("1qb"), Some("false"), None).unwrap()
    }

    fn player(name: &str, rank: i32) -> RankedPlayer {
        RankedPlayer {
            identity: PlayerIdentity::new(name, Position::WR, Some("DET".into())),
            snapshot: RankingSnapshot {
                value: 9000 - rank,
                overall_rank: rank,
                positional_rank: Some(rank),
                overall_tier: Some(1),
                positional_tier: Some(1),
                overall_trend: None,
            },
            ktc_player_id: None,
            age: None,
            rookie: false,
        }
    }

    #[tokio::test]
    async fn test_query_orders_by_rank_then_name() {
        let store = MemoryStore::new();
        store
            .replace(&config(), &[player("Zay Flowers", 3), player("Amon-Ra St. Brown", 3), player("CeeDee Lamb", 1)])
            .await
            .unwrap();

        let names: Vec<String> =
            store.query(&config()).await.unwrap().into_iter().map(|p| p.identity.name).collect();
        assert_eq!(names, vec!["CeeDee Lamb", "Amon-Ra St. Brown", "Zay Flowers"]);
    }

    #[tokio::test]
    async fn test_upsert_counts_and_idempotence() {
        let store = MemoryStore::new();
        let batch = vec![player("A", 1), player("B", 2)];

        let first = store.upsert(&config(), &batch).await.unwrap();
        assert_eq!(first, UpsertOutcome { created: 2, updated: 0 });
        let once = store.query(&config()).await.unwrap();

        let second = store.upsert(&config(), &batch).await.unwrap();
        assert_eq!(second, UpsertOutcome { created: 0, updated: 2 });
        assert_eq!(store.query(&config()).await.unwrap(), once);
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_prior_rows() {
        let store = MemoryStore::new();
        store.replace(&config(), &[player("Old", 1)]).await.unwrap();

        let err = store
            .replace(&config(), &[player("New", 1), player("New", 2)])
            .await
            .unwrap_err();
        assert!(matches!(err, RankingError::StoreFailed(_)));

        let rows = store.query(&config()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].identity.name, "Old");
    }

    #[tokio::test]
    async fn test_delete_missing_configuration() {
        let store = MemoryStore::new();
        assert_eq!(store.delete(&config()).await.unwrap(), 0);
        store.upsert(&config(), &[player("A", 1)]).await.unwrap();
        assert_eq!(store.delete(&config()).await.unwrap(), 1);
        assert!(store.query(&config()).await.unwrap().is_empty());
    }
}
