//! Refresh orchestration: fetch, normalize, merge, store

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::{RankingError, Result};
use crate::export::JsonExporter;
use crate::locks::RefreshLocks;
use crate::merge::merge;
use crate::model::{MergedPlayer, RankedPlayer, RankingConfiguration};
use crate::normalizer::{normalize_profiles, normalize_rankings};
use crate::source::{ProfileSource, RankingSource};
use crate::store::CacheStore;

const PROFILE_LOCK_KEY: &str = "sleeper_profiles";

/// How a refresh writes its configuration's partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Drop the partition and insert the new set
    Replace,
    /// Insert or overwrite row by row, keeping rows not in the new set
    Upsert,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub configuration: RankingConfiguration,
    pub mode: WriteMode,
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub deleted: usize,
    pub duplicates: usize,
    pub elapsed_ms: u64,
    pub export_path: Option<String>,
    pub players: Vec<MergedPlayer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileRefreshReport {
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub inactive: usize,
    pub elapsed_ms: u64,
}

/// Runs refreshes; one in flight per configuration
pub struct RefreshOrchestrator {
    store: Arc<dyn CacheStore>,
    rankings: Arc<dyn RankingSource>,
    profiles: Arc<dyn ProfileSource>,
    exporter: Option<JsonExporter>,
    locks: RefreshLocks,
}

impl RefreshOrchestrator {
    pub fn new(
        store: Arc<dyn CacheStore>,
        rankings: Arc<dyn RankingSource>,
        profiles: Arc<dyn ProfileSource>,
    ) -> Self {
        Self { store, rankings, profiles, exporter: None, locks: RefreshLocks::new() }
    }

    /// Write every successful ranking refresh to a JSON file
    pub fn with_exporter(mut self, exporter: JsonExporter) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub fn is_refreshing(&self, configuration: &RankingConfiguration) -> bool {
        self.locks.is_locked(&configuration.key())
    }

    /// Refresh one configuration.
    ///
    /// A source failure writes nothing. A store failure leaves the previous
    /// partition in place. A second refresh of the same configuration while
    /// this one runs fails with `RefreshInProgress`.
    pub async fn refresh(
        &self,
        configuration: &RankingConfiguration,
        mode: WriteMode,
    ) -> Result<RefreshReport> {
        let _guard = self.locks.try_acquire(&configuration.key())?;
        let started = Instant::now();

        info!("Refreshing {} ({:?}): fetching rankings", configuration, mode);
        let raw = self.rankings.fetch_rankings(configuration).await?;
        let fetched = raw.players.len() + raw.undecodable;

        let normalized = normalize_rankings(&raw.players, configuration);
        let (players, duplicates) = dedup_first_wins(normalized.records);
        let skipped = raw.undecodable + normalized.skipped + duplicates;
        info!(
            "Normalized {} of {} records for {} ({} skipped, {} duplicates)",
            players.len(),
            fetched,
            configuration,
            skipped,
            duplicates
        );
        if players.is_empty() {
            warn!("No usable rankings for {}, keeping cached rows", configuration);
            return Err(RankingError::SourceUnavailable(format!(
                "KTC returned no usable players for {} ({} fetched, {} skipped)",
                configuration, fetched, skipped
            )));
        }

        let profiles = match self.store.profiles().await {
            Ok(profiles) => profiles,
            Err(e) => {
                warn!("Could not load profiles for merge, continuing without: {}", e);
                Vec::new()
            }
        };
        let merged = merge(&profiles, &players, configuration);
        info!(
            "Merged {} ranked players with profiles ({} matched, {} unmatched)",
            players.len(),
            merged.matched,
            merged.unmatched_rankings
        );

        let (created, updated, deleted) = match mode {
            WriteMode::Replace => {
                let outcome = self.store.replace(configuration, &players).await?;
                (outcome.inserted, 0, outcome.deleted)
            }
            WriteMode::Upsert => {
                let outcome = self.store.upsert(configuration, &players).await?;
                (outcome.created, outcome.updated, 0)
            }
        };

        // Only ranked players belong in the refresh result
        let ranked: Vec<MergedPlayer> =
            merged.players.into_iter().filter(|p| !p.rankings.is_empty()).collect();

        let export_path = match &self.exporter {
            Some(exporter) => match exporter.export(configuration, &ranked).await {
                Ok(path) => Some(path.display().to_string()),
                Err(e) => {
                    warn!("Refresh export failed: {}", e);
                    None
                }
            },
            None => None,
        };

        let report = RefreshReport {
            configuration: *configuration,
            mode,
            fetched,
            created,
            updated,
            skipped,
            deleted,
            duplicates,
            elapsed_ms: started.elapsed().as_millis() as u64,
            export_path,
            players: ranked,
        };
        info!(
            "Refresh of {} completed: created={} updated={} skipped={} deleted={} in {}ms",
            configuration, report.created, report.updated, report.skipped, report.deleted, report.elapsed_ms
        );
        Ok(report)
    }

    /// Drop every cached row for a configuration. Holds the configuration's
    /// refresh lock, so it fails with `RefreshInProgress` during a refresh.
    pub async fn cleanup(&self, configuration: &RankingConfiguration) -> Result<u64> {
        let _guard = self.locks.try_acquire(&configuration.key())?;
        let deleted = self.store.delete(configuration).await?;
        info!("Cleaned up {} rows for {}", deleted, configuration);
        Ok(deleted)
    }

    /// Refresh the platform player directory; inactive players are not stored
    pub async fn refresh_profiles(&self) -> Result<ProfileRefreshReport> {
        let _guard = self.locks.try_acquire(PROFILE_LOCK_KEY)?;
        let started = Instant::now();

        info!("Refreshing Sleeper profiles: fetching players");
        let raw = self.profiles.fetch_profiles().await?;
        let fetched = raw.len();

        let (active, inactive): (Vec<_>, Vec<_>) =
            raw.iter().partition(|player| player.active.unwrap_or(false));
        let normalized = normalize_profiles(active);
        info!(
            "Normalized {} profiles ({} skipped, {} inactive)",
            normalized.records.len(),
            normalized.skipped,
            inactive.len()
        );

        let outcome = self.store.upsert_profiles(&normalized.records).await?;
        let report = ProfileRefreshReport {
            fetched,
            created: outcome.created,
            updated: outcome.updated,
            skipped: normalized.skipped,
            inactive: inactive.len(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            "Profile refresh completed: created={} updated={} in {}ms",
            report.created, report.updated, report.elapsed_ms
        );
        Ok(report)
    }
}

/// Keep the first record per row key; later ones are dropped and counted
fn dedup_first_wins(players: Vec<RankedPlayer>) -> (Vec<RankedPlayer>, usize) {
    let mut seen = HashSet::with_capacity(players.len());
    let mut kept = Vec::with_capacity(players.len());
    let mut duplicates = 0;
    for player in players {
        if seen.insert(player.identity.row_key()) {
            kept.push(player);
        } else {
            warn!(
                "Duplicate identity {} ({}), keeping first",
                player.identity.name, player.identity.position
            );
            duplicates += 1;
        }
    }
    (kept, duplicates)
}
