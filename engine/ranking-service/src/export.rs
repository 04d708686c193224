//! JSON export of refresh results

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{RankingError, Result};
use crate::model::{MergedPlayer, RankingConfiguration};

#[derive(Debug, Serialize)]
struct ExportDocument<'a> {
    configuration: &'a RankingConfiguration,
    exported_at: DateTime<Utc>,
    player_count: usize,
    players: &'a [MergedPlayer],
}

/// Writes one file per refresh into a directory
#[derive(Debug, Clone)]
pub struct JsonExporter {
    dir: PathBuf,
}

impl JsonExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `ktc_refresh_superflex_dynasty_tep_20250101_120000.json`
    pub fn file_name(configuration: &RankingConfiguration, at: DateTime<Utc>) -> String {
        format!("ktc_refresh_{}_{}.json", configuration.key(), at.format("%Y%m%d_%H%M%S"))
    }

    pub async fn export(
        &self,
        configuration: &RankingConfiguration,
        players: &[MergedPlayer],
    ) -> Result<PathBuf> {
        let exported_at = Utc::now();
        let document = ExportDocument {
            configuration,
            exported_at,
            player_count: players.len(),
            players,
        };
        let body = serde_json::to_vec_pretty(&document)
            .map_err(|e| RankingError::Export(e.to_string()))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| RankingError::Export(format!("{}: {}", self.dir.display(), e)))?;
        let path = self.dir.join(Self::file_name(configuration, exported_at));
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| RankingError::Export(format!("{}: {}", path.display(), e)))?;

        info!("Exported {} players to {}", players.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_name() {
        let config = RankingConfiguration::from_params(Some("superflex"), Some("false"), Some("tepp"))
            .unwrap();
        let at = Utc.with_ymd_and_hms(2025, 8, 1, 9, 30, 5).unwrap();
        assert_eq!(
            JsonExporter::file_name(&config, at),
            "ktc_refresh_superflex_dynasty_tepp_20250801_093005.json"
        );

        let redraft = RankingConfiguration::from_params(None, Some("true"), Some("tep")).unwrap();
        assert_eq!(
            JsonExporter::file_name(&redraft, at),
            "ktc_refresh_1qb_redraft_no_tep_20250801_093005.json"
        );
    }

    #[tokio::test]
    async fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path().join("exports"));
        let config = RankingConfiguration::from_params(None, None, None).unwrap();

        let path = exporter.export(&config, &[]).await.unwrap();
        let body: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(body["player_count"], 0);
        assert_eq!(body["configuration"]["league_format"], "1qb");
    }
}
