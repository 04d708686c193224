use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the `playersArray` embedded in a KTC rankings page
///
/// Every field is optional: the page is not under our control and required
/// fields are enforced later, when the record is normalized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KtcPlayer {
    /// Display name (e.g., "Ja'Marr Chase")
    pub player_name: Option<String>,
    /// KTC player ID
    #[serde(rename = "playerID")]
    pub player_id: Option<i64>,
    /// URL slug on keeptradecut.com
    pub slug: Option<String>,
    /// Position code (QB, RB, WR, TE, RDP)
    pub position: Option<String>,
    /// Team abbreviation (e.g., "CIN")
    pub team: Option<String>,
    /// Age with decimals
    pub age: Option<f64>,
    pub rookie: Option<bool>,
    /// Values for single-quarterback leagues
    #[serde(rename = "oneQBValues")]
    pub one_qb_values: Option<KtcValues>,
    /// Values for superflex leagues
    pub superflex_values: Option<KtcValues>,
}

/// Ranking values for one league format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KtcValues {
    pub value: Option<i32>,
    pub rank: Option<i32>,
    pub positional_rank: Option<i32>,
    pub overall_tier: Option<i32>,
    pub positional_tier: Option<i32>,
    pub overall_trend: Option<i32>,
    /// Tight-end premium overrides, one block per premium level
    pub tep: Option<KtcTepValues>,
    pub tepp: Option<KtcTepValues>,
    pub teppp: Option<KtcTepValues>,
}

/// Values under a tight-end premium scoring setting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KtcTepValues {
    pub value: Option<i32>,
    pub rank: Option<i32>,
    pub positional_rank: Option<i32>,
    pub overall_tier: Option<i32>,
    pub positional_tier: Option<i32>,
}

/// Which KTC rankings page to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingPage {
    Dynasty,
    Redraft,
}

impl RankingPage {
    pub fn from_redraft(is_redraft: bool) -> Self {
        if is_redraft {
            Self::Redraft
        } else {
            Self::Dynasty
        }
    }
}

/// Result of scraping one rankings page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KtcRankings {
    pub page: RankingPage,
    /// When the page was fetched
    pub fetched_at: DateTime<Utc>,
    /// Entries that decoded into [`KtcPlayer`]
    pub players: Vec<KtcPlayer>,
    /// Entries of `playersArray` that could not be decoded at all
    pub undecodable: usize,
}

impl KtcRankings {
    pub fn new(page: RankingPage) -> Self {
        Self { page, fetched_at: Utc::now(), players: Vec::new(), undecodable: 0 }
    }

    /// Decode raw `playersArray` entries one by one so a single odd entry
    /// does not sink the whole page
    pub fn from_entries(page: RankingPage, entries: Vec<serde_json::Value>) -> Self {
        let mut rankings = Self::new(page);
        for entry in entries {
            match serde_json::from_value::<KtcPlayer>(entry) {
                Ok(player) => rankings.players.push(player),
                Err(e) => {
                    tracing::warn!("Skipping undecodable KTC entry: {}", e);
                    rankings.undecodable += 1;
                }
            }
        }
        rankings
    }

    /// Get the first N players in page order
    pub fn top_players(&self, limit: usize) -> Vec<&KtcPlayer> {
        self.players.iter().take(limit).collect()
    }
}
