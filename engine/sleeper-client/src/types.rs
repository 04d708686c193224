//! Sleeper API payloads

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Player entry from `GET /players/nfl` (the response is a map keyed by player ID)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SleeperPlayer {
    pub player_id: Option<String>,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub position: Option<String>,
    pub team: Option<String>,
    pub active: Option<bool>,
    /// ISO date, e.g. "1996-05-17"
    pub birth_date: Option<String>,
    /// Sent as a string ("6'2\"" or "74") but occasionally as a bare number
    #[serde(deserialize_with = "string_or_number")]
    pub height: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub weight: Option<String>,
    pub college: Option<String>,
    #[serde(deserialize_with = "int_or_string")]
    pub years_exp: Option<i32>,
    pub injury_status: Option<String>,
    pub fantasy_positions: Option<Vec<String>>,
    pub search_rank: Option<i64>,
}

/// League response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleeperLeague {
    pub league_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub season_type: Option<String>,
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total_rosters: Option<u32>,
    #[serde(default)]
    pub roster_positions: Vec<String>,
    #[serde(default)]
    pub settings: serde_json::Value,
    #[serde(default)]
    pub scoring_settings: serde_json::Value,
    #[serde(default)]
    pub previous_league_id: Option<String>,
    #[serde(default)]
    pub draft_id: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Roster response. Player lists are `null` on empty rosters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleeperRoster {
    pub roster_id: u32,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub league_id: Option<String>,
    #[serde(default)]
    pub starters: Option<Vec<String>>,
    #[serde(default)]
    pub reserve: Option<Vec<String>>,
    #[serde(default)]
    pub taxi: Option<Vec<String>>,
    #[serde(default)]
    pub players: Option<Vec<String>>,
    #[serde(default)]
    pub settings: serde_json::Value,
}

/// League member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleeperUser {
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Weekly matchup entry, one per roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleeperMatchup {
    pub roster_id: u32,
    #[serde(default)]
    pub matchup_id: Option<u32>,
    #[serde(default)]
    pub points: Option<f64>,
    #[serde(default)]
    pub custom_points: Option<f64>,
    #[serde(default)]
    pub starters: Option<Vec<String>>,
    #[serde(default)]
    pub players: Option<Vec<String>>,
    #[serde(default)]
    pub players_points: Option<HashMap<String, f64>>,
}

/// NFL state response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NflState {
    pub week: u32,
    pub season_type: String,
    pub season: String,
    #[serde(default)]
    pub previous_season: Option<String>,
    #[serde(default)]
    pub display_week: Option<u32>,
    #[serde(default)]
    pub league_season: Option<String>,
}

/// League info with its rosters and users, fetched together
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueBundle {
    pub league: SleeperLeague,
    pub rosters: Vec<SleeperRoster>,
    pub users: Vec<SleeperUser>,
}

/// Result of decoding `GET /players/nfl` entry by entry
#[derive(Debug, Clone, Default)]
pub struct SleeperPlayers {
    pub players: Vec<SleeperPlayer>,
    pub undecodable: usize,
}

impl SleeperPlayers {
    pub fn from_map(raw: HashMap<String, serde_json::Value>) -> Self {
        let mut decoded = Self::default();
        for (player_id, entry) in raw {
            match serde_json::from_value::<SleeperPlayer>(entry) {
                Ok(mut player) => {
                    player.player_id.get_or_insert(player_id);
                    decoded.players.push(player);
                }
                Err(e) => {
                    tracing::debug!("Skipping undecodable Sleeper player {}: {}", player_id, e);
                    decoded.undecodable += 1;
                }
            }
        }
        decoded
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn int_or_string<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Number(n)) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_player_numeric_strings() {
        let player: SleeperPlayer = serde_json::from_value(json!({
            "full_name": "Breece Hall",
            "position": "RB",
            "team": "NYJ",
            "height": 71,
            "weight": "217",
            "years_exp": "3",
            "active": true
        }))
        .unwrap();
        assert_eq!(player.height.as_deref(), Some("71"));
        assert_eq!(player.weight.as_deref(), Some("217"));
        assert_eq!(player.years_exp, Some(3));
    }

    #[test]
    fn test_players_map_fills_ids_and_counts_failures() {
        let mut raw = HashMap::new();
        raw.insert("4866".to_string(), json!({ "full_name": "Saquon Barkley", "position": "RB" }));
        raw.insert("bad".to_string(), json!(["not", "an", "object"]));

        let decoded = SleeperPlayers::from_map(raw);
        assert_eq!(decoded.players.len(), 1);
        assert_eq!(decoded.players[0].player_id.as_deref(), Some("4866"));
        assert_eq!(decoded.undecodable, 1);
    }

    #[test]
    fn test_roster_with_null_players() {
        let roster: SleeperRoster = serde_json::from_value(json!({
            "roster_id": 3,
            "owner_id": null,
            "players": null,
            "settings": { "wins": 2 }
        }))
        .unwrap();
        assert_eq!(roster.roster_id, 3);
        assert!(roster.players.is_none());
    }
}
