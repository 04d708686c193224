//! Maps raw KTC and Sleeper records onto canonical player records

use chrono::NaiveDate;
use tracing::{debug, warn};

use ktc_scraper::{KtcPlayer, KtcTepValues, KtcValues};
use sleeper_client::SleeperPlayer;

use crate::error::NormalizeError;
use crate::model::{
    LeagueFormat, PlayerIdentity, PlayerProfile, Position, RankedPlayer, RankingConfiguration,
    RankingSnapshot, TepLevel,
};

const NAME_SUFFIXES: [&str; 5] = ["jr", "sr", "ii", "iii", "iv"];

/// Matching form of a display name: lowercase, alphanumerics only,
/// generational suffix dropped. "Michael Pittman Jr." -> "michaelpittman".
pub fn match_name(name: &str) -> String {
    let tokens: Vec<String> = name
        .split_whitespace()
        .map(|token| token.chars().filter(|c| c.is_alphanumeric()).collect::<String>().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect();

    let end = match tokens.last() {
        Some(last) if tokens.len() > 1 && NAME_SUFFIXES.contains(&last.as_str()) => tokens.len() - 1,
        _ => tokens.len(),
    };
    tokens[..end].concat()
}

fn clean_team(team: Option<&str>) -> Option<String> {
    team.map(str::trim).filter(|t| !t.is_empty()).map(str::to_uppercase)
}

fn clean_text(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

fn required<'a>(value: Option<&'a String>, field: &str) -> Result<&'a str, NormalizeError> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| NormalizeError::MalformedRecord(format!("missing {}", field)))
}

fn tep_block(values: &KtcValues, tep_level: TepLevel) -> Option<&KtcTepValues> {
    match tep_level {
        TepLevel::None => None,
        TepLevel::Tep => values.tep.as_ref(),
        TepLevel::Tepp => values.tepp.as_ref(),
        TepLevel::Teppp => values.teppp.as_ref(),
    }
}

/// Normalize one KTC entry for a configuration.
///
/// The TEP sub-block only applies to dynasty configurations and overrides
/// the base fields it carries.
pub fn normalize_ranking(
    raw: &KtcPlayer,
    configuration: &RankingConfiguration,
) -> Result<RankedPlayer, NormalizeError> {
    let name = required(raw.player_name.as_ref(), "playerName")?;
    let position_code = required(raw.position.as_ref(), "position")?;
    let position = position_code
        .parse::<Position>()
        .map_err(NormalizeError::UnknownPosition)?;

    let values = match configuration.league_format() {
        LeagueFormat::OneQb => raw.one_qb_values.as_ref(),
        LeagueFormat::Superflex => raw.superflex_values.as_ref(),
    }
    .ok_or_else(|| NormalizeError::MalformedRecord(format!("{} has no value block", name)))?;

    let mut value = values.value;
    let mut rank = values.rank;
    let mut positional_rank = values.positional_rank;
    let mut overall_tier = values.overall_tier;
    let mut positional_tier = values.positional_tier;

    if !configuration.is_redraft() {
        if let Some(tep) = tep_block(values, configuration.tep_level()) {
            value = tep.value.or(value);
            rank = tep.rank.or(rank);
            positional_rank = tep.positional_rank.or(positional_rank);
            overall_tier = tep.overall_tier.or(overall_tier);
            positional_tier = tep.positional_tier.or(positional_tier);
        }
    }

    let value = value
        .filter(|v| *v > 0)
        .ok_or_else(|| NormalizeError::MalformedRecord(format!("{} has no value", name)))?;
    let overall_rank =
        rank.ok_or_else(|| NormalizeError::MalformedRecord(format!("{} has no rank", name)))?;

    Ok(RankedPlayer {
        identity: PlayerIdentity::new(name, position, clean_team(raw.team.as_deref())),
        snapshot: RankingSnapshot {
            value,
            overall_rank,
            positional_rank,
            overall_tier,
            positional_tier,
            overall_trend: values.overall_trend,
        },
        ktc_player_id: raw.player_id,
        age: raw.age,
        rookie: raw.rookie.unwrap_or(false),
    })
}

/// Normalize one Sleeper directory entry
pub fn normalize_profile(raw: &SleeperPlayer) -> Result<PlayerProfile, NormalizeError> {
    let full_name = match clean_text(raw.full_name.as_ref()) {
        Some(name) => name,
        None => {
            let first = clean_text(raw.first_name.as_ref()).unwrap_or_default();
            let last = clean_text(raw.last_name.as_ref()).unwrap_or_default();
            let joined = format!("{} {}", first, last).trim().to_string();
            if joined.is_empty() {
                return Err(NormalizeError::MalformedRecord("missing full_name".to_string()));
            }
            joined
        }
    };
    let position_code = required(raw.position.as_ref(), "position")?;
    let position = position_code
        .parse::<Position>()
        .map_err(NormalizeError::UnknownPosition)?;

    let birth_date = clean_text(raw.birth_date.as_ref()).and_then(|date| {
        NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|_| warn!("Invalid birth_date for {}: {}", full_name, date))
            .ok()
    });

    Ok(PlayerProfile {
        platform_player_id: clean_text(raw.player_id.as_ref()),
        identity: PlayerIdentity::new(full_name, position, clean_team(raw.team.as_deref())),
        birth_date,
        height: clean_text(raw.height.as_ref()),
        weight: clean_text(raw.weight.as_ref()),
        college: clean_text(raw.college.as_ref()),
        years_experience: raw.years_exp,
        injury_status: clean_text(raw.injury_status.as_ref()),
    })
}

/// Result of normalizing a batch: good records plus how many were dropped
#[derive(Debug, Clone)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

impl<T> Default for Normalized<T> {
    fn default() -> Self {
        Self { records: Vec::new(), skipped: 0 }
    }
}

pub fn normalize_rankings(
    raw: &[KtcPlayer],
    configuration: &RankingConfiguration,
) -> Normalized<RankedPlayer> {
    let mut batch = Normalized { records: Vec::with_capacity(raw.len()), skipped: 0 };
    for entry in raw {
        match normalize_ranking(entry, configuration) {
            Ok(player) => batch.records.push(player),
            Err(e) => {
                warn!(
                    "Skipping KTC record {:?}: {}",
                    entry.player_name.as_deref().unwrap_or("<unnamed>"),
                    e
                );
                batch.skipped += 1;
            }
        }
    }
    batch
}

/// Profiles outside the fantasy positions (K, DEF, OL...) are expected and
/// only logged at debug level.
pub fn normalize_profiles<'a>(raw: impl IntoIterator<Item = &'a SleeperPlayer>) -> Normalized<PlayerProfile> {
    let mut batch = Normalized::default();
    for entry in raw {
        match normalize_profile(entry) {
            Ok(profile) => batch.records.push(profile),
            Err(NormalizeError::UnknownPosition(code)) => {
                debug!("Skipping Sleeper player {:?} at position {}", entry.player_id, code);
                batch.skipped += 1;
            }
            Err(e) => {
                warn!("Skipping Sleeper player {:?}: {}", entry.player_id, e);
                batch.skipped += 1;
            }
        }
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ktc(value: serde_json::Value) -> KtcPlayer {
        serde_json::from_value(value).unwrap()
    }

    fn config(format: &str, redraft: &str, tep: &str) -> RankingConfiguration {
        RankingConfiguration::from_params(Some(format), Some(redraft), Some(tep)).unwrap()
    }

    #[test]
    fn test_match_name() {
        assert_eq!(match_name("Michael Pittman Jr."), "michaelpittman");
        assert_eq!(match_name("  Amon-Ra St. Brown "), "amonrastbrown");
        assert_eq!(match_name("Kenneth Walker III"), "kennethwalker");
        assert_eq!(match_name("D.J. Moore"), "djmoore");
        // A lone suffix-looking token is a name, not a suffix
        assert_eq!(match_name("Ii"), "ii");
    }

    #[test]
    fn test_normalize_ranking_superflex() {
        let raw = ktc(json!({
            "playerName": " Josh Allen ",
            "playerID": 123,
            "position": "qb",
            "team": "buf",
            "oneQBValues": { "value": 7000, "rank": 20 },
            "superflexValues": { "value": 9900, "rank": 1, "positionalRank": 1, "overallTier": 1, "overallTrend": 2 }
        }));
        let player = normalize_ranking(&raw, &config("superflex", "false", "")).unwrap();
        assert_eq!(player.identity.name, "Josh Allen");
        assert_eq!(player.identity.position, Position::QB);
        assert_eq!(player.identity.team.as_deref(), Some("BUF"));
        assert_eq!(player.snapshot.value, 9900);
        assert_eq!(player.snapshot.overall_rank, 1);
        assert_eq!(player.snapshot.overall_trend, Some(2));
        assert_eq!(player.ktc_player_id, Some(123));
    }

    #[test]
    fn test_tep_override_dynasty_only() {
        let raw = ktc(json!({
            "playerName": "Brock Bowers",
            "position": "TE",
            "team": "LV",
            "superflexValues": {
                "value": 7000, "rank": 30, "positionalRank": 2,
                "tep": { "value": 7600, "rank": 22 }
            }
        }));

        let dynasty = normalize_ranking(&raw, &config("superflex", "false", "tep")).unwrap();
        assert_eq!(dynasty.snapshot.value, 7600);
        assert_eq!(dynasty.snapshot.overall_rank, 22);
        assert_eq!(dynasty.snapshot.positional_rank, Some(2));

        let redraft = normalize_ranking(&raw, &config("superflex", "true", "tep")).unwrap();
        let redraft_plain = normalize_ranking(&raw, &config("superflex", "true", "")).unwrap();
        assert_eq!(redraft.snapshot.value, 7000);
        assert_eq!(redraft, redraft_plain);
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        let no_position = ktc(json!({ "playerName": "X", "oneQBValues": { "value": 1, "rank": 1 } }));
        assert!(matches!(
            normalize_ranking(&no_position, &config("1qb", "false", "")),
            Err(NormalizeError::MalformedRecord(_))
        ));

        let no_value = ktc(json!({ "playerName": "X", "position": "RB", "oneQBValues": { "value": 0, "rank": 4 } }));
        assert!(matches!(
            normalize_ranking(&no_value, &config("1qb", "false", "")),
            Err(NormalizeError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_unknown_position() {
        let raw = ktc(json!({ "playerName": "Justin Tucker", "position": "K", "oneQBValues": { "value": 5, "rank": 500 } }));
        assert_eq!(
            normalize_ranking(&raw, &config("1qb", "false", "")),
            Err(NormalizeError::UnknownPosition("K".to_string()))
        );
    }

    #[test]
    fn test_batch_counts_skips() {
        let raw = vec![
            ktc(json!({ "playerName": "A", "position": "WR", "oneQBValues": { "value": 10, "rank": 1 } })),
            ktc(json!({ "playerName": "B", "oneQBValues": { "value": 9, "rank": 2 } })),
        ];
        let batch = normalize_rankings(&raw, &config("1qb", "false", ""));
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.skipped, 1);
    }

    #[test]
    fn test_normalize_profile() {
        let raw: SleeperPlayer = serde_json::from_value(json!({
            "player_id": "4046",
            "first_name": "Patrick",
            "last_name": "Mahomes",
            "position": "QB",
            "team": "KC",
            "birth_date": "1995-09-17",
            "height": "74",
            "weight": 225,
            "college": "Texas Tech",
            "years_exp": 8,
            "injury_status": ""
        }))
        .unwrap();
        let profile = normalize_profile(&raw).unwrap();
        assert_eq!(profile.identity.name, "Patrick Mahomes");
        assert_eq!(profile.platform_player_id.as_deref(), Some("4046"));
        assert_eq!(profile.birth_date, NaiveDate::from_ymd_opt(1995, 9, 17));
        assert_eq!(profile.weight.as_deref(), Some("225"));
        assert_eq!(profile.injury_status, None);
    }

    #[test]
    fn test_profile_bad_birth_date_is_dropped() {
        let raw: SleeperPlayer = serde_json::from_value(json!({
            "full_name": "Some Guy", "position": "WR", "birth_date": "not-a-date"
        }))
        .unwrap();
        let profile = normalize_profile(&raw).unwrap();
        assert!(profile.birth_date.is_none());
    }

    #[test]
    fn test_profile_batch_skips_non_fantasy_positions() {
        let raw: Vec<SleeperPlayer> = vec![
            serde_json::from_value(json!({ "player_id": "1", "full_name": "Travis Kelce", "position": "TE" })).unwrap(),
            serde_json::from_value(json!({ "player_id": "2", "full_name": "Harrison Butker", "position": "K" })).unwrap(),
            serde_json::from_value(json!({ "player_id": "3", "position": "RB" })).unwrap(),
        ];
        let batch = normalize_profiles(&raw);
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].identity.name, "Travis Kelce");
        assert_eq!(batch.skipped, 2);

        let empty = normalize_profiles(&Vec::<SleeperPlayer>::new());
        assert!(empty.records.is_empty());
        assert_eq!(empty.skipped, 0);
    }
}
