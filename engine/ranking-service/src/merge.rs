//! Joins platform profiles with ranking records

use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::model::{MergedPlayer, PlayerProfile, Position, RankedPlayer, RankingConfiguration};

/// Which side of the merge held the colliding records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateSource {
    Profile,
    Ranking,
}

/// Two records shared a matching key; the first one was kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateIdentity {
    pub name: String,
    pub position: Position,
    pub source: DuplicateSource,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeOutcome {
    pub players: Vec<MergedPlayer>,
    pub matched: usize,
    pub unmatched_rankings: usize,
    pub unmatched_profiles: usize,
    pub duplicates: Vec<DuplicateIdentity>,
}

/// Merge profiles and rankings for one configuration.
///
/// Output holds every ranking in input order (with or without a profile),
/// followed by the profiles no ranking claimed, in input order.
pub fn merge(
    profiles: &[PlayerProfile],
    rankings: &[RankedPlayer],
    configuration: &RankingConfiguration,
) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();

    let mut by_key = HashMap::with_capacity(profiles.len());
    for (index, profile) in profiles.iter().enumerate() {
        match by_key.entry(profile.identity.match_key()) {
            Entry::Vacant(slot) => {
                slot.insert(index);
            }
            Entry::Occupied(mut slot) => {
                let current = &profiles[*slot.get()];
                if current.platform_player_id.is_none() && profile.platform_player_id.is_some() {
                    debug!(
                        "Profile {} ({}) replaces an earlier one without a platform id",
                        profile.identity.name, profile.identity.position
                    );
                    slot.insert(index);
                } else if current.platform_player_id.is_some() && profile.platform_player_id.is_none() {
                    debug!(
                        "Dropping profile {} ({}) without a platform id, keeping {:?}",
                        profile.identity.name, profile.identity.position, current.platform_player_id
                    );
                } else {
                    warn!(
                        "Duplicate profile identity {} ({}), keeping first",
                        profile.identity.name, profile.identity.position
                    );
                    outcome.duplicates.push(DuplicateIdentity {
                        name: profile.identity.name.clone(),
                        position: profile.identity.position,
                        source: DuplicateSource::Profile,
                    });
                }
            }
        }
    }

    let mut claimed = vec![false; profiles.len()];
    for ranked in rankings {
        let profile_index = by_key.get(&ranked.identity.match_key()).copied();
        match profile_index {
            Some(index) if !claimed[index] => {
                claimed[index] = true;
                let mut merged = MergedPlayer::from_profile(&profiles[index]);
                merged.attach_ranking(ranked, configuration);
                outcome.players.push(merged);
                outcome.matched += 1;
            }
            Some(_) => {
                warn!(
                    "Duplicate ranking identity {} ({}), profile already claimed",
                    ranked.identity.name, ranked.identity.position
                );
                outcome.duplicates.push(DuplicateIdentity {
                    name: ranked.identity.name.clone(),
                    position: ranked.identity.position,
                    source: DuplicateSource::Ranking,
                });
                outcome.players.push(MergedPlayer::from_ranking(ranked, configuration));
                outcome.unmatched_rankings += 1;
            }
            None => {
                debug!("No profile for ranked player {}", ranked.identity.name);
                outcome.players.push(MergedPlayer::from_ranking(ranked, configuration));
                outcome.unmatched_rankings += 1;
            }
        }
    }

    for (index, profile) in profiles.iter().enumerate() {
        if !claimed[index] {
            outcome.players.push(MergedPlayer::from_profile(profile));
            outcome.unmatched_profiles += 1;
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PlayerIdentity, RankingSnapshot};

    fn config() -> RankingConfiguration {
        RankingConfiguration::from_params(Some("superflex"), Some("false"), None).unwrap()
    }

    fn profile(id: Option<&str>, name: &str, position: Position) -> PlayerProfile {
        PlayerProfile {
            platform_player_id: id.map(str::to_string),
            identity: PlayerIdentity::new(name, position, Some("KC".into())),
            birth_date: None,
            height: None,
            weight: None,
            college: Some("Somewhere".into()),
            years_experience: Some(3),
            injury_status: None,
        }
    }

    fn ranked(name: &str, position: Position, rank: i32) -> RankedPlayer {
        RankedPlayer {
            identity: PlayerIdentity::new(name, position, Some("KC".into())),
            snapshot: RankingSnapshot {
                value: 10_000 - rank,
                overall_rank: rank,
                positional_rank: None,
                overall_tier: None,
                positional_tier: None,
                overall_trend: None,
            },
            ktc_player_id: Some(rank as i64),
            age: None,
            rookie: false,
        }
    }

    #[test]
    fn test_unmatched_ranking_is_kept() {
        let profiles = vec![profile(Some("1"), "Patrick Mahomes", Position::QB)];
        let rankings = vec![
            ranked("Patrick Mahomes II", Position::QB, 5),
            ranked("2026 Early 1st", Position::RDP, 12),
        ];
        let outcome = merge(&profiles, &rankings, &config());

        assert_eq!(outcome.players.len(), 2);
        assert_eq!(outcome.matched, 1);
        assert_eq!(outcome.unmatched_rankings, 1);

        let pick = &outcome.players[1];
        assert_eq!(pick.name, "2026 Early 1st");
        assert!(pick.platform_player_id.is_none());
        assert!(pick.college.is_none());
        assert_eq!(pick.rankings[&config().key()].overall_rank, 12);
    }

    #[test]
    fn test_unmatched_profiles_follow_rankings() {
        let profiles = vec![
            profile(Some("1"), "Backup Guy", Position::QB),
            profile(Some("2"), "Travis Kelce", Position::TE),
        ];
        let rankings = vec![ranked("Travis Kelce", Position::TE, 40)];
        let outcome = merge(&profiles, &rankings, &config());

        assert_eq!(outcome.players[0].name, "Travis Kelce");
        assert_eq!(outcome.players[1].name, "Backup Guy");
        assert!(outcome.players[1].rankings.is_empty());
        assert_eq!(outcome.unmatched_profiles, 1);
    }

    #[test]
    fn test_position_disambiguates() {
        let profiles = vec![
            profile(Some("1"), "Josh Allen", Position::QB),
            profile(Some("2"), "Josh Allen", Position::TE),
        ];
        let rankings = vec![ranked("Josh Allen", Position::QB, 1)];
        let outcome = merge(&profiles, &rankings, &config());

        assert_eq!(outcome.players[0].platform_player_id.as_deref(), Some("1"));
        assert!(outcome.duplicates.is_empty());
    }

    #[test]
    fn test_duplicate_prefers_platform_id() {
        let profiles = vec![
            profile(None, "Tony Jones", Position::RB),
            profile(Some("77"), "Tony Jones Jr.", Position::RB),
        ];
        let rankings = vec![ranked("Tony Jones", Position::RB, 200)];
        let outcome = merge(&profiles, &rankings, &config());

        assert_eq!(outcome.players[0].platform_player_id.as_deref(), Some("77"));
        assert!(outcome.duplicates.is_empty());
    }

    #[test]
    fn test_later_profile_without_platform_id_is_dropped() {
        let profiles = vec![
            profile(Some("77"), "Tony Jones Jr.", Position::RB),
            profile(None, "Tony Jones", Position::RB),
        ];
        let rankings = vec![ranked("Tony Jones", Position::RB, 200)];
        let outcome = merge(&profiles, &rankings, &config());

        assert_eq!(outcome.players[0].platform_player_id.as_deref(), Some("77"));
        assert_eq!(outcome.matched, 1);
        assert!(outcome.duplicates.is_empty());
    }

    #[test]
    fn test_duplicate_first_wins_with_warning() {
        let profiles = vec![
            profile(Some("10"), "Mike Williams", Position::WR),
            profile(Some("11"), "Mike Williams", Position::WR),
        ];
        let rankings = vec![ranked("Mike Williams", Position::WR, 150)];
        let outcome = merge(&profiles, &rankings, &config());

        assert_eq!(outcome.players[0].platform_player_id.as_deref(), Some("10"));
        assert_eq!(outcome.duplicates.len(), 1);
        assert_eq!(outcome.duplicates[0].source, DuplicateSource::Profile);
        // The losing profile is still listed, without rankings
        assert_eq!(outcome.players[1].platform_player_id.as_deref(), Some("11"));
        assert!(outcome.players[1].rankings.is_empty());
    }
}
