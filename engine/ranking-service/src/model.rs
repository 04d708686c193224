//! Domain types shared by the normalizer, merge engine, stores and services

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use sleeper_client::{SleeperLeague, SleeperMatchup, SleeperRoster, SleeperUser};

use crate::error::RankingError;
use crate::normalizer::match_name;

/// League format a ranking was computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeagueFormat {
    #[serde(rename = "1qb")]
    OneQb,
    #[serde(rename = "superflex")]
    Superflex,
}

impl LeagueFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeagueFormat::OneQb => "1qb",
            LeagueFormat::Superflex => "superflex",
        }
    }
}

impl FromStr for LeagueFormat {
    type Err = RankingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1qb" => Ok(LeagueFormat::OneQb),
            "superflex" => Ok(LeagueFormat::Superflex),
            other => Err(RankingError::InvalidParameter(format!(
                "league_format must be '1qb' or 'superflex', got '{}'",
                other
            ))),
        }
    }
}

/// Tight-end premium level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TepLevel {
    None,
    Tep,
    Tepp,
    Teppp,
}

impl TepLevel {
    pub const ALL: [TepLevel; 4] = [TepLevel::None, TepLevel::Tep, TepLevel::Tepp, TepLevel::Teppp];

    /// Column value; `None` is stored as the empty string
    pub fn as_str(&self) -> &'static str {
        match self {
            TepLevel::None => "",
            TepLevel::Tep => "tep",
            TepLevel::Tepp => "tepp",
            TepLevel::Teppp => "teppp",
        }
    }
}

impl FromStr for TepLevel {
    type Err = RankingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(TepLevel::None),
            "tep" => Ok(TepLevel::Tep),
            "tepp" => Ok(TepLevel::Tepp),
            "teppp" => Ok(TepLevel::Teppp),
            other => Err(RankingError::InvalidParameter(format!(
                "tep_level must be one of '', 'tep', 'tepp', 'teppp', got '{}'",
                other
            ))),
        }
    }
}

/// Cache partition key.
///
/// TEP only exists for dynasty rankings, so a redraft configuration always
/// carries `TepLevel::None` regardless of what was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RankingConfiguration {
    league_format: LeagueFormat,
    is_redraft: bool,
    tep_level: TepLevel,
}

impl RankingConfiguration {
    pub fn new(league_format: LeagueFormat, is_redraft: bool, tep_level: TepLevel) -> Self {
        let tep_level = if is_redraft { TepLevel::None } else { tep_level };
        Self { league_format, is_redraft, tep_level }
    }

    /// Build a configuration from raw query parameters, applying the defaults
    /// `league_format=1qb`, `is_redraft=false`, `tep_level=""`
    pub fn from_params(
        league_format: Option<&str>,
        is_redraft: Option<&str>,
        tep_level: Option<&str>,
    ) -> Result<Self, RankingError> {
        let league_format = league_format.unwrap_or("1qb").parse()?;
        let is_redraft = match is_redraft.map(|v| v.trim().to_lowercase()) {
            None => false,
            Some(v) if v == "true" => true,
            Some(v) if v == "false" => false,
            Some(v) => {
                return Err(RankingError::InvalidParameter(format!(
                    "is_redraft must be 'true' or 'false', got '{}'",
                    v
                )))
            }
        };
        let tep_level = tep_level.unwrap_or("").parse()?;
        Ok(Self::new(league_format, is_redraft, tep_level))
    }

    pub fn league_format(&self) -> LeagueFormat {
        self.league_format
    }

    pub fn is_redraft(&self) -> bool {
        self.is_redraft
    }

    pub fn tep_level(&self) -> TepLevel {
        self.tep_level
    }

    /// Every other configuration with the same league format: the dynasty
    /// TEP variants plus the redraft (or dynasty) counterpart
    pub fn siblings(&self) -> Vec<RankingConfiguration> {
        let mut siblings: Vec<RankingConfiguration> = TepLevel::ALL
            .iter()
            .map(|tep| RankingConfiguration::new(self.league_format, false, *tep))
            .collect();
        siblings.push(RankingConfiguration::new(self.league_format, true, TepLevel::None));
        siblings.retain(|other| other != self);
        siblings
    }

    /// Stable key, e.g. `superflex_dynasty_tep` or `1qb_redraft_no_tep`
    pub fn key(&self) -> String {
        let kind = if self.is_redraft { "redraft" } else { "dynasty" };
        let tep = match self.tep_level {
            TepLevel::None => "no_tep",
            other => other.as_str(),
        };
        format!("{}_{}_{}", self.league_format.as_str(), kind, tep)
    }
}

impl fmt::Display for RankingConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Fantasy-relevant positions; `RDP` is a rookie draft pick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
    RDP,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
            Position::RDP => "RDP",
        }
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Ok(Position::QB),
            "RB" => Ok(Position::RB),
            "WR" => Ok(Position::WR),
            "TE" => Ok(Position::TE),
            "RDP" | "PICK" => Ok(Position::RDP),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key used to match rankings against profiles
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchKey {
    pub name: String,
    pub position: Position,
}

/// Row identity inside one configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey {
    pub name: String,
    pub position: Position,
    pub team: String,
}

/// Player as named by a source. The display name is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    pub name: String,
    pub position: Position,
    pub team: Option<String>,
}

impl PlayerIdentity {
    pub fn new(name: impl Into<String>, position: Position, team: Option<String>) -> Self {
        Self { name: name.into(), position, team }
    }

    pub fn match_key(&self) -> MatchKey {
        MatchKey { name: match_name(&self.name), position: self.position }
    }

    pub fn row_key(&self) -> RowKey {
        RowKey {
            name: match_name(&self.name),
            position: self.position,
            team: self.team.clone().unwrap_or_default(),
        }
    }
}

/// Ranking values for one player under one configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingSnapshot {
    pub value: i32,
    pub overall_rank: i32,
    pub positional_rank: Option<i32>,
    pub overall_tier: Option<i32>,
    pub positional_tier: Option<i32>,
    pub overall_trend: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPlayer {
    #[serde(flatten)]
    pub identity: PlayerIdentity,
    #[serde(flatten)]
    pub snapshot: RankingSnapshot,
    pub ktc_player_id: Option<i64>,
    pub age: Option<f64>,
    pub rookie: bool,
}

/// Player record from the platform directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub platform_player_id: Option<String>,
    #[serde(flatten)]
    pub identity: PlayerIdentity,
    pub birth_date: Option<NaiveDate>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub college: Option<String>,
    pub years_experience: Option<i32>,
    pub injury_status: Option<String>,
}

/// Read-time join of a profile with its rankings, keyed by configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedPlayer {
    pub name: String,
    pub position: Position,
    pub team: Option<String>,
    pub platform_player_id: Option<String>,
    pub ktc_player_id: Option<i64>,
    pub birth_date: Option<NaiveDate>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub college: Option<String>,
    pub years_experience: Option<i32>,
    pub injury_status: Option<String>,
    pub age: Option<f64>,
    pub rookie: Option<bool>,
    pub rankings: BTreeMap<String, RankingSnapshot>,
}

impl MergedPlayer {
    pub fn from_profile(profile: &PlayerProfile) -> Self {
        Self {
            name: profile.identity.name.clone(),
            position: profile.identity.position,
            team: profile.identity.team.clone(),
            platform_player_id: profile.platform_player_id.clone(),
            ktc_player_id: None,
            birth_date: profile.birth_date,
            height: profile.height.clone(),
            weight: profile.weight.clone(),
            college: profile.college.clone(),
            years_experience: profile.years_experience,
            injury_status: profile.injury_status.clone(),
            age: None,
            rookie: None,
            rankings: BTreeMap::new(),
        }
    }

    pub fn from_ranking(ranked: &RankedPlayer, configuration: &RankingConfiguration) -> Self {
        let mut merged = Self {
            name: ranked.identity.name.clone(),
            position: ranked.identity.position,
            team: ranked.identity.team.clone(),
            platform_player_id: None,
            ktc_player_id: None,
            birth_date: None,
            height: None,
            weight: None,
            college: None,
            years_experience: None,
            injury_status: None,
            age: None,
            rookie: None,
            rankings: BTreeMap::new(),
        };
        merged.attach_ranking(ranked, configuration);
        merged
    }

    pub fn match_key(&self) -> MatchKey {
        MatchKey { name: match_name(&self.name), position: self.position }
    }

    pub fn attach_ranking(&mut self, ranked: &RankedPlayer, configuration: &RankingConfiguration) {
        self.ktc_player_id = self.ktc_player_id.or(ranked.ktc_player_id);
        self.age = self.age.or(ranked.age);
        self.rookie = Some(ranked.rookie);
        self.rankings.insert(configuration.key(), ranked.snapshot.clone());
    }
}

/// Row count for one cached configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationCount {
    pub configuration: RankingConfiguration,
    pub key: String,
    pub players: i64,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Cached league with its rosters and users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueSnapshot {
    pub league_id: String,
    pub league: SleeperLeague,
    pub rosters: Vec<SleeperRoster>,
    pub users: Vec<SleeperUser>,
    pub last_updated: DateTime<Utc>,
}

/// Cached weekly matchups for one league
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyStatSnapshot {
    pub league_id: String,
    pub season: String,
    pub week: u32,
    pub matchups: Vec<SleeperMatchup>,
    pub last_updated: DateTime<Utc>,
}

/// Cached per-player research for one (season, week, league_type)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchSnapshot {
    pub season: String,
    pub week: u32,
    pub league_type: u32,
    pub players: HashMap<String, serde_json::Value>,
    pub last_updated: DateTime<Utc>,
}
