//! PostgreSQL cache store

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use sleeper_client::{SleeperLeague, SleeperMatchup, SleeperRoster, SleeperUser};

use super::{
    profile_key, BatchKeys, LeagueStore, ProfileStore, RankingStore, ReplaceOutcome, UpsertOutcome,
};
use crate::error::{RankingError, Result};
use crate::model::{
    ConfigurationCount, LeagueSnapshot, PlayerIdentity, PlayerProfile, Position, RankedPlayer,
    RankingConfiguration, RankingSnapshot, ResearchSnapshot, RowKey, WeeklyStatSnapshot,
};

const RANKING_COLUMNS: &str = "player_name, position, team, ktc_player_id, age, rookie, value, \
     overall_rank, positional_rank, overall_tier, positional_tier, overall_trend";

const INSERT_RANKING: &str = r#"
    INSERT INTO ktc_rankings (
        league_format, is_redraft, tep_level, match_name, position, team,
        player_name, ktc_player_id, age, rookie, value, overall_rank,
        positional_rank, overall_tier, positional_tier, overall_trend, last_updated
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, NOW())
"#;

#[derive(Debug, sqlx::FromRow)]
struct RankingRow {
    player_name: String,
    position: String,
    team: String,
    ktc_player_id: Option<i64>,
    age: Option<f64>,
    rookie: bool,
    value: i32,
    overall_rank: i32,
    positional_rank: Option<i32>,
    overall_tier: Option<i32>,
    positional_tier: Option<i32>,
    overall_trend: Option<i32>,
}

impl TryFrom<RankingRow> for RankedPlayer {
    type Error = RankingError;

    fn try_from(row: RankingRow) -> Result<Self> {
        Ok(RankedPlayer {
            identity: PlayerIdentity::new(
                row.player_name,
                parse_position(&row.position)?,
                Some(row.team).filter(|t| !t.is_empty()),
            ),
            snapshot: RankingSnapshot {
                value: row.value,
                overall_rank: row.overall_rank,
                positional_rank: row.positional_rank,
                overall_tier: row.overall_tier,
                positional_tier: row.positional_tier,
                overall_trend: row.overall_trend,
            },
            ktc_player_id: row.ktc_player_id,
            age: row.age,
            rookie: row.rookie,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    platform_player_id: String,
    player_name: String,
    position: String,
    team: Option<String>,
    birth_date: Option<NaiveDate>,
    height: Option<String>,
    weight: Option<String>,
    college: Option<String>,
    years_experience: Option<i32>,
    injury_status: Option<String>,
}

impl TryFrom<ProfileRow> for PlayerProfile {
    type Error = RankingError;

    fn try_from(row: ProfileRow) -> Result<Self> {
        Ok(PlayerProfile {
            platform_player_id: Some(row.platform_player_id),
            identity: PlayerIdentity::new(row.player_name, parse_position(&row.position)?, row.team),
            birth_date: row.birth_date,
            height: row.height,
            weight: row.weight,
            college: row.college,
            years_experience: row.years_experience,
            injury_status: row.injury_status,
        })
    }
}

fn parse_position(code: &str) -> Result<Position> {
    code.parse()
        .map_err(|code| RankingError::StoreFailed(format!("unknown position '{}' in store", code)))
}

fn parse_configuration(league_format: &str, is_redraft: bool, tep_level: &str) -> Result<RankingConfiguration> {
    Ok(RankingConfiguration::new(league_format.parse()?, is_redraft, tep_level.parse()?))
}

/// Cache store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Apply the embedded migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }
}

fn bind_ranking<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    configuration: &RankingConfiguration,
    key: RowKey,
    player: &'q RankedPlayer,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(configuration.league_format().as_str())
        .bind(configuration.is_redraft())
        .bind(configuration.tep_level().as_str())
        .bind(key.name)
        .bind(key.position.as_str())
        .bind(key.team)
        .bind(&player.identity.name)
        .bind(player.ktc_player_id)
        .bind(player.age)
        .bind(player.rookie)
        .bind(player.snapshot.value)
        .bind(player.snapshot.overall_rank)
        .bind(player.snapshot.positional_rank)
        .bind(player.snapshot.overall_tier)
        .bind(player.snapshot.positional_tier)
        .bind(player.snapshot.overall_trend)
}

#[async_trait]
impl RankingStore for PgStore {
    async fn upsert(
        &self,
        configuration: &RankingConfiguration,
        players: &[RankedPlayer],
    ) -> Result<UpsertOutcome> {
        let sql = format!(
            "{} ON CONFLICT (league_format, is_redraft, tep_level, match_name, position, team) \
             DO UPDATE SET
                player_name = EXCLUDED.player_name,
                ktc_player_id = EXCLUDED.ktc_player_id,
                age = EXCLUDED.age,
                rookie = EXCLUDED.rookie,
                value = EXCLUDED.value,
                overall_rank = EXCLUDED.overall_rank,
                positional_rank = EXCLUDED.positional_rank,
                overall_tier = EXCLUDED.overall_tier,
                positional_tier = EXCLUDED.positional_tier,
                overall_trend = EXCLUDED.overall_trend,
                last_updated = EXCLUDED.last_updated
             RETURNING (xmax = 0) AS inserted",
            INSERT_RANKING
        );

        let mut tx = self.pool.begin().await?;
        let mut keys = BatchKeys::default();
        let mut outcome = UpsertOutcome::default();

        for player in players {
            let key = keys.check(player)?;
            let row = bind_ranking(sqlx::query(&sql), configuration, key, player)
                .fetch_one(&mut *tx)
                .await?;
            if row.try_get::<bool, _>("inserted")? {
                outcome.created += 1;
            } else {
                outcome.updated += 1;
            }
        }

        tx.commit().await?;
        debug!("Upserted {} rows for {}", players.len(), configuration);
        Ok(outcome)
    }

    async fn replace(
        &self,
        configuration: &RankingConfiguration,
        players: &[RankedPlayer],
    ) -> Result<ReplaceOutcome> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            "DELETE FROM ktc_rankings WHERE league_format = $1 AND is_redraft = $2 AND tep_level = $3",
        )
        .bind(configuration.league_format().as_str())
        .bind(configuration.is_redraft())
        .bind(configuration.tep_level().as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let mut keys = BatchKeys::default();
        for player in players {
            let key = keys.check(player)?;
            bind_ranking(sqlx::query(INSERT_RANKING), configuration, key, player)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!("Replaced {} rows with {} for {}", deleted, players.len(), configuration);
        Ok(ReplaceOutcome { deleted: deleted as usize, inserted: players.len() })
    }

    async fn query(&self, configuration: &RankingConfiguration) -> Result<Vec<RankedPlayer>> {
        let sql = format!(
            "SELECT {} FROM ktc_rankings \
             WHERE league_format = $1 AND is_redraft = $2 AND tep_level = $3 \
             ORDER BY overall_rank ASC, player_name COLLATE \"C\" ASC",
            RANKING_COLUMNS
        );
        let rows: Vec<RankingRow> = sqlx::query_as(&sql)
            .bind(configuration.league_format().as_str())
            .bind(configuration.is_redraft())
            .bind(configuration.tep_level().as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(RankedPlayer::try_from).collect()
    }

    async fn delete(&self, configuration: &RankingConfiguration) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM ktc_rankings WHERE league_format = $1 AND is_redraft = $2 AND tep_level = $3",
        )
        .bind(configuration.league_format().as_str())
        .bind(configuration.is_redraft())
        .bind(configuration.tep_level().as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn last_updated(
        &self,
        configuration: &RankingConfiguration,
    ) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query(
            "SELECT MAX(last_updated) AS last_updated FROM ktc_rankings \
             WHERE league_format = $1 AND is_redraft = $2 AND tep_level = $3",
        )
        .bind(configuration.league_format().as_str())
        .bind(configuration.is_redraft())
        .bind(configuration.tep_level().as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("last_updated")?)
    }

    async fn configuration_counts(&self) -> Result<Vec<ConfigurationCount>> {
        let rows = sqlx::query(
            "SELECT league_format, is_redraft, tep_level, COUNT(*) AS players, \
                    MAX(last_updated) AS last_updated \
             FROM ktc_rankings \
             GROUP BY league_format, is_redraft, tep_level",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = Vec::with_capacity(rows.len());
        for row in rows {
            let configuration = parse_configuration(
                row.try_get::<&str, _>("league_format")?,
                row.try_get("is_redraft")?,
                row.try_get::<&str, _>("tep_level")?,
            )?;
            counts.push(ConfigurationCount {
                configuration,
                key: configuration.key(),
                players: row.try_get("players")?,
                last_updated: row.try_get("last_updated")?,
            });
        }
        counts.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(counts)
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn upsert_profiles(&self, profiles: &[PlayerProfile]) -> Result<UpsertOutcome> {
        let mut tx = self.pool.begin().await?;
        let mut seen = HashSet::with_capacity(profiles.len());
        let mut outcome = UpsertOutcome::default();

        for profile in profiles {
            let id = profile_key(profile)?;
            if !seen.insert(id) {
                return Err(RankingError::StoreFailed(format!(
                    "duplicate platform id {} in batch",
                    id
                )));
            }

            let row = sqlx::query(
                r#"
                INSERT INTO sleeper_players (
                    platform_player_id, player_name, match_name, position, team, birth_date,
                    height, weight, college, years_experience, injury_status, last_updated
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW())
                ON CONFLICT (platform_player_id)
                DO UPDATE SET
                    player_name = EXCLUDED.player_name,
                    match_name = EXCLUDED.match_name,
                    position = EXCLUDED.position,
                    team = EXCLUDED.team,
                    birth_date = EXCLUDED.birth_date,
                    height = EXCLUDED.height,
                    weight = EXCLUDED.weight,
                    college = EXCLUDED.college,
                    years_experience = EXCLUDED.years_experience,
                    injury_status = EXCLUDED.injury_status,
                    last_updated = EXCLUDED.last_updated
                RETURNING (xmax = 0) AS inserted
                "#,
            )
            .bind(id)
            .bind(&profile.identity.name)
            .bind(profile.identity.match_key().name)
            .bind(profile.identity.position.as_str())
            .bind(&profile.identity.team)
            .bind(profile.birth_date)
            .bind(&profile.height)
            .bind(&profile.weight)
            .bind(&profile.college)
            .bind(profile.years_experience)
            .bind(&profile.injury_status)
            .fetch_one(&mut *tx)
            .await?;

            if row.try_get::<bool, _>("inserted")? {
                outcome.created += 1;
            } else {
                outcome.updated += 1;
            }
        }

        tx.commit().await?;
        Ok(outcome)
    }

    async fn profiles(&self) -> Result<Vec<PlayerProfile>> {
        let rows: Vec<ProfileRow> = sqlx::query_as(
            "SELECT platform_player_id, player_name, position, team, birth_date, height, weight, \
                    college, years_experience, injury_status \
             FROM sleeper_players \
             ORDER BY player_name COLLATE \"C\" ASC, platform_player_id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PlayerProfile::try_from).collect()
    }
}

#[async_trait]
impl LeagueStore for PgStore {
    async fn save_league(&self, snapshot: &LeagueSnapshot) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sleeper_leagues (league_id, name, season, payload, last_updated)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (league_id)
            DO UPDATE SET
                name = EXCLUDED.name,
                season = EXCLUDED.season,
                payload = EXCLUDED.payload,
                last_updated = EXCLUDED.last_updated
            "#,
        )
        .bind(&snapshot.league_id)
        .bind(&snapshot.league.name)
        .bind(&snapshot.league.season)
        .bind(Json(&snapshot.league))
        .bind(snapshot.last_updated)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM sleeper_rosters WHERE league_id = $1")
            .bind(&snapshot.league_id)
            .execute(&mut *tx)
            .await?;
        for roster in &snapshot.rosters {
            sqlx::query(
                "INSERT INTO sleeper_rosters (league_id, roster_id, owner_id, payload, last_updated) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(&snapshot.league_id)
            .bind(roster.roster_id as i32)
            .bind(&roster.owner_id)
            .bind(Json(roster))
            .bind(snapshot.last_updated)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM sleeper_users WHERE league_id = $1")
            .bind(&snapshot.league_id)
            .execute(&mut *tx)
            .await?;
        for user in &snapshot.users {
            sqlx::query(
                "INSERT INTO sleeper_users (league_id, user_id, display_name, payload, last_updated) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(&snapshot.league_id)
            .bind(&user.user_id)
            .bind(&user.display_name)
            .bind(Json(user))
            .bind(snapshot.last_updated)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn league(&self, league_id: &str) -> Result<Option<LeagueSnapshot>> {
        let Some(row) =
            sqlx::query("SELECT payload, last_updated FROM sleeper_leagues WHERE league_id = $1")
                .bind(league_id)
                .fetch_optional(&self.pool)
                .await?
        else {
            return Ok(None);
        };
        let league: Json<SleeperLeague> = row.try_get("payload")?;
        let last_updated: DateTime<Utc> = row.try_get("last_updated")?;

        let rosters: Vec<Json<SleeperRoster>> = sqlx::query_scalar(
            "SELECT payload FROM sleeper_rosters WHERE league_id = $1 ORDER BY roster_id",
        )
        .bind(league_id)
        .fetch_all(&self.pool)
        .await?;

        let users: Vec<Json<SleeperUser>> = sqlx::query_scalar(
            "SELECT payload FROM sleeper_users WHERE league_id = $1 ORDER BY user_id",
        )
        .bind(league_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(LeagueSnapshot {
            league_id: league_id.to_string(),
            league: league.0,
            rosters: rosters.into_iter().map(|r| r.0).collect(),
            users: users.into_iter().map(|u| u.0).collect(),
            last_updated,
        }))
    }

    async fn save_matchups(&self, snapshot: &WeeklyStatSnapshot) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM sleeper_weekly_stats WHERE league_id = $1 AND season = $2 AND week = $3",
        )
        .bind(&snapshot.league_id)
        .bind(&snapshot.season)
        .bind(snapshot.week as i32)
        .execute(&mut *tx)
        .await?;

        for matchup in &snapshot.matchups {
            sqlx::query(
                "INSERT INTO sleeper_weekly_stats (league_id, season, week, roster_id, payload, last_updated) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(&snapshot.league_id)
            .bind(&snapshot.season)
            .bind(snapshot.week as i32)
            .bind(matchup.roster_id as i32)
            .bind(Json(matchup))
            .bind(snapshot.last_updated)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn matchups(
        &self,
        league_id: &str,
        season: &str,
        week: u32,
    ) -> Result<Option<WeeklyStatSnapshot>> {
        let rows = sqlx::query(
            "SELECT payload, last_updated FROM sleeper_weekly_stats \
             WHERE league_id = $1 AND season = $2 AND week = $3 ORDER BY roster_id",
        )
        .bind(league_id)
        .bind(season)
        .bind(week as i32)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut matchups = Vec::with_capacity(rows.len());
        let mut last_updated = DateTime::<Utc>::MIN_UTC;
        for row in rows {
            let matchup: Json<SleeperMatchup> = row.try_get("payload")?;
            last_updated = last_updated.max(row.try_get("last_updated")?);
            matchups.push(matchup.0);
        }

        Ok(Some(WeeklyStatSnapshot {
            league_id: league_id.to_string(),
            season: season.to_string(),
            week,
            matchups,
            last_updated,
        }))
    }

    async fn save_research(&self, snapshot: &ResearchSnapshot) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM sleeper_research WHERE season = $1 AND week = $2 AND league_type = $3",
        )
        .bind(&snapshot.season)
        .bind(snapshot.week as i32)
        .bind(snapshot.league_type as i32)
        .execute(&mut *tx)
        .await?;

        for (player_id, research) in &snapshot.players {
            sqlx::query(
                "INSERT INTO sleeper_research (season, week, league_type, player_id, payload, last_updated) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(&snapshot.season)
            .bind(snapshot.week as i32)
            .bind(snapshot.league_type as i32)
            .bind(player_id)
            .bind(Json(research))
            .bind(snapshot.last_updated)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn research(
        &self,
        season: &str,
        week: u32,
        league_type: u32,
    ) -> Result<Option<ResearchSnapshot>> {
        let rows = sqlx::query(
            "SELECT player_id, payload, last_updated FROM sleeper_research \
             WHERE season = $1 AND week = $2 AND league_type = $3",
        )
        .bind(season)
        .bind(week as i32)
        .bind(league_type as i32)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut players = HashMap::with_capacity(rows.len());
        let mut last_updated = DateTime::<Utc>::MIN_UTC;
        for row in rows {
            let player_id: String = row.try_get("player_id")?;
            let payload: Json<serde_json::Value> = row.try_get("payload")?;
            last_updated = last_updated.max(row.try_get("last_updated")?);
            players.insert(player_id, payload.0);
        }

        Ok(Some(ResearchSnapshot {
            season: season.to_string(),
            week,
            league_type,
            players,
            last_updated,
        }))
    }
}
