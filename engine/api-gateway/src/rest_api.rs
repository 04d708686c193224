//! REST API endpoints for cached rankings and Sleeper data

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{Filter, Rejection};

use ranking_service::league::DEFAULT_RESEARCH_LEAGUE_TYPE;
use ranking_service::{
    LeagueSync, MergedPlayer, QueryService, RankedPlayer, RankingConfiguration, RankingError,
    RefreshOrchestrator, WriteMode,
};

use crate::error::{handle_rejection, reject, ErrorResponse, SuccessResponse};

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub refresh: Arc<RefreshOrchestrator>,
    pub query: QueryService,
    pub leagues: Arc<LeagueSync>,
}

/// Ranking configuration query parameters; all optional
#[derive(Debug, Deserialize)]
pub struct ConfigurationParams {
    pub league_format: Option<String>,
    pub is_redraft: Option<String>,
    pub tep_level: Option<String>,
}

impl ConfigurationParams {
    fn configuration(&self) -> Result<RankingConfiguration, Rejection> {
        RankingConfiguration::from_params(
            self.league_format.as_deref(),
            self.is_redraft.as_deref(),
            self.tep_level.as_deref(),
        )
        .map_err(reject)
    }
}

#[derive(Debug, Deserialize)]
pub struct SeasonParams {
    pub season: Option<String>,
}

impl SeasonParams {
    fn season(&self) -> Result<&str, Rejection> {
        self.season.as_deref().ok_or_else(|| {
            reject(RankingError::InvalidParameter("season query parameter is required".to_string()))
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ResearchParams {
    pub week: Option<u32>,
    pub league_type: Option<u32>,
}

impl ResearchParams {
    fn week(&self) -> u32 {
        self.week.unwrap_or(1)
    }

    fn league_type(&self) -> u32 {
        self.league_type.unwrap_or(DEFAULT_RESEARCH_LEAGUE_TYPE)
    }
}

#[derive(Debug, Serialize)]
pub struct RankingsResponse<T> {
    pub configuration: RankingConfiguration,
    pub key: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub count: usize,
    pub players: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub configuration: RankingConfiguration,
    pub deleted: u64,
}

fn success<T: Serialize>(data: T) -> warp::reply::Json {
    warp::reply::json(&SuccessResponse::new(data))
}

/// Create REST API routes
pub fn create_routes(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let state_filter = warp::any().map(move || state.clone());

    // Health check endpoint
    let health = warp::path("health").and(warp::path::end()).and(warp::get()).map(|| {
        warp::reply::json(&serde_json::json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))
    });

    // Database connectivity
    let ktc_health = warp::path("api")
        .and(warp::path("ktc"))
        .and(warp::path("health"))
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(|state: AppState| async move { check_database(state).await });

    // POST replaces the configuration's rows, PUT upserts into them
    let refresh_replace = warp::path("api")
        .and(warp::path("ktc"))
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::query::<ConfigurationParams>())
        .and(state_filter.clone())
        .and_then(|params: ConfigurationParams, state: AppState| async move {
            refresh_rankings(params, WriteMode::Replace, state).await
        });

    let refresh_upsert = warp::path("api")
        .and(warp::path("ktc"))
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(warp::put())
        .and(warp::query::<ConfigurationParams>())
        .and(state_filter.clone())
        .and_then(|params: ConfigurationParams, state: AppState| async move {
            refresh_rankings(params, WriteMode::Upsert, state).await
        });

    let rankings = warp::path("api")
        .and(warp::path("ktc"))
        .and(warp::path("rankings"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<ConfigurationParams>())
        .and(state_filter.clone())
        .and_then(get_rankings);

    let players = warp::path("api")
        .and(warp::path("ktc"))
        .and(warp::path("players"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<ConfigurationParams>())
        .and(state_filter.clone())
        .and_then(get_players);

    let cleanup = warp::path("api")
        .and(warp::path("ktc"))
        .and(warp::path("rankings"))
        .and(warp::path::end())
        .and(warp::delete())
        .and(warp::query::<ConfigurationParams>())
        .and(state_filter.clone())
        .and_then(cleanup_rankings);

    let stats = warp::path("api")
        .and(warp::path("ktc"))
        .and(warp::path("stats"))
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_stats);

    let ktc_routes = ktc_health
        .or(refresh_replace)
        .or(refresh_upsert)
        .or(rankings)
        .or(players)
        .or(cleanup)
        .or(stats);

    // Sleeper player directory
    let profiles_refresh = warp::path("api")
        .and(warp::path("sleeper"))
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(warp::post())
        .and(state_filter.clone())
        .and_then(|state: AppState| async move {
            let report = state.refresh.refresh_profiles().await.map_err(reject)?;
            Ok::<_, Rejection>(success(report))
        });

    let league = warp::path("api")
        .and(warp::path("sleeper"))
        .and(warp::path("league"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(|league_id: String, state: AppState| async move {
            let snapshot = state.leagues.league(&league_id).await.map_err(reject)?;
            Ok::<_, Rejection>(success(snapshot))
        });

    let league_rosters = warp::path("api")
        .and(warp::path("sleeper"))
        .and(warp::path("league"))
        .and(warp::path::param::<String>())
        .and(warp::path("rosters"))
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(|league_id: String, state: AppState| async move {
            let snapshot = state.leagues.league(&league_id).await.map_err(reject)?;
            Ok::<_, Rejection>(success(snapshot.rosters))
        });

    let league_users = warp::path("api")
        .and(warp::path("sleeper"))
        .and(warp::path("league"))
        .and(warp::path::param::<String>())
        .and(warp::path("users"))
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(|league_id: String, state: AppState| async move {
            let snapshot = state.leagues.league(&league_id).await.map_err(reject)?;
            Ok::<_, Rejection>(success(snapshot.users))
        });

    let league_refresh = warp::path("api")
        .and(warp::path("sleeper"))
        .and(warp::path("league"))
        .and(warp::path::param::<String>())
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(warp::post())
        .and(state_filter.clone())
        .and_then(|league_id: String, state: AppState| async move {
            let snapshot = state.leagues.refresh_league(&league_id).await.map_err(reject)?;
            Ok::<_, Rejection>(success(snapshot))
        });

    let matchups = warp::path("api")
        .and(warp::path("sleeper"))
        .and(warp::path("league"))
        .and(warp::path::param::<String>())
        .and(warp::path("stats"))
        .and(warp::path("week"))
        .and(warp::path::param::<u32>())
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<SeasonParams>())
        .and(state_filter.clone())
        .and_then(
            |league_id: String, week: u32, params: SeasonParams, state: AppState| async move {
                let season = params.season()?;
                let snapshot =
                    state.leagues.matchups(&league_id, season, week).await.map_err(reject)?;
                Ok::<_, Rejection>(success(snapshot))
            },
        );

    let matchups_refresh = warp::path("api")
        .and(warp::path("sleeper"))
        .and(warp::path("league"))
        .and(warp::path::param::<String>())
        .and(warp::path("stats"))
        .and(warp::path("week"))
        .and(warp::path::param::<u32>())
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::query::<SeasonParams>())
        .and(state_filter.clone())
        .and_then(
            |league_id: String, week: u32, params: SeasonParams, state: AppState| async move {
                let season = params.season()?;
                let snapshot = state
                    .leagues
                    .refresh_matchups(&league_id, season, week)
                    .await
                    .map_err(reject)?;
                Ok::<_, Rejection>(success(snapshot))
            },
        );

    let research = warp::path("api")
        .and(warp::path("sleeper"))
        .and(warp::path("players"))
        .and(warp::path("research"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<ResearchParams>())
        .and(state_filter.clone())
        .and_then(|season: String, params: ResearchParams, state: AppState| async move {
            let snapshot = state
                .leagues
                .research(&season, params.week(), params.league_type())
                .await
                .map_err(reject)?;
            Ok::<_, Rejection>(success(snapshot))
        });

    let research_refresh = warp::path("api")
        .and(warp::path("sleeper"))
        .and(warp::path("players"))
        .and(warp::path("research"))
        .and(warp::path::param::<String>())
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::query::<ResearchParams>())
        .and(state_filter.clone())
        .and_then(|season: String, params: ResearchParams, state: AppState| async move {
            let snapshot = state
                .leagues
                .refresh_research(&season, params.week(), params.league_type())
                .await
                .map_err(reject)?;
            Ok::<_, Rejection>(success(snapshot))
        });

    let sleeper_health = warp::path("api")
        .and(warp::path("sleeper"))
        .and(warp::path("health"))
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(|state: AppState| async move { check_sleeper(state).await });

    let sleeper_routes = sleeper_health
        .or(profiles_refresh)
        .or(league)
        .or(league_rosters)
        .or(league_users)
        .or(league_refresh)
        .or(matchups)
        .or(matchups_refresh)
        .or(research)
        .or(research_refresh);

    health
        .or(ktc_routes)
        .or(sleeper_routes)
        .recover(handle_rejection)
        .with(
            warp::cors()
                .allow_any_origin()
                .allow_headers(vec!["content-type"])
                .allow_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"]),
        )
}

async fn check_database(state: AppState) -> Result<warp::reply::WithStatus<warp::reply::Json>, Rejection> {
    match state.query.health_check().await {
        Ok(()) => Ok(warp::reply::with_status(
            success(serde_json::json!({ "database": "connected" })),
            StatusCode::OK,
        )),
        Err(e) => {
            tracing::error!("Database health check failed: {}", e);
            Ok(warp::reply::with_status(
                warp::reply::json(&ErrorResponse::new("DATABASE_UNAVAILABLE", "Database is unreachable")),
                StatusCode::SERVICE_UNAVAILABLE,
            ))
        }
    }
}

async fn check_sleeper(state: AppState) -> Result<warp::reply::WithStatus<warp::reply::Json>, Rejection> {
    if state.leagues.source_reachable().await {
        return Ok(warp::reply::with_status(
            success(serde_json::json!({ "sleeper": "reachable" })),
            StatusCode::OK,
        ));
    }
    tracing::error!("Sleeper health check failed");
    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorResponse::new("SOURCE_UNAVAILABLE", "Sleeper API is unreachable")),
        StatusCode::SERVICE_UNAVAILABLE,
    ))
}

async fn refresh_rankings(
    params: ConfigurationParams,
    mode: WriteMode,
    state: AppState,
) -> Result<warp::reply::Json, Rejection> {
    let configuration = params.configuration()?;
    let report = state.refresh.refresh(&configuration, mode).await.map_err(reject)?;
    Ok(success(report))
}

async fn get_rankings(
    params: ConfigurationParams,
    state: AppState,
) -> Result<warp::reply::Json, Rejection> {
    let configuration = params.configuration()?;
    let players: Vec<RankedPlayer> = state.query.rankings(&configuration).await.map_err(reject)?;
    let last_updated = state.query.last_updated(&configuration).await.map_err(reject)?;
    Ok(success(RankingsResponse {
        configuration,
        key: configuration.key(),
        last_updated,
        count: players.len(),
        players,
    }))
}

async fn get_players(
    params: ConfigurationParams,
    state: AppState,
) -> Result<warp::reply::Json, Rejection> {
    let configuration = params.configuration()?;
    let players: Vec<MergedPlayer> = state.query.players(&configuration).await.map_err(reject)?;
    let last_updated = state.query.last_updated(&configuration).await.map_err(reject)?;
    Ok(success(RankingsResponse {
        configuration,
        key: configuration.key(),
        last_updated,
        count: players.len(),
        players,
    }))
}

async fn cleanup_rankings(
    params: ConfigurationParams,
    state: AppState,
) -> Result<warp::reply::Json, Rejection> {
    let configuration = params.configuration()?;
    let deleted = state.refresh.cleanup(&configuration).await.map_err(reject)?;
    Ok(success(CleanupResponse { configuration, deleted }))
}

async fn get_stats(state: AppState) -> Result<warp::reply::Json, Rejection> {
    let stats = state.query.stats().await.map_err(reject)?;
    Ok(success(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use tokio::sync::Notify;

    use ktc_scraper::{KtcRankings, RankingPage};
    use ranking_service::{CacheStore, LeagueSource, MemoryStore, ProfileSource, RankingSource};
    use sleeper_client::{LeagueBundle, SleeperMatchup, SleeperPlayer};

    #[derive(Default)]
    struct StubRankings {
        entered: Arc<Notify>,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl RankingSource for StubRankings {
        async fn fetch_rankings(
            &self,
            configuration: &RankingConfiguration,
        ) -> ranking_service::Result<KtcRankings> {
            self.entered.notify_one();
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            Ok(KtcRankings::from_entries(
                RankingPage::from_redraft(configuration.is_redraft()),
                vec![
                    json!({
                        "playerName": "Ja'Marr Chase", "position": "WR", "team": "CIN",
                        "oneQBValues": { "value": 9990, "rank": 1 },
                        "superflexValues": { "value": 9800, "rank": 2 }
                    }),
                    json!({
                        "playerName": "Josh Allen", "position": "QB", "team": "BUF",
                        "oneQBValues": { "value": 7100, "rank": 12 },
                        "superflexValues": { "value": 9990, "rank": 1 }
                    }),
                ],
            ))
        }
    }

    struct StubProfiles;

    #[async_trait]
    impl ProfileSource for StubProfiles {
        async fn fetch_profiles(&self) -> ranking_service::Result<Vec<SleeperPlayer>> {
            Ok(vec![serde_json::from_value(json!({
                "player_id": "4984", "full_name": "Josh Allen", "position": "QB",
                "team": "BUF", "active": true
            }))
            .unwrap()])
        }
    }

    /// League source whose liveness the test picks
    struct StubLeagues(bool);

    #[async_trait]
    impl LeagueSource for StubLeagues {
        async fn fetch_league(&self, league_id: &str) -> ranking_service::Result<LeagueBundle> {
            if league_id != "77" {
                return Err(RankingError::NotFound(format!("league {}", league_id)));
            }
            Ok(LeagueBundle {
                league: serde_json::from_value(json!({ "league_id": "77", "name": "Home League", "season": "2025" }))
                    .unwrap(),
                rosters: serde_json::from_value(json!([{ "roster_id": 1, "owner_id": "u1" }])).unwrap(),
                users: serde_json::from_value(json!([{ "user_id": "u1", "display_name": "alpha" }])).unwrap(),
            })
        }

        async fn fetch_matchups(
            &self,
            _league_id: &str,
            _week: u32,
        ) -> ranking_service::Result<Vec<SleeperMatchup>> {
            Ok(serde_json::from_value(json!([{ "roster_id": 1, "matchup_id": 1, "points": 88.5 }])).unwrap())
        }

        async fn fetch_research(
            &self,
            _season: &str,
            _week: u32,
            _league_type: u32,
        ) -> ranking_service::Result<HashMap<String, Value>> {
            Ok(HashMap::from([("4984".to_string(), json!({ "owned": 100.0 }))]))
        }

        async fn is_reachable(&self) -> bool {
            self.0
        }
    }

    fn state_with(rankings: Arc<StubRankings>) -> AppState {
        state_with_leagues(rankings, StubLeagues(true))
    }

    fn state_with_leagues(rankings: Arc<StubRankings>, leagues: StubLeagues) -> AppState {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
        AppState {
            refresh: Arc::new(RefreshOrchestrator::new(store.clone(), rankings, Arc::new(StubProfiles))),
            query: QueryService::new(store.clone()),
            leagues: Arc::new(LeagueSync::new(store, Arc::new(leagues))),
        }
    }

    fn state() -> AppState {
        state_with(Arc::new(StubRankings::default()))
    }

    fn body(response: &warp::http::Response<warp::hyper::body::Bytes>) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let routes = create_routes(state());
        let response = warp::test::request().path("/health").reply(&routes).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(&response)["status"], "healthy");

        let response = warp::test::request().path("/api/ktc/health").reply(&routes).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(&response)["data"]["database"], "connected");
    }

    #[tokio::test]
    async fn test_sleeper_health() {
        let routes = create_routes(state());
        let response = warp::test::request().path("/api/sleeper/health").reply(&routes).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(&response)["data"]["sleeper"], "reachable");

        let down = create_routes(state_with_leagues(Arc::new(StubRankings::default()), StubLeagues(false)));
        let response = warp::test::request().path("/api/sleeper/health").reply(&down).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let payload = body(&response);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error"]["code"], "SOURCE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_rankings_default_to_1qb_dynasty() {
        let routes = create_routes(state());
        let response = warp::test::request().path("/api/ktc/rankings").reply(&routes).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body(&response);
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"]["key"], "1qb_dynasty_no_tep");
        assert_eq!(json["data"]["count"], 0);
        assert!(json["data"]["last_updated"].is_null());
    }

    #[tokio::test]
    async fn test_invalid_parameter_is_400() {
        let routes = create_routes(state());
        let response = warp::test::request()
            .path("/api/ktc/rankings?league_format=2qb")
            .reply(&routes)
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body(&response);
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"]["code"], "INVALID_PARAMETER");
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_refresh_then_query() {
        let routes = create_routes(state());

        let profiles = warp::test::request()
            .method("POST")
            .path("/api/sleeper/refresh")
            .reply(&routes)
            .await;
        assert_eq!(profiles.status(), StatusCode::OK);
        assert_eq!(body(&profiles)["data"]["created"], 1);

        let refresh = warp::test::request()
            .method("POST")
            .path("/api/ktc/refresh?league_format=superflex")
            .reply(&routes)
            .await;
        assert_eq!(refresh.status(), StatusCode::OK);
        let json = body(&refresh);
        assert_eq!(json["data"]["mode"], "replace");
        assert_eq!(json["data"]["created"], 2);

        let rankings = warp::test::request()
            .path("/api/ktc/rankings?league_format=superflex")
            .reply(&routes)
            .await;
        let json = body(&rankings);
        assert_eq!(json["data"]["count"], 2);
        assert_eq!(json["data"]["players"][0]["name"], "Josh Allen");

        let players = warp::test::request()
            .path("/api/ktc/players?league_format=superflex")
            .reply(&routes)
            .await;
        let json = body(&players);
        assert_eq!(json["data"]["count"], 2);

        let upsert = warp::test::request()
            .method("PUT")
            .path("/api/ktc/refresh?league_format=superflex")
            .reply(&routes)
            .await;
        let json = body(&upsert);
        assert_eq!(json["data"]["mode"], "upsert");
        assert_eq!(json["data"]["created"], 0);
        assert_eq!(json["data"]["updated"], 2);

        let stats = warp::test::request().path("/api/ktc/stats").reply(&routes).await;
        assert_eq!(body(&stats)["data"]["total_rankings"], 2);

        let cleanup = warp::test::request()
            .method("DELETE")
            .path("/api/ktc/rankings?league_format=superflex")
            .reply(&routes)
            .await;
        assert_eq!(body(&cleanup)["data"]["deleted"], 2);
    }

    #[tokio::test]
    async fn test_concurrent_refresh_is_409() {
        let gate = Arc::new(Notify::new());
        let rankings = Arc::new(StubRankings { gate: Some(gate.clone()), ..Default::default() });
        let entered = rankings.entered.clone();
        let routes = create_routes(state_with(rankings));

        let first = {
            let routes = routes.clone();
            tokio::spawn(async move {
                warp::test::request().method("POST").path("/api/ktc/refresh").reply(&routes).await
            })
        };
        entered.notified().await;

        let second =
            warp::test::request().method("POST").path("/api/ktc/refresh").reply(&routes).await;
        assert_eq!(second.status(), StatusCode::CONFLICT);
        assert_eq!(body(&second)["error"]["code"], "REFRESH_IN_PROGRESS");

        gate.notify_one();
        assert_eq!(first.await.unwrap().status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_league_routes() {
        let routes = create_routes(state());

        let missing = warp::test::request().path("/api/sleeper/league/77").reply(&routes).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&missing)["error"]["code"], "NOT_FOUND");

        let refreshed = warp::test::request()
            .method("POST")
            .path("/api/sleeper/league/77/refresh")
            .reply(&routes)
            .await;
        assert_eq!(refreshed.status(), StatusCode::OK);

        let rosters = warp::test::request().path("/api/sleeper/league/77/rosters").reply(&routes).await;
        assert_eq!(body(&rosters)["data"].as_array().unwrap().len(), 1);
        let users = warp::test::request().path("/api/sleeper/league/77/users").reply(&routes).await;
        assert_eq!(body(&users)["data"][0]["display_name"], "alpha");

        let unknown = warp::test::request()
            .method("POST")
            .path("/api/sleeper/league/5/refresh")
            .reply(&routes)
            .await;
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_matchup_and_research_routes() {
        let routes = create_routes(state());

        let no_season = warp::test::request()
            .method("POST")
            .path("/api/sleeper/league/77/stats/week/3/refresh")
            .reply(&routes)
            .await;
        assert_eq!(no_season.status(), StatusCode::BAD_REQUEST);

        let bad_week = warp::test::request()
            .method("POST")
            .path("/api/sleeper/league/77/stats/week/19/refresh?season=2025")
            .reply(&routes)
            .await;
        assert_eq!(bad_week.status(), StatusCode::BAD_REQUEST);

        warp::test::request()
            .method("POST")
            .path("/api/sleeper/league/77/stats/week/3/refresh?season=2025")
            .reply(&routes)
            .await;
        let matchups = warp::test::request()
            .path("/api/sleeper/league/77/stats/week/3?season=2025")
            .reply(&routes)
            .await;
        assert_eq!(matchups.status(), StatusCode::OK);
        assert_eq!(body(&matchups)["data"]["week"], 3);

        warp::test::request()
            .method("POST")
            .path("/api/sleeper/players/research/2025/refresh")
            .reply(&routes)
            .await;
        let research = warp::test::request()
            .path("/api/sleeper/players/research/2025?week=1&league_type=2")
            .reply(&routes)
            .await;
        assert_eq!(research.status(), StatusCode::OK);
        assert_eq!(body(&research)["data"]["players"]["4984"]["owned"], 100.0);
    }

    #[tokio::test]
    async fn test_unknown_route_uses_error_envelope() {
        let routes = create_routes(state());
        let response = warp::test::request().path("/api/nope").reply(&routes).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&response)["status"], "error");
    }
}
