use axum::http::StatusCode;
use leaguedesk::api;
use leaguedesk::config::Config;
use leaguedesk::datasource::{LeagueDataSource, MockDataSource};
use leaguedesk::db::init_db;
use leaguedesk::domain::{
    LeagueInfo, LeagueUser, Roster, RosterId, Season, TimeMs, Transaction, TransactionKind,
    TransactionStatus,
};
use leaguedesk::{LeagueHistory, OwnershipService, Repository, TaxiService};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    _temp: TempDir,
}

async fn setup_test_app(datasource: MockDataSource) -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let mut env = HashMap::new();
    env.insert("DATABASE_PATH".to_string(), db_path);
    env.insert("LEAGUE_ID".to_string(), "L26".to_string());
    env.insert("DRAFT_ROUNDS".to_string(), "3".to_string());
    let config = Config::from_env_map(env).unwrap();

    let datasource: Arc<dyn LeagueDataSource> = Arc::new(datasource);
    let history = LeagueHistory::new(
        datasource.clone(),
        config.league_id.clone(),
        config.league_history_depth,
    );
    let taxi = Arc::new(TaxiService::new(
        datasource.clone(),
        history.clone(),
        repo.clone(),
        config.taxi_rules(),
        config.run_schedule(),
        false,
    ));
    let ownership = Arc::new(OwnershipService::new(
        datasource,
        history,
        config.draft_rounds,
    ));
    let app = api::create_router(api::AppState::new(repo, taxi, ownership, config));

    TestApp {
        app,
        _temp: temp_dir,
    }
}

fn league(id: &str, season: i32, previous: Option<&str>) -> LeagueInfo {
    LeagueInfo {
        league_id: id.to_string(),
        name: "Dynasty".to_string(),
        season: Season::new(season),
        previous_league_id: previous.map(str::to_string),
        draft_rounds: 4,
        taxi_slots: 3,
        total_rosters: 3,
    }
}

/// Rosters A=1, B=2, C=3. T1 (t=100) moves A's 2026 R2 pick to B, then T2
/// (t=200) moves it on to C. T2 is listed first to rule out feed-order replay.
fn mock() -> MockDataSource {
    MockDataSource::new()
        .with_league(league("L26", 2026, Some("L25")))
        .with_league(league("L25", 2025, None))
        .with_rosters(
            "L26",
            vec![
                Roster::new(RosterId::new(1)).with_owner("ua"),
                Roster::new(RosterId::new(2)).with_owner("ub"),
                Roster::new(RosterId::new(3)).with_owner("uc"),
            ],
        )
        .with_users(
            "L26",
            ["ua", "ub", "uc"]
                .iter()
                .map(|id| LeagueUser {
                    user_id: id.to_string(),
                    display_name: id.to_uppercase(),
                    team_name: Some(format!("Team {}", id.to_uppercase())),
                })
                .collect(),
        )
        .with_transactions(
            "L26",
            vec![
                Transaction::new("T2", TransactionKind::Trade, 1, TimeMs::new(200))
                    .with_pick(2027, 2, 1, 2, 3),
                Transaction::new("T3", TransactionKind::Trade, 1, TimeMs::new(300))
                    .with_status(TransactionStatus::Failed)
                    .with_pick(2027, 1, 3, 3, 1),
            ],
        )
        .with_transactions(
            "L25",
            vec![Transaction::new("T1", TransactionKind::Trade, 5, TimeMs::new(100))
                .with_pick(2027, 2, 1, 1, 2)],
        )
}

async fn request(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn find_pick<'a>(json: &'a serde_json::Value, original: u32, round: u32) -> &'a serde_json::Value {
    json["picks"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["originalRosterId"] == original && p["round"] == round)
        .unwrap()
}

#[tokio::test]
async fn test_chained_trades_resolve_to_last_owner() {
    let test_app = setup_test_app(mock()).await;

    let (status, json) = request(test_app.app, "/v1/draft/ownership").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "available");
    assert_eq!(json["season"], 2027);
    assert_eq!(json["rounds"], 3);
    assert_eq!(json["picks"].as_array().unwrap().len(), 9);

    let pick = find_pick(&json, 1, 2);
    assert_eq!(pick["currentOwnerRosterId"], 3);
    assert_eq!(pick["originalTeam"], "Team UA");
    assert_eq!(pick["currentOwnerTeam"], "Team UC");

    let history = pick["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["fromRosterId"], 1);
    assert_eq!(history[0]["toRosterId"], 2);
    assert_eq!(history[0]["tradeId"], "T1");
    assert_eq!(history[1]["fromRosterId"], 2);
    assert_eq!(history[1]["toRosterId"], 3);
    assert_eq!(history[1]["tradeId"], "T2");
}

#[tokio::test]
async fn test_untraded_and_failed_picks_stay_with_original() {
    let test_app = setup_test_app(mock()).await;

    let (_, json) = request(test_app.app, "/v1/draft/ownership?season=2027").await;
    let failed = find_pick(&json, 3, 1);
    assert_eq!(failed["currentOwnerRosterId"], 3);
    assert_eq!(failed["history"], serde_json::json!([]));

    let untouched = find_pick(&json, 2, 3);
    assert_eq!(untouched["currentOwnerRosterId"], 2);
}

#[tokio::test]
async fn test_other_season_is_unaffected() {
    let test_app = setup_test_app(mock()).await;

    let (_, json) = request(test_app.app, "/v1/draft/ownership?season=2028").await;
    assert_eq!(json["status"], "available");
    let moved = json["picks"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|p| p["originalRosterId"] != p["currentOwnerRosterId"])
        .count();
    assert_eq!(moved, 0);
}

#[tokio::test]
async fn test_teams_and_factoids_present() {
    let test_app = setup_test_app(mock()).await;

    let (_, json) = request(test_app.app, "/v1/draft/ownership").await;
    let teams = json["teams"].as_array().unwrap();
    assert_eq!(teams.len(), 3);
    assert_eq!(teams[0]["pickCount"], 2);
    assert_eq!(teams[2]["pickCount"], 4);
    assert!(json["factoids"]
        .as_array()
        .unwrap()
        .iter()
        .any(|f| f == "1 of 9 2027 picks have changed hands"));
}

#[tokio::test]
async fn test_outage_is_unavailable_not_partial() {
    let test_app = setup_test_app(mock().with_outage()).await;

    let (status, json) = request(test_app.app, "/v1/draft/ownership?season=2027").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({"status": "unavailable", "season": 2027}));
}

#[tokio::test]
async fn test_invalid_season_rejected() {
    let test_app = setup_test_app(mock()).await;

    let (status, json) = request(test_app.app, "/v1/draft/ownership?season=next").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "invalid_season");
}
