use axum::http::StatusCode;
use leaguedesk::api;
use leaguedesk::config::Config;
use leaguedesk::datasource::{LeagueDataSource, MockDataSource};
use leaguedesk::db::init_db;
use leaguedesk::domain::{
    LeagueInfo, PlayerInfo, Position, Roster, RosterId, Season, TimeMs, Transaction,
    TransactionKind,
};
use leaguedesk::{LeagueHistory, OwnershipService, Repository, TaxiService};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    datasource: Arc<MockDataSource>,
    _temp: TempDir,
}

async fn setup_test_app(admin_secret: Option<&str>) -> TestApp {
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
    env.insert("LEAGUE_ID".to_string(), "L1".to_string());
    if let Some(secret) = admin_secret {
        env.insert("ADMIN_SECRET".to_string(), secret.to_string());
    }
    let config = Config::from_env_map(env).unwrap();

    let mock = Arc::new(fixtures());
    let datasource: Arc<dyn LeagueDataSource> = mock.clone();
    let history = LeagueHistory::new(datasource.clone(), "L1".to_string(), 3);
    let taxi = Arc::new(TaxiService::new(
        datasource.clone(),
        history.clone(),
        repo.clone(),
        config.taxi_rules(),
        config.run_schedule(),
        config.snapshots_enabled,
    ));
    let ownership = Arc::new(OwnershipService::new(datasource, history, None));
    let app = api::create_router(api::AppState::new(repo, taxi, ownership, config));

    TestApp {
        app,
        datasource: mock,
        _temp: temp_dir,
    }
}

/// Roster 1 is compliant, roster 2 carries four players on taxi.
fn fixtures() -> MockDataSource {
    let adds = |roster: u32, ids: &[&str]| -> Vec<Transaction> {
        ids.iter()
            .map(|id| {
                Transaction::new(
                    format!("fa-{}-{}", roster, id),
                    TransactionKind::FreeAgent,
                    1,
                    TimeMs::new(10),
                )
                .with_add(id, roster)
            })
            .collect()
    };
    let mut transactions = adds(1, &["a1"]);
    transactions.extend(adds(2, &["b1", "b2", "b3", "b4"]));

    MockDataSource::new()
        .with_league(LeagueInfo {
            league_id: "L1".to_string(),
            name: "Dynasty".to_string(),
            season: Season::new(2026),
            previous_league_id: None,
            draft_rounds: 4,
            taxi_slots: 3,
            total_rosters: 2,
        })
        .with_nfl_state(Season::new(2026), 6)
        .with_players(vec![PlayerInfo::new("a1", "Alpha One", Position::WR)])
        .with_rosters(
            "L1",
            vec![
                Roster::new(RosterId::new(1)).with_players(&["a1"]).with_taxi(&["a1"]),
                Roster::new(RosterId::new(2))
                    .with_players(&["b1", "b2", "b3", "b4"])
                    .with_taxi(&["b1", "b2", "b3", "b4"]),
            ],
        )
        .with_transactions("L1", transactions)
}

async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    secret: Option<&str>,
) -> (StatusCode, Vec<u8>, Option<String>) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    if let Some(secret) = secret {
        builder = builder.header("x-admin-secret", secret);
    }
    let req = builder.body(axum::body::Body::empty()).unwrap();

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    (status, body, content_type)
}

fn json(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_admin_disabled_without_configured_secret() {
    let test_app = setup_test_app(None).await;
    let (status, body, _) = send(test_app.app, "POST", "/v1/admin/taxi/runs", Some("x")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json(&body)["code"], "admin_disabled");
}

#[tokio::test]
async fn test_wrong_or_missing_secret_is_unauthorized() {
    let test_app = setup_test_app(Some("s3cret")).await;

    let (status, body, _) =
        send(test_app.app.clone(), "POST", "/v1/admin/taxi/runs", Some("nope")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json(&body)["code"], "unauthorized");

    let (status, _, _) = send(test_app.app, "POST", "/v1/admin/taxi/runs", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_run_snapshots_every_roster() {
    let test_app = setup_test_app(Some("s3cret")).await;

    let (status, body, _) = send(
        test_app.app.clone(),
        "POST",
        "/v1/admin/taxi/runs?runType=sun_pm_official",
        Some("s3cret"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let summary = json(&body);
    assert_eq!(summary["runType"], "sun_pm_official");
    assert_eq!(summary["season"], 2026);
    assert_eq!(summary["week"], 6);
    assert_eq!(summary["total"], 2);
    assert_eq!(summary["compliant"], 1);
    assert_eq!(summary["nonCompliant"], 1);
    assert_eq!(summary["snapshotsWritten"], 2);

    let (status, body, _) = send(
        test_app.app,
        "GET",
        "/v1/taxi/snapshots?season=2026&week=6&runType=sun_pm_official",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let snapshots = json(&body)["snapshots"].as_array().unwrap().clone();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0]["rosterId"], 1);
    assert_eq!(snapshots[0]["status"], "compliant");
    assert_eq!(snapshots[1]["status"], "non_compliant");
    assert_eq!(snapshots[1]["violationCount"], 1);
    assert_eq!(snapshots[1]["report"]["violations"][0]["kind"], "too_many_on_taxi");
    assert_eq!(snapshots[0]["runId"], summary["runId"]);
}

#[tokio::test]
async fn test_rerun_replaces_snapshot_and_outage_fails_run() {
    let test_app = setup_test_app(Some("s3cret")).await;

    let mut run_ids = Vec::new();
    for _ in 0..2 {
        let (status, body, _) = send(
            test_app.app.clone(),
            "POST",
            "/v1/admin/taxi/runs",
            Some("s3cret"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        run_ids.push(json(&body)["runId"].as_str().unwrap().to_string());
    }
    assert_ne!(run_ids[0], run_ids[1]);

    let (_, body, _) = send(
        test_app.app.clone(),
        "GET",
        "/v1/taxi/snapshots?season=2026&week=6&runType=admin_rerun",
        None,
    )
    .await;
    let snapshots = json(&body)["snapshots"].as_array().unwrap().clone();
    assert_eq!(snapshots.len(), 2);
    assert!(snapshots.iter().all(|s| s["runId"] == run_ids[1].as_str()));

    // Without the league itself there is no roster list to degrade per team.
    test_app.datasource.set_outage(true);
    let (status, body, _) =
        send(test_app.app, "POST", "/v1/admin/taxi/runs", Some("s3cret")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(&body)["code"], "internal_error");
}

#[tokio::test]
async fn test_csv_export() {
    let test_app = setup_test_app(Some("s3cret")).await;
    send(
        test_app.app.clone(),
        "POST",
        "/v1/admin/taxi/runs?runType=wed_warn",
        Some("s3cret"),
    )
    .await;

    let (status, body, content_type) = send(
        test_app.app,
        "GET",
        "/v1/taxi/snapshots.csv?season=2026",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/csv; charset=utf-8"));

    let text = String::from_utf8(body).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("season,week,run_type,roster_id"));
    assert!(lines[1].starts_with("2026,6,wed_warn,1,"));
    assert!(lines[2].contains(",non_compliant,false,1,"));
}

#[tokio::test]
async fn test_snapshot_query_rejects_bad_run_type() {
    let test_app = setup_test_app(None).await;
    let (status, body, _) = send(
        test_app.app,
        "GET",
        "/v1/taxi/snapshots?season=2026&runType=noon",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["code"], "invalid_run_type");
}
