use anyhow::Context;
use leaguedesk::datasource::CacheTtls;
use leaguedesk::{
    api, config::Config, db::init_db, CachedDataSource, LeagueDataSource, LeagueHistory,
    OwnershipService, Repository, SleeperDataSource, SystemClock, TaxiService,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("Configuration error")?;
    let port = config.port;

    let pool = init_db(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    let repo = Arc::new(Repository::new(pool));

    let sleeper = SleeperDataSource::new(
        config.sleeper_api_url.clone(),
        Duration::from_millis(config.upstream_retry_max_ms),
    );
    let datasource: Arc<dyn LeagueDataSource> = Arc::new(CachedDataSource::new(
        Arc::new(sleeper),
        Arc::new(SystemClock),
        CacheTtls::default(),
    ));

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
        config.snapshots_enabled,
    ));
    let ownership = Arc::new(OwnershipService::new(
        datasource,
        history,
        config.draft_rounds,
    ));

    tracing::info!(
        league_id = %config.league_id,
        admin_enabled = config.admin_secret.is_some(),
        "Services initialized"
    );

    let app = api::create_router(api::AppState::new(repo, taxi, ownership, config));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
