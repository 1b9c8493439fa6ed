//! Opens the audit database and brings its schema up to date.

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::Row;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Bumped whenever `schema.sql` gains a statement.
const SCHEMA_VERSION: i64 = 1;

/// Open (creating if needed) the SQLite file at `db_path` and apply the schema.
///
/// # Errors
/// Fails if the parent directory cannot be created, the file cannot be opened,
/// or a schema statement is rejected.
pub async fn init_db(db_path: &str) -> Result<SqlitePool, sqlx::Error> {
    let path = Path::new(db_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    let version = apply_schema(&pool).await?;
    info!(db_path, schema_version = version, "Audit database ready");
    Ok(pool)
}

/// Run every `schema.sql` statement in one transaction and stamp `user_version`.
///
/// Statements are `IF NOT EXISTS`, so re-running against a current database is a no-op.
async fn apply_schema(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let current: i64 = sqlx::query("PRAGMA user_version")
        .fetch_one(pool)
        .await?
        .get(0);

    let mut tx = pool.begin().await?;
    for statement in schema_statements(include_str!("schema.sql")) {
        sqlx::query(&statement).execute(&mut *tx).await?;
    }
    if current < SCHEMA_VERSION {
        sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    debug!(from = current, to = SCHEMA_VERSION.max(current), "Schema applied");
    Ok(SCHEMA_VERSION.max(current))
}

/// Split a script on `;`, dropping `--` comment lines and blank statements.
fn schema_statements(script: &str) -> Vec<String> {
    script
        .split(';')
        .map(|statement| {
            statement
                .lines()
                .filter(|line| !line.trim_start().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn db_path(temp_dir: &TempDir, relative: &str) -> String {
        temp_dir.path().join(relative).to_string_lossy().to_string()
    }

    #[test]
    fn test_schema_statements_skip_comments() {
        let statements = schema_statements("-- header\nCREATE TABLE a (x);\n\n-- only a comment\n;");
        assert_eq!(statements, vec!["CREATE TABLE a (x)".to_string()]);

        let shipped = schema_statements(include_str!("schema.sql"));
        assert!(shipped.iter().all(|s| !s.contains("--")));
        assert_eq!(shipped.len(), 3);
    }

    #[tokio::test]
    async fn test_init_db_creates_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = db_path(&temp_dir, "audit/2026/leaguedesk.db");

        let pool = init_db(&path).await.expect("init_db failed");
        assert!(Path::new(&path).exists());

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        let names: Vec<_> = tables.into_iter().map(|t| t.0).collect();
        assert_eq!(names, vec!["taxi_observations", "taxi_snapshots"]);
    }

    #[tokio::test]
    async fn test_init_db_reports_unusable_directory() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let path = blocker.join("leaguedesk.db").to_string_lossy().to_string();

        let err = init_db(&path).await.unwrap_err();
        assert!(matches!(err, sqlx::Error::Io(_)), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_reopen_keeps_rows_and_version() {
        let temp_dir = TempDir::new().unwrap();
        let path = db_path(&temp_dir, "leaguedesk.db");

        let pool = init_db(&path).await.unwrap();
        sqlx::query(
            "INSERT INTO taxi_observations (league_id, roster_id, player_id, first_seen_ms) VALUES ('L1', 1, 'p1', 5)",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool.close().await;

        let pool = init_db(&path).await.unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM taxi_observations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let (version,): (i64,) = sqlx::query_as("PRAGMA user_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_connection_pragmas() {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&db_path(&temp_dir, "leaguedesk.db")).await.unwrap();

        let (foreign_keys,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(foreign_keys, 1);

        let (busy_timeout,): (i64,) = sqlx::query_as("PRAGMA busy_timeout")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(busy_timeout, 5000);
    }
}
