//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations:
//! - compliance report snapshots (audit log, last write wins per key)
//! - first-seen observations of taxi players

use crate::domain::{ComplianceReport, PlayerId, RosterId, RunType, Season, TimeMs};
use sha2::{Digest, Sha256};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

/// A stored compliance snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxiSnapshotRow {
    pub season: Season,
    pub week: u32,
    pub run_type: RunType,
    pub roster_id: RosterId,
    pub run_id: String,
    pub status: String,
    pub compliant: Option<bool>,
    pub violation_count: u32,
    pub report_json: String,
    pub report_digest: String,
    pub created_at: TimeMs,
}

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Round-trip a trivial query to confirm the database is reachable.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // =========================================================================
    // Compliance snapshots
    // =========================================================================

    /// Store a report under `(season, week, run_type, roster_id)`, replacing any
    /// earlier report with the same key.
    ///
    /// # Errors
    /// Returns an error if the report cannot be encoded or the upsert fails.
    pub async fn upsert_taxi_snapshot(
        &self,
        week: u32,
        run_id: &str,
        report: &ComplianceReport,
        created_at: TimeMs,
    ) -> Result<(), sqlx::Error> {
        let report_json = serde_json::to_string(report)
            .map_err(|e| sqlx::Error::Protocol(format!("report encoding failed: {}", e)))?;
        let report_digest = hex::encode(Sha256::digest(report_json.as_bytes()));

        sqlx::query(
            r#"
            INSERT INTO taxi_snapshots (
                season, week, run_type, roster_id, run_id, status, compliant,
                violation_count, report_json, report_digest, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(season, week, run_type, roster_id) DO UPDATE SET
                run_id = excluded.run_id,
                status = excluded.status,
                compliant = excluded.compliant,
                violation_count = excluded.violation_count,
                report_json = excluded.report_json,
                report_digest = excluded.report_digest,
                created_at = excluded.created_at
            "#,
        )
        .bind(report.season.year())
        .bind(i64::from(week))
        .bind(report.run_type.as_str())
        .bind(i64::from(report.roster_id.as_u32()))
        .bind(run_id)
        .bind(report.status.as_str())
        .bind(report.compliant)
        .bind(report.violations.len() as i64)
        .bind(&report_json)
        .bind(&report_digest)
        .bind(created_at.as_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Query snapshots for a season, optionally narrowed to a week and run type.
    ///
    /// Ordered by (week, run_type, roster_id).
    pub async fn query_taxi_snapshots(
        &self,
        season: Season,
        week: Option<u32>,
        run_type: Option<RunType>,
    ) -> Result<Vec<TaxiSnapshotRow>, sqlx::Error> {
        let week = week.map(i64::from);
        let run_type = run_type.map(|r| r.as_str());

        let rows = sqlx::query(
            r#"
            SELECT season, week, run_type, roster_id, run_id, status, compliant,
                   violation_count, report_json, report_digest, created_at
            FROM taxi_snapshots
            WHERE season = ?
              AND (? IS NULL OR week = ?)
              AND (? IS NULL OR run_type = ?)
            ORDER BY week ASC, run_type ASC, roster_id ASC
            "#,
        )
        .bind(season.year())
        .bind(week)
        .bind(week)
        .bind(run_type)
        .bind(run_type)
        .fetch_all(&self.pool)
        .await?;

        let snapshots = rows
            .iter()
            .filter_map(|row| {
                let run_type_str: String = row.get("run_type");
                let Ok(run_type) = RunType::from_str(&run_type_str) else {
                    warn!(run_type = %run_type_str, "Skipping snapshot with unknown run type");
                    return None;
                };
                let week: i64 = row.get("week");
                let roster_id: i64 = row.get("roster_id");
                let violation_count: i64 = row.get("violation_count");

                Some(TaxiSnapshotRow {
                    season: Season::new(row.get::<i64, _>("season") as i32),
                    week: week as u32,
                    run_type,
                    roster_id: RosterId::new(roster_id as u32),
                    run_id: row.get("run_id"),
                    status: row.get("status"),
                    compliant: row.get("compliant"),
                    violation_count: violation_count as u32,
                    report_json: row.get("report_json"),
                    report_digest: row.get("report_digest"),
                    created_at: TimeMs::new(row.get("created_at")),
                })
            })
            .collect();

        Ok(snapshots)
    }

    // =========================================================================
    // Taxi observations
    // =========================================================================

    /// Record that `players` are on the roster's taxi squad as of `seen_at`
    /// and return the first time each of them was seen there.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn record_taxi_observations(
        &self,
        league_id: &str,
        roster_id: RosterId,
        players: &[PlayerId],
        seen_at: TimeMs,
    ) -> Result<HashMap<PlayerId, TimeMs>, sqlx::Error> {
        if players.is_empty() {
            return Ok(HashMap::new());
        }

        let roster = i64::from(roster_id.as_u32());
        let mut tx = self.pool.begin().await?;
        let mut first_seen = HashMap::with_capacity(players.len());

        for player in players {
            sqlx::query(
                r#"
                INSERT INTO taxi_observations (league_id, roster_id, player_id, first_seen_ms)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(league_id, roster_id, player_id) DO NOTHING
                "#,
            )
            .bind(league_id)
            .bind(roster)
            .bind(player.as_str())
            .bind(seen_at.as_ms())
            .execute(&mut *tx)
            .await?;

            let row = sqlx::query(
                "SELECT first_seen_ms FROM taxi_observations WHERE league_id = ? AND roster_id = ? AND player_id = ?",
            )
            .bind(league_id)
            .bind(roster)
            .bind(player.as_str())
            .fetch_one(&mut *tx)
            .await?;

            first_seen.insert(player.clone(), TimeMs::new(row.get("first_seen_ms")));
        }

        tx.commit().await?;
        Ok(first_seen)
    }
}
