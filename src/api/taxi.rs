use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::params::{parse_optional_season, parse_roster_id, parse_run_type, parse_season, parse_week};
use super::AppState;
use crate::db::TaxiSnapshotRow;
use crate::domain::{ComplianceReport, RunType};
use crate::error::AppError;
use crate::orchestration::RunSummary;

pub const ADMIN_SECRET_HEADER: &str = "x-admin-secret";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateQuery {
    pub season: Option<String>,
    pub roster_id: Option<String>,
    pub run_type: Option<String>,
}

pub async fn validate(
    Query(params): Query<ValidateQuery>,
    State(state): State<AppState>,
) -> Result<Json<ComplianceReport>, AppError> {
    let season = parse_season(params.season.as_deref())?;
    let roster_id = parse_roster_id(params.roster_id.as_deref())?;
    let run_type = parse_run_type(params.run_type.as_deref())?
        .unwrap_or_else(|| state.taxi.classify_now());

    state
        .taxi
        .validate(season, roster_id, run_type)
        .await?
        .map(Json)
        .ok_or_else(|| {
            AppError::not_found(
                "roster_not_found",
                format!("roster {} not found in season {}", roster_id, season),
            )
        })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQuery {
    pub run_type: Option<String>,
}

pub async fn trigger_run(
    Query(params): Query<RunQuery>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RunSummary>, AppError> {
    let Some(expected) = state.config.admin_secret.as_deref() else {
        return Err(AppError::AdminDisabled);
    };
    let provided = headers
        .get(ADMIN_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    if !secret_matches(provided, expected) {
        return Err(AppError::Unauthorized);
    }

    let run_type = parse_run_type(params.run_type.as_deref())?.unwrap_or(RunType::AdminRerun);
    let summary = state.taxi.run_all(run_type).await?;
    Ok(Json(summary))
}

/// Compare fixed-length digests in full so timing does not depend on the secret.
fn secret_matches(provided: Option<&str>, expected: &str) -> bool {
    let Some(provided) = provided else {
        return false;
    };
    let provided = Sha256::digest(provided.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    provided
        .iter()
        .zip(expected.iter())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotsQuery {
    pub season: Option<String>,
    pub week: Option<String>,
    pub run_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotsResponse {
    pub snapshots: Vec<SnapshotDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDto {
    pub season: i32,
    pub week: u32,
    pub run_type: RunType,
    pub roster_id: u32,
    pub run_id: String,
    pub status: String,
    pub compliant: Option<bool>,
    pub violation_count: u32,
    pub report_digest: String,
    pub created_at_ms: i64,
    pub report: serde_json::Value,
}

impl From<TaxiSnapshotRow> for SnapshotDto {
    fn from(row: TaxiSnapshotRow) -> Self {
        let report = serde_json::from_str(&row.report_json).unwrap_or(serde_json::Value::Null);
        Self {
            season: row.season.year(),
            week: row.week,
            run_type: row.run_type,
            roster_id: row.roster_id.as_u32(),
            run_id: row.run_id,
            status: row.status,
            compliant: row.compliant,
            violation_count: row.violation_count,
            report_digest: row.report_digest,
            created_at_ms: row.created_at.as_ms(),
            report,
        }
    }
}

async fn query_snapshots(
    state: &AppState,
    params: &SnapshotsQuery,
) -> Result<Vec<TaxiSnapshotRow>, AppError> {
    let season = match parse_optional_season(params.season.as_deref())? {
        Some(season) => season,
        None => state.taxi.current_season().await?,
    };
    let week = parse_week(params.week.as_deref())?;
    let run_type = parse_run_type(params.run_type.as_deref())?;
    Ok(state.repo.query_taxi_snapshots(season, week, run_type).await?)
}

pub async fn list_snapshots(
    Query(params): Query<SnapshotsQuery>,
    State(state): State<AppState>,
) -> Result<Json<SnapshotsResponse>, AppError> {
    let rows = query_snapshots(&state, &params).await?;
    Ok(Json(SnapshotsResponse {
        snapshots: rows.into_iter().map(SnapshotDto::from).collect(),
    }))
}

pub async fn export_snapshots_csv(
    Query(params): Query<SnapshotsQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let rows = query_snapshots(&state, &params).await?;
    let body = snapshots_to_csv(&rows)?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body))
}

fn snapshots_to_csv(rows: &[TaxiSnapshotRow]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "season",
            "week",
            "run_type",
            "roster_id",
            "run_id",
            "status",
            "compliant",
            "violation_count",
            "report_digest",
            "created_at_ms",
        ])
        .map_err(|e| AppError::Internal(e.to_string()))?;

    for row in rows {
        let compliant = match row.compliant {
            Some(true) => "true",
            Some(false) => "false",
            None => "",
        };
        writer
            .write_record([
                row.season.year().to_string(),
                row.week.to_string(),
                row.run_type.as_str().to_string(),
                row.roster_id.to_string(),
                row.run_id.clone(),
                row.status.clone(),
                compliant.to_string(),
                row.violation_count.to_string(),
                row.report_digest.clone(),
                row.created_at.as_ms().to_string(),
            ])
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(e.to_string()))
}
