//! Query parameter parsing with fixed error codes.

use crate::domain::{RosterId, RunType, Season};
use crate::error::AppError;
use std::str::FromStr;

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

pub fn parse_season(raw: Option<&str>) -> Result<Season, AppError> {
    present(raw)
        .and_then(Season::parse)
        .ok_or_else(|| AppError::bad_request("invalid_season", "season must be a four-digit year"))
}

pub fn parse_optional_season(raw: Option<&str>) -> Result<Option<Season>, AppError> {
    match present(raw) {
        None => Ok(None),
        Some(s) => parse_season(Some(s)).map(Some),
    }
}

pub fn parse_roster_id(raw: Option<&str>) -> Result<RosterId, AppError> {
    present(raw)
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|id| *id > 0)
        .map(RosterId::new)
        .ok_or_else(|| {
            AppError::bad_request("invalid_roster_id", "rosterId must be a positive integer")
        })
}

pub fn parse_run_type(raw: Option<&str>) -> Result<Option<RunType>, AppError> {
    match present(raw) {
        None => Ok(None),
        Some(s) => RunType::from_str(s).map(Some).map_err(|_| {
            AppError::bad_request(
                "invalid_run_type",
                format!(
                    "runType must be one of {}",
                    RunType::ALL.map(|r| r.as_str()).join(", ")
                ),
            )
        }),
    }
}

pub fn parse_week(raw: Option<&str>) -> Result<Option<u32>, AppError> {
    match present(raw) {
        None => Ok(None),
        Some(s) => s
            .parse::<u32>()
            .ok()
            .filter(|w| *w <= 25)
            .map(Some)
            .ok_or_else(|| AppError::bad_request("invalid_week", "week must be between 0 and 25")),
    }
}
