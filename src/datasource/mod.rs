//! Data source abstraction for reading league state from the fantasy platform.

use crate::domain::{
    DraftInfo, DraftSelection, LeagueInfo, LeagueUser, LineupAppearance, NflState, PlayerId,
    PlayerInfo, Roster, Transaction,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub mod cached;
pub mod mock;
pub mod sleeper;

pub use cached::{CacheTtls, CachedDataSource};
pub use mock::MockDataSource;
pub use sleeper::SleeperDataSource;

/// Player directory keyed by id. Shared because the full directory is large.
pub type PlayerDirectory = Arc<HashMap<PlayerId, PlayerInfo>>;

/// Read-only access to league data.
///
/// Implementations return records in feed order; callers sort where order matters.
#[async_trait]
pub trait LeagueDataSource: Send + Sync + fmt::Debug {
    /// Fetch league settings, including the link to the previous season's league.
    async fn fetch_league(&self, league_id: &str) -> Result<LeagueInfo, DataSourceError>;

    /// Fetch all rosters. Team names are left at their defaults; see `fetch_users`.
    async fn fetch_rosters(&self, league_id: &str) -> Result<Vec<Roster>, DataSourceError>;

    async fn fetch_users(&self, league_id: &str) -> Result<Vec<LeagueUser>, DataSourceError>;

    /// Fetch transactions processed in one week ("leg").
    async fn fetch_transactions(
        &self,
        league_id: &str,
        week: u32,
    ) -> Result<Vec<Transaction>, DataSourceError>;

    /// Fetch each roster's starters for one scoring week.
    async fn fetch_matchups(
        &self,
        league_id: &str,
        week: u32,
    ) -> Result<Vec<LineupAppearance>, DataSourceError>;

    async fn fetch_drafts(&self, league_id: &str) -> Result<Vec<DraftInfo>, DataSourceError>;

    async fn fetch_draft_picks(
        &self,
        draft: &DraftInfo,
    ) -> Result<Vec<DraftSelection>, DataSourceError>;

    async fn fetch_players(&self) -> Result<PlayerDirectory, DataSourceError>;

    async fn fetch_nfl_state(&self) -> Result<NflState, DataSourceError>;
}

/// Error type for data source operations.
#[derive(Debug, Clone)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 429 rate limit, 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// Rate limit exceeded
    RateLimited,
    /// The platform answered but has no such resource
    NotFound(String),
    /// Other error
    Other(String),
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DataSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::RateLimited => write!(f, "Rate limited"),
            DataSourceError::NotFound(what) => write!(f, "Not found: {}", what),
            DataSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datasource_error_display() {
        let err = DataSourceError::NetworkError("connection timeout".to_string());
        assert_eq!(err.to_string(), "Network error: connection timeout");

        let err = DataSourceError::HttpError {
            status: 429,
            message: "Too many requests".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 429: Too many requests");

        let err = DataSourceError::NotFound("league 42".to_string());
        assert_eq!(err.to_string(), "Not found: league 42");

        let err = DataSourceError::RateLimited;
        assert_eq!(err.to_string(), "Rate limited");
    }
}
