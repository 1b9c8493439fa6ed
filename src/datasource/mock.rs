//! Mock data source for testing without network calls.

use super::{DataSourceError, LeagueDataSource, PlayerDirectory};
use crate::domain::{
    DraftInfo, DraftSelection, LeagueInfo, LeagueUser, LineupAppearance, NflState, PlayerInfo,
    Roster, Season, Transaction,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct LeagueFixture {
    info: Option<LeagueInfo>,
    rosters: Vec<Roster>,
    users: Vec<LeagueUser>,
    transactions: Vec<Transaction>,
    matchups: Vec<LineupAppearance>,
    drafts: Vec<(DraftInfo, Vec<DraftSelection>)>,
}

/// Mock data source that returns predefined test data.
#[derive(Debug, Clone)]
pub struct MockDataSource {
    leagues: HashMap<String, LeagueFixture>,
    players: PlayerDirectory,
    nfl_state: NflState,
    outage: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl MockDataSource {
    /// Create a new mock data source with empty data.
    pub fn new() -> Self {
        Self {
            leagues: HashMap::new(),
            players: Arc::new(HashMap::new()),
            nfl_state: NflState {
                season: Season::new(2026),
                week: 1,
            },
            outage: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_league(mut self, info: LeagueInfo) -> Self {
        let league_id = info.league_id.clone();
        self.fixture(&league_id).info = Some(info);
        self
    }

    pub fn with_rosters(mut self, league_id: &str, rosters: Vec<Roster>) -> Self {
        self.fixture(league_id).rosters.extend(rosters);
        self
    }

    pub fn with_users(mut self, league_id: &str, users: Vec<LeagueUser>) -> Self {
        self.fixture(league_id).users.extend(users);
        self
    }

    /// Transactions are served from the week matching their `week` field.
    pub fn with_transactions(mut self, league_id: &str, transactions: Vec<Transaction>) -> Self {
        self.fixture(league_id).transactions.extend(transactions);
        self
    }

    pub fn with_matchups(mut self, league_id: &str, matchups: Vec<LineupAppearance>) -> Self {
        self.fixture(league_id).matchups.extend(matchups);
        self
    }

    pub fn with_draft(
        mut self,
        league_id: &str,
        draft: DraftInfo,
        picks: Vec<DraftSelection>,
    ) -> Self {
        self.fixture(league_id).drafts.push((draft, picks));
        self
    }

    pub fn with_players(mut self, players: Vec<PlayerInfo>) -> Self {
        self.players = Arc::new(
            players
                .into_iter()
                .map(|p| (p.player_id.clone(), p))
                .collect(),
        );
        self
    }

    pub fn with_nfl_state(mut self, season: Season, week: u32) -> Self {
        self.nfl_state = NflState { season, week };
        self
    }

    /// Make every call fail with a network error until `set_outage(false)`.
    pub fn with_outage(self) -> Self {
        self.set_outage(true);
        self
    }

    pub fn set_outage(&self, down: bool) {
        self.outage.store(down, Ordering::SeqCst);
    }

    /// Number of fetch calls served so far, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fixture(&mut self, league_id: &str) -> &mut LeagueFixture {
        self.leagues.entry(league_id.to_string()).or_default()
    }

    fn league(&self, league_id: &str) -> Result<&LeagueFixture, DataSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.outage.load(Ordering::SeqCst) {
            return Err(DataSourceError::NetworkError(
                "mock upstream unavailable".to_string(),
            ));
        }
        self.leagues
            .get(league_id)
            .ok_or_else(|| DataSourceError::NotFound(format!("/league/{}", league_id)))
    }

    fn check_up(&self) -> Result<(), DataSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.outage.load(Ordering::SeqCst) {
            return Err(DataSourceError::NetworkError(
                "mock upstream unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MockDataSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LeagueDataSource for MockDataSource {
    async fn fetch_league(&self, league_id: &str) -> Result<LeagueInfo, DataSourceError> {
        self.league(league_id)?
            .info
            .clone()
            .ok_or_else(|| DataSourceError::NotFound(format!("/league/{}", league_id)))
    }

    async fn fetch_rosters(&self, league_id: &str) -> Result<Vec<Roster>, DataSourceError> {
        Ok(self.league(league_id)?.rosters.clone())
    }

    async fn fetch_users(&self, league_id: &str) -> Result<Vec<LeagueUser>, DataSourceError> {
        Ok(self.league(league_id)?.users.clone())
    }

    async fn fetch_transactions(
        &self,
        league_id: &str,
        week: u32,
    ) -> Result<Vec<Transaction>, DataSourceError> {
        Ok(self
            .league(league_id)?
            .transactions
            .iter()
            .filter(|t| t.week == week)
            .cloned()
            .collect())
    }

    async fn fetch_matchups(
        &self,
        league_id: &str,
        week: u32,
    ) -> Result<Vec<LineupAppearance>, DataSourceError> {
        Ok(self
            .league(league_id)?
            .matchups
            .iter()
            .filter(|m| m.week == week)
            .cloned()
            .collect())
    }

    async fn fetch_drafts(&self, league_id: &str) -> Result<Vec<DraftInfo>, DataSourceError> {
        Ok(self
            .league(league_id)?
            .drafts
            .iter()
            .map(|(d, _)| d.clone())
            .collect())
    }

    async fn fetch_draft_picks(
        &self,
        draft: &DraftInfo,
    ) -> Result<Vec<DraftSelection>, DataSourceError> {
        self.check_up()?;
        Ok(self
            .leagues
            .values()
            .flat_map(|l| l.drafts.iter())
            .filter(|(d, _)| d.draft_id == draft.draft_id)
            .flat_map(|(_, picks)| picks.iter().cloned())
            .collect())
    }

    async fn fetch_players(&self) -> Result<PlayerDirectory, DataSourceError> {
        self.check_up()?;
        Ok(self.players.clone())
    }

    async fn fetch_nfl_state(&self) -> Result<NflState, DataSourceError> {
        self.check_up()?;
        Ok(self.nfl_state)
    }
}
