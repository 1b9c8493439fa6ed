//! Roster and league membership types.

use crate::domain::{PlayerId, RosterId, Season};
use serde::{Deserialize, Serialize};

/// A team in the league with its current lineup state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub roster_id: RosterId,
    /// Sleeper user id of the manager; `None` for orphaned teams.
    pub owner_id: Option<String>,
    /// Canonical display name, resolved from the owner's team name.
    pub team_name: String,
    pub players: Vec<PlayerId>,
    pub starters: Vec<PlayerId>,
    /// Injured-reserve slots.
    pub reserve: Vec<PlayerId>,
    pub taxi: Vec<PlayerId>,
}

impl Roster {
    pub fn new(roster_id: RosterId) -> Self {
        Self {
            roster_id,
            owner_id: None,
            team_name: format!("Team {}", roster_id),
            players: Vec::new(),
            starters: Vec::new(),
            reserve: Vec::new(),
            taxi: Vec::new(),
        }
    }

    pub fn with_team_name(mut self, name: impl Into<String>) -> Self {
        self.team_name = name.into();
        self
    }

    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn with_players(mut self, players: &[&str]) -> Self {
        self.players = players.iter().map(|p| PlayerId::new(*p)).collect();
        self
    }

    pub fn with_starters(mut self, starters: &[&str]) -> Self {
        self.starters = starters.iter().map(|p| PlayerId::new(*p)).collect();
        self
    }

    pub fn with_reserve(mut self, reserve: &[&str]) -> Self {
        self.reserve = reserve.iter().map(|p| PlayerId::new(*p)).collect();
        self
    }

    pub fn with_taxi(mut self, taxi: &[&str]) -> Self {
        self.taxi = taxi.iter().map(|p| PlayerId::new(*p)).collect();
        self
    }
}

/// A league member as returned by the users feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueUser {
    pub user_id: String,
    pub display_name: String,
    pub team_name: Option<String>,
}

impl LeagueUser {
    /// Team name if the manager set one, otherwise their display name.
    pub fn canonical_team_name(&self) -> &str {
        self.team_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.display_name)
    }
}

/// League-level settings needed by the engines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueInfo {
    pub league_id: String,
    pub name: String,
    pub season: Season,
    pub previous_league_id: Option<String>,
    pub draft_rounds: u32,
    pub taxi_slots: u32,
    pub total_rosters: u32,
}

/// Current NFL calendar position as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NflState {
    pub season: Season,
    pub week: u32,
}
