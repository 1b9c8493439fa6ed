//! Player reference data and weekly lineup appearances.

use crate::domain::{PlayerId, RosterId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
    K,
    DEF,
    Other(String),
}

impl Position {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "QB" => Position::QB,
            "RB" => Position::RB,
            "WR" => Position::WR,
            "TE" => Position::TE,
            "K" => Position::K,
            "DEF" => Position::DEF,
            other => Position::Other(other.to_string()),
        }
    }

    pub fn is_quarterback(&self) -> bool {
        matches!(self, Position::QB)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::QB => write!(f, "QB"),
            Position::RB => write!(f, "RB"),
            Position::WR => write!(f, "WR"),
            Position::TE => write!(f, "TE"),
            Position::K => write!(f, "K"),
            Position::DEF => write!(f, "DEF"),
            Position::Other(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub player_id: PlayerId,
    pub full_name: String,
    pub position: Position,
}

impl PlayerInfo {
    pub fn new(player_id: &str, full_name: &str, position: Position) -> Self {
        Self {
            player_id: PlayerId::new(player_id),
            full_name: full_name.to_string(),
            position,
        }
    }
}

/// Starters a roster fielded in one scoring week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineupAppearance {
    pub week: u32,
    pub roster_id: RosterId,
    pub starters: Vec<PlayerId>,
}

impl LineupAppearance {
    pub fn new(week: u32, roster_id: u32, starters: &[&str]) -> Self {
        Self {
            week,
            roster_id: RosterId::new(roster_id),
            starters: starters.iter().map(|p| PlayerId::new(*p)).collect(),
        }
    }
}
