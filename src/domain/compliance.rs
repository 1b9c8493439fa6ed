//! Taxi squad compliance report types.

use crate::domain::{PlayerId, RosterId, RunType, Season, SeasonWeek, TimeMs};
use serde::{Deserialize, Serialize};

/// How a player most recently arrived on the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeSource {
    FreeAgent,
    Trade,
    RookieDraft,
    Waiver,
    Commissioner,
    Unknown,
}

impl IntakeSource {
    /// Sources that qualify a player for taxi on their own.
    ///
    /// A waiver claim qualifies only when nobody else held the player before
    /// the claim; that needs the transaction history and is decided by the validator.
    pub fn is_valid_for_taxi(&self) -> bool {
        matches!(
            self,
            IntakeSource::FreeAgent | IntakeSource::Trade | IntakeSource::RookieDraft
        )
    }
}

/// The other roster slot a taxi player was also found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterSlot {
    Starters,
    Reserve,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComplianceViolation {
    TooManyOnTaxi {
        limit: u32,
        count: u32,
        players: Vec<PlayerId>,
    },
    TooManyQuarterbacks {
        limit: u32,
        count: u32,
        players: Vec<PlayerId>,
    },
    InvalidIntakeSource {
        player_id: PlayerId,
        source: IntakeSource,
        /// Roster the player was claimed away from, for waiver intake.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        claimed_from: Option<RosterId>,
    },
    RosterInconsistent {
        player_id: PlayerId,
        also_in: RosterSlot,
    },
    BoomerangActivePlayer {
        player_id: PlayerId,
        started_weeks: Vec<SeasonWeek>,
    },
}

impl ComplianceViolation {
    pub fn label(&self) -> &'static str {
        match self {
            ComplianceViolation::TooManyOnTaxi { .. } => "too_many_on_taxi",
            ComplianceViolation::TooManyQuarterbacks { .. } => "too_many_quarterbacks",
            ComplianceViolation::InvalidIntakeSource { .. } => "invalid_intake_source",
            ComplianceViolation::RosterInconsistent { .. } => "roster_inconsistent",
            ComplianceViolation::BoomerangActivePlayer { .. } => "boomerang_active_player",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    /// Upstream data could not be fetched; nothing is known about the roster.
    Unknown,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Compliant => "compliant",
            ComplianceStatus::NonCompliant => "non_compliant",
            ComplianceStatus::Unknown => "unknown",
        }
    }
}

/// A player currently on taxi, with display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxiPlayerRef {
    pub player_id: PlayerId,
    pub name: Option<String>,
    pub position: Option<String>,
    pub intake_source: IntakeSource,
    pub acquired_at: Option<TimeMs>,
    pub observed_since: Option<TimeMs>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub season: Season,
    pub roster_id: RosterId,
    pub run_type: RunType,
    pub status: ComplianceStatus,
    /// `None` only when `status` is `Unknown`.
    pub compliant: Option<bool>,
    pub violations: Vec<ComplianceViolation>,
    /// Advisory findings that do not affect `compliant`.
    pub warnings: Vec<ComplianceViolation>,
    pub current_taxi: Vec<TaxiPlayerRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable_reason: Option<String>,
}

impl ComplianceReport {
    /// Placeholder recorded when the roster's upstream data could not be fetched.
    pub fn unknown(
        season: Season,
        roster_id: RosterId,
        run_type: RunType,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            season,
            roster_id,
            run_type,
            status: ComplianceStatus::Unknown,
            compliant: None,
            violations: Vec::new(),
            warnings: Vec::new(),
            current_taxi: Vec::new(),
            unavailable_reason: Some(reason.into()),
        }
    }

    pub fn is_compliant(&self) -> bool {
        self.compliant == Some(true)
    }
}
