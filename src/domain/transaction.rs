//! League transactions: trades, free-agent adds, waiver claims.

use crate::domain::{PlayerId, RosterId, Season, TimeMs};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Transaction type as labelled by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Trade,
    FreeAgent,
    Waiver,
    Commissioner,
    Other(String),
}

impl TransactionKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "trade" => TransactionKind::Trade,
            "free_agent" => TransactionKind::FreeAgent,
            "waiver" => TransactionKind::Waiver,
            "commissioner" => TransactionKind::Commissioner,
            other => TransactionKind::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Complete,
    Failed,
    Pending,
    Other(String),
}

impl TransactionStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "complete" => TransactionStatus::Complete,
            "failed" => TransactionStatus::Failed,
            "pending" => TransactionStatus::Pending,
            other => TransactionStatus::Other(other.to_string()),
        }
    }
}

/// Movement of one future draft pick inside a transaction.
///
/// `original_roster_id` identifies the pick (whose slot it was originally);
/// `previous_owner_id -> owner_id` is the hand-off this transaction performs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftPickTransfer {
    pub season: Season,
    pub round: u32,
    pub original_roster_id: RosterId,
    pub previous_owner_id: RosterId,
    pub owner_id: RosterId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    /// Scoring week the transaction was processed in (0 = offseason).
    pub week: u32,
    /// Time the transaction reached its current status.
    pub status_updated: TimeMs,
    pub roster_ids: Vec<RosterId>,
    pub adds: BTreeMap<PlayerId, RosterId>,
    pub drops: BTreeMap<PlayerId, RosterId>,
    pub draft_picks: Vec<DraftPickTransfer>,
}

impl Transaction {
    pub fn new(
        transaction_id: impl Into<String>,
        kind: TransactionKind,
        week: u32,
        status_updated: TimeMs,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            kind,
            status: TransactionStatus::Complete,
            week,
            status_updated,
            roster_ids: Vec::new(),
            adds: BTreeMap::new(),
            drops: BTreeMap::new(),
            draft_picks: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_add(mut self, player: &str, roster: u32) -> Self {
        self.adds.insert(PlayerId::new(player), RosterId::new(roster));
        self.touch_roster(RosterId::new(roster));
        self
    }

    pub fn with_drop(mut self, player: &str, roster: u32) -> Self {
        self.drops.insert(PlayerId::new(player), RosterId::new(roster));
        self.touch_roster(RosterId::new(roster));
        self
    }

    pub fn with_pick(mut self, season: i32, round: u32, original: u32, from: u32, to: u32) -> Self {
        self.draft_picks.push(DraftPickTransfer {
            season: Season::new(season),
            round,
            original_roster_id: RosterId::new(original),
            previous_owner_id: RosterId::new(from),
            owner_id: RosterId::new(to),
        });
        self.touch_roster(RosterId::new(from));
        self.touch_roster(RosterId::new(to));
        self
    }

    pub fn is_complete(&self) -> bool {
        self.status == TransactionStatus::Complete
    }

    fn touch_roster(&mut self, roster: RosterId) {
        if !self.roster_ids.contains(&roster) {
            self.roster_ids.push(roster);
        }
    }
}
