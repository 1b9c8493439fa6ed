//! Future draft-pick ownership from trade replay.

use crate::domain::ordering::sort_transactions_deterministic;
use crate::domain::{
    DraftPickClaim, DraftPickTransfer, RosterId, Season, TimeMs, Transaction, TransactionKind,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, warn};

/// Identifies a pick within one season: whose slot it was and which round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickKey {
    pub original_roster_id: RosterId,
    pub round: u32,
}

impl PickKey {
    pub fn new(original_roster_id: RosterId, round: u32) -> Self {
        Self {
            original_roster_id,
            round,
        }
    }
}

/// One hand-off of a pick, kept for audit display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickTransferRecord {
    pub from_roster_id: RosterId,
    pub to_roster_id: RosterId,
    pub trade_id: String,
    pub at: TimeMs,
}

/// Ownership of every pick of one season, with per-pick transfer history.
///
/// Owners are always the result of replaying every accepted transaction from
/// scratch in `(status_updated, transaction_id)` order, so the result does not
/// depend on how the input was batched.
#[derive(Debug, Clone)]
pub struct PickOwnershipLedger {
    season: Season,
    rounds: u32,
    rosters: BTreeSet<RosterId>,
    owners: BTreeMap<PickKey, RosterId>,
    history: BTreeMap<PickKey, Vec<PickTransferRecord>>,
    seen: HashSet<String>,
    accepted: Vec<Transaction>,
}

impl PickOwnershipLedger {
    /// Every roster starts out owning its own pick in every round.
    pub fn new(rosters: &[RosterId], season: Season, rounds: u32) -> Self {
        let rosters: BTreeSet<RosterId> = rosters.iter().copied().collect();
        let mut ledger = Self {
            season,
            rounds,
            rosters,
            owners: BTreeMap::new(),
            history: BTreeMap::new(),
            seen: HashSet::new(),
            accepted: Vec::new(),
        };
        ledger.reset();
        ledger
    }

    /// Add a batch of transactions and replay.
    ///
    /// Transactions that are not complete, carry no picks, or were already
    /// applied are skipped.
    pub fn apply(&mut self, batch: &[Transaction]) {
        let mut added = 0usize;
        for tx in batch {
            if !tx.is_complete() || tx.draft_picks.is_empty() {
                continue;
            }
            if !matches!(tx.kind, TransactionKind::Trade | TransactionKind::Commissioner) {
                continue;
            }
            if !self.seen.insert(tx.transaction_id.clone()) {
                continue;
            }
            self.accepted.push(tx.clone());
            added += 1;
        }

        if added > 0 {
            sort_transactions_deterministic(&mut self.accepted);
            self.replay();
        }
    }

    pub fn season(&self) -> Season {
        self.season
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn rosters(&self) -> impl Iterator<Item = RosterId> + '_ {
        self.rosters.iter().copied()
    }

    pub fn owner(&self, original_roster_id: RosterId, round: u32) -> Option<RosterId> {
        self.owners
            .get(&PickKey::new(original_roster_id, round))
            .copied()
    }

    /// Transfer history of a pick, oldest first. Empty if never traded.
    pub fn history(&self, original_roster_id: RosterId, round: u32) -> &[PickTransferRecord] {
        self.history
            .get(&PickKey::new(original_roster_id, round))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All claims ordered by (original roster, round).
    pub fn claims(&self) -> Vec<DraftPickClaim> {
        self.owners
            .iter()
            .map(|(key, owner)| DraftPickClaim {
                season: self.season,
                round: key.round,
                original_roster_id: key.original_roster_id,
                current_owner_roster_id: *owner,
            })
            .collect()
    }

    /// Picks currently held by `roster`, ordered by (round, original roster).
    pub fn owned_by(&self, roster: RosterId) -> Vec<DraftPickClaim> {
        let mut claims: Vec<_> = self
            .claims()
            .into_iter()
            .filter(|c| c.current_owner_roster_id == roster)
            .collect();
        claims.sort_by_key(|c| (c.round, c.original_roster_id));
        claims
    }

    fn reset(&mut self) {
        self.owners.clear();
        self.history.clear();
        for roster in &self.rosters {
            for round in 1..=self.rounds {
                self.owners.insert(PickKey::new(*roster, round), *roster);
            }
        }
    }

    fn replay(&mut self) {
        self.reset();
        let accepted = std::mem::take(&mut self.accepted);
        for tx in &accepted {
            for transfer in &tx.draft_picks {
                if transfer.season != self.season {
                    continue;
                }
                if !self.is_known_transfer(transfer, &tx.transaction_id) {
                    continue;
                }

                let key = PickKey::new(transfer.original_roster_id, transfer.round);
                if let Some(current) = self.owners.get(&key) {
                    if *current != transfer.previous_owner_id {
                        debug!(
                            trade_id = %tx.transaction_id,
                            round = transfer.round,
                            original = %transfer.original_roster_id,
                            expected_from = %current,
                            reported_from = %transfer.previous_owner_id,
                            "Pick transfer does not start from the replayed owner"
                        );
                    }
                }

                self.owners.insert(key, transfer.owner_id);
                self.history.entry(key).or_default().push(PickTransferRecord {
                    from_roster_id: transfer.previous_owner_id,
                    to_roster_id: transfer.owner_id,
                    trade_id: tx.transaction_id.clone(),
                    at: tx.status_updated,
                });
            }
        }
        self.accepted = accepted;
    }

    fn is_known_transfer(&self, transfer: &DraftPickTransfer, trade_id: &str) -> bool {
        let rosters_known = self.rosters.contains(&transfer.original_roster_id)
            && self.rosters.contains(&transfer.previous_owner_id)
            && self.rosters.contains(&transfer.owner_id);
        let round_known = (1..=self.rounds).contains(&transfer.round);
        if !rosters_known || !round_known {
            warn!(
                trade_id = %trade_id,
                season = %transfer.season,
                round = transfer.round,
                original = %transfer.original_roster_id,
                to = %transfer.owner_id,
                "Ignoring pick transfer outside the league's rosters or rounds"
            );
            return false;
        }
        true
    }
}

/// Compute current ownership of every `(original roster, round)` pick of `season`.
pub fn resolve_ownership(
    rosters: &[RosterId],
    trades: &[Transaction],
    season: Season,
    rounds: u32,
) -> PickOwnershipLedger {
    let mut ledger = PickOwnershipLedger::new(rosters, season, rounds);
    ledger.apply(trades);
    ledger
}
