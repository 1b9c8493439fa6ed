//! Taxi squad rule evaluation.
//!
//! Every rule is evaluated independently over the same input; a roster can
//! break several at once. The boomerang rule is the only one whose severity
//! depends on the run type.

use crate::domain::ordering::TransactionOrderingKey;
use crate::domain::{
    ComplianceReport, ComplianceStatus, ComplianceViolation, DraftSelection, IntakeSource,
    LineupAppearance, PlayerId, PlayerInfo, Roster, RosterId, RosterSlot, RunType, Season,
    SeasonWeek, TaxiPlayerRef, TimeMs, Transaction, TransactionKind,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// League limits on taxi composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxiRules {
    pub max_taxi_size: u32,
    pub max_taxi_qb: u32,
}

impl Default for TaxiRules {
    fn default() -> Self {
        Self {
            max_taxi_size: 3,
            max_taxi_qb: 1,
        }
    }
}

/// Transactions and starting lineups of one league season.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonActivity {
    pub season: Season,
    pub transactions: Vec<Transaction>,
    /// Empty when lineups for the season were not needed.
    pub appearances: Vec<LineupAppearance>,
}

impl SeasonActivity {
    pub fn new(season: Season) -> Self {
        Self {
            season,
            transactions: Vec::new(),
            appearances: Vec::new(),
        }
    }

    pub fn with_transactions(mut self, transactions: Vec<Transaction>) -> Self {
        self.transactions = transactions;
        self
    }

    pub fn with_appearances(mut self, appearances: Vec<LineupAppearance>) -> Self {
        self.appearances = appearances;
        self
    }

    fn transactions_in_season(&self) -> impl Iterator<Item = (Season, &Transaction)> + '_ {
        self.transactions.iter().map(move |tx| (self.season, tx))
    }
}

/// Everything the validator needs about one roster, already fetched.
#[derive(Debug, Clone, Copy)]
pub struct TaxiValidationInput<'a> {
    pub season: Season,
    pub roster: &'a Roster,
    /// The validated season and any earlier seasons of the league, in any order.
    pub activity: &'a [SeasonActivity],
    pub draft_selections: &'a [DraftSelection],
    pub players: &'a HashMap<PlayerId, PlayerInfo>,
}

/// Most recent arrival of a player on a roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acquisition {
    pub source: IntakeSource,
    pub at: Option<TimeMs>,
    /// Start of the current tenure. Rookie drafts start at week 0 of the draft's season.
    pub since: SeasonWeek,
    /// For waiver claims, the roster that held the player just before.
    pub claimed_from: Option<RosterId>,
}

impl Acquisition {
    fn unknown(season: Season) -> Self {
        Self {
            source: IntakeSource::Unknown,
            at: None,
            since: SeasonWeek::start_of(season),
            claimed_from: None,
        }
    }

    /// Waivers count only for players nobody else was holding.
    pub fn is_valid_for_taxi(&self) -> bool {
        match self.source {
            IntakeSource::Waiver => self.claimed_from.is_none(),
            source => source.is_valid_for_taxi(),
        }
    }
}

/// Find how `player` most recently joined `roster_id`.
///
/// Considers complete transactions that add the player to the roster and
/// rookie-draft selections by the roster; the latest one wins, with the
/// transaction ordering key breaking same-time ties. With no history at all
/// the tenure is taken to start with `season`.
pub fn resolve_acquisition(
    player: &PlayerId,
    roster_id: RosterId,
    season: Season,
    activity: &[SeasonActivity],
    draft_selections: &[DraftSelection],
) -> Acquisition {
    let latest_tx = activity
        .iter()
        .flat_map(|a| a.transactions_in_season())
        .filter(|(_, tx)| tx.is_complete() && tx.adds.get(player) == Some(&roster_id))
        .max_by_key(|(_, tx)| TransactionOrderingKey::from_transaction(tx));

    let latest_draft = draft_selections
        .iter()
        .filter(|s| &s.player_id == player && s.roster_id == roster_id)
        .max_by_key(|s| s.drafted_at);

    let from_tx = latest_tx.map(|(tx_season, tx)| {
        let source = intake_source_for(&tx.kind);
        let claimed_from = match source {
            IntakeSource::Waiver => previous_holder(
                player,
                roster_id,
                &TransactionOrderingKey::from_transaction(tx),
                activity,
            ),
            _ => None,
        };
        Acquisition {
            source,
            at: Some(tx.status_updated),
            since: SeasonWeek::new(tx_season, tx.week),
            claimed_from,
        }
    });
    let from_draft = latest_draft.map(|s| Acquisition {
        source: IntakeSource::RookieDraft,
        at: Some(s.drafted_at),
        since: SeasonWeek::start_of(s.season),
        claimed_from: None,
    });

    match (from_tx, from_draft) {
        (Some(tx), Some(draft)) if draft.at > tx.at => draft,
        (Some(tx), _) => tx,
        (None, Some(draft)) => draft,
        (None, None) => Acquisition::unknown(season),
    }
}

/// The other roster that last touched `player` before the transaction keyed `before`.
///
/// An add puts the player on a roster and a drop takes them off one; either
/// way that roster was the last holder.
fn previous_holder(
    player: &PlayerId,
    roster_id: RosterId,
    before: &TransactionOrderingKey,
    activity: &[SeasonActivity],
) -> Option<RosterId> {
    activity
        .iter()
        .flat_map(|a| a.transactions.iter())
        .filter(|tx| tx.is_complete())
        .filter_map(|tx| {
            let key = TransactionOrderingKey::from_transaction(tx);
            if key >= *before {
                return None;
            }
            let holder = tx.adds.get(player).or_else(|| tx.drops.get(player))?;
            Some((key, *holder))
        })
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, holder)| holder)
        .filter(|holder| *holder != roster_id)
}

fn intake_source_for(kind: &TransactionKind) -> IntakeSource {
    match kind {
        TransactionKind::FreeAgent => IntakeSource::FreeAgent,
        TransactionKind::Trade => IntakeSource::Trade,
        TransactionKind::Waiver => IntakeSource::Waiver,
        TransactionKind::Commissioner => IntakeSource::Commissioner,
        TransactionKind::Other(_) => IntakeSource::Unknown,
    }
}

/// Weeks, across seasons, in which `player` started for `roster_id` from `since` on.
fn started_weeks(
    player: &PlayerId,
    roster_id: RosterId,
    since: SeasonWeek,
    activity: &[SeasonActivity],
) -> Vec<SeasonWeek> {
    activity
        .iter()
        .flat_map(|a| {
            a.appearances
                .iter()
                .map(move |appearance| (SeasonWeek::new(a.season, appearance.week), appearance))
        })
        .filter(|(at, a)| a.roster_id == roster_id && *at >= since)
        .filter(|(_, a)| a.starters.contains(player))
        .map(|(at, _)| at)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Evaluate every taxi rule for one roster.
pub fn validate_taxi(
    input: &TaxiValidationInput<'_>,
    rules: &TaxiRules,
    run_type: RunType,
) -> ComplianceReport {
    let roster = input.roster;
    let taxi = &roster.taxi;
    let mut violations = Vec::new();
    let mut warnings = Vec::new();

    let taxi_count = taxi.len() as u32;
    if taxi_count > rules.max_taxi_size {
        violations.push(ComplianceViolation::TooManyOnTaxi {
            limit: rules.max_taxi_size,
            count: taxi_count,
            players: taxi.clone(),
        });
    }

    let quarterbacks: Vec<PlayerId> = taxi
        .iter()
        .filter(|p| {
            input
                .players
                .get(*p)
                .map(|info| info.position.is_quarterback())
                .unwrap_or(false)
        })
        .cloned()
        .collect();
    if quarterbacks.len() as u32 > rules.max_taxi_qb {
        violations.push(ComplianceViolation::TooManyQuarterbacks {
            limit: rules.max_taxi_qb,
            count: quarterbacks.len() as u32,
            players: quarterbacks,
        });
    }

    let acquisitions: Vec<(PlayerId, Acquisition)> = taxi
        .iter()
        .map(|p| {
            let acq = resolve_acquisition(
                p,
                roster.roster_id,
                input.season,
                input.activity,
                input.draft_selections,
            );
            (p.clone(), acq)
        })
        .collect();

    for (player, acq) in &acquisitions {
        if !acq.is_valid_for_taxi() {
            violations.push(ComplianceViolation::InvalidIntakeSource {
                player_id: player.clone(),
                source: acq.source,
                claimed_from: acq.claimed_from,
            });
        }
    }

    for player in taxi {
        if roster.starters.contains(player) {
            violations.push(ComplianceViolation::RosterInconsistent {
                player_id: player.clone(),
                also_in: RosterSlot::Starters,
            });
        }
        if roster.reserve.contains(player) {
            violations.push(ComplianceViolation::RosterInconsistent {
                player_id: player.clone(),
                also_in: RosterSlot::Reserve,
            });
        }
    }

    for (player, acq) in &acquisitions {
        let weeks = started_weeks(player, roster.roster_id, acq.since, input.activity);
        if weeks.is_empty() {
            continue;
        }
        let finding = ComplianceViolation::BoomerangActivePlayer {
            player_id: player.clone(),
            started_weeks: weeks,
        };
        if run_type.is_official() {
            violations.push(finding);
        } else {
            warnings.push(finding);
        }
    }

    let current_taxi = acquisitions
        .into_iter()
        .map(|(player, acq)| {
            let info = input.players.get(&player);
            TaxiPlayerRef {
                name: info.map(|i| i.full_name.clone()),
                position: info.map(|i| i.position.to_string()),
                player_id: player,
                intake_source: acq.source,
                acquired_at: acq.at,
                observed_since: None,
            }
        })
        .collect();

    let compliant = violations.is_empty();
    ComplianceReport {
        season: input.season,
        roster_id: roster.roster_id,
        run_type,
        status: if compliant {
            ComplianceStatus::Compliant
        } else {
            ComplianceStatus::NonCompliant
        },
        compliant: Some(compliant),
        violations,
        warnings,
        current_taxi,
        unavailable_reason: None,
    }
}
