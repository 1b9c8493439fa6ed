//! Domain types for league rosters, transactions, and compliance reporting.
//!
//! This module provides:
//! - Domain primitives: TimeMs, RosterId, PlayerId, Season, SeasonWeek
//! - Roster, transaction, draft, and player feed types
//! - Compliance report types and run-type labels
//! - Stable transaction ordering for deterministic replay

pub mod compliance;
pub mod draft;
pub mod ordering;
pub mod player;
pub mod primitives;
pub mod roster;
pub mod run_type;
pub mod transaction;

pub use compliance::{
    ComplianceReport, ComplianceStatus, ComplianceViolation, IntakeSource, RosterSlot,
    TaxiPlayerRef,
};
pub use draft::{DraftInfo, DraftPickClaim, DraftSelection};
pub use ordering::{sort_transactions_deterministic, TransactionOrderingKey};
pub use player::{LineupAppearance, PlayerInfo, Position};
pub use primitives::{PlayerId, RosterId, Season, SeasonWeek, TimeMs};
pub use roster::{LeagueInfo, LeagueUser, NflState, Roster};
pub use run_type::RunType;
pub use transaction::{DraftPickTransfer, Transaction, TransactionKind, TransactionStatus};
