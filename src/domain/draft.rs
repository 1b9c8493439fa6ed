//! Draft picks: future-pick claims and completed rookie-draft selections.

use crate::domain::{PlayerId, RosterId, Season, TimeMs};
use serde::{Deserialize, Serialize};

/// Current holder of a future pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPickClaim {
    pub season: Season,
    pub round: u32,
    pub original_roster_id: RosterId,
    pub current_owner_roster_id: RosterId,
}

/// Draft metadata; only rookie drafts of completed status carry selections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftInfo {
    pub draft_id: String,
    pub season: Season,
    pub status: String,
    pub start_time: Option<TimeMs>,
}

/// A player taken in a draft by a roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSelection {
    pub draft_id: String,
    pub season: Season,
    pub round: u32,
    pub pick_no: u32,
    pub player_id: PlayerId,
    pub roster_id: RosterId,
    /// Best-known selection time (draft start when the feed has no per-pick time).
    pub drafted_at: TimeMs,
}
