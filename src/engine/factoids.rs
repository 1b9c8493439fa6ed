//! Short display facts derived from a pick ownership ledger.

use super::pick_ownership::PickOwnershipLedger;
use crate::domain::RosterId;
use std::collections::{BTreeMap, HashMap};

pub fn derive_factoids(
    ledger: &PickOwnershipLedger,
    team_names: &HashMap<RosterId, String>,
) -> Vec<String> {
    let name = |id: &RosterId| {
        team_names
            .get(id)
            .cloned()
            .unwrap_or_else(|| format!("Team {}", id))
    };
    let join = |ids: &[RosterId]| ids.iter().map(name).collect::<Vec<_>>().join(", ");

    let mut held: BTreeMap<RosterId, usize> = ledger.rosters().map(|r| (r, 0)).collect();
    let mut firsts: BTreeMap<RosterId, usize> = held.clone();
    let claims = ledger.claims();
    for claim in &claims {
        *held.entry(claim.current_owner_roster_id).or_default() += 1;
        if claim.round == 1 {
            *firsts.entry(claim.current_owner_roster_id).or_default() += 1;
        }
    }

    let mut facts = Vec::new();
    if held.is_empty() {
        return facts;
    }

    let season = ledger.season();
    if let Some((max, leaders)) = extreme(&held, true) {
        facts.push(format!(
            "Most {} picks held: {} ({})",
            season,
            join(&leaders),
            max
        ));
    }
    if let Some((min, trailers)) = extreme(&held, false) {
        facts.push(format!(
            "Fewest {} picks held: {} ({})",
            season,
            join(&trailers),
            min
        ));
    }
    if let Some((max, leaders)) = extreme(&firsts, true) {
        if max > 1 {
            facts.push(format!(
                "Most {} first-round picks: {} ({})",
                season,
                join(&leaders),
                max
            ));
        }
    }

    // A pick that went away and came back still changed hands.
    let moved = claims
        .iter()
        .filter(|c| !ledger.history(c.original_roster_id, c.round).is_empty())
        .count();
    facts.push(format!(
        "{} of {} {} picks have changed hands",
        moved,
        claims.len(),
        season
    ));

    let most_traded = claims
        .iter()
        .map(|c| (ledger.history(c.original_roster_id, c.round).len(), c))
        .filter(|(count, _)| *count > 1)
        .max_by(|(a, ca), (b, cb)| {
            a.cmp(b)
                .then_with(|| cb.round.cmp(&ca.round))
                .then_with(|| cb.original_roster_id.cmp(&ca.original_roster_id))
        });
    if let Some((count, claim)) = most_traded {
        facts.push(format!(
            "Most-traded pick: {}'s {} round {} ({} trades, now held by {})",
            name(&claim.original_roster_id),
            season,
            claim.round,
            count,
            name(&claim.current_owner_roster_id)
        ));
    }

    facts
}

/// Max (or min) count and all rosters sharing it, in roster-id order.
fn extreme(counts: &BTreeMap<RosterId, usize>, max: bool) -> Option<(usize, Vec<RosterId>)> {
    let target = match max {
        true => counts.values().max().copied()?,
        false => counts.values().min().copied()?,
    };
    let ids = counts
        .iter()
        .filter(|(_, c)| **c == target)
        .map(|(id, _)| *id)
        .collect();
    Some((target, ids))
}
