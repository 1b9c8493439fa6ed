//! Draft pick ownership for the league's rosters.

use super::history::LeagueHistory;
use crate::datasource::{DataSourceError, LeagueDataSource};
use crate::domain::{LeagueUser, Roster, RosterId, Season};
use crate::engine::{derive_factoids, resolve_ownership, PickOwnershipLedger, PickTransferRecord};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickView {
    pub original_roster_id: RosterId,
    pub original_team: String,
    pub round: u32,
    pub current_owner_roster_id: RosterId,
    pub current_owner_team: String,
    pub history: Vec<PickTransferRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeldPick {
    pub original_roster_id: RosterId,
    pub original_team: String,
    pub round: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamView {
    pub roster_id: RosterId,
    pub team_name: String,
    pub pick_count: usize,
    pub picks: Vec<HeldPick>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipView {
    pub season: Season,
    pub rounds: u32,
    pub picks: Vec<PickView>,
    pub teams: Vec<TeamView>,
    pub factoids: Vec<String>,
}

/// Either a complete ownership map or nothing; never a partial map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnershipOutcome {
    Available(OwnershipView),
    Unavailable {
        season: Option<Season>,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct OwnershipService {
    datasource: Arc<dyn LeagueDataSource>,
    history: LeagueHistory,
    draft_rounds: Option<u32>,
}

impl OwnershipService {
    /// `draft_rounds` overrides the league's own setting when present.
    pub fn new(
        datasource: Arc<dyn LeagueDataSource>,
        history: LeagueHistory,
        draft_rounds: Option<u32>,
    ) -> Self {
        Self {
            datasource,
            history,
            draft_rounds,
        }
    }

    /// Resolve pick ownership for `season`, defaulting to the next rookie draft.
    pub async fn resolve(&self, season: Option<Season>) -> OwnershipOutcome {
        match self.try_resolve(season).await {
            Ok(view) => OwnershipOutcome::Available(view),
            Err((season, e)) => {
                warn!(
                    season = ?season.map(|s| s.year()),
                    error = %e,
                    "Pick ownership unavailable"
                );
                OwnershipOutcome::Unavailable {
                    season,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn try_resolve(
        &self,
        season: Option<Season>,
    ) -> Result<OwnershipView, (Option<Season>, DataSourceError)> {
        let chain = self.history.chain().await.map_err(|e| (season, e))?;
        let Some(current) = chain.first() else {
            return Err((
                season,
                DataSourceError::Other("league chain is empty".to_string()),
            ));
        };
        let season = season.unwrap_or_else(|| current.season.next());
        let rounds = self.draft_rounds.unwrap_or(current.draft_rounds);

        let (rosters, users, trades) = tokio::try_join!(
            self.datasource.fetch_rosters(&current.league_id),
            self.datasource.fetch_users(&current.league_id),
            self.history.transactions(&chain),
        )
        .map_err(|e| (Some(season), e))?;

        let roster_ids: Vec<RosterId> = rosters.iter().map(|r| r.roster_id).collect();
        let ledger = resolve_ownership(&roster_ids, &trades, season, rounds);
        let names = team_names(&rosters, &users);

        info!(
            season = season.year(),
            rounds,
            trades = trades.len(),
            "Resolved pick ownership"
        );
        Ok(build_view(&ledger, &names))
    }
}

/// Canonical display name per roster, from the owning user's settings.
pub fn team_names(rosters: &[Roster], users: &[LeagueUser]) -> HashMap<RosterId, String> {
    let by_user: HashMap<&str, &LeagueUser> =
        users.iter().map(|u| (u.user_id.as_str(), u)).collect();
    rosters
        .iter()
        .map(|roster| {
            let name = roster
                .owner_id
                .as_deref()
                .and_then(|owner| by_user.get(owner))
                .map(|user| user.canonical_team_name().to_string())
                .unwrap_or_else(|| roster.team_name.clone());
            (roster.roster_id, name)
        })
        .collect()
}

fn build_view(ledger: &PickOwnershipLedger, names: &HashMap<RosterId, String>) -> OwnershipView {
    let name = |id: RosterId| {
        names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("Team {}", id))
    };

    let picks = ledger
        .claims()
        .into_iter()
        .map(|claim| PickView {
            original_roster_id: claim.original_roster_id,
            original_team: name(claim.original_roster_id),
            round: claim.round,
            current_owner_roster_id: claim.current_owner_roster_id,
            current_owner_team: name(claim.current_owner_roster_id),
            history: ledger
                .history(claim.original_roster_id, claim.round)
                .to_vec(),
        })
        .collect();

    let teams = ledger
        .rosters()
        .map(|roster_id| {
            let picks: Vec<HeldPick> = ledger
                .owned_by(roster_id)
                .into_iter()
                .map(|claim| HeldPick {
                    original_roster_id: claim.original_roster_id,
                    original_team: name(claim.original_roster_id),
                    round: claim.round,
                })
                .collect();
            TeamView {
                roster_id,
                team_name: name(roster_id),
                pick_count: picks.len(),
                picks,
            }
        })
        .collect();

    OwnershipView {
        season: ledger.season(),
        rounds: ledger.rounds(),
        picks,
        teams,
        factoids: derive_factoids(ledger, names),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::MockDataSource;
    use crate::domain::{LeagueInfo, TimeMs, Transaction, TransactionKind};

    fn league() -> LeagueInfo {
        LeagueInfo {
            league_id: "L1".to_string(),
            name: "Dynasty".to_string(),
            season: Season::new(2025),
            previous_league_id: None,
            draft_rounds: 2,
            taxi_slots: 3,
            total_rosters: 3,
        }
    }

    fn mock() -> MockDataSource {
        MockDataSource::new()
            .with_league(league())
            .with_rosters(
                "L1",
                vec![
                    Roster::new(RosterId::new(1)).with_owner("u1"),
                    Roster::new(RosterId::new(2)).with_owner("u2"),
                    Roster::new(RosterId::new(3)),
                ],
            )
            .with_users(
                "L1",
                vec![
                    LeagueUser {
                        user_id: "u1".to_string(),
                        display_name: "alice".to_string(),
                        team_name: Some("Gridiron Owls".to_string()),
                    },
                    LeagueUser {
                        user_id: "u2".to_string(),
                        display_name: "bob".to_string(),
                        team_name: None,
                    },
                ],
            )
            .with_transactions(
                "L1",
                vec![
                    Transaction::new("T2", TransactionKind::Trade, 4, TimeMs::new(200))
                        .with_pick(2026, 2, 1, 2, 3),
                    Transaction::new("T1", TransactionKind::Trade, 1, TimeMs::new(100))
                        .with_pick(2026, 2, 1, 1, 2),
                ],
            )
    }

    fn service(ds: MockDataSource, rounds: Option<u32>) -> OwnershipService {
        let ds: Arc<dyn LeagueDataSource> = Arc::new(ds);
        let history = LeagueHistory::new(ds.clone(), "L1".to_string(), 3);
        OwnershipService::new(ds, history, rounds)
    }

    #[tokio::test]
    async fn test_defaults_to_next_season_and_replays_in_order() {
        let outcome = service(mock(), None).resolve(None).await;
        let OwnershipOutcome::Available(view) = outcome else {
            panic!("expected available outcome");
        };
        assert_eq!(view.season, Season::new(2026));
        assert_eq!(view.rounds, 2);
        assert_eq!(view.picks.len(), 6);

        let pick = view
            .picks
            .iter()
            .find(|p| p.original_roster_id == RosterId::new(1) && p.round == 2)
            .unwrap();
        assert_eq!(pick.current_owner_roster_id, RosterId::new(3));
        assert_eq!(pick.original_team, "Gridiron Owls");
        assert_eq!(pick.current_owner_team, "Team 3");
        let trades: Vec<_> = pick.history.iter().map(|h| h.trade_id.as_str()).collect();
        assert_eq!(trades, vec!["T1", "T2"]);
    }

    #[tokio::test]
    async fn test_team_view_counts_held_picks() {
        let OwnershipOutcome::Available(view) = service(mock(), None).resolve(None).await else {
            panic!("expected available outcome");
        };
        let counts: Vec<_> = view.teams.iter().map(|t| (t.team_name.as_str(), t.pick_count)).collect();
        assert_eq!(
            counts,
            vec![("Gridiron Owls", 1), ("bob", 2), ("Team 3", 3)]
        );
        assert!(!view.factoids.is_empty());
    }

    #[tokio::test]
    async fn test_rounds_override_and_other_season_untouched() {
        let outcome = service(mock(), Some(3)).resolve(Some(Season::new(2027))).await;
        let OwnershipOutcome::Available(view) = outcome else {
            panic!("expected available outcome");
        };
        assert_eq!(view.rounds, 3);
        assert!(view.picks.iter().all(|p| p.history.is_empty()));
        assert!(view
            .picks
            .iter()
            .all(|p| p.original_roster_id == p.current_owner_roster_id));
    }

    #[tokio::test]
    async fn test_outage_is_unavailable() {
        let outcome = service(mock().with_outage(), None)
            .resolve(Some(Season::new(2026)))
            .await;
        match outcome {
            OwnershipOutcome::Unavailable { season, .. } => {
                assert_eq!(season, Some(Season::new(2026)))
            }
            other => panic!("expected unavailable, got {:?}", other),
        }
    }
}
