//! Walks a league's season chain through `previous_league_id` links.

use crate::datasource::{DataSourceError, LeagueDataSource};
use crate::domain::{DraftSelection, LeagueInfo, LineupAppearance, Season, Transaction};
use futures::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Transaction weeks ("legs") queried per league season, offseason included.
pub const TRANSACTION_WEEKS: std::ops::RangeInclusive<u32> = 0..=18;

#[derive(Debug, Clone)]
pub struct LeagueHistory {
    datasource: Arc<dyn LeagueDataSource>,
    league_id: String,
    max_depth: u32,
}

impl LeagueHistory {
    /// `max_depth` is the number of earlier seasons followed past the current league.
    pub fn new(datasource: Arc<dyn LeagueDataSource>, league_id: String, max_depth: u32) -> Self {
        Self {
            datasource,
            league_id,
            max_depth,
        }
    }

    pub fn league_id(&self) -> &str {
        &self.league_id
    }

    /// The configured league followed by its predecessors, newest first.
    ///
    /// A predecessor that no longer exists ends the chain.
    pub async fn chain(&self) -> Result<Vec<LeagueInfo>, DataSourceError> {
        let current = self.datasource.fetch_league(&self.league_id).await?;
        let mut seen: HashSet<String> = HashSet::from([current.league_id.clone()]);
        let mut next = current.previous_league_id.clone();
        let mut chain = vec![current];

        while let Some(previous_id) = next.take() {
            if chain.len() as u32 > self.max_depth {
                break;
            }
            if !seen.insert(previous_id.clone()) {
                warn!(league_id = %previous_id, "League history loops back on itself");
                break;
            }
            match self.datasource.fetch_league(&previous_id).await {
                Ok(league) => {
                    next = league.previous_league_id.clone();
                    chain.push(league);
                }
                Err(DataSourceError::NotFound(_)) => {
                    debug!(league_id = %previous_id, "Previous league not found, ending chain");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(chain)
    }

    /// The league for `season` and every earlier league in the chain, newest first.
    ///
    /// `None` when no league in the chain played that season.
    pub async fn lineage_for(
        &self,
        season: Season,
    ) -> Result<Option<Vec<LeagueInfo>>, DataSourceError> {
        let chain = self.chain().await?;
        Ok(chain
            .iter()
            .position(|l| l.season == season)
            .map(|idx| chain[idx..].to_vec()))
    }

    /// Every transaction of every week of every league given.
    pub async fn transactions(
        &self,
        leagues: &[LeagueInfo],
    ) -> Result<Vec<Transaction>, DataSourceError> {
        let per_league = try_join_all(leagues.iter().map(|l| self.league_transactions(l))).await?;
        Ok(per_league.into_iter().flatten().collect())
    }

    /// Every transaction of one league season.
    pub async fn league_transactions(
        &self,
        league: &LeagueInfo,
    ) -> Result<Vec<Transaction>, DataSourceError> {
        let weeks = try_join_all(
            TRANSACTION_WEEKS.map(|week| self.datasource.fetch_transactions(&league.league_id, week)),
        )
        .await?;
        Ok(weeks.into_iter().flatten().collect())
    }

    /// Starting lineups of one league for the given scoring weeks.
    pub async fn lineups(
        &self,
        league: &LeagueInfo,
        weeks: std::ops::RangeInclusive<u32>,
    ) -> Result<Vec<LineupAppearance>, DataSourceError> {
        let per_week = try_join_all(
            weeks.map(|week| self.datasource.fetch_matchups(&league.league_id, week)),
        )
        .await?;
        Ok(per_week.into_iter().flatten().collect())
    }

    /// Selections from every completed draft of the given leagues.
    pub async fn draft_selections(
        &self,
        leagues: &[LeagueInfo],
    ) -> Result<Vec<DraftSelection>, DataSourceError> {
        let listings = try_join_all(
            leagues
                .iter()
                .map(|league| self.datasource.fetch_drafts(&league.league_id)),
        )
        .await?;

        let complete: Vec<_> = listings
            .into_iter()
            .flatten()
            .filter(|d| d.status == "complete")
            .collect();
        let picks = try_join_all(complete.iter().map(|d| self.datasource.fetch_draft_picks(d)))
            .await?;
        Ok(picks.into_iter().flatten().collect())
    }
}
