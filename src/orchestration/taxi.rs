//! Taxi squad validation against live league data, single roster or league-wide.

use super::history::LeagueHistory;
use super::ServiceError;
use crate::datasource::{DataSourceError, LeagueDataSource, PlayerDirectory};
use crate::db::Repository;
use crate::domain::{
    ComplianceReport, ComplianceStatus, DraftSelection, LeagueInfo, NflState, Roster, RosterId,
    RunType, Season, TimeMs,
};
use crate::engine::{
    resolve_acquisition, validate_taxi, RunSchedule, SeasonActivity, TaxiRules,
    TaxiValidationInput,
};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Last regular-season scoring week considered for lineup history.
const FINAL_SCORING_WEEK: u32 = 18;

/// Outcome of a league-wide run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: String,
    pub season: Season,
    pub week: u32,
    pub run_type: RunType,
    pub total: usize,
    pub compliant: usize,
    pub non_compliant: usize,
    pub unknown: usize,
    pub snapshots_written: usize,
    pub reports: Vec<ComplianceReport>,
}

/// League-wide upstream data shared by every roster validated in one pass.
struct LeagueData {
    league: LeagueInfo,
    /// Newest season first.
    activity: Vec<SeasonActivity>,
    draft_selections: Vec<DraftSelection>,
    players: PlayerDirectory,
}

pub struct TaxiService {
    datasource: Arc<dyn LeagueDataSource>,
    history: LeagueHistory,
    repo: Arc<Repository>,
    rules: TaxiRules,
    schedule: RunSchedule,
    snapshots_enabled: bool,
}

impl TaxiService {
    pub fn new(
        datasource: Arc<dyn LeagueDataSource>,
        history: LeagueHistory,
        repo: Arc<Repository>,
        rules: TaxiRules,
        schedule: RunSchedule,
        snapshots_enabled: bool,
    ) -> Self {
        Self {
            datasource,
            history,
            repo,
            rules,
            schedule,
            snapshots_enabled,
        }
    }

    pub fn rules(&self) -> TaxiRules {
        self.rules
    }

    pub fn classify_at(&self, at: DateTime<Utc>) -> RunType {
        self.schedule.classify(at)
    }

    pub fn classify_now(&self) -> RunType {
        self.classify_at(Utc::now())
    }

    /// Season of the configured (current) league.
    pub async fn current_season(&self) -> Result<Season, ServiceError> {
        let league = self
            .datasource
            .fetch_league(self.history.league_id())
            .await?;
        Ok(league.season)
    }

    /// Validate one roster's taxi squad for `season`.
    ///
    /// Returns `Ok(None)` when the roster is not part of that season's league.
    /// Upstream failures yield a report with `unknown` status rather than an error.
    pub async fn validate(
        &self,
        season: Season,
        roster_id: RosterId,
        run_type: RunType,
    ) -> Result<Option<ComplianceReport>, ServiceError> {
        match self.gather(season, roster_id).await {
            Ok(Some((roster, data))) => {
                let report = self.report_for(&data, &roster, run_type).await?;
                Ok(Some(report))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(
                    season = season.year(),
                    roster_id = %roster_id,
                    error = %e,
                    "Upstream data unavailable, reporting unknown compliance"
                );
                Ok(Some(ComplianceReport::unknown(
                    season,
                    roster_id,
                    run_type,
                    e.to_string(),
                )))
            }
        }
    }

    async fn gather(
        &self,
        season: Season,
        roster_id: RosterId,
    ) -> Result<Option<(Roster, LeagueData)>, DataSourceError> {
        let Some(lineage) = self.history.lineage_for(season).await? else {
            return Ok(None);
        };
        let (rosters, nfl_state) = tokio::try_join!(
            self.datasource.fetch_rosters(&lineage[0].league_id),
            self.datasource.fetch_nfl_state(),
        )?;
        let Some(roster) = rosters.into_iter().find(|r| r.roster_id == roster_id) else {
            return Ok(None);
        };

        let data = self
            .gather_league(lineage, std::slice::from_ref(&roster), nfl_state)
            .await?;
        Ok(Some((roster, data)))
    }

    /// Fetch everything `rosters` need for validation, once for all of them.
    ///
    /// `lineage` is the validated league followed by its predecessors. Lineups
    /// are fetched only back to the oldest tenure among the rosters' taxi players.
    async fn gather_league(
        &self,
        mut lineage: Vec<LeagueInfo>,
        rosters: &[Roster],
        nfl_state: NflState,
    ) -> Result<LeagueData, DataSourceError> {
        let season = lineage[0].season;
        let (transactions, draft_selections, players) = tokio::try_join!(
            try_join_all(lineage.iter().map(|l| self.history.league_transactions(l))),
            self.history.draft_selections(&lineage),
            self.datasource.fetch_players(),
        )?;
        let mut activity: Vec<SeasonActivity> = lineage
            .iter()
            .zip(transactions)
            .map(|(league, txs)| SeasonActivity::new(league.season).with_transactions(txs))
            .collect();

        let oldest_tenure = rosters
            .iter()
            .flat_map(|r| r.taxi.iter().map(move |p| (r.roster_id, p)))
            .map(|(roster_id, player)| {
                resolve_acquisition(player, roster_id, season, &activity, &draft_selections)
                    .since
                    .season
            })
            .min();

        if let Some(oldest) = oldest_tenure {
            let current_last_week = if nfl_state.season == season {
                nfl_state.week.min(FINAL_SCORING_WEEK)
            } else if nfl_state.season < season {
                0
            } else {
                FINAL_SCORING_WEEK
            };
            let wanted: Vec<&LeagueInfo> =
                lineage.iter().filter(|l| l.season >= oldest).collect();
            let lineups = try_join_all(wanted.iter().map(|league| {
                let last_week = if league.season == season {
                    current_last_week
                } else {
                    FINAL_SCORING_WEEK
                };
                self.history.lineups(league, 1..=last_week)
            }))
            .await?;

            for (entry, appearances) in activity
                .iter_mut()
                .filter(|a| a.season >= oldest)
                .zip(lineups)
            {
                entry.appearances = appearances;
            }
            debug!(
                season = season.year(),
                oldest_tenure = oldest.year(),
                seasons = wanted.len(),
                "Fetched lineup history"
            );
        }

        Ok(LeagueData {
            league: lineage.swap_remove(0),
            activity,
            draft_selections,
            players,
        })
    }

    /// Evaluate one roster over shared league data and stamp first-seen times.
    async fn report_for(
        &self,
        data: &LeagueData,
        roster: &Roster,
        run_type: RunType,
    ) -> Result<ComplianceReport, sqlx::Error> {
        let input = TaxiValidationInput {
            season: data.league.season,
            roster,
            activity: &data.activity,
            draft_selections: &data.draft_selections,
            players: &data.players,
        };
        let mut report = validate_taxi(&input, &self.rules, run_type);

        let first_seen = self
            .repo
            .record_taxi_observations(
                &data.league.league_id,
                roster.roster_id,
                &roster.taxi,
                TimeMs::now(),
            )
            .await?;
        for entry in &mut report.current_taxi {
            entry.observed_since = first_seen.get(&entry.player_id).copied();
        }
        Ok(report)
    }

    /// Validate every roster of the current league and snapshot each report.
    ///
    /// League-wide data is fetched once for the whole run. If that fetch fails
    /// every roster is recorded with `unknown` status; the run itself only fails
    /// when the league, the NFL state or the roster list cannot be fetched.
    pub async fn run_all(&self, run_type: RunType) -> Result<RunSummary, ServiceError> {
        let run_id = Uuid::new_v4().to_string();
        let (league, nfl_state) = tokio::try_join!(
            self.datasource.fetch_league(self.history.league_id()),
            self.datasource.fetch_nfl_state(),
        )?;
        let season = league.season;
        let week = if nfl_state.season == season {
            nfl_state.week
        } else {
            0
        };
        let rosters = self.datasource.fetch_rosters(&league.league_id).await?;

        info!(
            run_id = %run_id,
            run_type = %run_type,
            season = season.year(),
            week,
            rosters = rosters.len(),
            "Starting taxi compliance run"
        );

        let shared = match self.history.chain().await {
            Ok(lineage) => self.gather_league(lineage, &rosters, nfl_state).await,
            Err(e) => Err(e),
        };

        let mut reports = Vec::with_capacity(rosters.len());
        match shared {
            Ok(data) => {
                for roster in &rosters {
                    let report = match self.report_for(&data, roster, run_type).await {
                        Ok(report) => report,
                        Err(e) => {
                            warn!(
                                roster_id = %roster.roster_id,
                                error = %e,
                                "Roster validation failed"
                            );
                            ComplianceReport::unknown(
                                season,
                                roster.roster_id,
                                run_type,
                                e.to_string(),
                            )
                        }
                    };
                    reports.push(report);
                }
            }
            Err(e) => {
                warn!(
                    run_id = %run_id,
                    error = %e,
                    "League data unavailable, reporting every roster unknown"
                );
                reports.extend(rosters.iter().map(|r| {
                    ComplianceReport::unknown(season, r.roster_id, run_type, e.to_string())
                }));
            }
        }

        let mut snapshots_written = 0;
        if self.snapshots_enabled {
            let now = TimeMs::now();
            for report in &reports {
                match self.repo.upsert_taxi_snapshot(week, &run_id, report, now).await {
                    Ok(()) => snapshots_written += 1,
                    Err(e) => warn!(
                        run_id = %run_id,
                        roster_id = %report.roster_id,
                        error = %e,
                        "Failed to write compliance snapshot"
                    ),
                }
            }
        }

        let count = |status: ComplianceStatus| reports.iter().filter(|r| r.status == status).count();
        let summary = RunSummary {
            run_id,
            season,
            week,
            run_type,
            total: reports.len(),
            compliant: count(ComplianceStatus::Compliant),
            non_compliant: count(ComplianceStatus::NonCompliant),
            unknown: count(ComplianceStatus::Unknown),
            snapshots_written,
            reports,
        };

        info!(
            run_id = %summary.run_id,
            compliant = summary.compliant,
            non_compliant = summary.non_compliant,
            unknown = summary.unknown,
            snapshots = summary.snapshots_written,
            "Taxi compliance run finished"
        );
        Ok(summary)
    }
}
