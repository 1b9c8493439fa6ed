use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::params::parse_optional_season;
use super::AppState;
use crate::domain::Season;
use crate::error::AppError;
use crate::orchestration::{OwnershipOutcome, PickView, TeamView};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipQuery {
    pub season: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OwnershipResponse {
    #[serde(rename_all = "camelCase")]
    Available {
        season: Season,
        rounds: u32,
        picks: Vec<PickView>,
        teams: Vec<TeamView>,
        factoids: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Unavailable { season: Option<Season> },
}

impl From<OwnershipOutcome> for OwnershipResponse {
    fn from(outcome: OwnershipOutcome) -> Self {
        match outcome {
            OwnershipOutcome::Available(view) => OwnershipResponse::Available {
                season: view.season,
                rounds: view.rounds,
                picks: view.picks,
                teams: view.teams,
                factoids: view.factoids,
            },
            OwnershipOutcome::Unavailable { season, .. } => {
                OwnershipResponse::Unavailable { season }
            }
        }
    }
}

/// Upstream failure is reported in the body with status 200, never as a partial map.
pub async fn get_ownership(
    Query(params): Query<OwnershipQuery>,
    State(state): State<AppState>,
) -> Result<Json<OwnershipResponse>, AppError> {
    let season = parse_optional_season(params.season.as_deref())?;
    let outcome = state.ownership.resolve(season).await;
    Ok(Json(outcome.into()))
}
