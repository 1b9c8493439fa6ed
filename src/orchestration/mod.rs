//! Services that fetch league data and feed it to the engines.

pub mod history;
pub mod ownership;
pub mod taxi;

pub use history::LeagueHistory;
pub use ownership::{OwnershipOutcome, OwnershipService, OwnershipView, PickView, TeamView};
pub use taxi::{RunSummary, TaxiService};

use crate::datasource::DataSourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}
