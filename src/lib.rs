pub mod api;
pub mod cache;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use cache::{CacheStore, Clock, ManualClock, MemoryCache, SystemClock};
pub use config::Config;
pub use datasource::{
    CachedDataSource, DataSourceError, LeagueDataSource, MockDataSource, SleeperDataSource,
};
pub use db::{init_db, Repository};
pub use domain::{
    ComplianceReport, ComplianceStatus, ComplianceViolation, PlayerId, RosterId, RunType, Season,
    TimeMs,
};
pub use error::AppError;
pub use orchestration::{LeagueHistory, OwnershipService, TaxiService};
