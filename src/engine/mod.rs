//! Pure computation engines over fetched league data.

pub mod factoids;
pub mod pick_ownership;
pub mod run_type;
pub mod taxi_validator;

pub use factoids::derive_factoids;
pub use pick_ownership::{resolve_ownership, PickKey, PickOwnershipLedger, PickTransferRecord};
pub use run_type::{RunSchedule, RunSlot, ScheduleZone};
pub use taxi_validator::{
    resolve_acquisition, validate_taxi, Acquisition, SeasonActivity, TaxiRules,
    TaxiValidationInput,
};
