//! Core data layer for ApexData, a Formula 1 historical data store.
//! This crate is the single source of truth for storage invariants.

pub mod api;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use api::{status_for_error, ApiResponse, ApiStatus};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::constructor::{Constructor, ConstructorPatch, NewConstructor};
pub use model::driver::{Driver, DriverPatch, NewDriver};
pub use model::lifecycle::{new_record_id, Clock, RecordId, SystemClock};
pub use model::qualifying::{NewQualifying, Qualifying, QualifyingPatch};
pub use model::race::{NewRace, Race, RacePatch};
pub use model::result::{NewRaceResult, RaceResult, RaceResultPatch};
pub use model::season::{NewSeason, Season, SeasonPatch};
pub use model::validation::ValidationError;
pub use repo::constructor_repo::{ConstructorRepository, SqliteConstructorRepository};
pub use repo::driver_repo::{DriverRepository, SqliteDriverRepository};
pub use repo::qualifying_repo::{QualifyingRepository, SqliteQualifyingRepository};
pub use repo::race_repo::{RaceRepository, SqliteRaceRepository};
pub use repo::result_repo::{ResultRepository, SqliteResultRepository};
pub use repo::season_repo::{SeasonRepository, SqliteSeasonRepository};
pub use repo::{ListWindow, RepoError, RepoResult};
pub use service::race_service::{RaceService, RaceWeekend};
pub use service::season_service::{SeasonSchedule, SeasonService};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
