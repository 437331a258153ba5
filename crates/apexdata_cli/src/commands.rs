//! Subcommand definitions and dispatch onto the core repositories.
//!
//! Every command produces one JSON envelope; storage and lookup failures are
//! reported inside the envelope, never as process errors.

use apexdata_core::db::migrations::current_version;
use apexdata_core::db::Connection;
use apexdata_core::{
    core_version, ping, ApiResponse, ApiStatus, ConstructorPatch, ConstructorRepository,
    CoreConfig, DriverPatch, DriverRepository, NewConstructor, NewDriver, NewQualifying, NewRace,
    NewRaceResult, NewSeason, QualifyingPatch, QualifyingRepository, RacePatch, RaceRepository,
    RaceResultPatch, RaceService, RecordId, RepoResult, ResultRepository, SeasonPatch,
    SeasonRepository, SeasonService, SqliteConstructorRepository, SqliteDriverRepository,
    SqliteQualifyingRepository, SqliteRaceRepository, SqliteResultRepository,
    SqliteSeasonRepository,
};
use clap::{Args, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Championship seasons, addressed by year.
    Seasons {
        #[command(subcommand)]
        action: SeasonsAction,
    },
    /// Grands prix, addressed by id.
    Races {
        #[command(subcommand)]
        action: RacesAction,
    },
    /// Drivers, addressed by driver id (e.g. `hamilton`).
    Drivers {
        #[command(subcommand)]
        action: DriversAction,
    },
    /// Constructors, addressed by constructor id (e.g. `ferrari`).
    Constructors {
        #[command(subcommand)]
        action: ConstructorsAction,
    },
    /// Race results, addressed by id.
    Results {
        #[command(subcommand)]
        action: EntryAction,
    },
    /// Qualifying entries, addressed by id.
    Qualifying {
        #[command(subcommand)]
        action: EntryAction,
    },
    /// Report core version and schema version.
    Health,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Seasons { .. } => "seasons",
            Self::Races { .. } => "races",
            Self::Drivers { .. } => "drivers",
            Self::Constructors { .. } => "constructors",
            Self::Results { .. } => "results",
            Self::Qualifying { .. } => "qualifying",
            Self::Health => "health",
        }
    }
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Rows to skip.
    #[arg(long)]
    pub skip: Option<u32>,
    /// Maximum rows to return.
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Debug, Args)]
pub struct PayloadArgs {
    /// JSON document with the record fields.
    #[arg(long)]
    pub json: String,
}

impl PayloadArgs {
    fn parse<T: DeserializeOwned>(&self) -> Result<T, ApiResponse<()>> {
        serde_json::from_str(&self.json).map_err(|err| {
            ApiResponse::failure(ApiStatus::BadRequest, format!("invalid json payload: {err}"))
        })
    }
}

#[derive(Debug, Subcommand)]
pub enum SeasonsAction {
    List(ListArgs),
    Get {
        year: i32,
    },
    Create(PayloadArgs),
    Update {
        year: i32,
        #[command(flatten)]
        payload: PayloadArgs,
    },
    Delete {
        year: i32,
    },
    /// Races of one season ordered by round.
    Races {
        year: i32,
    },
}

#[derive(Debug, Subcommand)]
pub enum RacesAction {
    List(ListArgs),
    Get {
        id: RecordId,
    },
    Create(PayloadArgs),
    Update {
        id: RecordId,
        #[command(flatten)]
        payload: PayloadArgs,
    },
    Delete {
        id: RecordId,
    },
    /// Race with its results and qualifying order.
    Weekend {
        id: RecordId,
    },
    /// Classification of one race.
    Results {
        id: RecordId,
    },
}

#[derive(Debug, Subcommand)]
pub enum DriversAction {
    List(ListArgs),
    Get {
        driver_id: String,
    },
    Create(PayloadArgs),
    Update {
        driver_id: String,
        #[command(flatten)]
        payload: PayloadArgs,
    },
    Delete {
        driver_id: String,
    },
    /// Career results of one driver, oldest first.
    Results {
        driver_id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConstructorsAction {
    List(ListArgs),
    Get {
        constructor_id: String,
    },
    Create(PayloadArgs),
    Update {
        constructor_id: String,
        #[command(flatten)]
        payload: PayloadArgs,
    },
    Delete {
        constructor_id: String,
    },
}

/// Verbs shared by results and qualifying entries.
#[derive(Debug, Subcommand)]
pub enum EntryAction {
    List(ListArgs),
    Get {
        id: RecordId,
    },
    Create(PayloadArgs),
    Update {
        id: RecordId,
        #[command(flatten)]
        payload: PayloadArgs,
    },
    Delete {
        id: RecordId,
    },
}

/// Serialized envelope plus its status code.
#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub body: serde_json::Value,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Serialize)]
struct Health {
    ping: &'static str,
    version: &'static str,
    schema_version: u32,
}

/// Runs one command against an open, migrated connection.
pub fn execute(conn: &Connection, config: &CoreConfig, command: Command) -> Reply {
    let outcome = match command {
        Command::Seasons { action } => seasons(conn, config, action),
        Command::Races { action } => races(conn, config, action),
        Command::Drivers { action } => drivers(conn, config, action),
        Command::Constructors { action } => constructors(conn, config, action),
        Command::Results { action } => results(conn, config, action),
        Command::Qualifying { action } => qualifying(conn, config, action),
        Command::Health => health(conn),
    };
    outcome.unwrap_or_else(|err| reply(ApiResponse::<()>::from_error(&err)))
}

fn reply<T: Serialize>(response: ApiResponse<T>) -> Reply {
    let status = response.status;
    match serde_json::to_value(&response) {
        Ok(body) => Reply { status, body },
        Err(err) => {
            let status = ApiStatus::Internal.code();
            Reply {
                status,
                body: serde_json::json!({
                    "status": status,
                    "error": format!("failed to encode response: {err}"),
                }),
            }
        }
    }
}

fn ok<T: Serialize>(result: RepoResult<T>) -> Reply {
    reply(ApiResponse::from_result(result, ApiStatus::Ok))
}

fn created<T: Serialize>(result: RepoResult<T>) -> Reply {
    reply(ApiResponse::from_result(result, ApiStatus::Created))
}

fn deleted(result: RepoResult<()>) -> Reply {
    reply(ApiResponse::from_unit(result))
}

/// Parses a payload and runs `op` on it; malformed JSON is a 400.
fn with_payload<T, F>(payload: &PayloadArgs, op: F) -> Reply
where
    T: DeserializeOwned,
    F: FnOnce(T) -> Reply,
{
    match payload.parse::<T>() {
        Ok(input) => op(input),
        Err(rejected) => reply(rejected),
    }
}

fn seasons(conn: &Connection, config: &CoreConfig, action: SeasonsAction) -> RepoResult<Reply> {
    let repo = SqliteSeasonRepository::try_new(conn)?;
    Ok(match action {
        SeasonsAction::List(args) => ok(repo.list_seasons(config.window(args.skip, args.limit))),
        SeasonsAction::Get { year } => ok(repo.get_season(year)),
        SeasonsAction::Create(payload) => with_payload(&payload, |input: NewSeason| {
            created(repo.create_season(&input))
        }),
        SeasonsAction::Update { year, payload } => {
            with_payload(&payload, |patch: SeasonPatch| ok(repo.update_season(year, &patch)))
        }
        SeasonsAction::Delete { year } => deleted(repo.delete_season(year)),
        SeasonsAction::Races { year } => {
            let service = SeasonService::new(repo, SqliteRaceRepository::try_new(conn)?);
            ok(service.races_for_year(year))
        }
    })
}

fn races(conn: &Connection, config: &CoreConfig, action: RacesAction) -> RepoResult<Reply> {
    let repo = SqliteRaceRepository::try_new(conn)?;
    Ok(match action {
        RacesAction::List(args) => ok(repo.list_races(config.window(args.skip, args.limit))),
        RacesAction::Get { id } => ok(repo.get_race(id)),
        RacesAction::Create(payload) => {
            with_payload(&payload, |input: NewRace| created(repo.create_race(&input)))
        }
        RacesAction::Update { id, payload } => {
            with_payload(&payload, |patch: RacePatch| ok(repo.update_race(id, &patch)))
        }
        RacesAction::Delete { id } => deleted(repo.delete_race(id)),
        RacesAction::Weekend { id } => {
            let service = RaceService::new(
                repo,
                SqliteResultRepository::try_new(conn)?,
                SqliteQualifyingRepository::try_new(conn)?,
            );
            ok(service.race_weekend(id))
        }
        RacesAction::Results { id } => {
            let results = SqliteResultRepository::try_new(conn)?;
            ok(repo
                .get_race(id)
                .and_then(|race| results.list_results_for_race(race.id)))
        }
    })
}

fn drivers(conn: &Connection, config: &CoreConfig, action: DriversAction) -> RepoResult<Reply> {
    let repo = SqliteDriverRepository::try_new(conn)?;
    Ok(match action {
        DriversAction::List(args) => ok(repo.list_drivers(config.window(args.skip, args.limit))),
        DriversAction::Get { driver_id } => ok(repo.get_driver(&driver_id)),
        DriversAction::Create(payload) => {
            with_payload(&payload, |input: NewDriver| created(repo.create_driver(&input)))
        }
        DriversAction::Update { driver_id, payload } => {
            with_payload(&payload, |patch: DriverPatch| {
                ok(repo.update_driver(&driver_id, &patch))
            })
        }
        DriversAction::Delete { driver_id } => deleted(repo.delete_driver(&driver_id)),
        DriversAction::Results { driver_id } => {
            let results = SqliteResultRepository::try_new(conn)?;
            ok(repo
                .get_driver(&driver_id)
                .and_then(|driver| results.list_results_for_driver(driver.id)))
        }
    })
}

fn constructors(
    conn: &Connection,
    config: &CoreConfig,
    action: ConstructorsAction,
) -> RepoResult<Reply> {
    let repo = SqliteConstructorRepository::try_new(conn)?;
    Ok(match action {
        ConstructorsAction::List(args) => {
            ok(repo.list_constructors(config.window(args.skip, args.limit)))
        }
        ConstructorsAction::Get { constructor_id } => ok(repo.get_constructor(&constructor_id)),
        ConstructorsAction::Create(payload) => with_payload(&payload, |input: NewConstructor| {
            created(repo.create_constructor(&input))
        }),
        ConstructorsAction::Update {
            constructor_id,
            payload,
        } => with_payload(&payload, |patch: ConstructorPatch| {
            ok(repo.update_constructor(&constructor_id, &patch))
        }),
        ConstructorsAction::Delete { constructor_id } => {
            deleted(repo.delete_constructor(&constructor_id))
        }
    })
}

fn results(conn: &Connection, config: &CoreConfig, action: EntryAction) -> RepoResult<Reply> {
    let repo = SqliteResultRepository::try_new(conn)?;
    Ok(match action {
        EntryAction::List(args) => ok(repo.list_results(config.window(args.skip, args.limit))),
        EntryAction::Get { id } => ok(repo.get_result(id)),
        EntryAction::Create(payload) => {
            with_payload(&payload, |input: NewRaceResult| created(repo.create_result(&input)))
        }
        EntryAction::Update { id, payload } => {
            with_payload(&payload, |patch: RaceResultPatch| ok(repo.update_result(id, &patch)))
        }
        EntryAction::Delete { id } => deleted(repo.delete_result(id)),
    })
}

fn qualifying(conn: &Connection, config: &CoreConfig, action: EntryAction) -> RepoResult<Reply> {
    let repo = SqliteQualifyingRepository::try_new(conn)?;
    Ok(match action {
        EntryAction::List(args) => ok(repo.list_qualifying(config.window(args.skip, args.limit))),
        EntryAction::Get { id } => ok(repo.get_qualifying(id)),
        EntryAction::Create(payload) => with_payload(&payload, |input: NewQualifying| {
            created(repo.create_qualifying(&input))
        }),
        EntryAction::Update { id, payload } => with_payload(&payload, |patch: QualifyingPatch| {
            ok(repo.update_qualifying(id, &patch))
        }),
        EntryAction::Delete { id } => deleted(repo.delete_qualifying(id)),
    })
}

fn health(conn: &Connection) -> RepoResult<Reply> {
    let schema_version = current_version(conn)?;
    Ok(ok(Ok(Health {
        ping: ping(),
        version: core_version(),
        schema_version,
    })))
}

#[cfg(test)]
mod tests {
    use super::{execute, Command, EntryAction, PayloadArgs, RacesAction, SeasonsAction};
    use apexdata_core::{open_db_in_memory, CoreConfig};

    fn create_season(year: i32) -> Command {
        Command::Seasons {
            action: SeasonsAction::Create(PayloadArgs {
                json: format!(r#"{{"year": {year}}}"#),
            }),
        }
    }

    #[test]
    fn season_lifecycle_reports_status_codes() {
        let conn = open_db_in_memory().unwrap();
        let config = CoreConfig::default();

        let created = execute(&conn, &config, create_season(2024));
        assert_eq!(created.status, 201);
        assert_eq!(created.body["data"]["year"], 2024);

        let duplicate = execute(&conn, &config, create_season(2024));
        assert_eq!(duplicate.status, 400);
        assert!(!duplicate.is_success());

        let schedule = execute(
            &conn,
            &config,
            Command::Seasons {
                action: SeasonsAction::Races { year: 2024 },
            },
        );
        assert_eq!(schedule.status, 200);
        assert_eq!(schedule.body["data"], serde_json::json!([]));

        let deleted = execute(
            &conn,
            &config,
            Command::Seasons {
                action: SeasonsAction::Delete { year: 2024 },
            },
        );
        assert_eq!(deleted.status, 204);
    }

    #[test]
    fn malformed_payload_is_bad_request() {
        let conn = open_db_in_memory().unwrap();
        let reply = execute(
            &conn,
            &CoreConfig::default(),
            Command::Results {
                action: EntryAction::Create(PayloadArgs {
                    json: "{not json".to_string(),
                }),
            },
        );
        assert_eq!(reply.status, 400);
        assert!(reply.body["error"]
            .as_str()
            .unwrap()
            .starts_with("invalid json payload"));
    }

    #[test]
    fn unknown_race_weekend_is_not_found() {
        let conn = open_db_in_memory().unwrap();
        let reply = execute(
            &conn,
            &CoreConfig::default(),
            Command::Races {
                action: RacesAction::Weekend {
                    id: apexdata_core::new_record_id(),
                },
            },
        );
        assert_eq!(reply.status, 404);
    }

    #[test]
    fn health_reports_schema_version() {
        let conn = open_db_in_memory().unwrap();
        let reply = execute(&conn, &CoreConfig::default(), Command::Health);
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body["data"]["ping"], "pong");
        assert_eq!(
            reply.body["data"]["schema_version"],
            apexdata_core::db::migrations::latest_version()
        );
    }
}
