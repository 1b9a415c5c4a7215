//! Command-line adapter over the directory core.
//!
//! # Responsibility
//! - Open the configured database, run one query or command, print JSON.
//! - Map core outcomes to exit codes: invalid input, not found, failure.
//!
//! # Invariants
//! - Absent entities print nothing to stdout and exit with `EXIT_NOT_FOUND`.
//! - Core errors are never swallowed; they reach stderr with their kind.

use clap::{Parser, Subcommand};
use log::info;
use orgatlas_core::db::{open_db, DbError};
use orgatlas_core::logging::LogSettings;
use orgatlas_core::{
    seed_demo_directory, ActivityId, BuildingId, DirectoryError, ErrorKind, NewActivity,
    NewBuilding, NewOrganization, OrganizationId, RepoError, SqliteDirectory,
};
use rusqlite::Connection;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_FAILURE: u8 = 1;
const EXIT_INVALID_INPUT: u8 = 2;
const EXIT_NOT_FOUND: u8 = 3;

#[derive(Debug, Parser)]
#[command(name = "orgatlas")]
#[command(about = "Organization directory: buildings, activity taxonomy and geo queries")]
#[command(version)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "ORGATLAS_DB_PATH", default_value = "orgatlas.sqlite3")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
enum Command {
    /// List all buildings
    Buildings,
    /// Show one building
    Building { id: BuildingId },
    /// List all activities with their children
    Activities,
    /// Show one activity with its children
    Activity { id: ActivityId },
    /// Show one organization
    Org { id: OrganizationId },
    /// Organizations registered in a building
    ByBuilding { building_id: BuildingId },
    /// Organizations under an activity, descendants included
    ByActivity { activity_id: ActivityId },
    /// Organizations whose name contains the text
    SearchName { text: String },
    /// Organizations under the first activity whose name contains the text
    SearchActivity { text: String },
    /// Organizations within a radius of a point
    Radius {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
        /// Radius in kilometers
        #[arg(allow_negative_numbers = true)]
        radius_km: f64,
    },
    /// Organizations inside an inclusive latitude/longitude rectangle
    Rect {
        #[arg(allow_negative_numbers = true)]
        min_lat: f64,
        #[arg(allow_negative_numbers = true)]
        max_lat: f64,
        #[arg(allow_negative_numbers = true)]
        min_lon: f64,
        #[arg(allow_negative_numbers = true)]
        max_lon: f64,
    },
    /// Create a building
    AddBuilding {
        address: String,
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },
    /// Create an activity, optionally under a parent
    AddActivity {
        name: String,
        parent_id: Option<ActivityId>,
    },
    /// Create an organization
    AddOrg {
        name: String,
        building_id: BuildingId,
        /// Phone number; repeatable
        #[arg(long = "phone")]
        phones: Vec<String>,
        /// Activity id; repeatable, unknown ids are dropped
        #[arg(long = "activity")]
        activities: Vec<ActivityId>,
    },
    /// Load demo data into a database without organizations
    Seed,
}

#[derive(Debug)]
enum CliError {
    NotFound(String),
    Logging(String),
    Db(DbError),
    Directory(DirectoryError),
    Output(serde_json::Error),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            Self::NotFound(_) => EXIT_NOT_FOUND,
            Self::Directory(err) => match err.kind() {
                ErrorKind::InvalidInput => EXIT_INVALID_INPUT,
                ErrorKind::Internal => EXIT_FAILURE,
            },
            Self::Logging(_) | Self::Db(_) | Self::Output(_) => EXIT_FAILURE,
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(message) => write!(f, "{message}"),
            Self::Logging(message) => write!(f, "logging setup failed: {message}"),
            Self::Db(err) => write!(f, "database error: {err}"),
            Self::Directory(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "failed to encode output: {err}"),
        }
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<DirectoryError> for CliError {
    fn from(value: DirectoryError) -> Self {
        Self::Directory(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Directory(value.into())
    }
}

fn main() -> ExitCode {
    // Usage errors exit through clap with code 2, same as invalid input.
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<String, CliError> {
    LogSettings::from_env()
        .apply()
        .map_err(CliError::Logging)?;

    let conn = open_db(&cli.db)?;
    let output = execute(&conn, cli.command)?;
    info!("event=cli_command module=cli status=ok");
    Ok(output)
}

fn execute(conn: &Connection, command: Command) -> Result<String, CliError> {
    let directory = SqliteDirectory::try_new(conn)?;
    let organizations = &directory.organizations;
    match command {
        Command::Buildings => render(&directory.buildings.list_buildings()?),
        Command::Building { id } => {
            render(&found(directory.buildings.get_building(id)?, "building", id)?)
        }
        Command::Activities => render(&directory.activities.list_activities()?),
        Command::Activity { id } => {
            render(&found(directory.activities.get_activity(id)?, "activity", id)?)
        }
        Command::Org { id } => {
            render(&found(organizations.organization_by_id(id)?, "organization", id)?)
        }
        Command::ByBuilding { building_id } => {
            render(&organizations.organizations_by_building(building_id)?)
        }
        Command::ByActivity { activity_id } => {
            render(&organizations.organizations_by_activity(activity_id)?)
        }
        Command::SearchName { text } => render(&organizations.organizations_by_name(&text)?),
        Command::SearchActivity { text } => {
            render(&organizations.organizations_by_activity_name(&text)?)
        }
        Command::Radius {
            lat,
            lon,
            radius_km,
        } => render(&organizations.organizations_in_radius(lat, lon, radius_km)?),
        Command::Rect {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        } => render(&organizations.organizations_in_rectangle(min_lat, max_lat, min_lon, max_lon)?),
        Command::AddBuilding { address, lat, lon } => {
            render(&directory.buildings.create_building(&NewBuilding::new(address, lat, lon))?)
        }
        Command::AddActivity { name, parent_id } => {
            let request = match parent_id {
                Some(parent_id) => NewActivity::child_of(parent_id, name),
                None => NewActivity::root(name),
            };
            render(&directory.activities.create_activity(&request)?)
        }
        Command::AddOrg {
            name,
            building_id,
            phones,
            activities,
        } => {
            let request = NewOrganization {
                name,
                building_id,
                phone_numbers: phones,
                activity_ids: activities,
            };
            render(&organizations.create_organization(&request)?)
        }
        Command::Seed => {
            let summary = seed_demo_directory(conn)?;
            render(&serde_json::json!({
                "skipped": summary.skipped,
                "buildings": summary.buildings,
                "activities": summary.activities,
                "organizations": summary.organizations,
            }))
        }
    }
}

fn found<T>(value: Option<T>, entity: &str, id: i64) -> Result<T, CliError> {
    value.ok_or_else(|| CliError::NotFound(format!("{entity} not found: {id}")))
}

fn render<T: Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(CliError::Output)
}
