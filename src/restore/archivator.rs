// dbrestoretool/src/restore/archivator.rs
use crate::config::{AppConfig, PatchSet};
use crate::errors::{RestoreError, Result};
use crate::utils::argv;

/// Directory inside the backup archive that holds database dumps.
pub const DUMP_SUBSYSTEM: &str = "postgres";
/// The platform's primary database, which gets the post-restore repairs.
pub const PRIMARY_DATABASE: &str = "nailgun";

/// Post-restore repair steps, run in declaration order after the generic restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repair {
    DatabaseConsistency,
    RemoteLogLinks,
}

/// Explicit values that win over the derived defaults.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub restore_command: Option<Vec<String>>,
    pub dump_command: Option<Vec<String>>,
    pub archive_path: Option<String>,
}

/// Everything needed to restore one database.
#[derive(Debug, Clone, PartialEq)]
pub struct Archivator {
    pub db: String,
    /// Container hosting the database engine; the same for every database.
    pub container: String,
    /// Run inside `container` with the dump on stdin.
    pub restore_command: Vec<String>,
    /// Produces the dump this archivator restores (`pg_dump -C`, so the
    /// dump creates and connects to its own database).
    pub dump_command: Vec<String>,
    pub archive_path: String,
    pub repairs: Vec<Repair>,
    pub patches: Vec<PatchSet>,
}

pub fn default_restore_command() -> Vec<String> {
    argv(["sudo", "-u", "postgres", "psql"])
}

pub fn default_dump_command(db: &str) -> Vec<String> {
    let mut command = argv(["sudo", "-u", "postgres", "pg_dump", "-C"]);
    command.push(db.to_string());
    command
}

pub fn default_archive_path(db: &str) -> String {
    format!("{}/{}.sql", DUMP_SUBSYSTEM, db)
}

pub fn drop_database_command(db: &str) -> Vec<String> {
    let mut command = argv(["sudo", "-u", "postgres", "dropdb", "--if-exists"]);
    command.push(db.to_string());
    command
}

impl Archivator {
    /// Fills in every parameter not given in `overrides` from `db`.
    /// The result carries no repairs or patches.
    pub fn build(db: &str, container: &str, overrides: Overrides) -> Result<Self> {
        if db.trim().is_empty() {
            return Err(RestoreError::Config(
                "An archivator needs a non-empty database name".to_string(),
            ));
        }
        if container.trim().is_empty() {
            return Err(RestoreError::Config(format!(
                "Archivator for '{}' needs a database container name",
                db
            )));
        }

        Ok(Archivator {
            db: db.to_string(),
            container: container.to_string(),
            restore_command: overrides
                .restore_command
                .unwrap_or_else(default_restore_command),
            dump_command: overrides
                .dump_command
                .unwrap_or_else(|| default_dump_command(db)),
            archive_path: overrides
                .archive_path
                .unwrap_or_else(|| default_archive_path(db)),
            repairs: Vec::new(),
            patches: Vec::new(),
        })
    }

    /// The archivator the driver uses for `db`: the primary database gets its
    /// repairs and restore-window patches, every other database the generic
    /// restore only.
    pub fn for_database(db: &str, config: &AppConfig) -> Result<Self> {
        let mut archivator =
            Archivator::build(db, &config.container.postgres_container, Overrides::default())?;
        if db == PRIMARY_DATABASE {
            archivator.repairs = vec![Repair::DatabaseConsistency, Repair::RemoteLogLinks];
        }
        archivator.patches = config.patches_for(db);
        Ok(archivator)
    }

    pub fn host_service(&self) -> String {
        format!("docker-{}.service", self.db)
    }
}
