// dbrestoretool/src/restore/db_restore.rs
use tracing::info;

use super::Platform;
use super::archivator::{Archivator, drop_database_command};
use super::host::best_effort_systemctl;
use crate::errors::Result;

/// Replaces one database's contents with the dump stored in the archive.
///
/// 1. Opens the dump (a missing or unreadable member fails before anything
///    is touched).
/// 2. Stops the host unit `docker-<db>.service` (best effort) and the
///    service container named after the database.
/// 3. Drops the database inside the engine container (`--if-exists`).
/// 4. Streams the dump into the engine's load command.
/// 5. Starts the service container, waits for it, starts the host unit.
///
/// A failed load leaves the database dropped; nothing is restarted.
pub async fn restore_database(archivator: &Archivator, platform: &Platform<'_>) -> Result<()> {
    let db = archivator.db.as_str();
    info!("Restoring database {} from {}", db, archivator.archive_path);

    let dump = platform.archive.extract_file(&archivator.archive_path)?;

    let unit = archivator.host_service();
    best_effort_systemctl(platform.host, "stop", &unit).await;
    platform.runtime.stop_container(db).await?;

    info!("Dropping database {} in container {}", db, archivator.container);
    platform
        .runtime
        .run_in_container(&archivator.container, &drop_database_command(db))
        .await?;

    info!("Loading dump for {} into container {}", db, archivator.container);
    platform
        .runtime
        .pipe_into_container(&archivator.container, &archivator.restore_command, dump)
        .await?;

    platform.runtime.start_container(db).await?;
    platform.runtime.wait_until_ready(db).await?;
    best_effort_systemctl(platform.host, "start", &unit).await;

    info!("✓ Database {} restored", db);
    Ok(())
}
