// dbrestoretool/src/restore/logic.rs
use tracing::info;

use super::Platform;
use super::archivator::{Archivator, Repair};
use super::consistency::repair_database_consistency;
use super::db_restore::restore_database;
use super::remote_logs::repair_remote_log_links;
use crate::api::AuthContext;
use crate::container::patches::with_applied_patches;
use crate::errors::{RestoreError, Result};

async fn run_repair(
    repair: Repair,
    archivator: &Archivator,
    platform: &Platform<'_>,
    context: Option<&AuthContext>,
) -> Result<()> {
    info!("Running {:?} repair for {}", repair, archivator.db);
    match repair {
        Repair::DatabaseConsistency => {
            repair_database_consistency(platform.runtime, &archivator.container, &archivator.db)
                .await
        }
        Repair::RemoteLogLinks => {
            let context = context.ok_or_else(|| {
                RestoreError::LogLinkRepair(
                    "the platform API needs an auth context (PLATFORM_AUTH_TOKEN)".to_string(),
                )
            })?;
            repair_remote_log_links(platform, context).await
        }
    }
}

/// Restores one database: generic restore, then each of the archivator's
/// repairs in order, all inside its restore-window patches. The patches are
/// reverted whatever happens; the first failing step aborts the rest.
pub async fn perform_restore(
    archivator: &Archivator,
    platform: &Platform<'_>,
    context: Option<&AuthContext>,
) -> Result<()> {
    with_applied_patches(platform.runtime, &archivator.patches, async {
        restore_database(archivator, platform).await?;
        for repair in &archivator.repairs {
            run_repair(*repair, archivator, platform, context).await?;
        }
        Ok(())
    })
    .await
}
