pub mod archivator;
pub mod consistency;
pub(crate) mod db_restore;
pub mod host;
pub(crate) mod logic;
pub mod remote_logs;

pub use archivator::{Archivator, Overrides, Repair};
pub use host::{HostCommands, SystemHost};
pub use logic::perform_restore;

use tracing::{error, info};

use crate::api::{AuthContext, NailgunClient, PlatformApi};
use crate::archive::{ArchiveReader, TarArchive};
use crate::config::metadata::{DeploymentMetadata, StaticMetadata};
use crate::config::{AppConfig, RemoteLogSettings};
use crate::container::ContainerRuntime;
use crate::container::docker::DockerRuntime;
use crate::errors::Result;

/// The external collaborators one restore run talks to.
pub struct Platform<'a> {
    pub archive: &'a dyn ArchiveReader,
    pub runtime: &'a dyn ContainerRuntime,
    pub host: &'a dyn HostCommands,
    pub api: &'a dyn PlatformApi,
    pub metadata: &'a dyn DeploymentMetadata,
    pub remote_logs: &'a RemoteLogSettings,
}

/// Public entry point for the restore process.
/// Restores each configured database in turn, stopping at the first failure.
pub async fn run_restore_flow(app_config: &AppConfig, context: Option<&AuthContext>) -> Result<()> {
    let archive = TarArchive::open(&app_config.archive_path)?;
    let runtime = DockerRuntime::new(app_config.container.clone())?;
    let api = NailgunClient::new(&app_config.api_base_url)?;
    let metadata = StaticMetadata {
        dns_domain: app_config.dns_domain.clone(),
    };
    let platform = Platform {
        archive: &archive,
        runtime: &runtime,
        host: &SystemHost,
        api: &api,
        metadata: &metadata,
        remote_logs: &app_config.remote_logs,
    };

    for db in &app_config.databases {
        let archivator = Archivator::for_database(db, app_config)?;
        info!("🔄 Restoring {} from {}", db, app_config.archive_path.display());
        if let Err(e) = perform_restore(&archivator, &platform, context).await {
            error!("❌ Restore of {} failed: {}", db, e);
            return Err(e);
        }
        info!("✅ {} restored", db);
    }
    Ok(())
}
