// dbrestoretool/src/restore/remote_logs.rs
use std::fs;
use std::future::Future;
use std::os::unix::fs::symlink;
use std::path::Path;
use tracing::{debug, error, info};

use super::Platform;
use crate::api::{AuthContext, NodeRecord};
use crate::config::RemoteLogSettings;
use crate::container::ContainerRuntime;
use crate::errors::{RestoreError, Result};

/// What one reconciliation pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkSummary {
    pub renamed: usize,
    pub created: usize,
    pub already_linked: usize,
    pub out_of_domain: usize,
}

fn as_link_error(e: RestoreError) -> RestoreError {
    match e {
        RestoreError::LogLinkRepair(_) => e,
        other => RestoreError::LogLinkRepair(other.to_string()),
    }
}

fn fs_error(action: &str, path: &Path, e: std::io::Error) -> RestoreError {
    RestoreError::LogLinkRepair(format!("Failed to {} {}: {}", action, path.display(), e))
}

/// Turns every IP-named remote log directory of an in-domain node into a
/// link `<ip> -> <fqdn>`. Entries that already are links are left alone,
/// so running this again over the same layout changes nothing.
pub fn reconcile_links(root: &Path, domain: &str, nodes: &[NodeRecord]) -> Result<LinkSummary> {
    let mut summary = LinkSummary::default();
    for node in nodes {
        if !node.fqdn.ends_with(domain) {
            summary.out_of_domain += 1;
            continue;
        }
        let ip_path = root.join(&node.ip);
        let fqdn_path = root.join(&node.fqdn);

        if ip_path.is_symlink() {
            summary.already_linked += 1;
            continue;
        }
        if ip_path.is_dir() {
            debug!("Renaming {} to {}", ip_path.display(), fqdn_path.display());
            fs::rename(&ip_path, &fqdn_path).map_err(|e| fs_error("rename", &ip_path, e))?;
            summary.renamed += 1;
        } else if !fqdn_path.is_dir() {
            fs::create_dir(&fqdn_path).map_err(|e| fs_error("create", &fqdn_path, e))?;
            summary.created += 1;
        }
        // Relative target, so the link survives the log root being remounted.
        symlink(&node.fqdn, &ip_path).map_err(|e| fs_error("link", &ip_path, e))?;
    }
    Ok(summary)
}

/// Runs `body` with the remote log collector stopped. The collector is
/// restarted on every exit path; an error from `body` takes precedence over
/// one from the restart.
pub async fn with_stopped_collector<T, F>(
    runtime: &dyn ContainerRuntime,
    settings: &RemoteLogSettings,
    body: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let service = |action: &str| {
        vec![
            "service".to_string(),
            settings.collector_service.clone(),
            action.to_string(),
        ]
    };

    info!("Stopping {} in container {}", settings.collector_service, settings.collector_container);
    runtime
        .run_in_container(&settings.collector_container, &service("stop"))
        .await
        .map_err(as_link_error)?;

    let outcome = body.await;

    info!("Starting {} in container {}", settings.collector_service, settings.collector_container);
    let restarted = runtime
        .run_in_container(&settings.collector_container, &service("start"))
        .await;

    match (outcome, restarted) {
        (Ok(value), Ok(_)) => Ok(value),
        (Ok(_), Err(e)) => Err(as_link_error(e)),
        (Err(e), Ok(_)) => Err(e),
        (Err(e), Err(restart_error)) => {
            error!("Failed to restart {}: {}", settings.collector_service, restart_error);
            Err(e)
        }
    }
}

/// Re-links remote log directories named by IP to the nodes' FQDNs, using
/// the live node inventory.
pub async fn repair_remote_log_links(platform: &Platform<'_>, context: &AuthContext) -> Result<()> {
    let domain = platform.metadata.dns_domain().map_err(as_link_error)?;
    let nodes = platform.api.list_nodes(context).await.map_err(as_link_error)?;
    let settings = platform.remote_logs;

    let summary = with_stopped_collector(platform.runtime, settings, async {
        reconcile_links(&settings.root, &domain, &nodes)
    })
    .await?;

    info!(
        "Remote log links under {}: {} renamed, {} created, {} already linked, {} outside {}",
        settings.root.display(),
        summary.renamed,
        summary.created,
        summary.already_linked,
        summary.out_of_domain,
        domain
    );
    Ok(())
}
