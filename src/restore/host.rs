// dbrestoretool/src/restore/host.rs
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, warn};

use crate::errors::{RestoreError, Result};
use crate::utils::process::command_status;

/// Runs commands on the host itself (outside any container).
#[async_trait]
pub trait HostCommands: Send + Sync {
    /// Runs `argv` and returns its exit code.
    async fn run(&self, argv: &[String]) -> Result<i32>;
}

pub struct SystemHost;

#[async_trait]
impl HostCommands for SystemHost {
    async fn run(&self, argv: &[String]) -> Result<i32> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| RestoreError::Config("Cannot run an empty host command".to_string()))?;
        command_status(Path::new(program), args).await
    }
}

/// `systemctl <action> <unit>` where a non-zero exit, or a systemctl that
/// cannot be started at all, is logged and ignored: the unit may already be
/// in the requested state.
pub async fn best_effort_systemctl(host: &dyn HostCommands, action: &str, unit: &str) {
    let argv = vec!["systemctl".to_string(), action.to_string(), unit.to_string()];
    match host.run(&argv).await {
        Ok(0) => debug!("systemctl {} {} succeeded", action, unit),
        Ok(code) => warn!("systemctl {} {} exited with {}; continuing", action, unit, code),
        Err(e) => warn!("systemctl {} {} could not run: {}; continuing", action, unit, e),
    }
}
