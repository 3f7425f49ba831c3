pub mod process;
pub mod psql;

use std::path::PathBuf;
use which::which;

use crate::errors::{RestoreError, Result};

/// Finds the docker executable in the system PATH.
pub fn find_docker_executable() -> Result<PathBuf> {
    which("docker").map_err(|e| {
        RestoreError::Config(format!(
            "docker executable not found in PATH ({}). \
             Please ensure the container runtime CLI is installed.",
            e
        ))
    })
}

/// Renders an argument vector as a single owned `Vec<String>`.
pub fn argv<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}
