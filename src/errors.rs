use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RestoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read '{path}' from archive: {reason}")]
    ArchiveRead { path: String, reason: String },

    #[error("Command `{command}` failed ({status}): {stderr}")]
    CommandExecution {
        command: String,
        status: String,
        stdout: String,
        stderr: String,
    },

    #[error("Container '{container}' not ready after {}s", .waited.as_secs())]
    ContainerNotReady { container: String, waited: Duration },

    #[error("Database consistency repair failed: {0}")]
    ConsistencyRepair(String),

    #[error("Remote log link repair failed: {0}")]
    LogLinkRepair(String),

    #[error("Failed to revert {} patch set(s): {}", .failures.len(), join_errors(.failures))]
    PatchRevert {
        failures: Vec<RestoreError>,
        primary: Option<Box<RestoreError>>,
    },

    #[error("Platform API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl RestoreError {
    pub(crate) fn command(
        argv: &[String],
        status: impl ToString,
        stdout: &[u8],
        stderr: &[u8],
    ) -> Self {
        RestoreError::CommandExecution {
            command: argv.join(" "),
            status: status.to_string(),
            stdout: String::from_utf8_lossy(stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }
}

fn join_errors(errors: &[RestoreError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, RestoreError>;
