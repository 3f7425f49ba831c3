//! Container runtime seam.
//!
//! The restore flow only ever talks to containers through [`ContainerRuntime`];
//! [`docker::DockerRuntime`] is the production implementation.

pub mod docker;
pub mod patches;

use async_trait::async_trait;
use std::fs::File;
use std::path::Path;
use tracing::error;

use crate::config::PatchSet;
use crate::errors::{RestoreError, Result};
use crate::utils::argv;
use crate::utils::process::DumpStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchMode {
    Apply,
    Revert,
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn stop_container(&self, name: &str) -> Result<()>;

    async fn start_container(&self, name: &str) -> Result<()>;

    /// Blocks until the container reports ready, bounded by the runtime's
    /// configured timeout (`ContainerNotReady` once exceeded).
    async fn wait_until_ready(&self, name: &str) -> Result<()>;

    /// Runs a one-off command inside the container and returns its stdout.
    async fn run_in_container(&self, name: &str, argv: &[String]) -> Result<String>;

    /// Runs a command inside the container with `input` streamed to its
    /// stdin; returns once the pipe is closed and the process has exited.
    async fn pipe_into_container(
        &self,
        name: &str,
        argv: &[String],
        input: DumpStream,
    ) -> Result<()>;

    /// Applies (or reverts) every file of a patch set inside its container.
    ///
    /// Reverting walks the files in reverse order and attempts every one. If a
    /// file fails to apply, the files of this set that did go in are reverted
    /// before the error is returned, so a failed set leaves nothing behind.
    async fn apply_patches(&self, patch: &PatchSet, mode: PatchMode) -> Result<()> {
        match mode {
            PatchMode::Apply => {
                let command = patch_command(&patch.prefix, PatchMode::Apply);
                for (index, file) in patch.files.iter().enumerate() {
                    let result = pipe_patch_file(self, patch, &command, file).await;
                    if let Err(e) = result {
                        let applied = PatchSet {
                            files: patch.files[..index].to_vec(),
                            ..patch.clone()
                        };
                        return match self.apply_patches(&applied, PatchMode::Revert).await {
                            Ok(()) => Err(e),
                            Err(revert) => Err(RestoreError::PatchRevert {
                                failures: vec![revert],
                                primary: Some(Box::new(e)),
                            }),
                        };
                    }
                }
                Ok(())
            }
            PatchMode::Revert => {
                let command = patch_command(&patch.prefix, PatchMode::Revert);
                let mut failures = Vec::new();
                for file in patch.files.iter().rev() {
                    let result = pipe_patch_file(self, patch, &command, file).await;
                    if let Err(e) = result {
                        error!("Failed to revert {} in {}: {}", file.display(), patch.container, e);
                        failures.push(e);
                    }
                }
                match failures.len() {
                    0 => Ok(()),
                    1 => Err(failures.remove(0)),
                    _ => Err(RestoreError::PatchRevert { failures, primary: None }),
                }
            }
        }
    }
}

fn patch_command(prefix: &str, mode: PatchMode) -> Vec<String> {
    let mut command = argv(["patch", "-N", "-p1", "-d"]);
    command.push(prefix.to_string());
    if mode == PatchMode::Revert {
        command.push("-R".to_string());
    }
    command
}

async fn pipe_patch_file<R: ContainerRuntime + ?Sized>(
    runtime: &R,
    patch: &PatchSet,
    command: &[String],
    file: &Path,
) -> Result<()> {
    let input = File::open(file).map_err(|e| {
        RestoreError::Config(format!("Cannot open patch file {}: {}", file.display(), e))
    })?;
    runtime.pipe_into_container(&patch.container, command, Box::new(input)).await
}
