// dbrestoretool/src/container/patches.rs
use std::future::Future;
use tracing::{error, info};

use super::{ContainerRuntime, PatchMode};
use crate::config::PatchSet;
use crate::errors::{RestoreError, Result};

/// Runs `body` with every patch set in `patches` applied.
///
/// Sets are applied in order and reverted in reverse order once `body`
/// finishes, whatever its outcome. `body` is never polled unless all sets
/// applied; a failed apply reverts the sets that did go in and returns the
/// apply error. Every revert is attempted even if an earlier one fails; revert
/// failures are surfaced as `PatchRevert`, which also carries the body's own
/// error when both happened.
pub async fn with_applied_patches<T, F>(
    runtime: &dyn ContainerRuntime,
    patches: &[PatchSet],
    body: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let mut applied = 0;
    let mut apply_error = None;
    for patch in patches {
        info!("Applying patches in container {} ({})", patch.container, patch.prefix);
        match runtime.apply_patches(patch, PatchMode::Apply).await {
            Ok(()) => applied += 1,
            Err(e) => {
                apply_error = Some(e);
                break;
            }
        }
    }

    let outcome = match apply_error {
        Some(e) => Err(e),
        None => body.await,
    };

    let mut failures = Vec::new();
    for patch in patches[..applied].iter().rev() {
        info!("Reverting patches in container {} ({})", patch.container, patch.prefix);
        if let Err(e) = runtime.apply_patches(patch, PatchMode::Revert).await {
            error!("Failed to revert patches in container {}: {}", patch.container, e);
            failures.push(e);
        }
    }

    if failures.is_empty() {
        return outcome;
    }
    let primary = match outcome {
        Ok(_) => None,
        Err(e) => {
            error!("Restore failed before patch revert also failed: {}", e);
            Some(Box::new(e))
        }
    };
    Err(RestoreError::PatchRevert { failures, primary })
}
