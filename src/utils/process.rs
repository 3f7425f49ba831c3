// dbrestoretool/src/utils/process.rs
use std::io::{Read, copy};
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};
use std::thread;
use tokio::process::Command;
use tracing::debug;

use crate::errors::{RestoreError, Result};

/// Owned, readable byte stream handed from the archive to a consuming process.
pub type DumpStream = Box<dyn Read + Send>;

fn describe(program: &Path, args: &[String]) -> Vec<String> {
    let mut line = vec![program.display().to_string()];
    line.extend(args.iter().cloned());
    line
}

/// Runs a command to completion and returns its stdout.
/// A non-zero exit (or failure to start) is a `CommandExecution` error.
pub async fn run_command(program: &Path, args: &[String]) -> Result<String> {
    let line = describe(program, args);
    debug!("Running `{}`", line.join(" "));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| RestoreError::command(&line, format!("failed to start: {}", e), b"", b""))?;

    if !output.status.success() {
        return Err(RestoreError::command(
            &line,
            output.status,
            &output.stdout,
            &output.stderr,
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Runs a command and reports its exit code without judging it.
/// Termination by signal is reported as `-1`.
pub async fn command_status(program: &Path, args: &[String]) -> Result<i32> {
    let line = describe(program, args);
    debug!("Running `{}`", line.join(" "));

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .status()
        .await
        .map_err(|e| RestoreError::command(&line, format!("failed to start: {}", e), b"", b""))?;
    Ok(status.code().unwrap_or(-1))
}

/// Starts a command with a piped stdin and streams `input` into it.
///
/// The input is written from a separate thread while `wait_with_output`
/// drains stdout and stderr, so a chatty child (psql prints a status line per
/// statement) can never stall on a full output pipe.
pub async fn pipe_into_command(
    program: &Path,
    args: &[String],
    mut input: DumpStream,
) -> Result<u64> {
    let line = describe(program, args);
    let program = program.to_path_buf();
    let args = args.to_vec();
    debug!("Piping input into `{}`", line.join(" "));

    tokio::task::spawn_blocking(move || -> Result<u64> {
        let mut child = StdCommand::new(&program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                RestoreError::command(&line, format!("failed to start: {}", e), b"", b"")
            })?;

        let writer = child.stdin.take().map(|mut stdin| {
            // stdin is dropped when the thread ends, so the process sees EOF.
            thread::spawn(move || copy(&mut input, &mut stdin))
        });
        let output = child.wait_with_output()?;
        let copied = match writer {
            Some(handle) => handle
                .join()
                .map_err(|_| std::io::Error::other("stdin writer thread panicked"))?,
            None => Ok(0),
        };

        if !output.status.success() {
            return Err(RestoreError::command(
                &line,
                output.status,
                &output.stdout,
                &output.stderr,
            ));
        }
        Ok(copied?)
    })
    .await
    .map_err(|e| RestoreError::Io(std::io::Error::other(e)))?
}
