// dbrestoretool/src/container/docker.rs
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use super::ContainerRuntime;
use crate::config::ContainerSettings;
use crate::errors::{RestoreError, Result};
use crate::utils::find_docker_executable;
use crate::utils::process::{DumpStream, pipe_into_command, run_command};

const INSPECT_FORMAT: &str =
    "{{.State.Running}} {{if .State.Health}}{{.State.Health.Status}}{{else}}none{{end}}";

/// Drives containers through the `docker` CLI.
pub struct DockerRuntime {
    docker: PathBuf,
    settings: ContainerSettings,
}

impl DockerRuntime {
    pub fn new(settings: ContainerSettings) -> Result<Self> {
        let docker = match &settings.docker_binary {
            Some(path) => path.clone(),
            None => find_docker_executable()?,
        };
        Ok(DockerRuntime { docker, settings })
    }

    fn full_name(&self, name: &str) -> String {
        format!("{}{}", self.settings.name_prefix, name)
    }

    async fn docker(&self, args: Vec<String>) -> Result<String> {
        run_command(&self.docker, &args).await
    }
}

/// Interprets one line of `docker inspect` output produced with `INSPECT_FORMAT`.
fn is_ready(inspect_output: &str) -> bool {
    let mut fields = inspect_output.split_whitespace();
    let running = fields.next() == Some("true");
    let health = fields.next().unwrap_or("none");
    running && (health == "healthy" || health == "none")
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn stop_container(&self, name: &str) -> Result<()> {
        let container = self.full_name(name);
        info!("Stopping container {}", container);
        self.docker(vec!["stop".into(), container]).await?;
        Ok(())
    }

    async fn start_container(&self, name: &str) -> Result<()> {
        let container = self.full_name(name);
        info!("Starting container {}", container);
        self.docker(vec!["start".into(), container]).await?;
        Ok(())
    }

    async fn wait_until_ready(&self, name: &str) -> Result<()> {
        let container = self.full_name(name);
        let started = Instant::now();
        loop {
            // A failing inspect just means "not ready yet" until the deadline.
            match self
                .docker(vec![
                    "inspect".into(),
                    "--format".into(),
                    INSPECT_FORMAT.into(),
                    container.clone(),
                ])
                .await
            {
                Ok(output) if is_ready(&output) => {
                    info!("Container {} is ready", container);
                    return Ok(());
                }
                Ok(output) => debug!("Container {} not ready yet: {}", container, output.trim()),
                Err(e) => debug!("Container {} not inspectable yet: {}", container, e),
            }

            if started.elapsed() >= self.settings.ready_timeout {
                return Err(RestoreError::ContainerNotReady {
                    container,
                    waited: started.elapsed(),
                });
            }
            sleep(self.settings.ready_poll_interval).await;
        }
    }

    async fn run_in_container(&self, name: &str, argv: &[String]) -> Result<String> {
        let mut args = vec!["exec".to_string(), self.full_name(name)];
        args.extend(argv.iter().cloned());
        self.docker(args).await
    }

    async fn pipe_into_container(
        &self,
        name: &str,
        argv: &[String],
        input: DumpStream,
    ) -> Result<()> {
        let mut args = vec!["exec".to_string(), "-i".to_string(), self.full_name(name)];
        args.extend(argv.iter().cloned());
        let copied = pipe_into_command(&self.docker, &args, input).await?;
        debug!("Streamed {} bytes into {}", copied, self.full_name(name));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;

    /// Writes a fake `docker` script that logs its arguments (and stdin, for
    /// `exec -i`) and answers `inspect` with `inspect_reply`.
    fn fake_docker(dir: &std::path::Path, inspect_reply: &str) -> anyhow::Result<PathBuf> {
        let script = dir.join("docker");
        let log = dir.join("calls.log");
        let body = format!(
            "#!/bin/sh\n\
             echo \"$@\" >> {log}\n\
             if [ \"$1\" = \"inspect\" ]; then echo '{reply}'; fi\n\
             if [ \"$2\" = \"-i\" ]; then cat >> {log}; fi\n",
            log = log.display(),
            reply = inspect_reply,
        );
        std::fs::write(&script, body)?;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;
        Ok(script)
    }

    fn runtime(docker: PathBuf, prefix: &str) -> DockerRuntime {
        DockerRuntime {
            docker,
            settings: ContainerSettings {
                docker_binary: None,
                name_prefix: prefix.to_string(),
                postgres_container: "postgres".to_string(),
                ready_timeout: Duration::from_millis(50),
                ready_poll_interval: Duration::from_millis(10),
            },
        }
    }

    #[test]
    fn test_is_ready_requires_running_and_healthy() {
        assert!(is_ready("true none\n"));
        assert!(is_ready("true healthy"));
        assert!(!is_ready("true starting"));
        assert!(!is_ready("false none"));
        assert!(!is_ready(""));
    }

    #[tokio::test]
    async fn test_commands_use_prefixed_names() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let rt = runtime(fake_docker(dir.path(), "true none")?, "fuel-core-");

        rt.stop_container("nailgun").await?;
        rt.run_in_container("postgres", &["dropdb".into(), "nailgun".into()]).await?;
        let dump: DumpStream = Box::new(Cursor::new(b"SELECT 1;\n".to_vec()));
        rt.pipe_into_container("postgres", &["psql".into()], dump).await?;
        rt.start_container("nailgun").await?;
        rt.wait_until_ready("nailgun").await?;

        let calls = std::fs::read_to_string(dir.path().join("calls.log"))?;
        let lines: Vec<&str> = calls.lines().collect();
        let inspect = format!("inspect --format {} fuel-core-nailgun", INSPECT_FORMAT);
        assert_eq!(
            lines,
            vec![
                "stop fuel-core-nailgun",
                "exec fuel-core-postgres dropdb nailgun",
                "exec -i fuel-core-postgres psql",
                "SELECT 1;",
                "start fuel-core-nailgun",
                inspect.as_str(),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_wait_until_ready_times_out() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let rt = runtime(fake_docker(dir.path(), "true starting")?, "");

        let err = rt.wait_until_ready("nailgun").await.unwrap_err();
        match err {
            RestoreError::ContainerNotReady { container, waited } => {
                assert_eq!(container, "nailgun");
                assert!(waited >= Duration::from_millis(50));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }
}
