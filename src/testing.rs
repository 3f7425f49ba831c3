//! Recording fakes shared by the unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::{AuthContext, NodeRecord, PlatformApi};
use crate::archive::ArchiveReader;
use crate::config::metadata::StaticMetadata;
use crate::config::{PatchSet, RemoteLogSettings};
use crate::container::{ContainerRuntime, PatchMode};
use crate::errors::{RestoreError, Result};
use crate::restore::{HostCommands, Platform};
use crate::utils::process::DumpStream;

/// Ordered log of every side effect the fakes observed.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| e.as_str() == event).count()
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.events().iter().position(|e| e.starts_with(prefix))
    }
}

fn injected_failure(event: &str) -> RestoreError {
    if event.starts_with("ready ") {
        RestoreError::ContainerNotReady {
            container: event.trim_start_matches("ready ").to_string(),
            waited: Duration::from_secs(300),
        }
    } else {
        RestoreError::CommandExecution {
            command: event.to_string(),
            status: "exit status: 1".to_string(),
            stdout: String::new(),
            stderr: "injected failure".to_string(),
        }
    }
}

pub struct FakeRuntime {
    journal: Journal,
    fail_on: Vec<String>,
    responses: Vec<(String, String)>,
    piped: Mutex<Vec<Vec<u8>>>,
}

impl FakeRuntime {
    pub fn new(journal: Journal) -> Self {
        FakeRuntime {
            journal,
            fail_on: Vec::new(),
            responses: Vec::new(),
            piped: Mutex::new(Vec::new()),
        }
    }

    /// Any event starting with `prefix` is recorded and then fails.
    pub fn failing_on(mut self, prefix: &str) -> Self {
        self.fail_on.push(prefix.to_string());
        self
    }

    /// `exec` events containing `needle` return `output`.
    pub fn responding(mut self, needle: &str, output: &str) -> Self {
        self.responses.push((needle.to_string(), output.to_string()));
        self
    }

    pub fn piped_inputs(&self) -> Vec<Vec<u8>> {
        self.piped.lock().unwrap().clone()
    }

    fn observe(&self, event: String) -> Result<()> {
        self.journal.record(event.clone());
        if self.fail_on.iter().any(|prefix| event.starts_with(prefix)) {
            return Err(injected_failure(&event));
        }
        Ok(())
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn stop_container(&self, name: &str) -> Result<()> {
        self.observe(format!("stop {}", name))
    }

    async fn start_container(&self, name: &str) -> Result<()> {
        self.observe(format!("start {}", name))
    }

    async fn wait_until_ready(&self, name: &str) -> Result<()> {
        self.observe(format!("ready {}", name))
    }

    async fn run_in_container(&self, name: &str, argv: &[String]) -> Result<String> {
        let event = format!("exec {} {}", name, argv.join(" "));
        self.observe(event.clone())?;
        Ok(self
            .responses
            .iter()
            .find(|(needle, _)| event.contains(needle.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_default())
    }

    async fn pipe_into_container(
        &self,
        name: &str,
        argv: &[String],
        mut input: DumpStream,
    ) -> Result<()> {
        let mut data = Vec::new();
        input.read_to_end(&mut data)?;
        self.piped.lock().unwrap().push(data);
        self.observe(format!("pipe {} {}", name, argv.join(" ")))
    }

    async fn apply_patches(&self, patch: &PatchSet, mode: PatchMode) -> Result<()> {
        let verb = match mode {
            PatchMode::Apply => "apply",
            PatchMode::Revert => "revert",
        };
        self.observe(format!("patch {} {}", verb, patch.container))
    }
}

pub struct FakeHost {
    journal: Journal,
    exit_code: i32,
    unavailable: bool,
}

impl FakeHost {
    pub fn new(journal: Journal) -> Self {
        FakeHost { journal, exit_code: 0, unavailable: false }
    }

    pub fn exiting_with(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }
}

#[async_trait]
impl HostCommands for FakeHost {
    async fn run(&self, argv: &[String]) -> Result<i32> {
        let event = format!("host {}", argv.join(" "));
        self.journal.record(event.clone());
        if self.unavailable {
            return Err(injected_failure(&event));
        }
        Ok(self.exit_code)
    }
}

pub struct FakeApi {
    journal: Journal,
    nodes: Option<Vec<NodeRecord>>,
}

impl FakeApi {
    pub fn new(journal: Journal, nodes: Vec<NodeRecord>) -> Self {
        FakeApi { journal, nodes: Some(nodes) }
    }

    pub fn failing(journal: Journal) -> Self {
        FakeApi { journal, nodes: None }
    }
}

#[async_trait]
impl PlatformApi for FakeApi {
    async fn list_nodes(&self, context: &AuthContext) -> Result<Vec<NodeRecord>> {
        self.journal.record(format!("api nodes token={}", context.token()));
        self.nodes
            .clone()
            .ok_or_else(|| RestoreError::LogLinkRepair("node listing unavailable".to_string()))
    }
}

#[derive(Default)]
pub struct FakeArchive {
    members: HashMap<String, Vec<u8>>,
}

impl FakeArchive {
    pub fn with(mut self, path: &str, data: &[u8]) -> Self {
        self.members.insert(path.to_string(), data.to_vec());
        self
    }
}

impl ArchiveReader for FakeArchive {
    fn extract_file(&self, path: &str) -> Result<DumpStream> {
        self.members
            .get(path)
            .map(|data| Box::new(Cursor::new(data.clone())) as DumpStream)
            .ok_or_else(|| RestoreError::ArchiveRead {
                path: path.to_string(),
                reason: "no such member".to_string(),
            })
    }
}

pub fn node(fqdn: &str, ip: &str) -> NodeRecord {
    NodeRecord { fqdn: fqdn.to_string(), ip: ip.to_string() }
}

/// Owns one set of fakes sharing a journal; `platform()` lends them out.
pub struct Fixture {
    pub journal: Journal,
    pub runtime: FakeRuntime,
    pub host: FakeHost,
    pub api: FakeApi,
    pub archive: FakeArchive,
    pub metadata: StaticMetadata,
    pub remote_logs: RemoteLogSettings,
}

impl Fixture {
    pub fn new(archive: FakeArchive) -> Self {
        let journal = Journal::default();
        Fixture::with_runtime(journal.clone(), FakeRuntime::new(journal), archive)
    }

    pub fn with_runtime(journal: Journal, runtime: FakeRuntime, archive: FakeArchive) -> Self {
        Fixture {
            host: FakeHost::new(journal.clone()),
            api: FakeApi::new(journal.clone(), Vec::new()),
            journal,
            runtime,
            archive,
            metadata: StaticMetadata {
                dns_domain: Some("test.domain.local".to_string()),
            },
            remote_logs: RemoteLogSettings::default(),
        }
    }

    pub fn platform(&self) -> Platform<'_> {
        Platform {
            archive: &self.archive,
            runtime: &self.runtime,
            host: &self.host,
            api: &self.api,
            metadata: &self.metadata,
            remote_logs: &self.remote_logs,
        }
    }
}
