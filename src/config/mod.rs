// dbrestoretool/src/config/mod.rs
pub mod metadata;

use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{RestoreError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_DATABASES: &[&str] = &["nailgun", "keystone"];
pub const DEFAULT_REMOTE_LOG_ROOT: &str = "/var/log/docker-logs/remote/";

// Structs for deserializing config.json
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonContainerConfig {
    pub docker_binary: Option<PathBuf>,
    pub name_prefix: Option<String>,
    pub postgres_container: Option<String>,
    pub ready_timeout_secs: Option<u64>,
    pub ready_poll_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonRemoteLogConfig {
    pub root: Option<PathBuf>,
    pub collector_container: Option<String>,
    pub collector_service: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonApiConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonPatchSet {
    pub container: String,
    pub prefix: String,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJsonConfig {
    pub archive_file_path_for_restore: Option<String>,
    pub database_list: Option<Vec<String>>,
    pub container: Option<JsonContainerConfig>,
    pub remote_logs: Option<JsonRemoteLogConfig>,
    pub api: Option<JsonApiConfig>,
    pub dns_domain: Option<String>,
    pub patches: Option<HashMap<String, Vec<JsonPatchSet>>>,
}

// Application's internal configuration structs
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSettings {
    pub docker_binary: Option<PathBuf>,
    pub name_prefix: String,
    pub postgres_container: String,
    pub ready_timeout: Duration,
    pub ready_poll_interval: Duration,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        ContainerSettings {
            docker_binary: None,
            name_prefix: String::new(),
            postgres_container: "postgres".to_string(),
            ready_timeout: Duration::from_secs(300),
            ready_poll_interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteLogSettings {
    pub root: PathBuf,
    pub collector_container: String,
    pub collector_service: String,
}

impl Default for RemoteLogSettings {
    fn default() -> Self {
        RemoteLogSettings {
            root: PathBuf::from(DEFAULT_REMOTE_LOG_ROOT),
            collector_container: "rsyslog".to_string(),
            collector_service: "rsyslog".to_string(),
        }
    }
}

/// A temporary, reversible set of patch files applied inside one container.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchSet {
    pub container: String,
    pub prefix: String,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub archive_path: PathBuf,
    pub databases: Vec<String>,
    pub container: ContainerSettings,
    pub remote_logs: RemoteLogSettings,
    pub api_base_url: String,
    pub dns_domain: Option<String>,
    pub patches: HashMap<String, Vec<PatchSet>>,
}

impl AppConfig {
    /// Resolves the config file location, honouring `DBRESTORE_CONFIG`.
    pub fn default_path() -> PathBuf {
        env::var("DBRESTORE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn load_from_json(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            RestoreError::Config(format!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            ))
        })?;
        let raw_json_config: RawJsonConfig = serde_json::from_str(&config_content).map_err(|e| {
            RestoreError::Config(format!(
                "Failed to parse JSON from config file at {}: {}",
                config_path.display(),
                e
            ))
        })?;

        let mut config = Self::from_raw(
            raw_json_config,
            env::var("ARCHIVE_FILE_PATH").ok(),
            env::var("DNS_DOMAIN").ok(),
        )?;
        if let Some(config_dir) = config_path.parent() {
            config.rebase_patch_files(config_dir);
        }
        Ok(config)
    }

    /// Relative patch file paths are taken relative to `base` (the directory
    /// holding config.json), not the working directory.
    pub fn rebase_patch_files(&mut self, base: &Path) {
        for set in self.patches.values_mut().flatten() {
            for file in &mut set.files {
                if file.is_relative() {
                    *file = base.join(&*file);
                }
            }
        }
    }

    /// Builds the typed configuration. Environment values win over the file.
    pub fn from_raw(
        raw: RawJsonConfig,
        archive_override: Option<String>,
        dns_domain_override: Option<String>,
    ) -> Result<Self> {
        let archive_source = archive_override
            .filter(|s| !s.trim().is_empty())
            .or(raw.archive_file_path_for_restore)
            .ok_or_else(|| {
                RestoreError::Config(
                    "archive_file_path_for_restore must be set in config.json or ARCHIVE_FILE_PATH"
                        .to_string(),
                )
            })?;
        if archive_source.trim().is_empty() {
            return Err(RestoreError::Config(
                "archive_file_path_for_restore cannot be empty in config.json.".to_string(),
            ));
        }

        let databases = match raw.database_list {
            Some(list) => {
                if list.iter().any(|db| db.trim().is_empty()) {
                    return Err(RestoreError::Config(
                        "database_list must not contain empty database names".to_string(),
                    ));
                }
                list
            }
            None => DEFAULT_DATABASES.iter().map(|db| db.to_string()).collect(),
        };

        let raw_container = raw.container.unwrap_or_default();
        let defaults = ContainerSettings::default();
        let container = ContainerSettings {
            docker_binary: raw_container.docker_binary,
            name_prefix: raw_container.name_prefix.unwrap_or(defaults.name_prefix),
            postgres_container: raw_container
                .postgres_container
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.postgres_container),
            ready_timeout: raw_container
                .ready_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.ready_timeout),
            ready_poll_interval: raw_container
                .ready_poll_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.ready_poll_interval),
        };
        if container.ready_poll_interval.is_zero() {
            return Err(RestoreError::Config(
                "container.ready_poll_interval_secs must be greater than zero".to_string(),
            ));
        }

        let raw_logs = raw.remote_logs.unwrap_or_default();
        let log_defaults = RemoteLogSettings::default();
        let remote_logs = RemoteLogSettings {
            root: raw_logs.root.unwrap_or(log_defaults.root),
            collector_container: raw_logs
                .collector_container
                .unwrap_or(log_defaults.collector_container),
            collector_service: raw_logs
                .collector_service
                .unwrap_or(log_defaults.collector_service),
        };

        let api_base_url = raw
            .api
            .and_then(|api| api.base_url)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                RestoreError::Config("api.base_url must be set in config.json".to_string())
            })?;
        url::Url::parse(&api_base_url).map_err(|e| {
            RestoreError::Config(format!("Invalid api.base_url '{}': {}", api_base_url, e))
        })?;

        let patches = raw
            .patches
            .unwrap_or_default()
            .into_iter()
            .map(|(db, sets)| {
                let sets = sets
                    .into_iter()
                    .map(|set| PatchSet {
                        container: set.container,
                        prefix: set.prefix,
                        files: set.files,
                    })
                    .collect();
                (db, sets)
            })
            .collect();

        Ok(AppConfig {
            archive_path: PathBuf::from(archive_source),
            databases,
            container,
            remote_logs,
            api_base_url,
            dns_domain: dns_domain_override
                .filter(|s| !s.is_empty())
                .or(raw.dns_domain),
            patches,
        })
    }

    /// Patch sets registered for `db`, in application order.
    pub fn patches_for(&self, db: &str) -> Vec<PatchSet> {
        self.patches.get(db).cloned().unwrap_or_default()
    }
}
