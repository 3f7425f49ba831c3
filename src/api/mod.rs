// dbrestoretool/src/api/mod.rs
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use tracing::debug;
use url::Url;

use crate::errors::{RestoreError, Result};

/// Authenticated session handle owned by the driver and borrowed for API calls.
#[derive(Clone)]
pub struct AuthContext {
    token: String,
}

impl AuthContext {
    pub fn new(token: impl Into<String>) -> Self {
        AuthContext { token: token.into() }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext").field("token", &"<redacted>").finish()
    }
}

/// Snapshot of one node from the live inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    pub fqdn: String,
    pub ip: String,
}

#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn list_nodes(&self, context: &AuthContext) -> Result<Vec<NodeRecord>>;
}

#[derive(Debug, Deserialize)]
struct RawNode {
    ip: String,
    meta: RawNodeMeta,
}

#[derive(Debug, Deserialize)]
struct RawNodeMeta {
    system: RawNodeSystem,
}

#[derive(Debug, Deserialize)]
struct RawNodeSystem {
    fqdn: String,
}

impl From<RawNode> for NodeRecord {
    fn from(raw: RawNode) -> Self {
        NodeRecord {
            fqdn: raw.meta.system.fqdn,
            ip: raw.ip,
        }
    }
}

fn parse_nodes(body: &str) -> Result<Vec<NodeRecord>> {
    let raw: Vec<RawNode> = serde_json::from_str(body)?;
    Ok(raw.into_iter().map(NodeRecord::from).collect())
}

/// Inventory client for the platform's REST API.
pub struct NailgunClient {
    http: reqwest::Client,
    nodes_url: Url,
}

impl NailgunClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let nodes_url = Url::parse(base_url)
            .and_then(|base| base.join("api/nodes/"))
            .map_err(|e| {
                RestoreError::Config(format!("Invalid API base URL '{}': {}", base_url, e))
            })?;
        Ok(NailgunClient {
            http: reqwest::Client::new(),
            nodes_url,
        })
    }
}

#[async_trait]
impl PlatformApi for NailgunClient {
    async fn list_nodes(&self, context: &AuthContext) -> Result<Vec<NodeRecord>> {
        debug!("Fetching node inventory from {}", self.nodes_url);
        let body = self
            .http
            .get(self.nodes_url.clone())
            .header("X-Auth-Token", context.token())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_nodes(&body)
    }
}
