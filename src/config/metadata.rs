use crate::errors::{RestoreError, Result};

/// Deployment facts the restore reads but does not own.
pub trait DeploymentMetadata: Send + Sync {
    /// DNS domain managed by the platform, e.g. `test.domain.local`.
    fn dns_domain(&self) -> Result<String>;
}

/// Metadata resolved up front from `config.json` / the environment.
#[derive(Debug, Clone, Default)]
pub struct StaticMetadata {
    pub dns_domain: Option<String>,
}

impl DeploymentMetadata for StaticMetadata {
    fn dns_domain(&self) -> Result<String> {
        self.dns_domain
            .clone()
            .filter(|domain| !domain.trim().is_empty())
            .ok_or_else(|| {
                RestoreError::Config(
                    "DNS_DOMAIN is not set (config.json dns_domain or environment)".to_string(),
                )
            })
    }
}
