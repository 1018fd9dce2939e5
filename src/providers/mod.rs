pub mod github;

use async_trait::async_trait;
use thiserror::Error;

/// A repository created on the hosting service.
#[derive(Debug, Clone)]
pub struct RemoteRepository {
    pub name: String,
    pub clone_url: String,
    pub private: bool,
}

/// Why a hosting-service call failed, where the workflow needs to tell the
/// cases apart.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Repository '{0}' already exists on this account")]
    AlreadyExists(String),
    #[error("Repository name was rejected: {0}")]
    InvalidName(String),
    #[error("Authentication failed. Check your access token.")]
    AuthFailed,
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Operations the migration needs from the hosting service.
///
/// GitHub is the only production implementation; the workflow tests drive
/// the pipeline through a scripted one.
#[async_trait]
pub trait RemoteHost: Send + Sync {
    /// Live credential check. Auth and network faults both come back as
    /// `false`; this never propagates an error.
    async fn validate_credential(&self) -> bool;

    /// Create `name` for the authenticated account, without auto-initializing
    /// any content on the service side.
    async fn create_repository(
        &self,
        name: &str,
        private: bool,
        description: Option<&str>,
    ) -> Result<RemoteRepository, HostError>;

    /// Whether `name` already exists for the authenticated account. Only a
    /// definite "found" answer is `true`; ambiguous failures are not.
    async fn repository_exists(&self, name: &str) -> bool;

    fn name(&self) -> &str;
}
