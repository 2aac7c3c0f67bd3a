//! Remote deployment service contract

use async_trait::async_trait;

use crate::errors::DeployError;
use crate::models::instance::{Instance, StatusSnapshot};
use crate::models::upload::UploadRequest;

/// The three operations the orchestrator needs from the deployment service
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Upload a package and return the instance the service created for it
    async fn submit(&self, request: &UploadRequest) -> Result<Instance, DeployError>;

    /// Fetch the current build status of an instance
    async fn poll_status(&self, instance: &Instance) -> Result<StatusSnapshot, DeployError>;

    /// Probe the public health endpoint of an instance
    ///
    /// Returns `Ok(false)` for any answer other than a 200 with a body, and
    /// for connection failures. Only request timeouts are errors.
    async fn probe_health(&self, instance: &Instance) -> Result<bool, DeployError>;
}
