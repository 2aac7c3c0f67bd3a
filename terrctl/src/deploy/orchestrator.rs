//! Deploy orchestration: submit, wait for deployment, wait for health, retry

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::deploy::clock::Clock;
use crate::deploy::package::Packager;
use crate::deploy::remote::RemoteService;
use crate::deploy::waiter::{cancellable, Waiter};
use crate::errors::DeployError;
use crate::models::instance::Instance;

/// Retry and timeout policy of a deployment
#[derive(Debug, Clone)]
pub struct DeployPolicy {
    pub max_attempts: u32,
    pub deploy_timeout: Duration,
    pub health_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for DeployPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            deploy_timeout: Duration::from_secs(90),
            health_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Turns submit + deployment wait + health wait into one deploy-or-fail outcome
pub struct Deployer {
    remote: Arc<dyn RemoteService>,
    waiter: Waiter,
    policy: DeployPolicy,
}

impl Deployer {
    pub fn new(remote: Arc<dyn RemoteService>, clock: Arc<dyn Clock>, policy: DeployPolicy) -> Self {
        let waiter = Waiter::new(remote.clone(), clock, policy.poll_interval);
        Self {
            remote,
            waiter,
            policy,
        }
    }

    /// Deploy a fresh package, retrying up to `max_attempts` times
    ///
    /// Submission failures, deployment timeouts and any health failure start
    /// a new attempt with a new package. Errors while waiting for the
    /// deployment (other than timeouts) abort at once, as do cancellation and
    /// an undetectable language.
    pub async fn deploy(
        &self,
        packager: &dyn Packager,
        cancel: &CancellationToken,
    ) -> Result<Instance, DeployError> {
        let max_attempts = self.policy.max_attempts;
        let mut last_error =
            DeployError::Config("max deploy attempts must be at least 1".to_string());

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                info!("Retrying (attempt {} out of {})", attempt, max_attempts);
            }

            let instance = match self.submit(packager, cancel).await {
                Ok(instance) => instance,
                Err(e @ (DeployError::Cancelled | DeployError::Language(_))) => return Err(e),
                Err(e) => {
                    warn!("{}", e);
                    last_error = e;
                    continue;
                }
            };

            match self
                .waiter
                .wait_for_deployment(&instance, self.policy.deploy_timeout, cancel)
                .await
            {
                Ok(()) => info!("Instance is deployed"),
                Err(e) if e.is_timeout() => {
                    warn!("{}", e);
                    last_error = e;
                    continue;
                }
                Err(e) => return Err(e),
            }

            match self
                .waiter
                .wait_for_health(&instance, self.policy.health_timeout, cancel)
                .await
            {
                Ok(()) => {
                    info!("Instance is running and reachable");
                    return Ok(instance);
                }
                Err(DeployError::Cancelled) => return Err(DeployError::Cancelled),
                Err(e) => {
                    warn!("{}", e);
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    async fn submit(
        &self,
        packager: &dyn Packager,
        cancel: &CancellationToken,
    ) -> Result<Instance, DeployError> {
        let request = cancellable(cancel, packager.package()).await?;
        info!("Upload in progress...");
        let instance = cancellable(cancel, self.remote.submit(&request)).await?;
        info!(
            instance = instance.id(),
            "Upload done, compilation in progress..."
        );
        Ok(instance)
    }
}
