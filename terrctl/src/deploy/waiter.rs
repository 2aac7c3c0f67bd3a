//! Deployment and health waits

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::deploy::clock::{pause, Clock, Stopwatch};
use crate::deploy::fsm::{DeploymentFsm, FailureReason, Transition, WaitEvent};
use crate::deploy::remote::RemoteService;
use crate::errors::{DeployError, WaitPhase};
use crate::models::instance::Instance;

/// Polls an instance until it is deployed, then until it is healthy
pub struct Waiter {
    remote: Arc<dyn RemoteService>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
}

impl Waiter {
    pub fn new(
        remote: Arc<dyn RemoteService>,
        clock: Arc<dyn Clock>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            remote,
            clock,
            poll_interval,
        }
    }

    /// Wait until the service reports the deployment as done
    ///
    /// Status poll errors and service-reported failures end the wait at once.
    /// Only the timeout is checked between polls.
    pub async fn wait_for_deployment(
        &self,
        instance: &Instance,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), DeployError> {
        let mut fsm = DeploymentFsm::new();
        let mut stopwatch = Stopwatch::start(self.clock.now());

        loop {
            let snapshot = match cancellable(cancel, self.remote.poll_status(instance)).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    debug!(reason = ?FailureReason::of(&e), "Status poll failed");
                    return Err(e);
                }
            };

            match fsm.process(WaitEvent::Status(snapshot)).map_err(DeployError::Internal)? {
                Transition::Unchanged => {}
                Transition::Progress(message) => info!("{}", message),
                Transition::Succeeded => {
                    info!("{}", fsm.last_snapshot().message);
                    return Ok(());
                }
                Transition::Failed(FailureReason::Service(message)) => {
                    return Err(DeployError::Service(message));
                }
                Transition::Failed(reason) => {
                    return Err(DeployError::Internal(format!(
                        "unexpected deployment failure: {:?}",
                        reason
                    )));
                }
            }

            pause(self.clock.as_ref(), self.poll_interval, cancel).await?;

            if stopwatch.elapsed(self.clock.now()) >= timeout {
                fsm.process(WaitEvent::Timeout).map_err(DeployError::Internal)?;
                return Err(DeployError::Timeout {
                    phase: WaitPhase::Deployment,
                    limit: timeout,
                });
            }
        }
    }

    /// Wait until the instance answers its health check
    pub async fn wait_for_health(
        &self,
        instance: &Instance,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), DeployError> {
        let mut stopwatch = Stopwatch::start(self.clock.now());

        loop {
            if cancellable(cancel, self.remote.probe_health(instance)).await? {
                return Ok(());
            }
            debug!("Instance is not reachable yet");

            pause(self.clock.as_ref(), self.poll_interval, cancel).await?;

            if stopwatch.elapsed(self.clock.now()) >= timeout {
                return Err(DeployError::Timeout {
                    phase: WaitPhase::Health,
                    limit: timeout,
                });
            }
        }
    }
}

/// Run a remote call unless cancelled first
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, call: F) -> Result<T, DeployError>
where
    F: Future<Output = Result<T, DeployError>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(DeployError::Cancelled),
        result = call => result,
    }
}
