//! Finite State Machine for the deployment wait

use crate::errors::DeployError;
use crate::models::instance::StatusSnapshot;

/// Why a wait ended in failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The status request could not be sent or answered
    Transport,

    /// The status response could not be decoded
    Protocol,

    /// The service reported the deployment as unsuccessful
    Service(String),

    /// The wait exceeded its bound
    Timeout,

    /// The wait was cancelled
    Cancelled,
}

impl FailureReason {
    /// Classify an error raised while waiting
    pub fn of(err: &DeployError) -> Self {
        match err {
            DeployError::Service(message) => FailureReason::Service(message.clone()),
            DeployError::Timeout { .. } => FailureReason::Timeout,
            DeployError::Cancelled => FailureReason::Cancelled,
            DeployError::Protocol(_) => FailureReason::Protocol,
            _ => FailureReason::Transport,
        }
    }
}

/// Deployment wait state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WaitState {
    /// Still polling the service
    #[default]
    Polling,

    /// The service reported a finished, successful deployment
    Succeeded,

    /// The wait failed
    Failed(FailureReason),
}

/// Deployment wait event
#[derive(Debug, Clone)]
pub enum WaitEvent {
    /// A status poll returned a snapshot
    Status(StatusSnapshot),

    /// The deployment timeout elapsed
    Timeout,
}

/// Effect of one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Same snapshot as last time, nothing to do
    Unchanged,

    /// New snapshot, deployment still in progress
    Progress(String),

    /// Deployment finished
    Succeeded,

    /// Deployment failed
    Failed(FailureReason),
}

/// Deployment wait FSM
///
/// Only a snapshot that differs from the previously observed one can move the
/// machine. The first snapshot is compared against the default (empty) one.
#[derive(Debug, Clone, Default)]
pub struct DeploymentFsm {
    state: WaitState,
    last_snapshot: StatusSnapshot,
    changes: u32,
}

impl DeploymentFsm {
    /// Create a new FSM in polling state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current state
    pub fn state(&self) -> &WaitState {
        &self.state
    }

    /// Last snapshot that changed the observed status
    pub fn last_snapshot(&self) -> &StatusSnapshot {
        &self.last_snapshot
    }

    /// Number of distinct snapshots observed
    pub fn changes(&self) -> u32 {
        self.changes
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: WaitEvent) -> Result<Transition, String> {
        if self.state != WaitState::Polling {
            return Err(format!("Invalid transition: {:?} -> {:?}", self.state, event));
        }

        let transition = match event {
            WaitEvent::Status(snapshot) => {
                if snapshot == self.last_snapshot {
                    return Ok(Transition::Unchanged);
                }
                self.last_snapshot = snapshot;
                self.changes += 1;

                // `done` without `success` is a failure like any other
                if !self.last_snapshot.success {
                    Transition::Failed(FailureReason::Service(self.last_snapshot.message.clone()))
                } else if self.last_snapshot.done {
                    Transition::Succeeded
                } else {
                    Transition::Progress(self.last_snapshot.message.clone())
                }
            }
            WaitEvent::Timeout => Transition::Failed(FailureReason::Timeout),
        };

        match &transition {
            Transition::Succeeded => self.state = WaitState::Succeeded,
            Transition::Failed(reason) => self.state = WaitState::Failed(reason.clone()),
            Transition::Unchanged | Transition::Progress(_) => {}
        }

        Ok(transition)
    }

    /// Whether the wait has ended
    pub fn is_terminal(&self) -> bool {
        self.state != WaitState::Polling
    }
}
