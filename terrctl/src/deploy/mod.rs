//! Deployment module

pub mod clock;
pub mod fsm;
pub mod orchestrator;
pub mod package;
pub mod remote;
pub mod waiter;
