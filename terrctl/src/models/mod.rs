//! Data models exchanged with the deployment service

pub mod instance;
pub mod upload;
