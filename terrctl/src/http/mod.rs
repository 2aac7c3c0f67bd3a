//! HTTP access to the deployment service

pub mod client;
pub mod instances;
