//! Application options and entry point

pub mod options;
pub mod run;
