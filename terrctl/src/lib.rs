//! terrctl library
//!
//! Packages a source tree, submits it to the build-and-run service, and waits
//! for the resulting instance to be deployed and healthy, retrying whole
//! attempts where a retry can help.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
pub mod storage;
pub mod utils;
