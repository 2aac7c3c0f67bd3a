//! Filesystem access: settings files, source tree walking, archives

pub mod archive;
pub mod file;
pub mod walker;
