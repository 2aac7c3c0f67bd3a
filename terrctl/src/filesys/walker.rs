//! Source tree traversal

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::errors::DeployError;

/// A file found during traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    /// Path on disk
    pub path: PathBuf,

    /// Path inside the archive, `/` separated
    pub relative_path: String,
}

/// List the regular files under `root`, in a stable order
///
/// Hidden entries and `node_modules` directories are skipped along with
/// everything below them. Symlinks are not followed.
pub fn walk(root: &Path) -> Result<Vec<WalkedFile>, DeployError> {
    if root.parent().is_none() && root.has_root() {
        return Err(DeployError::Config(
            "The root directory cannot be uploaded".to_string(),
        ));
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry));

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).map_err(|e| {
            DeployError::Internal(format!("{}: {}", entry.path().display(), e))
        })?;
        let relative_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        debug!("File [{}] added to the archive", relative_path);
        files.push(WalkedFile {
            path: entry.path().to_path_buf(),
            relative_path,
        });
    }

    Ok(files)
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    let skipped = name.starts_with('.')
        || (entry.file_type().is_dir() && name.eq_ignore_ascii_case("node_modules"));
    if skipped {
        info!("Skipping [{}]", entry.path().display());
    }
    skipped
}
