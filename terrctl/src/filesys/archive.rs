//! Tar archive construction

use std::fs;
use std::time::UNIX_EPOCH;

use tar::{Builder, Header};
use tracing::debug;

use crate::errors::DeployError;
use crate::filesys::walker::WalkedFile;

/// Mode given to every archived file
const FILE_MODE: u32 = 0o600;

/// Build an in-memory tar archive holding `files` under their relative paths
pub fn create_tar(files: &[WalkedFile]) -> Result<Vec<u8>, DeployError> {
    let mut builder = Builder::new(Vec::new());

    for file in files {
        let metadata = fs::metadata(&file.path)?;
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let mut header = Header::new_gnu();
        header.set_size(metadata.len());
        header.set_mode(FILE_MODE);
        header.set_mtime(mtime);
        header.set_entry_type(tar::EntryType::Regular);

        let reader = fs::File::open(&file.path)?;
        builder.append_data(&mut header, &file.relative_path, reader)?;
    }

    let data = builder.into_inner()?;
    debug!(files = files.len(), size = data.len(), "created tar archive");
    Ok(data)
}
