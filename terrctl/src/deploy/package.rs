//! Packaging a source tree into an upload request

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use tracing::info;

use crate::errors::DeployError;
use crate::filesys::archive::create_tar;
use crate::filesys::walker::{walk, WalkedFile};
use crate::models::upload::{Language, UploadRequest};

/// Produces a fresh upload request for every attempt
#[async_trait]
pub trait Packager: Send + Sync {
    async fn package(&self) -> Result<UploadRequest, DeployError>;
}

/// Packages a directory from disk
#[derive(Debug, Clone)]
pub struct SourcePackager {
    root: PathBuf,
    language: Language,
}

impl SourcePackager {
    pub fn new(root: impl Into<PathBuf>, language: Language) -> Self {
        Self {
            root: root.into(),
            language,
        }
    }
}

#[async_trait]
impl Packager for SourcePackager {
    async fn package(&self) -> Result<UploadRequest, DeployError> {
        info!("Preparing upload of directory [{}]", self.root.display());

        let root = self.root.clone();
        let requested = self.language;
        tokio::task::spawn_blocking(move || package_sync(&root, requested))
            .await
            .map_err(|e| DeployError::Internal(e.to_string()))?
    }
}

fn package_sync(root: &Path, requested: Language) -> Result<UploadRequest, DeployError> {
    let files = walk(root)?;
    let lang = match requested {
        Language::Auto => {
            let guessed = guess_language(&files)?;
            info!("Guessed programming language: {}", guessed);
            guessed
        }
        lang => lang,
    };

    let tar = create_tar(&files)?;
    Ok(UploadRequest {
        lang,
        options: Vec::new(),
        tar: STANDARD_NO_PAD.encode(tar),
    })
}

/// Guess the language from the first file with a known extension
pub fn guess_language(files: &[WalkedFile]) -> Result<Language, DeployError> {
    files
        .iter()
        .filter_map(|file| file.path.extension())
        .find_map(|ext| Language::from_extension(&ext.to_string_lossy()))
        .ok_or_else(|| {
            DeployError::Language("Unable to detect the programming language".to_string())
        })
}
