use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("cannot create folder {path}")]
    CreateFolder {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot upload {path}")]
    Upload {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0} has no file name")]
    NoFileName(PathBuf),
}

/// Identifier of a folder in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderId(pub String);

/// Where an uploaded file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub id: String,
    pub name: String,
}

/// Sink for finished artifacts.
pub trait RemoteStorage {
    /// Create a folder and return its id.
    fn create_folder(&mut self, name: &str) -> Result<FolderId, StorageError>;

    /// Upload a local file, optionally into a folder.
    fn upload_file(
        &mut self,
        path: &Path,
        parent: Option<&FolderId>,
    ) -> Result<UploadReceipt, StorageError>;
}

// ---------------------------------------------------------------------------
// Local directory implementation
// ---------------------------------------------------------------------------

/// Stores artifacts by copying them below a root directory.
///
/// Folder ids are paths relative to the root.
#[derive(Debug, Clone)]
pub struct LocalFolderStorage {
    root: PathBuf,
}

impl LocalFolderStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalFolderStorage { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl RemoteStorage for LocalFolderStorage {
    fn create_folder(&mut self, name: &str) -> Result<FolderId, StorageError> {
        let path = self.root.join(name);
        std::fs::create_dir_all(&path).map_err(|source| StorageError::CreateFolder {
            path: path.clone(),
            source,
        })?;
        log::debug!("Created folder '{name}' at {}", path.display());
        Ok(FolderId(name.to_string()))
    }

    fn upload_file(
        &mut self,
        path: &Path,
        parent: Option<&FolderId>,
    ) -> Result<UploadReceipt, StorageError> {
        let name = path
            .file_name()
            .ok_or_else(|| StorageError::NoFileName(path.to_path_buf()))?
            .to_string_lossy()
            .into_owned();
        let dir = match parent {
            Some(FolderId(folder)) => self.root.join(folder),
            None => self.root.clone(),
        };
        let target = dir.join(&name);
        log::debug!("Uploading {} to {}", path.display(), target.display());
        std::fs::copy(path, &target).map_err(|source| StorageError::Upload {
            path: path.to_path_buf(),
            source,
        })?;

        let id = match parent {
            Some(FolderId(folder)) => format!("{folder}/{name}"),
            None => name.clone(),
        };
        Ok(UploadReceipt { id, name })
    }
}

// ---------------------------------------------------------------------------
// Upload step
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadSummary {
    pub folder: Option<FolderId>,
    pub uploaded: Vec<UploadReceipt>,
    pub failed: Vec<PathBuf>,
}

/// Create `folder_name` and upload every file in `paths` into it.
///
/// Failures are logged and counted; local files are never touched. If the
/// folder cannot be created, files go to the store's top level instead.
pub fn upload_artifacts(
    storage: &mut dyn RemoteStorage,
    folder_name: &str,
    paths: &[PathBuf],
) -> UploadSummary {
    let mut summary = UploadSummary::default();

    match storage.create_folder(folder_name) {
        Ok(id) => summary.folder = Some(id),
        Err(e) => log::error!("Upload folder '{folder_name}' unavailable: {e:#}"),
    }

    for path in paths {
        match storage.upload_file(path, summary.folder.as_ref()) {
            Ok(receipt) => {
                log::info!("Uploaded {}", path.display());
                summary.uploaded.push(receipt);
            }
            Err(e) => {
                log::error!("Upload of {} failed: {e:#}", path.display());
                summary.failed.push(path.clone());
            }
        }
    }
    summary
}
