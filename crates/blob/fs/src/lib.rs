//! Filesystem-backed [`BlobStore`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use depot_blob::{BlobError, BlobStore};
use depot_core::BlobLocator;

/// Stores each blob as a single file named by its locator under a root
/// directory.
///
/// Writes use create-new semantics so a locator can only ever be written
/// once; a second write fails rather than clobbering stored content.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::Io`] if the directory cannot be created.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, BlobError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// The root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, locator: &BlobLocator) -> Result<PathBuf, BlobError> {
        let key = locator.as_str();
        // The storage service derives sanitized locators, but never trust
        // a key that could escape the root.
        if key.is_empty()
            || key
                .chars()
                .any(|c| std::path::is_separator(c) || c == '\0')
            || key == "."
            || key == ".."
        {
            return Err(BlobError::InvalidLocator(key.to_owned()));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, locator: &BlobLocator, data: Bytes) -> Result<(), BlobError> {
        let path = self.path_for(locator)?;
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(BlobError::AlreadyExists(locator.to_string()));
            }
            Err(e) => return Err(BlobError::Io(e)),
        };

        file.write_all(&data).await?;
        file.flush().await?;
        Ok(())
    }

    async fn get(&self, locator: &BlobLocator) -> Result<Option<Bytes>, BlobError> {
        let path = self.path_for(locator)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BlobError::Io(e)),
        }
    }
}
