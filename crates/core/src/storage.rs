//! Object storage seam used by the classification flow.
//!
//! [`LocalObjectStorage`] adapts the synchronous filesystem [`ImageStore`] by running each
//! operation on the blocking thread pool.

use async_trait::async_trait;
use cutis_files::{FilesError, ImageId, ImageStore, StoredImage};
use std::sync::Arc;

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        folder: &str,
        original_filename: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredImage, FilesError>;

    /// Copy an existing image into `folder`; the source stays in place.
    async fn promote(
        &self,
        id: &ImageId,
        folder: &str,
        original_filename: &str,
    ) -> Result<StoredImage, FilesError>;

    /// Returns `false` if nothing was stored under `id`.
    async fn delete(&self, id: &ImageId) -> Result<bool, FilesError>;
}

#[derive(Clone)]
pub struct LocalObjectStorage {
    store: Arc<ImageStore>,
}

impl LocalObjectStorage {
    pub fn new(store: Arc<ImageStore>) -> Self {
        Self { store }
    }

    async fn run_blocking<T, F>(&self, op: F) -> Result<T, FilesError>
    where
        T: Send + 'static,
        F: FnOnce(&ImageStore) -> Result<T, FilesError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| FilesError::Io(std::io::Error::other(e.to_string())))?
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn upload(
        &self,
        folder: &str,
        original_filename: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredImage, FilesError> {
        let folder = folder.to_string();
        let name = original_filename.to_string();
        self.run_blocking(move |store| store.upload(&folder, &name, &bytes))
            .await
    }

    async fn promote(
        &self,
        id: &ImageId,
        folder: &str,
        original_filename: &str,
    ) -> Result<StoredImage, FilesError> {
        let id = id.clone();
        let folder = folder.to_string();
        let name = original_filename.to_string();
        self.run_blocking(move |store| store.promote(&id, &folder, &name))
            .await
    }

    async fn delete(&self, id: &ImageId) -> Result<bool, FilesError> {
        let id = id.clone();
        self.run_blocking(move |store| store.delete(&id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutis_files::{UrlSigner, TEMP_FOLDER};
    use tempfile::TempDir;

    const PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52,
    ];

    fn storage(temp: &TempDir) -> LocalObjectStorage {
        let signer = UrlSigner::new(b"key".to_vec(), "http://localhost:3002", 60).unwrap();
        LocalObjectStorage::new(Arc::new(ImageStore::new(temp.path(), signer).unwrap()))
    }

    #[tokio::test]
    async fn test_upload_promote_delete() {
        let temp = TempDir::new().unwrap();
        let storage = storage(&temp);

        let tmp = storage
            .upload(TEMP_FOLDER, "rash.png", PNG.to_vec())
            .await
            .unwrap();
        let permanent = storage
            .promote(&tmp.id, "Skins/Acne", "rash.png")
            .await
            .unwrap();

        assert!(permanent.id.as_str().starts_with("Skins/Acne/"));
        assert!(storage.delete(&tmp.id).await.unwrap());
        assert!(!storage.delete(&tmp.id).await.unwrap());
        assert!(temp.path().join(permanent.id.as_str()).is_file());
    }

    #[tokio::test]
    async fn test_upload_rejects_non_images() {
        let temp = TempDir::new().unwrap();
        let result = storage(&temp)
            .upload(TEMP_FOLDER, "notes.txt", b"hello".to_vec())
            .await;
        assert!(matches!(result, Err(FilesError::UnsupportedFormat(_))));
    }
}
