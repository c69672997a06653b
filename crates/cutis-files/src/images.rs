//! Filesystem image store implementation
//!
//! [`ImageStore`] is the object-storage gateway used by the classification flow: it accepts
//! raw upload bytes, writes them under a folder, copies them into their permanent folder
//! once a classification is known, and deletes temporary copies.
//!
//! # Image ids
//!
//! An image id is the path of the stored file relative to the store root, e.g.
//! `Skins/Acne/1717171717171-my_photo.jpg`. Ids are validated on every access so a caller
//! can never escape the root with `..` segments or absolute paths.
//!
//! # Implementation Notes
//!
//! - All operations are synchronous; async callers should move them onto a blocking thread
//! - A public id collision (two uploads of the same name within one millisecond) is resolved
//!   by appending a numeric suffix rather than overwriting

use crate::constants::{ACCEPTED_MEDIA_TYPES, MAX_FILENAME_LEN, MAX_NAME_ATTEMPTS};
use crate::{FilesError, FilesResult, UrlSigner};
use chrono::{DateTime, Utc};
use cutis_types::NonEmptyText;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

/// Relative location of a stored image inside the store root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    /// Validates an externally supplied id.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidPath`] for empty ids, absolute paths, `.`/`..` segments,
    /// backslashes or empty segments.
    pub fn parse(input: &str) -> FilesResult<Self> {
        if input.is_empty() || input.contains('\\') || input.starts_with('/') {
            return Err(FilesError::InvalidPath(format!("invalid image id: {}", input)));
        }
        for segment in input.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(FilesError::InvalidPath(format!("invalid image id: {}", input)));
            }
        }
        let path = Path::new(input);
        if !path.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(FilesError::InvalidPath(format!("invalid image id: {}", input)));
        }
        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Folder portion of the id (everything before the final segment).
    pub fn folder(&self) -> &str {
        self.0.rsplit_once('/').map(|(folder, _)| folder).unwrap_or("")
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata for a stored image.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct StoredImage {
    pub id: ImageId,

    /// Signed, expiring URL for the image
    pub url: String,

    /// Detected media type (one of [`ACCEPTED_MEDIA_TYPES`])
    pub media_type: NonEmptyText,

    pub size_bytes: u64,

    /// Hexadecimal SHA-256 digest of the content
    pub sha256: String,

    pub stored_at: DateTime<Utc>,
}

/// Replaces whitespace with `_` and any other character outside `[A-Za-z0-9._-]` with `_`.
///
/// Leading dots are stripped so a segment can never be `.`/`..` or a hidden file.
pub fn sanitise_segment(input: &str) -> String {
    let mapped: String = input
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    mapped.trim_start_matches('.').to_string()
}

fn sanitise_folder(folder: &str) -> FilesResult<String> {
    let segments: Vec<String> = folder
        .split('/')
        .filter(|s| !s.trim().is_empty())
        .map(sanitise_segment)
        .collect();
    if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
        return Err(FilesError::InvalidPath(format!("invalid folder: {}", folder)));
    }
    Ok(segments.join("/"))
}

fn sanitise_filename(original: &str) -> String {
    let name = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    let mut cleaned = sanitise_segment(name);
    if cleaned.is_empty() {
        cleaned = "image".to_string();
    }
    if cleaned.len() > MAX_FILENAME_LEN {
        // Keep the tail so the extension survives truncation.
        cleaned = cleaned[cleaned.len() - MAX_FILENAME_LEN..].to_string();
    }
    cleaned
}

/// Detects the media type of `bytes` and checks it is an accepted image format.
///
/// # Errors
///
/// Returns [`FilesError::UnsupportedFormat`] with the detected type (if any).
pub(crate) fn detect_image_type(bytes: &[u8]) -> FilesResult<&'static str> {
    match infer::get(bytes) {
        Some(kind) if ACCEPTED_MEDIA_TYPES.contains(&kind.mime_type()) => Ok(kind.mime_type()),
        Some(kind) => Err(FilesError::UnsupportedFormat(Some(
            kind.mime_type().to_string(),
        ))),
        None => Err(FilesError::UnsupportedFormat(None)),
    }
}

/// Object-storage gateway backed by a directory.
#[derive(Debug)]
pub struct ImageStore {
    /// Canonicalised root directory
    root_directory: PathBuf,

    signer: UrlSigner,
}

impl ImageStore {
    /// Creates the store, creating `root_directory` if needed.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidRootDirectory`] if the directory cannot be created, is
    /// not a directory or cannot be canonicalised.
    pub fn new(root_directory: &Path, signer: UrlSigner) -> FilesResult<Self> {
        fs::create_dir_all(root_directory).map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot create {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        if !root_directory.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                root_directory.display()
            )));
        }

        let root_directory = root_directory.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        Ok(Self {
            root_directory,
            signer,
        })
    }

    /// Stores `bytes` in `folder` under a freshly generated public id.
    ///
    /// The public id is `<unix-millis>-<sanitised original filename>`.
    ///
    /// # Errors
    ///
    /// - [`FilesError::UnsupportedFormat`] if the bytes are not JPEG, PNG or WebP
    /// - [`FilesError::InvalidPath`] if the folder sanitises to nothing
    /// - [`FilesError::Io`] if the write fails
    pub fn upload(
        &self,
        folder: &str,
        original_filename: &str,
        bytes: &[u8],
    ) -> FilesResult<StoredImage> {
        let media_type = detect_image_type(bytes)?;
        let folder = sanitise_folder(folder)?;
        let filename = sanitise_filename(original_filename);
        let folder_path = self.root_directory.join(&folder);

        fs::create_dir_all(&folder_path).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create storage directory {}: {}",
                    folder_path.display(),
                    e
                ),
            ))
        })?;

        let stored_at = Utc::now();
        let base_id = format!("{}-{}", stored_at.timestamp_millis(), filename);

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let public_id = if attempt == 0 {
                base_id.clone()
            } else {
                format!("{}-{}", attempt, base_id)
            };
            let target = folder_path.join(&public_id);

            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&target)
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(FilesError::Io(e)),
            };

            if let Err(e) = file.write_all(bytes) {
                let _ = fs::remove_file(&target);
                return Err(FilesError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to write image to {}: {}", target.display(), e),
                )));
            }

            let id = ImageId(format!("{}/{}", folder, public_id));
            return Ok(StoredImage {
                url: self.signer.sign_url(id.as_str(), stored_at),
                id,
                media_type: NonEmptyText::new(media_type)
                    .map_err(|_| FilesError::UnsupportedFormat(None))?,
                size_bytes: bytes.len() as u64,
                sha256: hex::encode(Sha256::digest(bytes)),
                stored_at,
            });
        }

        Err(FilesError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!(
                "failed to allocate a unique image name after {} attempts",
                MAX_NAME_ATTEMPTS
            ),
        )))
    }

    /// Copies an existing image into `target_folder` and returns the new copy.
    ///
    /// The source is left in place; callers delete it once the copy is safely stored.
    pub fn promote(
        &self,
        id: &ImageId,
        target_folder: &str,
        original_filename: &str,
    ) -> FilesResult<StoredImage> {
        let bytes = self.read(id)?;
        self.upload(target_folder, original_filename, &bytes)
    }

    /// Reads the bytes of a stored image.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::NotFound`] if nothing is stored under `id`.
    pub fn read(&self, id: &ImageId) -> FilesResult<Vec<u8>> {
        let path = self.resolve(id);
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(FilesError::NotFound(id.to_string())),
            Err(e) => Err(FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read image from {}: {}", path.display(), e),
            ))),
        }
    }

    /// Deletes a stored image. Returns `Ok(false)` if it did not exist.
    pub fn delete(&self, id: &ImageId) -> FilesResult<bool> {
        match fs::remove_file(self.resolve(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(FilesError::Io(e)),
        }
    }

    pub fn exists(&self, id: &ImageId) -> bool {
        self.resolve(id).is_file()
    }

    /// Detected media type of a stored image.
    pub fn media_type(&self, id: &ImageId) -> FilesResult<&'static str> {
        let bytes = self.read(id)?;
        detect_image_type(&bytes)
    }

    /// Fresh signed URL for `id`, valid from now.
    pub fn signed_url(&self, id: &ImageId) -> String {
        self.signer.sign_url(id.as_str(), Utc::now())
    }

    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    #[must_use]
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    fn resolve(&self, id: &ImageId) -> PathBuf {
        self.root_directory.join(id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TEMP_FOLDER;
    use tempfile::TempDir;

    const PNG: [u8; 16] = [
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52,
    ];
    const JPEG: [u8; 12] = [
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01,
    ];

    fn create_store(temp: &TempDir) -> ImageStore {
        let signer = UrlSigner::new(b"key".to_vec(), "http://localhost:3002", 600).unwrap();
        ImageStore::new(&temp.path().join("images"), signer).unwrap()
    }

    #[test]
    fn test_new_creates_root() {
        let temp = TempDir::new().unwrap();
        let store = create_store(&temp);
        assert!(store.root_directory().is_dir());
    }

    #[test]
    fn test_new_rejects_file_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("file.txt");
        fs::write(&root, "not a directory").unwrap();
        let signer = UrlSigner::new(b"key".to_vec(), "http://x", 60).unwrap();

        assert!(matches!(
            ImageStore::new(&root, signer),
            Err(FilesError::InvalidRootDirectory(_))
        ));
    }

    #[test]
    fn test_upload_png() {
        let temp = TempDir::new().unwrap();
        let store = create_store(&temp);

        let stored = store.upload(TEMP_FOLDER, "my photo.png", &PNG).unwrap();

        assert!(stored.id.as_str().starts_with("Skins/Tmp/"));
        assert!(stored.id.as_str().ends_with("-my_photo.png"));
        assert_eq!(stored.media_type.as_str(), "image/png");
        assert_eq!(stored.size_bytes, PNG.len() as u64);
        assert_eq!(stored.sha256.len(), 64);
        assert!(stored.url.contains("/images/Skins/Tmp/"));
        assert_eq!(store.read(&stored.id).unwrap(), PNG.to_vec());
    }

    #[test]
    fn test_upload_rejects_non_image() {
        let temp = TempDir::new().unwrap();
        let store = create_store(&temp);

        let result = store.upload(TEMP_FOLDER, "notes.txt", b"just some text");
        assert!(matches!(result, Err(FilesError::UnsupportedFormat(None))));
        assert!(!store.root_directory().join("Skins").exists());
    }

    #[test]
    fn test_upload_rejects_pdf() {
        let temp = TempDir::new().unwrap();
        let store = create_store(&temp);

        let result = store.upload(TEMP_FOLDER, "scan.pdf", b"%PDF-1.4 fake");
        match result {
            Err(FilesError::UnsupportedFormat(Some(mime))) => assert_eq!(mime, "application/pdf"),
            other => panic!("expected unsupported pdf, got {:?}", other),
        }
    }

    #[test]
    fn test_upload_same_name_twice_gets_distinct_ids() {
        let temp = TempDir::new().unwrap();
        let store = create_store(&temp);

        let a = store.upload(TEMP_FOLDER, "a.jpg", &JPEG).unwrap();
        let b = store.upload(TEMP_FOLDER, "a.jpg", &JPEG).unwrap();

        assert_ne!(a.id, b.id);
        assert!(store.exists(&a.id));
        assert!(store.exists(&b.id));
    }

    #[test]
    fn test_folder_is_sanitised() {
        let temp = TempDir::new().unwrap();
        let store = create_store(&temp);

        let stored = store
            .upload("Skins/Atopic Dermatitis", "x.jpg", &JPEG)
            .unwrap();
        assert_eq!(stored.id.folder(), "Skins/Atopic_Dermatitis");

        let traversal = store.upload("Skins/../../etc", "x.jpg", &JPEG);
        assert!(matches!(traversal, Err(FilesError::InvalidPath(_))));
    }

    #[test]
    fn test_promote_copies_into_target_folder() {
        let temp = TempDir::new().unwrap();
        let store = create_store(&temp);

        let tmp = store.upload(TEMP_FOLDER, "a.jpg", &JPEG).unwrap();
        let permanent = store.promote(&tmp.id, "Skins/Acne", "a.jpg").unwrap();

        assert_eq!(permanent.id.folder(), "Skins/Acne");
        assert_eq!(permanent.sha256, tmp.sha256);
        assert!(store.exists(&tmp.id));
        assert!(store.exists(&permanent.id));
    }

    #[test]
    fn test_delete_reports_missing() {
        let temp = TempDir::new().unwrap();
        let store = create_store(&temp);

        let stored = store.upload(TEMP_FOLDER, "a.jpg", &JPEG).unwrap();
        assert!(store.delete(&stored.id).unwrap());
        assert!(!store.delete(&stored.id).unwrap());
        assert!(matches!(
            store.read(&stored.id),
            Err(FilesError::NotFound(_))
        ));
    }

    #[test]
    fn test_image_id_rejects_traversal() {
        assert!(ImageId::parse("../secret").is_err());
        assert!(ImageId::parse("Skins/../../x").is_err());
        assert!(ImageId::parse("/etc/passwd").is_err());
        assert!(ImageId::parse("Skins//a.jpg").is_err());
        assert!(ImageId::parse("Skins\\a.jpg").is_err());
        assert!(ImageId::parse("Skins/Acne/1-a.jpg").is_ok());
    }

    #[test]
    fn test_media_type_of_stored_image() {
        let temp = TempDir::new().unwrap();
        let store = create_store(&temp);

        let stored = store.upload(TEMP_FOLDER, "a.jpg", &JPEG).unwrap();
        assert_eq!(store.media_type(&stored.id).unwrap(), "image/jpeg");
    }

    #[test]
    fn test_sanitise_segment() {
        assert_eq!(sanitise_segment("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(sanitise_segment(".."), "");
        assert_eq!(sanitise_segment("Acne"), "Acne");
    }
}
