//! Cutis Image Storage
//!
//! This crate stores uploaded skin photos on the local filesystem and hands out signed,
//! expiring URLs for them.
//!
//! ## Design Principles
//!
//! - Every stored image is addressed by an *image id*: a relative path made of sanitised
//!   folder segments and a generated public id (`Skins/Acne/1717171717171-photo.jpg`)
//! - Only JPEG, PNG and WebP content is accepted, detected from the bytes themselves
//! - Stored files are never modified; moving an image means writing a new copy and
//!   deleting the old one
//! - Nothing outside the configured root is ever read or written
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/images/
//! └── Skins/
//!     ├── Tmp/              # temporary uploads awaiting classification
//!     ├── Unclassified/     # low-confidence results
//!     └── <Classification>/ # confident results, one folder per label
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use cutis_files::{ImageStore, UrlSigner, TEMP_FOLDER};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let signer = UrlSigner::new(b"secret".to_vec(), "http://localhost:3002", 3600)?;
//! let store = ImageStore::new(Path::new("cutis_data/images"), signer)?;
//! let bytes = std::fs::read("photo.jpg")?;
//! let stored = store.upload(TEMP_FOLDER, "photo.jpg", &bytes)?;
//! println!("{}", stored.url);
//! # Ok(())
//! # }
//! ```

mod constants;
mod images;
mod signing;

pub use constants::{ACCEPTED_MEDIA_TYPES, SKINS_FOLDER, TEMP_FOLDER, UNCLASSIFIED_FOLDER};
pub use images::{sanitise_segment, ImageId, ImageStore, StoredImage};
pub use signing::UrlSigner;

/// Errors that can occur during image storage operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Root directory could not be created or resolved
    #[error("Invalid root directory: {0}")]
    InvalidRootDirectory(String),

    /// Image id or folder failed validation (traversal, empty segment, separators)
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Bytes are not one of the accepted image formats
    #[error("Unsupported image format: {}", .0.as_deref().unwrap_or("unknown"))]
    UnsupportedFormat(Option<String>),

    /// No image stored under the given id
    #[error("Image not found: {0}")]
    NotFound(String),

    /// Signed URL configuration is unusable
    #[error("Invalid signing configuration: {0}")]
    InvalidSigningConfig(String),

    /// Signature does not match the image id and expiry
    #[error("Invalid URL signature")]
    InvalidSignature,

    /// Signed URL is past its expiry
    #[error("Signed URL has expired")]
    ExpiredUrl,

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type FilesResult<T> = Result<T, FilesError>;
