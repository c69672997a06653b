//! Folder names and accepted formats for image storage.

/// Top-level folder holding every skin photo.
pub const SKINS_FOLDER: &str = "Skins";

/// Folder for uploads that have not been classified yet.
pub const TEMP_FOLDER: &str = "Skins/Tmp";

/// Folder for images whose classification was not confident enough to file by label.
pub const UNCLASSIFIED_FOLDER: &str = "Skins/Unclassified";

/// Media types accepted for upload (jpg/jpeg, png, webp).
pub const ACCEPTED_MEDIA_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// Attempts made to find a free public id before giving up.
pub(crate) const MAX_NAME_ATTEMPTS: usize = 5;

/// Longest original filename kept in a public id.
pub(crate) const MAX_FILENAME_LEN: usize = 80;
