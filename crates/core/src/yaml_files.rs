//! YAML record files shared by the filesystem history and conversation stores.
//!
//! Each record is one YAML file. Writes go to a sibling temporary file that is then renamed
//! over the target, so readers never observe a half-written record.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed at {path}: {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize YAML record: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to parse YAML record {path}: {source}", path = path.display())]
    YamlDeserialization {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub(crate) async fn write_record<T: Serialize>(path: &Path, record: &T) -> StoreResult<()> {
    let yaml = serde_yaml::to_string(record).map_err(StoreError::YamlSerialization)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(io_error(parent))?;
    }
    let tmp = path.with_extension("yaml.tmp");
    tokio::fs::write(&tmp, yaml).await.map_err(io_error(&tmp))?;
    tokio::fs::rename(&tmp, path).await.map_err(io_error(path))
}

pub(crate) async fn read_record<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    let yaml = match tokio::fs::read_to_string(path).await {
        Ok(yaml) => yaml,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(path)(e)),
    };
    serde_yaml::from_str(&yaml)
        .map(Some)
        .map_err(|source| StoreError::YamlDeserialization {
            path: path.to_path_buf(),
            source,
        })
}

/// Every `*.yaml` record directly inside `dir`. A missing directory holds no records.
pub(crate) async fn read_records<T: DeserializeOwned>(dir: &Path) -> StoreResult<Vec<T>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_error(dir)(e)),
    };

    let mut records = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_error(dir))? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
            continue;
        }
        if let Some(record) = read_record(&path).await? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Directories directly inside `dir`. A missing directory has none.
pub(crate) async fn subdirectories(dir: &Path) -> StoreResult<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_error(dir)(e)),
    };

    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_error(dir))? {
        let file_type = entry.file_type().await.map_err(io_error(dir))?;
        if file_type.is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

/// Returns `false` if there was nothing to remove.
pub(crate) async fn remove_record(path: &Path) -> StoreResult<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_error(path)(e)),
    }
}
