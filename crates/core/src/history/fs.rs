//! Filesystem history store.
//!
//! ```text
//! <history_dir>/
//! ├── conditions/<s1>/<s2>/<id>.yaml
//! ├── specialists/<s1>/<s2>/<id>.yaml
//! ├── clinics/<s1>/<s2>/<id>.yaml
//! └── entries/<s1>/<s2>/<user_id>/<entry_id>.yaml
//! ```

use super::{
    newest_first, ClinicRecord, ConditionSnapshot, HistoryStore, MedicalHistoryEntry,
    SpecialistRecord,
};
use crate::yaml_files::{
    read_record, read_records, remove_record, subdirectories, write_record, StoreResult,
};
use async_trait::async_trait;
use cutis_uuid::ShardableUuid;
use std::path::{Path, PathBuf};

const RECORD_EXTENSION: &str = "yaml";

pub struct FsHistoryStore {
    root: PathBuf,
}

impl FsHistoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, collection: &str, id: &ShardableUuid) -> PathBuf {
        id.sharded_file(&self.root.join(collection), RECORD_EXTENSION)
    }

    fn user_dir(&self, user_id: &ShardableUuid) -> PathBuf {
        user_id.sharded_dir(&self.root.join("entries"))
    }

    fn entry_path(&self, user_id: &ShardableUuid, entry_id: &ShardableUuid) -> PathBuf {
        self.user_dir(user_id)
            .join(format!("{}.{}", entry_id, RECORD_EXTENSION))
    }
}

#[async_trait]
impl HistoryStore for FsHistoryStore {
    async fn insert_condition(&self, snapshot: &ConditionSnapshot) -> StoreResult<()> {
        write_record(&self.record_path("conditions", &snapshot.id), snapshot).await
    }

    async fn condition(&self, id: &ShardableUuid) -> StoreResult<Option<ConditionSnapshot>> {
        read_record(&self.record_path("conditions", id)).await
    }

    async fn delete_condition(&self, id: &ShardableUuid) -> StoreResult<bool> {
        remove_record(&self.record_path("conditions", id)).await
    }

    async fn insert_specialist(&self, record: &SpecialistRecord) -> StoreResult<()> {
        write_record(&self.record_path("specialists", &record.id), record).await
    }

    async fn specialist(&self, id: &ShardableUuid) -> StoreResult<Option<SpecialistRecord>> {
        read_record(&self.record_path("specialists", id)).await
    }

    async fn delete_specialist(&self, id: &ShardableUuid) -> StoreResult<bool> {
        remove_record(&self.record_path("specialists", id)).await
    }

    async fn insert_clinic(&self, record: &ClinicRecord) -> StoreResult<()> {
        write_record(&self.record_path("clinics", &record.id), record).await
    }

    async fn clinic(&self, id: &ShardableUuid) -> StoreResult<Option<ClinicRecord>> {
        read_record(&self.record_path("clinics", id)).await
    }

    async fn delete_clinic(&self, id: &ShardableUuid) -> StoreResult<bool> {
        remove_record(&self.record_path("clinics", id)).await
    }

    async fn insert_entry(&self, entry: &MedicalHistoryEntry) -> StoreResult<()> {
        write_record(&self.entry_path(&entry.user_id, &entry.id), entry).await
    }

    async fn all_entries(&self) -> StoreResult<Vec<MedicalHistoryEntry>> {
        let mut entries = Vec::new();
        for s1 in subdirectories(&self.root.join("entries")).await? {
            for s2 in subdirectories(&s1).await? {
                for user_dir in subdirectories(&s2).await? {
                    entries.extend(read_records::<MedicalHistoryEntry>(&user_dir).await?);
                }
            }
        }
        Ok(entries)
    }

    async fn entries_for_user(
        &self,
        user_id: &ShardableUuid,
    ) -> StoreResult<Vec<MedicalHistoryEntry>> {
        let mut entries: Vec<MedicalHistoryEntry> = read_records(&self.user_dir(user_id)).await?;
        newest_first(&mut entries);
        Ok(entries)
    }

    async fn entry_for_user(
        &self,
        user_id: &ShardableUuid,
        entry_id: &ShardableUuid,
    ) -> StoreResult<Option<MedicalHistoryEntry>> {
        read_record(&self.entry_path(user_id, entry_id)).await
    }

    async fn delete_entry(
        &self,
        user_id: &ShardableUuid,
        entry_id: &ShardableUuid,
    ) -> StoreResult<bool> {
        remove_record(&self.entry_path(user_id, entry_id)).await
    }
}
