use super::{
    newest_first, ClinicRecord, ConditionSnapshot, HistoryStore, MedicalHistoryEntry,
    SpecialistRecord,
};
use crate::yaml_files::StoreResult;
use async_trait::async_trait;
use cutis_uuid::ShardableUuid;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Collections {
    conditions: HashMap<ShardableUuid, ConditionSnapshot>,
    specialists: HashMap<ShardableUuid, SpecialistRecord>,
    clinics: HashMap<ShardableUuid, ClinicRecord>,
    entries: HashMap<ShardableUuid, MedicalHistoryEntry>,
}

/// Volatile history store for tests and the CLI.
#[derive(Default)]
pub struct MemoryHistoryStore {
    inner: RwLock<Collections>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total entries across all users.
    pub async fn entry_count(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Stored snapshot, specialist and clinic records, in that order.
    pub async fn record_counts(&self) -> (usize, usize, usize) {
        let inner = self.inner.read().await;
        (
            inner.conditions.len(),
            inner.specialists.len(),
            inner.clinics.len(),
        )
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn insert_condition(&self, snapshot: &ConditionSnapshot) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .conditions
            .insert(snapshot.id.clone(), snapshot.clone());
        Ok(())
    }

    async fn condition(&self, id: &ShardableUuid) -> StoreResult<Option<ConditionSnapshot>> {
        Ok(self.inner.read().await.conditions.get(id).cloned())
    }

    async fn delete_condition(&self, id: &ShardableUuid) -> StoreResult<bool> {
        Ok(self.inner.write().await.conditions.remove(id).is_some())
    }

    async fn insert_specialist(&self, record: &SpecialistRecord) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .specialists
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn specialist(&self, id: &ShardableUuid) -> StoreResult<Option<SpecialistRecord>> {
        Ok(self.inner.read().await.specialists.get(id).cloned())
    }

    async fn delete_specialist(&self, id: &ShardableUuid) -> StoreResult<bool> {
        Ok(self.inner.write().await.specialists.remove(id).is_some())
    }

    async fn insert_clinic(&self, record: &ClinicRecord) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .clinics
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn clinic(&self, id: &ShardableUuid) -> StoreResult<Option<ClinicRecord>> {
        Ok(self.inner.read().await.clinics.get(id).cloned())
    }

    async fn delete_clinic(&self, id: &ShardableUuid) -> StoreResult<bool> {
        Ok(self.inner.write().await.clinics.remove(id).is_some())
    }

    async fn insert_entry(&self, entry: &MedicalHistoryEntry) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .entries
            .insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn all_entries(&self) -> StoreResult<Vec<MedicalHistoryEntry>> {
        Ok(self.inner.read().await.entries.values().cloned().collect())
    }

    async fn entries_for_user(
        &self,
        user_id: &ShardableUuid,
    ) -> StoreResult<Vec<MedicalHistoryEntry>> {
        let mut entries: Vec<_> = self
            .inner
            .read()
            .await
            .entries
            .values()
            .filter(|e| &e.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut entries);
        Ok(entries)
    }

    async fn entry_for_user(
        &self,
        user_id: &ShardableUuid,
        entry_id: &ShardableUuid,
    ) -> StoreResult<Option<MedicalHistoryEntry>> {
        Ok(self
            .inner
            .read()
            .await
            .entries
            .get(entry_id)
            .filter(|e| &e.user_id == user_id)
            .cloned())
    }

    async fn delete_entry(
        &self,
        user_id: &ShardableUuid,
        entry_id: &ShardableUuid,
    ) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.entries.get(entry_id) {
            Some(entry) if &entry.user_id == user_id => {
                inner.entries.remove(entry_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
