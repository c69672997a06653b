//! Medical history records.
//!
//! A [`MedicalHistoryEntry`] links one classification event for one user to:
//! - a [`ConditionSnapshot`] copied from the catalog at diagnosis time
//! - the specialists and clinics suggested for it, stored as their own records
//!
//! Snapshots and provider records are stored separately from entries so that later catalog
//! edits never rewrite history.

mod fs;
mod memory;
mod service;
mod writer;

pub use fs::FsHistoryStore;
pub use memory::MemoryHistoryStore;
pub use service::{HistoryService, HistorySummary};
pub use writer::{MedicalHistoryWriter, NewHistoryEntry, SourceRef, WriteOutcome};

use crate::yaml_files::StoreResult;
use api_shared::{Clinic, Specialist};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cutis_files::ImageId;
use cutis_types::Severity;
use cutis_uuid::ShardableUuid;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSnapshot {
    pub id: ShardableUuid,
    pub name: String,
    pub description: String,
    pub severity: Severity,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistRecord {
    pub id: ShardableUuid,
    #[serde(flatten)]
    pub specialist: Specialist,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicRecord {
    pub id: ShardableUuid,
    #[serde(flatten)]
    pub clinic: Clinic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalHistoryEntry {
    pub id: ShardableUuid,
    pub user_id: ShardableUuid,
    pub condition_id: ShardableUuid,
    pub diagnosis_date: DateTime<Utc>,
    pub treatment_recommendation: String,
    pub severity: Severity,
    /// Image URL at diagnosis time.
    pub upload_skin: String,
    /// Stored image, used to issue fresh URLs once `upload_skin` has expired.
    #[serde(default)]
    pub image_id: Option<ImageId>,
    #[serde(default)]
    pub specialists: Vec<ShardableUuid>,
    #[serde(default)]
    pub clinics: Vec<ShardableUuid>,
    pub created_at: DateTime<Utc>,
}

/// An entry with its snapshot and provider records resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryDetail {
    pub entry: MedicalHistoryEntry,
    pub condition: Option<ConditionSnapshot>,
    pub specialists: Vec<SpecialistRecord>,
    pub clinics: Vec<ClinicRecord>,
}

impl HistoryDetail {
    /// The analysis report handed to the conversation model.
    pub fn analysis_json(&self) -> Value {
        json!({
            "id": self.entry.id.to_string(),
            "upload_skin": self.entry.upload_skin,
            "diagnosis_date": self.entry.diagnosis_date.to_rfc3339(),
            "treatment_recommendation": self.entry.treatment_recommendation,
            "condition": self.condition.as_ref().map(|c| json!({
                "name": c.name,
                "description": c.description,
                "severity": c.severity.as_str(),
                "recommendation": c.recommendation,
            })),
            "specialists": self.specialists.iter().map(|s| &s.specialist).collect::<Vec<_>>(),
            "clinics": self.clinics.iter().map(|c| &c.clinic).collect::<Vec<_>>(),
        })
    }
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn insert_condition(&self, snapshot: &ConditionSnapshot) -> StoreResult<()>;
    async fn condition(&self, id: &ShardableUuid) -> StoreResult<Option<ConditionSnapshot>>;
    async fn delete_condition(&self, id: &ShardableUuid) -> StoreResult<bool>;

    async fn insert_specialist(&self, record: &SpecialistRecord) -> StoreResult<()>;
    async fn specialist(&self, id: &ShardableUuid) -> StoreResult<Option<SpecialistRecord>>;
    async fn delete_specialist(&self, id: &ShardableUuid) -> StoreResult<bool>;

    async fn insert_clinic(&self, record: &ClinicRecord) -> StoreResult<()>;
    async fn clinic(&self, id: &ShardableUuid) -> StoreResult<Option<ClinicRecord>>;
    async fn delete_clinic(&self, id: &ShardableUuid) -> StoreResult<bool>;

    async fn insert_entry(&self, entry: &MedicalHistoryEntry) -> StoreResult<()>;

    /// Entries of every user, in no particular order.
    async fn all_entries(&self) -> StoreResult<Vec<MedicalHistoryEntry>>;

    /// The user's entries, newest first.
    async fn entries_for_user(&self, user_id: &ShardableUuid)
        -> StoreResult<Vec<MedicalHistoryEntry>>;

    /// `None` if the entry does not exist or belongs to another user.
    async fn entry_for_user(
        &self,
        user_id: &ShardableUuid,
        entry_id: &ShardableUuid,
    ) -> StoreResult<Option<MedicalHistoryEntry>>;

    /// Returns `false` if there was no such entry for the user.
    async fn delete_entry(
        &self,
        user_id: &ShardableUuid,
        entry_id: &ShardableUuid,
    ) -> StoreResult<bool>;
}

/// Resolve an entry's snapshot and provider records. Dangling references are dropped.
pub async fn load_detail(
    store: &dyn HistoryStore,
    entry: MedicalHistoryEntry,
) -> StoreResult<HistoryDetail> {
    let condition = store.condition(&entry.condition_id).await?;

    let mut specialists = Vec::with_capacity(entry.specialists.len());
    for id in &entry.specialists {
        if let Some(record) = store.specialist(id).await? {
            specialists.push(record);
        }
    }

    let mut clinics = Vec::with_capacity(entry.clinics.len());
    for id in &entry.clinics {
        if let Some(record) = store.clinic(id).await? {
            clinics.push(record);
        }
    }

    Ok(HistoryDetail {
        entry,
        condition,
        specialists,
        clinics,
    })
}

fn newest_first(entries: &mut [MedicalHistoryEntry]) {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
