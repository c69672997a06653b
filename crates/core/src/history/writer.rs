use super::{
    ClinicRecord, ConditionSnapshot, HistoryStore, MedicalHistoryEntry, SpecialistRecord,
};
use crate::best_effort::best_effort;
use crate::clock::Clock;
use crate::condition::Condition;
use crate::yaml_files::StoreResult;
use api_shared::{Clinic, Specialist};
use cutis_files::ImageId;
use cutis_types::Severity;
use cutis_uuid::ShardableUuid;
use std::sync::Arc;

/// How a specialist or clinic reaches the writer.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRef<T> {
    /// Only a display name is known.
    RawName(String),
    /// Full details, persisted as a new record.
    Detail(T),
    /// A record that is already stored.
    ExistingRef(ShardableUuid),
}

#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub user_id: ShardableUuid,
    /// Label the result was reported under.
    pub condition_label: String,
    /// Catalog match, if any.
    pub condition: Option<Condition>,
    pub image_url: String,
    pub image_id: Option<ImageId>,
    pub recommendation: String,
    pub severity: Severity,
    pub specialists: Vec<SourceRef<Specialist>>,
    pub clinics: Vec<SourceRef<Clinic>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub success: bool,
    pub history_id: Option<ShardableUuid>,
}

impl WriteOutcome {
    fn failed() -> Self {
        Self {
            success: false,
            history_id: None,
        }
    }
}

/// Records created by one write, removed again if the entry itself never lands.
#[derive(Debug, Default)]
struct Written {
    condition: Option<ShardableUuid>,
    specialists: Vec<ShardableUuid>,
    clinics: Vec<ShardableUuid>,
}

/// Persists one composite history record per successful classification.
#[derive(Clone)]
pub struct MedicalHistoryWriter {
    store: Arc<dyn HistoryStore>,
    clock: Arc<dyn Clock>,
}

impl MedicalHistoryWriter {
    pub fn new(store: Arc<dyn HistoryStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Write the entry. Never fails outward: store errors are logged and reported as
    /// `success: false`, and any records already written for the entry are removed.
    pub async fn record(&self, new: NewHistoryEntry) -> WriteOutcome {
        let user_id = new.user_id.clone();
        let mut written = Written::default();
        let result = self.try_record(new, &mut written).await;
        match result {
            Ok(history_id) => {
                tracing::info!(user = %user_id, history_id = %history_id, "medical history recorded");
                WriteOutcome {
                    success: true,
                    history_id: Some(history_id),
                }
            }
            Err(e) => {
                tracing::error!(user = %user_id, error = %e, "failed to record medical history");
                self.roll_back(written).await;
                WriteOutcome::failed()
            }
        }
    }

    async fn roll_back(&self, written: Written) {
        if let Some(id) = written.condition {
            best_effort("remove condition snapshot", self.store.delete_condition(&id)).await;
        }
        for id in &written.specialists {
            best_effort("remove specialist record", self.store.delete_specialist(id)).await;
        }
        for id in &written.clinics {
            best_effort("remove clinic record", self.store.delete_clinic(id)).await;
        }
    }

    async fn try_record(
        &self,
        new: NewHistoryEntry,
        written: &mut Written,
    ) -> StoreResult<ShardableUuid> {
        let now = self.clock.now();
        let snapshot = snapshot_for(&new);
        self.store.insert_condition(&snapshot).await?;
        written.condition = Some(snapshot.id.clone());

        let mut specialist_ids = Vec::with_capacity(new.specialists.len());
        for source in new.specialists {
            let detail = match source {
                SourceRef::ExistingRef(id) => {
                    if self.store.specialist(&id).await?.is_some() {
                        specialist_ids.push(id);
                    } else {
                        tracing::warn!(specialist_id = %id, "skipping unknown specialist reference");
                    }
                    continue;
                }
                SourceRef::RawName(name) => Specialist {
                    name,
                    link: String::new(),
                    description: String::new(),
                    specialty: new.condition_label.clone(),
                },
                SourceRef::Detail(specialist) => specialist,
            };
            let record = SpecialistRecord {
                id: ShardableUuid::new(),
                specialist: detail,
            };
            self.store.insert_specialist(&record).await?;
            written.specialists.push(record.id.clone());
            specialist_ids.push(record.id);
        }

        let mut clinic_ids = Vec::with_capacity(new.clinics.len());
        for source in new.clinics {
            let detail = match source {
                SourceRef::ExistingRef(id) => {
                    if self.store.clinic(&id).await?.is_some() {
                        clinic_ids.push(id);
                    } else {
                        tracing::warn!(clinic_id = %id, "skipping unknown clinic reference");
                    }
                    continue;
                }
                SourceRef::RawName(title) => Clinic {
                    title,
                    link: String::new(),
                    snippet: String::new(),
                    condition: new.condition_label.clone(),
                },
                SourceRef::Detail(clinic) => clinic,
            };
            let record = ClinicRecord {
                id: ShardableUuid::new(),
                clinic: detail,
            };
            self.store.insert_clinic(&record).await?;
            written.clinics.push(record.id.clone());
            clinic_ids.push(record.id);
        }

        let entry = MedicalHistoryEntry {
            id: ShardableUuid::new(),
            user_id: new.user_id,
            condition_id: snapshot.id,
            diagnosis_date: now,
            treatment_recommendation: new.recommendation,
            severity: new.severity,
            upload_skin: new.image_url,
            image_id: new.image_id,
            specialists: specialist_ids,
            clinics: clinic_ids,
            created_at: now,
        };
        self.store.insert_entry(&entry).await?;
        Ok(entry.id)
    }
}

fn snapshot_for(new: &NewHistoryEntry) -> ConditionSnapshot {
    let name = new
        .condition
        .as_ref()
        .map(|c| c.name.clone())
        .unwrap_or_else(|| new.condition_label.clone());
    let description = new
        .condition
        .as_ref()
        .map(|c| c.description.trim())
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("AI-detected skin condition: {}", name));
    let recommendation = new
        .condition
        .as_ref()
        .and_then(|c| c.recommendation.as_deref())
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| new.recommendation.clone());

    ConditionSnapshot {
        id: ShardableUuid::new(),
        name,
        description,
        severity: new.severity,
        recommendation,
    }
}
