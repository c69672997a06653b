//! Audit trail.
//!
//! Audit storage lives outside this service. [`TracingAuditLog`] emits each entry as a
//! structured event on the `cutis::audit` target for the log pipeline to collect;
//! [`MemoryAuditLog`] keeps entries for inspection in tests and the CLI.

use async_trait::async_trait;
use cutis_uuid::ShardableUuid;
use std::sync::Mutex;

pub const AUDIT_TARGET: &str = "cutis::audit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Success,
    Failed,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Success => "Success",
            AuditStatus::Failed => "Failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// `None` for guests.
    pub user_id: Option<ShardableUuid>,
    pub action: String,
    pub module: String,
    pub status: AuditStatus,
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit log unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLog;

#[async_trait]
impl AuditLog for TracingAuditLog {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        let user = entry
            .user_id
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "guest".into());
        tracing::info!(
            target: AUDIT_TARGET,
            user = %user,
            module = %entry.module,
            status = entry.status.as_str(),
            "{}",
            entry.action
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(entry);
        Ok(())
    }
}
