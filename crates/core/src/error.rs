use crate::audit::AuditError;
use crate::classifier::ClassifierError;
use crate::conversation::ChatError;
use crate::enrichment::SearchError;
use crate::yaml_files::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("failed to read condition catalog: {0}")]
    CatalogRead(std::io::Error),
    #[error("failed to parse condition catalog: {0}")]
    CatalogParse(serde_yaml::Error),
    #[error("image storage error: {0}")]
    Storage(#[from] cutis_files::FilesError),
    #[error("classifier error: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("search error: {0}")]
    Search(#[from] SearchError),
    #[error("record store error: {0}")]
    Store(#[from] StoreError),
    #[error("audit log error: {0}")]
    Audit(#[from] AuditError),
    #[error("conversation model error: {0}")]
    Chat(#[from] ChatError),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
