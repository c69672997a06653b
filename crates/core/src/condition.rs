//! Condition catalog.
//!
//! Reference data describing known skin conditions, loaded once at startup from YAML:
//!
//! ```yaml
//! - name: Acne
//!   description: Inflammatory condition of hair follicles and oil glands.
//!   severity: Moderate
//!   recommendation: See a dermatologist for prescription retinoids
//! ```

use crate::{CoreError, CoreResult};
use cutis_types::Severity;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub recommendation: Option<String>,
}

/// In-memory list of conditions in file order.
#[derive(Debug, Clone, Default)]
pub struct ConditionCatalog {
    conditions: Vec<Condition>,
}

impl ConditionCatalog {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    /// Parse a YAML list of conditions.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CatalogParse`] if the document is not a list of conditions.
    pub fn from_yaml_str(yaml: &str) -> CoreResult<Self> {
        let conditions: Vec<Condition> =
            serde_yaml::from_str(yaml).map_err(CoreError::CatalogParse)?;
        Ok(Self::new(conditions))
    }

    /// Load the catalog from `path`. A missing file yields an empty catalog.
    ///
    /// # Errors
    ///
    /// - [`CoreError::CatalogRead`] if the file exists but cannot be read
    /// - [`CoreError::CatalogParse`] if it is not valid catalog YAML
    pub fn load(path: &Path) -> CoreResult<Self> {
        let yaml = match std::fs::read_to_string(path) {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "condition catalog not found; starting empty");
                return Ok(Self::default());
            }
            Err(e) => return Err(CoreError::CatalogRead(e)),
        };
        let catalog = Self::from_yaml_str(&yaml)?;
        tracing::info!(path = %path.display(), count = catalog.len(), "loaded condition catalog");
        Ok(catalog)
    }

    pub fn all(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// First condition whose name contains `classification`, ignoring case.
    ///
    /// The classification is matched literally; regex metacharacters in a label carry no
    /// meaning.
    pub fn find_by_classification(&self, classification: &str) -> Option<&Condition> {
        let classification = classification.trim();
        if classification.is_empty() {
            return None;
        }
        let pattern = RegexBuilder::new(&regex::escape(classification))
            .case_insensitive(true)
            .build()
            .ok()?;
        self.conditions.iter().find(|c| pattern.is_match(&c.name))
    }
}
