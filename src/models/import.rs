//! Bulk import models: candidates, enrichment results and the import report.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::asset::{next_timestamp, Asset};

/// A not-yet-persisted asset record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ImportCandidate {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub maintenance_note: Option<String>,
}

impl ImportCandidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Non-destructive merge: generated data never replaces supplied data.
    ///
    /// Returns `true` when at least one field changed.
    pub fn merge_enrichment(&mut self, result: &EnrichmentResult) -> bool {
        let mut changed = false;
        if is_blank(&self.category) {
            if let Some(category) = non_blank(&result.category) {
                self.category = Some(category);
                changed = true;
            }
        }
        if is_blank(&self.description) {
            if let Some(description) = non_blank(&result.description) {
                self.description = Some(description);
                changed = true;
            }
        }
        if let Some(maintenance) = non_blank(&result.maintenance) {
            if self.maintenance_note.as_deref() != Some(maintenance.as_str()) {
                self.maintenance_note = Some(maintenance);
                changed = true;
            }
        }

        changed
    }

    /// Fresh asset record: available, good condition, stamped now
    pub fn into_asset(self) -> Asset {
        Asset {
            id: self.id,
            name: self.name,
            category: self.category.filter(|c| !c.is_empty()),
            description: self.description.filter(|d| !d.is_empty()),
            maintenance_note: self.maintenance_note.filter(|m| !m.is_empty()),
            manual_link: None,
            condition: Default::default(),
            status: Default::default(),
            assigned_to: None,
            last_updated: next_timestamp(None),
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.trim().is_empty())
}

/// Generated metadata for one candidate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EnrichmentResult {
    pub category: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "maintenanceNote", alias = "maintenance_note")]
    pub maintenance: Option<String>,
}

impl EnrichmentResult {
    /// Lenient conversion: non-string fields are ignored
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let object = value.as_object()?;
        let field = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| object.get(*k).and_then(|v| v.as_str()))
                .map(str::to_string)
        };

        Some(Self {
            category: field(&["category"]),
            description: field(&["description"]),
            maintenance: field(&["maintenance", "maintenanceNote", "maintenance_note"]),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.description.is_none() && self.maintenance.is_none()
    }
}

/// An enrichment batch that did not contribute its fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BatchFailure {
    /// 1-based batch index
    pub batch_index: usize,
    pub total_batches: usize,
    /// True when the failure aborted all remaining batches
    pub permanent: bool,
    pub message: String,
}

/// Outcome of one import run
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ImportReport {
    pub received: usize,
    pub enriched: usize,
    pub persisted: usize,
    pub dropped: usize,
    /// Input exceeded the persisted-batch limit
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped_ids: Vec<String>,
    /// Candidates rejected for a blank name
    pub skipped: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<BatchFailure>,
    /// Remaining batches were abandoned after a permanent failure
    pub enrichment_aborted: bool,
    pub enrichment_cancelled: bool,
}
