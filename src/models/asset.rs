//! Asset model and related types

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::{AssetStatus, Condition};

/// A tracked physical item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Asset {
    /// Unique identifier, also the scanned/typed code
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub maintenance_note: Option<String>,
    pub manual_link: Option<String>,
    pub condition: Condition,
    pub status: AssetStatus,
    /// Holder identity, present iff status is checked_out
    pub assigned_to: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl Asset {
    /// New available asset in good condition
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: None,
            description: None,
            maintenance_note: None,
            manual_link: None,
            condition: Condition::Good,
            status: AssetStatus::Available,
            assigned_to: None,
            last_updated: next_timestamp(None),
        }
    }

    /// `assigned_to` is non-empty iff the asset is checked out
    pub fn assignment_is_consistent(&self) -> bool {
        let assigned = self.assigned_to.as_deref().is_some_and(|a| !a.is_empty());
        match self.status {
            AssetStatus::CheckedOut => assigned,
            AssetStatus::Available => self.assigned_to.is_none(),
        }
    }

    pub fn is_assigned_to(&self, identity: &str) -> bool {
        self.assigned_to.as_deref() == Some(identity)
    }

    /// Case-insensitive match on name, id, category or assignee
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        let contains = |value: &str| value.to_lowercase().contains(&term);

        contains(&self.name)
            || contains(&self.id)
            || self.category.as_deref().is_some_and(contains)
            || self.assigned_to.as_deref().is_some_and(contains)
    }
}

/// Timestamp for a mutation, strictly after `previous`.
///
/// Truncated to microseconds so values survive a Postgres round trip unchanged.
pub fn next_timestamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now().trunc_subsecs(6);
    match previous {
        Some(prev) if now <= prev => prev + Duration::microseconds(1),
        _ => now,
    }
}

/// Create or update request; `status`/`assigned_to` are left untouched unless provided
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct AssetInput {
    #[validate(length(min = 1, message = "Asset ID cannot be empty"))]
    pub id: String,
    #[validate(length(min = 1, message = "Asset name cannot be empty"))]
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub maintenance_note: Option<String>,
    pub manual_link: Option<String>,
    pub condition: Option<Condition>,
    pub status: Option<AssetStatus>,
    pub assigned_to: Option<String>,
}

/// Partial update applied by `AssetStore::update`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub maintenance_note: Option<String>,
    pub manual_link: Option<String>,
    pub condition: Option<Condition>,
    pub status: Option<AssetStatus>,
    /// `Some(None)` clears the assignee
    pub assigned_to: Option<Option<String>>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl AssetPatch {
    /// Applies the patch in place (merge semantics)
    pub fn apply(&self, asset: &mut Asset) {
        macro_rules! merge {
            ($field:ident) => {
                if let Some(ref value) = self.$field {
                    asset.$field = value.clone();
                }
            };
        }
        macro_rules! merge_opt {
            ($field:ident) => {
                if let Some(ref value) = self.$field {
                    asset.$field = Some(value.clone());
                }
            };
        }

        merge!(name);
        merge_opt!(category);
        merge_opt!(description);
        merge_opt!(maintenance_note);
        merge_opt!(manual_link);
        merge!(condition);
        merge!(status);
        merge!(assigned_to);
        merge!(last_updated);
    }
}

/// List filter
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct AssetQuery {
    /// Substring matched against name, id, category and assignee
    pub search: Option<String>,
}
