//! Inventory statistics

use serde::Serialize;
use utoipa::ToSchema;

use super::{
    asset::Asset,
    enums::{AssetStatus, Condition},
};

/// Dashboard counters; aggregates are only filled for admin viewers
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct InventoryStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    /// Available and not broken
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_out: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broken: Option<usize>,
    /// Assets assigned to the viewer
    pub mine: usize,
}

impl InventoryStats {
    pub fn compute(assets: &[Asset], identity: &str, include_aggregates: bool) -> Self {
        let count = |pred: &dyn Fn(&Asset) -> bool| assets.iter().filter(|a| pred(a)).count();
        let mine = count(&|a| a.is_assigned_to(identity));

        if !include_aggregates {
            return Self {
                mine,
                ..Default::default()
            };
        }

        Self {
            total: Some(assets.len()),
            available: Some(count(&|a| {
                a.status == AssetStatus::Available && a.condition != Condition::Broken
            })),
            checked_out: Some(count(&|a| a.status == AssetStatus::CheckedOut)),
            broken: Some(count(&|a| a.condition == Condition::Broken)),
            mine,
        }
    }
}
