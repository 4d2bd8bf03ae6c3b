//! Asset operations: re-read, apply a lifecycle rule, persist

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use super::lifecycle::{self, UpsertPlan};
use crate::{
    error::{AppError, AppResult},
    models::{Actor, Asset, AssetInput, AssetPatch, ImportCandidate, InventoryStats},
    repository::AssetStore,
};

/// Result of scanning or typing an asset code
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanOutcome {
    Existing { asset: Asset },
    /// Unknown code; the caller may create an asset under it
    New { id: String },
}

#[derive(Clone)]
pub struct AssetService {
    store: Arc<dyn AssetStore>,
    timeout: Duration,
}

impl AssetService {
    pub fn new(store: Arc<dyn AssetStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Run `operation` under the interactive time limit
    async fn bounded<T>(&self, operation: &str, fut: impl Future<Output = AppResult<T>>) -> AppResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, timeout_secs = self.timeout.as_secs(), "Asset operation timed out");
                Err(AppError::Timeout(format!(
                    "{} did not complete within {} seconds",
                    operation,
                    self.timeout.as_secs()
                )))
            }
        }
    }

    async fn load(&self, id: &str) -> AppResult<Asset> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Asset {} not found", id)))
    }

    pub async fn get(&self, id: &str) -> AppResult<Asset> {
        self.bounded("get", self.load(id)).await
    }

    /// Assets visible to `actor`, optionally filtered by a search term
    pub async fn list(&self, actor: &Actor, search: Option<&str>) -> AppResult<Vec<Asset>> {
        self.bounded("list", async {
            let can_see_all = actor.capabilities().manage_inventory;
            let term = search.map(str::trim).filter(|s| !s.is_empty());

            let assets = self
                .store
                .list()
                .await?
                .into_iter()
                .filter(|a| can_see_all || a.is_assigned_to(&actor.identity))
                .filter(|a| term.map_or(true, |t| a.matches_search(t)))
                .collect();
            Ok(assets)
        })
        .await
    }

    pub async fn lookup(&self, code: &str, actor: &Actor) -> AppResult<ScanOutcome> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::Validation("Asset code cannot be empty".to_string()));
        }

        self.bounded("lookup", async {
            match self.store.get(code).await? {
                Some(asset) => Ok(ScanOutcome::Existing { asset }),
                None if actor.capabilities().manage_inventory => Ok(ScanOutcome::New {
                    id: code.to_string(),
                }),
                None => Err(AppError::Authorization(
                    "Item not found in inventory. You do not have permission to add new assets."
                        .to_string(),
                )),
            }
        })
        .await
    }

    pub async fn check_out(&self, id: &str, actor: &Actor, assignee: Option<&str>) -> AppResult<Asset> {
        self.bounded("check_out", async {
            let current = self.load(id).await?;
            let next = lifecycle::check_out(&current, actor, assignee)?;
            let stored = self.store.update(id, &transition_patch(&next)).await?;

            tracing::info!(
                asset_id = %id,
                assignee = next.assigned_to.as_deref().unwrap_or_default(),
                actor = %actor.identity,
                "Asset checked out"
            );
            Ok(stored)
        })
        .await
    }

    pub async fn check_in(&self, id: &str, actor: &Actor) -> AppResult<Asset> {
        self.bounded("check_in", async {
            let current = self.load(id).await?;
            let next = lifecycle::check_in(&current, actor)?;
            let stored = self.store.update(id, &transition_patch(&next)).await?;

            tracing::info!(asset_id = %id, actor = %actor.identity, "Asset checked in");
            Ok(stored)
        })
        .await
    }

    pub async fn set_condition(&self, id: &str, actor: &Actor, broken: bool) -> AppResult<Asset> {
        actor.require_manage_inventory()?;

        self.bounded("set_condition", async {
            let current = self.load(id).await?;
            let next = lifecycle::set_condition(&current, actor, broken)?;
            let patch = AssetPatch {
                condition: Some(next.condition),
                last_updated: Some(next.last_updated),
                ..Default::default()
            };
            let stored = self.store.update(id, &patch).await?;

            tracing::info!(asset_id = %id, condition = %next.condition, "Asset condition changed");
            Ok(stored)
        })
        .await
    }

    /// Create, update or rename an asset.
    ///
    /// A rename writes the new id, reads it back and only then deletes the
    /// old id. If another writer got to the new id in between, the old
    /// record is kept and `Conflict` is returned.
    pub async fn save(&self, input: AssetInput, existing_id: Option<&str>, actor: &Actor) -> AppResult<Asset> {
        actor.require_manage_inventory()?;
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.bounded("save", async {
            let new_id = input.id.trim();
            let existing_id = existing_id.map(str::trim).filter(|id| !id.is_empty());

            let current = self.store.get(existing_id.unwrap_or(new_id)).await?;
            if let (Some(previous), None) = (existing_id, current.as_ref()) {
                return Err(AppError::NotFound(format!("Asset {} not found", previous)));
            }

            let target = match existing_id {
                Some(previous) if previous != new_id => self.store.get(new_id).await?,
                _ => None,
            };

            match lifecycle::upsert(&input, existing_id, current.as_ref(), target.as_ref())? {
                UpsertPlan::Write(asset) => {
                    self.store.set(&asset).await?;
                    tracing::info!(asset_id = %asset.id, "Asset saved");
                    Ok(asset)
                }
                UpsertPlan::Rename { asset, previous_id } => {
                    self.store.set(&asset).await?;

                    match self.store.get(&asset.id).await? {
                        Some(ref stored) if *stored == asset => {}
                        _ => {
                            tracing::warn!(
                                asset_id = %asset.id,
                                previous_id = %previous_id,
                                "Rename target changed concurrently, keeping the old record"
                            );
                            return Err(AppError::Conflict(format!(
                                "Asset ID {} already exists",
                                asset.id
                            )));
                        }
                    }

                    self.store.delete(&previous_id).await?;
                    tracing::info!(asset_id = %asset.id, previous_id = %previous_id, "Asset renamed");
                    Ok(asset)
                }
            }
        })
        .await
    }

    /// Candidate for a copy of the asset; nothing is written
    pub async fn duplicate(&self, id: &str, actor: &Actor) -> AppResult<ImportCandidate> {
        actor.require_manage_inventory()?;
        let source = self.get(id).await?;
        Ok(lifecycle::duplicate(&source))
    }

    pub async fn delete(&self, id: &str, actor: &Actor) -> AppResult<()> {
        actor.require_manage_inventory()?;

        self.bounded("delete", async {
            if !self.store.delete(id).await? {
                return Err(AppError::NotFound(format!("Asset {} not found", id)));
            }
            tracing::info!(asset_id = %id, actor = %actor.identity, "Asset deleted");
            Ok(())
        })
        .await
    }

    pub async fn stats(&self, actor: &Actor) -> AppResult<InventoryStats> {
        self.bounded("stats", async {
            let assets = self.store.list().await?;
            Ok(InventoryStats::compute(
                &assets,
                &actor.identity,
                actor.capabilities().see_admin_stats,
            ))
        })
        .await
    }
}

/// Status/assignee fields written by check-out and check-in
fn transition_patch(next: &Asset) -> AssetPatch {
    AssetPatch {
        status: Some(next.status),
        assigned_to: Some(next.assigned_to.clone()),
        last_updated: Some(next.last_updated),
        ..Default::default()
    }
}
