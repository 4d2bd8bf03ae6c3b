//! In-process stores backed by `RwLock<HashMap>`

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{AssetStore, UserStore, MAX_BULK_WRITE};
use crate::{
    error::{AppError, AppResult},
    models::{Asset, AssetPatch, Role, User},
};

#[derive(Default)]
pub struct MemoryAssetStore {
    assets: RwLock<HashMap<String, Asset>>,
}

impl MemoryAssetStore {
    pub fn with_assets(assets: impl IntoIterator<Item = Asset>) -> Self {
        Self {
            assets: RwLock::new(assets.into_iter().map(|a| (a.id.clone(), a)).collect()),
        }
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn get(&self, id: &str) -> AppResult<Option<Asset>> {
        Ok(self.assets.read().await.get(id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<Asset>> {
        let mut assets: Vec<Asset> = self.assets.read().await.values().cloned().collect();
        assets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(assets)
    }

    async fn set(&self, asset: &Asset) -> AppResult<()> {
        self.assets
            .write()
            .await
            .insert(asset.id.clone(), asset.clone());
        Ok(())
    }

    async fn update(&self, id: &str, patch: &AssetPatch) -> AppResult<Asset> {
        let mut assets = self.assets.write().await;
        let asset = assets
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Asset {} not found", id)))?;
        patch.apply(asset);
        Ok(asset.clone())
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        Ok(self.assets.write().await.remove(id).is_some())
    }

    async fn bulk_set(&self, assets: &[Asset]) -> AppResult<()> {
        if assets.len() > MAX_BULK_WRITE {
            return Err(AppError::Validation(format!(
                "Bulk write of {} assets exceeds the limit of {}",
                assets.len(),
                MAX_BULK_WRITE
            )));
        }

        let mut stored = self.assets.write().await;
        for asset in assets {
            stored.insert(asset.id.clone(), asset.clone());
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.id.clone(), u)).collect()),
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list(&self) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn get(&self, id: &str) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn set_role(&self, id: &str, role: Role) -> AppResult<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
        user.role = role;
        user.last_updated = Utc::now();
        Ok(user.clone())
    }
}
