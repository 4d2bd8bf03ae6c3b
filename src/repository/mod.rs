//! Storage layer: the asset collection and the user directory.
//!
//! Both collections are treated as keyed documents with last-write-wins
//! semantics. No operation spans more than one document except `bulk_set`.

pub mod assets;
pub mod memory;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Asset, AssetPatch, Role, User},
};

/// Largest number of documents a single atomic bulk write may carry
pub const MAX_BULK_WRITE: usize = 450;

/// Keyed asset collection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn get(&self, id: &str) -> AppResult<Option<Asset>>;

    async fn list(&self) -> AppResult<Vec<Asset>>;

    /// Create or replace the document stored under `asset.id`
    async fn set(&self, asset: &Asset) -> AppResult<()>;

    /// Partial merge into an existing document; `NotFound` when absent
    async fn update(&self, id: &str, patch: &AssetPatch) -> AppResult<Asset>;

    /// Returns false when nothing was stored under `id`
    async fn delete(&self, id: &str) -> AppResult<bool>;

    /// Atomic create-or-replace of up to `MAX_BULK_WRITE` documents
    async fn bulk_set(&self, assets: &[Asset]) -> AppResult<()>;

    fn backend(&self) -> &'static str;
}

/// User directory
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<User>>;

    async fn get(&self, id: &str) -> AppResult<Option<User>>;

    async fn set_role(&self, id: &str, role: Role) -> AppResult<User>;
}

/// Main repository struct holding the storage handles
#[derive(Clone)]
pub struct Repository {
    pub assets: Arc<dyn AssetStore>,
    pub users: Arc<dyn UserStore>,
}

impl Repository {
    /// Postgres-backed repository
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            assets: Arc::new(assets::PgAssetStore::new(pool.clone())),
            users: Arc::new(users::PgUserStore::new(pool)),
        }
    }

    /// Process-local repository, used for development and tests
    pub fn in_memory() -> Self {
        Self {
            assets: Arc::new(memory::MemoryAssetStore::default()),
            users: Arc::new(memory::MemoryUserStore::default()),
        }
    }

    pub fn with_stores(assets: Arc<dyn AssetStore>, users: Arc<dyn UserStore>) -> Self {
        Self { assets, users }
    }
}
