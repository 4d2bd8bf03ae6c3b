//! Postgres implementation of the asset collection

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{AssetStore, MAX_BULK_WRITE};
use crate::{
    error::{AppError, AppResult},
    models::{Asset, AssetPatch},
};

const UPSERT_ASSET: &str = r#"
    INSERT INTO assets (id, name, category, description, maintenance_note, manual_link,
                        condition, status, assigned_to, last_updated)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
    ON CONFLICT (id) DO UPDATE SET
        name = EXCLUDED.name,
        category = EXCLUDED.category,
        description = EXCLUDED.description,
        maintenance_note = EXCLUDED.maintenance_note,
        manual_link = EXCLUDED.manual_link,
        condition = EXCLUDED.condition,
        status = EXCLUDED.status,
        assigned_to = EXCLUDED.assigned_to,
        last_updated = EXCLUDED.last_updated
"#;

#[derive(Clone)]
pub struct PgAssetStore {
    pool: Pool<Postgres>,
}

impl PgAssetStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn upsert_query(asset: &Asset) -> sqlx::query::Query<'_, Postgres, sqlx::postgres::PgArguments> {
        sqlx::query(UPSERT_ASSET)
            .bind(&asset.id)
            .bind(&asset.name)
            .bind(&asset.category)
            .bind(&asset.description)
            .bind(&asset.maintenance_note)
            .bind(&asset.manual_link)
            .bind(asset.condition)
            .bind(asset.status)
            .bind(&asset.assigned_to)
            .bind(asset.last_updated)
    }
}

#[async_trait]
impl AssetStore for PgAssetStore {
    async fn get(&self, id: &str) -> AppResult<Option<Asset>> {
        let row = sqlx::query_as::<_, Asset>("SELECT * FROM assets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list(&self) -> AppResult<Vec<Asset>> {
        let rows = sqlx::query_as::<_, Asset>("SELECT * FROM assets ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn set(&self, asset: &Asset) -> AppResult<()> {
        Self::upsert_query(asset).execute(&self.pool).await?;
        Ok(())
    }

    async fn update(&self, id: &str, patch: &AssetPatch) -> AppResult<Asset> {
        let mut sets = Vec::new();
        let mut idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(patch.name, "name");
        add_field!(patch.category, "category");
        add_field!(patch.description, "description");
        add_field!(patch.maintenance_note, "maintenance_note");
        add_field!(patch.manual_link, "manual_link");
        add_field!(patch.condition, "condition");
        add_field!(patch.status, "status");
        add_field!(patch.assigned_to, "assigned_to");
        add_field!(patch.last_updated, "last_updated");

        if sets.is_empty() {
            return self
                .get(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Asset {} not found", id)));
        }

        let query = format!("UPDATE assets SET {} WHERE id = $1 RETURNING *", sets.join(", "));
        let mut builder = sqlx::query_as::<_, Asset>(&query).bind(id);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(patch.name);
        bind_field!(patch.category);
        bind_field!(patch.description);
        bind_field!(patch.maintenance_note);
        bind_field!(patch.manual_link);
        bind_field!(patch.condition);
        bind_field!(patch.status);
        bind_field!(patch.assigned_to);
        bind_field!(patch.last_updated);

        builder
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Asset {} not found", id)))
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM assets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn bulk_set(&self, assets: &[Asset]) -> AppResult<()> {
        if assets.len() > MAX_BULK_WRITE {
            return Err(AppError::Validation(format!(
                "Bulk write of {} assets exceeds the limit of {}",
                assets.len(),
                MAX_BULK_WRITE
            )));
        }

        let mut tx = self.pool.begin().await?;
        for asset in assets {
            Self::upsert_query(asset).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
