use anyhow::{Context, Result};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};

use crate::entities::api_key;
use crate::models::{ApiKey, now_rfc3339};

pub struct ApiKeyRepository {
    conn: DatabaseConnection,
}

impl ApiKeyRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn exists(&self, id: &str) -> Result<bool> {
        let count = api_key::Entity::find()
            .filter(api_key::Column::Id.eq(id))
            .count(&self.conn)
            .await
            .context("Failed to check api key existence")?;

        Ok(count > 0)
    }

    pub async fn get(&self, id: &str) -> Result<Option<ApiKey>> {
        let key = api_key::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query api key")?;

        Ok(key.map(ApiKey::from))
    }

    /// Keys that are neither cancelled nor past expiry. Keys without an
    /// expiry date are always included.
    pub async fn list_active_for_user(
        &self,
        user_auth_id: &str,
        now: &str,
    ) -> Result<Vec<ApiKey>> {
        let keys = api_key::Entity::find()
            .filter(
                Condition::all()
                    .add(api_key::Column::UserAuthId.eq(user_auth_id))
                    .add(api_key::Column::CancelledDate.is_null())
                    .add(
                        Condition::any()
                            .add(api_key::Column::ExpiryDate.is_null())
                            .add(api_key::Column::ExpiryDate.gte(now)),
                    ),
            )
            .order_by_desc(api_key::Column::CreatedDate)
            .all(&self.conn)
            .await
            .context("Failed to list active api keys")?;

        Ok(keys.into_iter().map(ApiKey::from).collect())
    }

    /// Idempotent batch upsert: a key already present is updated in place,
    /// its original `created_date` kept.
    pub async fn upsert_batch(&self, keys: &[ApiKey]) -> Result<()> {
        for key in keys {
            let active = api_key::ActiveModel {
                id: Set(key.id.clone()),
                user_auth_id: Set(key.user_auth_id.clone()),
                environment: Set(key.environment.clone()),
                key_type: Set(key.key_type.clone()),
                created_date: Set(key.created_date.clone().unwrap_or_else(now_rfc3339)),
                expiry_date: Set(key.expiry_date.clone()),
                cancelled_date: Set(key.cancelled_date.clone()),
            };

            api_key::Entity::insert(active)
                .on_conflict(
                    OnConflict::column(api_key::Column::Id)
                        .update_columns([
                            api_key::Column::UserAuthId,
                            api_key::Column::Environment,
                            api_key::Column::KeyType,
                            api_key::Column::ExpiryDate,
                            api_key::Column::CancelledDate,
                        ])
                        .to_owned(),
                )
                .exec(&self.conn)
                .await
                .context("Failed to upsert api key")?;
        }

        Ok(())
    }

    /// Soft delete: stamps `cancelled_date`, the key row stays.
    pub async fn cancel(&self, id: &str) -> Result<bool> {
        let Some(key) = api_key::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query api key for cancellation")?
        else {
            return Ok(false);
        };

        let mut active: api_key::ActiveModel = key.into();
        active.cancelled_date = Set(Some(now_rfc3339()));
        active
            .update(&self.conn)
            .await
            .context("Failed to cancel api key")?;

        Ok(true)
    }
}
