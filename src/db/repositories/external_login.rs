use anyhow::{Context, Result, bail};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

use crate::entities::external_login;
use crate::models::{ExternalLogin, now_rfc3339};

pub struct ExternalLoginRepository {
    conn: DatabaseConnection,
}

impl ExternalLoginRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_provider(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Option<ExternalLogin>> {
        let link = external_login::Entity::find()
            .filter(external_login::Column::Provider.eq(provider))
            .filter(external_login::Column::ProviderUserId.eq(provider_user_id))
            .one(&self.conn)
            .await
            .context("Failed to query external login by provider key")?;

        Ok(link.map(ExternalLogin::from))
    }

    pub async fn list_for_user(&self, user_auth_id: i32) -> Result<Vec<ExternalLogin>> {
        let links = external_login::Entity::find()
            .filter(external_login::Column::UserAuthId.eq(user_auth_id))
            .order_by_asc(external_login::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list external logins for user")?;

        Ok(links.into_iter().map(ExternalLogin::from).collect())
    }

    /// Inserts on first creation, updates by key afterwards, same branching
    /// as the identity save path. The owning identity id must be assigned
    /// before a link can be persisted.
    pub async fn save(&self, link: &ExternalLogin) -> Result<ExternalLogin> {
        let Some(user_auth_id) = link.user_auth_id else {
            bail!("external login has no owning identity id");
        };

        let items = if link.items.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&link.items)?)
        };

        let active = external_login::ActiveModel {
            id: link.id.map_or(NotSet, Set),
            provider: Set(link.provider.clone()),
            provider_user_id: Set(link.provider_user_id.clone()),
            user_auth_id: Set(user_auth_id),
            access_token: Set(link.access_token.clone()),
            access_token_secret: Set(link.access_token_secret.clone()),
            refresh_token: Set(link.refresh_token.clone()),
            request_token: Set(link.request_token.clone()),
            user_name: Set(link.user_name.clone()),
            display_name: Set(link.display_name.clone()),
            first_name: Set(link.first_name.clone()),
            last_name: Set(link.last_name.clone()),
            email: Set(link.email.clone()),
            items: Set(items),
            created_date: Set(link.created_date.clone().unwrap_or_else(now_rfc3339)),
            modified_date: Set(link.modified_date.clone().unwrap_or_else(now_rfc3339)),
        };

        let model = match link.id {
            None => active
                .insert(&self.conn)
                .await
                .context("Failed to insert external login")?,
            Some(_) => active
                .update(&self.conn)
                .await
                .context("Failed to update external login")?,
        };

        Ok(ExternalLogin::from(model))
    }

    /// Cascade target for identity deletion. Returns the number of links
    /// removed.
    pub async fn delete_for_user(&self, user_auth_id: i32) -> Result<u64> {
        let result = external_login::Entity::delete_many()
            .filter(external_login::Column::UserAuthId.eq(user_auth_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete external logins for user")?;

        Ok(result.rows_affected)
    }
}
