use anyhow::{Context, Result};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

use crate::entities::user_identity;
use crate::error::AuthError;
use crate::models::{UserIdentity, now_rfc3339};

/// Routes a lookup key to the column it identifies: anything with an '@' is
/// treated as an email address, everything else as a username. Consequence:
/// a username containing '@' cannot be found through this path.
fn lookup_column(key: &str) -> user_identity::Column {
    if key.contains('@') {
        user_identity::Column::Email
    } else {
        user_identity::Column::UserName
    }
}

pub struct IdentityRepository {
    conn: DatabaseConnection,
}

impl IdentityRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<UserIdentity>> {
        let user = user_identity::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query identity by id")?;

        Ok(user.map(UserIdentity::from))
    }

    /// Name-or-email resolution, see [`lookup_column`].
    pub async fn get_by_user_name_or_email(&self, key: &str) -> Result<Option<UserIdentity>> {
        let user = user_identity::Entity::find()
            .filter(lookup_column(key).eq(key))
            .one(&self.conn)
            .await
            .context("Failed to query identity by name or email")?;

        Ok(user.map(UserIdentity::from))
    }

    /// Fails when another record already owns the candidate username or
    /// email. `except_id` exempts the record being updated so a no-op rename
    /// does not conflict with itself.
    pub async fn assert_no_conflict(
        &self,
        user_name: Option<&str>,
        email: Option<&str>,
        except_id: Option<i32>,
    ) -> Result<(), AuthError> {
        if let Some(name) = user_name.filter(|n| !n.is_empty()) {
            let existing = self
                .get_by_user_name_or_email(name)
                .await
                .map_err(AuthError::from)?;
            if existing.is_some_and(|u| u.id != except_id) {
                return Err(AuthError::DuplicateUserName(name.to_string()));
            }
        }

        if let Some(email) = email.filter(|e| !e.is_empty()) {
            let existing = self
                .get_by_user_name_or_email(email)
                .await
                .map_err(AuthError::from)?;
            if existing.is_some_and(|u| u.id != except_id) {
                return Err(AuthError::DuplicateEmail(email.to_string()));
            }
        }

        Ok(())
    }

    /// Inserts when the record has no assigned id, updates by key otherwise.
    /// Returns the stored record with its id populated.
    pub async fn save(&self, user: &UserIdentity) -> Result<UserIdentity> {
        let active = to_active(user);

        let model = match user.id {
            None => active
                .insert(&self.conn)
                .await
                .context("Failed to insert identity")?,
            Some(_) => active
                .update(&self.conn)
                .await
                .context("Failed to update identity")?,
        };

        Ok(UserIdentity::from(model))
    }

    pub async fn delete_by_id(&self, id: i32) -> Result<bool> {
        let result = user_identity::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete identity")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count(&self) -> Result<u64> {
        user_identity::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count identities")
    }
}

fn to_active(user: &UserIdentity) -> user_identity::ActiveModel {
    user_identity::ActiveModel {
        id: user.id.map_or(NotSet, Set),
        user_name: Set(user.user_name.clone()),
        email: Set(user.email.clone()),
        password_hash: Set(user.password_hash.clone()),
        salt: Set(user.salt.clone()),
        digest_ha1_hash: Set(user.digest_ha1_hash.clone()),
        display_name: Set(user.display_name.clone()),
        first_name: Set(user.first_name.clone()),
        last_name: Set(user.last_name.clone()),
        company: Set(user.company.clone()),
        country: Set(user.country.clone()),
        phone_number: Set(user.phone_number.clone()),
        profile_url: Set(user.profile_url.clone()),
        invalid_login_attempts: Set(user.invalid_login_attempts),
        last_login_attempt: Set(user.last_login_attempt.clone()),
        locked_date: Set(user.locked_date.clone()),
        created_date: Set(user.created_date.clone().unwrap_or_else(now_rfc3339)),
        modified_date: Set(user.modified_date.clone().unwrap_or_else(now_rfc3339)),
    }
}
