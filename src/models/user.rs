use serde::{Deserialize, Serialize};

use crate::entities::user_identity;
use crate::models::external_login::ExternalLogin;
use crate::models::fill_missing;

/// Canonical user record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Surrogate key, assigned by the store on first insert.
    pub id: Option<i32>,

    pub user_name: Option<String>,
    pub email: Option<String>,

    pub password_hash: Option<String>,
    pub salt: Option<String>,
    pub digest_ha1_hash: Option<String>,

    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub country: Option<String>,
    pub phone_number: Option<String>,
    pub profile_url: Option<String>,

    pub invalid_login_attempts: i32,
    pub last_login_attempt: Option<String>,
    pub locked_date: Option<String>,

    pub created_date: Option<String>,
    pub modified_date: Option<String>,
}

impl UserIdentity {
    /// At least one resolvable identity field plus credentials material is
    /// required before a record can be persisted.
    #[must_use]
    pub fn has_identity(&self) -> bool {
        self.user_name.as_deref().is_some_and(|n| !n.is_empty())
            || self.email.as_deref().is_some_and(|e| !e.is_empty())
    }

    /// Stamps `modified_date`; `created_date` only when previously unset.
    pub fn stamp(&mut self, now: &str) {
        if self.created_date.is_none() {
            self.created_date = Some(now.to_string());
        }
        self.modified_date = Some(now.to_string());
    }

    /// Copies link-derived profile fields into any field currently unset.
    /// Never overwrites a populated field.
    pub fn populate_missing_from_link(&mut self, link: &ExternalLogin) {
        fill_missing(&mut self.display_name, link.display_name.as_ref());
        fill_missing(&mut self.first_name, link.first_name.as_ref());
        fill_missing(&mut self.last_name, link.last_name.as_ref());
        fill_missing(&mut self.email, link.email.as_ref());
    }
}

impl From<user_identity::Model> for UserIdentity {
    fn from(model: user_identity::Model) -> Self {
        Self {
            id: Some(model.id),
            user_name: model.user_name,
            email: model.email,
            password_hash: model.password_hash,
            salt: model.salt,
            digest_ha1_hash: model.digest_ha1_hash,
            display_name: model.display_name,
            first_name: model.first_name,
            last_name: model.last_name,
            company: model.company,
            country: model.country,
            phone_number: model.phone_number,
            profile_url: model.profile_url,
            invalid_login_attempts: model.invalid_login_attempts,
            last_login_attempt: model.last_login_attempt,
            locked_date: model.locked_date,
            created_date: Some(model.created_date),
            modified_date: Some(model.modified_date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn populate_missing_never_clobbers() {
        let mut user = UserIdentity {
            display_name: Some("Existing".to_string()),
            ..Default::default()
        };
        let link = ExternalLogin {
            display_name: Some("From Provider".to_string()),
            email: Some("alice@provider.example".to_string()),
            ..Default::default()
        };

        user.populate_missing_from_link(&link);

        assert_eq!(user.display_name.as_deref(), Some("Existing"));
        assert_eq!(user.email.as_deref(), Some("alice@provider.example"));
    }

    #[test]
    fn stamp_preserves_created_date() {
        let mut user = UserIdentity::default();
        user.stamp("2026-01-01T00:00:00+00:00");
        user.stamp("2026-02-01T00:00:00+00:00");

        assert_eq!(user.created_date.as_deref(), Some("2026-01-01T00:00:00+00:00"));
        assert_eq!(user.modified_date.as_deref(), Some("2026-02-01T00:00:00+00:00"));
    }
}
