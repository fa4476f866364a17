use serde::{Deserialize, Serialize};

use crate::entities::api_key;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKey {
    /// The key string itself.
    pub id: String,

    /// Owning identity id, string form.
    pub user_auth_id: String,

    pub environment: Option<String>,
    pub key_type: Option<String>,

    pub created_date: Option<String>,
    pub expiry_date: Option<String>,
    pub cancelled_date: Option<String>,
}

impl ApiKey {
    /// A key is active iff it is not cancelled and not past its expiry.
    /// `now` is an RFC3339 timestamp.
    #[must_use]
    pub fn is_active(&self, now: &str) -> bool {
        if self.cancelled_date.is_some() {
            return false;
        }
        match &self.expiry_date {
            Some(expiry) => expiry.as_str() >= now,
            None => true,
        }
    }
}

impl From<api_key::Model> for ApiKey {
    fn from(model: api_key::Model) -> Self {
        Self {
            id: model.id,
            user_auth_id: model.user_auth_id,
            environment: model.environment,
            key_type: model.key_type,
            created_date: Some(model.created_date),
            expiry_date: model.expiry_date,
            cancelled_date: model.cancelled_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_key_is_inactive() {
        let key = ApiKey {
            cancelled_date: Some("2026-01-01T00:00:00+00:00".to_string()),
            ..Default::default()
        };
        assert!(!key.is_active("2025-01-01T00:00:00+00:00"));
    }

    #[test]
    fn expiry_is_inclusive() {
        let key = ApiKey {
            expiry_date: Some("2026-01-01T00:00:00+00:00".to_string()),
            ..Default::default()
        };
        assert!(key.is_active("2026-01-01T00:00:00+00:00"));
        assert!(!key.is_active("2026-01-02T00:00:00+00:00"));
    }

    #[test]
    fn no_expiry_means_active() {
        let key = ApiKey::default();
        assert!(key.is_active("2099-01-01T00:00:00+00:00"));
    }
}
