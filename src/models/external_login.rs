use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::external_login;

/// Federated-login linkage record: at most one per (provider, provider user
/// id) pair. `user_auth_id` is a foreign-key-style back-reference, never an
/// embedded identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalLogin {
    pub id: Option<i32>,

    pub provider: String,
    pub provider_user_id: String,

    pub user_auth_id: Option<i32>,

    pub access_token: Option<String>,
    pub access_token_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub request_token: Option<String>,

    pub user_name: Option<String>,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,

    /// Provider extras, persisted as a JSON object string.
    pub items: BTreeMap<String, String>,

    pub created_date: Option<String>,
    pub modified_date: Option<String>,
}

impl ExternalLogin {
    /// Blank link for a provider identity seen for the first time.
    #[must_use]
    pub fn for_provider(provider: &str, provider_user_id: &str) -> Self {
        Self {
            provider: provider.to_string(),
            provider_user_id: provider_user_id.to_string(),
            ..Default::default()
        }
    }
}

impl From<external_login::Model> for ExternalLogin {
    fn from(model: external_login::Model) -> Self {
        let items = model
            .items
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();

        Self {
            id: Some(model.id),
            provider: model.provider,
            provider_user_id: model.provider_user_id,
            user_auth_id: Some(model.user_auth_id),
            access_token: model.access_token,
            access_token_secret: model.access_token_secret,
            refresh_token: model.refresh_token,
            request_token: model.request_token,
            user_name: model.user_name,
            display_name: model.display_name,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            items,
            created_date: Some(model.created_date),
            modified_date: Some(model.modified_date),
        }
    }
}
