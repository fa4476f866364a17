use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::external_login::ExternalLogin;
use crate::models::fill_missing;
use crate::models::user::UserIdentity;

/// Authentication session as presented by a calling flow. Carries whatever
/// identity the session already knows about; both ids may be absent for an
/// anonymous session arriving with only provider tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSession {
    /// Transport-level session id, opaque to this crate.
    pub id: Option<String>,

    /// Stored identity id the session was authenticated against, if any.
    pub user_auth_id: Option<i32>,

    /// Username or email the session authenticated as, if any.
    pub user_auth_name: Option<String>,

    pub user_name: Option<String>,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,

    pub is_authenticated: bool,

    /// External-login links of the resolved identity, filled by
    /// session loading.
    pub provider_links: Vec<ExternalLogin>,

    pub created_at: Option<String>,
    pub last_modified: Option<String>,
}

impl AuthSession {
    /// Projects a stored identity plus its links into the session.
    pub fn populate_from(&mut self, user: &UserIdentity, links: Vec<ExternalLogin>) {
        self.user_auth_id = user.id;
        self.user_auth_name = user.user_name.clone().or_else(|| user.email.clone());
        self.user_name = user.user_name.clone();
        self.display_name = user.display_name.clone();
        self.first_name = user.first_name.clone();
        self.last_name = user.last_name.clone();
        self.email = user.email.clone();
        self.is_authenticated = true;
        self.provider_links = links;
    }

    /// Copies session profile fields into any user field currently unset.
    pub fn populate_missing_user_fields(&self, user: &mut UserIdentity) {
        fill_missing(&mut user.display_name, self.display_name.as_ref());
        fill_missing(&mut user.first_name, self.first_name.as_ref());
        fill_missing(&mut user.last_name, self.last_name.as_ref());
        fill_missing(&mut user.email, self.email.as_ref());
    }
}

/// Tokens delivered by an external provider callback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthTokens {
    pub provider: Option<String>,
    pub user_id: Option<String>,

    pub access_token: Option<String>,
    pub access_token_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub request_token: Option<String>,

    pub user_name: Option<String>,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,

    pub items: BTreeMap<String, String>,
}

impl AuthTokens {
    /// Both halves of the provider identity, when present.
    #[must_use]
    pub fn provider_key(&self) -> Option<(&str, &str)> {
        match (self.provider.as_deref(), self.user_id.as_deref()) {
            (Some(provider), Some(user_id)) if !provider.is_empty() && !user_id.is_empty() => {
                Some((provider, user_id))
            }
            _ => None,
        }
    }

    /// Merges token fields into the link, filling only fields the link does
    /// not already have. Item entries are added key-by-key under the same
    /// rule.
    pub fn populate_missing_link_fields(&self, link: &mut ExternalLogin) {
        fill_missing(&mut link.access_token, self.access_token.as_ref());
        fill_missing(&mut link.access_token_secret, self.access_token_secret.as_ref());
        fill_missing(&mut link.refresh_token, self.refresh_token.as_ref());
        fill_missing(&mut link.request_token, self.request_token.as_ref());
        fill_missing(&mut link.user_name, self.user_name.as_ref());
        fill_missing(&mut link.display_name, self.display_name.as_ref());
        fill_missing(&mut link.first_name, self.first_name.as_ref());
        fill_missing(&mut link.last_name, self.last_name.as_ref());
        fill_missing(&mut link.email, self.email.as_ref());

        for (key, value) in &self.items {
            link.items
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_key_requires_both_halves() {
        let mut tokens = AuthTokens::default();
        assert!(tokens.provider_key().is_none());

        tokens.provider = Some("google".to_string());
        assert!(tokens.provider_key().is_none());

        tokens.user_id = Some("g123".to_string());
        assert_eq!(tokens.provider_key(), Some(("google", "g123")));
    }

    #[test]
    fn link_merge_fills_only_missing() {
        let mut link = ExternalLogin::for_provider("google", "g123");
        link.access_token = Some("kept".to_string());
        link.items.insert("scope".to_string(), "old".to_string());

        let tokens = AuthTokens {
            provider: Some("google".to_string()),
            user_id: Some("g123".to_string()),
            access_token: Some("clobber-attempt".to_string()),
            refresh_token: Some("fresh".to_string()),
            items: BTreeMap::from([
                ("scope".to_string(), "new".to_string()),
                ("locale".to_string(), "en".to_string()),
            ]),
            ..Default::default()
        };

        tokens.populate_missing_link_fields(&mut link);

        assert_eq!(link.access_token.as_deref(), Some("kept"));
        assert_eq!(link.refresh_token.as_deref(), Some("fresh"));
        assert_eq!(link.items.get("scope").map(String::as_str), Some("old"));
        assert_eq!(link.items.get("locale").map(String::as_str), Some("en"));
    }
}
