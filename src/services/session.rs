//! Session reconciliation: matching a login session and optional provider
//! tokens against the stored identities, and merging provider callbacks into
//! them.

use tracing::debug;

use crate::db::Store;
use crate::error::AuthError;
use crate::models::{AuthSession, AuthTokens, ExternalLogin, UserIdentity, now_rfc3339};

pub struct SessionService {
    store: Store,
}

impl SessionService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Resolves the identity a session (plus optional provider tokens) refers
    /// to.
    ///
    /// Precedence is load-bearing: session-declared identity (id, then name)
    /// is checked before any token match, so a locally authenticated user is
    /// never re-keyed by a stale provider token. A link whose owner is gone
    /// resolves to `None`, not an error.
    pub async fn resolve_user(
        &self,
        session: &AuthSession,
        tokens: Option<&AuthTokens>,
    ) -> Result<Option<UserIdentity>, AuthError> {
        if let Some(id) = session.user_auth_id
            && let Some(user) = self.store.get_user_by_id(id).await?
        {
            return Ok(Some(user));
        }

        if let Some(name) = session.user_auth_name.as_deref()
            && let Some(user) = self.store.get_user_by_name(name).await?
        {
            return Ok(Some(user));
        }

        let Some((provider, provider_user_id)) = tokens.and_then(AuthTokens::provider_key) else {
            return Ok(None);
        };

        let Some(link) = self
            .store
            .get_external_login(provider, provider_user_id)
            .await?
        else {
            return Ok(None);
        };

        let owner_id = link.user_auth_id.ok_or_else(|| {
            AuthError::Internal("stored external login has no owner id".into())
        })?;

        let owner = self.store.get_user_by_id(owner_id).await?;
        if owner.is_none() {
            debug!(
                provider,
                provider_user_id, "External login dangles: owner identity missing"
            );
        }
        Ok(owner)
    }

    /// Resolves or creates the identity for a provider callback and merges
    /// the token payload into its external-login link.
    ///
    /// Merging is populate-missing throughout: a field already set on the
    /// link or the user is never overwritten. The check-then-persist section
    /// runs under the registration lock; the unique (provider, provider user
    /// id) index decides any remaining race.
    pub async fn create_or_merge(
        &self,
        session: &AuthSession,
        tokens: &AuthTokens,
    ) -> Result<ExternalLogin, AuthError> {
        let Some((provider, provider_user_id)) = tokens.provider_key() else {
            return Err(AuthError::Validation(
                "provider and provider user id are required".into(),
            ));
        };

        let mut lock_keys = vec![format!("{provider}/{provider_user_id}")];
        lock_keys.extend(tokens.user_name.clone());
        lock_keys.extend(tokens.email.clone());
        let _guard = self.store.registration_lock().acquire(lock_keys).await;

        let mut user = self
            .resolve_user(session, Some(tokens))
            .await?
            .unwrap_or_default();

        let mut link = self
            .store
            .get_external_login(provider, provider_user_id)
            .await?
            .unwrap_or_else(|| ExternalLogin::for_provider(provider, provider_user_id));

        tokens.populate_missing_link_fields(&mut link);
        user.populate_missing_from_link(&link);

        let now = now_rfc3339();
        user.stamp(&now);

        // Assigns the surrogate id for brand-new users.
        let user = self.store.save_user(&user).await?;

        link.user_auth_id = user.id;
        if link.created_date.is_none() {
            link.created_date = user.modified_date.clone();
        }
        link.modified_date = user.modified_date.clone();

        Ok(self.store.save_external_login(&link).await?)
    }

    /// Populates `session` from the stored identity it refers to, including
    /// its external-login links. Returns whether an identity was found.
    pub async fn load_session(&self, session: &mut AuthSession) -> Result<bool, AuthError> {
        let Some(user) = self.resolve_user(session, None).await? else {
            return Ok(false);
        };

        let links = match user.id {
            Some(id) => self.store.list_user_logins(id).await?,
            None => Vec::new(),
        };

        session.populate_from(&user, links);
        Ok(true)
    }

    /// Persists a session-derived identity: resolves the record the session
    /// refers to (or starts a new one), fills unset profile fields from the
    /// session, and saves.
    pub async fn save_session(&self, session: &AuthSession) -> Result<UserIdentity, AuthError> {
        let mut user = self.resolve_user(session, None).await?.unwrap_or_default();

        if user.user_name.is_none() {
            user.user_name = session.user_name.clone();
        }
        session.populate_missing_user_fields(&mut user);

        if !user.has_identity() {
            return Err(AuthError::Validation(
                "session carries no resolvable identity".into(),
            ));
        }

        let keys: Vec<String> = user
            .user_name
            .iter()
            .chain(user.email.iter())
            .cloned()
            .collect();
        let _guard = self.store.registration_lock().acquire(keys).await;

        self.store
            .assert_no_conflict(user.user_name.as_deref(), user.email.as_deref(), user.id)
            .await?;

        user.stamp(&now_rfc3339());
        Ok(self.store.save_user(&user).await?)
    }

    /// Deletes an identity and cascades to its external-login links.
    pub async fn delete_user(&self, id: i32) -> Result<(), AuthError> {
        if self.store.delete_user(id).await? {
            Ok(())
        } else {
            Err(AuthError::NotFound(format!("user identity {id}")))
        }
    }
}
