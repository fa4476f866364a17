//! Credential verification and login bookkeeping.
//!
//! Both verification paths report failure as `Ok(None)`: a caller cannot tell
//! an unknown account from wrong credentials. Failed attempts are still
//! recorded on the account, including the lockout trigger.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task;
use tracing::warn;

use crate::config::{DigestConfig, SecurityConfig};
use crate::crypto::digest;
use crate::crypto::password::PasswordHasher;
use crate::db::Store;
use crate::error::AuthError;
use crate::models::{UserIdentity, now_rfc3339};

pub struct CredentialService {
    store: Store,
    hasher: Arc<dyn PasswordHasher>,
    security: SecurityConfig,
    digest: DigestConfig,
}

impl CredentialService {
    /// The hasher is passed in here; nothing resolves it globally.
    #[must_use]
    pub fn new(
        store: Store,
        hasher: Arc<dyn PasswordHasher>,
        security: SecurityConfig,
        digest: DigestConfig,
    ) -> Self {
        Self {
            store,
            hasher,
            security,
            digest,
        }
    }

    /// Creates a new identity with freshly derived credentials. Fails on
    /// missing identity fields or a username/email conflict.
    pub async fn create_user(
        &self,
        mut user: UserIdentity,
        password: &str,
    ) -> Result<UserIdentity, AuthError> {
        validate_new_user(&user, password)?;

        let _guard = self
            .store
            .registration_lock()
            .acquire(identity_keys(&user))
            .await;

        self.store
            .assert_no_conflict(user.user_name.as_deref(), user.email.as_deref(), None)
            .await?;

        let (hash, salt) = self.hash_password(password).await?;
        user.password_hash = Some(hash);
        user.salt = Some(salt);
        user.digest_ha1_hash = user
            .user_name
            .as_deref()
            .map(|name| digest::compute_ha1(name, &self.digest.realm, password));

        let now = now_rfc3339();
        user.created_date = Some(now.clone());
        user.modified_date = Some(now);

        Ok(self.store.save_user(&user).await?)
    }

    /// Applies `updated` over `existing`, re-deriving credential material
    /// only where needed: hash/salt when a password is supplied, the digest
    /// hash when the password or the username changed.
    pub async fn update_user(
        &self,
        existing: &UserIdentity,
        mut updated: UserIdentity,
        password: Option<&str>,
    ) -> Result<UserIdentity, AuthError> {
        let existing_id = existing
            .id
            .ok_or_else(|| AuthError::Validation("existing record has no assigned id".into()))?;
        if !updated.has_identity() {
            return Err(AuthError::Validation(
                "a username or email is required".into(),
            ));
        }

        let _guard = self
            .store
            .registration_lock()
            .acquire(identity_keys(&updated))
            .await;

        self.store
            .assert_no_conflict(
                updated.user_name.as_deref(),
                updated.email.as_deref(),
                Some(existing_id),
            )
            .await?;

        if let Some(password) = password {
            let (hash, salt) = self.hash_password(password).await?;
            updated.password_hash = Some(hash);
            updated.salt = Some(salt);
            updated.digest_ha1_hash = updated
                .user_name
                .as_deref()
                .map(|name| digest::compute_ha1(name, &self.digest.realm, password));
        } else {
            updated.password_hash = existing.password_hash.clone();
            updated.salt = existing.salt.clone();
            // HA1 is bound to the username. Without the plaintext a renamed
            // account cannot keep a valid digest hash, so it is dropped until
            // the next password change re-derives it.
            updated.digest_ha1_hash = if updated.user_name == existing.user_name {
                existing.digest_ha1_hash.clone()
            } else {
                None
            };
        }

        updated.id = Some(existing_id);
        updated.created_date = existing.created_date.clone();
        updated.modified_date = Some(now_rfc3339());

        Ok(self.store.save_user(&updated).await?)
    }

    /// Password login. `Ok(Some(user))` on success, `Ok(None)` on any
    /// authentication failure.
    pub async fn verify_password(
        &self,
        user_name_or_email: &str,
        password: &str,
    ) -> Result<Option<UserIdentity>, AuthError> {
        let Some(user) = self.store.get_user_by_name(user_name_or_email).await? else {
            return Ok(None);
        };

        if self.is_locked_out(&user) {
            self.record_failed_login(user).await?;
            return Ok(None);
        }

        let verified = match (&user.password_hash, &user.salt) {
            (Some(hash), Some(salt)) => {
                self.check_password(password, hash.clone(), salt.clone())
                    .await?
            }
            _ => false,
        };

        if verified {
            Ok(Some(self.record_successful_login(user).await?))
        } else {
            self.record_failed_login(user).await?;
            Ok(None)
        }
    }

    /// Digest-challenge login against the stored HA1. Same opaque failure
    /// and bookkeeping as the password path. Nonce secret and validity window
    /// come from the service's [`DigestConfig`].
    pub async fn verify_digest(
        &self,
        headers: &HashMap<String, String>,
        sequence: &str,
    ) -> Result<Option<UserIdentity>, AuthError> {
        let Some(user_name) = headers.get("username") else {
            return Ok(None);
        };
        let Some(user) = self.store.get_user_by_name(user_name).await? else {
            return Ok(None);
        };

        if self.is_locked_out(&user) {
            self.record_failed_login(user).await?;
            return Ok(None);
        }

        let nonce_timeout = Duration::from_secs(self.digest.nonce_timeout_seconds);
        let verified = user.digest_ha1_hash.as_deref().is_some_and(|ha1| {
            digest::validate_challenge(
                headers,
                &self.digest.private_key,
                nonce_timeout,
                ha1,
                sequence,
            )
        });

        if verified {
            Ok(Some(self.record_successful_login(user).await?))
        } else {
            self.record_failed_login(user).await?;
            Ok(None)
        }
    }

    async fn hash_password(&self, password: &str) -> Result<(String, String), AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();

        // Argon2 is CPU-heavy; keep it off the async runtime.
        task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("hashing task panicked: {e}")))?
            .map_err(AuthError::from)
    }

    async fn check_password(
        &self,
        password: &str,
        hash: String,
        salt: String,
    ) -> Result<bool, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();

        task::spawn_blocking(move || hasher.verify(&password, &hash, &salt))
            .await
            .map_err(|e| AuthError::Internal(format!("verification task panicked: {e}")))
    }

    /// A lockout holds for `lockout_seconds` after `locked_date`; beyond the
    /// window the account may verify again (success then clears the lock).
    fn is_locked_out(&self, user: &UserIdentity) -> bool {
        let Some(locked) = user
            .locked_date
            .as_deref()
            .and_then(|d| chrono::DateTime::parse_from_rfc3339(d).ok())
        else {
            return false;
        };

        let elapsed = chrono::Utc::now().signed_duration_since(locked);
        elapsed.num_seconds() < self.security.lockout_seconds
    }

    async fn record_successful_login(
        &self,
        mut user: UserIdentity,
    ) -> Result<UserIdentity, AuthError> {
        let now = now_rfc3339();
        user.invalid_login_attempts = 0;
        user.locked_date = None;
        user.last_login_attempt = Some(now.clone());
        user.modified_date = Some(now);
        Ok(self.store.save_user(&user).await?)
    }

    async fn record_failed_login(&self, mut user: UserIdentity) -> Result<(), AuthError> {
        let now = now_rfc3339();
        user.invalid_login_attempts += 1;
        user.last_login_attempt = Some(now.clone());

        // Re-stamp whenever the threshold is met and no window is open, so
        // failures after an expired lockout open a fresh window instead of
        // leaving the stale timestamp in place.
        if user.invalid_login_attempts >= self.security.max_login_attempts
            && !self.is_locked_out(&user)
        {
            warn!(
                user_auth_id = ?user.id,
                attempts = user.invalid_login_attempts,
                "Account locked after repeated failed logins"
            );
            user.locked_date = Some(now.clone());
        }

        user.modified_date = Some(now);
        self.store.save_user(&user).await?;
        Ok(())
    }
}

fn validate_new_user(user: &UserIdentity, password: &str) -> Result<(), AuthError> {
    if !user.has_identity() {
        return Err(AuthError::Validation(
            "a username or email is required".into(),
        ));
    }
    if password.is_empty() {
        return Err(AuthError::Validation("a password is required".into()));
    }
    Ok(())
}

fn identity_keys(user: &UserIdentity) -> Vec<String> {
    user.user_name
        .iter()
        .chain(user.email.iter())
        .cloned()
        .collect()
}
