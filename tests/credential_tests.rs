//! Credential lifecycle: create, update, password and lockout behavior.

use std::sync::Arc;

use credstore::config::{DigestConfig, SecurityConfig};
use credstore::crypto::Argon2Hasher;
use credstore::{AuthError, CredentialService, Store, UserIdentity};

async fn test_store() -> Store {
    let db_path =
        std::env::temp_dir().join(format!("credstore-cred-test-{}.db", uuid::Uuid::new_v4()));
    Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to open test store")
}

/// Low-cost argon2 so the test suite stays fast.
fn test_security() -> SecurityConfig {
    SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
        ..Default::default()
    }
}

fn service_with(store: Store, security: SecurityConfig) -> CredentialService {
    let hasher = Arc::new(Argon2Hasher::new(&security).expect("bad argon2 params"));
    CredentialService::new(store, hasher, security, DigestConfig::default())
}

fn service(store: Store) -> CredentialService {
    service_with(store, test_security())
}

fn alice() -> UserIdentity {
    UserIdentity {
        user_name: Some("alice".to_string()),
        email: Some("alice@x.com".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn create_then_verify_round_trips() {
    let service = service(test_store().await);

    let created = service.create_user(alice(), "pw1").await.unwrap();
    assert!(created.id.is_some());
    assert!(created.password_hash.is_some());
    assert!(created.salt.is_some());
    assert!(created.digest_ha1_hash.is_some());

    let by_name = service.verify_password("alice", "pw1").await.unwrap();
    assert_eq!(by_name.unwrap().user_name.as_deref(), Some("alice"));

    let by_email = service.verify_password("alice@x.com", "pw1").await.unwrap();
    assert_eq!(by_email.unwrap().email.as_deref(), Some("alice@x.com"));
}

#[tokio::test]
async fn missing_identity_or_password_is_a_validation_error() {
    let service = service(test_store().await);

    let err = service
        .create_user(UserIdentity::default(), "pw")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)));

    let err = service.create_user(alice(), "").await.unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)));
}

#[tokio::test]
async fn duplicate_username_and_email_are_rejected() {
    let service = service(test_store().await);
    service.create_user(alice(), "pw1").await.unwrap();

    let same_name = UserIdentity {
        user_name: Some("alice".to_string()),
        email: Some("other@x.com".to_string()),
        ..Default::default()
    };
    let err = service.create_user(same_name, "pw2").await.unwrap_err();
    assert!(matches!(err, AuthError::DuplicateUserName(ref v) if v == "alice"));

    let same_email = UserIdentity {
        user_name: Some("bob".to_string()),
        email: Some("alice@x.com".to_string()),
        ..Default::default()
    };
    let err = service.create_user(same_email, "pw2").await.unwrap_err();
    assert!(matches!(err, AuthError::DuplicateEmail(ref v) if v == "alice@x.com"));
}

#[tokio::test]
async fn updating_own_record_does_not_self_conflict() {
    let service = service(test_store().await);
    let created = service.create_user(alice(), "pw1").await.unwrap();

    // Same username and email, changed profile field only.
    let mut updated = created.clone();
    updated.display_name = Some("Alice A.".to_string());

    let saved = service.update_user(&created, updated, None).await.unwrap();
    assert_eq!(saved.id, created.id);
    assert_eq!(saved.display_name.as_deref(), Some("Alice A."));
}

#[tokio::test]
async fn wrong_password_records_failure_without_touching_credentials() {
    let store = test_store().await;
    let service = service(store.clone());
    let created = service.create_user(alice(), "pw1").await.unwrap();

    let result = service.verify_password("alice", "wrong").await.unwrap();
    assert!(result.is_none());

    let stored = store.get_user_by_name("alice").await.unwrap().unwrap();
    assert_eq!(stored.invalid_login_attempts, 1);
    assert_eq!(stored.password_hash, created.password_hash);
    assert_eq!(stored.salt, created.salt);
    assert!(stored.last_login_attempt.is_some());
}

#[tokio::test]
async fn successful_login_resets_failure_counter() {
    let store = test_store().await;
    let service = service(store.clone());
    service.create_user(alice(), "pw1").await.unwrap();

    assert!(service.verify_password("alice", "nope").await.unwrap().is_none());
    assert!(service.verify_password("alice", "pw1").await.unwrap().is_some());

    let stored = store.get_user_by_name("alice").await.unwrap().unwrap();
    assert_eq!(stored.invalid_login_attempts, 0);
    assert!(stored.locked_date.is_none());
}

#[tokio::test]
async fn repeated_failures_lock_the_account() {
    let store = test_store().await;
    let security = SecurityConfig {
        max_login_attempts: 2,
        ..test_security()
    };
    let service = service_with(store.clone(), security);
    service.create_user(alice(), "pw1").await.unwrap();

    assert!(service.verify_password("alice", "bad").await.unwrap().is_none());
    assert!(service.verify_password("alice", "bad").await.unwrap().is_none());

    let stored = store.get_user_by_name("alice").await.unwrap().unwrap();
    assert!(stored.locked_date.is_some());

    // Even the correct password fails while the lockout holds.
    assert!(service.verify_password("alice", "pw1").await.unwrap().is_none());
}

#[tokio::test]
async fn failures_after_an_expired_lockout_open_a_fresh_window() {
    let store = test_store().await;
    let security = SecurityConfig {
        max_login_attempts: 2,
        lockout_seconds: 1,
        ..test_security()
    };
    let service = service_with(store.clone(), security);
    service.create_user(alice(), "pw1").await.unwrap();

    assert!(service.verify_password("alice", "bad").await.unwrap().is_none());
    assert!(service.verify_password("alice", "bad").await.unwrap().is_none());
    let first_lock = store
        .get_user_by_name("alice")
        .await
        .unwrap()
        .unwrap()
        .locked_date
        .unwrap();

    // Let the window lapse, then keep failing: the lock must re-engage with
    // a fresh timestamp rather than staying stuck on the expired one.
    tokio::time::sleep(std::time::Duration::from_millis(1300)).await;
    assert!(service.verify_password("alice", "bad").await.unwrap().is_none());

    let relocked = store.get_user_by_name("alice").await.unwrap().unwrap();
    assert!(relocked.invalid_login_attempts > 2);
    assert_ne!(relocked.locked_date.as_deref(), Some(first_lock.as_str()));

    // And the re-engaged lock rejects even the correct password.
    assert!(service.verify_password("alice", "pw1").await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_account_fails_opaquely() {
    let service = service(test_store().await);
    assert!(service.verify_password("ghost", "pw").await.unwrap().is_none());
}

#[tokio::test]
async fn password_change_rederives_digest_hash() {
    let service = service(test_store().await);
    let created = service.create_user(alice(), "pw1").await.unwrap();
    let original_ha1 = created.digest_ha1_hash.clone().unwrap();

    let rehashed = service
        .update_user(&created, created.clone(), Some("pw2"))
        .await
        .unwrap();
    assert_ne!(rehashed.digest_ha1_hash.as_deref(), Some(original_ha1.as_str()));
    assert_ne!(rehashed.password_hash, created.password_hash);
}

#[tokio::test]
async fn profile_change_carries_digest_hash_over() {
    let service = service(test_store().await);
    let created = service.create_user(alice(), "pw1").await.unwrap();

    let mut updated = created.clone();
    updated.country = Some("NZ".to_string());

    let saved = service.update_user(&created, updated, None).await.unwrap();
    assert_eq!(saved.digest_ha1_hash, created.digest_ha1_hash);
    assert_eq!(saved.password_hash, created.password_hash);
    assert_eq!(saved.created_date, created.created_date);
}

#[tokio::test]
async fn rename_without_password_drops_digest_hash() {
    let service = service(test_store().await);
    let created = service.create_user(alice(), "pw1").await.unwrap();

    let mut renamed = created.clone();
    renamed.user_name = Some("alice2".to_string());

    // HA1 is bound to the username; without the plaintext it cannot follow a
    // rename and must not survive stale.
    let saved = service.update_user(&created, renamed, None).await.unwrap();
    assert!(saved.digest_ha1_hash.is_none());
}

#[tokio::test]
async fn verify_digest_accepts_a_valid_challenge() {
    use credstore::crypto::digest::{compute_ha1, generate_nonce};
    use digest_client::build_headers;

    let digest = DigestConfig {
        private_key: "server-key".to_string(),
        ..Default::default()
    };
    let store = test_store().await;
    let hasher = Arc::new(Argon2Hasher::new(&test_security()).expect("bad argon2 params"));
    let service = CredentialService::new(store, hasher, test_security(), digest.clone());
    service.create_user(alice(), "pw1").await.unwrap();

    let nonce = generate_nonce(&digest.private_key);
    let ha1 = compute_ha1("alice", &digest.realm, "pw1");
    let headers = build_headers("alice", &ha1, &nonce);

    let verified = service.verify_digest(&headers, "00000001").await.unwrap();
    assert!(verified.is_some());

    // Same challenge with a wrong stored password fails opaquely.
    let bad_headers = build_headers("alice", &compute_ha1("alice", &digest.realm, "bad"), &nonce);
    let rejected = service.verify_digest(&bad_headers, "00000001").await.unwrap();
    assert!(rejected.is_none());
}

/// Builds a client response the way an RFC 2617 client would.
mod digest_client {
    use std::collections::HashMap;

    pub fn build_headers(
        user: &str,
        ha1: &str,
        nonce: &str,
    ) -> HashMap<String, String> {
        let ha2 = md5_hex("GET:/secure");
        let response = md5_hex(&format!("{ha1}:{nonce}:00000001:cnonce:auth:{ha2}"));

        HashMap::from([
            ("username".to_string(), user.to_string()),
            ("nonce".to_string(), nonce.to_string()),
            ("uri".to_string(), "/secure".to_string()),
            ("method".to_string(), "GET".to_string()),
            ("qop".to_string(), "auth".to_string()),
            ("nc".to_string(), "00000001".to_string()),
            ("cnonce".to_string(), "cnonce".to_string()),
            ("response".to_string(), response),
        ])
    }

    fn md5_hex(input: &str) -> String {
        use md5::{Digest, Md5};
        let mut hasher = Md5::new();
        hasher.update(input.as_bytes());
        hex::encode(hasher.finalize())
    }
}
