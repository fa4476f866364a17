//! Digest-auth collaborator (RFC 2617).
//!
//! The stored credential is HA1 = md5(user:realm:password), precomputed when
//! the password or username changes. Nonces are opaque to clients:
//! `base64(ts_hex ":" md5(ts_hex ":" private_key))`, so the server can check
//! both authenticity and age without keeping nonce state.

use std::collections::HashMap;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use md5::{Digest, Md5};

fn md5_hex(input: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// HA1 for digest auth. Must be recomputed whenever the username or the
/// plaintext password changes.
pub fn compute_ha1(user_name: &str, realm: &str, password: &str) -> String {
    md5_hex(&format!("{user_name}:{realm}:{password}"))
}

/// Mints a nonce bound to `private_key` and the current time.
pub fn generate_nonce(private_key: &str) -> String {
    let ts_hex = format!("{:x}", chrono::Utc::now().timestamp());
    let signature = md5_hex(&format!("{ts_hex}:{private_key}"));
    BASE64.encode(format!("{ts_hex}:{signature}"))
}

/// Parsed challenge response fields, pulled out of the auth header map.
#[derive(Debug, Clone)]
pub struct DigestChallenge {
    pub user_name: String,
    pub nonce: String,
    pub uri: String,
    pub response: String,
    pub method: String,
    pub qop: String,
    pub nc: String,
    pub cnonce: String,
}

impl DigestChallenge {
    /// Returns `None` when a mandatory field is missing. `qop`, `nc` and
    /// `cnonce` are optional (absent outside auth-int/auth negotiation).
    pub fn from_headers(headers: &HashMap<String, String>) -> Option<Self> {
        let field = |key: &str| headers.get(key).cloned();

        Some(Self {
            user_name: field("username")?,
            nonce: field("nonce")?,
            uri: field("uri")?,
            response: field("response")?,
            method: field("method")?,
            qop: field("qop").unwrap_or_default(),
            nc: field("nc").unwrap_or_default(),
            cnonce: field("cnonce").unwrap_or_default(),
        })
    }
}

/// Checks the nonce was minted by us and is younger than `timeout`.
fn nonce_is_valid(nonce: &str, private_key: &str, timeout: Duration) -> bool {
    let Ok(decoded) = BASE64.decode(nonce) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };
    let Some((ts_hex, signature)) = decoded.split_once(':') else {
        return false;
    };

    if md5_hex(&format!("{ts_hex}:{private_key}")) != signature {
        return false;
    }

    let Ok(minted_at) = i64::from_str_radix(ts_hex, 16) else {
        return false;
    };

    let age = chrono::Utc::now().timestamp() - minted_at;
    age >= 0 && age as u64 <= timeout.as_secs()
}

/// Validates a challenge response against a stored HA1.
///
/// `sequence` is the nonce count the server expects for this exchange; it is
/// only enforced when the client negotiated a qop.
pub fn validate_challenge(
    headers: &HashMap<String, String>,
    private_key: &str,
    nonce_timeout: Duration,
    stored_ha1: &str,
    sequence: &str,
) -> bool {
    let Some(challenge) = DigestChallenge::from_headers(headers) else {
        return false;
    };

    if !nonce_is_valid(&challenge.nonce, private_key, nonce_timeout) {
        return false;
    }

    let ha2 = md5_hex(&format!("{}:{}", challenge.method, challenge.uri));

    let expected = if challenge.qop.is_empty() {
        md5_hex(&format!("{stored_ha1}:{}:{ha2}", challenge.nonce))
    } else {
        if challenge.nc != sequence {
            return false;
        }
        md5_hex(&format!(
            "{stored_ha1}:{}:{}:{}:{}:{ha2}",
            challenge.nonce, challenge.nc, challenge.cnonce, challenge.qop
        ))
    };

    expected == challenge.response.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::digest::INITIAL_SEQUENCE;

    const PRIVATE_KEY: &str = "server-secret";
    const REALM: &str = "credstore";

    fn challenge_headers(user: &str, password: &str, nonce: &str) -> HashMap<String, String> {
        let ha1 = compute_ha1(user, REALM, password);
        let ha2 = md5_hex("GET:/protected");
        let response = md5_hex(&format!(
            "{ha1}:{nonce}:{INITIAL_SEQUENCE}:client-nonce:auth:{ha2}"
        ));

        HashMap::from([
            ("username".to_string(), user.to_string()),
            ("nonce".to_string(), nonce.to_string()),
            ("uri".to_string(), "/protected".to_string()),
            ("method".to_string(), "GET".to_string()),
            ("qop".to_string(), "auth".to_string()),
            ("nc".to_string(), INITIAL_SEQUENCE.to_string()),
            ("cnonce".to_string(), "client-nonce".to_string()),
            ("response".to_string(), response),
        ])
    }

    #[test]
    fn valid_challenge_passes() {
        let nonce = generate_nonce(PRIVATE_KEY);
        let headers = challenge_headers("alice", "pw1", &nonce);
        let ha1 = compute_ha1("alice", REALM, "pw1");

        assert!(validate_challenge(
            &headers,
            PRIVATE_KEY,
            Duration::from_secs(600),
            &ha1,
            INITIAL_SEQUENCE,
        ));
    }

    #[test]
    fn wrong_password_fails() {
        let nonce = generate_nonce(PRIVATE_KEY);
        let headers = challenge_headers("alice", "wrong", &nonce);
        let ha1 = compute_ha1("alice", REALM, "pw1");

        assert!(!validate_challenge(
            &headers,
            PRIVATE_KEY,
            Duration::from_secs(600),
            &ha1,
            INITIAL_SEQUENCE,
        ));
    }

    #[test]
    fn foreign_nonce_fails() {
        let nonce = generate_nonce("some-other-key");
        let headers = challenge_headers("alice", "pw1", &nonce);
        let ha1 = compute_ha1("alice", REALM, "pw1");

        assert!(!validate_challenge(
            &headers,
            PRIVATE_KEY,
            Duration::from_secs(600),
            &ha1,
            INITIAL_SEQUENCE,
        ));
    }

    #[test]
    fn expired_nonce_fails() {
        let ts_hex = format!("{:x}", chrono::Utc::now().timestamp() - 7200);
        let signature = md5_hex(&format!("{ts_hex}:{PRIVATE_KEY}"));
        let nonce = BASE64.encode(format!("{ts_hex}:{signature}"));

        let headers = challenge_headers("alice", "pw1", &nonce);
        let ha1 = compute_ha1("alice", REALM, "pw1");

        assert!(!validate_challenge(
            &headers,
            PRIVATE_KEY,
            Duration::from_secs(600),
            &ha1,
            INITIAL_SEQUENCE,
        ));
    }

    #[test]
    fn sequence_mismatch_fails() {
        let nonce = generate_nonce(PRIVATE_KEY);
        let headers = challenge_headers("alice", "pw1", &nonce);
        let ha1 = compute_ha1("alice", REALM, "pw1");

        assert!(!validate_challenge(
            &headers,
            PRIVATE_KEY,
            Duration::from_secs(600),
            &ha1,
            "00000002",
        ));
    }

    #[test]
    fn ha1_depends_on_user_realm_and_password() {
        let base = compute_ha1("alice", REALM, "pw1");
        assert_ne!(base, compute_ha1("bob", REALM, "pw1"));
        assert_ne!(base, compute_ha1("alice", "other", "pw1"));
        assert_ne!(base, compute_ha1("alice", REALM, "pw2"));
    }
}
