//! Domain models, decoupled from the storage entities.
//!
//! Records that live in the store carry `id: Option<i32>`: `None` means the
//! surrogate key has not been assigned yet and a save must insert, `Some`
//! means update-by-key. No zero-value sentinels.

pub mod api_key;
pub mod external_login;
pub mod session;
pub mod user;

pub use api_key::ApiKey;
pub use external_login::ExternalLogin;
pub use session::{AuthSession, AuthTokens};
pub use user::UserIdentity;

/// Timestamp convention for every stored date field.
#[must_use]
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Fills `target` from `source` only when `target` is currently unset.
pub(crate) fn fill_missing(target: &mut Option<String>, source: Option<&String>) {
    if target.is_none()
        && let Some(value) = source
    {
        *target = Some(value.clone());
    }
}
