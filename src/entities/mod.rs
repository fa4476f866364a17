pub mod prelude;

pub mod api_key;
pub mod external_login;
pub mod user_identity;
