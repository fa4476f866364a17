pub mod api_key;
pub mod external_login;
pub mod identity;
