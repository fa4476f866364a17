pub use super::api_key::Entity as ApiKeys;
pub use super::external_login::Entity as ExternalLogins;
pub use super::user_identity::Entity as UserIdentities;
