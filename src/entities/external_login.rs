use sea_orm::entity::prelude::*;

/// One row per (provider, provider user id) pair. `user_auth_id` is a
/// non-owning back-reference to the owning `user_identity` row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "external_login")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Provider key, e.g. "google". Unique together with `provider_user_id`
    /// (composite index created by the migrator).
    pub provider: String,

    pub provider_user_id: String,

    pub user_auth_id: i32,

    pub access_token: Option<String>,
    pub access_token_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub request_token: Option<String>,

    pub user_name: Option<String>,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,

    /// Provider extras as a JSON object string.
    pub items: Option<String>,

    pub created_date: String,

    pub modified_date: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
