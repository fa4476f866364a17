use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_identity")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Unique when present. A username containing '@' is unreachable through
    /// the name-or-email resolver, which routes such input to `email`.
    #[sea_orm(unique)]
    pub user_name: Option<String>,

    #[sea_orm(unique)]
    pub email: Option<String>,

    /// Argon2id PHC string.
    pub password_hash: Option<String>,

    /// Salt used for `password_hash`, stored alongside the PHC string.
    pub salt: Option<String>,

    /// Precomputed HA1 for digest auth, tied to (`user_name`, realm, password).
    pub digest_ha1_hash: Option<String>,

    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub country: Option<String>,
    pub phone_number: Option<String>,
    pub profile_url: Option<String>,

    pub invalid_login_attempts: i32,

    /// RFC3339, stamped on every verification attempt.
    pub last_login_attempt: Option<String>,

    /// RFC3339, set when the failure counter reaches the configured maximum.
    pub locked_date: Option<String>,

    pub created_date: String,

    pub modified_date: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
