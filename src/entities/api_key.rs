use sea_orm::entity::prelude::*;

/// API key credential. The key string itself is the primary key; cancellation
/// is a soft delete via `cancelled_date`, keys are never removed.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "api_key")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_auth_id: String,

    /// Deployment environment the key is scoped to, e.g. "live" or "test".
    pub environment: Option<String>,

    pub key_type: Option<String>,

    pub created_date: String,

    /// RFC3339. Unset means the key never expires.
    pub expiry_date: Option<String>,

    /// RFC3339. Set when the key is cancelled; an active key has this unset.
    pub cancelled_date: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
