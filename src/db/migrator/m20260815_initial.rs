use crate::entities::prelude::*;
use crate::entities::{api_key, external_login};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        // Unique user_name / email constraints come from the entity columns.
        manager
            .create_table(
                schema
                    .create_table_from_entity(UserIdentities)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ExternalLogins)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ApiKeys)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // At most one link per (provider, provider_user_id); this is the
        // storage-level winner guarantee for concurrent callbacks.
        manager
            .create_index(
                Index::create()
                    .name("idx_external_login_provider_key")
                    .table(ExternalLogins)
                    .col(external_login::Column::Provider)
                    .col(external_login::Column::ProviderUserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Back-reference lookups for cascade delete and session loading.
        manager
            .create_index(
                Index::create()
                    .name("idx_external_login_user_auth_id")
                    .table(ExternalLogins)
                    .col(external_login::Column::UserAuthId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_api_key_user_auth_id")
                    .table(ApiKeys)
                    .col(api_key::Column::UserAuthId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApiKeys).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ExternalLogins).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserIdentities).to_owned())
            .await?;

        Ok(())
    }
}
