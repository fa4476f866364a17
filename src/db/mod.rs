use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::AuthError;
use crate::models::{ApiKey, ExternalLogin, UserIdentity};
use crate::registration_lock::RegistrationLock;

pub mod migrator;
pub mod repositories;

/// Tables every operation assumes to exist.
const REQUIRED_TABLES: &[&str] = &["user_identity", "external_login", "api_key"];

/// Shared storage handle over the three auth collections. Cheap to clone;
/// many concurrent callers share one connection pool and one registration
/// lock.
#[derive(Clone, Debug)]
pub struct Store {
    pub conn: DatabaseConnection,
    registration_lock: RegistrationLock,
}

impl Store {
    /// Connects and creates any missing tables and indexes.
    pub async fn new(db_url: &str) -> Result<Self, AuthError> {
        Self::connect(db_url, true).await
    }

    /// Connects with an explicit auto-creation choice. With auto-creation
    /// disabled, missing tables are a fatal configuration error.
    pub async fn connect(db_url: &str, auto_create_schema: bool) -> Result<Self, AuthError> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .map_err(|e| AuthError::Internal(e.to_string()))?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(5)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        if auto_create_schema {
            migrator::Migrator::up(&conn, None).await?;
            info!("Store connected, schema ensured");
        } else {
            Self::verify_schema(&conn).await?;
            info!("Store connected, schema verified");
        }

        Ok(Self {
            conn,
            registration_lock: RegistrationLock::new(),
        })
    }

    async fn verify_schema(conn: &DatabaseConnection) -> Result<(), AuthError> {
        let backend = conn.get_database_backend();

        for table in REQUIRED_TABLES {
            let stmt = Statement::from_sql_and_values(
                backend,
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
                [(*table).into()],
            );
            if conn.query_one(stmt).await?.is_none() {
                return Err(AuthError::Configuration(format!(
                    "required table '{table}' is missing and schema auto-creation is disabled"
                )));
            }
        }

        Ok(())
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    /// Drops and recreates all three collections.
    pub async fn clear_all(&self) -> Result<()> {
        use sea_orm_migration::MigratorTrait;

        migrator::Migrator::fresh(&self.conn).await?;
        info!("Store cleared: all auth collections dropped and recreated");
        Ok(())
    }

    /// Serializes writers that are about to claim identity keys.
    #[must_use]
    pub const fn registration_lock(&self) -> &RegistrationLock {
        &self.registration_lock
    }

    fn identity_repo(&self) -> repositories::identity::IdentityRepository {
        repositories::identity::IdentityRepository::new(self.conn.clone())
    }

    fn external_login_repo(&self) -> repositories::external_login::ExternalLoginRepository {
        repositories::external_login::ExternalLoginRepository::new(self.conn.clone())
    }

    fn api_key_repo(&self) -> repositories::api_key::ApiKeyRepository {
        repositories::api_key::ApiKeyRepository::new(self.conn.clone())
    }

    // Identity collection

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<UserIdentity>> {
        self.identity_repo().get_by_id(id).await
    }

    pub async fn get_user_by_name(&self, user_name_or_email: &str) -> Result<Option<UserIdentity>> {
        self.identity_repo()
            .get_by_user_name_or_email(user_name_or_email)
            .await
    }

    pub async fn assert_no_conflict(
        &self,
        user_name: Option<&str>,
        email: Option<&str>,
        except_id: Option<i32>,
    ) -> Result<(), AuthError> {
        self.identity_repo()
            .assert_no_conflict(user_name, email, except_id)
            .await
    }

    pub async fn save_user(&self, user: &UserIdentity) -> Result<UserIdentity> {
        self.identity_repo().save(user).await
    }

    /// Deletes the identity and every external-login link referencing it.
    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        let links_removed = self.external_login_repo().delete_for_user(id).await?;
        let removed = self.identity_repo().delete_by_id(id).await?;
        if removed {
            info!(user_auth_id = id, links_removed, "Deleted user identity");
        }
        Ok(removed)
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.identity_repo().count().await
    }

    // External-login collection

    pub async fn get_external_login(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Option<ExternalLogin>> {
        self.external_login_repo()
            .get_by_provider(provider, provider_user_id)
            .await
    }

    pub async fn list_user_logins(&self, user_auth_id: i32) -> Result<Vec<ExternalLogin>> {
        self.external_login_repo().list_for_user(user_auth_id).await
    }

    pub async fn save_external_login(&self, link: &ExternalLogin) -> Result<ExternalLogin> {
        self.external_login_repo().save(link).await
    }

    // Api-key collection

    pub async fn api_key_exists(&self, id: &str) -> Result<bool> {
        self.api_key_repo().exists(id).await
    }

    pub async fn get_api_key(&self, id: &str) -> Result<Option<ApiKey>> {
        self.api_key_repo().get(id).await
    }

    pub async fn get_active_api_keys(&self, user_auth_id: &str) -> Result<Vec<ApiKey>> {
        let now = crate::models::now_rfc3339();
        self.api_key_repo()
            .list_active_for_user(user_auth_id, &now)
            .await
    }

    pub async fn store_api_keys(&self, keys: &[ApiKey]) -> Result<()> {
        self.api_key_repo().upsert_batch(keys).await
    }

    pub async fn cancel_api_key(&self, id: &str) -> Result<bool> {
        self.api_key_repo().cancel(id).await
    }
}
