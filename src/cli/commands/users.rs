//! User administration commands.

use std::sync::Arc;

use crate::config::Config;
use crate::crypto::Argon2Hasher;
use crate::db::Store;
use crate::models::UserIdentity;
use crate::services::{CredentialService, SessionService};

async fn open_store(config: &Config) -> anyhow::Result<Store> {
    Ok(Store::connect(
        &config.general.database_path,
        config.general.auto_create_schema,
    )
    .await?)
}

fn credential_service(config: &Config, store: Store) -> anyhow::Result<CredentialService> {
    let hasher = Arc::new(Argon2Hasher::new(&config.security)?);
    Ok(CredentialService::new(
        store,
        hasher,
        config.security.clone(),
        config.digest.clone(),
    ))
}

pub async fn cmd_create_user(
    config: &Config,
    username: Option<String>,
    email: Option<String>,
    password: &str,
    display_name: Option<String>,
) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let service = credential_service(config, store)?;

    let user = UserIdentity {
        user_name: username,
        email,
        display_name,
        ..Default::default()
    };

    let created = service.create_user(user, password).await?;
    println!(
        "Created user {} ({})",
        created.id.unwrap_or_default(),
        created
            .user_name
            .or(created.email)
            .unwrap_or_else(|| "<unnamed>".to_string())
    );
    Ok(())
}

pub async fn cmd_verify(config: &Config, user: &str, password: &str) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let service = credential_service(config, store)?;

    match service.verify_password(user, password).await? {
        Some(user) => {
            println!("OK: authenticated as user {}", user.id.unwrap_or_default());
        }
        None => {
            println!("Authentication failed");
        }
    }
    Ok(())
}

pub async fn cmd_show_user(config: &Config, user: &str) -> anyhow::Result<()> {
    let store = open_store(config).await?;

    let found = match user.parse::<i32>() {
        Ok(id) => store.get_user_by_id(id).await?,
        Err(_) => store.get_user_by_name(user).await?,
    };

    let Some(found) = found else {
        println!("No such user: {user}");
        return Ok(());
    };

    println!("Id:            {}", found.id.unwrap_or_default());
    println!("Username:      {}", found.user_name.as_deref().unwrap_or("-"));
    println!("Email:         {}", found.email.as_deref().unwrap_or("-"));
    println!("Display name:  {}", found.display_name.as_deref().unwrap_or("-"));
    println!("Created:       {}", found.created_date.as_deref().unwrap_or("-"));
    println!("Modified:      {}", found.modified_date.as_deref().unwrap_or("-"));
    println!("Failed logins: {}", found.invalid_login_attempts);
    if let Some(locked) = &found.locked_date {
        println!("Locked since:  {locked}");
    }

    if let Some(id) = found.id {
        let links = store.list_user_logins(id).await?;
        if links.is_empty() {
            println!("External logins: none");
        } else {
            println!("External logins:");
            for link in links {
                println!("  {} / {}", link.provider, link.provider_user_id);
            }
        }
    }
    Ok(())
}

pub async fn cmd_delete_user(config: &Config, id: i32) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let service = SessionService::new(store);

    service.delete_user(id).await?;
    println!("Deleted user {id} and its external logins");
    Ok(())
}
