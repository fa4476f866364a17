//! API key administration commands.

use crate::config::Config;
use crate::constants::keys::{DEFAULT_ENVIRONMENT, DEFAULT_KEY_TYPE};
use crate::db::Store;
use crate::models::{ApiKey, now_rfc3339};

/// Random API key (64 character hex string).
#[must_use]
pub fn generate_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

pub async fn cmd_list_keys(config: &Config, user_id: &str) -> anyhow::Result<()> {
    let store = Store::connect(
        &config.general.database_path,
        config.general.auto_create_schema,
    )
    .await?;

    let keys = store.get_active_api_keys(user_id).await?;
    if keys.is_empty() {
        println!("No active API keys for user {user_id}");
        return Ok(());
    }

    println!("Active API keys for user {user_id}:");
    for key in keys {
        println!(
            "  {}  env={}  expires={}",
            key.id,
            key.environment.as_deref().unwrap_or("-"),
            key.expiry_date.as_deref().unwrap_or("never"),
        );
    }
    Ok(())
}

pub async fn cmd_generate_keys(config: &Config, user_id: &str, count: usize) -> anyhow::Result<()> {
    let store = Store::connect(
        &config.general.database_path,
        config.general.auto_create_schema,
    )
    .await?;

    let now = now_rfc3339();
    let keys: Vec<ApiKey> = (0..count)
        .map(|_| ApiKey {
            id: generate_key(),
            user_auth_id: user_id.to_string(),
            environment: Some(DEFAULT_ENVIRONMENT.to_string()),
            key_type: Some(DEFAULT_KEY_TYPE.to_string()),
            created_date: Some(now.clone()),
            expiry_date: None,
            cancelled_date: None,
        })
        .collect();

    store.store_api_keys(&keys).await?;

    println!("Generated {} key(s) for user {user_id}:", keys.len());
    for key in keys {
        println!("  {}", key.id);
    }
    Ok(())
}
