use crate::config::Config;
use crate::db::Store;

pub async fn cmd_reset(config: &Config) -> anyhow::Result<()> {
    let store = Store::connect(
        &config.general.database_path,
        config.general.auto_create_schema,
    )
    .await?;

    store.clear_all().await?;
    println!("All auth collections dropped and recreated");
    Ok(())
}
