//! Admin command-line interface over the repository.

mod commands;

use clap::{Parser, Subcommand};

use crate::config::Config;

/// credstore - embedded authentication-record repository
#[derive(Parser)]
#[command(name = "credstore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a user identity with a password
    CreateUser {
        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        password: String,

        #[arg(long)]
        display_name: Option<String>,
    },

    /// Verify a password against a stored identity
    Verify {
        /// Username or email
        user: String,

        password: String,
    },

    /// Show a stored identity and its external-login links
    ShowUser {
        /// Username, email, or numeric id
        user: String,
    },

    /// Delete an identity, cascading to its external-login links
    DeleteUser {
        id: i32,
    },

    /// List a user's active API keys
    ListKeys {
        user_id: String,
    },

    /// Generate and store fresh API keys for a user
    GenerateKeys {
        user_id: String,

        #[arg(long, default_value_t = 1)]
        count: usize,
    },

    /// Drop and recreate all auth collections
    Reset,
}

pub async fn run_command(cli: Cli, config: &Config) -> anyhow::Result<()> {
    match cli.command {
        Commands::CreateUser {
            username,
            email,
            password,
            display_name,
        } => commands::cmd_create_user(config, username, email, &password, display_name).await,
        Commands::Verify { user, password } => commands::cmd_verify(config, &user, &password).await,
        Commands::ShowUser { user } => commands::cmd_show_user(config, &user).await,
        Commands::DeleteUser { id } => commands::cmd_delete_user(config, id).await,
        Commands::ListKeys { user_id } => commands::cmd_list_keys(config, &user_id).await,
        Commands::GenerateKeys { user_id, count } => {
            commands::cmd_generate_keys(config, &user_id, count).await
        }
        Commands::Reset => commands::cmd_reset(config).await,
    }
}
