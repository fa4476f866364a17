//! credstore is an embedded authentication-record repository: it persists
//! user identities, external-login (OAuth-style) links and API keys in a
//! SQLite store and answers credential and session-reconciliation queries
//! against them.
//!
//! The storage engine, password hashing and digest validation are
//! collaborators behind narrow seams ([`db::Store`], [`crypto::PasswordHasher`],
//! [`crypto::digest`]); the services on top implement the actual contract:
//! [`services::CredentialService`] for credential verification and
//! [`services::SessionService`] for session reconciliation.

pub mod cli;
pub mod config;
pub mod constants;
pub mod crypto;
pub mod db;
pub mod entities;
pub mod error;
pub mod models;
pub mod registration_lock;
pub mod services;

pub use config::Config;
pub use db::Store;
pub use error::AuthError;
pub use models::{ApiKey, AuthSession, AuthTokens, ExternalLogin, UserIdentity};
pub use services::{CredentialService, SessionService};
