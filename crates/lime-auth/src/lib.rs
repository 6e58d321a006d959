//! Caller authentication for the gateway.
//!
//! Users exchange a username and password for a signed bearer token. The
//! token doubles as the ownership key under which resolved transactions are
//! recorded, so verifying it is the only gate in front of per-caller data.

use async_trait::async_trait;
use lime_config::AuthConfig;
use lime_types::OwnershipToken;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod token;
	pub mod users;
}

pub use implementations::token::TokenAuthenticator;
pub use implementations::users::StaticUserStore;

/// Errors that can occur during authentication.
#[derive(Debug, Error)]
pub enum AuthError {
	#[error("invalid credentials")]
	InvalidCredentials,
	#[error("invalid token: {0}")]
	InvalidToken(String),
	#[error("token expired")]
	Expired,
	#[error("Signing error: {0}")]
	Signing(String),
	#[error("Backend error: {0}")]
	Backend(String),
}

/// Claims carried by an issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
	pub username: String,
	/// Expiry as unix seconds.
	pub exp: i64,
}

/// Trait defining the authenticator capability the gateway relies on.
#[async_trait]
pub trait AuthInterface: Send + Sync {
	/// Checks credentials and issues a fresh token.
	async fn authenticate(
		&self,
		username: &str,
		password: &str,
	) -> Result<OwnershipToken, AuthError>;

	/// Verifies signature and expiry of a token.
	async fn verify_token(&self, token: &OwnershipToken) -> Result<Claims, AuthError>;
}

/// Source of known users.
#[async_trait]
pub trait UserStore: Send + Sync {
	/// Returns whether the password matches the stored one for `username`.
	async fn check_password(&self, username: &str, password: &str) -> Result<bool, AuthError>;
}

/// Factory function to create the authenticator from configuration.
pub fn create_authenticator(config: &AuthConfig) -> Result<Arc<TokenAuthenticator>, AuthError> {
	let users = StaticUserStore::from_entries(&config.users);
	let authenticator = TokenAuthenticator::new(
		config.signing_key.as_bytes().to_vec(),
		config.token_ttl_minutes,
		Arc::new(users),
	)?;
	Ok(Arc::new(authenticator))
}
