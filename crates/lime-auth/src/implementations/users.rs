//! User registry loaded from configuration.

use crate::{AuthError, UserStore};
use async_trait::async_trait;
use lime_config::UserEntry;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use subtle::ConstantTimeEq;

/// Users known at startup. Only password digests are kept in memory.
#[derive(Debug, Default)]
pub struct StaticUserStore {
	users: HashMap<String, [u8; 32]>,
}

impl StaticUserStore {
	pub fn from_entries(entries: &[UserEntry]) -> Self {
		let users = entries
			.iter()
			.map(|entry| (entry.username.clone(), digest(&entry.password)))
			.collect();
		Self { users }
	}

	pub fn len(&self) -> usize {
		self.users.len()
	}

	pub fn is_empty(&self) -> bool {
		self.users.is_empty()
	}
}

fn digest(password: &str) -> [u8; 32] {
	Sha256::digest(password.as_bytes()).into()
}

#[async_trait]
impl UserStore for StaticUserStore {
	async fn check_password(&self, username: &str, password: &str) -> Result<bool, AuthError> {
		let candidate = digest(password);
		// Unknown users still pay for a comparison
		let stored = self.users.get(username).copied().unwrap_or([0u8; 32]);
		let matches: bool = stored.ct_eq(&candidate).into();
		Ok(matches && self.users.contains_key(username))
	}
}
