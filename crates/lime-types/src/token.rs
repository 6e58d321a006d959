use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque string correlating cached records to a caller identity.
///
/// Issued by the authenticator; the rest of the system never looks inside.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnershipToken(String);

impl OwnershipToken {
	pub fn new(token: impl Into<String>) -> Self {
		Self(token.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn into_inner(self) -> String {
		self.0
	}
}

impl fmt::Display for OwnershipToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

// Tokens are bearer credentials; keep them out of debug logs.
impl fmt::Debug for OwnershipToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let prefix: String = self.0.chars().take(6).collect();
		write!(f, "OwnershipToken({}..)", prefix)
	}
}

impl From<String> for OwnershipToken {
	fn from(value: String) -> Self {
		Self(value)
	}
}
