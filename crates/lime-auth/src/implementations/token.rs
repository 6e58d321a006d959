//! HS256 token issuance and verification.
//!
//! Tokens have the familiar `header.claims.signature` shape with each part
//! base64url encoded without padding. The signing key lives in a key ring
//! that can be rotated at runtime; tokens signed with the previous key stay
//! valid until they expire.

use crate::{AuthError, AuthInterface, Claims, UserStore};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use lime_types::OwnershipToken;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{debug, info};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
	alg: String,
	typ: String,
}

struct KeyRing {
	current: Vec<u8>,
	previous: Option<Vec<u8>>,
}

impl KeyRing {
	fn keys(&self) -> impl Iterator<Item = &[u8]> {
		std::iter::once(self.current.as_slice()).chain(self.previous.as_deref())
	}
}

/// Authenticator issuing HMAC-signed tokens for users of a [`UserStore`].
pub struct TokenAuthenticator {
	keys: ArcSwap<KeyRing>,
	ttl: chrono::Duration,
	users: Arc<dyn UserStore>,
}

impl TokenAuthenticator {
	pub fn new(
		signing_key: Vec<u8>,
		ttl_minutes: u64,
		users: Arc<dyn UserStore>,
	) -> Result<Self, AuthError> {
		if signing_key.is_empty() {
			return Err(AuthError::Signing("signing key must not be empty".to_string()));
		}
		let ttl = i64::try_from(ttl_minutes)
			.ok()
			.and_then(chrono::Duration::try_minutes)
			.ok_or_else(|| {
				AuthError::Signing(format!("token lifetime too large: {}", ttl_minutes))
			})?;

		Ok(Self {
			keys: ArcSwap::from_pointee(KeyRing {
				current: signing_key,
				previous: None,
			}),
			ttl,
			users,
		})
	}

	/// Replaces the signing key. The outgoing key keeps verifying tokens it
	/// signed; the one before it is dropped.
	pub fn rotate_key(&self, new_key: Vec<u8>) -> Result<(), AuthError> {
		if new_key.is_empty() {
			return Err(AuthError::Signing("signing key must not be empty".to_string()));
		}
		self.keys.rcu(|ring| KeyRing {
			current: new_key.clone(),
			previous: Some(ring.current.clone()),
		});
		info!("Signing key rotated");
		Ok(())
	}

	fn mac(key: &[u8]) -> Result<HmacSha256, AuthError> {
		HmacSha256::new_from_slice(key).map_err(|e| AuthError::Signing(e.to_string()))
	}

	fn encode_json<T: Serialize>(value: &T) -> Result<String, AuthError> {
		let bytes = serde_json::to_vec(value).map_err(|e| AuthError::Signing(e.to_string()))?;
		Ok(URL_SAFE_NO_PAD.encode(bytes))
	}

	fn decode_part(part: &str) -> Result<Vec<u8>, AuthError> {
		URL_SAFE_NO_PAD
			.decode(part)
			.map_err(|e| AuthError::InvalidToken(format!("bad encoding: {}", e)))
	}

	fn sign(&self, claims: &Claims) -> Result<OwnershipToken, AuthError> {
		let header = Header {
			alg: ALGORITHM.to_string(),
			typ: "JWT".to_string(),
		};
		let signing_input = format!(
			"{}.{}",
			Self::encode_json(&header)?,
			Self::encode_json(claims)?
		);

		let ring = self.keys.load();
		let mut mac = Self::mac(&ring.current)?;
		mac.update(signing_input.as_bytes());
		let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

		Ok(OwnershipToken::new(format!("{}.{}", signing_input, signature)))
	}

	fn verify(&self, token: &str) -> Result<Claims, AuthError> {
		let parts: Vec<&str> = token.split('.').collect();
		let (header, claims, signature) = match parts.as_slice() {
			[header, claims, signature] => (*header, *claims, *signature),
			_ => return Err(AuthError::InvalidToken("malformed token".to_string())),
		};

		let parsed: Header = serde_json::from_slice(&Self::decode_part(header)?)
			.map_err(|e| AuthError::InvalidToken(format!("bad header: {}", e)))?;
		if parsed.alg != ALGORITHM {
			return Err(AuthError::InvalidToken(format!(
				"unexpected signing method: {}",
				parsed.alg
			)));
		}

		let signature = Self::decode_part(signature)?;
		let signing_input = &token[..header.len() + 1 + claims.len()];
		let ring = self.keys.load();
		let mut verified = false;
		for key in ring.keys() {
			let mut mac = Self::mac(key)?;
			mac.update(signing_input.as_bytes());
			if mac.verify_slice(&signature).is_ok() {
				verified = true;
				break;
			}
		}
		if !verified {
			return Err(AuthError::InvalidToken("signature mismatch".to_string()));
		}

		let claims: Claims = serde_json::from_slice(&Self::decode_part(claims)?)
			.map_err(|e| AuthError::InvalidToken(format!("bad claims: {}", e)))?;
		if claims.exp <= chrono::Utc::now().timestamp() {
			return Err(AuthError::Expired);
		}

		Ok(claims)
	}
}

#[async_trait]
impl AuthInterface for TokenAuthenticator {
	async fn authenticate(
		&self,
		username: &str,
		password: &str,
	) -> Result<OwnershipToken, AuthError> {
		if username.is_empty() || password.is_empty() {
			return Err(AuthError::InvalidCredentials);
		}
		if !self.users.check_password(username, password).await? {
			debug!(username, "Rejected credentials");
			return Err(AuthError::InvalidCredentials);
		}

		let expires_at = chrono::Utc::now()
			.checked_add_signed(self.ttl)
			.ok_or_else(|| AuthError::Signing("token expiry out of range".to_string()))?;
		let claims = Claims {
			username: username.to_string(),
			exp: expires_at.timestamp(),
		};
		self.sign(&claims)
	}

	async fn verify_token(&self, token: &OwnershipToken) -> Result<Claims, AuthError> {
		self.verify(token.as_str())
	}
}
