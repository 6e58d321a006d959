//! Configuration types for the gateway.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete gateway configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimeConfig {
	/// HTTP listener settings
	#[serde(default)]
	pub server: ServerConfig,
	/// Upstream Ethereum node
	pub upstream: UpstreamConfig,
	/// Cache store backend
	#[serde(default)]
	pub storage: StorageConfig,
	/// Background cache writer
	#[serde(default)]
	pub cache: CacheConfig,
	/// Token issuance and known users
	pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
	#[serde(default = "default_host")]
	pub host: String,
	#[serde(default = "default_port")]
	pub port: u16,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: default_host(),
			port: default_port(),
			log_level: default_log_level(),
		}
	}
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
	/// HTTP JSON-RPC endpoint of the Ethereum node
	pub rpc_url: String,
	/// Per-call timeout applied to upstream queries
	#[serde(default = "default_request_timeout_secs")]
	pub request_timeout_secs: u64,
}

/// Which cache store backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
	#[default]
	Memory,
	File,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StorageConfig {
	#[serde(default)]
	pub backend: StorageBackend,
	/// Base directory, required for the file backend
	pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
	/// Upper bound for a single detached cache write
	#[serde(default = "default_write_timeout_ms")]
	pub write_timeout_ms: u64,
}

impl Default for CacheConfig {
	fn default() -> Self {
		Self {
			write_timeout_ms: default_write_timeout_ms(),
		}
	}
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
	/// HMAC key used to sign tokens
	pub signing_key: String,
	#[serde(default = "default_token_ttl_minutes")]
	pub token_ttl_minutes: u64,
	#[serde(default)]
	pub users: Vec<UserEntry>,
}

/// A user allowed to authenticate.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserEntry {
	pub username: String,
	pub password: String,
}

fn default_host() -> String {
	"127.0.0.1".to_string()
}

fn default_port() -> u16 {
	31337
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_request_timeout_secs() -> u64 {
	30
}

fn default_write_timeout_ms() -> u64 {
	2000
}

fn default_token_ttl_minutes() -> u64 {
	666
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_fill_optional_sections() {
		let toml = r#"
[upstream]
rpc_url = "http://localhost:8545"

[auth]
signing_key = "0123456789abcdef0123456789abcdef"
"#;
		let config: LimeConfig = toml::from_str(toml).unwrap();
		assert_eq!(config.server.port, 31337);
		assert_eq!(config.server.host, "127.0.0.1");
		assert_eq!(config.storage.backend, StorageBackend::Memory);
		assert_eq!(config.cache.write_timeout_ms, 2000);
		assert_eq!(config.auth.token_ttl_minutes, 666);
		assert_eq!(config.upstream.request_timeout_secs, 30);
		assert!(config.auth.users.is_empty());
	}

	#[test]
	fn test_storage_backend_serialization() {
		let json = serde_json::to_string(&StorageBackend::File).unwrap();
		assert_eq!(json, "\"file\"");
	}
}
