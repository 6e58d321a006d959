//! Configuration loading for the Lime gateway.
//!
//! Files may be TOML, JSON or YAML (chosen by extension). `${VAR}` references
//! are substituted from the environment before parsing, then `LIME_`-prefixed
//! environment variables override individual settings.

use regex::Regex;
use std::collections::HashSet;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

pub mod types;

pub use types::*;

/// Minimum length of the token signing key, in bytes.
pub const MIN_SIGNING_KEY_LEN: usize = 32;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
	Toml,
	Json,
	Yaml,
}

impl ConfigFormat {
	pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
		match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Ok(ConfigFormat::Toml),
			Some("json") => Ok(ConfigFormat::Json),
			Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
			_ => Err(ConfigError::ParseError(format!(
				"Unsupported config format: {}",
				path.display()
			))),
		}
	}
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "LIME_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<LimeConfig, ConfigError> {
		let file_path = self.file_path.as_ref().ok_or_else(|| {
			ConfigError::FileNotFound("No configuration file specified".to_string())
		})?;

		let path = Path::new(file_path);
		if !path.exists() {
			return Err(ConfigError::FileNotFound(file_path.clone()));
		}

		let format = ConfigFormat::from_path(path)?;
		let content = tokio::fs::read_to_string(path).await?;

		let mut config = self.parse(&content, format)?;

		self.apply_env_overrides(&mut config)?;

		validate_config(&config)?;

		Ok(config)
	}

	/// Substitutes `${VAR}` references and parses `content` without
	/// applying overrides or validation.
	pub fn parse(&self, content: &str, format: ConfigFormat) -> Result<LimeConfig, ConfigError> {
		let substituted = substitute_env_vars(content)?;

		match format {
			ConfigFormat::Toml => {
				toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))
			}
			ConfigFormat::Json => serde_json::from_str(&substituted)
				.map_err(|e| ConfigError::ParseError(e.to_string())),
			ConfigFormat::Yaml => serde_yaml::from_str(&substituted)
				.map_err(|e| ConfigError::ParseError(e.to_string())),
		}
	}

	fn apply_env_overrides(&self, config: &mut LimeConfig) -> Result<(), ConfigError> {
		if let Ok(host) = env::var(format!("{}HOST", self.env_prefix)) {
			debug!("Overriding server host from environment");
			config.server.host = host;
		}

		if let Ok(port) = env::var(format!("{}PORT", self.env_prefix)) {
			config.server.port = port
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid port: {}", e)))?;
		}

		if let Ok(log_level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			config.server.log_level = log_level;
		}

		if let Ok(rpc_url) = env::var(format!("{}RPC_URL", self.env_prefix)) {
			debug!("Overriding upstream RPC URL from environment");
			config.upstream.rpc_url = rpc_url;
		}

		if let Ok(key) = env::var(format!("{}SIGNING_KEY", self.env_prefix)) {
			debug!("Overriding signing key from environment");
			config.auth.signing_key = key;
		}

		Ok(())
	}
}

fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
	let mut result = content.to_string();

	let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::ParseError(e.to_string()))?;

	for cap in re.captures_iter(content) {
		let full_match = &cap[0];
		let var_name = &cap[1];

		let env_value =
			env::var(var_name).map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

		result = result.replace(full_match, &env_value);
	}

	Ok(result)
}

/// Checks cross-field constraints that serde cannot express.
pub fn validate_config(config: &LimeConfig) -> Result<(), ConfigError> {
	let url = &config.upstream.rpc_url;
	if !(url.starts_with("http://") || url.starts_with("https://")) {
		return Err(ConfigError::ValidationError(
			"Upstream RPC URL must start with http:// or https://".to_string(),
		));
	}

	if config.upstream.request_timeout_secs == 0 {
		return Err(ConfigError::ValidationError(
			"Upstream request timeout must be greater than zero".to_string(),
		));
	}

	if config.storage.backend == StorageBackend::File && config.storage.path.is_none() {
		return Err(ConfigError::ValidationError(
			"File storage backend requires a path".to_string(),
		));
	}

	if config.cache.write_timeout_ms == 0 {
		return Err(ConfigError::ValidationError(
			"Cache write timeout must be greater than zero".to_string(),
		));
	}

	if config.auth.signing_key.len() < MIN_SIGNING_KEY_LEN {
		return Err(ConfigError::ValidationError(format!(
			"Signing key must be at least {} bytes",
			MIN_SIGNING_KEY_LEN
		)));
	}

	let mut seen = HashSet::new();
	for user in &config.auth.users {
		if user.username.is_empty() || user.password.is_empty() {
			return Err(ConfigError::ValidationError(
				"Users must have a non-empty username and password".to_string(),
			));
		}
		if !seen.insert(user.username.as_str()) {
			return Err(ConfigError::ValidationError(format!(
				"Duplicate user: {}",
				user.username
			)));
		}
	}

	Ok(())
}
