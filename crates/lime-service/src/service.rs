//! Assembly of the gateway from configuration.

use crate::dispatch::Dispatcher;
use crate::lime::LimeService;
use anyhow::{Context, Result};
use lime_auth::{create_authenticator, AuthInterface};
use lime_config::LimeConfig;
use lime_core::{CacheWriter, TxResolver};
use lime_storage::{create_storage, StorageInterface};
use lime_upstream::{create_upstream, UpstreamInterface};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// The wired-up gateway: a dispatcher for requests plus the background
/// writer that has to be drained on shutdown.
pub struct Gateway {
	pub dispatcher: Arc<Dispatcher>,
	pub writer: CacheWriter,
}

impl Gateway {
	/// Builds every component named in `config`.
	pub fn from_config(config: &LimeConfig) -> Result<Self> {
		let storage = create_storage(&config.storage).context("Failed to create storage")?;
		info!(backend = ?config.storage.backend, "Cache store ready");

		let upstream =
			create_upstream(&config.upstream).context("Failed to create upstream client")?;
		info!(rpc_url = %config.upstream.rpc_url, "Upstream client ready");

		let auth = create_authenticator(&config.auth).context("Failed to create authenticator")?;
		info!(users = config.auth.users.len(), "Authenticator ready");

		Ok(Self::new(
			storage,
			upstream,
			auth,
			Duration::from_millis(config.cache.write_timeout_ms),
		))
	}

	pub fn new(
		storage: Arc<dyn StorageInterface>,
		upstream: Arc<dyn UpstreamInterface>,
		auth: Arc<dyn AuthInterface>,
		write_timeout: Duration,
	) -> Self {
		let writer = CacheWriter::new(storage.clone(), write_timeout);
		let resolver = TxResolver::new(storage, upstream, writer.clone());
		let lime = Arc::new(LimeService::new(resolver, auth));

		Self {
			dispatcher: Arc::new(Dispatcher::new(lime)),
			writer,
		}
	}
}
