//! Concurrent cache-aside resolution of transaction hashes.

use crate::{normalize, CacheWriter, ResolutionRequest, ResolveError};
use lime_storage::{StorageError, StorageInterface};
use lime_types::{OwnershipToken, TransactionRecord, B256};
use lime_upstream::UpstreamInterface;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Outcome of resolving one hash.
struct Resolved {
	record: TransactionRecord,
	/// Whether the record was handed to the cache writer.
	queued: bool,
}

/// Resolves transaction hashes through the cache and the upstream node.
///
/// Cloning is cheap; every clone shares the same dependencies and writer.
#[derive(Clone)]
pub struct TxResolver {
	storage: Arc<dyn StorageInterface>,
	upstream: Arc<dyn UpstreamInterface>,
	writer: CacheWriter,
}

impl TxResolver {
	pub fn new(
		storage: Arc<dyn StorageInterface>,
		upstream: Arc<dyn UpstreamInterface>,
		writer: CacheWriter,
	) -> Self {
		Self {
			storage,
			upstream,
			writer,
		}
	}

	pub fn writer(&self) -> &CacheWriter {
		&self.writer
	}

	/// Resolves every hash of `request` concurrently.
	///
	/// Returns one record per requested hash, in request order, or
	/// [`ResolveError::Aggregate`] if any of them could not be resolved. The
	/// token, when present, must already be verified.
	pub async fn resolve(
		&self,
		request: ResolutionRequest,
	) -> Result<Vec<TransactionRecord>, ResolveError> {
		let expected = request.len();
		let mut tasks = JoinSet::new();

		for (index, hash) in request.hashes().iter().copied().enumerate() {
			let resolver = self.clone();
			let token = request.token().cloned();
			tasks.spawn(async move { (index, resolver.resolve_one(hash, token).await) });
		}

		// Dropping `tasks` early (request cancelled) aborts the upstream calls
		let mut slots: Vec<Option<Resolved>> = (0..expected).map(|_| None).collect();
		while let Some(joined) = tasks.join_next().await {
			match joined {
				Ok((index, resolved)) => slots[index] = resolved,
				Err(e) => warn!(error = %e, "Resolution task failed"),
			}
		}

		let resolved: Vec<Resolved> = slots.into_iter().flatten().collect();
		if resolved.len() < expected {
			let orphaned = resolved.iter().filter(|r| r.queued).count();
			warn!(
				requested = expected,
				resolved = resolved.len(),
				"Failed to resolve every requested transaction"
			);
			debug!(orphaned, "Cache writes already queued for the failed batch");
			return Err(ResolveError::Aggregate);
		}

		info!(count = expected, "Resolved transactions");
		Ok(resolved.into_iter().map(|r| r.record).collect())
	}

	async fn resolve_one(&self, hash: B256, token: Option<OwnershipToken>) -> Option<Resolved> {
		match self.storage.get_tx(&hash).await {
			Ok(record) => {
				debug!(hash = %hash, "Cache hit");
				// Served from cache, but the caller still owns the hash now
				let queued = token.is_some();
				if queued {
					self.writer.submit(record.clone(), token);
				}
				return Some(Resolved { record, queued });
			}
			Err(StorageError::NotFound(_)) => debug!(hash = %hash, "Cache miss"),
			Err(e) => warn!(hash = %hash, error = %e, "Cache lookup failed, querying upstream"),
		}

		let (tx, pending) = match self.upstream.transaction_by_hash(&hash).await {
			Ok(found) => found,
			Err(e) => {
				warn!(hash = %hash, error = %e, "Failed to fetch transaction");
				return None;
			}
		};

		let receipt = if pending {
			None
		} else {
			match self.upstream.transaction_receipt(&hash).await {
				Ok(receipt) => Some(receipt),
				Err(e) => {
					warn!(hash = %hash, error = %e, "Failed to fetch receipt");
					return None;
				}
			}
		};

		let record = normalize(&tx, receipt.as_ref());
		let queued = record.is_final();
		if queued {
			self.writer.submit(record.clone(), token);
		}

		Some(Resolved { record, queued })
	}

	/// Every cached record.
	pub async fn fetch_all(&self) -> Result<Vec<TransactionRecord>, ResolveError> {
		Ok(self.storage.get_all_txs().await?)
	}

	/// Cached records linked to `token`. The token must already be verified.
	pub async fn fetch_by_token(
		&self,
		token: &OwnershipToken,
	) -> Result<Vec<TransactionRecord>, ResolveError> {
		Ok(self.storage.get_txs_by_token(token).await?)
	}
}
