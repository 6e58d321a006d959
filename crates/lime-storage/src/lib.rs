//! Cache store for resolved transactions.
//!
//! This module provides the abstraction the resolution pipeline reads from and
//! writes back to, with in-memory and file-based backends. Records may be
//! linked to any number of ownership tokens so callers can list the
//! transactions they asked for.

use async_trait::async_trait;
use lime_config::{StorageBackend, StorageConfig};
use lime_types::{OwnershipToken, TransactionRecord, B256};
use std::sync::Arc;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

pub use implementations::file::FileStorage;
pub use implementations::memory::MemoryStorage;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("tx ({0}) not found")]
	NotFound(String),
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
}

/// Trait defining the interface for cache store backends.
///
/// Implementations must be safe to share across concurrent resolution tasks.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves a cached record, or [`StorageError::NotFound`].
	async fn get_tx(&self, hash: &B256) -> Result<TransactionRecord, StorageError>;

	/// Stores a record if it is not cached yet and, when a token is given,
	/// links the record to it. Both halves are idempotent.
	async fn store_tx(
		&self,
		record: &TransactionRecord,
		token: Option<&OwnershipToken>,
	) -> Result<(), StorageError>;

	/// Lists every cached record, ordered by hash.
	async fn get_all_txs(&self) -> Result<Vec<TransactionRecord>, StorageError>;

	/// Lists the records linked to `token`, ordered by hash.
	async fn get_txs_by_token(
		&self,
		token: &OwnershipToken,
	) -> Result<Vec<TransactionRecord>, StorageError>;
}

/// Factory function to create a storage backend from configuration.
pub fn create_storage(config: &StorageConfig) -> Result<Arc<dyn StorageInterface>, StorageError> {
	match config.backend {
		StorageBackend::Memory => Ok(Arc::new(MemoryStorage::new())),
		StorageBackend::File => {
			let path = config.path.clone().ok_or_else(|| {
				StorageError::Backend("file storage requires a path".to_string())
			})?;
			Ok(Arc::new(FileStorage::new(path)))
		}
	}
}
