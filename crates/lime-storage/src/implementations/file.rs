//! File-based cache store.
//!
//! Layout under the base directory:
//! - `transactions/<hash>.json` holds one record each,
//! - `tokens/<sha256(token)>.json` holds the sorted hashes linked to a token.
//!
//! Writes go to a uniquely named temp file first and are renamed into place,
//! so readers never observe a partial file.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use lime_types::{hash_key, OwnershipToken, TransactionRecord, B256};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::warn;

const TRANSACTIONS_DIR: &str = "transactions";
const TOKENS_DIR: &str = "tokens";

/// File-based storage implementation.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
	/// Serializes read-modify-write cycles on token index files.
	index_lock: Mutex<()>,
}

impl FileStorage {
	/// Creates a new FileStorage instance with the specified base path.
	pub fn new(base_path: PathBuf) -> Self {
		Self {
			base_path,
			index_lock: Mutex::new(()),
		}
	}

	fn record_path(&self, hash: &str) -> PathBuf {
		// Sanitize key to be filesystem-safe
		let safe_key = hash.replace(['/', '\\', ':', '.'], "_");
		self.base_path
			.join(TRANSACTIONS_DIR)
			.join(format!("{}.json", safe_key))
	}

	fn token_path(&self, token: &OwnershipToken) -> PathBuf {
		let digest = Sha256::digest(token.as_str().as_bytes());
		self.base_path
			.join(TOKENS_DIR)
			.join(format!("{}.json", hex::encode(digest)))
	}

	async fn read_record(&self, path: &Path) -> Result<Option<TransactionRecord>, StorageError> {
		match fs::read(path).await {
			Ok(bytes) => serde_json::from_slice(&bytes)
				.map(Some)
				.map_err(|e| StorageError::Serialization(e.to_string())),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn read_index(&self, path: &Path) -> Result<BTreeSet<String>, StorageError> {
		match fs::read(path).await {
			Ok(bytes) => serde_json::from_slice(&bytes)
				.map_err(|e| StorageError::Serialization(e.to_string())),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeSet::new()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	/// Write atomically by writing to a temp file then renaming.
	async fn write_atomic(&self, path: &Path, bytes: Vec<u8>) -> Result<(), StorageError> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		let temp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4()));
		fs::write(&temp_path, bytes)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		fs::rename(&temp_path, path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	async fn link_token(&self, token: &OwnershipToken, hash: &str) -> Result<(), StorageError> {
		let path = self.token_path(token);
		let _guard = self.index_lock.lock().await;

		let mut hashes = self.read_index(&path).await?;
		if !hashes.insert(hash.to_string()) {
			return Ok(());
		}

		let bytes =
			serde_json::to_vec(&hashes).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.write_atomic(&path, bytes).await
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_tx(&self, hash: &B256) -> Result<TransactionRecord, StorageError> {
		let key = hash_key(hash);
		self.read_record(&self.record_path(&key))
			.await?
			.ok_or(StorageError::NotFound(key))
	}

	async fn store_tx(
		&self,
		record: &TransactionRecord,
		token: Option<&OwnershipToken>,
	) -> Result<(), StorageError> {
		let path = self.record_path(&record.transaction_hash);

		if !path.exists() {
			let bytes = serde_json::to_vec(record)
				.map_err(|e| StorageError::Serialization(e.to_string()))?;
			self.write_atomic(&path, bytes).await?;
		}

		if let Some(token) = token {
			self.link_token(token, &record.transaction_hash).await?;
		}

		Ok(())
	}

	async fn get_all_txs(&self) -> Result<Vec<TransactionRecord>, StorageError> {
		let dir = self.base_path.join(TRANSACTIONS_DIR);
		let mut entries = match fs::read_dir(&dir).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut records = Vec::new();
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension().and_then(|s| s.to_str()) != Some("json") {
				continue;
			}
			match self.read_record(&path).await? {
				Some(record) => records.push(record),
				None => warn!(path = %path.display(), "Record vanished while listing"),
			}
		}

		records.sort_by(|a, b| a.transaction_hash.cmp(&b.transaction_hash));
		Ok(records)
	}

	async fn get_txs_by_token(
		&self,
		token: &OwnershipToken,
	) -> Result<Vec<TransactionRecord>, StorageError> {
		let hashes = self.read_index(&self.token_path(token)).await?;

		let mut records = Vec::with_capacity(hashes.len());
		for hash in hashes {
			if let Some(record) = self.read_record(&self.record_path(&hash)).await? {
				records.push(record);
			}
		}
		Ok(records)
	}
}
