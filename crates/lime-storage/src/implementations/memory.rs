//! In-memory cache store.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use dashmap::DashMap;
use lime_types::{hash_key, OwnershipToken, TransactionRecord, B256};
use std::collections::BTreeSet;

/// In-memory storage implementation (lost on restart)
#[derive(Default)]
pub struct MemoryStorage {
	records: DashMap<String, TransactionRecord>,
	owners: DashMap<String, BTreeSet<String>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get_tx(&self, hash: &B256) -> Result<TransactionRecord, StorageError> {
		let key = hash_key(hash);
		self.records
			.get(&key)
			.map(|entry| entry.clone())
			.ok_or(StorageError::NotFound(key))
	}

	async fn store_tx(
		&self,
		record: &TransactionRecord,
		token: Option<&OwnershipToken>,
	) -> Result<(), StorageError> {
		let key = record.transaction_hash.clone();
		self.records
			.entry(key.clone())
			.or_insert_with(|| record.clone());

		if let Some(token) = token {
			self.owners
				.entry(token.as_str().to_string())
				.or_default()
				.insert(key);
		}

		Ok(())
	}

	async fn get_all_txs(&self) -> Result<Vec<TransactionRecord>, StorageError> {
		let mut records: Vec<TransactionRecord> =
			self.records.iter().map(|entry| entry.clone()).collect();
		records.sort_by(|a, b| a.transaction_hash.cmp(&b.transaction_hash));
		Ok(records)
	}

	async fn get_txs_by_token(
		&self,
		token: &OwnershipToken,
	) -> Result<Vec<TransactionRecord>, StorageError> {
		let hashes = match self.owners.get(token.as_str()) {
			Some(entry) => entry.clone(),
			None => return Ok(Vec::new()),
		};

		// BTreeSet iteration keeps the hash ordering
		Ok(hashes
			.iter()
			.filter_map(|hash| self.records.get(hash).map(|entry| entry.clone()))
			.collect())
	}
}
