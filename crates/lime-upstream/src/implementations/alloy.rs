//! Alloy-based upstream client.
//!
//! Talks to any Ethereum JSON-RPC node over HTTP using alloy's provider.

use crate::{UpstreamError, UpstreamInterface};
use alloy::consensus::Transaction as ConsensusTransaction;
use alloy::network::{Ethereum, TransactionResponse};
use alloy::providers::{Provider, ProviderBuilder};
use async_trait::async_trait;
use lime_config::UpstreamConfig;
use lime_types::{RawTransaction, TransactionReceipt, B256};
use std::future::IntoFuture;
use std::time::Duration;
use tracing::debug;

/// Upstream client backed by an alloy HTTP provider.
pub struct AlloyUpstream {
	provider: Box<dyn Provider<Ethereum>>,
	/// Upper bound for a single node call.
	timeout: Duration,
}

impl AlloyUpstream {
	/// Builds the provider. No request is made until the first query.
	pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
		let url = config
			.rpc_url
			.parse()
			.map_err(|e| UpstreamError::Network(format!("Invalid RPC URL: {}", e)))?;

		let provider = ProviderBuilder::new().connect_http(url);

		Ok(Self {
			provider: Box::new(provider),
			timeout: Duration::from_secs(config.request_timeout_secs),
		})
	}

	async fn with_timeout<T, E, F>(&self, call: &str, fut: F) -> Result<T, UpstreamError>
	where
		F: IntoFuture<Output = Result<T, E>>,
		E: std::fmt::Display,
	{
		match tokio::time::timeout(self.timeout, fut).await {
			Ok(Ok(value)) => Ok(value),
			Ok(Err(e)) => Err(UpstreamError::Network(format!("{} failed: {}", call, e))),
			Err(_) => Err(UpstreamError::Network(format!(
				"{} timed out after {}s",
				call,
				self.timeout.as_secs()
			))),
		}
	}
}

#[async_trait]
impl UpstreamInterface for AlloyUpstream {
	async fn transaction_by_hash(
		&self,
		hash: &B256,
	) -> Result<(RawTransaction, bool), UpstreamError> {
		let tx = self
			.with_timeout(
				"eth_getTransactionByHash",
				self.provider.get_transaction_by_hash(*hash),
			)
			.await?
			.ok_or_else(|| UpstreamError::NotFound(format!("transaction {:#x}", hash)))?;

		// Nodes report pending transactions without a block hash
		let pending = tx.block_hash.is_none();
		debug!(hash = %hash, pending, "Fetched transaction from upstream");

		let raw = RawTransaction {
			hash: TransactionResponse::tx_hash(&tx),
			from: TransactionResponse::from(&tx),
			to: ConsensusTransaction::to(&tx),
			input: ConsensusTransaction::input(&tx).clone(),
			value: ConsensusTransaction::value(&tx),
		};

		Ok((raw, pending))
	}

	async fn transaction_receipt(&self, hash: &B256) -> Result<TransactionReceipt, UpstreamError> {
		let receipt = self
			.with_timeout(
				"eth_getTransactionReceipt",
				self.provider.get_transaction_receipt(*hash),
			)
			.await?
			.ok_or_else(|| UpstreamError::NotFound(format!("receipt {:#x}", hash)))?;

		let block_hash = receipt
			.block_hash
			.ok_or_else(|| UpstreamError::Decode(format!("receipt {:#x} has no block hash", hash)))?;
		let block_number = receipt.block_number.ok_or_else(|| {
			UpstreamError::Decode(format!("receipt {:#x} has no block number", hash))
		})?;

		Ok(TransactionReceipt {
			success: receipt.status(),
			block_hash,
			block_number,
			contract_address: receipt.contract_address,
			logs_count: receipt.inner.logs().len() as u64,
		})
	}
}
