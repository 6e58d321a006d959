//! Remote transaction client.
//!
//! The resolution pipeline asks an upstream Ethereum node for a transaction
//! and, once mined, its receipt. This crate defines that capability as a
//! trait and ships an alloy-backed HTTP implementation.

use async_trait::async_trait;
use lime_config::UpstreamConfig;
use lime_types::{RawTransaction, TransactionReceipt, B256};
use std::sync::Arc;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod alloy;
}

pub use implementations::alloy::AlloyUpstream;

/// Errors that can occur while talking to the upstream node.
#[derive(Debug, Error)]
pub enum UpstreamError {
	/// Transport failure, timeout or JSON-RPC error from the node.
	#[error("Network error: {0}")]
	Network(String),
	/// The node does not know the transaction or receipt.
	#[error("not found: {0}")]
	NotFound(String),
	/// The node answered with something that could not be interpreted.
	#[error("Decode error: {0}")]
	Decode(String),
}

/// Trait defining the interface for the upstream transaction source.
#[async_trait]
pub trait UpstreamInterface: Send + Sync {
	/// Fetches a transaction. The flag is `true` while it is still pending.
	async fn transaction_by_hash(
		&self,
		hash: &B256,
	) -> Result<(RawTransaction, bool), UpstreamError>;

	/// Fetches the receipt of a mined transaction.
	async fn transaction_receipt(&self, hash: &B256) -> Result<TransactionReceipt, UpstreamError>;
}

/// Factory function to create the upstream client from configuration.
pub fn create_upstream(config: &UpstreamConfig) -> Result<Arc<dyn UpstreamInterface>, UpstreamError> {
	Ok(Arc::new(AlloyUpstream::new(config)?))
}
