//! Views of a transaction and its receipt as reported by the upstream node.
//!
//! These are deliberately narrow: only the fields the gateway normalizes are
//! carried, so client implementations stay free to use any wire library.

use alloy::primitives::{Address, Bytes, B256, U256};

/// A transaction as returned by `eth_getTransactionByHash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransaction {
	pub hash: B256,
	/// Recovered sender.
	pub from: Address,
	/// `None` for contract creation.
	pub to: Option<Address>,
	pub input: Bytes,
	pub value: U256,
}

/// The subset of `eth_getTransactionReceipt` the gateway records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
	pub success: bool,
	pub block_hash: B256,
	pub block_number: u64,
	/// Set by the node for contract-creation transactions.
	pub contract_address: Option<Address>,
	pub logs_count: u64,
}
