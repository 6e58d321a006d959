//! The normalized transaction record served to clients and kept in the cache.

use alloy::primitives::B256;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Execution status of a transaction.
///
/// Encoded on the wire and in storage as an integer: `0` failed,
/// `1` successful, `2` pending. The first two match the receipt status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxStatus {
	Failed,
	Successful,
	Pending,
}

impl TxStatus {
	pub fn code(self) -> u8 {
		match self {
			TxStatus::Failed => 0,
			TxStatus::Successful => 1,
			TxStatus::Pending => 2,
		}
	}

	pub fn from_code(code: u8) -> Option<Self> {
		match code {
			0 => Some(TxStatus::Failed),
			1 => Some(TxStatus::Successful),
			2 => Some(TxStatus::Pending),
			_ => None,
		}
	}

	/// Status for a mined transaction given its receipt outcome.
	pub fn from_receipt(success: bool) -> Self {
		if success {
			TxStatus::Successful
		} else {
			TxStatus::Failed
		}
	}
}

impl fmt::Display for TxStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			TxStatus::Failed => "failed",
			TxStatus::Successful => "successful",
			TxStatus::Pending => "pending",
		};
		f.write_str(name)
	}
}

impl Serialize for TxStatus {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_u8(self.code())
	}
}

impl<'de> Deserialize<'de> for TxStatus {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let code = u8::deserialize(deserializer)?;
		TxStatus::from_code(code)
			.ok_or_else(|| de::Error::custom(format!("invalid transaction status: {}", code)))
	}
}

/// A resolved transaction.
///
/// Hashes are `0x`-prefixed lowercase hex, addresses are EIP-55 checksummed,
/// `input` is unprefixed lowercase hex and `value` is the decimal wei amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
	pub transaction_hash: String,
	pub transaction_status: TxStatus,
	pub block_hash: Option<String>,
	pub block_number: Option<u64>,
	pub from: String,
	pub to: Option<String>,
	pub contract_address: Option<String>,
	pub logs_count: Option<u64>,
	pub input: String,
	pub value: String,
}

impl TransactionRecord {
	/// Finalized records are safe to cache; pending ones will still change.
	pub fn is_final(&self) -> bool {
		self.transaction_status != TxStatus::Pending
	}
}

/// Canonical string key for a transaction hash.
pub fn hash_key(hash: &B256) -> String {
	format!("{:#x}", hash)
}
