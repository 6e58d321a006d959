//! Conversion of upstream transactions into cacheable records.

use lime_types::{hash_key, RawTransaction, TransactionReceipt, TransactionRecord, TxStatus};

/// Builds the record for `tx`. A missing receipt means the transaction is
/// still pending, in which case no block data is recorded.
pub fn normalize(tx: &RawTransaction, receipt: Option<&TransactionReceipt>) -> TransactionRecord {
	let to = tx.to.map(|address| address.to_checksum(None));

	// Contract address only for creations that the receipt resolved
	let contract_address = match (tx.to, receipt) {
		(None, Some(receipt)) => receipt.contract_address.map(|address| address.to_checksum(None)),
		_ => None,
	};

	TransactionRecord {
		transaction_hash: hash_key(&tx.hash),
		transaction_status: receipt
			.map(|receipt| TxStatus::from_receipt(receipt.success))
			.unwrap_or(TxStatus::Pending),
		block_hash: receipt.map(|receipt| hash_key(&receipt.block_hash)),
		block_number: receipt.map(|receipt| receipt.block_number),
		from: tx.from.to_checksum(None),
		to,
		contract_address,
		logs_count: receipt.map(|receipt| receipt.logs_count),
		input: hex::encode(&tx.input),
		value: tx.value.to_string(),
	}
}
