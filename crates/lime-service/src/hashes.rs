//! Decoding of the RLP hash list accepted by `GetEthTransactions`.

use crate::RpcError;
use lime_types::B256;
use rlp::Rlp;

/// Decodes a hex string (optionally `0x`-prefixed) holding an RLP list of
/// transaction hashes. Each item is either the 32 raw hash bytes or the
/// ASCII form `0x` followed by 64 hex digits.
pub fn decode_hash_list(encoded: &str) -> Result<Vec<B256>, RpcError> {
	let encoded = encoded.trim();
	let digits = encoded.strip_prefix("0x").unwrap_or(encoded);
	let bytes = hex::decode(digits)
		.map_err(|e| RpcError::Validation(format!("invalid hash list encoding: {}", e)))?;

	let rlp = Rlp::new(&bytes);
	if !rlp.is_list() {
		return Err(RpcError::Validation(
			"hash list must be an RLP list".to_string(),
		));
	}

	let info = rlp
		.payload_info()
		.map_err(|e| RpcError::Validation(format!("invalid hash list: {}", e)))?;
	if info.header_len + info.value_len != bytes.len() {
		return Err(RpcError::Validation(
			"hash list has trailing bytes".to_string(),
		));
	}

	let count = rlp
		.item_count()
		.map_err(|e| RpcError::Validation(format!("invalid hash list: {}", e)))?;

	let mut hashes = Vec::with_capacity(count);
	for index in 0..count {
		let item = rlp
			.at(index)
			.map_err(|e| RpcError::Validation(format!("invalid hash list item {}: {}", index, e)))?;
		if item.is_list() {
			return Err(RpcError::Validation(format!(
				"invalid hash list item {}",
				index
			)));
		}
		let data = item
			.data()
			.map_err(|e| RpcError::Validation(format!("invalid hash list item {}: {}", index, e)))?;
		hashes.push(parse_item(data)?);
	}

	Ok(hashes)
}

fn parse_item(item: &[u8]) -> Result<B256, RpcError> {
	if item.len() == 32 {
		return Ok(B256::from_slice(item));
	}

	let text = std::str::from_utf8(item).ok();
	match text.and_then(|t| t.strip_prefix("0x")) {
		Some(digits) if digits.len() == 64 => digits
			.parse::<B256>()
			.map_err(|_| invalid_hash(item)),
		_ => Err(invalid_hash(item)),
	}
}

fn invalid_hash(item: &[u8]) -> RpcError {
	let shown = match std::str::from_utf8(item) {
		Ok(text) => text.to_string(),
		Err(_) => format!("0x{}", hex::encode(item)),
	};
	RpcError::Validation(format!("invalid transaction hash: {}", shown))
}
