use crate::ResolveError;
use lime_types::{OwnershipToken, B256};
use std::collections::HashSet;

/// The hashes a caller asked for, in order and without repeats, plus the
/// verified token the results should be recorded under.
#[derive(Debug, Clone)]
pub struct ResolutionRequest {
	hashes: Vec<B256>,
	token: Option<OwnershipToken>,
}

impl ResolutionRequest {
	/// Builds a request. Repeated hashes collapse onto their first occurrence.
	pub fn new(hashes: Vec<B256>, token: Option<OwnershipToken>) -> Result<Self, ResolveError> {
		if hashes.is_empty() {
			return Err(ResolveError::Validation(
				"no transaction hashes supplied".to_string(),
			));
		}

		let mut seen = HashSet::with_capacity(hashes.len());
		let hashes = hashes.into_iter().filter(|hash| seen.insert(*hash)).collect();

		Ok(Self { hashes, token })
	}

	pub fn hashes(&self) -> &[B256] {
		&self.hashes
	}

	pub fn token(&self) -> Option<&OwnershipToken> {
		self.token.as_ref()
	}

	pub fn len(&self) -> usize {
		self.hashes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.hashes.is_empty()
	}
}
