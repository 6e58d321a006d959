use lime_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
	#[error("{0}")]
	Validation(String),

	/// At least one hash of the batch could not be resolved. The cause is
	/// logged, never surfaced.
	#[error("failed to fetch transactions")]
	Aggregate,

	#[error(transparent)]
	Storage(#[from] StorageError),
}
