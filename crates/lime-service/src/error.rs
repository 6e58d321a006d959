use crate::codec::CodecError;
use lime_auth::AuthError;
use lime_core::ResolveError;
use thiserror::Error;

/// Any failure a handler can report. The display string is what clients see
/// in the envelope's `error` field.
#[derive(Debug, Error)]
pub enum RpcError {
	#[error(transparent)]
	Codec(#[from] CodecError),

	#[error("rpc: can't find service {0}")]
	UnknownService(String),

	#[error("rpc: can't find method {0}")]
	UnknownMethod(String),

	#[error("{0}")]
	Validation(String),

	#[error(transparent)]
	Auth(#[from] AuthError),

	#[error(transparent)]
	Resolve(#[from] ResolveError),

	#[error("internal error: {0}")]
	Internal(String),
}
