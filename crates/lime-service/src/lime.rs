//! The `Lime` RPC service.

use crate::codec::{ParamShape, RpcArgs};
use crate::hashes::decode_hash_list;
use crate::RpcError;
use lime_auth::AuthInterface;
use lime_core::{ResolutionRequest, TxResolver};
use lime_types::{OwnershipToken, TransactionRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// `[hexEncodedHashListRLP, token?]`
#[derive(Debug, Deserialize)]
pub struct GetEthTransactionsArgs(pub String, pub Option<String>);

impl RpcArgs for GetEthTransactionsArgs {
	const SHAPE: ParamShape = ParamShape::Positional;
	const ARITY: usize = 2;
	const REQUIRED: usize = 1;
}

#[derive(Debug, Deserialize)]
pub struct GetAllTransactionsArgs {}

impl RpcArgs for GetAllTransactionsArgs {
	const SHAPE: ParamShape = ParamShape::Positional;
	const ARITY: usize = 0;
	const REQUIRED: usize = 0;
}

/// `[token]`
#[derive(Debug, Deserialize)]
pub struct GetMyTransactionsArgs {
	pub token: String,
}

impl RpcArgs for GetMyTransactionsArgs {
	const SHAPE: ParamShape = ParamShape::Positional;
	const ARITY: usize = 1;
	const REQUIRED: usize = 1;
}

#[derive(Debug, Deserialize)]
pub struct AuthenticateArgs {
	pub username: String,
	pub password: String,
}

impl RpcArgs for AuthenticateArgs {
	const SHAPE: ParamShape = ParamShape::Structured;
	const ARITY: usize = 2;
	const REQUIRED: usize = 2;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionsReply {
	pub transactions: Vec<TransactionRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthenticateReply {
	pub token: String,
}

pub struct LimeService {
	resolver: TxResolver,
	auth: Arc<dyn AuthInterface>,
}

impl LimeService {
	pub fn new(resolver: TxResolver, auth: Arc<dyn AuthInterface>) -> Self {
		Self { resolver, auth }
	}

	/// Resolves the hashes of an RLP hash list, recording them under the
	/// token when one is supplied.
	pub async fn get_eth_transactions(
		&self,
		args: GetEthTransactionsArgs,
	) -> Result<TransactionsReply, RpcError> {
		let GetEthTransactionsArgs(encoded, token) = args;
		let hashes = decode_hash_list(&encoded)?;

		let token = match token.filter(|t| !t.is_empty()) {
			Some(token) => {
				let token = OwnershipToken::new(token);
				let claims = self.auth.verify_token(&token).await?;
				debug!(username = %claims.username, "Resolving on behalf of user");
				Some(token)
			}
			None => None,
		};

		let request = ResolutionRequest::new(hashes, token)?;
		let transactions = self.resolver.resolve(request).await?;
		Ok(TransactionsReply { transactions })
	}

	pub async fn get_all_transactions(
		&self,
		_args: GetAllTransactionsArgs,
	) -> Result<TransactionsReply, RpcError> {
		let transactions = self.resolver.fetch_all().await?;
		Ok(TransactionsReply { transactions })
	}

	/// Lists the cached transactions previously requested with this token.
	pub async fn get_my_transactions(
		&self,
		args: GetMyTransactionsArgs,
	) -> Result<TransactionsReply, RpcError> {
		let token = OwnershipToken::new(args.token);
		self.auth.verify_token(&token).await?;

		let transactions = self.resolver.fetch_by_token(&token).await?;
		Ok(TransactionsReply { transactions })
	}

	pub async fn authenticate(&self, args: AuthenticateArgs) -> Result<AuthenticateReply, RpcError> {
		let token = self.auth.authenticate(&args.username, &args.password).await?;
		Ok(AuthenticateReply {
			token: token.into_inner(),
		})
	}
}
