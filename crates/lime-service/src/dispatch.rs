//! Routing of decoded requests onto service handlers.

use crate::codec::{bind, encode, DispatchKey, RpcRequest, RpcResponse};
use crate::lime::LimeService;
use crate::RpcError;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maps dispatch keys onto registered services.
pub struct Dispatcher {
	lime: Arc<LimeService>,
}

impl Dispatcher {
	pub fn new(lime: Arc<LimeService>) -> Self {
		Self { lime }
	}

	/// Runs a request and encodes its outcome. `None` for notifications.
	pub async fn handle(&self, request: RpcRequest) -> Option<RpcResponse> {
		let outcome = self.dispatch(&request).await;
		if let Err(e) = &outcome {
			warn!(method = %request.method, error = %e, "Request failed");
		}
		encode(request.id, outcome)
	}

	pub async fn dispatch(&self, request: &RpcRequest) -> Result<Value, RpcError> {
		let key = DispatchKey::parse(&request.method)?;
		debug!(method = %key, "Dispatching request");

		if key.service != "Lime" {
			return Err(RpcError::UnknownService(key.service));
		}

		let params = request.params.as_ref();
		match key.method.as_str() {
			"GetEthTransactions" => to_value(self.lime.get_eth_transactions(bind(params)?).await?),
			"GetAllTransactions" => to_value(self.lime.get_all_transactions(bind(params)?).await?),
			"GetMyTransactions" => to_value(self.lime.get_my_transactions(bind(params)?).await?),
			"Authenticate" => to_value(self.lime.authenticate(bind(params)?).await?),
			_ => Err(RpcError::UnknownMethod(key.to_string())),
		}
	}
}

fn to_value<T: Serialize>(reply: T) -> Result<Value, RpcError> {
	serde_json::to_value(reply).map_err(|e| RpcError::Internal(e.to_string()))
}
