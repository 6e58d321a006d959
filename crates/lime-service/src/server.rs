//! HTTP transport for the JSON-RPC endpoint.

use crate::codec::{RpcRequest, RpcResponse};
use crate::dispatch::Dispatcher;
use axum::{
	body::Bytes,
	extract::State,
	http::{header, HeaderMap, StatusCode},
	response::{IntoResponse, Json, Response},
	routing::{get, post},
	Router,
};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

#[derive(Clone)]
struct AppState {
	dispatcher: Arc<Dispatcher>,
}

/// Builds the router: `POST /` for JSON-RPC and `GET /health`.
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
	Router::new()
		.route("/", post(handle_rpc))
		.route("/health", get(health_check))
		.with_state(AppState { dispatcher })
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
}

/// Serves `router` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> anyhow::Result<()>
where
	F: Future<Output = ()> + Send + 'static,
{
	info!(address = %listener.local_addr()?, "JSON-RPC server listening");
	axum::serve(listener, router)
		.with_graceful_shutdown(shutdown)
		.await?;
	Ok(())
}

async fn health_check() -> Json<Value> {
	Json(json!({ "status": "ok" }))
}

async fn handle_rpc(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
	if !is_json(&headers) {
		let content_type = headers
			.get(header::CONTENT_TYPE)
			.and_then(|v| v.to_str().ok())
			.unwrap_or_default();
		return (
			StatusCode::UNSUPPORTED_MEDIA_TYPE,
			format!("rpc: unrecognized Content-Type: {}", content_type),
		)
			.into_response();
	}

	let request: RpcRequest = match serde_json::from_slice(&body) {
		Ok(request) => request,
		Err(e) => {
			debug!(error = %e, "Rejected undecodable request body");
			let response = RpcResponse::failure(Value::Null, format!("rpc: {}", e));
			return (StatusCode::BAD_REQUEST, Json(response)).into_response();
		}
	};

	match state.dispatcher.handle(request).await {
		Some(response) => Json(response).into_response(),
		// Notifications are answered with an empty body
		None => StatusCode::OK.into_response(),
	}
}

/// `application/json`, ignoring parameters such as `charset`.
fn is_json(headers: &HeaderMap) -> bool {
	headers
		.get(header::CONTENT_TYPE)
		.and_then(|v| v.to_str().ok())
		.and_then(|v| v.split(';').next())
		.map(|media| media.trim().eq_ignore_ascii_case("application/json"))
		.unwrap_or(false)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::service::Gateway;
	use async_trait::async_trait;
	use axum::body::Body;
	use axum::http::Request;
	use http_body_util::BodyExt;
	use lime_auth::{StaticUserStore, TokenAuthenticator};
	use lime_config::UserEntry;
	use lime_storage::{MemoryStorage, StorageError, StorageInterface};
	use lime_types::{
		hash_key, Address, Bytes as TxBytes, OwnershipToken, RawTransaction, TransactionReceipt,
		TransactionRecord, B256, U256,
	};
	use lime_upstream::{UpstreamError, UpstreamInterface};
	use rlp::RlpStream;
	use std::collections::HashSet;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;
	use tower::ServiceExt;

	/// Upstream that knows every hash except the ones marked as failing.
	#[derive(Default)]
	struct MockUpstream {
		failing: HashSet<B256>,
	}

	#[async_trait]
	impl UpstreamInterface for MockUpstream {
		async fn transaction_by_hash(
			&self,
			hash: &B256,
		) -> Result<(RawTransaction, bool), UpstreamError> {
			if self.failing.contains(hash) {
				return Err(UpstreamError::Network("node unavailable".to_string()));
			}
			let tx = RawTransaction {
				hash: *hash,
				from: Address::repeat_byte(0x01),
				to: Some(Address::repeat_byte(0x02)),
				input: TxBytes::from(vec![0xde, 0xad]),
				value: U256::from(1_000u64),
			};
			Ok((tx, false))
		}

		async fn transaction_receipt(
			&self,
			_hash: &B256,
		) -> Result<TransactionReceipt, UpstreamError> {
			Ok(TransactionReceipt {
				success: true,
				block_hash: B256::repeat_byte(0xbb),
				block_number: 42,
				contract_address: None,
				logs_count: 1,
			})
		}
	}

	/// Memory store that counts lookups.
	#[derive(Default)]
	struct CountingStorage {
		inner: MemoryStorage,
		reads: AtomicUsize,
	}

	#[async_trait]
	impl StorageInterface for CountingStorage {
		async fn get_tx(&self, hash: &B256) -> Result<TransactionRecord, StorageError> {
			self.reads.fetch_add(1, Ordering::SeqCst);
			self.inner.get_tx(hash).await
		}

		async fn store_tx(
			&self,
			record: &TransactionRecord,
			token: Option<&OwnershipToken>,
		) -> Result<(), StorageError> {
			self.inner.store_tx(record, token).await
		}

		async fn get_all_txs(&self) -> Result<Vec<TransactionRecord>, StorageError> {
			self.inner.get_all_txs().await
		}

		async fn get_txs_by_token(
			&self,
			token: &OwnershipToken,
		) -> Result<Vec<TransactionRecord>, StorageError> {
			self.reads.fetch_add(1, Ordering::SeqCst);
			self.inner.get_txs_by_token(token).await
		}
	}

	struct Harness {
		router: Router,
		gateway: Gateway,
		storage: Arc<CountingStorage>,
	}

	fn harness(failing: &[u8]) -> Harness {
		let storage = Arc::new(CountingStorage::default());
		let upstream = Arc::new(MockUpstream {
			failing: failing.iter().map(|b| B256::repeat_byte(*b)).collect(),
		});
		let users = StaticUserStore::from_entries(&[UserEntry {
			username: "alice".to_string(),
			password: "alice".to_string(),
		}]);
		let auth = Arc::new(
			TokenAuthenticator::new(
				b"0123456789abcdef0123456789abcdef".to_vec(),
				666,
				Arc::new(users),
			)
			.unwrap(),
		);
		let gateway = Gateway::new(storage.clone(), upstream, auth, Duration::from_secs(2));
		Harness {
			router: router(gateway.dispatcher.clone()),
			gateway,
			storage,
		}
	}

	fn hash_list(bytes: &[u8]) -> String {
		let mut stream = RlpStream::new_list(bytes.len());
		for byte in bytes {
			stream.append(&B256::repeat_byte(*byte).as_slice().to_vec());
		}
		hex::encode(stream.out())
	}

	async fn post(router: &Router, content_type: &str, body: String) -> (StatusCode, Vec<u8>) {
		let request = Request::builder()
			.method("POST")
			.uri("/")
			.header(header::CONTENT_TYPE, content_type)
			.body(Body::from(body))
			.unwrap();
		let response = router.clone().oneshot(request).await.unwrap();
		let status = response.status();
		let body = response.into_body().collect().await.unwrap().to_bytes();
		(status, body.to_vec())
	}

	async fn call(router: &Router, body: Value) -> Value {
		let (status, body) = post(router, "application/json", body.to_string()).await;
		assert_eq!(status, StatusCode::OK);
		serde_json::from_slice(&body).unwrap()
	}

	async fn login(router: &Router) -> String {
		let response = call(
			router,
			json!({"method": "lime_authenticate", "params": [{"username": "alice", "password": "alice"}], "id": 1}),
		)
		.await;
		response["result"]["token"].as_str().unwrap().to_string()
	}

	#[tokio::test]
	async fn test_get_all_transactions_on_empty_cache() {
		let h = harness(&[]);
		let response = call(
			&h.router,
			json!({"method": "lime_getAllTransactions", "params": [], "id": 1}),
		)
		.await;
		assert_eq!(
			response,
			json!({"result": {"transactions": []}, "error": null, "id": 1})
		);
	}

	#[tokio::test]
	async fn test_get_eth_transactions_resolves_and_caches() {
		let h = harness(&[]);
		let response = call(
			&h.router,
			json!({"method": "lime_getEthTransactions", "params": [hash_list(&[1, 2])], "id": "a"}),
		)
		.await;

		assert_eq!(response["error"], Value::Null);
		assert_eq!(response["id"], "a");
		let transactions = response["result"]["transactions"].as_array().unwrap();
		assert_eq!(transactions.len(), 2);
		assert_eq!(
			transactions[0]["transactionHash"],
			hash_key(&B256::repeat_byte(1))
		);
		assert_eq!(transactions[0]["transactionStatus"], 1);
		assert_eq!(transactions[0]["blockNumber"], 42);
		assert_eq!(transactions[0]["input"], "dead");
		assert_eq!(transactions[0]["value"], "1000");

		h.gateway.writer.drain().await;
		assert_eq!(h.storage.get_all_txs().await.unwrap().len(), 2);
	}

	#[tokio::test]
	async fn test_malformed_hash_returns_error() {
		let h = harness(&[]);
		let mut stream = RlpStream::new_list(1);
		stream.append(&"0xnothash");
		let response = call(
			&h.router,
			json!({"method": "lime_getEthTransactions", "params": [hex::encode(stream.out())], "id": 2}),
		)
		.await;
		assert_eq!(response["result"], Value::Null);
		assert_eq!(response["error"], "invalid transaction hash: 0xnothash");
		assert_eq!(response["id"], 2);
	}

	#[tokio::test]
	async fn test_one_failing_hash_fails_batch() {
		let h = harness(&[2]);
		let response = call(
			&h.router,
			json!({"method": "lime_getEthTransactions", "params": [hash_list(&[1, 2, 3])], "id": 3}),
		)
		.await;
		assert_eq!(response["result"], Value::Null);
		assert_eq!(response["error"], "failed to fetch transactions");
	}

	#[tokio::test]
	async fn test_my_transactions_follow_token() {
		let h = harness(&[]);
		let token = login(&h.router).await;

		call(
			&h.router,
			json!({"method": "lime_getEthTransactions", "params": [hash_list(&[7]), token], "id": 4}),
		)
		.await;
		call(
			&h.router,
			json!({"method": "lime_getEthTransactions", "params": [hash_list(&[8])], "id": 5}),
		)
		.await;
		h.gateway.writer.drain().await;

		let response = call(
			&h.router,
			json!({"method": "lime_getMyTransactions", "params": [token], "id": 6}),
		)
		.await;
		let mine = response["result"]["transactions"].as_array().unwrap();
		assert_eq!(mine.len(), 1);
		assert_eq!(mine[0]["transactionHash"], hash_key(&B256::repeat_byte(7)));
	}

	#[tokio::test]
	async fn test_invalid_token_rejected_before_cache_read() {
		let h = harness(&[]);
		let response = call(
			&h.router,
			json!({"method": "lime_getMyTransactions", "params": ["not-a-token"], "id": 7}),
		)
		.await;
		assert_eq!(response["result"], Value::Null);
		assert!(response["error"]
			.as_str()
			.unwrap()
			.starts_with("invalid token"));

		let response = call(
			&h.router,
			json!({"method": "lime_getEthTransactions", "params": [hash_list(&[1]), "forged"], "id": 8}),
		)
		.await;
		assert_eq!(response["result"], Value::Null);
		assert!(response["error"]
			.as_str()
			.unwrap()
			.starts_with("invalid token"));

		h.gateway.writer.drain().await;
		assert_eq!(h.storage.reads.load(Ordering::SeqCst), 0);
		assert!(h.storage.get_all_txs().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_authenticate_positional_and_bad_credentials() {
		let h = harness(&[]);
		let response = call(
			&h.router,
			json!({"method": "lime_authenticate", "params": ["alice", "alice"], "id": 9}),
		)
		.await;
		assert!(response["result"]["token"].is_string());

		let response = call(
			&h.router,
			json!({"method": "lime_authenticate", "params": ["alice", "wrong"], "id": 10}),
		)
		.await;
		assert_eq!(response["error"], "invalid credentials");
	}

	#[tokio::test]
	async fn test_protocol_errors() {
		let h = harness(&[]);

		let response = call(&h.router, json!({"method": "getAllTransactions", "params": [], "id": 11})).await;
		assert_eq!(response["error"], "rpc: invalid method: getAllTransactions");
		assert_eq!(response["id"], 11);

		let response = call(&h.router, json!({"method": "lime_getMyTransactions", "id": 12})).await;
		assert_eq!(
			response["error"],
			"rpc: method request ill-formed: missing params field"
		);

		// zero-argument handlers tolerate a missing params field
		let response = call(&h.router, json!({"method": "lime_getAllTransactions", "id": 13})).await;
		assert_eq!(response["error"], Value::Null);

		let response = call(&h.router, json!({"method": "lime_doSomething", "params": [], "id": 14})).await;
		assert_eq!(response["error"], "rpc: can't find method Lime.DoSomething");

		let response = call(&h.router, json!({"method": "other_getAllTransactions", "params": [], "id": 15})).await;
		assert_eq!(response["error"], "rpc: can't find service Other");
	}

	#[tokio::test]
	async fn test_notification_has_no_body() {
		let h = harness(&[]);
		let (status, body) = post(
			&h.router,
			"application/json",
			json!({"method": "lime_getAllTransactions", "params": []}).to_string(),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert!(body.is_empty());
	}

	#[tokio::test]
	async fn test_transport_errors() {
		let h = harness(&[]);
		let body = json!({"method": "lime_getAllTransactions", "params": [], "id": 1}).to_string();

		let (status, _) = post(&h.router, "text/plain", body.clone()).await;
		assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

		let (status, _) = post(&h.router, "application/json;charset=UTF-8", body).await;
		assert_eq!(status, StatusCode::OK);

		let (status, body) = post(&h.router, "application/json", "{not json".to_string()).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		let response: Value = serde_json::from_slice(&body).unwrap();
		assert_eq!(response["id"], Value::Null);
		assert!(response["error"].is_string());
	}

	#[tokio::test]
	async fn test_health() {
		let h = harness(&[]);
		let request = Request::builder()
			.uri("/health")
			.body(Body::empty())
			.unwrap();
		let response = h.router.clone().oneshot(request).await.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
		let body = response.into_body().collect().await.unwrap().to_bytes();
		let value: Value = serde_json::from_slice(&body).unwrap();
		assert_eq!(value, json!({"status": "ok"}));
	}
}
