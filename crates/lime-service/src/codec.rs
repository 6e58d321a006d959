//! JSON-RPC dispatch codec.
//!
//! Wire methods use the flattened `service_method` form (`lime_getAllTransactions`)
//! and map onto the internal `Service.Method` key (`Lime.GetAllTransactions`).
//! Parameters arrive as a JSON array and are bound onto a fixed argument type
//! per handler, described by [`RpcArgs`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Errors raised while decoding a request envelope.
#[derive(Debug, Error)]
pub enum CodecError {
	#[error("rpc: invalid method: {0}")]
	InvalidMethod(String),

	#[error("rpc: method request ill-formed: missing params field")]
	MissingParams,

	#[error("rpc: invalid params: {0}")]
	InvalidParams(String),
}

/// An inbound request envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
	pub method: String,
	#[serde(default)]
	pub params: Option<Value>,
	/// Absent or `null` marks a notification.
	#[serde(default)]
	pub id: Option<Value>,
}

impl RpcRequest {
	pub fn is_notification(&self) -> bool {
		self.id.is_none()
	}
}

/// An outbound response envelope. `result` and `error` are always present,
/// exactly one of them non-null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
	pub result: Value,
	pub error: Option<String>,
	pub id: Value,
}

impl RpcResponse {
	pub fn success(id: Value, result: Value) -> Self {
		Self {
			result,
			error: None,
			id,
		}
	}

	pub fn failure(id: Value, error: impl fmt::Display) -> Self {
		Self {
			result: Value::Null,
			error: Some(error.to_string()),
			id,
		}
	}
}

/// Encodes a handler outcome. Notifications get no response at all.
pub fn encode<E: fmt::Display>(id: Option<Value>, outcome: Result<Value, E>) -> Option<RpcResponse> {
	let id = id?;
	Some(match outcome {
		Ok(result) => RpcResponse::success(id, result),
		Err(e) => RpcResponse::failure(id, e),
	})
}

/// Internal two-part dispatch key, displayed as `Service.Method`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchKey {
	pub service: String,
	pub method: String,
}

impl DispatchKey {
	/// Translates a wire method name. Exactly one `_` separating two
	/// non-empty segments is accepted.
	pub fn parse(wire: &str) -> Result<Self, CodecError> {
		let mut parts = wire.split('_');
		match (parts.next(), parts.next(), parts.next()) {
			(Some(service), Some(method), None) if !service.is_empty() && !method.is_empty() => {
				Ok(Self {
					service: capitalize(service),
					method: capitalize(method),
				})
			}
			_ => Err(CodecError::InvalidMethod(wire.to_string())),
		}
	}
}

impl fmt::Display for DispatchKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}", self.service, self.method)
	}
}

fn capitalize(segment: &str) -> String {
	let mut chars = segment.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

/// How a handler's arguments are laid out in `params`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamShape {
	/// One struct argument. A lone object element binds by field name,
	/// anything else binds the array positionally onto the fields.
	Structured,
	/// The array elements are the arguments, in order.
	Positional,
}

/// Fixed argument type of a handler.
pub trait RpcArgs: DeserializeOwned {
	const SHAPE: ParamShape;
	/// Maximum number of positional arguments.
	const ARITY: usize;
	/// Leading arguments that must be present.
	const REQUIRED: usize;
}

/// Binds `params` onto the argument type of a handler.
pub fn bind<A: RpcArgs>(params: Option<&Value>) -> Result<A, CodecError> {
	let elements = match params {
		Some(Value::Array(elements)) => elements.as_slice(),
		Some(Value::Null) | None if A::REQUIRED == 0 => &[][..],
		Some(Value::Null) | None => return Err(CodecError::MissingParams),
		Some(_) => {
			return Err(CodecError::InvalidParams(
				"params must be an array".to_string(),
			))
		}
	};

	if A::SHAPE == ParamShape::Structured {
		if let [object @ Value::Object(_)] = elements {
			return decode(object.clone());
		}
	}

	if elements.len() > A::ARITY {
		return Err(CodecError::InvalidParams(format!(
			"expected at most {} params, got {}",
			A::ARITY,
			elements.len()
		)));
	}
	if elements.len() < A::REQUIRED {
		return Err(CodecError::InvalidParams(format!(
			"expected at least {} params, got {}",
			A::REQUIRED,
			elements.len()
		)));
	}

	// Trailing optional arguments may be omitted
	let mut padded = elements.to_vec();
	padded.resize(A::ARITY, Value::Null);
	decode(Value::Array(padded))
}

fn decode<A: DeserializeOwned>(value: Value) -> Result<A, CodecError> {
	serde_json::from_value(value).map_err(|e| CodecError::InvalidParams(e.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[derive(Debug, Deserialize, PartialEq)]
	struct Pair(String, Option<String>);

	impl RpcArgs for Pair {
		const SHAPE: ParamShape = ParamShape::Positional;
		const ARITY: usize = 2;
		const REQUIRED: usize = 1;
	}

	#[derive(Debug, Deserialize, PartialEq)]
	struct Single {
		token: String,
	}

	impl RpcArgs for Single {
		const SHAPE: ParamShape = ParamShape::Positional;
		const ARITY: usize = 1;
		const REQUIRED: usize = 1;
	}

	#[derive(Debug, Deserialize, PartialEq)]
	struct Nothing {}

	impl RpcArgs for Nothing {
		const SHAPE: ParamShape = ParamShape::Positional;
		const ARITY: usize = 0;
		const REQUIRED: usize = 0;
	}

	#[derive(Debug, Deserialize, PartialEq)]
	struct Login {
		username: String,
		password: String,
	}

	impl RpcArgs for Login {
		const SHAPE: ParamShape = ParamShape::Structured;
		const ARITY: usize = 2;
		const REQUIRED: usize = 2;
	}

	#[test]
	fn test_dispatch_key_capitalizes_segments() {
		let key = DispatchKey::parse("lime_getEthTransactions").unwrap();
		assert_eq!(key.to_string(), "Lime.GetEthTransactions");
		assert_eq!(key.service, "Lime");

		let key = DispatchKey::parse("a_b").unwrap();
		assert_eq!(key.to_string(), "A.B");

		// already capitalized segments pass through unchanged
		let key = DispatchKey::parse("Lime_Authenticate").unwrap();
		assert_eq!(key.to_string(), "Lime.Authenticate");
	}

	#[test]
	fn test_dispatch_key_rejects_bad_separators() {
		for wire in ["", "lime", "lime_get_all", "_get", "lime_", "_", "lime.getAll"] {
			assert!(
				matches!(DispatchKey::parse(wire), Err(CodecError::InvalidMethod(_))),
				"{wire} should be rejected"
			);
		}
	}

	#[test]
	fn test_bind_positional_pads_optional() {
		let args: Pair = bind(Some(&json!(["abc"]))).unwrap();
		assert_eq!(args, Pair("abc".to_string(), None));

		let args: Pair = bind(Some(&json!(["abc", "tok"]))).unwrap();
		assert_eq!(args, Pair("abc".to_string(), Some("tok".to_string())));
	}

	#[test]
	fn test_bind_positional_errors() {
		assert!(matches!(bind::<Pair>(None), Err(CodecError::MissingParams)));
		assert!(matches!(
			bind::<Pair>(Some(&json!([]))),
			Err(CodecError::InvalidParams(_))
		));
		assert!(matches!(
			bind::<Pair>(Some(&json!(["a", "b", "c"]))),
			Err(CodecError::InvalidParams(_))
		));
		assert!(matches!(
			bind::<Pair>(Some(&json!({"0": "a"}))),
			Err(CodecError::InvalidParams(_))
		));
		assert!(matches!(
			bind::<Pair>(Some(&json!([42]))),
			Err(CodecError::InvalidParams(_))
		));
		assert_eq!(
			CodecError::MissingParams.to_string(),
			"rpc: method request ill-formed: missing params field"
		);
	}

	#[test]
	fn test_bind_single_positional_argument() {
		let args: Single = bind(Some(&json!(["header.claims.sig"]))).unwrap();
		assert_eq!(
			args,
			Single {
				token: "header.claims.sig".to_string()
			}
		);

		assert!(matches!(bind::<Single>(None), Err(CodecError::MissingParams)));
		assert!(matches!(
			bind::<Single>(Some(&json!([]))),
			Err(CodecError::InvalidParams(_))
		));
		assert!(matches!(
			bind::<Single>(Some(&json!(["a", "b"]))),
			Err(CodecError::InvalidParams(_))
		));
	}

	#[test]
	fn test_bind_no_args_accepts_missing_params() {
		assert_eq!(bind::<Nothing>(None).unwrap(), Nothing {});
		assert_eq!(bind::<Nothing>(Some(&json!([]))).unwrap(), Nothing {});
		assert!(bind::<Nothing>(Some(&json!(["extra"]))).is_err());
	}

	#[test]
	fn test_bind_structured() {
		let expected = Login {
			username: "alice".to_string(),
			password: "secret".to_string(),
		};

		let by_name: Login =
			bind(Some(&json!([{"username": "alice", "password": "secret"}]))).unwrap();
		assert_eq!(by_name, expected);

		let by_position: Login = bind(Some(&json!(["alice", "secret"]))).unwrap();
		assert_eq!(by_position, expected);

		assert!(matches!(
			bind::<Login>(Some(&json!([{"username": "alice"}]))),
			Err(CodecError::InvalidParams(_))
		));
	}

	#[test]
	fn test_request_id_and_encoding() {
		let request: RpcRequest =
			serde_json::from_str(r#"{"method":"lime_getAllTransactions","params":[]}"#).unwrap();
		assert!(request.is_notification());
		assert!(encode::<String>(request.id, Ok(json!(1))).is_none());

		let request: RpcRequest =
			serde_json::from_str(r#"{"method":"lime_getAllTransactions","id":null}"#).unwrap();
		assert!(request.is_notification());

		let ok = encode::<String>(Some(json!(7)), Ok(json!({"token": "t"}))).unwrap();
		assert_eq!(
			serde_json::to_value(&ok).unwrap(),
			json!({"result": {"token": "t"}, "error": null, "id": 7})
		);

		let failed = encode(Some(json!("abc")), Err::<Value, _>("boom")).unwrap();
		assert_eq!(
			serde_json::to_value(&failed).unwrap(),
			json!({"result": null, "error": "boom", "id": "abc"})
		);
	}
}
