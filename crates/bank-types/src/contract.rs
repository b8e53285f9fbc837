//! Contract descriptor and read query types.
//!
//! A read produces a [`Payload`], an opaque value that can only be inspected
//! through [`Payload::normalize`]. Normalization is a canonical serialize and
//! deserialize round-trip, so comparisons never depend on how a decoder chose
//! to represent the value internally.

use alloy::json_abi::JsonAbi;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Static description of the deployed contract.
///
/// The address is kept exactly as configured. It is parsed only when a call is
/// made, so a malformed address surfaces as a failure on every read and write.
#[derive(Debug, Clone)]
pub struct ContractDescriptor {
	/// Contract address as written in configuration.
	pub address: String,
	/// Interface definition used to encode calls and decode results.
	pub abi: JsonAbi,
	/// Address that deployed the contract, when known.
	pub signer_address: Option<String>,
}

impl ContractDescriptor {
	pub fn new(address: impl Into<String>, abi: JsonAbi) -> Self {
		Self {
			address: address.into(),
			abi,
			signer_address: None,
		}
	}

	/// Returns true if the interface declares a function with this name.
	pub fn has_function(&self, name: &str) -> bool {
		self.abi.function(name).is_some_and(|f| !f.is_empty())
	}
}

/// A named contract call with its ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractQuery {
	function_name: String,
	args: Vec<serde_json::Value>,
}

impl ContractQuery {
	pub fn new(function_name: impl Into<String>, args: Vec<serde_json::Value>) -> Self {
		Self {
			function_name: function_name.into(),
			args,
		}
	}

	/// A query with no arguments.
	pub fn call(function_name: impl Into<String>) -> Self {
		Self::new(function_name, Vec::new())
	}

	pub fn function_name(&self) -> &str {
		&self.function_name
	}

	pub fn args(&self) -> &[serde_json::Value] {
		&self.args
	}
}

/// Errors produced when normalizing a payload.
#[derive(Debug, Error)]
pub enum PayloadError {
	#[error("Payload could not be encoded: {0}")]
	Encode(String),
	#[error("Payload does not have the expected shape: {0}")]
	Shape(String),
}

/// Opaque decoded return value of a contract call.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Payload(serde_json::Value);

impl Payload {
	pub fn new(raw: serde_json::Value) -> Self {
		Self(raw)
	}

	/// Round-trips the payload through its canonical JSON encoding.
	pub fn normalize(&self) -> Result<serde_json::Value, PayloadError> {
		self.normalize_into()
	}

	/// Round-trips the payload through its canonical JSON encoding into `T`.
	pub fn normalize_into<T: DeserializeOwned>(&self) -> Result<T, PayloadError> {
		let encoded =
			serde_json::to_vec(&self.0).map_err(|e| PayloadError::Encode(e.to_string()))?;
		serde_json::from_slice(&encoded).map_err(|e| PayloadError::Shape(e.to_string()))
	}
}

/// Latest state of one query.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
	/// Decoded value once the query has resolved successfully.
	pub value: Option<Payload>,
	/// True while the query is outstanding.
	pub pending: bool,
	/// Failure message if the query failed.
	pub error: Option<String>,
}

impl QueryResult {
	pub fn pending() -> Self {
		Self {
			value: None,
			pending: true,
			error: None,
		}
	}

	pub fn resolved(value: Payload) -> Self {
		Self {
			value: Some(value),
			pending: false,
			error: None,
		}
	}

	pub fn failed(error: impl Into<String>) -> Self {
		Self {
			value: None,
			pending: false,
			error: Some(error.into()),
		}
	}
}

/// Results for a set of queries issued together, in issue order.
#[derive(Debug, Clone, Serialize)]
pub struct QueryBatch {
	pub queries: Vec<ContractQuery>,
	pub results: Vec<QueryResult>,
}

impl QueryBatch {
	/// A batch whose members have all been issued and none resolved.
	pub fn pending(queries: Vec<ContractQuery>) -> Self {
		let results = queries.iter().map(|_| QueryResult::pending()).collect();
		Self { queries, results }
	}

	/// True while any member of the batch is outstanding.
	pub fn is_pending(&self) -> bool {
		self.results.len() < self.queries.len() || self.results.iter().any(|r| r.pending)
	}

	/// Looks up the result of the first query calling `function_name`.
	pub fn get(&self, function_name: &str) -> Option<&QueryResult> {
		self.queries
			.iter()
			.position(|q| q.function_name() == function_name)
			.and_then(|i| self.results.get(i))
	}

	pub fn iter(&self) -> impl Iterator<Item = (&ContractQuery, &QueryResult)> {
		self.queries.iter().zip(self.results.iter())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_normalize_string_payload() {
		let payload = Payload::new(json!("Hello World"));
		let value: String = payload.normalize_into().unwrap();
		assert_eq!(value, "Hello World");
	}

	#[test]
	fn test_normalize_rejects_wrong_shape() {
		let payload = Payload::new(json!(["Hello World"]));
		assert!(matches!(
			payload.normalize_into::<String>(),
			Err(PayloadError::Shape(_))
		));
	}

	#[test]
	fn test_batch_pending_until_every_member_resolves() {
		let mut batch = QueryBatch::pending(vec![
			ContractQuery::call("getTest"),
			ContractQuery::call("getAccounts"),
		]);
		assert!(batch.is_pending());

		batch.results[0] = QueryResult::resolved(Payload::new(json!("Hello World")));
		assert!(batch.is_pending());

		batch.results[1] = QueryResult::failed("execution reverted");
		assert!(!batch.is_pending());
		assert_eq!(
			batch.get("getAccounts").and_then(|r| r.error.clone()),
			Some("execution reverted".to_string())
		);
	}

	#[test]
	fn test_batch_with_missing_results_is_pending() {
		let batch = QueryBatch {
			queries: vec![ContractQuery::call("getTest")],
			results: vec![],
		};
		assert!(batch.is_pending());
	}
}
