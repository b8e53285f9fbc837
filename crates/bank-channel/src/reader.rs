//! Batched read-only calls.

use crate::abi::{decode_output, encode_call, find_function};
use crate::{ChannelError, RpcInterface};
use async_trait::async_trait;
use bank_types::{Address, ContractDescriptor, ContractQuery, QueryBatch, QueryResult};
use futures::future::join_all;
use std::sync::Arc;

/// Executes a set of read-only queries as one unit.
#[async_trait]
pub trait ReadChannel: Send + Sync {
	/// Runs every query and resolves once all of them have resolved.
	///
	/// The returned batch holds one result per query in input order. A failed
	/// query carries its own error and does not affect its siblings.
	async fn read_batch(
		&self,
		descriptor: &ContractDescriptor,
		queries: Vec<ContractQuery>,
	) -> QueryBatch;
}

/// [`ReadChannel`] backed by `eth_call`.
pub struct ContractReader {
	rpc: Arc<dyn RpcInterface>,
}

impl ContractReader {
	pub fn new(rpc: Arc<dyn RpcInterface>) -> Self {
		Self { rpc }
	}

	async fn read_one(&self, descriptor: &ContractDescriptor, query: &ContractQuery) -> QueryResult {
		match self.try_read(descriptor, query).await {
			Ok(payload) => QueryResult::resolved(payload),
			Err(e) => {
				tracing::warn!(function = %query.function_name(), error = %e, "Contract read failed");
				QueryResult::failed(e.to_string())
			},
		}
	}

	async fn try_read(
		&self,
		descriptor: &ContractDescriptor,
		query: &ContractQuery,
	) -> Result<bank_types::Payload, ChannelError> {
		let to: Address = descriptor
			.address
			.parse()
			.map_err(|e| ChannelError::InvalidAddress(format!("{}: {}", descriptor.address, e)))?;
		let function = find_function(descriptor, query)?;
		let data = encode_call(function, query)?;
		let output = self.rpc.call(&to, data).await?;
		decode_output(function, &output)
	}
}

#[async_trait]
impl ReadChannel for ContractReader {
	async fn read_batch(
		&self,
		descriptor: &ContractDescriptor,
		queries: Vec<ContractQuery>,
	) -> QueryBatch {
		tracing::debug!(queries = queries.len(), "Reading batch");
		let results = join_all(queries.iter().map(|q| self.read_one(descriptor, q))).await;
		QueryBatch { queries, results }
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;
	use crate::abi::tests::{descriptor, function};
	use alloy::dyn_abi::{DynSolValue, FunctionExt};
	use bank_types::{TransactionHash, TransactionReceipt};
	use serde_json::json;
	use std::collections::HashMap;
	use std::sync::Mutex;
	use tokio::sync::Notify;

	/// Node double answering calls by selector.
	#[derive(Default)]
	pub(crate) struct FakeRpc {
		pub(crate) responses: Mutex<HashMap<[u8; 4], Result<Vec<u8>, String>>>,
		pub(crate) gate: Mutex<Option<([u8; 4], Arc<Notify>)>>,
		pub(crate) calls: Mutex<Vec<(Address, Vec<u8>)>>,
	}

	impl FakeRpc {
		pub(crate) fn respond(&self, selector: [u8; 4], response: Result<Vec<u8>, String>) {
			self.responses.lock().unwrap().insert(selector, response);
		}
	}

	#[async_trait]
	impl RpcInterface for FakeRpc {
		async fn call(&self, to: &Address, data: Vec<u8>) -> Result<Vec<u8>, ChannelError> {
			let mut selector = [0u8; 4];
			selector.copy_from_slice(&data[..4]);
			self.calls.lock().unwrap().push((to.clone(), data));

			let gate = self
				.gate
				.lock()
				.unwrap()
				.as_ref()
				.filter(|(gated, _)| *gated == selector)
				.map(|(_, notify)| notify.clone());
			if let Some(notify) = gate {
				notify.notified().await;
			}

			let response = self.responses.lock().unwrap().get(&selector).cloned();
			match response {
				Some(Ok(data)) => Ok(data),
				Some(Err(e)) => Err(ChannelError::Network(e)),
				None => Err(ChannelError::Network("execution reverted".into())),
			}
		}

		async fn get_receipt(
			&self,
			_hash: &TransactionHash,
		) -> Result<Option<TransactionReceipt>, ChannelError> {
			Ok(None)
		}

		async fn get_block_number(&self) -> Result<u64, ChannelError> {
			Ok(0)
		}
	}

	fn selector(descriptor: &ContractDescriptor, name: &str) -> [u8; 4] {
		function(descriptor, name).selector().0
	}

	fn sentinel_output(descriptor: &ContractDescriptor, value: &str) -> Vec<u8> {
		function(descriptor, "getTest")
			.abi_encode_output(&[DynSolValue::String(value.into())])
			.unwrap()
	}

	#[tokio::test]
	async fn test_results_in_input_order() {
		let descriptor = descriptor();
		let rpc = Arc::new(FakeRpc::default());
		rpc.respond(
			selector(&descriptor, "getTest"),
			Ok(sentinel_output(&descriptor, "Hello World")),
		);
		rpc.respond(
			selector(&descriptor, "getAccounts"),
			Ok(function(&descriptor, "getAccounts")
				.abi_encode_output(&[DynSolValue::Array(vec![])])
				.unwrap()),
		);

		let reader = ContractReader::new(rpc.clone());
		let batch = reader
			.read_batch(
				&descriptor,
				vec![
					ContractQuery::call("getAccounts"),
					ContractQuery::call("getTest"),
				],
			)
			.await;

		assert!(!batch.is_pending());
		assert_eq!(batch.results.len(), 2);
		assert_eq!(
			batch.results[0].value.as_ref().unwrap().normalize().unwrap(),
			json!([])
		);
		assert_eq!(
			batch.results[1].value.as_ref().unwrap().normalize().unwrap(),
			json!("Hello World")
		);
		let calls = rpc.calls.lock().unwrap();
		assert!(calls.iter().all(|(to, _)| to.to_string() == descriptor.address.to_lowercase()));
	}

	#[tokio::test]
	async fn test_failing_member_does_not_affect_siblings() {
		let descriptor = descriptor();
		let rpc = Arc::new(FakeRpc::default());
		rpc.respond(
			selector(&descriptor, "getTest"),
			Ok(sentinel_output(&descriptor, "Hello World")),
		);
		rpc.respond(selector(&descriptor, "getAccounts"), Err("boom".into()));

		let reader = ContractReader::new(rpc);
		let batch = reader
			.read_batch(
				&descriptor,
				vec![
					ContractQuery::call("getTest"),
					ContractQuery::call("getAccounts"),
					ContractQuery::call("missing"),
				],
			)
			.await;

		assert!(batch.results[0].value.is_some());
		assert!(batch.results[0].error.is_none());
		assert!(batch.results[1].error.as_deref().unwrap().contains("boom"));
		assert!(batch.results[2].error.as_deref().unwrap().contains("Unknown function"));
	}

	#[tokio::test]
	async fn test_malformed_address_fails_every_member() {
		let mut descriptor = descriptor();
		descriptor.address = "0xnot-an-address".to_string();
		let rpc = Arc::new(FakeRpc::default());

		let reader = ContractReader::new(rpc.clone());
		let batch = reader
			.read_batch(
				&descriptor,
				vec![
					ContractQuery::call("getTest"),
					ContractQuery::call("getAccounts"),
				],
			)
			.await;

		assert!(batch
			.results
			.iter()
			.all(|r| r.error.as_deref().is_some_and(|e| e.contains("Invalid contract address"))));
		assert!(rpc.calls.lock().unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_batch_resolves_only_after_every_member() {
		let descriptor = descriptor();
		let rpc = Arc::new(FakeRpc::default());
		let release = Arc::new(Notify::new());
		rpc.respond(
			selector(&descriptor, "getTest"),
			Ok(sentinel_output(&descriptor, "Hello World")),
		);
		rpc.respond(
			selector(&descriptor, "getAccounts"),
			Ok(function(&descriptor, "getAccounts")
				.abi_encode_output(&[DynSolValue::Array(vec![])])
				.unwrap()),
		);
		*rpc.gate.lock().unwrap() = Some((selector(&descriptor, "getAccounts"), release.clone()));

		let reader = ContractReader::new(rpc.clone());
		let task = {
			let descriptor = descriptor.clone();
			tokio::spawn(async move {
				reader
					.read_batch(
						&descriptor,
						vec![
							ContractQuery::call("getTest"),
							ContractQuery::call("getAccounts"),
						],
					)
					.await
			})
		};

		// Wait until both calls have been issued.
		while rpc.calls.lock().unwrap().len() < 2 {
			tokio::task::yield_now().await;
		}
		tokio::time::sleep(std::time::Duration::from_millis(20)).await;
		assert!(!task.is_finished());

		release.notify_one();
		let batch = task.await.unwrap();
		assert!(!batch.is_pending());
		assert!(batch.results.iter().all(|r| r.value.is_some()));
	}
}
