//! Node access for the contract channels using the Alloy library.

use crate::{ChannelError, RpcInterface};
use alloy::network::{ReceiptResponse as _, TransactionBuilder};
use alloy::primitives::{Address as AlloyAddress, Bytes, B256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use bank_types::{Address, NetworkConfig, TransactionHash, TransactionReceipt};
use std::sync::Arc;

/// Alloy-based EVM node client over HTTP.
pub struct AlloyRpc {
	provider: DynProvider,
}

impl AlloyRpc {
	pub fn new(rpc_url: &str) -> Result<Self, ChannelError> {
		let url: Url = rpc_url
			.parse()
			.map_err(|e| ChannelError::Network(format!("Invalid RPC URL {}: {}", rpc_url, e)))?;

		let provider = ProviderBuilder::new().connect_http(url).erased();
		Ok(Self { provider })
	}
}

#[async_trait]
impl RpcInterface for AlloyRpc {
	async fn call(&self, to: &Address, data: Vec<u8>) -> Result<Vec<u8>, ChannelError> {
		let request = TransactionRequest::default()
			.with_to(AlloyAddress::from_slice(to.as_slice()))
			.with_input(Bytes::from(data));

		let output = self
			.provider
			.call(request)
			.await
			.map_err(|e| ChannelError::Network(format!("eth_call failed: {}", e)))?;
		Ok(output.to_vec())
	}

	async fn get_receipt(
		&self,
		hash: &TransactionHash,
	) -> Result<Option<TransactionReceipt>, ChannelError> {
		if hash.0.len() != 32 {
			return Err(ChannelError::Network(format!(
				"Transaction hash must be 32 bytes, got {}",
				hash.0.len()
			)));
		}
		let tx_hash = B256::from_slice(&hash.0);

		let receipt = self
			.provider
			.get_transaction_receipt(tx_hash)
			.await
			.map_err(|e| ChannelError::Network(format!("Failed to get receipt: {}", e)))?;

		Ok(receipt.and_then(|receipt| {
			to_receipt(receipt.transaction_hash, receipt.block_number, receipt.status())
		}))
	}

	async fn get_block_number(&self) -> Result<u64, ChannelError> {
		self.provider
			.get_block_number()
			.await
			.map_err(|e| ChannelError::Network(format!("Failed to get block number: {}", e)))
	}
}

/// Builds the shared node client for a network.
pub fn create_http_rpc(network: &NetworkConfig) -> Result<Arc<dyn RpcInterface>, ChannelError> {
	let rpc = AlloyRpc::new(&network.rpc_url)?;
	tracing::info!(chain_id = network.chain_id, rpc_url = %network.rpc_url, "Created node client");
	Ok(Arc::new(rpc))
}

/// A receipt without a block number belongs to a pending transaction.
fn to_receipt(hash: B256, block_number: Option<u64>, success: bool) -> Option<TransactionReceipt> {
	Some(TransactionReceipt {
		hash: TransactionHash(hash.0.to_vec()),
		block_number: block_number?,
		success,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_invalid_url() {
		assert!(matches!(
			AlloyRpc::new("not a url"),
			Err(ChannelError::Network(_))
		));
	}

	#[tokio::test]
	async fn test_short_hash_is_rejected_before_lookup() {
		let rpc = AlloyRpc::new("http://127.0.0.1:1").unwrap();
		let result = rpc.get_receipt(&TransactionHash(vec![0xde, 0xad])).await;
		assert!(matches!(result, Err(ChannelError::Network(msg)) if msg.contains("32 bytes")));
	}

	#[test]
	fn test_receipt_without_block_is_pending() {
		assert!(to_receipt(B256::repeat_byte(0x11), None, true).is_none());

		let receipt = to_receipt(B256::repeat_byte(0x11), Some(7), false).unwrap();
		assert_eq!(receipt.hash, TransactionHash(vec![0x11; 32]));
		assert_eq!(receipt.block_number, 7);
		assert!(!receipt.success);
	}

	#[tokio::test]
	async fn test_unreachable_node() {
		let network = NetworkConfig {
			chain_id: 31337,
			rpc_url: "http://127.0.0.1:1".to_string(),
		};
		let rpc = create_http_rpc(&network).unwrap();
		assert!(matches!(
			rpc.get_block_number().await,
			Err(ChannelError::Network(_))
		));
	}
}
