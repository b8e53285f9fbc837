//! Contract channels for the bank account client.
//!
//! This module carries every interaction with the deployed contract: batched
//! read-only calls, state-changing calls submitted through the wallet, and
//! receipt polling for submitted transactions. Each concern is a trait so that
//! the session engine can be driven by fakes in tests.

use async_trait::async_trait;
use bank_types::{Address, TransactionHash, TransactionReceipt};
use bank_wallet::WalletError;
use thiserror::Error;

pub mod abi;
pub mod reader;
pub mod tracker;
pub mod writer;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

pub use reader::{ContractReader, ReadChannel};
pub use tracker::{ConfirmationTracker, ReceiptTracker, TrackerSettings, TrackerStream};
pub use writer::{ContractWriter, WriteChannel};

/// Errors that can occur while talking to the contract.
#[derive(Debug, Error)]
pub enum ChannelError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// The contract interface does not declare the function.
	#[error("Unknown function: {0}")]
	UnknownFunction(String),
	/// The configured contract address could not be parsed.
	#[error("Invalid contract address: {0}")]
	InvalidAddress(String),
	/// Arguments could not be encoded for the function's inputs.
	#[error("Encoding error: {0}")]
	Encoding(String),
	/// Returned data could not be decoded with the function's outputs.
	#[error("Decoding error: {0}")]
	Decoding(String),
	/// The wallet refused or failed to submit the transaction.
	#[error("Submission failed: {0}")]
	Submission(String),
	/// No wallet connection is active.
	#[error("Wallet not connected")]
	NotConnected,
}

impl From<WalletError> for ChannelError {
	fn from(err: WalletError) -> Self {
		match err {
			WalletError::NotConnected => ChannelError::NotConnected,
			WalletError::Network(msg) => ChannelError::Network(msg),
			other => ChannelError::Submission(other.to_string()),
		}
	}
}

/// Trait defining the node operations the channels rely on.
///
/// Implementations must be cheap to share; channels hold them behind an `Arc`.
#[async_trait]
pub trait RpcInterface: Send + Sync {
	/// Executes a read-only call against the latest block.
	async fn call(&self, to: &Address, data: Vec<u8>) -> Result<Vec<u8>, ChannelError>;

	/// Retrieves the receipt for a transaction, or `None` if not yet mined.
	async fn get_receipt(
		&self,
		hash: &TransactionHash,
	) -> Result<Option<TransactionReceipt>, ChannelError>;

	/// Gets the current block number.
	async fn get_block_number(&self) -> Result<u64, ChannelError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_wallet_error_mapping() {
		assert!(matches!(
			ChannelError::from(WalletError::NotConnected),
			ChannelError::NotConnected
		));
		assert!(matches!(
			ChannelError::from(WalletError::Network("timeout".into())),
			ChannelError::Network(msg) if msg == "timeout"
		));
		assert!(matches!(
			ChannelError::from(WalletError::Rejected("user denied".into())),
			ChannelError::Submission(msg) if msg.contains("user denied")
		));
	}
}
