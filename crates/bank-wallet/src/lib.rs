//! Wallet module for the bank account client.
//!
//! The wallet is the collaborator that owns the user's identity. It reports
//! connectivity, exposes the active address and authorizes and submits
//! transactions. The session only ever reads its connectivity; signing and
//! submission are delegated here and never inspected.

use async_trait::async_trait;
use bank_types::{
	Address, ConfigSchema, Connection, ImplementationRegistry, NetworkConfig, TransactionHash,
};
use thiserror::Error;
use tokio::sync::watch;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

/// Errors that can occur during wallet operations.
#[derive(Debug, Error)]
pub enum WalletError {
	/// The wallet is not connected.
	#[error("Wallet not connected")]
	NotConnected,
	/// The wallet is connected to a different chain than configured.
	#[error("Wrong chain: expected {expected}, wallet is on {actual}")]
	WrongChain { expected: u64, actual: u64 },
	/// The wallet or the node refused the transaction.
	#[error("Submission rejected: {0}")]
	Rejected(String),
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
}

/// A state-changing call ready to be signed and submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
	/// Contract receiving the call.
	pub to: Address,
	/// ABI-encoded calldata including the selector.
	pub data: Vec<u8>,
}

/// Trait defining the interface for wallet implementations.
#[async_trait]
pub trait WalletInterface: Send + Sync {
	/// Returns the configuration schema for this wallet implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Connects the wallet and reports the resulting connection.
	async fn connect(&self) -> Result<Connection, WalletError>;

	/// Disconnects the wallet.
	async fn disconnect(&self);

	/// Returns the active address, if connected.
	fn current_address(&self) -> Option<Address>;

	/// Subscribes to connectivity changes.
	///
	/// The receiver always holds the latest connection. Implementations
	/// advance [`Connection::epoch`] on every new connection so that a
	/// disconnect overwritten before it was read stays detectable.
	fn connection(&self) -> watch::Receiver<Connection>;

	/// Signs and submits a call, returning the transaction hash once accepted.
	///
	/// Does not wait for the transaction to be mined.
	async fn submit(&self, call: ContractCall) -> Result<TransactionHash, WalletError>;
}

/// Type alias for wallet factory functions.
pub type WalletFactory =
	fn(&toml::Value, &NetworkConfig) -> Result<Box<dyn WalletInterface>, WalletError>;

/// Registry trait for wallet implementations.
pub trait WalletRegistry: ImplementationRegistry<Factory = WalletFactory> {}

/// Get all registered wallet implementations.
pub fn get_all_implementations() -> Vec<(&'static str, WalletFactory)> {
	use implementations::local;

	vec![(local::Registry::NAME, local::Registry::factory())]
}

/// Service that wraps the configured wallet implementation.
pub struct WalletService {
	implementation: Box<dyn WalletInterface>,
}

impl WalletService {
	pub fn new(implementation: Box<dyn WalletInterface>) -> Self {
		Self { implementation }
	}

	pub async fn connect(&self) -> Result<Connection, WalletError> {
		self.implementation.connect().await
	}

	pub async fn disconnect(&self) {
		self.implementation.disconnect().await
	}

	pub fn connection(&self) -> watch::Receiver<Connection> {
		self.implementation.connection()
	}

	/// Submits a call through the wallet.
	///
	/// Fails with [`WalletError::NotConnected`] without contacting the wallet
	/// when no connection is active.
	pub async fn submit(&self, call: ContractCall) -> Result<TransactionHash, WalletError> {
		if !self.implementation.connection().borrow().is_ready() {
			return Err(WalletError::NotConnected);
		}
		self.implementation.submit(call).await
	}
}
