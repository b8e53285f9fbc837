//! Local key wallet.
//!
//! Holds a private key in process and submits transactions through an Alloy
//! provider with a wallet filler, so nonce, gas and signing are handled by the
//! provider stack. Suitable for development chains and scripted accounts.

use crate::{ContractCall, WalletError, WalletInterface};
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address as AlloyAddress, Bytes};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use bank_types::{
	Address, ConfigSchema, Connection, Field, FieldType, ImplementationRegistry, NetworkConfig,
	Schema, SecretString, TransactionHash, ValidationError,
};
use tokio::sync::watch;

/// Wallet backed by a locally held private key.
pub struct LocalWallet {
	signer: PrivateKeySigner,
	provider: DynProvider,
	chain_id: u64,
	state: watch::Sender<Connection>,
}

impl LocalWallet {
	pub fn new(signer: PrivateKeySigner, rpc_url: &str, chain_id: u64) -> Result<Self, WalletError> {
		let url: Url = rpc_url
			.parse()
			.map_err(|e| WalletError::Network(format!("Invalid RPC URL {}: {}", rpc_url, e)))?;

		let signer = signer.with_chain_id(Some(chain_id));
		let provider = ProviderBuilder::new()
			.wallet(EthereumWallet::from(signer.clone()))
			.connect_http(url)
			.erased();

		let (state, _) = watch::channel(Connection::disconnected());

		Ok(Self {
			signer,
			provider,
			chain_id,
			state,
		})
	}

	fn address(&self) -> Address {
		Address::from(self.signer.address())
	}

	/// Publishes the disconnected state; returns whether a connection was live.
	fn drop_connection(&self) -> bool {
		let mut was_connected = false;
		self.state.send_modify(|connection| {
			was_connected = connection.connected;
			*connection = connection.dropped();
		});
		was_connected
	}
}

/// Configuration schema for the local wallet.
pub struct LocalWalletSchema;

impl LocalWalletSchema {
	/// Static validation method for use before instance creation
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		Self.validate(config)
	}
}

impl ConfigSchema for LocalWalletSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("private_key", FieldType::String).with_validator(|value| {
				let key = value.as_str().unwrap_or_default();
				let hex_part = key.strip_prefix("0x").unwrap_or(key);
				if hex_part.len() != 64 {
					return Err("Private key must be 64 hex characters (32 bytes)".to_string());
				}
				if hex::decode(hex_part).is_err() {
					return Err("Private key must be valid hexadecimal".to_string());
				}
				Ok(())
			})],
			vec![Field::new("rpc_url", FieldType::String)],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl WalletInterface for LocalWallet {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LocalWalletSchema)
	}

	async fn connect(&self) -> Result<Connection, WalletError> {
		let actual = match self.provider.get_chain_id().await {
			Ok(chain_id) => chain_id,
			Err(e) => {
				self.drop_connection();
				return Err(WalletError::Network(format!("Failed to reach node: {}", e)));
			},
		};

		if actual != self.chain_id {
			self.drop_connection();
			return Err(WalletError::WrongChain {
				expected: self.chain_id,
				actual,
			});
		}

		let address = self.address();
		self.state
			.send_modify(|connection| *connection = connection.established(address));
		let connection = self.state.borrow().clone();
		tracing::info!(
			address = %self.address(),
			chain_id = actual,
			epoch = connection.epoch,
			"Local wallet connected"
		);
		Ok(connection)
	}

	async fn disconnect(&self) {
		if self.drop_connection() {
			tracing::info!("Local wallet disconnected");
		}
	}

	fn current_address(&self) -> Option<Address> {
		self.state.borrow().address.clone()
	}

	fn connection(&self) -> watch::Receiver<Connection> {
		self.state.subscribe()
	}

	async fn submit(&self, call: ContractCall) -> Result<TransactionHash, WalletError> {
		if !self.state.borrow().is_ready() {
			return Err(WalletError::NotConnected);
		}

		let request = TransactionRequest::default()
			.with_from(self.signer.address())
			.with_to(AlloyAddress::from_slice(call.to.as_slice()))
			.with_input(Bytes::from(call.data));

		let pending = self
			.provider
			.send_transaction(request)
			.await
			.map_err(|e| WalletError::Rejected(e.to_string()))?;

		let hash = TransactionHash(pending.tx_hash().to_vec());
		tracing::info!(tx_hash = %hash, "Submitted transaction");
		Ok(hash)
	}
}

/// Factory function to create a local wallet from configuration.
///
/// Configuration parameters:
/// - `private_key`: hex-encoded key, with or without 0x prefix
/// - `rpc_url` (optional): node endpoint, defaults to the network endpoint
pub fn create_wallet(
	config: &toml::Value,
	network: &NetworkConfig,
) -> Result<Box<dyn WalletInterface>, WalletError> {
	LocalWalletSchema::validate_config(config)
		.map_err(|e| WalletError::InvalidKey(format!("Invalid configuration: {}", e)))?;

	let private_key = config
		.get("private_key")
		.and_then(|v| v.as_str())
		.map(SecretString::from)
		.ok_or_else(|| WalletError::InvalidKey("private_key is required".to_string()))?;

	let signer = private_key
		.with_exposed(|key| key.parse::<PrivateKeySigner>())
		.map_err(|e| WalletError::InvalidKey(e.to_string()))?;

	let rpc_url = config
		.get("rpc_url")
		.and_then(|v| v.as_str())
		.unwrap_or(&network.rpc_url);

	Ok(Box::new(LocalWallet::new(signer, rpc_url, network.chain_id)?))
}

/// Registry for the local wallet implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = crate::WalletFactory;

	fn factory() -> Self::Factory {
		create_wallet
	}
}

impl crate::WalletRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const DEV_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

	fn network(rpc_url: &str) -> NetworkConfig {
		NetworkConfig {
			chain_id: 31337,
			rpc_url: rpc_url.to_string(),
		}
	}

	fn config(key: &str) -> toml::Value {
		toml::from_str(&format!("private_key = \"{}\"", key)).unwrap()
	}

	#[test]
	fn test_schema_requires_private_key() {
		let empty: toml::Value = toml::from_str("").unwrap();
		assert!(matches!(
			LocalWalletSchema::validate_config(&empty),
			Err(ValidationError::MissingField(field)) if field == "private_key"
		));
	}

	#[test]
	fn test_schema_rejects_short_key() {
		assert!(matches!(
			LocalWalletSchema::validate_config(&config("0x1234")),
			Err(ValidationError::InvalidValue { .. })
		));
	}

	#[test]
	fn test_schema_accepts_key_without_prefix() {
		let key = DEV_KEY.trim_start_matches("0x");
		assert!(LocalWalletSchema::validate_config(&config(key)).is_ok());
	}

	#[test]
	fn test_create_wallet_rejects_invalid_key() {
		let result = create_wallet(&config("0xnothex"), &network("http://127.0.0.1:8545"));
		assert!(matches!(result, Err(WalletError::InvalidKey(_))));
	}

	#[tokio::test]
	async fn test_starts_disconnected() {
		let wallet = create_wallet(&config(DEV_KEY), &network("http://127.0.0.1:8545")).unwrap();
		assert!(wallet.current_address().is_none());
		assert_eq!(*wallet.connection().borrow(), Connection::disconnected());
	}

	#[tokio::test]
	async fn test_connect_to_unreachable_node_fails_closed() {
		let wallet = create_wallet(&config(DEV_KEY), &network("http://127.0.0.1:1")).unwrap();
		let result = wallet.connect().await;
		assert!(matches!(result, Err(WalletError::Network(_))));
		assert!(!wallet.connection().borrow().connected);
		assert!(wallet.current_address().is_none());
	}

	#[tokio::test]
	async fn test_submit_without_connection() {
		let wallet = create_wallet(&config(DEV_KEY), &network("http://127.0.0.1:8545")).unwrap();
		let call = ContractCall {
			to: DEV_ADDRESS.parse().unwrap(),
			data: vec![],
		};
		assert!(matches!(
			wallet.submit(call).await,
			Err(WalletError::NotConnected)
		));
	}

	#[tokio::test]
	async fn test_disconnect_is_idempotent() {
		let wallet = create_wallet(&config(DEV_KEY), &network("http://127.0.0.1:8545")).unwrap();
		let mut rx = wallet.connection();
		wallet.disconnect().await;
		wallet.disconnect().await;
		assert!(!rx.borrow_and_update().connected);
	}

	#[test]
	fn test_rpc_url_override() {
		let value: toml::Value = toml::from_str(&format!(
			"private_key = \"{}\"\nrpc_url = \"not a url\"",
			DEV_KEY
		))
		.unwrap();
		let result = create_wallet(&value, &network("http://127.0.0.1:8545"));
		assert!(matches!(result, Err(WalletError::Network(_))));
	}
}
