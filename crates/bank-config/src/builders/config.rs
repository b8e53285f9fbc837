//! Configuration builder for test and development setups.
//!
//! The built configuration points at a local development node and uses the
//! `local` wallet with the first well-known development key.

use crate::{
	ApiConfig, AppConfig, Config, ContractConfig, FunctionsConfig, TrackerConfig, WalletConfig,
};
use bank_types::NetworkConfig;
use std::collections::HashMap;
use std::path::PathBuf;

/// First well-known local development private key.
pub const DEV_PRIVATE_KEY: &str =
	"0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Builder for creating `Config` instances with a fluent API.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	app_name: String,
	chain_id: u64,
	rpc_url: String,
	contract_address: String,
	abi_file: PathBuf,
	private_key: String,
	tracker: TrackerConfig,
	api: Option<ApiConfig>,
}

impl ConfigBuilder {
	/// Creates a builder reading the contract ABI from `abi_file`.
	pub fn new(abi_file: impl Into<PathBuf>) -> Self {
		Self {
			app_name: "test-bank".to_string(),
			chain_id: 31337,
			rpc_url: "http://127.0.0.1:8545".to_string(),
			contract_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
			abi_file: abi_file.into(),
			private_key: DEV_PRIVATE_KEY.to_string(),
			tracker: TrackerConfig::default(),
			api: None,
		}
	}

	pub fn app_name(mut self, name: impl Into<String>) -> Self {
		self.app_name = name.into();
		self
	}

	pub fn chain_id(mut self, chain_id: u64) -> Self {
		self.chain_id = chain_id;
		self
	}

	/// Sets the node endpoint used by the wallet and the channels.
	pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
		self.rpc_url = url.into();
		self
	}

	pub fn contract_address(mut self, address: impl Into<String>) -> Self {
		self.contract_address = address.into();
		self
	}

	pub fn private_key(mut self, key: impl Into<String>) -> Self {
		self.private_key = key.into();
		self
	}

	pub fn tracker(mut self, tracker: TrackerConfig) -> Self {
		self.tracker = tracker;
		self
	}

	/// Sets the API configuration.
	pub fn api(mut self, api: Option<ApiConfig>) -> Self {
		self.api = api;
		self
	}

	/// Builds the `Config` with the configured values.
	///
	/// The result is not validated; `Config::from_str` remains the only
	/// validating entry point.
	pub fn build(self) -> Config {
		let mut local = toml::map::Map::new();
		local.insert(
			"private_key".to_string(),
			toml::Value::String(self.private_key),
		);

		Config {
			app: AppConfig {
				name: self.app_name,
			},
			network: NetworkConfig {
				chain_id: self.chain_id,
				rpc_url: self.rpc_url,
			},
			contract: ContractConfig {
				deployment_file: None,
				address: Some(self.contract_address),
				abi_file: Some(self.abi_file),
				functions: FunctionsConfig::default(),
			},
			wallet: WalletConfig {
				primary: "local".to_string(),
				implementations: HashMap::from([("local".to_string(), toml::Value::Table(local))]),
			},
			tracker: self.tracker,
			api: self.api,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_target_local_node() {
		let config = ConfigBuilder::new("abi.json").build();

		assert_eq!(config.network.chain_id, 31337);
		assert_eq!(config.wallet.primary, "local");
		assert!(config.wallet.implementations.contains_key("local"));
		assert_eq!(config.contract.abi_file, Some(PathBuf::from("abi.json")));
		assert!(config.contract.deployment_file.is_none());
		assert!(config.api.is_none());
	}

	#[test]
	fn test_overrides_are_applied() {
		let config = ConfigBuilder::new("abi.json")
			.app_name("custom")
			.chain_id(1)
			.rpc_url("http://node:8545")
			.private_key("0x01")
			.build();

		assert_eq!(config.app.name, "custom");
		assert_eq!(config.network.chain_id, 1);
		assert_eq!(config.network.rpc_url, "http://node:8545");
		let key = config.wallet.implementations["local"]
			.get("private_key")
			.and_then(|v| v.as_str());
		assert_eq!(key, Some("0x01"));
	}
}
