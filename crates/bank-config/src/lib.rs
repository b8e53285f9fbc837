//! Configuration module for the bank account client.
//!
//! This module provides the structures for loading client configuration from a
//! TOML file. Environment variables of the form `${VAR}` or `${VAR:-default}`
//! are substituted before parsing, and the result is validated as a whole.
//!
//! The contract descriptor itself is not part of the TOML file: it is read from
//! the deployment file (or an ABI file) the configuration points to, see
//! [`ContractConfig::load_descriptor`].

#[cfg(any(test, feature = "testing"))]
pub mod builders;
mod deployment;

use bank_types::NetworkConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub use deployment::{DeployedContract, Deployment};

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
	/// Error that occurs when reading the deployment or ABI file.
	#[error("Deployment error: {0}")]
	Deployment(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Application identity.
	pub app: AppConfig,
	/// Network the wallet and the channels talk to.
	pub network: NetworkConfig,
	/// Where the contract descriptor comes from and which functions to call.
	pub contract: ContractConfig,
	/// Wallet implementations.
	pub wallet: WalletConfig,
	/// Confirmation tracker settings.
	#[serde(default)]
	pub tracker: TrackerConfig,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
	/// Name used in logs.
	pub name: String,
}

/// Source of the contract descriptor and names of the functions the session calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContractConfig {
	/// Deployment file written by the deployment script.
	pub deployment_file: Option<PathBuf>,
	/// Contract address, used together with `abi_file` when there is no deployment file.
	pub address: Option<String>,
	/// JSON ABI file, used together with `address`.
	pub abi_file: Option<PathBuf>,
	#[serde(default)]
	pub functions: FunctionsConfig,
}

/// Contract functions driving the session.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FunctionsConfig {
	/// View function returning the readiness sentinel.
	#[serde(default = "default_sentinel_function")]
	pub sentinel: String,
	/// Value the sentinel function must return for the session to unlock.
	#[serde(default = "default_expected_sentinel")]
	pub expected_sentinel: String,
	/// View function returning the account list.
	#[serde(default = "default_accounts_function")]
	pub accounts: String,
	/// State-changing function creating an account.
	#[serde(default = "default_create_account_function")]
	pub create_account: String,
	/// Authorized signers passed to the create function.
	#[serde(default = "default_create_account_signers")]
	pub create_account_signers: Vec<String>,
}

impl Default for FunctionsConfig {
	fn default() -> Self {
		Self {
			sentinel: default_sentinel_function(),
			expected_sentinel: default_expected_sentinel(),
			accounts: default_accounts_function(),
			create_account: default_create_account_function(),
			create_account_signers: default_create_account_signers(),
		}
	}
}

fn default_sentinel_function() -> String {
	"getTest".to_string()
}

fn default_expected_sentinel() -> String {
	"Hello World".to_string()
}

fn default_accounts_function() -> String {
	"getAccounts".to_string()
}

fn default_create_account_function() -> String {
	"createAccount".to_string()
}

/// Returns the fourth well-known local development account.
fn default_create_account_signers() -> Vec<String> {
	vec!["0x90F79bf6EB2c4f870365E785982E1f101E93b906".to_string()]
}

/// Wallet implementations keyed by name.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WalletConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Raw configuration table per implementation.
	pub implementations: HashMap<String, toml::Value>,
}

/// Confirmation tracker settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
	/// Interval between receipt polls.
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
	/// Blocks required on top of the inclusion block, counting it.
	#[serde(default = "default_min_confirmations")]
	pub min_confirmations: u64,
	/// Consecutive RPC failures after which the tracker reports the transaction lost.
	#[serde(default = "default_max_consecutive_failures")]
	pub max_consecutive_failures: u32,
}

impl Default for TrackerConfig {
	fn default() -> Self {
		Self {
			poll_interval_ms: default_poll_interval_ms(),
			min_confirmations: default_min_confirmations(),
			max_consecutive_failures: default_max_consecutive_failures(),
		}
	}
}

fn default_poll_interval_ms() -> u64 {
	1000
}

fn default_min_confirmations() -> u64 {
	1
}

fn default_max_consecutive_failures() -> u32 {
	5
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)));
				},
			},
		};

		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file.
	///
	/// Relative `deployment_file` and `abi_file` paths are resolved against the
	/// directory containing the configuration file.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let content = tokio::fs::read_to_string(path_buf).await?;
		let mut config: Config = content.parse()?;
		config.contract.resolve_paths(base_dir);
		Ok(config)
	}

	/// Validates the configuration to ensure all required fields are properly set.
	///
	/// The contract address is deliberately not checked here; a bad address
	/// surfaces as a read or submission failure at use.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.app.name.is_empty() {
			return Err(ConfigError::Validation("App name cannot be empty".into()));
		}

		if self.network.chain_id == 0 {
			return Err(ConfigError::Validation(
				"network.chain_id must be greater than 0".into(),
			));
		}
		if self.network.rpc_url.is_empty() {
			return Err(ConfigError::Validation(
				"network.rpc_url cannot be empty".into(),
			));
		}

		match (
			&self.contract.deployment_file,
			&self.contract.address,
			&self.contract.abi_file,
		) {
			(Some(_), None, None) | (None, Some(_), Some(_)) => {},
			(Some(_), _, _) => {
				return Err(ConfigError::Validation(
					"contract.deployment_file cannot be combined with contract.address or contract.abi_file"
						.into(),
				));
			},
			_ => {
				return Err(ConfigError::Validation(
					"contract requires either deployment_file or both address and abi_file".into(),
				));
			},
		}

		let functions = &self.contract.functions;
		for (field, name) in [
			("sentinel", &functions.sentinel),
			("accounts", &functions.accounts),
			("create_account", &functions.create_account),
		] {
			if name.is_empty() {
				return Err(ConfigError::Validation(format!(
					"contract.functions.{} cannot be empty",
					field
				)));
			}
		}

		if self.wallet.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one wallet implementation must be configured".into(),
			));
		}
		if !self
			.wallet
			.implementations
			.contains_key(&self.wallet.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary wallet '{}' not found in implementations",
				self.wallet.primary
			)));
		}

		if self.tracker.poll_interval_ms == 0 {
			return Err(ConfigError::Validation(
				"tracker.poll_interval_ms must be greater than 0".into(),
			));
		}
		if self.tracker.min_confirmations == 0 {
			return Err(ConfigError::Validation(
				"tracker.min_confirmations must be at least 1".into(),
			));
		}
		if self.tracker.min_confirmations > 100 {
			return Err(ConfigError::Validation(
				"tracker.min_confirmations cannot exceed 100".into(),
			));
		}
		if self.tracker.max_consecutive_failures == 0 {
			return Err(ConfigError::Validation(
				"tracker.max_consecutive_failures must be greater than 0".into(),
			));
		}

		Ok(())
	}
}

impl ContractConfig {
	fn resolve_paths(&mut self, base_dir: &Path) {
		for path in [&mut self.deployment_file, &mut self.abi_file]
			.into_iter()
			.flatten()
		{
			if path.is_relative() {
				*path = base_dir.join(&*path);
			}
		}
	}
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved and the configuration is validated
/// after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
