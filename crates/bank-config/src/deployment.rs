//! Contract descriptor loading.
//!
//! The deployment script writes a JSON file of the form
//! `{"contract": {"address": .., "signerAddress": .., "abi": ..}}` where `abi`
//! is the ABI array encoded as a JSON string. A plain ABI array is accepted
//! too. Alternatively the configuration can name an address and an ABI file.

use crate::{ConfigError, ContractConfig};
use alloy::json_abi::JsonAbi;
use bank_types::ContractDescriptor;
use serde::Deserialize;
use std::path::Path;

/// Contents of a deployment file.
#[derive(Debug, Clone, Deserialize)]
pub struct Deployment {
	pub contract: DeployedContract,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedContract {
	pub address: String,
	#[serde(default)]
	pub signer_address: Option<String>,
	abi: AbiSource,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum AbiSource {
	Inline(JsonAbi),
	Encoded(String),
}

impl AbiSource {
	fn into_abi(self) -> Result<JsonAbi, ConfigError> {
		match self {
			AbiSource::Inline(abi) => Ok(abi),
			AbiSource::Encoded(json) => serde_json::from_str(&json)
				.map_err(|e| ConfigError::Deployment(format!("Invalid encoded ABI: {}", e))),
		}
	}
}

impl Deployment {
	pub fn from_json(json: &str) -> Result<Self, ConfigError> {
		serde_json::from_str(json)
			.map_err(|e| ConfigError::Deployment(format!("Invalid deployment file: {}", e)))
	}

	pub fn into_descriptor(self) -> Result<ContractDescriptor, ConfigError> {
		let DeployedContract {
			address,
			signer_address,
			abi,
		} = self.contract;
		let mut descriptor = ContractDescriptor::new(address, abi.into_abi()?);
		descriptor.signer_address = signer_address;
		Ok(descriptor)
	}
}

impl ContractConfig {
	/// Reads the contract descriptor this configuration points to.
	pub async fn load_descriptor(&self) -> Result<ContractDescriptor, ConfigError> {
		let descriptor = match (&self.deployment_file, &self.address, &self.abi_file) {
			(Some(deployment_file), _, _) => {
				let content = read(deployment_file).await?;
				Deployment::from_json(&content)?.into_descriptor()?
			},
			(None, Some(address), Some(abi_file)) => {
				let content = read(abi_file).await?;
				let abi = AbiSource::Inline(serde_json::from_str(&content).map_err(|e| {
					ConfigError::Deployment(format!("Invalid ABI file {}: {}", abi_file.display(), e))
				})?);
				ContractDescriptor::new(address.clone(), abi.into_abi()?)
			},
			_ => {
				return Err(ConfigError::Validation(
					"contract requires either deployment_file or both address and abi_file".into(),
				));
			},
		};

		for function in [
			&self.functions.sentinel,
			&self.functions.accounts,
			&self.functions.create_account,
		] {
			if !descriptor.has_function(function) {
				tracing::warn!(function = %function, "Contract ABI does not declare function");
			}
		}

		tracing::info!(address = %descriptor.address, "Loaded contract descriptor");
		Ok(descriptor)
	}
}

async fn read(path: &Path) -> Result<String, ConfigError> {
	tokio::fs::read_to_string(path).await.map_err(|e| {
		ConfigError::Deployment(format!("Cannot read {}: {}", path.display(), e))
	})
}
