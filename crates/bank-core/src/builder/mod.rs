//! Builder for constructing session engines.
//!
//! Loads the contract descriptor, creates the configured wallet through its
//! factory and wires the node client into the read, write and tracking
//! channels. Everything process-wide is created here once.

use crate::engine::{Channels, SessionEngine, SessionHandle};
use crate::session::SessionSettings;
use bank_channel::implementations::evm::alloy::create_http_rpc;
use bank_channel::{ContractReader, ContractWriter, ReceiptTracker, TrackerSettings};
use bank_config::{Config, TrackerConfig};
use bank_types::NetworkConfig;
use bank_wallet::{WalletError, WalletInterface, WalletService};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during session engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions needed to build a session engine.
pub struct SessionFactories<WF> {
	pub wallet_factories: HashMap<String, WF>,
}

fn tracker_settings(config: &TrackerConfig) -> TrackerSettings {
	TrackerSettings {
		poll_interval: Duration::from_millis(config.poll_interval_ms),
		min_confirmations: config.min_confirmations,
		max_consecutive_failures: config.max_consecutive_failures,
	}
}

/// Builder for constructing a SessionEngine from configuration.
pub struct SessionBuilder {
	config: Config,
}

impl SessionBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the engine and the handle that drives it.
	pub async fn build<WF>(
		self,
		factories: SessionFactories<WF>,
	) -> Result<(SessionEngine, SessionHandle), BuilderError>
	where
		WF: Fn(&toml::Value, &NetworkConfig) -> Result<Box<dyn WalletInterface>, WalletError>,
	{
		let descriptor = self
			.config
			.contract
			.load_descriptor()
			.await
			.map_err(|e| BuilderError::Config(e.to_string()))?;

		let wallet = Arc::new(self.build_wallet(&factories)?);

		let rpc = create_http_rpc(&self.config.network)
			.map_err(|e| BuilderError::Config(format!("Failed to create node client: {}", e)))?;

		let channels = Channels {
			reader: Arc::new(ContractReader::new(rpc.clone())),
			writer: Arc::new(ContractWriter::new(wallet.clone())),
			tracker: Arc::new(ReceiptTracker::new(
				rpc,
				tracker_settings(&self.config.tracker),
			)),
		};

		let settings = SessionSettings::from(&self.config.contract.functions);
		tracing::info!(
			app = %self.config.app.name,
			chain_id = self.config.network.chain_id,
			"Session engine built"
		);
		Ok(SessionEngine::new(settings, descriptor, wallet, channels))
	}

	fn build_wallet<WF>(&self, factories: &SessionFactories<WF>) -> Result<WalletService, BuilderError>
	where
		WF: Fn(&toml::Value, &NetworkConfig) -> Result<Box<dyn WalletInterface>, WalletError>,
	{
		let mut wallet_impls = HashMap::new();
		for (name, config) in &self.config.wallet.implementations {
			let Some(factory) = factories.wallet_factories.get(name) else {
				tracing::warn!(component = "wallet", implementation = %name, "Unknown implementation");
				continue;
			};
			match factory(config, &self.config.network) {
				Ok(implementation) => {
					let is_primary = &self.config.wallet.primary == name;
					tracing::info!(component = "wallet", implementation = %name, enabled = %is_primary, "Loaded");
					wallet_impls.insert(name.clone(), implementation);
				},
				Err(e) => {
					tracing::error!(
						component = "wallet",
						implementation = %name,
						error = %e,
						"Failed to create wallet implementation"
					);
					return Err(BuilderError::Config(format!(
						"Failed to create wallet implementation '{}': {}",
						name, e
					)));
				},
			}
		}

		let primary = &self.config.wallet.primary;
		let implementation = wallet_impls.remove(primary).ok_or_else(|| {
			BuilderError::MissingComponent(format!(
				"Primary wallet '{}' failed to load or has no registered factory",
				primary
			))
		})?;

		Ok(WalletService::new(implementation))
	}
}
