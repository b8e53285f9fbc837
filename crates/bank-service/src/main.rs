//! Main entry point for the bank account service.
//!
//! This binary connects a wallet to the bank contract, runs the account
//! session engine and optionally exposes the session over an HTTP JSON API.

use bank_config::Config;
use bank_core::{SessionBuilder, SessionCommand, SessionEngine, SessionFactories, SessionHandle};
use bank_wallet::WalletFactory;
use clap::Parser;
use std::path::PathBuf;

mod apis;
mod server;

/// Command-line arguments for the bank account service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the bank account service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the session engine with the configured wallet
/// 5. Runs the engine, and the API server when enabled, until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started bank account service");

	let config = Config::from_file(&args.config.to_string_lossy()).await?;
	tracing::info!("Loaded configuration [{}]", config.app.name);

	let api_config = config.api.clone().filter(|api| api.enabled);
	let (engine, handle) = build_session(config).await?;

	match api_config {
		Some(api_config) => {
			let engine_task = engine.run(shutdown_signal());
			let api_task = server::start_server(api_config, handle);

			tokio::select! {
				result = engine_task => {
					tracing::info!("Session engine finished");
					result?;
				}
				result = api_task => {
					tracing::info!("API server finished");
					result?;
				}
			}
		},
		None => {
			tracing::info!("Starting session engine only");
			// Without an API nothing else drives the session, so connect up front.
			let connect = async {
				if let Err(e) = handle.send(SessionCommand::Connect).await {
					tracing::warn!(error = %e, "Initial connect failed");
				}
			};
			let (result, ()) = tokio::join!(engine.run(shutdown_signal()), connect);
			result?;
		},
	}

	tracing::info!("Stopped bank account service");
	Ok(())
}

/// Resolves when the process receives Ctrl-C.
async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "Failed to listen for shutdown signal");
		std::future::pending::<()>().await;
	}
}

/// Wallet factories for every registered implementation.
fn wallet_factories() -> SessionFactories<WalletFactory> {
	SessionFactories {
		wallet_factories: bank_wallet::get_all_implementations()
			.into_iter()
			.map(|(name, factory)| (name.to_string(), factory))
			.collect(),
	}
}

/// Builds the session engine and the handle used to drive it.
async fn build_session(
	config: Config,
) -> Result<(SessionEngine, SessionHandle), Box<dyn std::error::Error>> {
	let builder = SessionBuilder::new(config);
	Ok(builder.build(wallet_factories()).await?)
}
