//! State-changing calls submitted through the wallet.

use crate::abi::{encode_call, find_function};
use crate::ChannelError;
use async_trait::async_trait;
use bank_types::{truncate_id, Address, ContractDescriptor, ContractQuery, TransactionHash};
use bank_wallet::{ContractCall, WalletService};
use std::sync::Arc;

/// Submits a contract call for the wallet to authorize.
#[async_trait]
pub trait WriteChannel: Send + Sync {
	/// Resolves with the transaction hash once the wallet accepted the call.
	///
	/// Never waits for the transaction to be mined.
	async fn submit(
		&self,
		descriptor: &ContractDescriptor,
		query: ContractQuery,
	) -> Result<TransactionHash, ChannelError>;
}

/// [`WriteChannel`] that hands encoded calls to the wallet service.
pub struct ContractWriter {
	wallet: Arc<WalletService>,
}

impl ContractWriter {
	pub fn new(wallet: Arc<WalletService>) -> Self {
		Self { wallet }
	}
}

#[async_trait]
impl WriteChannel for ContractWriter {
	async fn submit(
		&self,
		descriptor: &ContractDescriptor,
		query: ContractQuery,
	) -> Result<TransactionHash, ChannelError> {
		let to: Address = descriptor
			.address
			.parse()
			.map_err(|e| ChannelError::InvalidAddress(format!("{}: {}", descriptor.address, e)))?;
		let function = find_function(descriptor, &query)?;
		let data = encode_call(function, &query)?;

		let hash = self.wallet.submit(ContractCall { to, data }).await?;
		tracing::info!(
			function = %query.function_name(),
			tx_hash = %truncate_id(&hash.to_string()),
			"Write accepted"
		);
		Ok(hash)
	}
}
