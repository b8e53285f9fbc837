//! Network endpoint configuration shared by the wallet and the contract channels.

use serde::{Deserialize, Serialize};

/// The chain the client talks to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkConfig {
	/// Chain the wallet must be connected to.
	pub chain_id: u64,
	/// HTTP(S) JSON-RPC endpoint.
	pub rpc_url: String,
}
