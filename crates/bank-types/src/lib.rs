//! Common types module for the bank account client.
//!
//! This module defines the data model shared by the wallet, the contract
//! channels, the session state machine and the rendering API. Keeping them in
//! one crate lets every component agree on the same shapes.

/// Wallet identity types: addresses and connection state.
pub mod account;
/// API error types for the HTTP rendering surface.
pub mod api;
/// Contract descriptor, queries and query results.
pub mod contract;
/// Transaction, receipt and confirmation tracking types.
pub mod delivery;
/// Intents and events consumed by the session state machine.
pub mod events;
/// Network endpoint configuration.
pub mod networks;
/// Registry trait for configuration-selected implementations.
pub mod registry;
/// Wrapper for sensitive strings such as private keys.
pub mod secret_string;
/// Session phase and render snapshot types.
pub mod session;
/// Utility functions for hex formatting.
pub mod utils;
/// Configuration validation types for implementation-specific TOML tables.
pub mod validation;

pub use account::*;
pub use api::*;
pub use contract::*;
pub use delivery::*;
pub use events::*;
pub use networks::NetworkConfig;
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use session::*;
pub use utils::{truncate_id, with_0x_prefix, without_0x_prefix};
pub use validation::*;
