//! Wallet identity types.
//!
//! Addresses are kept as raw bytes so that the session never depends on a
//! wallet library's own address representation.

use crate::{with_0x_prefix, without_0x_prefix};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length in bytes of an EVM account address.
pub const ADDRESS_LENGTH: usize = 20;

/// Errors produced when parsing an address from text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
	#[error("Invalid hex in address: {0}")]
	InvalidHex(String),
	#[error("Address must be 20 bytes, got {0}")]
	InvalidLength(usize),
}

/// An account address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(pub Vec<u8>);

impl Address {
	pub fn as_slice(&self) -> &[u8] {
		&self.0
	}
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", with_0x_prefix(&hex::encode(&self.0)))
	}
}

impl FromStr for Address {
	type Err = AddressError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let bytes = hex::decode(without_0x_prefix(s.trim()))
			.map_err(|e| AddressError::InvalidHex(e.to_string()))?;
		if bytes.len() != ADDRESS_LENGTH {
			return Err(AddressError::InvalidLength(bytes.len()));
		}
		Ok(Address(bytes))
	}
}

impl From<alloy::primitives::Address> for Address {
	fn from(address: alloy::primitives::Address) -> Self {
		Address(address.as_slice().to_vec())
	}
}

impl Serialize for Address {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.to_string())
	}
}

impl<'de> Deserialize<'de> for Address {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}

/// Wallet connectivity as reported by the wallet collaborator.
///
/// The session only ever reads this value; it is produced by whichever wallet
/// implementation is configured. Connectivity is published through a channel
/// that keeps only the latest value, so `epoch` numbers the connections the
/// wallet has established. It survives disconnects and moves forward on every
/// new connection, which lets a reader notice a disconnect it never observed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
	/// Whether the wallet currently considers itself connected.
	pub connected: bool,
	/// The active account, if the wallet exposes one.
	pub address: Option<Address>,
	/// Number of connections established so far.
	#[serde(default)]
	pub epoch: u64,
}

impl Connection {
	pub fn disconnected() -> Self {
		Self::default()
	}

	pub fn connected(address: Address) -> Self {
		Self {
			connected: true,
			address: Some(address),
			epoch: 1,
		}
	}

	/// The connection that follows this one once `address` is connected.
	///
	/// Starts a new epoch unless this connection is already live.
	pub fn established(&self, address: Address) -> Self {
		let epoch = if self.is_ready() {
			self.epoch
		} else {
			self.epoch + 1
		};
		Self {
			connected: true,
			address: Some(address),
			epoch,
		}
	}

	/// The disconnected state following this one, keeping the epoch.
	pub fn dropped(&self) -> Self {
		Self {
			connected: false,
			address: None,
			epoch: self.epoch,
		}
	}

	/// True when the wallet is connected and has an active address.
	pub fn is_ready(&self) -> bool {
		self.connected && self.address.is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_address_parse_and_display() {
		let address: Address = "0x90F79bf6EB2c4f870365E785982E1f101E93b906".parse().unwrap();
		assert_eq!(address.0.len(), ADDRESS_LENGTH);
		assert_eq!(
			address.to_string(),
			"0x90f79bf6eb2c4f870365e785982e1f101e93b906"
		);
	}

	#[test]
	fn test_address_rejects_wrong_length() {
		let result = "0xdeadbeef".parse::<Address>();
		assert_eq!(result, Err(AddressError::InvalidLength(4)));
	}

	#[test]
	fn test_address_rejects_bad_hex() {
		assert!(matches!(
			"0xzz".parse::<Address>(),
			Err(AddressError::InvalidHex(_))
		));
	}

	#[test]
	fn test_connection_readiness() {
		let address: Address = "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap();
		assert!(Connection::connected(address.clone()).is_ready());
		assert!(!Connection::disconnected().is_ready());

		let no_address = Connection {
			connected: true,
			address: None,
			epoch: 1,
		};
		assert!(!no_address.is_ready());
	}

	#[test]
	fn test_reconnect_starts_new_epoch() {
		let address: Address = "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap();
		let first = Connection::disconnected().established(address.clone());
		assert_eq!(first.epoch, 1);

		// Connecting again while live keeps the epoch.
		assert_eq!(first.established(address.clone()).epoch, 1);

		let dropped = first.dropped();
		assert!(!dropped.is_ready());
		assert_eq!(dropped.epoch, 1);

		let second = dropped.established(address);
		assert_eq!(second.epoch, 2);
		assert_eq!(second.address, first.address);
	}

	#[test]
	fn test_address_serde_as_hex_string() {
		let address: Address = "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap();
		let json = serde_json::to_string(&address).unwrap();
		assert_eq!(json, "\"0x5fbdb2315678afecb367f032d93f642f64180aa3\"");
		let back: Address = serde_json::from_str(&json).unwrap();
		assert_eq!(back, address);
	}
}
