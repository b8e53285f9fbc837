//! Transaction delivery types.
//!
//! This module defines the types describing a submitted transaction, its
//! receipt and the status events produced while it is being confirmed.

use crate::{with_0x_prefix, without_0x_prefix};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Blockchain transaction hash representation.
///
/// Stores transaction hashes as raw bytes and renders them as 0x-prefixed hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionHash(pub Vec<u8>);

impl fmt::Display for TransactionHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", with_0x_prefix(&hex::encode(&self.0)))
	}
}

impl FromStr for TransactionHash {
	type Err = hex::FromHexError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		hex::decode(without_0x_prefix(s)).map(TransactionHash)
	}
}

impl Serialize for TransactionHash {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.to_string())
	}
}

impl<'de> Deserialize<'de> for TransactionHash {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}

/// Transaction receipt containing execution details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
	/// The hash of the transaction.
	pub hash: TransactionHash,
	/// The block number where the transaction was included.
	pub block_number: u64,
	/// Whether the transaction executed successfully.
	pub success: bool,
}

/// The single live transaction tracked by a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Transaction {
	/// Hash assigned once the wallet accepted the submission.
	pub id: Option<TransactionHash>,
	/// True once the submission was accepted.
	pub submitted: bool,
	/// True while the confirmation tracker is active.
	pub confirming: bool,
	/// True once the transaction was confirmed on-chain.
	pub confirmed: bool,
	/// Submission or confirmation failure.
	pub error: Option<String>,
}

impl Transaction {
	/// Whether the transaction has reached confirmed or failed.
	pub fn is_terminal(&self) -> bool {
		self.confirmed || self.error.is_some()
	}

	/// Whether this transaction is tracking the given hash.
	pub fn tracks(&self, hash: &TransactionHash) -> bool {
		self.id.as_ref() == Some(hash)
	}
}

/// Status reported by a confirmation tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrackerStatus {
	/// No transaction to track.
	Idle,
	/// Not yet mined, or mined with too few confirmations.
	Pending,
	/// Mined successfully with enough confirmations.
	Confirmed { block_number: u64 },
	/// Reverted, or the tracker lost the transaction.
	Failed { reason: String },
}

impl TrackerStatus {
	pub fn is_terminal(&self) -> bool {
		matches!(self, TrackerStatus::Confirmed { .. } | TrackerStatus::Failed { .. })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_transaction_hash_display() {
		let hash = TransactionHash(vec![0xde, 0xad, 0xbe, 0xef]);
		assert_eq!(hash.to_string(), "0xdeadbeef");
		assert_eq!("0xdeadbeef".parse::<TransactionHash>().unwrap(), hash);
	}

	#[test]
	fn test_default_transaction_is_not_terminal() {
		let tx = Transaction::default();
		assert!(!tx.is_terminal());
		assert!(!tx.tracks(&TransactionHash(vec![1])));
	}

	#[test]
	fn test_tracker_status_terminality() {
		assert!(!TrackerStatus::Idle.is_terminal());
		assert!(!TrackerStatus::Pending.is_terminal());
		assert!(TrackerStatus::Confirmed { block_number: 3 }.is_terminal());
		assert!(TrackerStatus::Failed {
			reason: "Transaction reverted".into()
		}
		.is_terminal());
	}
}
