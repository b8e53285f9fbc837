//! Inputs to the account session.
//!
//! Intents come from the rendering collaborator. Events come from the wallet,
//! the read and write channels and the confirmation tracker. The session
//! reacts to each one in isolation.

use crate::{Connection, QueryBatch, TrackerStatus, TransactionHash};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a read or write request issued by a session.
///
/// Identifiers are never reused within a session, so a result carrying an
/// identifier that is no longer outstanding can be recognized as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// User actions issued by the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
	/// Confirm the contract is reachable by reading its sentinel value.
	Verify,
	/// Load the account list from the contract.
	ViewAccounts,
	/// Submit a transaction creating a new account.
	CreateAccount,
	/// Re-read every configured view function in one batch.
	Refresh,
}

/// Results and notifications delivered back to the session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
	/// The wallet reported a connectivity change.
	ConnectionChanged(Connection),
	/// Every query of a read request has resolved.
	BatchResolved {
		request: RequestId,
		batch: QueryBatch,
	},
	/// A write request was accepted or rejected.
	SubmissionResolved {
		request: RequestId,
		outcome: Result<TransactionHash, String>,
	},
	/// The confirmation tracker reported progress for a transaction.
	Tracker {
		hash: TransactionHash,
		status: TrackerStatus,
	},
}
