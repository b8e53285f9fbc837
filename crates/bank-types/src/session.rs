//! Session phase and render snapshot types.

use crate::{Connection, QueryResult, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Phase of the account session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
	/// No wallet connection.
	#[default]
	Disconnected,
	/// Wallet connected, contract not yet verified.
	Connected,
	/// Sentinel read outstanding.
	Verifying,
	/// Contract verified, account actions available.
	Unlocked,
}

impl fmt::Display for SessionPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			SessionPhase::Disconnected => "disconnected",
			SessionPhase::Connected => "connected",
			SessionPhase::Verifying => "verifying",
			SessionPhase::Unlocked => "unlocked",
		};
		f.write_str(name)
	}
}

/// Everything the rendering collaborator needs for one render cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionView {
	pub phase: SessionPhase,
	pub connection: Connection,
	pub accounts: Vec<String>,
	pub transaction: Transaction,
	/// True while any read or write request is outstanding.
	pub loading: bool,
	/// Latest result per contract function.
	pub reads: BTreeMap<String, QueryResult>,
	/// Most recent wallet or engine failure not attached to a query.
	pub last_error: Option<String>,
}

impl SessionView {
	/// Whether the account actions should be offered.
	pub fn actions_available(&self) -> bool {
		self.phase == SessionPhase::Unlocked
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_view_is_disconnected() {
		let view = SessionView::default();
		assert_eq!(view.phase, SessionPhase::Disconnected);
		assert!(!view.actions_available());
		assert!(!view.loading);
	}

	#[test]
	fn test_phase_serializes_snake_case() {
		let json = serde_json::to_value(SessionPhase::Unlocked).unwrap();
		assert_eq!(json, serde_json::json!("unlocked"));
		assert_eq!(SessionPhase::Verifying.to_string(), "verifying");
	}
}
