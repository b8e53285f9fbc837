//! Allowed session phase transitions.

use bank_types::SessionPhase;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

// Each phase maps to the phases it may move to. Connected -> Connected and
// Unlocked -> Connected are the resets applied when the active address changes.
static TRANSITIONS: Lazy<HashMap<SessionPhase, HashSet<SessionPhase>>> = Lazy::new(|| {
	use SessionPhase::*;

	let mut m = HashMap::new();
	m.insert(Disconnected, HashSet::from([Connected]));
	m.insert(Connected, HashSet::from([Verifying, Connected, Disconnected]));
	m.insert(Verifying, HashSet::from([Unlocked, Connected, Disconnected]));
	m.insert(Unlocked, HashSet::from([Connected, Disconnected]));
	m
});

/// Checks if a phase transition is valid.
pub fn is_valid_transition(from: SessionPhase, to: SessionPhase) -> bool {
	TRANSITIONS
		.get(&from)
		.is_some_and(|allowed| allowed.contains(&to))
}

#[cfg(test)]
mod tests {
	use super::*;
	use SessionPhase::*;

	#[test]
	fn test_unlock_requires_verification() {
		assert!(!is_valid_transition(Connected, Unlocked));
		assert!(!is_valid_transition(Disconnected, Unlocked));
		assert!(is_valid_transition(Verifying, Unlocked));
	}

	#[test]
	fn test_every_connected_phase_can_disconnect() {
		for phase in [Connected, Verifying, Unlocked] {
			assert!(is_valid_transition(phase, Disconnected));
		}
		assert!(!is_valid_transition(Disconnected, Disconnected));
	}

	#[test]
	fn test_disconnected_only_reaches_connected() {
		assert!(is_valid_transition(Disconnected, Connected));
		assert!(!is_valid_transition(Disconnected, Verifying));
	}
}
