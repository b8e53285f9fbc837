//! String formatting utilities for hex identifiers.

/// Truncates a hex identifier for log output.
///
/// Keeps the first 10 characters (the `0x` prefix plus four bytes) followed
/// by "..".
pub fn truncate_id(id: &str) -> String {
	if id.len() <= 10 {
		id.to_string()
	} else {
		format!("{}..", &id[..10])
	}
}

/// Adds "0x" prefix to a hex string if it doesn't already have one.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.to_lowercase().starts_with("0x") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Removes "0x" or "0X" prefix from a hex string if present.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_truncate_id() {
		assert_eq!(truncate_id("0xdeadbe"), "0xdeadbe");
		assert_eq!(truncate_id("0xdeadbeef"), "0xdeadbeef");
		assert_eq!(
			truncate_id("0xdeadbeef00000000000000000000000000000000000000000000000000000000"),
			"0xdeadbeef.."
		);
	}

	#[test]
	fn test_prefix_helpers() {
		assert_eq!(with_0x_prefix("5fbdb231"), "0x5fbdb231");
		assert_eq!(with_0x_prefix("0x5fbdb231"), "0x5fbdb231");
		assert_eq!(with_0x_prefix("0X5fbdb231"), "0X5fbdb231");
		assert_eq!(without_0x_prefix("0x5fbdb231"), "5fbdb231");
		assert_eq!(without_0x_prefix("0X5fbdb231"), "5fbdb231");
		assert_eq!(without_0x_prefix("5fbdb231"), "5fbdb231");
	}
}
