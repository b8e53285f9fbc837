//! Registry trait for configuration-selected implementations.

/// Ties an implementation to the name it is selected by in configuration.
///
/// For example the local key wallet registers as `"local"`, matching
/// `[wallet.implementations.local]` and `wallet.primary = "local"`.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Returns the factory that builds this implementation from configuration.
	fn factory() -> Self::Factory;
}
