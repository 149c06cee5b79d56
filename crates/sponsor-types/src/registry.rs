//! Registry trait for self-registering implementations.
//!
//! Every pluggable implementation (verifier schemes, deployment hosts) must
//! provide a Registry struct implementing this trait, declaring the name it
//! is referenced by in configuration files together with a factory function.

/// Base trait for implementation registries.
///
/// Adding a scheme or host means adding one implementation module with its
/// Registry; dispatch logic is never touched.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	///
	/// This should match the key used in the TOML configuration, for example:
	/// - "ecdsa_offchain" for auth.implementations.ecdsa_offchain
	/// - "memory" for deployer.implementations.memory
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	///
	/// Each module defines its own factory type, for example VerifierFactory
	/// for authorization schemes or HostFactory for deployment hosts.
	type Factory;

	/// Returns the factory function for this implementation.
	fn factory() -> Self::Factory;
}
