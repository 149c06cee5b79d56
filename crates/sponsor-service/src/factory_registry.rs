//! Dynamic factory registry for sponsor-gate implementations.
//!
//! This module collects the factory functions of every verifier scheme and
//! deployment host, allowing instantiation purely from configuration.

use sponsor_auth::{AuthService, VerifierFactory, VerifierInterface};
use sponsor_config::Config;
use sponsor_deployer::{DeployerService, HostFactory};
use sponsor_types::{without_0x_prefix, Address, B256};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Global registry for all implementation factories.
pub struct FactoryRegistry {
	pub verifiers: HashMap<String, VerifierFactory>,
	pub hosts: HashMap<String, HostFactory>,
}

impl FactoryRegistry {
	/// Creates a new empty registry.
	pub fn new() -> Self {
		Self {
			verifiers: HashMap::new(),
			hosts: HashMap::new(),
		}
	}
}

// Global registry instance
static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Returns the global registry, initializing it with all available
/// implementations on first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in sponsor_auth::get_all_implementations() {
			tracing::debug!("Registering verifier implementation: {}", name);
			registry.verifiers.insert(name.to_string(), factory);
		}

		for (name, factory) in sponsor_deployer::get_all_implementations() {
			tracing::debug!("Registering deployment host implementation: {}", name);
			registry.hosts.insert(name.to_string(), factory);
		}

		registry
	})
}

/// Builds the authorization dispatcher from configuration.
///
/// Every entry under `[auth.implementations]` is instantiated through its
/// registered factory; the entry named by `auth.default` becomes the
/// fallback verifier for untagged and unknown blobs, all others are routed
/// by their scheme tag.
pub fn build_auth_from_config(config: &Config) -> Result<AuthService, Box<dyn std::error::Error>> {
	let registry = get_registry();

	let mut tagged: Vec<Box<dyn VerifierInterface>> = Vec::new();
	let mut default: Option<Box<dyn VerifierInterface>> = None;

	for (name, table) in &config.auth.implementations {
		let factory = registry.verifiers.get(name).ok_or_else(|| {
			let available: Vec<_> = registry.verifiers.keys().cloned().collect();
			format!(
				"Unknown verifier implementation '{}'. Available: [{}]",
				name,
				available.join(", ")
			)
		})?;
		let verifier = factory(table)?;

		if *name == config.auth.default {
			default = Some(verifier);
		} else {
			tagged.push(verifier);
		}
	}

	let default = default.ok_or_else(|| {
		format!(
			"Default verifier '{}' is not present under [auth.implementations]",
			config.auth.default
		)
	})?;

	Ok(AuthService::new(tagged, default)?)
}

/// Builds the deterministic deployer from configuration.
pub fn build_deployer_from_config(
	config: &Config,
) -> Result<DeployerService, Box<dyn std::error::Error>> {
	let registry = get_registry();
	let deployer = &config.deployer;

	let factory_address: Address = deployer
		.factory_address
		.parse()
		.map_err(|e| format!("Invalid deployer.factory_address: {}", e))?;
	let template_id: B256 = deployer
		.template_id
		.parse()
		.map_err(|e| format!("Invalid deployer.template_id: {}", e))?;
	let template_code = hex::decode(without_0x_prefix(&deployer.template_code))
		.map_err(|e| format!("Invalid deployer.template_code: {}", e))?;
	if template_code.is_empty() {
		return Err("deployer.template_code must not be empty".into());
	}

	let host_config = deployer.implementations.get(&deployer.primary).ok_or_else(|| {
		format!(
			"Primary host '{}' is not present under [deployer.implementations]",
			deployer.primary
		)
	})?;
	let host_factory = registry.hosts.get(&deployer.primary).ok_or_else(|| {
		let available: Vec<_> = registry.hosts.keys().cloned().collect();
		format!(
			"Unknown deployment host '{}'. Available: [{}]",
			deployer.primary,
			available.join(", ")
		)
	})?;
	let host = host_factory(host_config, &factory_address)?;

	Ok(DeployerService::new(
		host,
		factory_address,
		template_id,
		template_code,
	))
}

#[cfg(test)]
mod tests {
	use super::*;

	const SAMPLE: &str = r#"
[sponsor]
id = "gate-test"
chain_id = 10

[auth]
default = "no_prefix"

[auth.implementations.ecdsa_offchain]
framing_width = 1

[auth.implementations.ecdsa_onchain]
framing_width = 5

[auth.implementations.no_prefix]

[deployer]
primary = "memory"
factory_address = "0xfafafafafafafafafafafafafafafafafafafafa"
template_id = "0x7070707070707070707070707070707070707070707070707070707070707070"
template_code = "0x6080604052"

[deployer.implementations.memory]
"#;

	#[test]
	fn test_build_services_from_config() {
		let config: Config = SAMPLE.parse().unwrap();
		build_auth_from_config(&config).unwrap();
		build_deployer_from_config(&config).unwrap();
	}

	#[test]
	fn test_missing_default_verifier_is_rejected() {
		let config: Config = SAMPLE.replace("default = \"no_prefix\"", "default = \"absent\"")
			.parse()
			.unwrap();
		assert!(build_auth_from_config(&config).is_err());
	}

	#[test]
	fn test_unknown_host_lists_available() {
		let config: Config = SAMPLE
			.replace("primary = \"memory\"", "primary = \"redis\"")
			.parse()
			.unwrap();
		let err = build_deployer_from_config(&config).unwrap_err().to_string();
		assert!(err.contains("redis"));
		assert!(err.contains("not present") || err.contains("Available"));
	}
}
