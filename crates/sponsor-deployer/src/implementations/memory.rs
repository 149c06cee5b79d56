//! In-memory deployment host implementation.
//!
//! This host substitutes the chain's address-occupancy rule with a registry
//! keyed by the derived address, guarded by a single lock so deploy and
//! credit commit together or not at all. Useful for tests and local
//! development where no chain is available.

use crate::address::salt_for_index;
use crate::{DeployerError, DeploymentHostInterface};
use alloy_primitives::{keccak256, Address, B256, U256};
use async_trait::async_trait;
use sponsor_types::{ConfigSchema, Schema, ValidationError};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// In-memory deployment host.
pub struct MemoryHost {
	/// Factory address used as the CREATE2 deployer.
	factory: Address,
	/// Code and registry state behind one lock; the critical section is the
	/// atomic unit of deploy-and-fund.
	state: Mutex<HostState>,
}

#[derive(Default)]
struct HostState {
	/// Deployed code keyed by address. Occupancy is the uniqueness rule.
	code: HashMap<Address, Vec<u8>>,
	/// Registry credits keyed by sponsor address.
	deposits: HashMap<Address, U256>,
}

impl MemoryHost {
	/// Creates a new MemoryHost deploying as the given factory.
	pub fn new(factory: Address) -> Self {
		Self {
			factory,
			state: Mutex::new(HostState::default()),
		}
	}
}

#[async_trait]
impl DeploymentHostInterface for MemoryHost {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryHostSchema)
	}

	async fn has_code(&self, address: &Address) -> Result<bool, DeployerError> {
		let state = self.state.lock().await;
		Ok(state.code.contains_key(address))
	}

	async fn registry_balance(&self, address: &Address) -> Result<U256, DeployerError> {
		let state = self.state.lock().await;
		Ok(state.deposits.get(address).copied().unwrap_or(U256::ZERO))
	}

	async fn deploy_sponsor(
		&self,
		_template_id: &B256,
		_owner: &Address,
		index: U256,
		init_code: &[u8],
		expected: &Address,
		attached_value: U256,
	) -> Result<Address, DeployerError> {
		let mut state = self.state.lock().await;

		let realized = self
			.factory
			.create2(salt_for_index(index), keccak256(init_code));

		if state.code.contains_key(&realized) {
			return Err(DeployerError::DeploymentFailed(format!(
				"address {} is already occupied",
				realized
			)));
		}
		if realized != *expected {
			// Nothing has been committed yet; the whole call fails.
			return Err(DeployerError::AddressMismatch {
				predicted: *expected,
				realized,
			});
		}

		let balance = state.deposits.get(&realized).copied().unwrap_or(U256::ZERO);
		let credited = balance.checked_add(attached_value).ok_or_else(|| {
			DeployerError::FundingFailed("registry balance overflow".to_string())
		})?;

		state.code.insert(realized, init_code.to_vec());
		state.deposits.insert(realized, credited);
		Ok(realized)
	}
}

/// Configuration schema for MemoryHost.
pub struct MemoryHostSchema;

impl ConfigSchema for MemoryHostSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// Memory host has no required configuration
		let schema = Schema::new(vec![], vec![]);
		schema.validate(config)
	}
}

/// Factory function to create a memory host from configuration.
///
/// Configuration parameters:
/// - None required for the memory host
pub fn create_host(
	config: &toml::Value,
	factory: &Address,
) -> Result<Box<dyn DeploymentHostInterface>, DeployerError> {
	MemoryHostSchema
		.validate(config)
		.map_err(|e| DeployerError::InvalidConfig(e.to_string()))?;
	Ok(Box::new(MemoryHost::new(*factory)))
}

/// Registry for the memory deployment host.
pub struct Registry;

impl sponsor_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = crate::HostFactory;

	fn factory() -> Self::Factory {
		create_host
	}
}

impl crate::HostRegistry for Registry {}
