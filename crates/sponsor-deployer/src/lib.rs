//! Deterministic sponsor deployment module for the sponsor-gate system.
//!
//! This module brings a per-owner sponsor contract into existence at a
//! reproducible, content-addressed location and credits the fee registry
//! for the new contract in the same atomic action. The address derivation
//! is pure; the single side effect lives behind a pluggable deployment
//! host.

use async_trait::async_trait;
use sponsor_types::{with_0x_prefix, ConfigSchema, ImplementationRegistry};
use alloy_primitives::{Address, B256, U256};
use thiserror::Error;

/// Sponsor address prediction helpers.
pub mod address;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
	pub mod memory;
}

/// Errors that can occur during sponsor deployment operations.
#[derive(Debug, Error)]
pub enum DeployerError {
	/// The requested template is not the configured one.
	#[error("Unknown template: {0}")]
	UnknownTemplate(B256),
	/// The deployment produced no contract, or the slot is occupied.
	#[error("Deployment failed: {0}")]
	DeploymentFailed(String),
	/// A sponsor already exists at the predicted address.
	#[error("Sponsor already deployed at {0}")]
	AlreadyDeployed(Address),
	/// The realized address does not equal the prediction.
	#[error("Realized address {realized} does not match predicted {predicted}")]
	AddressMismatch {
		predicted: Address,
		realized: Address,
	},
	/// The registry credit could not be applied.
	#[error("Funding failed: {0}")]
	FundingFailed(String),
	/// Error raised by the deployment host.
	#[error("Host error: {0}")]
	Host(String),
	/// The host configuration is invalid.
	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),
}

/// Trait defining the interface for deployment hosts.
///
/// A host owns the side-effecting half of deploy-and-fund: instantiating
/// code at the salted address and crediting the registry, as one indivisible
/// unit. Address occupancy at the host is what serializes concurrent
/// attempts on the same salt; no application-level lock exists above it.
#[async_trait]
pub trait DeploymentHostInterface: Send + Sync {
	/// Returns the configuration schema for this host implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Returns true if code exists at the address.
	async fn has_code(&self, address: &Address) -> Result<bool, DeployerError>;

	/// Returns the registry credit currently held for the address.
	async fn registry_balance(&self, address: &Address) -> Result<U256, DeployerError>;

	/// Deploys the sponsor at its salted address and credits the registry.
	///
	/// Must commit the deployment and the credit together or not at all: a
	/// deploy whose funding step fails leaves no partial state. `expected`
	/// is the service's prediction; a host that can observe a different
	/// realized address must fail rather than commit to it.
	async fn deploy_sponsor(
		&self,
		template_id: &B256,
		owner: &Address,
		index: U256,
		init_code: &[u8],
		expected: &Address,
		attached_value: U256,
	) -> Result<Address, DeployerError>;
}

/// Type alias for deployment host factory functions.
///
/// Hosts receive their own TOML table plus the factory contract address the
/// deployer operates through.
pub type HostFactory =
	fn(&toml::Value, &Address) -> Result<Box<dyn DeploymentHostInterface>, DeployerError>;

/// Registry trait for deployment host implementations.
pub trait HostRegistry: ImplementationRegistry<Factory = HostFactory> {}

/// Get all registered deployment host implementations.
pub fn get_all_implementations() -> Vec<(&'static str, HostFactory)> {
	use implementations::{evm, memory};

	vec![
		(memory::Registry::NAME, memory::Registry::factory()),
		(evm::alloy::Registry::NAME, evm::alloy::Registry::factory()),
	]
}

/// Service that predicts, deploys, and funds sponsor contracts.
///
/// Holds the configured template and factory address; everything else is
/// derived per call. Stateless aside from the host's one-time deployment
/// side effect.
pub struct DeployerService {
	/// The deployment host performing the side effects.
	host: Box<dyn DeploymentHostInterface>,
	/// Address of the deployment factory.
	factory: Address,
	/// Identifier of the configured sponsor template.
	template_id: B256,
	/// Deployment code of the configured sponsor template.
	template_code: Vec<u8>,
}

impl std::fmt::Debug for DeployerService {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DeployerService")
			.field("factory", &self.factory)
			.field("template_id", &self.template_id)
			.field("template_code", &self.template_code)
			.finish_non_exhaustive()
	}
}

impl DeployerService {
	/// Creates a new DeployerService over the given host and template.
	pub fn new(
		host: Box<dyn DeploymentHostInterface>,
		factory: Address,
		template_id: B256,
		template_code: Vec<u8>,
	) -> Self {
		Self {
			host,
			factory,
			template_id,
			template_code,
		}
	}

	/// Returns the identifier of the configured sponsor template.
	pub fn template_id(&self) -> B256 {
		self.template_id
	}

	/// Rejects template ids this deployer was not configured for.
	fn ensure_known_template(&self, template_id: &B256) -> Result<(), DeployerError> {
		if *template_id != self.template_id {
			return Err(DeployerError::UnknownTemplate(*template_id));
		}
		Ok(())
	}

	/// Predicts the sponsor address for `(template, owner, index)`.
	///
	/// Read-only; exposed so callers can reference or pre-fund a sponsor
	/// before it exists.
	pub fn predict_address(
		&self,
		template_id: &B256,
		owner: &Address,
		index: U256,
	) -> Result<Address, DeployerError> {
		self.ensure_known_template(template_id)?;
		Ok(address::predict_sponsor_address(
			&self.factory,
			&self.template_code,
			template_id,
			owner,
			index,
		))
	}

	/// Returns true if a sponsor is already deployed for the triple.
	pub async fn is_deployed(
		&self,
		template_id: &B256,
		owner: &Address,
		index: U256,
	) -> Result<bool, DeployerError> {
		let predicted = self.predict_address(template_id, owner, index)?;
		self.host.has_code(&predicted).await
	}

	/// Returns the registry credit held for an address.
	pub async fn registry_balance(&self, address: &Address) -> Result<U256, DeployerError> {
		self.host.registry_balance(address).await
	}

	/// Deploys a sponsor at its predicted address and credits the registry.
	///
	/// The whole call fails as one unit: an occupied slot, a zero or
	/// mismatched realized address, or a failed credit all abort without
	/// leaving anything funded. The realized-equals-predicted check is the
	/// sole integrity check that the correct, unmodified template was
	/// deployed.
	pub async fn deploy_and_fund(
		&self,
		template_id: &B256,
		owner: &Address,
		index: U256,
		attached_value: U256,
	) -> Result<Address, DeployerError> {
		let predicted = self.predict_address(template_id, owner, index)?;

		if self.host.has_code(&predicted).await? {
			return Err(DeployerError::AlreadyDeployed(predicted));
		}

		let init_code =
			address::sponsor_init_code(&self.template_code, template_id, owner);
		let realized = self
			.host
			.deploy_sponsor(template_id, owner, index, &init_code, &predicted, attached_value)
			.await?;

		if realized == Address::ZERO {
			return Err(DeployerError::DeploymentFailed(
				"host reported a zero realized address".to_string(),
			));
		}
		if realized != predicted {
			return Err(DeployerError::AddressMismatch {
				predicted,
				realized,
			});
		}

		tracing::info!(
			sponsor = %with_0x_prefix(&hex::encode(realized)),
			owner = %with_0x_prefix(&hex::encode(owner)),
			index = %index,
			"Deployed and funded sponsor"
		);
		Ok(realized)
	}
}
