//! EVM deployment host implementation using the Alloy library.
//!
//! This host drives an on-chain deployment factory over JSON-RPC. The
//! factory contract performs deploy-and-fund atomically inside one
//! transaction; this host simulates the call to learn the realized address,
//! submits it, and requires a successful receipt plus code at the realized
//! address.

use crate::{DeployerError, DeploymentHostInterface};
use alloy_network::EthereumWallet;
use alloy_primitives::{Address, B256, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{sol, SolCall};
use alloy_transport_http::Http;
use async_trait::async_trait;
use sponsor_types::{
	with_0x_prefix, ConfigSchema, Field, FieldType, Schema, SecretString,
};
use std::sync::Arc;

sol! {
	function deployAndFund(bytes32 templateId, address owner, uint256 index) external payable returns (address sponsor);
	function depositOf(address sponsor) external view returns (uint256 amount);
}

/// Alloy-based EVM deployment host.
pub struct AlloyHost {
	/// Provider carrying the deployer's wallet for transaction submission.
	provider: Arc<dyn Provider<Http<reqwest::Client>> + Send + Sync>,
	/// Address of the on-chain deployment factory.
	factory: Address,
}

impl AlloyHost {
	/// Creates a new AlloyHost for the given RPC endpoint and factory.
	pub fn new(
		rpc_url: &str,
		signer: PrivateKeySigner,
		factory: Address,
	) -> Result<Self, DeployerError> {
		let url = rpc_url
			.parse()
			.map_err(|e| DeployerError::InvalidConfig(format!("Invalid RPC URL: {}", e)))?;

		let wallet = EthereumWallet::from(signer);
		let provider = ProviderBuilder::new()
			.with_recommended_fillers()
			.wallet(wallet)
			.on_http(url);

		Ok(Self {
			provider: Arc::new(provider) as Arc<dyn Provider<Http<reqwest::Client>> + Send + Sync>,
			factory,
		})
	}

	/// Waits for the factory transaction to be mined and reports success.
	async fn wait_for_success(&self, tx_hash: B256) -> Result<bool, DeployerError> {
		let poll_interval = tokio::time::Duration::from_secs(7);
		let max_wait_time = tokio::time::Duration::from_secs(300);
		let start_time = tokio::time::Instant::now();

		loop {
			if start_time.elapsed() > max_wait_time {
				return Err(DeployerError::Host(format!(
					"Timeout waiting for transaction {} after {} seconds",
					with_0x_prefix(&hex::encode(tx_hash)),
					max_wait_time.as_secs()
				)));
			}

			match self.provider.get_transaction_receipt(tx_hash).await {
				Ok(Some(receipt)) => return Ok(receipt.status()),
				Ok(None) => {
					// Not yet mined, wait and retry
					tokio::time::sleep(poll_interval).await;
				},
				Err(e) => {
					return Err(DeployerError::Host(format!("Failed to get receipt: {}", e)));
				},
			}
		}
	}
}

#[async_trait]
impl DeploymentHostInterface for AlloyHost {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(AlloyHostSchema)
	}

	async fn has_code(&self, address: &Address) -> Result<bool, DeployerError> {
		let code = self
			.provider
			.get_code_at(*address)
			.await
			.map_err(|e| DeployerError::Host(format!("Failed to fetch code: {}", e)))?;
		Ok(!code.is_empty())
	}

	async fn registry_balance(&self, address: &Address) -> Result<U256, DeployerError> {
		let call = depositOfCall { sponsor: *address };
		let request = TransactionRequest::default()
			.to(self.factory)
			.input(call.abi_encode().into());

		let output = self
			.provider
			.call(&request)
			.await
			.map_err(|e| DeployerError::Host(format!("Registry query failed: {}", e)))?;
		let decoded = depositOfCall::abi_decode_returns(&output, true)
			.map_err(|e| DeployerError::Host(format!("Bad registry response: {}", e)))?;
		Ok(decoded.amount)
	}

	async fn deploy_sponsor(
		&self,
		template_id: &B256,
		owner: &Address,
		index: U256,
		_init_code: &[u8],
		expected: &Address,
		attached_value: U256,
	) -> Result<Address, DeployerError> {
		let call = deployAndFundCall {
			templateId: *template_id,
			owner: *owner,
			index,
		};
		let request = TransactionRequest::default()
			.to(self.factory)
			.value(attached_value)
			.input(call.abi_encode().into());

		// Simulate first: the factory reverts on an occupied or diverging
		// address, and the simulation reports the address it will realize.
		let output = self
			.provider
			.call(&request)
			.await
			.map_err(|e| DeployerError::DeploymentFailed(format!("Factory call reverted: {}", e)))?;
		let realized = deployAndFundCall::abi_decode_returns(&output, true)
			.map_err(|e| DeployerError::Host(format!("Bad factory response: {}", e)))?
			.sponsor;

		let pending = self
			.provider
			.send_transaction(request)
			.await
			.map_err(|e| DeployerError::Host(format!("Failed to send transaction: {}", e)))?;
		let tx_hash = *pending.tx_hash();

		if !self.wait_for_success(tx_hash).await? {
			return Err(DeployerError::DeploymentFailed(format!(
				"factory transaction {} reverted",
				with_0x_prefix(&hex::encode(tx_hash))
			)));
		}

		// The transaction succeeded; code must now exist at the realized
		// address or the deployment silently failed inside the factory.
		if !self.has_code(&realized).await? {
			return Err(DeployerError::DeploymentFailed(format!(
				"no code at realized address {}",
				realized
			)));
		}

		tracing::info!(
			tx_hash = %with_0x_prefix(&hex::encode(tx_hash)),
			expected = %expected,
			realized = %realized,
			"Submitted sponsor deployment"
		);
		Ok(realized)
	}
}

/// Configuration schema for the Alloy deployment host.
pub struct AlloyHostSchema;

impl AlloyHostSchema {
	/// Static validation method for use before instance creation.
	pub fn validate_config(config: &toml::Value) -> Result<(), sponsor_types::ValidationError> {
		let instance = Self;
		instance.validate(config)
	}
}

impl ConfigSchema for AlloyHostSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), sponsor_types::ValidationError> {
		let schema = Schema::new(
			// Required fields
			vec![
				Field::new("rpc_url", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
							Ok(())
						},
						_ => Err("rpc_url must be an http(s) URL".to_string()),
					}
				}),
				Field::new("private_key", FieldType::String),
			],
			// Optional fields
			vec![],
		);
		schema.validate(config)
	}
}

/// Factory function to create an Alloy deployment host from configuration.
///
/// Configuration parameters:
/// - `rpc_url`: HTTP JSON-RPC endpoint of the target network
/// - `private_key`: hex-encoded key funding the deployment transactions
pub fn create_host(
	config: &toml::Value,
	factory: &Address,
) -> Result<Box<dyn DeploymentHostInterface>, DeployerError> {
	AlloyHostSchema::validate_config(config)
		.map_err(|e| DeployerError::InvalidConfig(e.to_string()))?;

	let rpc_url = config
		.get("rpc_url")
		.and_then(|v| v.as_str())
		.unwrap_or_default();
	let private_key = SecretString::from(
		config
			.get("private_key")
			.and_then(|v| v.as_str())
			.unwrap_or_default(),
	);
	let signer: PrivateKeySigner = private_key
		.with_exposed(|key| key.parse())
		.map_err(|e| DeployerError::InvalidConfig(format!("Invalid private key: {}", e)))?;

	Ok(Box::new(AlloyHost::new(rpc_url, signer, *factory)?))
}

/// Registry for the Alloy deployment host.
pub struct Registry;

impl sponsor_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "evm_alloy";
	type Factory = crate::HostFactory;

	fn factory() -> Self::Factory {
		create_host
	}
}

impl crate::HostRegistry for Registry {}
