//! Default no-prefix verifier implementation.
//!
//! This scheme has no tag: the dispatcher routes every blob whose tag
//! matches no known scheme here, whole and unmodified. The blob is taken to
//! be a bare signature over the externally supplied hash; nothing is
//! re-derived.

use crate::{recovery, AuthError, VerifierInterface};
use async_trait::async_trait;
use sponsor_types::{
	Address, ConfigSchema, ExecutionContext, ImplementationRegistry, Schema, SchemeTag,
	SponsoredOperation, ValidityCode, B256,
};

/// Verifier consuming untagged blobs as bare signatures.
pub struct NoPrefixVerifier;

impl NoPrefixVerifier {
	/// Creates a new no-prefix verifier.
	pub fn new() -> Self {
		Self
	}
}

impl Default for NoPrefixVerifier {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl VerifierInterface for NoPrefixVerifier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(NoPrefixSchema)
	}

	fn scheme_tag(&self) -> Option<SchemeTag> {
		None
	}

	fn framing_width(&self) -> usize {
		0
	}

	async fn validate_operation(
		&self,
		_operation: &SponsoredOperation,
		operation_hash: &B256,
		payload: &[u8],
		owner: &Address,
		_context: &ExecutionContext,
	) -> Result<ValidityCode, AuthError> {
		if recovery::is_valid_signature(owner, operation_hash, payload)? {
			Ok(ValidityCode::VALID)
		} else {
			Ok(ValidityCode::SIG_VALIDATION_FAILED)
		}
	}

	async fn validate_signature_for_owner(
		&self,
		owner: &Address,
		hash: &B256,
		payload: &[u8],
	) -> Result<bool, AuthError> {
		recovery::is_valid_signature(owner, hash, payload)
	}
}

/// Configuration schema for the no-prefix verifier.
pub struct NoPrefixSchema;

impl ConfigSchema for NoPrefixSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), sponsor_types::ValidationError> {
		// No configuration required
		let schema = Schema::new(vec![], vec![]);
		schema.validate(config)
	}
}

/// Factory function to create a no-prefix verifier from configuration.
///
/// Configuration parameters:
/// - None required
pub fn create_verifier(config: &toml::Value) -> Result<Box<dyn VerifierInterface>, AuthError> {
	NoPrefixSchema
		.validate(config)
		.map_err(|e| AuthError::InvalidConfig(e.to_string()))?;
	Ok(Box::new(NoPrefixVerifier::new()))
}

/// Registry for the no-prefix verifier.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "no_prefix";
	type Factory = crate::VerifierFactory;

	fn factory() -> Self::Factory {
		create_verifier
	}
}

impl crate::VerifierRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::PrimitiveSignature as Signature;
	use alloy_signer::SignerSync;
	use alloy_signer_local::PrivateKeySigner;

	fn encode_signature(sig: &Signature) -> Vec<u8> {
		let mut bytes = Vec::with_capacity(65);
		bytes.extend_from_slice(&sig.r().to_be_bytes::<32>());
		bytes.extend_from_slice(&sig.s().to_be_bytes::<32>());
		bytes.push(27 + sig.v() as u8);
		bytes
	}

	#[tokio::test]
	async fn test_bare_signature_over_supplied_hash() {
		let signer = PrivateKeySigner::random();
		let hash = B256::repeat_byte(0x51);
		let sig = signer.sign_hash_sync(&hash).unwrap();

		let verifier = NoPrefixVerifier::new();
		let valid = verifier
			.validate_signature_for_owner(&signer.address(), &hash, &encode_signature(&sig))
			.await
			.unwrap();
		assert!(valid);

		let valid = verifier
			.validate_signature_for_owner(&PrivateKeySigner::random().address(), &hash, &encode_signature(&sig))
			.await
			.unwrap();
		assert!(!valid);
	}
}
