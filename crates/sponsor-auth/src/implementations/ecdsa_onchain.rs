//! On-chain transaction-replay ECDSA verifier implementation.
//!
//! In this scheme the owner does not sign a canonical digest; the payload
//! replays an ECDSA signature made over the operation hash the host already
//! computed. No validity-window binding takes place, which is what makes a
//! previously signed transaction usable as authorization.

use crate::implementations::ecdsa_offchain::{framing_width_from, FramedSchemeSchema};
use crate::{recovery, AuthError, VerifierInterface};
use async_trait::async_trait;
use sponsor_types::{
	Address, ConfigSchema, ExecutionContext, ImplementationRegistry, SchemeTag,
	SponsoredOperation, ValidityCode, B256,
};

/// Verifier replaying a transaction signature over the supplied hash.
pub struct EcdsaOnchainVerifier {
	framing_width: usize,
}

impl EcdsaOnchainVerifier {
	/// Creates a new verifier with the given framing width.
	pub fn new(framing_width: usize) -> Self {
		Self { framing_width }
	}
}

#[async_trait]
impl VerifierInterface for EcdsaOnchainVerifier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FramedSchemeSchema)
	}

	fn scheme_tag(&self) -> Option<SchemeTag> {
		Some(SchemeTag::ECDSA_ONCHAIN)
	}

	fn framing_width(&self) -> usize {
		self.framing_width
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

/// Factory function to create an on-chain replay verifier from configuration.
///
/// Configuration parameters:
/// - `framing_width` (optional): 1 or 5, defaults to 1
pub fn create_verifier(config: &toml::Value) -> Result<Box<dyn VerifierInterface>, AuthError> {
	FramedSchemeSchema::validate_config(config)
		.map_err(|e| AuthError::InvalidConfig(e.to_string()))?;
	Ok(Box::new(EcdsaOnchainVerifier::new(framing_width_from(config))))
}

/// Registry for the on-chain replay verifier.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "ecdsa_onchain";
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
	async fn test_replayed_signature_over_supplied_hash() {
		let signer = PrivateKeySigner::random();
		let supplied = B256::repeat_byte(0x21);
		let sig = signer.sign_hash_sync(&supplied).unwrap();

		let verifier = EcdsaOnchainVerifier::new(1);
		let valid = verifier
			.validate_signature_for_owner(&signer.address(), &supplied, &encode_signature(&sig))
			.await
			.unwrap();
		assert!(valid);
	}

	#[tokio::test]
	async fn test_window_is_not_bound() {
		use alloy_primitives::Bytes;

		let signer = PrivateKeySigner::random();
		let supplied = B256::repeat_byte(0x21);
		let sig = signer.sign_hash_sync(&supplied).unwrap();

		// Two operations with different windows validate against the same
		// replayed signature; only the supplied hash matters here.
		let verifier = EcdsaOnchainVerifier::new(1);
		for (after, until) in [(0, 100), (500, 900)] {
			let op = SponsoredOperation {
				intrinsic_hash: supplied,
				valid_after: after,
				valid_until: until,
				authorization: Bytes::new(),
			};
			let code = verifier
				.validate_operation(
					&op,
					&supplied,
					&encode_signature(&sig),
					&signer.address(),
					&ExecutionContext {
						chain_id: 1,
						timestamp: 0,
					},
				)
				.await
				.unwrap();
			assert_eq!(code, ValidityCode::VALID);
		}
	}
}
