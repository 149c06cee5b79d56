//! ERC-20-permit-bound ECDSA verifier implementation.
//!
//! The payload carries the fee token's address ahead of the signature, and
//! the signed digest binds the canonical operation digest to that token, so
//! an authorization issued for one fee token cannot be replayed with
//! another.

use crate::implementations::ecdsa_offchain::{framing_width_from, FramedSchemeSchema};
use crate::{recovery, AuthError, VerifierInterface};
use alloy_primitives::keccak256;
use async_trait::async_trait;
use sponsor_types::{
	authorization_digest, AbiWordEncoder, Address, ConfigSchema, ExecutionContext,
	ImplementationRegistry, SchemeTag, SponsoredOperation, ValidityCode, B256,
};

/// Byte length of the token address ahead of the signature.
const TOKEN_LENGTH: usize = 20;

/// Verifier for token-bound signatures over the canonical digest.
pub struct EcdsaPermitVerifier {
	framing_width: usize,
}

impl EcdsaPermitVerifier {
	/// Creates a new verifier with the given framing width.
	pub fn new(framing_width: usize) -> Self {
		Self { framing_width }
	}

	/// Splits the payload into the fee token address and the signature.
	fn split_payload(payload: &[u8]) -> Result<(Address, &[u8]), AuthError> {
		if payload.len() < TOKEN_LENGTH {
			return Err(AuthError::MalformedAuthorization(format!(
				"permit payload needs a {}-byte token address, got {} bytes",
				TOKEN_LENGTH,
				payload.len()
			)));
		}
		let token = Address::from_slice(&payload[..TOKEN_LENGTH]);
		Ok((token, &payload[TOKEN_LENGTH..]))
	}
}

/// Binds a digest to the fee token it was authorized for.
fn token_bound_digest(digest: &B256, token: &Address) -> B256 {
	let mut enc = AbiWordEncoder::new();
	enc.push_b256(digest);
	enc.push_address(token);
	keccak256(enc.finish())
}

#[async_trait]
impl VerifierInterface for EcdsaPermitVerifier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FramedSchemeSchema)
	}

	fn scheme_tag(&self) -> Option<SchemeTag> {
		Some(SchemeTag::ECDSA_PERMIT)
	}

	fn framing_width(&self) -> usize {
		self.framing_width
	}

	async fn validate_operation(
		&self,
		operation: &SponsoredOperation,
		_operation_hash: &B256,
		payload: &[u8],
		owner: &Address,
		context: &ExecutionContext,
	) -> Result<ValidityCode, AuthError> {
		let (token, signature) = Self::split_payload(payload)?;
		let digest = authorization_digest(
			&operation.intrinsic_hash,
			operation.valid_after,
			operation.valid_until,
			context.chain_id,
		);
		let bound = token_bound_digest(&digest, &token);
		if recovery::is_valid_signature(owner, &bound, signature)? {
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
		let (token, signature) = Self::split_payload(payload)?;
		let bound = token_bound_digest(hash, &token);
		recovery::is_valid_signature(owner, &bound, signature)
	}
}

/// Factory function to create a permit-bound verifier from configuration.
///
/// Configuration parameters:
/// - `framing_width` (optional): 1 or 5, defaults to 1
pub fn create_verifier(config: &toml::Value) -> Result<Box<dyn VerifierInterface>, AuthError> {
	FramedSchemeSchema::validate_config(config)
		.map_err(|e| AuthError::InvalidConfig(e.to_string()))?;
	Ok(Box::new(EcdsaPermitVerifier::new(framing_width_from(config))))
}

/// Registry for the permit-bound verifier.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "ecdsa_permit";
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
	async fn test_token_bound_signature_verifies() {
		let signer = PrivateKeySigner::random();
		let token = Address::repeat_byte(0xA0);
		let hash = B256::repeat_byte(0x31);
		let sig = signer.sign_hash_sync(&token_bound_digest(&hash, &token)).unwrap();

		let mut payload = token.to_vec();
		payload.extend_from_slice(&encode_signature(&sig));

		let verifier = EcdsaPermitVerifier::new(1);
		let valid = verifier
			.validate_signature_for_owner(&signer.address(), &hash, &payload)
			.await
			.unwrap();
		assert!(valid);
	}

	#[tokio::test]
	async fn test_different_token_breaks_the_binding() {
		let signer = PrivateKeySigner::random();
		let token = Address::repeat_byte(0xA0);
		let hash = B256::repeat_byte(0x31);
		let sig = signer.sign_hash_sync(&token_bound_digest(&hash, &token)).unwrap();

		// Present the same signature under another fee token.
		let mut payload = Address::repeat_byte(0xB0).to_vec();
		payload.extend_from_slice(&encode_signature(&sig));

		let verifier = EcdsaPermitVerifier::new(1);
		let valid = verifier
			.validate_signature_for_owner(&signer.address(), &hash, &payload)
			.await
			.unwrap();
		assert!(!valid);
	}

	#[tokio::test]
	async fn test_payload_shorter_than_token_is_malformed() {
		let verifier = EcdsaPermitVerifier::new(1);
		let err = verifier
			.validate_signature_for_owner(&Address::ZERO, &B256::ZERO, &[0u8; 10])
			.await
			.unwrap_err();
		assert!(matches!(err, AuthError::MalformedAuthorization(_)));
	}
}
