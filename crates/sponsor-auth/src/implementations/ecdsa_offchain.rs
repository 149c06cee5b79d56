//! Off-chain ECDSA verifier implementation.
//!
//! The sponsor's owner signs the canonical authorization digest off-chain:
//! the operation's intrinsic hash bound to its validity window and the
//! execution chain, double-hashed. The payload after tag and framing is the
//! 65-byte signature.

use crate::{recovery, AuthError, VerifierInterface};
use async_trait::async_trait;
use sponsor_types::{
	authorization_digest, Address, ConfigSchema, ExecutionContext, Field, FieldType,
	ImplementationRegistry, Schema, SchemeTag, SponsoredOperation, ValidityCode, B256,
};

/// Framing bytes stripped between tag and payload unless configured
/// otherwise. Signer builds in this lineage have produced both 1- and
/// 5-byte framings; the width is part of the scheme contract and must match
/// the signer side.
pub const DEFAULT_FRAMING_WIDTH: usize = 1;

/// Verifier for signatures over the canonical operation digest.
pub struct EcdsaOffchainVerifier {
	/// Declared framing width for this deployment.
	framing_width: usize,
}

impl EcdsaOffchainVerifier {
	/// Creates a new verifier with the given framing width.
	pub fn new(framing_width: usize) -> Self {
		Self { framing_width }
	}
}

#[async_trait]
impl VerifierInterface for EcdsaOffchainVerifier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FramedSchemeSchema)
	}

	fn scheme_tag(&self) -> Option<SchemeTag> {
		Some(SchemeTag::ECDSA_OFFCHAIN)
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
		let digest = authorization_digest(
			&operation.intrinsic_hash,
			operation.valid_after,
			operation.valid_until,
			context.chain_id,
		);
		if recovery::is_valid_signature(owner, &digest, payload)? {
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

/// Configuration schema shared by the framed ECDSA schemes.
///
/// The only knob is the framing width, constrained to the two widths
/// observed on the signer side.
pub struct FramedSchemeSchema;

impl FramedSchemeSchema {
	/// Static validation method for use before instance creation.
	pub fn validate_config(config: &toml::Value) -> Result<(), sponsor_types::ValidationError> {
		let instance = Self;
		instance.validate(config)
	}
}

impl ConfigSchema for FramedSchemeSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), sponsor_types::ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new(
				"framing_width",
				FieldType::Integer {
					min: Some(1),
					max: Some(5),
				},
			)
			.with_validator(|value| match value.as_integer() {
				Some(1) | Some(5) => Ok(()),
				_ => Err("framing_width must be 1 or 5".to_string()),
			})],
		);
		schema.validate(config)
	}
}

/// Reads the configured framing width, defaulting when absent.
pub(crate) fn framing_width_from(config: &toml::Value) -> usize {
	config
		.get("framing_width")
		.and_then(|v| v.as_integer())
		.map(|v| v as usize)
		.unwrap_or(DEFAULT_FRAMING_WIDTH)
}

/// Factory function to create an off-chain ECDSA verifier from configuration.
///
/// Configuration parameters:
/// - `framing_width` (optional): 1 or 5, defaults to 1
pub fn create_verifier(config: &toml::Value) -> Result<Box<dyn VerifierInterface>, AuthError> {
	FramedSchemeSchema::validate_config(config)
		.map_err(|e| AuthError::InvalidConfig(e.to_string()))?;
	Ok(Box::new(EcdsaOffchainVerifier::new(framing_width_from(config))))
}

/// Registry for the off-chain ECDSA verifier.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "ecdsa_offchain";
	type Factory = crate::VerifierFactory;

	fn factory() -> Self::Factory {
		create_verifier
	}
}

impl crate::VerifierRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::AuthService;
	use alloy_primitives::{Bytes, PrimitiveSignature as Signature};
	use alloy_signer::SignerSync;
	use alloy_signer_local::PrivateKeySigner;

	fn encode_signature(sig: &Signature) -> Vec<u8> {
		let mut bytes = Vec::with_capacity(65);
		bytes.extend_from_slice(&sig.r().to_be_bytes::<32>());
		bytes.extend_from_slice(&sig.s().to_be_bytes::<32>());
		bytes.push(27 + sig.v() as u8);
		bytes
	}

	fn context() -> ExecutionContext {
		ExecutionContext {
			chain_id: 10,
			timestamp: 150,
		}
	}

	fn signed_operation(signer: &PrivateKeySigner, chain_id: u64) -> SponsoredOperation {
		let intrinsic = B256::repeat_byte(0x11);
		let digest = authorization_digest(&intrinsic, 100, 200, chain_id);
		let sig = signer.sign_hash_sync(&digest).unwrap();

		let mut blob = SchemeTag::ECDSA_OFFCHAIN.0.to_vec();
		blob.push(0xEE); // framing byte, content irrelevant
		blob.extend_from_slice(&encode_signature(&sig));

		SponsoredOperation {
			intrinsic_hash: intrinsic,
			valid_after: 100,
			valid_until: 200,
			authorization: Bytes::from(blob),
		}
	}

	fn service() -> AuthService {
		let empty: toml::Value = toml::from_str("").unwrap();
		let tagged = create_verifier(&empty).unwrap();
		let default = crate::implementations::no_prefix::create_verifier(&empty).unwrap();
		AuthService::new(vec![tagged], default).unwrap()
	}

	#[tokio::test]
	async fn test_end_to_end_valid_authorization() {
		let signer = PrivateKeySigner::random();
		let op = signed_operation(&signer, 10);

		let code = service()
			.validate_operation(&op, &B256::ZERO, &signer.address(), &context())
			.await
			.unwrap();
		assert_eq!(code, ValidityCode::VALID);
	}

	#[tokio::test]
	async fn test_digest_binds_chain_id() {
		let signer = PrivateKeySigner::random();
		// Signed for chain 99, validated against chain 10.
		let op = signed_operation(&signer, 99);

		let code = service()
			.validate_operation(&op, &B256::ZERO, &signer.address(), &context())
			.await
			.unwrap();
		assert_eq!(code, ValidityCode::SIG_VALIDATION_FAILED);
	}

	#[tokio::test]
	async fn test_wrong_owner_is_a_verdict_not_an_error() {
		let signer = PrivateKeySigner::random();
		let other = PrivateKeySigner::random();
		let op = signed_operation(&signer, 10);

		let code = service()
			.validate_operation(&op, &B256::ZERO, &other.address(), &context())
			.await
			.unwrap();
		assert_eq!(code, ValidityCode::SIG_VALIDATION_FAILED);
	}

	#[tokio::test]
	async fn test_prefixed_signer_verifies_via_second_attempt() {
		let signer = PrivateKeySigner::random();
		let intrinsic = B256::repeat_byte(0x11);
		let digest = authorization_digest(&intrinsic, 100, 200, 10);
		let sig = signer.sign_message_sync(digest.as_slice()).unwrap();

		let mut blob = SchemeTag::ECDSA_OFFCHAIN.0.to_vec();
		blob.push(0x00);
		blob.extend_from_slice(&encode_signature(&sig));
		let op = SponsoredOperation {
			intrinsic_hash: intrinsic,
			valid_after: 100,
			valid_until: 200,
			authorization: Bytes::from(blob),
		};

		let code = service()
			.validate_operation(&op, &B256::ZERO, &signer.address(), &context())
			.await
			.unwrap();
		assert_eq!(code, ValidityCode::VALID);
	}

	#[test]
	fn test_factory_rejects_unsupported_framing_width() {
		let config: toml::Value = toml::from_str("framing_width = 3").unwrap();
		assert!(create_verifier(&config).is_err());

		let config: toml::Value = toml::from_str("framing_width = 5").unwrap();
		let verifier = create_verifier(&config).unwrap();
		assert_eq!(verifier.framing_width(), 5);
	}
}
