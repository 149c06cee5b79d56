//! Authorization module for the sponsor-gate system.
//!
//! This module routes authorization blobs to the verifier for the scheme
//! that produced them. The dispatcher reads the fixed-width scheme tag at
//! the front of the blob, strips the tag plus the scheme's declared framing
//! bytes, and delegates the remaining payload to the matching verifier.
//! Blobs with an unknown tag are forwarded whole to the default (no-prefix)
//! scheme together with the externally supplied hash.

use async_trait::async_trait;
use sponsor_types::{
	Address, ConfigSchema, ExecutionContext, ImplementationRegistry, SchemeTag,
	SponsoredOperation, ValidityCode, B256,
};
use std::collections::HashMap;
use thiserror::Error;

/// ECDSA recovery primitive shared by the signature-based schemes.
pub mod recovery;

/// Re-export implementations
pub mod implementations {
	pub mod ecdsa_offchain;
	pub mod ecdsa_onchain;
	pub mod ecdsa_permit;
	pub mod no_prefix;
}

/// Errors that can occur during authorization processing.
#[derive(Debug, Error)]
pub enum AuthError {
	/// The blob is too short for its scheme tag or declared framing.
	#[error("Malformed authorization: {0}")]
	MalformedAuthorization(String),
	/// A signature payload has an invalid byte length.
	#[error("Invalid signature length: {0} bytes")]
	InvalidSignatureLength(usize),
	/// A verifier's configuration is invalid.
	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),
	/// A delegate verifier failed.
	#[error("Verifier failure: {0}")]
	Verifier(String),
}

/// Trait defining the interface for authorization scheme verifiers.
///
/// One implementation exists per scheme tag. The dispatcher consults
/// [`VerifierInterface::framing_width`] to know how many bytes to strip
/// between the tag and the payload; that width is part of each scheme's
/// contract, not a universal constant.
#[async_trait]
pub trait VerifierInterface: Send + Sync {
	/// Returns the configuration schema for this verifier implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// The scheme tag this verifier handles, or `None` for the default
	/// scheme that consumes untagged blobs.
	fn scheme_tag(&self) -> Option<SchemeTag>;

	/// Number of framing bytes between the scheme tag and the payload.
	///
	/// The dispatcher strips exactly this many bytes before forwarding.
	fn framing_width(&self) -> usize;

	/// Validates an operation's authorization payload for the claimed owner.
	///
	/// Returns a numeric validity code; zero denotes valid. Non-zero codes
	/// are verdicts for the caller to interpret, not errors.
	async fn validate_operation(
		&self,
		operation: &SponsoredOperation,
		operation_hash: &B256,
		payload: &[u8],
		owner: &Address,
		context: &ExecutionContext,
	) -> Result<ValidityCode, AuthError>;

	/// Validates a payload as a signature over an externally supplied hash.
	async fn validate_signature_for_owner(
		&self,
		owner: &Address,
		hash: &B256,
		payload: &[u8],
	) -> Result<bool, AuthError>;
}

/// Type alias for verifier factory functions.
pub type VerifierFactory = fn(&toml::Value) -> Result<Box<dyn VerifierInterface>, AuthError>;

/// Registry trait for verifier implementations.
pub trait VerifierRegistry: ImplementationRegistry<Factory = VerifierFactory> {}

/// Get all registered verifier implementations.
///
/// Returns a vector of (name, factory) tuples for all available schemes.
pub fn get_all_implementations() -> Vec<(&'static str, VerifierFactory)> {
	use implementations::{ecdsa_offchain, ecdsa_onchain, ecdsa_permit, no_prefix};

	vec![
		(ecdsa_offchain::Registry::NAME, ecdsa_offchain::Registry::factory()),
		(ecdsa_onchain::Registry::NAME, ecdsa_onchain::Registry::factory()),
		(ecdsa_permit::Registry::NAME, ecdsa_permit::Registry::factory()),
		(no_prefix::Registry::NAME, no_prefix::Registry::factory()),
	]
}

/// Service that dispatches authorization blobs to scheme verifiers.
///
/// Pure routing: the dispatcher holds no state across calls, never retries,
/// and never interprets a delegate's failure.
pub struct AuthService {
	/// Scheme verifiers keyed by their tag.
	verifiers: HashMap<SchemeTag, Box<dyn VerifierInterface>>,
	/// Verifier for untagged blobs and unknown tags.
	default_verifier: Box<dyn VerifierInterface>,
}

impl std::fmt::Debug for AuthService {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AuthService")
			.field("verifiers", &self.verifiers.keys().collect::<Vec<_>>())
			.finish_non_exhaustive()
	}
}

impl AuthService {
	/// Creates a new AuthService from tagged verifiers and a default.
	///
	/// Every entry in `verifiers` must declare a scheme tag, and tags must
	/// be unique; the default verifier consumes everything else.
	pub fn new(
		verifiers: Vec<Box<dyn VerifierInterface>>,
		default_verifier: Box<dyn VerifierInterface>,
	) -> Result<Self, AuthError> {
		let mut table = HashMap::new();
		for verifier in verifiers {
			let tag = verifier.scheme_tag().ok_or_else(|| {
				AuthError::InvalidConfig(
					"tagged verifier table may not contain the default scheme".to_string(),
				)
			})?;
			if table.insert(tag, verifier).is_some() {
				return Err(AuthError::InvalidConfig(format!(
					"duplicate verifier for scheme tag {}",
					tag
				)));
			}
		}
		Ok(Self {
			verifiers: table,
			default_verifier,
		})
	}

	/// Validates an operation's authorization blob for the claimed owner.
	///
	/// `operation_hash` is the host-supplied hash; the default scheme
	/// consumes it as-is instead of re-deriving one.
	pub async fn validate_operation(
		&self,
		operation: &SponsoredOperation,
		operation_hash: &B256,
		owner: &Address,
		context: &ExecutionContext,
	) -> Result<ValidityCode, AuthError> {
		let (verifier, payload) = self.route(&operation.authorization)?;
		verifier
			.validate_operation(operation, operation_hash, payload, owner, context)
			.await
	}

	/// Validates an authorization blob as a signature over a bare hash.
	pub async fn validate_signature_for_owner(
		&self,
		owner: &Address,
		hash: &B256,
		blob: &[u8],
	) -> Result<bool, AuthError> {
		let (verifier, payload) = self.route(blob)?;
		verifier.validate_signature_for_owner(owner, hash, payload).await
	}

	/// Resolves the verifier for a blob and strips tag plus framing.
	///
	/// Unknown tags are not an error: the whole blob, tag included, goes to
	/// the default verifier unmodified.
	fn route<'a>(&self, blob: &'a [u8]) -> Result<(&dyn VerifierInterface, &'a [u8]), AuthError> {
		let tag = SchemeTag::from_prefix(blob).ok_or_else(|| {
			AuthError::MalformedAuthorization(format!(
				"blob is {} bytes, shorter than the {}-byte scheme tag",
				blob.len(),
				SchemeTag::LENGTH
			))
		})?;

		match self.verifiers.get(&tag) {
			Some(verifier) => {
				let offset = SchemeTag::LENGTH + verifier.framing_width();
				if blob.len() < offset {
					return Err(AuthError::MalformedAuthorization(format!(
						"scheme {} frames {} bytes after the tag, blob has {}",
						tag,
						verifier.framing_width(),
						blob.len() - SchemeTag::LENGTH
					)));
				}
				tracing::debug!(scheme = %tag, framing = verifier.framing_width(), "Dispatching tagged authorization");
				Ok((verifier.as_ref(), &blob[offset..]))
			},
			None => {
				tracing::debug!(scheme = %tag, "Unknown scheme tag, dispatching whole blob to default");
				Ok((self.default_verifier.as_ref(), blob))
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::Bytes;
	use sponsor_types::{Schema, ValidationError};
	use std::sync::{Arc, Mutex};

	/// Records what the dispatcher forwarded, for framing assertions.
	struct RecordingVerifier {
		tag: Option<SchemeTag>,
		framing: usize,
		seen_payload: Arc<Mutex<Option<Vec<u8>>>>,
		seen_hash: Arc<Mutex<Option<B256>>>,
		fail: bool,
	}

	struct EmptySchema;

	impl ConfigSchema for EmptySchema {
		fn validate(&self, _config: &toml::Value) -> Result<(), ValidationError> {
			Ok(())
		}
	}

	#[async_trait]
	impl VerifierInterface for RecordingVerifier {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(EmptySchema)
		}

		fn scheme_tag(&self) -> Option<SchemeTag> {
			self.tag
		}

		fn framing_width(&self) -> usize {
			self.framing
		}

		async fn validate_operation(
			&self,
			_operation: &SponsoredOperation,
			operation_hash: &B256,
			payload: &[u8],
			_owner: &Address,
			_context: &ExecutionContext,
		) -> Result<ValidityCode, AuthError> {
			if self.fail {
				return Err(AuthError::Verifier("delegate failed".to_string()));
			}
			*self.seen_payload.lock().unwrap() = Some(payload.to_vec());
			*self.seen_hash.lock().unwrap() = Some(*operation_hash);
			Ok(ValidityCode::VALID)
		}

		async fn validate_signature_for_owner(
			&self,
			_owner: &Address,
			_hash: &B256,
			payload: &[u8],
		) -> Result<bool, AuthError> {
			if self.fail {
				return Err(AuthError::Verifier("delegate failed".to_string()));
			}
			*self.seen_payload.lock().unwrap() = Some(payload.to_vec());
			Ok(true)
		}
	}

	fn recording(
		tag: Option<SchemeTag>,
		framing: usize,
	) -> (Box<dyn VerifierInterface>, Arc<Mutex<Option<Vec<u8>>>>, Arc<Mutex<Option<B256>>>) {
		let payload = Arc::new(Mutex::new(None));
		let hash = Arc::new(Mutex::new(None));
		let verifier = Box::new(RecordingVerifier {
			tag,
			framing,
			seen_payload: payload.clone(),
			seen_hash: hash.clone(),
			fail: false,
		});
		(verifier, payload, hash)
	}

	fn operation(authorization: Vec<u8>) -> SponsoredOperation {
		SponsoredOperation {
			intrinsic_hash: B256::repeat_byte(0x11),
			valid_after: 100,
			valid_until: 200,
			authorization: Bytes::from(authorization),
		}
	}

	fn context() -> ExecutionContext {
		ExecutionContext {
			chain_id: 1,
			timestamp: 150,
		}
	}

	#[tokio::test]
	async fn test_short_blob_is_malformed_not_a_verdict() {
		let (default, _, _) = recording(None, 0);
		let service = AuthService::new(vec![], default).unwrap();

		let op = operation(vec![0x01, 0x02, 0x03]);
		let err = service
			.validate_operation(&op, &B256::ZERO, &Address::ZERO, &context())
			.await
			.unwrap_err();
		assert!(matches!(err, AuthError::MalformedAuthorization(_)));

		let err = service
			.validate_signature_for_owner(&Address::ZERO, &B256::ZERO, &[0x01])
			.await
			.unwrap_err();
		assert!(matches!(err, AuthError::MalformedAuthorization(_)));
	}

	#[tokio::test]
	async fn test_known_tag_strips_exactly_the_declared_framing() {
		let (tagged, payload, _) = recording(Some(SchemeTag::ECDSA_OFFCHAIN), 1);
		let (default, _, _) = recording(None, 0);
		let service = AuthService::new(vec![tagged], default).unwrap();

		// Garbage framing byte between tag and payload must never reach
		// the verifier.
		let mut blob = SchemeTag::ECDSA_OFFCHAIN.0.to_vec();
		blob.push(0xEE);
		blob.extend_from_slice(&[0xAA, 0xBB, 0xCC]);

		let op = operation(blob);
		let code = service
			.validate_operation(&op, &B256::ZERO, &Address::ZERO, &context())
			.await
			.unwrap();
		assert_eq!(code, ValidityCode::VALID);
		assert_eq!(payload.lock().unwrap().as_deref(), Some(&[0xAA, 0xBB, 0xCC][..]));
	}

	#[tokio::test]
	async fn test_five_byte_framing_variant() {
		let (tagged, payload, _) = recording(Some(SchemeTag::ECDSA_ONCHAIN), 5);
		let (default, _, _) = recording(None, 0);
		let service = AuthService::new(vec![tagged], default).unwrap();

		let mut blob = SchemeTag::ECDSA_ONCHAIN.0.to_vec();
		blob.extend_from_slice(&[0xEE; 5]);
		blob.extend_from_slice(&[0x01, 0x02]);

		let valid = service
			.validate_signature_for_owner(&Address::ZERO, &B256::ZERO, &blob)
			.await
			.unwrap();
		assert!(valid);
		assert_eq!(payload.lock().unwrap().as_deref(), Some(&[0x01, 0x02][..]));
	}

	#[tokio::test]
	async fn test_blob_shorter_than_framing_is_malformed() {
		let (tagged, _, _) = recording(Some(SchemeTag::ECDSA_ONCHAIN), 5);
		let (default, _, _) = recording(None, 0);
		let service = AuthService::new(vec![tagged], default).unwrap();

		let mut blob = SchemeTag::ECDSA_ONCHAIN.0.to_vec();
		blob.extend_from_slice(&[0xEE; 3]);

		let err = service
			.validate_signature_for_owner(&Address::ZERO, &B256::ZERO, &blob)
			.await
			.unwrap_err();
		assert!(matches!(err, AuthError::MalformedAuthorization(_)));
	}

	#[tokio::test]
	async fn test_unknown_tag_forwards_whole_blob_and_supplied_hash() {
		let (tagged, tagged_payload, _) = recording(Some(SchemeTag::ECDSA_OFFCHAIN), 1);
		let (default, payload, hash) = recording(None, 0);
		let service = AuthService::new(vec![tagged], default).unwrap();

		let blob = vec![0xde, 0xad, 0xbe, 0xef, 0x01, 0x02];
		let supplied = B256::repeat_byte(0x77);
		let op = operation(blob.clone());
		service
			.validate_operation(&op, &supplied, &Address::ZERO, &context())
			.await
			.unwrap();

		// The default scheme sees the original bytes, tag included, and the
		// externally supplied hash rather than a re-derived one.
		assert_eq!(payload.lock().unwrap().as_deref(), Some(&blob[..]));
		assert_eq!(*hash.lock().unwrap(), Some(supplied));
		assert!(tagged_payload.lock().unwrap().is_none());
	}

	#[tokio::test]
	async fn test_delegate_failure_propagates_unchanged() {
		let default = Box::new(RecordingVerifier {
			tag: None,
			framing: 0,
			seen_payload: Arc::new(Mutex::new(None)),
			seen_hash: Arc::new(Mutex::new(None)),
			fail: true,
		});
		let service = AuthService::new(vec![], default).unwrap();

		let op = operation(vec![0xde, 0xad, 0xbe, 0xef]);
		let err = service
			.validate_operation(&op, &B256::ZERO, &Address::ZERO, &context())
			.await
			.unwrap_err();
		assert!(matches!(err, AuthError::Verifier(m) if m == "delegate failed"));
	}

	#[tokio::test]
	async fn test_duplicate_scheme_tags_rejected() {
		let (a, _, _) = recording(Some(SchemeTag::ECDSA_OFFCHAIN), 1);
		let (b, _, _) = recording(Some(SchemeTag::ECDSA_OFFCHAIN), 1);
		let (default, _, _) = recording(None, 0);
		let err = AuthService::new(vec![a, b], default).unwrap_err();
		assert!(matches!(err, AuthError::InvalidConfig(_)));
	}
}
