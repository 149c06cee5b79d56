//! Operation types for the sponsor-gate system.
//!
//! This module defines the sponsored operation awaiting authorization, the
//! numeric validity code returned by verifiers, and the execution context
//! threaded through every validation call.

use alloy_primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A batched, sponsor-payable action awaiting authorization.
///
/// The intrinsic hash is computed by the surrounding execution host over the
/// operation's structural fields and is fixed once the operation is
/// constructed. The validity window bounds are bound into the canonical
/// digest; checking the current time against them is the caller's
/// responsibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsoredOperation {
	/// Host-computed hash over the operation's structural fields.
	pub intrinsic_hash: B256,
	/// Lower validity bound (Unix timestamp, inclusive).
	pub valid_after: u64,
	/// Upper validity bound (Unix timestamp).
	pub valid_until: u64,
	/// Opaque authorization blob: scheme tag, framing, and payload.
	pub authorization: Bytes,
}

/// Numeric validity code returned by operation validation.
///
/// Zero denotes a valid authorization. Non-zero codes are host-defined
/// failure codes, not errors; callers interpret them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidityCode(pub u64);

impl ValidityCode {
	/// The authorization verified successfully.
	pub const VALID: Self = Self(0);
	/// The signature did not recover to the claimed owner.
	pub const SIG_VALIDATION_FAILED: Self = Self(1);

	/// Returns true if this code denotes a valid authorization.
	pub fn is_valid(&self) -> bool {
		self.0 == 0
	}
}

impl fmt::Display for ValidityCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match *self {
			Self::VALID => write!(f, "valid"),
			Self::SIG_VALIDATION_FAILED => write!(f, "signature validation failed"),
			Self(code) => write!(f, "code {}", code),
		}
	}
}

/// Ambient execution context for validation calls.
///
/// Carries the chain identifier and the current time as explicit values so
/// the core stays testable with injected contexts instead of reading
/// process-wide globals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
	/// Chain identifier of the execution environment.
	pub chain_id: u64,
	/// Timestamp the context was built at (Unix seconds).
	pub timestamp: u64,
}

impl ExecutionContext {
	/// Creates a context for the given chain with the current system time.
	pub fn now(chain_id: u64) -> Self {
		Self {
			chain_id,
			timestamp: std::time::SystemTime::now()
				.duration_since(std::time::UNIX_EPOCH)
				.unwrap_or_default()
				.as_secs(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_validity_code_semantics() {
		assert!(ValidityCode::VALID.is_valid());
		assert!(!ValidityCode::SIG_VALIDATION_FAILED.is_valid());
		assert!(!ValidityCode(7).is_valid());
		assert_eq!(ValidityCode::VALID.to_string(), "valid");
		assert_eq!(ValidityCode(7).to_string(), "code 7");
	}
}
