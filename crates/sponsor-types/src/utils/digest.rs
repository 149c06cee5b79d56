//! Canonical authorization digest shared across the system.
//!
//! These helpers provide:
//! - A minimal ABI encoder for 32-byte-word static fields
//! - The domain-bound digest binding an operation to its validity window and
//!   execution chain
//!
//! Off-host signers must reproduce this derivation exactly (same field order,
//! same double hash) to produce a digest the dispatcher will accept, which is
//! why it lives in the shared types crate.

use alloy_primitives::{keccak256, Address as AlloyAddress, B256};

/// Computes the canonical digest an owner signs to authorize an operation.
///
/// The preimage is the ABI-word encoding of
/// `(intrinsicHash, validAfter, validUntil, chainId)` in that order. The
/// encoding is hashed twice: the outer hash prevents the inner digest from
/// being reused as a differently-shaped signable artifact.
pub fn authorization_digest(
	intrinsic_hash: &B256,
	valid_after: u64,
	valid_until: u64,
	chain_id: u64,
) -> B256 {
	let mut enc = AbiWordEncoder::new();
	enc.push_b256(intrinsic_hash);
	enc.push_u64(valid_after);
	enc.push_u64(valid_until);
	enc.push_u64(chain_id);
	let inner = keccak256(enc.finish());
	keccak256(inner)
}

/// Minimal ABI encoder for static 32-byte-word field types.
pub struct AbiWordEncoder {
	buf: Vec<u8>,
}

impl Default for AbiWordEncoder {
	fn default() -> Self {
		Self::new()
	}
}

impl AbiWordEncoder {
	pub fn new() -> Self {
		Self { buf: Vec::new() }
	}

	pub fn push_b256(&mut self, v: &B256) {
		self.buf.extend_from_slice(v.as_slice());
	}

	pub fn push_address(&mut self, addr: &AlloyAddress) {
		let mut word = [0u8; 32];
		word[12..].copy_from_slice(addr.as_slice());
		self.buf.extend_from_slice(&word);
	}

	pub fn push_u64(&mut self, v: u64) {
		let mut word = [0u8; 32];
		word[24..].copy_from_slice(&v.to_be_bytes());
		self.buf.extend_from_slice(&word);
	}

	pub fn finish(self) -> Vec<u8> {
		self.buf
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_digest() -> B256 {
		authorization_digest(&B256::repeat_byte(0x11), 100, 200, 1)
	}

	#[test]
	fn test_digest_is_deterministic() {
		assert_eq!(sample_digest(), sample_digest());
	}

	#[test]
	fn test_digest_binds_every_field() {
		let base = sample_digest();
		assert_ne!(
			base,
			authorization_digest(&B256::repeat_byte(0x12), 100, 200, 1)
		);
		assert_ne!(
			base,
			authorization_digest(&B256::repeat_byte(0x11), 101, 200, 1)
		);
		assert_ne!(
			base,
			authorization_digest(&B256::repeat_byte(0x11), 100, 201, 1)
		);
		assert_ne!(
			base,
			authorization_digest(&B256::repeat_byte(0x11), 100, 200, 2)
		);
	}

	#[test]
	fn test_digest_is_double_hashed() {
		// The published digest must differ from the inner single hash so a
		// captured inner digest is never directly signable.
		let mut enc = AbiWordEncoder::new();
		enc.push_b256(&B256::repeat_byte(0x11));
		enc.push_u64(100);
		enc.push_u64(200);
		enc.push_u64(1);
		let inner = keccak256(enc.finish());
		assert_ne!(sample_digest(), inner);
		assert_eq!(sample_digest(), keccak256(inner));
	}

	#[test]
	fn test_encoder_pads_to_words() {
		let mut enc = AbiWordEncoder::new();
		enc.push_u64(7);
		enc.push_address(&AlloyAddress::repeat_byte(0xab));
		let out = enc.finish();
		assert_eq!(out.len(), 64);
		assert_eq!(out[31], 7);
		assert!(out[..31].iter().all(|b| *b == 0));
		assert!(out[32..44].iter().all(|b| *b == 0));
		assert!(out[44..].iter().all(|b| *b == 0xab));
	}
}
