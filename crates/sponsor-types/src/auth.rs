//! Authorization scheme tag types.
//!
//! Every authorization blob starts with a fixed-width scheme tag selecting
//! which verifier applies. Tags are compared as exact-width values; an
//! unknown tag is not an error, it routes the whole blob to the default
//! scheme.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-width discriminator identifying an authorization scheme.
///
/// The tag occupies the first [`SchemeTag::LENGTH`] bytes of every
/// authorization blob. Values are stable constants; the known set is closed
/// and everything else is "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemeTag(pub [u8; 4]);

impl SchemeTag {
	/// Width of the tag at the front of an authorization blob.
	pub const LENGTH: usize = 4;

	/// Off-chain ECDSA over the canonical operation digest.
	pub const ECDSA_OFFCHAIN: Self = Self(*b"ofch");
	/// On-chain transaction-replay ECDSA over the supplied operation hash.
	pub const ECDSA_ONCHAIN: Self = Self(*b"onch");
	/// ERC-20-permit-bound ECDSA over the token-bound digest.
	pub const ECDSA_PERMIT: Self = Self(*b"prmt");

	/// Reads the tag from the front of an authorization blob.
	///
	/// Returns `None` when the blob is shorter than the tag width; the
	/// caller must treat that as malformed input, never as an unknown
	/// scheme.
	pub fn from_prefix(blob: &[u8]) -> Option<Self> {
		if blob.len() < Self::LENGTH {
			return None;
		}
		let mut tag = [0u8; 4];
		tag.copy_from_slice(&blob[..Self::LENGTH]);
		Some(Self(tag))
	}
}

impl fmt::Display for SchemeTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{}", hex::encode(self.0))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_from_prefix_rejects_short_input() {
		assert_eq!(SchemeTag::from_prefix(&[]), None);
		assert_eq!(SchemeTag::from_prefix(&[0x6f, 0x66, 0x63]), None);
	}

	#[test]
	fn test_from_prefix_reads_exactly_four_bytes() {
		let blob = [b'o', b'f', b'c', b'h', 0xaa, 0xbb];
		assert_eq!(
			SchemeTag::from_prefix(&blob),
			Some(SchemeTag::ECDSA_OFFCHAIN)
		);
	}

	#[test]
	fn test_exact_width_compare() {
		// A blob starting with a known tag plus one extra byte must not
		// match by prefix-substring; only the first four bytes count.
		let tag = SchemeTag::from_prefix(b"ofcX rest").unwrap();
		assert_ne!(tag, SchemeTag::ECDSA_OFFCHAIN);
	}

	#[test]
	fn test_display() {
		assert_eq!(SchemeTag::ECDSA_OFFCHAIN.to_string(), "0x6f666368");
	}
}
