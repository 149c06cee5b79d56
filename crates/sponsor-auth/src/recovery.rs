//! ECDSA recovery primitive with a two-attempt interpretation fallback.
//!
//! Off-chain signers disagree on whether they sign the raw 32-byte digest or
//! the EIP-191 personal-message wrapping of it. Verification tries both
//! interpretations against the claimed owner before reporting a mismatch.

use crate::AuthError;
use alloy_primitives::{eip191_hash_message, Address, Signature, B256};

/// Byte length of an encoded ECDSA signature (r || s || v).
pub const SIGNATURE_LENGTH: usize = 65;

/// Checks whether `signature` was produced by `expected_signer` over `hash`.
///
/// Attempt 1 recovers from the raw hash; attempt 2 recovers from the
/// EIP-191 prefixed hash. A signature of plausible length that fails to
/// parse or recovers to a different address is a `false` result, not an
/// error. Only a signature of invalid length is an error, signaled
/// distinctly from "doesn't match".
pub fn is_valid_signature(
	expected_signer: &Address,
	hash: &B256,
	signature: &[u8],
) -> Result<bool, AuthError> {
	if signature.len() != SIGNATURE_LENGTH {
		return Err(AuthError::InvalidSignatureLength(signature.len()));
	}

	let sig = match Signature::try_from(signature) {
		Ok(sig) => sig,
		// Length is valid, so this is an unusable parity byte; the
		// signature cannot recover to the expected signer.
		Err(_) => return Ok(false),
	};

	if let Ok(recovered) = sig.recover_address_from_prehash(hash) {
		if recovered == *expected_signer {
			return Ok(true);
		}
	}

	let prefixed = eip191_hash_message(hash);
	if let Ok(recovered) = sig.recover_address_from_prehash(&prefixed) {
		if recovered == *expected_signer {
			return Ok(true);
		}
	}

	Ok(false)
}
