//! Content-addressed sponsor address derivation.
//!
//! A sponsor contract's address is a pure function of the factory address,
//! the template's deployment code with its constructor arguments, and the
//! per-owner salt index. The derivation mirrors the CREATE2 rule exactly:
//! `keccak256(0xff ‖ factory ‖ salt ‖ keccak256(init_code))[12..]`, so
//! off-host callers can learn a sponsor's address before it exists.

use alloy_primitives::{keccak256, Address, B256, U256};
use sponsor_types::AbiWordEncoder;

/// Converts a salt index into the 32-byte CREATE2 salt.
pub fn salt_for_index(index: U256) -> B256 {
	B256::from(index.to_be_bytes::<32>())
}

/// Assembles the init code: template code followed by the ABI-encoded
/// constructor arguments `(templateId, owner)`.
pub fn sponsor_init_code(template_code: &[u8], template_id: &B256, owner: &Address) -> Vec<u8> {
	let mut enc = AbiWordEncoder::new();
	enc.push_b256(template_id);
	enc.push_address(owner);

	let args = enc.finish();
	let mut init_code = Vec::with_capacity(template_code.len() + args.len());
	init_code.extend_from_slice(template_code);
	init_code.extend_from_slice(&args);
	init_code
}

/// Predicts the sponsor address for `(template, owner, index)`.
pub fn predict_sponsor_address(
	factory: &Address,
	template_code: &[u8],
	template_id: &B256,
	owner: &Address,
	index: U256,
) -> Address {
	let init_code = sponsor_init_code(template_code, template_id, owner);
	factory.create2(salt_for_index(index), keccak256(&init_code))
}

#[cfg(test)]
mod tests {
	use super::*;

	const TEMPLATE_CODE: &[u8] = &[0x60, 0x80, 0x60, 0x40, 0x52];

	fn factory() -> Address {
		Address::repeat_byte(0xFA)
	}

	fn template_id() -> B256 {
		B256::repeat_byte(0x70)
	}

	#[test]
	fn test_prediction_is_deterministic() {
		let owner = Address::repeat_byte(0x01);
		let a = predict_sponsor_address(&factory(), TEMPLATE_CODE, &template_id(), &owner, U256::from(3));
		let b = predict_sponsor_address(&factory(), TEMPLATE_CODE, &template_id(), &owner, U256::from(3));
		assert_eq!(a, b);
	}

	#[test]
	fn test_different_index_yields_different_address() {
		let owner = Address::repeat_byte(0x01);
		let a = predict_sponsor_address(&factory(), TEMPLATE_CODE, &template_id(), &owner, U256::from(1));
		let b = predict_sponsor_address(&factory(), TEMPLATE_CODE, &template_id(), &owner, U256::from(2));
		assert_ne!(a, b);
	}

	#[test]
	fn test_different_owner_yields_different_address() {
		let a = predict_sponsor_address(
			&factory(),
			TEMPLATE_CODE,
			&template_id(),
			&Address::repeat_byte(0x01),
			U256::from(1),
		);
		let b = predict_sponsor_address(
			&factory(),
			TEMPLATE_CODE,
			&template_id(),
			&Address::repeat_byte(0x02),
			U256::from(1),
		);
		assert_ne!(a, b);
	}

	#[test]
	fn test_tampered_template_changes_prediction() {
		let owner = Address::repeat_byte(0x01);
		let mut tampered = TEMPLATE_CODE.to_vec();
		tampered[0] ^= 0xFF;
		let a = predict_sponsor_address(&factory(), TEMPLATE_CODE, &template_id(), &owner, U256::from(1));
		let b = predict_sponsor_address(&factory(), &tampered, &template_id(), &owner, U256::from(1));
		assert_ne!(a, b);
	}

	#[test]
	fn test_init_code_layout() {
		let owner = Address::repeat_byte(0x01);
		let init_code = sponsor_init_code(TEMPLATE_CODE, &template_id(), &owner);
		assert_eq!(init_code.len(), TEMPLATE_CODE.len() + 64);
		assert_eq!(&init_code[..TEMPLATE_CODE.len()], TEMPLATE_CODE);
		// templateId word, then the owner left-padded to a word.
		assert_eq!(&init_code[TEMPLATE_CODE.len()..TEMPLATE_CODE.len() + 32], template_id().as_slice());
		assert_eq!(&init_code[TEMPLATE_CODE.len() + 44..], owner.as_slice());
	}
}
