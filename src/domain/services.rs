//! # Domain Services
//!
//! Pure, deterministic helpers: hashing and contract address derivation.

use crate::domain::value_objects::{Address, Hash};
use sha3::{Digest, Keccak256};

/// Computes the Keccak-256 hash of `data`.
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash {
    Hash::new(Keccak256::digest(data).into())
}

/// Keccak-256 of the empty byte string — the code hash of a codeless account.
#[must_use]
pub fn empty_code_hash() -> Hash {
    keccak256(&[])
}

/// Address of a contract created with CREATE.
///
/// `keccak256(rlp([sender, nonce]))[12..]` per the Yellow Paper.
#[must_use]
pub fn create_address(sender: Address, nonce: u64) -> Address {
    // Payload: RLP(address) ++ RLP(nonce).
    let mut payload = Vec::with_capacity(28);
    payload.push(0x80 + 20);
    payload.extend_from_slice(sender.as_bytes());
    if nonce == 0 {
        payload.push(0x80);
    } else if nonce < 0x80 {
        payload.push(nonce as u8);
    } else {
        let digits = trimmed_be_bytes(nonce);
        payload.push(0x80 + digits.len() as u8);
        payload.extend_from_slice(&digits);
    }

    // Short list header is always enough: 21 + at most 9 payload bytes.
    let mut rlp = Vec::with_capacity(1 + payload.len());
    rlp.push(0xc0 + payload.len() as u8);
    rlp.extend_from_slice(&payload);

    let hash = keccak256(&rlp);
    Address::from_slice(&hash.as_bytes()[12..]).unwrap_or(Address::ZERO)
}

/// Address of a contract created with CREATE2.
///
/// `keccak256(0xff ++ sender ++ salt ++ keccak256(init_code))[12..]` per
/// EIP-1014; a pure function of its inputs.
#[must_use]
pub fn create2_address(sender: Address, salt: Hash, init_code: &[u8]) -> Address {
    let code_hash = keccak256(init_code);

    let mut preimage = Vec::with_capacity(85);
    preimage.push(0xff);
    preimage.extend_from_slice(sender.as_bytes());
    preimage.extend_from_slice(salt.as_bytes());
    preimage.extend_from_slice(code_hash.as_bytes());

    let hash = keccak256(&preimage);
    Address::from_slice(&hash.as_bytes()[12..]).unwrap_or(Address::ZERO)
}

/// Address owned by an uncompressed secp256k1 public key (64 bytes, no 0x04
/// prefix): `keccak256(pubkey)[12..]`.
#[must_use]
pub fn address_from_pubkey(public_key: &[u8]) -> Address {
    let hash = keccak256(public_key);
    Address::from_slice(&hash.as_bytes()[12..]).unwrap_or(Address::ZERO)
}

fn trimmed_be_bytes(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(7);
    bytes[start..].to_vec()
}

// =============================================================================
// TESTS
// =============================================================================
