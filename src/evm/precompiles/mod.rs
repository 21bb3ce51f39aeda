//! # Precompiled Contracts
//!
//! Built-in contracts at low integer addresses, dispatched through a
//! pluggable provider so different hard-fork sets can be composed. The base
//! set serves addresses 1 through 9.

pub mod blake2f;
pub mod bn128;
pub mod ecrecover;
pub mod identity;
pub mod modexp;
pub mod ripemd160;
pub mod sha256;

use crate::domain::value_objects::{Address, Bytes};
use crate::errors::PrecompileError;

/// One built-in contract: a gas formula and a byte-exact transformation.
pub trait Precompile: Send + Sync {
    /// Gas charged for `input`.
    fn gas_cost(&self, input: &[u8]) -> u64;

    /// Runs the contract.
    ///
    /// # Errors
    ///
    /// `PrecompileError` on malformed input; soft failures (e.g. an
    /// unrecoverable signature) return an empty output instead.
    fn run(&self, input: &[u8]) -> Result<Bytes, PrecompileError>;
}

/// A set of addresses served natively. Providers can be composed so several
/// address ranges are active at once.
pub trait PrecompileProvider: Send + Sync {
    /// True if `address` is served by this provider.
    fn can_handle(&self, address: &Address) -> bool;

    /// Gas charged for calling `address` with `input`. Zero for unhandled
    /// addresses.
    fn gas_cost(&self, address: &Address, input: &[u8]) -> u64;

    /// Executes the contract at `address`.
    ///
    /// # Errors
    ///
    /// `PrecompileError` on malformed input.
    fn execute(&self, address: &Address, input: &[u8]) -> Result<Bytes, PrecompileError>;
}

/// The low byte of a reserved precompile address, if the other 19 are zero.
fn low_index(address: &Address) -> Option<u8> {
    let bytes = address.as_bytes();
    if bytes[..19] == [0u8; 19] {
        Some(bytes[19])
    } else {
        None
    }
}

// =============================================================================
// BASE SET (addresses 1..=9)
// =============================================================================

/// The base precompile range: ECRECOVER (1), SHA256 (2), RIPEMD160 (3),
/// IDENTITY (4), MODEXP (5), BN128 ADD/MUL/PAIRING (6-8), BLAKE2F (9).
#[derive(Debug, Default)]
pub struct BasePrecompiles;

impl BasePrecompiles {
    fn lookup(index: u8) -> Option<&'static dyn Precompile> {
        static ECRECOVER: ecrecover::EcRecover = ecrecover::EcRecover;
        static SHA256: sha256::Sha256 = sha256::Sha256;
        static RIPEMD160: ripemd160::Ripemd160 = ripemd160::Ripemd160;
        static IDENTITY: identity::Identity = identity::Identity;
        static MODEXP: modexp::ModExp = modexp::ModExp;
        static BN_ADD: bn128::Bn128Add = bn128::Bn128Add;
        static BN_MUL: bn128::Bn128Mul = bn128::Bn128Mul;
        static BN_PAIRING: bn128::Bn128Pairing = bn128::Bn128Pairing;
        static BLAKE2F: blake2f::Blake2F = blake2f::Blake2F;

        Some(match index {
            1 => &ECRECOVER,
            2 => &SHA256,
            3 => &RIPEMD160,
            4 => &IDENTITY,
            5 => &MODEXP,
            6 => &BN_ADD,
            7 => &BN_MUL,
            8 => &BN_PAIRING,
            9 => &BLAKE2F,
            _ => return None,
        })
    }
}

impl PrecompileProvider for BasePrecompiles {
    fn can_handle(&self, address: &Address) -> bool {
        low_index(address).and_then(Self::lookup).is_some()
    }

    fn gas_cost(&self, address: &Address, input: &[u8]) -> u64 {
        low_index(address)
            .and_then(Self::lookup)
            .map_or(0, |p| p.gas_cost(input))
    }

    fn execute(&self, address: &Address, input: &[u8]) -> Result<Bytes, PrecompileError> {
        match low_index(address).and_then(Self::lookup) {
            Some(p) => p.run(input),
            None => Ok(Bytes::new()),
        }
    }
}

// =============================================================================
// COMPOSITION
// =============================================================================

/// Ordered composition of providers; the first that handles an address wins.
#[derive(Default)]
pub struct PrecompileSet {
    providers: Vec<Box<dyn PrecompileProvider>>,
}

impl PrecompileSet {
    /// An empty set (no address is a precompile).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The base range 1..=9.
    #[must_use]
    pub fn base() -> Self {
        let mut set = Self::empty();
        set.register(Box::new(BasePrecompiles));
        set
    }

    /// Appends another provider (e.g. a later hard fork's range).
    pub fn register(&mut self, provider: Box<dyn PrecompileProvider>) {
        self.providers.push(provider);
    }

    fn resolve(&self, address: &Address) -> Option<&dyn PrecompileProvider> {
        self.providers
            .iter()
            .map(AsRef::as_ref)
            .find(|p| p.can_handle(address))
    }
}

impl PrecompileProvider for PrecompileSet {
    fn can_handle(&self, address: &Address) -> bool {
        self.resolve(address).is_some()
    }

    fn gas_cost(&self, address: &Address, input: &[u8]) -> u64 {
        self.resolve(address).map_or(0, |p| p.gas_cost(address, input))
    }

    fn execute(&self, address: &Address, input: &[u8]) -> Result<Bytes, PrecompileError> {
        match self.resolve(address) {
            Some(p) => p.execute(address, input),
            None => Ok(Bytes::new()),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_set_covers_one_through_nine() {
        let set = PrecompileSet::base();
        for n in 1..=9u64 {
            assert!(set.can_handle(&Address::from_low_u64(n)), "address {n}");
        }
        assert!(!set.can_handle(&Address::from_low_u64(0)));
        assert!(!set.can_handle(&Address::from_low_u64(10)));
        // High bytes set: not a precompile even if the low byte matches.
        assert!(!set.can_handle(&Address::new([1u8; 20])));
    }

    #[test]
    fn identity_through_the_set() {
        let set = PrecompileSet::base();
        let addr = Address::from_low_u64(4);
        let out = set.execute(&addr, b"echo").unwrap();
        assert_eq!(out.as_slice(), b"echo");
    }

    #[test]
    fn later_providers_extend_the_range() {
        struct Ten;
        impl PrecompileProvider for Ten {
            fn can_handle(&self, address: &Address) -> bool {
                *address == Address::from_low_u64(10)
            }
            fn gas_cost(&self, _address: &Address, _input: &[u8]) -> u64 {
                1
            }
            fn execute(&self, _address: &Address, _input: &[u8]) -> Result<Bytes, PrecompileError> {
                Ok(Bytes::from_slice(&[0xaa]))
            }
        }

        let mut set = PrecompileSet::base();
        set.register(Box::new(Ten));
        assert!(set.can_handle(&Address::from_low_u64(10)));
        assert!(set.can_handle(&Address::from_low_u64(1)));
        assert_eq!(
            set.execute(&Address::from_low_u64(10), &[]).unwrap().as_slice(),
            &[0xaa]
        );
    }
}
