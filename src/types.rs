//! Core types and data structures

use num_bigint::BigUint;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{KryptosError, Result};

/// How the ephemeral exponent `k` is drawn when encrypting with ElGamal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NoncePolicy {
    /// `k` uniform in `[2, 10]`; nine possible nonces
    #[default]
    Reference,
    /// `k` uniform in `[2, p - 2]`
    FullRange,
}

impl fmt::Display for NoncePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoncePolicy::Reference => write!(f, "Reference"),
            NoncePolicy::FullRange => write!(f, "FullRange"),
        }
    }
}

/// ElGamal ciphertext (s, t) with s = g^k and t = m * c^k mod p
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ciphertext {
    pub(crate) s: BigUint,
    pub(crate) t: BigUint,
}

impl Ciphertext {
    /// Create a new ciphertext
    pub fn new(s: BigUint, t: BigUint) -> Self {
        Ciphertext { s, t }
    }

    /// Get the first component (g^k mod p)
    pub fn s(&self) -> &BigUint {
        &self.s
    }

    /// Get the second component (m * c^k mod p)
    pub fn t(&self) -> &BigUint {
        &self.t
    }
}

impl fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ciphertext(s: {:X}, t: {:X})", self.s, self.t)
    }
}

/// ElGamal signature pair (r, s)
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Signature {
    pub(crate) r: BigUint,
    pub(crate) s: BigUint,
}

impl Signature {
    pub fn new(r: BigUint, s: BigUint) -> Self {
        Signature { r, s }
    }

    pub fn r(&self) -> &BigUint {
        &self.r
    }

    pub fn s(&self) -> &BigUint {
        &self.s
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(r: {:X}, s: {:X})", self.r, self.s)
    }
}

/// Configuration for key generation and the probabilistic searches
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KryptosConfig {
    /// Number of Miller-Rabin bases tried per candidate
    pub miller_rabin_rounds: usize,
    /// Bit length of each RSA prime factor
    pub rsa_prime_bits: u64,
    /// Bit length of q in the safe prime p = 2q + 1
    pub safe_prime_bits: u64,
    /// Upper bound on rejection-sampling draws for a prime
    pub max_prime_attempts: u64,
    /// Upper bound on linear or random searches (exponent, generator, nonce)
    pub max_search_attempts: u64,
    /// ElGamal encryption nonce policy
    pub nonce_policy: NoncePolicy,
}

impl Default for KryptosConfig {
    fn default() -> Self {
        KryptosConfig {
            miller_rabin_rounds: 10,
            rsa_prime_bits: 128,
            safe_prime_bits: 255,
            max_prime_attempts: 100_000,
            max_search_attempts: 1_000_000,
            nonce_policy: NoncePolicy::Reference,
        }
    }
}

impl KryptosConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.miller_rabin_rounds == 0 {
            return Err(KryptosError::InvalidParameter(
                "Miller-Rabin rounds must be at least 1".to_string(),
            ));
        }
        if self.rsa_prime_bits < 2 {
            return Err(KryptosError::InvalidKeySize(self.rsa_prime_bits));
        }
        if self.safe_prime_bits < 2 {
            return Err(KryptosError::InvalidKeySize(self.safe_prime_bits));
        }
        if self.max_prime_attempts == 0 || self.max_search_attempts == 0 {
            return Err(KryptosError::InvalidParameter(
                "Attempt bounds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
