//! RSA key derivation and single-block encryption

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive};
use rand::Rng;
use std::fmt;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::arith::{has_inverse, mod_inverse, mod_pow};
use crate::error::{KryptosError, Result};
use crate::prime::generate_prime;
use crate::types::KryptosConfig;

/// RSA public key (n, e)
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RsaPublicKey {
    pub(crate) n: BigUint,
    pub(crate) e: BigUint,
}

impl RsaPublicKey {
    pub fn new(n: BigUint, e: BigUint) -> Result<Self> {
        if n <= BigUint::one() {
            return Err(KryptosError::InvalidParameter(
                "Modulus n must be > 1".to_string(),
            ));
        }
        Ok(RsaPublicKey { n, e })
    }

    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    pub fn exponent(&self) -> &BigUint {
        &self.e
    }

    /// c = m^e mod n, for 0 <= m < n
    pub fn encrypt_block(&self, plaintext: &BigUint) -> Result<BigUint> {
        if plaintext >= &self.n {
            return Err(KryptosError::PlaintextTooLarge);
        }
        mod_pow(plaintext, &self.e, &self.n)
    }

    /// Encrypt a byte stream, one byte per block
    pub fn encrypt_bytes(&self, data: &[u8]) -> Result<Vec<BigUint>> {
        data.iter()
            .map(|&byte| self.encrypt_block(&BigUint::from(byte)))
            .collect()
    }
}

/// RSA private key (n, d)
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RsaPrivateKey {
    pub(crate) n: BigUint,
    pub(crate) d: BigUint,
}

impl RsaPrivateKey {
    pub fn new(n: BigUint, d: BigUint) -> Result<Self> {
        if n <= BigUint::one() {
            return Err(KryptosError::InvalidParameter(
                "Modulus n must be > 1".to_string(),
            ));
        }
        Ok(RsaPrivateKey { n, d })
    }

    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    pub fn exponent(&self) -> &BigUint {
        &self.d
    }

    /// m = c^d mod n
    pub fn decrypt_block(&self, ciphertext: &BigUint) -> Result<BigUint> {
        if ciphertext >= &self.n {
            return Err(KryptosError::InvalidCiphertext);
        }
        mod_pow(ciphertext, &self.d, &self.n)
    }

    /// Decrypt blocks produced by [`RsaPublicKey::encrypt_bytes`]
    pub fn decrypt_bytes(&self, blocks: &[BigUint]) -> Result<Vec<u8>> {
        blocks
            .iter()
            .map(|block| {
                self.decrypt_block(block)?
                    .to_u8()
                    .ok_or(KryptosError::InvalidCiphertext)
            })
            .collect()
    }
}

impl fmt::Display for RsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RsaPrivateKey(***)")
    }
}

/// RSA key pair (n, e, d) with e * d ≡ 1 (mod φ(n))
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RsaKeyPair {
    pub public_key: RsaPublicKey,
    pub private_key: RsaPrivateKey,
}

impl RsaKeyPair {
    /// Derive keys from two distinct primes p and q.
    ///
    /// e is the smallest integer >= 2 coprime to φ(n) = (p - 1)(q - 1); the
    /// search is bounded by `config.max_search_attempts`. Primality of the
    /// inputs is the caller's responsibility.
    pub fn derive(p: &BigUint, q: &BigUint, config: &KryptosConfig) -> Result<Self> {
        let two = BigUint::from(2u32);
        if *p < two || *q < two {
            return Err(KryptosError::InvalidParameter(
                "RSA factors must be primes >= 2".to_string(),
            ));
        }
        if p == q {
            return Err(KryptosError::InvalidParameter(
                "RSA factors must be distinct".to_string(),
            ));
        }

        let n = p * q;
        let phi = (p - 1u32) * (q - 1u32);

        let mut e = two;
        let mut attempts = 0u64;
        while !has_inverse(&e, &phi) {
            attempts += 1;
            if attempts >= config.max_search_attempts {
                return Err(KryptosError::SearchExhausted {
                    what: "public exponent",
                    attempts,
                });
            }
            e += 1u32;
        }

        let d = mod_inverse(&e, &phi)?;
        debug!(%e, n_bits = n.bits(), "derived RSA keys");

        Ok(RsaKeyPair {
            public_key: RsaPublicKey { n: n.clone(), e },
            private_key: RsaPrivateKey { n, d },
        })
    }

    /// Generate two distinct `config.rsa_prime_bits`-bit primes and derive keys
    pub fn generate<R: Rng + ?Sized>(config: &KryptosConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let p = generate_prime(config.rsa_prime_bits, config, rng)?;

        for _ in 0..config.max_prime_attempts {
            let q = generate_prime(config.rsa_prime_bits, config, rng)?;
            if q != p {
                return Self::derive(&p, &q, config);
            }
        }

        Err(KryptosError::SearchExhausted {
            what: "distinct prime",
            attempts: config.max_prime_attempts,
        })
    }

    pub fn n(&self) -> &BigUint {
        &self.public_key.n
    }

    pub fn e(&self) -> &BigUint {
        &self.public_key.e
    }

    pub fn d(&self) -> &BigUint {
        &self.private_key.d
    }
}

/// Derive (n, e, d) from two distinct primes with the default search bound
pub fn derive_rsa_keys(p: &BigUint, q: &BigUint) -> Result<RsaKeyPair> {
    RsaKeyPair::derive(p, q, &KryptosConfig::default())
}
