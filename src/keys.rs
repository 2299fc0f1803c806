//! ElGamal key generation and management
//!
//! The same key material serves encryption (public `c`, secret `d`) and
//! signatures (verifying `v`, signing `a`).

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::Rng;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::arith::mod_pow;
use crate::error::{KryptosError, Result};
use crate::prime::{generate_safe_prime_and_generator, GroupParams};
use crate::types::KryptosConfig;

/// Check the group parameters shared by both halves of a key
fn validate_group(p: &BigUint, g: &BigUint) -> Result<()> {
    if *p <= BigUint::from(2u32) {
        return Err(KryptosError::InvalidParameter(
            "Modulus p must be > 2".to_string(),
        ));
    }

    if *g <= BigUint::one() || g >= p {
        return Err(KryptosError::InvalidParameter(
            "Generator g must be in range (1, p)".to_string(),
        ));
    }

    Ok(())
}

/// ElGamal public key (p, g, c) with c = g^d mod p
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PublicKey {
    pub(crate) p: BigUint, // Safe prime modulus
    pub(crate) g: BigUint, // Generator
    pub(crate) c: BigUint, // g^d mod p
}

impl PublicKey {
    /// Create a public key, validating its components
    pub fn new(p: BigUint, g: BigUint, c: BigUint) -> Result<Self> {
        let key = PublicKey { p, g, c };
        key.validate()?;
        Ok(key)
    }

    /// Get the prime modulus
    pub fn modulus(&self) -> &BigUint {
        &self.p
    }

    /// Get the generator
    pub fn generator(&self) -> &BigUint {
        &self.g
    }

    /// Get the public component (g^d mod p)
    pub fn public_component(&self) -> &BigUint {
        &self.c
    }

    /// Get the bit size of the modulus
    pub fn bit_size(&self) -> u64 {
        self.p.bits()
    }

    /// Validate the public key
    pub fn validate(&self) -> Result<()> {
        validate_group(&self.p, &self.g)?;

        if self.c.is_zero() || self.c >= self.p {
            return Err(KryptosError::InvalidParameter(
                "Public component c must be in range [1, p)".to_string(),
            ));
        }

        Ok(())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({} bits)", self.bit_size())
    }
}

/// ElGamal private key (p, g, d)
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PrivateKey {
    pub(crate) p: BigUint,
    pub(crate) g: BigUint,
    pub(crate) d: BigUint, // Secret exponent
}

impl PrivateKey {
    /// Create a private key, validating its components
    pub fn new(p: BigUint, g: BigUint, d: BigUint) -> Result<Self> {
        validate_group(&p, &g)?;

        if d.is_zero() || d >= p {
            return Err(KryptosError::InvalidParameter(
                "Secret exponent d must be in range [1, p)".to_string(),
            ));
        }

        Ok(PrivateKey { p, g, d })
    }

    /// Get the prime modulus
    pub fn modulus(&self) -> &BigUint {
        &self.p
    }

    /// Get the generator
    pub fn generator(&self) -> &BigUint {
        &self.g
    }

    /// Get the secret exponent
    pub fn secret_exponent(&self) -> &BigUint {
        &self.d
    }

    /// Recompute the matching public key
    pub fn public_key(&self) -> Result<PublicKey> {
        let c = mod_pow(&self.g, &self.d, &self.p)?;
        PublicKey::new(self.p.clone(), self.g.clone(), c)
    }
}

impl fmt::Display for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey(***)")
    }
}

/// ElGamal key pair
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyPair {
    pub public_key: PublicKey,
    pub private_key: PrivateKey,
}

impl KeyPair {
    /// Generate a fresh safe-prime group and a key pair in it.
    ///
    /// The group uses `config.safe_prime_bits` for q, so p has one more bit.
    ///
    /// # Example
    ///
    /// ```rust
    /// use kryptos::{KeyPair, KryptosConfig};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let config = KryptosConfig { safe_prime_bits: 64, ..Default::default() };
    /// let mut rng = StdRng::seed_from_u64(1);
    /// let keypair = KeyPair::generate(&config, &mut rng).expect("Failed to generate keys");
    /// assert_eq!(keypair.bit_size(), 65);
    /// ```
    pub fn generate<R: Rng + ?Sized>(config: &KryptosConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let group = generate_safe_prime_and_generator(config.safe_prime_bits, config, rng)?;
        Self::from_group(&group, rng)
    }

    /// Derive a key pair in an existing group.
    ///
    /// The secret exponent d is drawn uniformly from [2, p - 2].
    pub fn from_group<R: Rng + ?Sized>(group: &GroupParams, rng: &mut R) -> Result<Self> {
        let p = group.p();
        if *p < BigUint::from(5u32) {
            return Err(KryptosError::InvalidParameter(
                "Modulus p must be at least 5".to_string(),
            ));
        }

        let d = rng.gen_biguint_range(&BigUint::from(2u32), &(p - 1u32));
        Self::from_components(p.clone(), group.g().clone(), d)
    }

    /// Create a key pair from existing components
    pub fn from_components(p: BigUint, g: BigUint, d: BigUint) -> Result<Self> {
        let private_key = PrivateKey::new(p, g, d)?;
        let public_key = private_key.public_key()?;

        Ok(KeyPair {
            public_key,
            private_key,
        })
    }

    /// Get the bit size of the keys
    pub fn bit_size(&self) -> u64 {
        self.public_key.bit_size()
    }
}

impl fmt::Display for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPair({} bits)", self.bit_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn big(v: u64) -> BigUint {
        BigUint::from(v)
    }

    #[test]
    fn test_key_generation() {
        let config = KryptosConfig {
            safe_prime_bits: 64,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        let keypair = KeyPair::generate(&config, &mut rng).unwrap();

        assert_eq!(keypair.bit_size(), 65);
        keypair.public_key.validate().unwrap();

        let d = keypair.private_key.secret_exponent();
        let p = keypair.public_key.modulus();
        assert!(*d >= big(2) && *d <= p - 2u32);
        assert_eq!(
            keypair.public_key.public_component(),
            &mod_pow(keypair.public_key.generator(), d, p).unwrap()
        );
    }

    #[test]
    fn test_key_validation() {
        assert!(PublicKey::new(big(23), big(5), big(10)).is_ok());
        assert!(PublicKey::new(big(2), big(1), big(1)).is_err());
        assert!(PublicKey::new(big(23), big(23), big(10)).is_err());
        assert!(PublicKey::new(big(23), big(5), big(0)).is_err());
        assert!(PrivateKey::new(big(23), big(5), big(0)).is_err());
        assert!(PrivateKey::new(big(23), big(5), big(23)).is_err());
    }

    #[test]
    fn test_from_components() {
        let keypair = KeyPair::from_components(big(23), big(5), big(6)).unwrap();
        // 5^6 mod 23 = 15625 mod 23 = 8
        assert_eq!(keypair.public_key.public_component(), &big(8));
        assert_eq!(format!("{}", keypair.private_key), "PrivateKey(***)");
    }

    #[test]
    fn test_from_group_rejects_tiny_modulus() {
        let group = GroupParams {
            p: big(3),
            q: big(1),
            g: big(2),
        };
        let mut rng = StdRng::seed_from_u64(5);
        assert!(KeyPair::from_group(&group, &mut rng).is_err());
    }
}
