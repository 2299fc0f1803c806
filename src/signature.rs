//! ElGamal signatures over a safe-prime group
//!
//! Signing computes r = g^k mod p and s = k^-1 (h - a r) mod (p - 1) for a
//! nonce k coprime to p - 1. Verification accepts when
//! v^r * r^s ≡ g^h (mod p).

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::Rng;
use tracing::{debug, trace};

use crate::arith::{gcd, mod_inverse, mod_pow};
use crate::digest::MessageDigest;
use crate::error::{KryptosError, Result};
use crate::keys::{PrivateKey, PublicKey};
use crate::types::{KryptosConfig, Signature};

/// Sign an integer digest with the private exponent a.
///
/// Draws k uniformly from [2, p - 2] until gcd(k, p - 1) = 1, bounded by
/// `config.max_search_attempts`.
pub fn sign<R: Rng + ?Sized>(
    digest: &BigUint,
    private_key: &PrivateKey,
    config: &KryptosConfig,
    rng: &mut R,
) -> Result<Signature> {
    let p = &private_key.p;
    if *p < BigUint::from(5u32) {
        return Err(KryptosError::InvalidParameter(
            "Modulus p must be at least 5".to_string(),
        ));
    }

    let order = p - 1u32;
    let low = BigUint::from(2u32);

    for attempt in 1..=config.max_search_attempts {
        let k = rng.gen_biguint_range(&low, &order);
        if gcd(&k, &order).is_one() {
            trace!(attempts = attempt, "found signing nonce");
            return sign_with_nonce(digest, private_key, &k);
        }
    }

    Err(KryptosError::SearchExhausted {
        what: "signing nonce",
        attempts: config.max_search_attempts,
    })
}

/// Sign with a caller-chosen nonce k; k must be invertible modulo p - 1
pub fn sign_with_nonce(
    digest: &BigUint,
    private_key: &PrivateKey,
    k: &BigUint,
) -> Result<Signature> {
    let p = &private_key.p;
    let order = p - 1u32;
    if order.is_zero() {
        return Err(KryptosError::InvalidParameter(
            "Modulus p must be > 1".to_string(),
        ));
    }

    let k_inv = mod_inverse(k, &order)?;
    let r = mod_pow(&private_key.g, k, p)?;

    // h - a*r taken modulo p - 1 without leaving the unsigned domain
    let h = digest % &order;
    let ar = &private_key.d * &r % &order;
    let difference = (h + &order - ar) % &order;
    let s = k_inv * difference % &order;

    debug!(r_bits = r.bits(), "signed digest");
    Ok(Signature::new(r, s))
}

/// Verify a signature against an integer digest and the verifying key (p, g, v)
pub fn verify(digest: &BigUint, signature: &Signature, public_key: &PublicKey) -> bool {
    let p = &public_key.p;
    if signature.r.is_zero() || signature.r >= *p {
        return false;
    }

    let check = || -> Result<bool> {
        let u1 = mod_pow(&public_key.c, &signature.r, p)?
            * mod_pow(&signature.r, &signature.s, p)?
            % p;
        let u2 = mod_pow(&public_key.g, digest, p)?;
        Ok(u1 == u2)
    };

    check().unwrap_or(false)
}

/// Digest `content` and sign it
pub fn sign_content<D: MessageDigest, R: Rng + ?Sized>(
    content: &[u8],
    digester: &D,
    private_key: &PrivateKey,
    config: &KryptosConfig,
    rng: &mut R,
) -> Result<Signature> {
    sign(&digester.digest(content), private_key, config, rng)
}

/// Digest `content` and verify the signature over it
pub fn verify_content<D: MessageDigest>(
    content: &[u8],
    digester: &D,
    signature: &Signature,
    public_key: &PublicKey,
) -> bool {
    verify(&digester.digest(content), signature, public_key)
}
