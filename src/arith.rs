//! Modular arithmetic kernel: exponentiation, gcd and modular inverses

use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Zero};

use crate::error::{KryptosError, Result};

/// Modular exponentiation: base^exponent mod modulus
///
/// Square-and-multiply over the exponent bits from least to most
/// significant. Fails on a zero modulus.
pub fn mod_pow(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> Result<BigUint> {
    if modulus.is_zero() {
        return Err(KryptosError::InvalidParameter(
            "Modulus must be positive".to_string(),
        ));
    }

    let mut result = BigUint::one() % modulus;
    let mut base = base % modulus;
    let mut exp = exponent.clone();

    while !exp.is_zero() {
        if exp.is_odd() {
            result = &result * &base % modulus;
        }
        exp >>= 1;
        base = &base * &base % modulus;
    }

    Ok(result)
}

/// Greatest common divisor, recursive Euclid with gcd(a, 0) = a
pub fn gcd(a: &BigUint, b: &BigUint) -> BigUint {
    if b.is_zero() {
        a.clone()
    } else {
        gcd(b, &(a % b))
    }
}

/// Iterative extended Euclidean algorithm.
///
/// Returns the final remainder `g = gcd(b, n)` together with the Bézout
/// coefficient `x0` such that `b * x0 ≡ g (mod n)`. The coefficient is only
/// an inverse of `b` when `g == 1`; use [`mod_inverse`] unless the raw pair
/// is needed.
pub fn extended_euclid(b: &BigUint, n: &BigUint) -> (BigUint, BigInt) {
    // (r0, r1, x0, x1)
    let mut state = (
        BigInt::from(b.clone()),
        BigInt::from(n.clone()),
        BigInt::one(),
        BigInt::zero(),
    );

    while !state.1.is_zero() {
        let (r0, r1, x0, x1) = state;
        let q = &r0 / &r1;
        let r2 = &r0 - &q * &r1;
        let x2 = &x0 - &q * &x1;
        state = (r1, r2, x1, x2);
    }

    let (g, _, x0, _) = state;
    (g.into_parts().1, x0)
}

/// Modular inverse of `b` modulo `n`, reduced into `[0, n)`.
///
/// Returns [`KryptosError::NotInvertible`] when `gcd(b, n) != 1`.
pub fn mod_inverse(b: &BigUint, n: &BigUint) -> Result<BigUint> {
    if n.is_zero() {
        return Err(KryptosError::InvalidParameter(
            "Modulus must be positive".to_string(),
        ));
    }

    let (g, x0) = extended_euclid(b, n);
    if !g.is_one() {
        return Err(KryptosError::NotInvertible);
    }

    let n = BigInt::from(n.clone());
    Ok(x0.mod_floor(&n).into_parts().1)
}

/// Whether `b` has an inverse modulo `n`, i.e. gcd(b, n) = 1
pub fn has_inverse(b: &BigUint, n: &BigUint) -> bool {
    extended_euclid(b, n).0.is_one()
}
