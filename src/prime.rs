//! Primality testing, prime synthesis and safe-prime group setup

use std::collections::HashSet;

use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, ToPrimitive};
use rand::Rng;
use tracing::{debug, trace};

use crate::arith::mod_pow;
use crate::error::{KryptosError, Result};
use crate::types::KryptosConfig;

/// Single-base Miller-Rabin test.
///
/// Returns `true` when `base` is a witness for the compositeness of `n`,
/// `false` when `n` is a strong pseudoprime to `base`. Requires `n >= 2`;
/// for `n > 3` the base must lie in `[2, n - 1]`.
pub fn miller_rabin_witness(n: &BigUint, base: &BigUint) -> Result<bool> {
    let two = BigUint::from(2u32);
    if *n < two {
        return Err(KryptosError::InvalidParameter(format!(
            "Miller-Rabin requires n >= 2, got {}",
            n
        )));
    }
    if *n <= BigUint::from(3u32) {
        return Ok(false);
    }

    let n_minus_1 = n - BigUint::one();
    if *base < two || *base > n_minus_1 {
        return Err(KryptosError::InvalidParameter(format!(
            "Miller-Rabin base must be in [2, {}], got {}",
            n_minus_1, base
        )));
    }

    let (k, q) = factor_powers_of_two(&n_minus_1);

    let mut t = mod_pow(base, &q, n)?;
    if t.is_one() || t == n_minus_1 {
        return Ok(false);
    }

    for _ in 1..k {
        t = &t * &t % n;
        if t == n_minus_1 {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Multi-base Miller-Rabin test with `rounds` distinct random bases in `[2, n - 1]`.
///
/// Returns `false` as soon as one base proves `n` composite. When `n` has
/// fewer than `rounds` candidate bases, every available base is tried.
pub fn miller_rabin_test<R: Rng + ?Sized>(n: &BigUint, rounds: usize, rng: &mut R) -> Result<bool> {
    let two = BigUint::from(2u32);
    let three = BigUint::from(3u32);

    if rounds == 0 {
        return Err(KryptosError::InvalidParameter(
            "Miller-Rabin needs at least one round".to_string(),
        ));
    }
    if *n < two {
        return Err(KryptosError::InvalidParameter(format!(
            "Miller-Rabin requires n >= 2, got {}",
            n
        )));
    }
    if *n == two || *n == three {
        return Ok(true);
    }
    if n.is_even() {
        return Ok(false);
    }

    let available = n - &two;
    let rounds = match available.to_usize() {
        Some(available) if available < rounds => available,
        _ => rounds,
    };

    let mut used_bases = HashSet::with_capacity(rounds);
    while used_bases.len() < rounds {
        let base = rng.gen_biguint_range(&two, n);
        if used_bases.contains(&base) {
            continue;
        }
        if miller_rabin_witness(n, &base)? {
            trace!(bases_tried = used_bases.len() + 1, "composite witness found");
            return Ok(false);
        }
        used_bases.insert(base);
    }

    Ok(true)
}

/// Factor out powers of 2 from n, returning (k, q) with n = 2^k * q, q odd.
///
/// `n` must be non-zero.
pub fn factor_powers_of_two(n: &BigUint) -> (u64, BigUint) {
    let mut k = 0;
    let mut q = n.clone();

    while q.is_even() {
        q >>= 1;
        k += 1;
    }

    (k, q)
}

/// Random odd integer with exactly `bits` bits
fn random_candidate<R: Rng + ?Sized>(bits: u64, rng: &mut R) -> BigUint {
    let mut candidate = rng.gen_biguint(bits);
    candidate |= BigUint::one() << (bits - 1);
    candidate |= BigUint::one();
    candidate
}

/// Generate a probable prime of exactly `bits` bits by rejection sampling.
///
/// Gives up with [`KryptosError::SearchExhausted`] after
/// `config.max_prime_attempts` candidates.
pub fn generate_prime<R: Rng + ?Sized>(
    bits: u64,
    config: &KryptosConfig,
    rng: &mut R,
) -> Result<BigUint> {
    if bits < 2 {
        return Err(KryptosError::InvalidKeySize(bits));
    }
    config.validate()?;

    for attempt in 1..=config.max_prime_attempts {
        let candidate = random_candidate(bits, rng);
        if miller_rabin_test(&candidate, config.miller_rabin_rounds, rng)? {
            debug!(bits, attempts = attempt, "found probable prime");
            return Ok(candidate);
        }
    }

    Err(KryptosError::SearchExhausted {
        what: "prime",
        attempts: config.max_prime_attempts,
    })
}

/// Safe-prime group: p = 2q + 1 with p and q prime, and a generator g
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupParams {
    pub(crate) p: BigUint,
    pub(crate) q: BigUint,
    pub(crate) g: BigUint,
}

impl GroupParams {
    /// Get the safe prime modulus p
    pub fn p(&self) -> &BigUint {
        &self.p
    }

    /// Get the Sophie Germain prime q = (p - 1) / 2
    pub fn q(&self) -> &BigUint {
        &self.q
    }

    /// Get the generator g
    pub fn g(&self) -> &BigUint {
        &self.g
    }
}

/// Generate a safe prime p = 2q + 1, with `q` of `q_bits` bits, and a generator.
///
/// Candidates for q are resampled until both q and p test probably prime,
/// bounded by `config.max_prime_attempts` draws.
pub fn generate_safe_prime_and_generator<R: Rng + ?Sized>(
    q_bits: u64,
    config: &KryptosConfig,
    rng: &mut R,
) -> Result<GroupParams> {
    if q_bits < 2 {
        return Err(KryptosError::InvalidKeySize(q_bits));
    }
    config.validate()?;

    for attempt in 1..=config.max_prime_attempts {
        let q = random_candidate(q_bits, rng);
        if !miller_rabin_test(&q, config.miller_rabin_rounds, rng)? {
            continue;
        }

        let p = &q * 2u32 + 1u32;
        if !miller_rabin_test(&p, config.miller_rabin_rounds, rng)? {
            continue;
        }

        let g = find_generator(&p, &q, config.max_search_attempts)?;
        debug!(q_bits, attempts = attempt, %g, "found safe prime and generator");
        return Ok(GroupParams { p, q, g });
    }

    Err(KryptosError::SearchExhausted {
        what: "safe prime",
        attempts: config.max_prime_attempts,
    })
}

/// Smallest g >= 2 with g^q mod p != 1.
///
/// For a safe prime p = 2q + 1 this selects an element whose order is not
/// q, i.e. a generator of the full group of order p - 1.
pub fn find_generator(p: &BigUint, q: &BigUint, max_attempts: u64) -> Result<BigUint> {
    let mut g = BigUint::from(2u32);

    for _ in 0..max_attempts {
        if g >= *p {
            break;
        }
        if !mod_pow(&g, q, p)?.is_one() {
            return Ok(g);
        }
        g += 1u32;
    }

    Err(KryptosError::SearchExhausted {
        what: "generator",
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn big(v: u64) -> BigUint {
        BigUint::from(v)
    }

    // Every draw is zero: candidates are 2^(bits-1) + 1 and bases are 2
    fn zero_rng() -> StepRng {
        StepRng::new(0, 0)
    }

    fn test_config() -> KryptosConfig {
        KryptosConfig {
            miller_rabin_rounds: 20,
            ..Default::default()
        }
    }

    #[test]
    fn test_known_primes() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            for p in [2u64, 3, 5, 7, 11, 13, 97, 7919, 65537] {
                assert!(miller_rabin_test(&big(p), 10, &mut rng).unwrap(), "{}", p);
            }
        }
    }

    #[test]
    fn test_known_composites() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            for n in [4u64, 9, 15, 21, 100, 561, 1105, 7917] {
                assert!(!miller_rabin_test(&big(n), 10, &mut rng).unwrap(), "{}", n);
            }
        }
    }

    #[test]
    fn test_rejects_tiny_input() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(miller_rabin_test(&big(0), 10, &mut rng).is_err());
        assert!(miller_rabin_test(&big(1), 10, &mut rng).is_err());
        assert!(miller_rabin_witness(&big(1), &big(2)).is_err());
    }

    #[test]
    fn test_witness() {
        // 2 is a witness for the Carmichael number 561
        assert!(miller_rabin_witness(&big(561), &big(2)).unwrap());
        // No base is a witness for a prime
        for base in 2..97u64 {
            assert!(!miller_rabin_witness(&big(97), &big(base)).unwrap());
        }
        // 2047 = 23 * 89 is a strong pseudoprime to base 2
        assert!(!miller_rabin_witness(&big(2047), &big(2)).unwrap());
        assert!(miller_rabin_witness(&big(2047), &big(3)).unwrap());
    }

    #[test]
    fn test_factor_powers_of_two() {
        assert_eq!(factor_powers_of_two(&big(96)), (5, big(3)));
        assert_eq!(factor_powers_of_two(&big(7)), (0, big(7)));
        assert_eq!(factor_powers_of_two(&big(560)), (4, big(35)));
    }

    #[test]
    fn test_generate_prime() {
        let mut rng = StdRng::seed_from_u64(42);
        let config = test_config();

        for bits in [2u64, 8, 32, 64, 128] {
            let p = generate_prime(bits, &config, &mut rng).unwrap();
            assert_eq!(p.bits(), bits);
            assert!(miller_rabin_test(&p, 20, &mut rng).unwrap());
        }
    }

    #[test]
    fn test_generate_prime_rejects_bad_bit_length() {
        let mut rng = StdRng::seed_from_u64(42);
        let config = test_config();
        assert_eq!(
            generate_prime(0, &config, &mut rng),
            Err(KryptosError::InvalidKeySize(0))
        );
        assert!(generate_prime(1, &config, &mut rng).is_err());
        assert!(generate_safe_prime_and_generator(1, &config, &mut rng).is_err());
    }

    #[test]
    fn test_safe_prime_and_generator() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = test_config();
        let group = generate_safe_prime_and_generator(48, &config, &mut rng).unwrap();

        assert_eq!(group.p, &group.q * 2u32 + 1u32);
        assert_eq!(group.q.bits(), 48);
        assert!(miller_rabin_test(&group.p, 20, &mut rng).unwrap());
        assert!(miller_rabin_test(&group.q, 20, &mut rng).unwrap());

        assert!(group.g > BigUint::one() && group.g < group.p);
        assert!(!mod_pow(&group.g, &group.q, &group.p).unwrap().is_one());
        assert!(!mod_pow(&group.g, &big(2), &group.p).unwrap().is_one());
    }

    #[test]
    fn test_find_generator() {
        // 2^3 = 1 mod 7, so 3 is the first candidate accepted
        assert_eq!(find_generator(&big(7), &big(3), 100).unwrap(), big(3));
        assert_eq!(find_generator(&big(23), &big(11), 100).unwrap(), big(5));
        assert!(matches!(
            find_generator(&big(7), &big(3), 1),
            Err(KryptosError::SearchExhausted { what: "generator", .. })
        ));
    }

    #[test]
    fn test_witness_small_primes_and_base_range() {
        assert!(!miller_rabin_witness(&big(2), &big(2)).unwrap());
        assert!(!miller_rabin_witness(&big(3), &big(2)).unwrap());

        for base in [0u64, 1, 7, 8] {
            assert!(matches!(
                miller_rabin_witness(&big(7), &big(base)),
                Err(KryptosError::InvalidParameter(_))
            ));
        }
        assert!(!miller_rabin_witness(&big(7), &big(6)).unwrap());
    }

    #[test]
    fn test_zero_rounds_rejected() {
        let mut rng = StdRng::seed_from_u64(13);
        assert!(matches!(
            miller_rabin_test(&big(9), 0, &mut rng),
            Err(KryptosError::InvalidParameter(_))
        ));

        let config = KryptosConfig {
            miller_rabin_rounds: 0,
            ..Default::default()
        };
        assert!(generate_prime(16, &config, &mut rng).is_err());
        assert!(generate_safe_prime_and_generator(16, &config, &mut rng).is_err());
    }

    #[test]
    fn test_prime_search_exhausted() {
        let config = KryptosConfig {
            max_prime_attempts: 1,
            ..Default::default()
        };
        // 33 = 3 * 11
        assert_eq!(
            generate_prime(6, &config, &mut zero_rng()),
            Err(KryptosError::SearchExhausted {
                what: "prime",
                attempts: 1
            })
        );
        assert_eq!(
            generate_safe_prime_and_generator(6, &config, &mut zero_rng()),
            Err(KryptosError::SearchExhausted {
                what: "safe prime",
                attempts: 1
            })
        );
    }
}
