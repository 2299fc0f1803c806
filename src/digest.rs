//! Message digests feeding the signature scheme

use num_bigint::BigUint;
use sha2::{Digest, Sha224};

/// Deterministic map from arbitrary content to a fixed-width non-negative integer
pub trait MessageDigest {
    /// Digest `content` into an integer of at most [`MessageDigest::bits`] bits
    fn digest(&self, content: &[u8]) -> BigUint;

    /// Width of the digest in bits
    fn bits(&self) -> u64;
}

/// SHA-224, read as a big-endian integer
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha224Digest;

impl MessageDigest for Sha224Digest {
    fn digest(&self, content: &[u8]) -> BigUint {
        BigUint::from_bytes_be(&Sha224::digest(content))
    }

    fn bits(&self) -> u64 {
        224
    }
}
