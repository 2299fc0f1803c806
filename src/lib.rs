//! # Kryptos
//!
//! Number-theoretic public-key toolkit built on a small modular-arithmetic
//! kernel:
//! - RSA key derivation and per-block encryption
//! - ElGamal encryption over a safe-prime group
//! - ElGamal signatures over integer message digests
//!
//! Every generating operation takes its random source as an argument, so a
//! seeded RNG gives reproducible keys. None of the schemes pad or randomize
//! plaintexts; they are not semantically secure.
//!
//! ## Example
//!
//! ```rust
//! use kryptos::{KeyPair, KryptosConfig, ElGamal, RsaKeyPair};
//! use num_bigint::BigUint;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(2024);
//! let config = KryptosConfig { rsa_prime_bits: 64, safe_prime_bits: 64, ..Default::default() };
//!
//! // RSA, one byte per block
//! let rsa = RsaKeyPair::generate(&config, &mut rng).unwrap();
//! let blocks = rsa.public_key.encrypt_bytes(b"hi").unwrap();
//! assert_eq!(rsa.private_key.decrypt_bytes(&blocks).unwrap(), b"hi".to_vec());
//!
//! // ElGamal
//! let keypair = KeyPair::generate(&config, &mut rng).unwrap();
//! let elgamal = ElGamal::with_config(keypair.public_key.clone(), config.clone());
//! let ct = elgamal.encrypt(&BigUint::from(42u32), &mut rng).unwrap();
//! assert_eq!(elgamal.decrypt(&ct, &keypair.private_key).unwrap(), BigUint::from(42u32));
//! ```

pub mod arith;
pub mod codec;
pub mod digest;
pub mod encryption;
pub mod error;
pub mod keys;
pub mod prime;
pub mod rsa;
pub mod signature;
pub mod types;

// Re-export main types for convenience
pub use arith::{extended_euclid, gcd, has_inverse, mod_inverse, mod_pow};
pub use codec::{KeyFile, RecordReader};
pub use digest::{MessageDigest, Sha224Digest};
pub use encryption::{decrypt_block, ElGamal};
pub use error::{KryptosError, Result};
pub use keys::{KeyPair, PrivateKey, PublicKey};
pub use prime::{
    generate_prime, generate_safe_prime_and_generator, miller_rabin_test, miller_rabin_witness,
    GroupParams,
};
pub use rsa::{derive_rsa_keys, RsaKeyPair, RsaPrivateKey, RsaPublicKey};
pub use signature::{sign, sign_content, sign_with_nonce, verify, verify_content};
pub use types::{Ciphertext, KryptosConfig, NoncePolicy, Signature};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
