//! ElGamal encryption and decryption operations

use num_bigint::{BigUint, RandBigInt};
use num_traits::ToPrimitive;
use rand::Rng;
use tracing::warn;

use crate::arith::{mod_inverse, mod_pow};
use crate::error::{KryptosError, Result};
use crate::keys::{PrivateKey, PublicKey};
use crate::types::{Ciphertext, KryptosConfig, NoncePolicy};

/// ElGamal encryption bound to a public key
#[derive(Clone, Debug)]
pub struct ElGamal {
    pub public_key: PublicKey,
    config: KryptosConfig,
}

impl ElGamal {
    /// Create a new ElGamal instance with the default configuration
    pub fn new(public_key: PublicKey) -> Self {
        Self::with_config(public_key, KryptosConfig::default())
    }

    /// Create a new ElGamal instance with custom configuration
    pub fn with_config(public_key: PublicKey, config: KryptosConfig) -> Self {
        ElGamal { public_key, config }
    }

    /// Get the configuration
    pub fn config(&self) -> &KryptosConfig {
        &self.config
    }

    fn warn_on_reference_nonce(&self) {
        if self.config.nonce_policy == NoncePolicy::Reference {
            warn!("ElGamal nonces drawn from [2, 10]; ciphertexts are not semantically secure");
        }
    }

    fn draw_nonce<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<BigUint> {
        match self.config.nonce_policy {
            NoncePolicy::Reference => Ok(BigUint::from(rng.gen_range(2u32..=10))),
            NoncePolicy::FullRange => {
                let low = BigUint::from(2u32);
                let high = &self.public_key.p - 1u32;
                if high <= low {
                    return Err(KryptosError::InvalidParameter(
                        "Full-range nonces need p >= 5".to_string(),
                    ));
                }
                Ok(rng.gen_biguint_range(&low, &high))
            }
        }
    }

    /// Encrypt a plaintext block m in [0, p)
    pub fn encrypt<R: Rng + ?Sized>(&self, plaintext: &BigUint, rng: &mut R) -> Result<Ciphertext> {
        self.warn_on_reference_nonce();
        self.encrypt_block(plaintext, rng)
    }

    fn encrypt_block<R: Rng + ?Sized>(
        &self,
        plaintext: &BigUint,
        rng: &mut R,
    ) -> Result<Ciphertext> {
        let k = self.draw_nonce(rng)?;
        self.encrypt_with_nonce(plaintext, &k)
    }

    /// Encrypt with a caller-chosen ephemeral exponent k
    pub fn encrypt_with_nonce(&self, plaintext: &BigUint, k: &BigUint) -> Result<Ciphertext> {
        let p = &self.public_key.p;
        if plaintext >= p {
            return Err(KryptosError::PlaintextTooLarge);
        }

        let s = mod_pow(&self.public_key.g, k, p)?;
        let c_k = mod_pow(&self.public_key.c, k, p)?;
        let t = plaintext * c_k % p;

        Ok(Ciphertext::new(s, t))
    }

    /// Decrypt a ciphertext: m = (s^-1)^d * t mod p
    pub fn decrypt(&self, ciphertext: &Ciphertext, private_key: &PrivateKey) -> Result<BigUint> {
        if private_key.p != self.public_key.p {
            return Err(KryptosError::InvalidParameter(
                "Private key belongs to a different group".to_string(),
            ));
        }
        decrypt_block(ciphertext, private_key)
    }

    /// Encrypt a byte stream, one byte per block
    pub fn encrypt_bytes<R: Rng + ?Sized>(
        &self,
        data: &[u8],
        rng: &mut R,
    ) -> Result<Vec<Ciphertext>> {
        self.warn_on_reference_nonce();
        data.iter()
            .map(|&byte| self.encrypt_block(&BigUint::from(byte), rng))
            .collect()
    }

    /// Decrypt blocks produced by [`ElGamal::encrypt_bytes`]
    pub fn decrypt_bytes(
        &self,
        ciphertexts: &[Ciphertext],
        private_key: &PrivateKey,
    ) -> Result<Vec<u8>> {
        if private_key.p != self.public_key.p {
            return Err(KryptosError::InvalidParameter(
                "Private key belongs to a different group".to_string(),
            ));
        }
        decrypt_bytes(ciphertexts, private_key)
    }
}

/// Decrypt byte blocks with only the private key; every block must decrypt to 0..=255
pub fn decrypt_bytes(ciphertexts: &[Ciphertext], private_key: &PrivateKey) -> Result<Vec<u8>> {
    ciphertexts
        .iter()
        .map(|ct| {
            decrypt_block(ct, private_key)?
                .to_u8()
                .ok_or(KryptosError::InvalidCiphertext)
        })
        .collect()
}

/// Decrypt a single block with only the private key (p, d)
pub fn decrypt_block(ciphertext: &Ciphertext, private_key: &PrivateKey) -> Result<BigUint> {
    let p = &private_key.p;
    if &ciphertext.s >= p || &ciphertext.t >= p {
        return Err(KryptosError::InvalidCiphertext);
    }

    let s_inv = mod_inverse(&ciphertext.s, p)?;
    let shared = mod_pow(&s_inv, &private_key.d, p)?;

    Ok(shared * &ciphertext.t % p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyPair;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn count(&self, needle: &str) -> usize {
            String::from_utf8_lossy(&self.0.lock().unwrap()).matches(needle).count()
        }
    }

    fn big(v: u64) -> BigUint {
        BigUint::from(v)
    }

    fn test_keypair(rng: &mut StdRng) -> KeyPair {
        let config = KryptosConfig {
            safe_prime_bits: 64,
            ..Default::default()
        };
        KeyPair::generate(&config, rng).unwrap()
    }

    #[test]
    fn test_encryption_decryption() {
        let mut rng = StdRng::seed_from_u64(21);
        let keypair = test_keypair(&mut rng);
        let elgamal = ElGamal::new(keypair.public_key.clone());

        let plaintext = big(42);
        let ciphertext = elgamal.encrypt(&plaintext, &mut rng).unwrap();
        let decrypted = elgamal.decrypt(&ciphertext, &keypair.private_key).unwrap();

        assert_eq!(plaintext, decrypted);
    }

    #[test]
    fn test_full_range_nonce() {
        let mut rng = StdRng::seed_from_u64(22);
        let keypair = test_keypair(&mut rng);
        let config = KryptosConfig {
            nonce_policy: NoncePolicy::FullRange,
            ..Default::default()
        };
        let elgamal = ElGamal::with_config(keypair.public_key.clone(), config);

        let p = keypair.public_key.modulus().clone();
        for m in [big(0), big(1), big(255), &p - 1u32] {
            let ct = elgamal.encrypt(&m, &mut rng).unwrap();
            assert_eq!(elgamal.decrypt(&ct, &keypair.private_key).unwrap(), m);
        }
    }

    #[test]
    fn test_full_range_nonce_needs_room() {
        let keypair = KeyPair::from_components(big(3), big(2), big(1)).unwrap();
        let config = KryptosConfig {
            nonce_policy: NoncePolicy::FullRange,
            ..Default::default()
        };
        let elgamal = ElGamal::with_config(keypair.public_key.clone(), config);
        let mut rng = StdRng::seed_from_u64(25);
        assert!(elgamal.encrypt(&big(1), &mut rng).is_err());
    }

    #[test]
    fn test_known_values() {
        // p = 23, g = 5, d = 6, c = 8; k = 3
        let keypair = KeyPair::from_components(big(23), big(5), big(6)).unwrap();
        let elgamal = ElGamal::new(keypair.public_key.clone());

        let ct = elgamal.encrypt_with_nonce(&big(10), &big(3)).unwrap();
        // s = 5^3 mod 23 = 10, t = 10 * 8^3 mod 23 = 5120 mod 23 = 14
        assert_eq!(ct.s(), &big(10));
        assert_eq!(ct.t(), &big(14));
        assert_eq!(decrypt_block(&ct, &keypair.private_key).unwrap(), big(10));
    }

    #[test]
    fn test_plaintext_too_large() {
        let keypair = KeyPair::from_components(big(23), big(5), big(6)).unwrap();
        let elgamal = ElGamal::new(keypair.public_key.clone());
        assert_eq!(
            elgamal.encrypt_with_nonce(&big(23), &big(3)),
            Err(KryptosError::PlaintextTooLarge)
        );
    }

    #[test]
    fn test_invalid_ciphertext() {
        let keypair = KeyPair::from_components(big(23), big(5), big(6)).unwrap();
        let zero_s = Ciphertext::new(big(0), big(4));
        assert_eq!(
            decrypt_block(&zero_s, &keypair.private_key),
            Err(KryptosError::NotInvertible)
        );
        let out_of_range = Ciphertext::new(big(30), big(4));
        assert_eq!(
            decrypt_block(&out_of_range, &keypair.private_key),
            Err(KryptosError::InvalidCiphertext)
        );
    }

    #[test]
    fn test_byte_stream() {
        let mut rng = StdRng::seed_from_u64(23);
        let keypair = test_keypair(&mut rng);
        let elgamal = ElGamal::new(keypair.public_key.clone());

        let data = b"attack at dawn \x00\xff";
        let blocks = elgamal.encrypt_bytes(data, &mut rng).unwrap();
        assert_eq!(blocks.len(), data.len());

        let decrypted = elgamal.decrypt_bytes(&blocks, &keypair.private_key).unwrap();
        assert_eq!(decrypted, data.to_vec());
    }

    #[test]
    fn test_foreign_private_key_rejected() {
        let mut rng = StdRng::seed_from_u64(24);
        let keypair = test_keypair(&mut rng);
        let other = KeyPair::from_components(big(23), big(5), big(6)).unwrap();
        let elgamal = ElGamal::new(keypair.public_key.clone());

        let ct = elgamal.encrypt(&big(7), &mut rng).unwrap();
        assert!(elgamal.decrypt(&ct, &other.private_key).is_err());
    }

    #[test]
    fn test_reference_nonce_warns_on_encrypt() {
        let keypair = KeyPair::from_components(big(23), big(5), big(6)).unwrap();
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut rng = StdRng::seed_from_u64(26);
            let reference = ElGamal::new(keypair.public_key.clone());
            assert_eq!(logs.count("nonces drawn"), 0);

            reference.encrypt(&big(4), &mut rng).unwrap();
            assert_eq!(logs.count("nonces drawn"), 1);

            // One warning per stream, not per byte
            reference.encrypt_bytes(b"abc", &mut rng).unwrap();
            assert_eq!(logs.count("nonces drawn"), 2);

            let full_range = ElGamal::with_config(
                keypair.public_key.clone(),
                KryptosConfig {
                    nonce_policy: NoncePolicy::FullRange,
                    ..Default::default()
                },
            );
            full_range.encrypt_bytes(b"abc", &mut rng).unwrap();
            assert_eq!(logs.count("nonces drawn"), 2);
        });
    }
}
