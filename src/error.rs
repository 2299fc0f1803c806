//! Error types for the kryptos library

use thiserror::Error;

pub type Result<T> = std::result::Result<T, KryptosError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KryptosError {
    #[error("Invalid key size: {0} bits (must be at least 2)")]
    InvalidKeySize(u64),

    #[error("Plaintext too large for modulus")]
    PlaintextTooLarge,

    #[error("Ciphertext is invalid or corrupted")]
    InvalidCiphertext,

    #[error("Value is not invertible modulo the given modulus")]
    NotInvertible,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Search for {what} exhausted after {attempts} attempts")]
    SearchExhausted { what: &'static str, attempts: u64 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for KryptosError {
    fn from(err: std::io::Error) -> Self {
        KryptosError::IOError(err.to_string())
    }
}
