//! Text formats for ciphertext streams, key files and signature files
//!
//! Ciphertext streams are decimal records, each terminated by `-`. ElGamal
//! records hold both components as `s|t`. Key and signature files are lines
//! of `name = HEX` with uppercase hexadecimal values.

use std::fmt;
use std::io::{BufRead, Split, Write};
use std::str::FromStr;

use num_bigint::BigUint;

use crate::error::{KryptosError, Result};
use crate::keys::{KeyPair, PrivateKey, PublicKey};
use crate::rsa::{RsaKeyPair, RsaPrivateKey, RsaPublicKey};
use crate::types::{Ciphertext, Signature};

/// Terminator written after every ciphertext record
pub const RECORD_DELIMITER: u8 = b'-';

/// Separator between the two components of an ElGamal record
pub const PAIR_SEPARATOR: char = '|';

/// Write RSA blocks as delimited decimal records
pub fn write_rsa_records<W: Write>(writer: &mut W, blocks: &[BigUint]) -> Result<()> {
    for block in blocks {
        write!(writer, "{}{}", block, RECORD_DELIMITER as char)?;
    }
    Ok(())
}

/// Write ElGamal ciphertexts as delimited `s|t` records
pub fn write_elgamal_records<W: Write>(writer: &mut W, ciphertexts: &[Ciphertext]) -> Result<()> {
    for ct in ciphertexts {
        write!(
            writer,
            "{}{}{}{}",
            ct.s,
            PAIR_SEPARATOR,
            ct.t,
            RECORD_DELIMITER as char
        )?;
    }
    Ok(())
}

/// Lazily splits a byte stream into records on [`RECORD_DELIMITER`].
///
/// Surrounding whitespace is trimmed and empty records are skipped.
pub struct RecordReader<R> {
    inner: Split<R>,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        RecordReader {
            inner: reader.split(RECORD_DELIMITER),
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let bytes = match self.inner.next()? {
                Ok(bytes) => bytes,
                Err(err) => return Some(Err(err.into())),
            };

            let record = match String::from_utf8(bytes) {
                Ok(record) => record,
                Err(_) => {
                    return Some(Err(KryptosError::Parse(
                        "Record is not valid UTF-8".to_string(),
                    )))
                }
            };

            let trimmed = record.trim();
            if !trimmed.is_empty() {
                return Some(Ok(trimmed.to_string()));
            }
        }
    }
}

fn parse_decimal(text: &str) -> Result<BigUint> {
    BigUint::from_str(text.trim())
        .map_err(|_| KryptosError::Parse(format!("Invalid decimal value `{}`", text.trim())))
}

/// Parse one RSA record
pub fn parse_rsa_record(record: &str) -> Result<BigUint> {
    parse_decimal(record)
}

/// Parse one ElGamal `s|t` record
pub fn parse_elgamal_record(record: &str) -> Result<Ciphertext> {
    let (s, t) = record
        .split_once(PAIR_SEPARATOR)
        .ok_or_else(|| KryptosError::Parse(format!("Missing `{}` in record", PAIR_SEPARATOR)))?;
    Ok(Ciphertext::new(parse_decimal(s)?, parse_decimal(t)?))
}

/// Read every RSA record from a stream
pub fn read_rsa_records<R: BufRead>(reader: R) -> Result<Vec<BigUint>> {
    RecordReader::new(reader)
        .map(|record| parse_rsa_record(&record?))
        .collect()
}

/// Read every ElGamal record from a stream
pub fn read_elgamal_records<R: BufRead>(reader: R) -> Result<Vec<Ciphertext>> {
    RecordReader::new(reader)
        .map(|record| parse_elgamal_record(&record?))
        .collect()
}

/// Ordered `name = HEX` entries
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyFile {
    entries: Vec<(String, BigUint)>,
}

impl KeyFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, builder style
    pub fn with(mut self, name: &str, value: &BigUint) -> Self {
        self.entries.push((name.to_string(), value.clone()));
        self
    }

    pub fn entries(&self) -> &[(String, BigUint)] {
        &self.entries
    }

    /// Look up a value by name
    pub fn get(&self, name: &str) -> Result<&BigUint> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| value)
            .ok_or_else(|| KryptosError::Parse(format!("Missing entry `{}`", name)))
    }

    pub fn from_rsa(keys: &RsaKeyPair) -> Self {
        KeyFile::new()
            .with("n", keys.n())
            .with("e", keys.e())
            .with("d", keys.d())
    }

    /// ElGamal encryption keys: p, g, c, d
    pub fn from_elgamal(keys: &KeyPair) -> Self {
        KeyFile::new()
            .with("p", keys.public_key.modulus())
            .with("g", keys.public_key.generator())
            .with("c", keys.public_key.public_component())
            .with("d", keys.private_key.secret_exponent())
    }

    /// Signature keys: p, g, v, a
    pub fn from_signing_keys(keys: &KeyPair) -> Self {
        KeyFile::new()
            .with("p", keys.public_key.modulus())
            .with("g", keys.public_key.generator())
            .with("v", keys.public_key.public_component())
            .with("a", keys.private_key.secret_exponent())
    }

    pub fn from_signature(signature: &Signature) -> Self {
        KeyFile::new().with("r", signature.r()).with("s", signature.s())
    }

    pub fn rsa_public_key(&self) -> Result<RsaPublicKey> {
        RsaPublicKey::new(self.get("n")?.clone(), self.get("e")?.clone())
    }

    pub fn rsa_private_key(&self) -> Result<RsaPrivateKey> {
        RsaPrivateKey::new(self.get("n")?.clone(), self.get("d")?.clone())
    }

    pub fn elgamal_public_key(&self) -> Result<PublicKey> {
        PublicKey::new(
            self.get("p")?.clone(),
            self.get("g")?.clone(),
            self.get("c")?.clone(),
        )
    }

    pub fn elgamal_private_key(&self) -> Result<PrivateKey> {
        PrivateKey::new(
            self.get("p")?.clone(),
            self.get("g")?.clone(),
            self.get("d")?.clone(),
        )
    }

    pub fn verifying_key(&self) -> Result<PublicKey> {
        PublicKey::new(
            self.get("p")?.clone(),
            self.get("g")?.clone(),
            self.get("v")?.clone(),
        )
    }

    pub fn signing_key(&self) -> Result<PrivateKey> {
        PrivateKey::new(
            self.get("p")?.clone(),
            self.get("g")?.clone(),
            self.get("a")?.clone(),
        )
    }

    pub fn signature(&self) -> Result<Signature> {
        Ok(Signature::new(
            self.get("r")?.clone(),
            self.get("s")?.clone(),
        ))
    }
}

impl fmt::Display for KeyFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            writeln!(f, "{} = {:X}", name, value)?;
        }
        Ok(())
    }
}

impl FromStr for KeyFile {
    type Err = KryptosError;

    /// Accepts `=` or `-` between name and value
    fn from_str(text: &str) -> Result<Self> {
        let mut file = KeyFile::new();

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (name, value) = line
                .split_once(|c: char| c == '=' || c == '-')
                .ok_or_else(|| KryptosError::Parse(format!("Line {}: missing `=`", index + 1)))?;

            let name = name.trim();
            let value = value.trim();
            if name.is_empty() {
                return Err(KryptosError::Parse(format!("Line {}: missing name", index + 1)));
            }

            let value = BigUint::parse_bytes(value.as_bytes(), 16).ok_or_else(|| {
                KryptosError::Parse(format!("Line {}: invalid hex value `{}`", index + 1, value))
            })?;
            file.entries.push((name.to_lowercase(), value));
        }

        Ok(file)
    }
}
