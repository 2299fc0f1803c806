//! kryptos - encrypt, decrypt, sign and verify files from the command line

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kryptos::codec::{
    read_elgamal_records, read_rsa_records, write_elgamal_records, write_rsa_records,
};
use kryptos::encryption::decrypt_bytes;
use kryptos::{
    sign_content, verify_content, ElGamal, KeyFile, KeyPair, KryptosConfig, NoncePolicy,
    RsaKeyPair, Sha224Digest,
};

#[derive(Parser)]
#[command(name = "kryptos")]
#[command(version)]
#[command(about = "RSA and ElGamal file encryption with ElGamal signatures")]
struct Cli {
    /// Seed the random source for reproducible keys
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Bit length of each RSA prime
    #[arg(long, global = true, default_value_t = 128)]
    rsa_bits: u64,

    /// Bit length of q for the ElGamal safe prime p = 2q + 1
    #[arg(long, global = true, default_value_t = 255)]
    group_bits: u64,

    /// Draw ElGamal nonces from [2, p - 2] instead of [2, 10]
    #[arg(long, global = true)]
    full_range_nonce: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Method {
    Rsa,
    Elgamal,
}

impl Method {
    fn name(self) -> &'static str {
        match self {
            Method::Rsa => "rsa",
            Method::Elgamal => "elgamal",
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Encrypt FILE byte by byte into E<FILE> with freshly generated keys
    Encrypt {
        method: Method,
        file: PathBuf,
        /// Write the generated keys to keys-<method>-E<stem>.txt
        #[arg(long)]
        save_keys: bool,
    },
    /// Decrypt FILE into D<FILE>
    Decrypt {
        method: Method,
        file: PathBuf,
        /// Key file holding n, d (RSA) or p, d (ElGamal)
        #[arg(long)]
        keys: PathBuf,
    },
    /// Generate signing keys and sign FILE
    Sign {
        file: PathBuf,
        /// Write the signing keys to keys-signature-<stem>.txt
        #[arg(long)]
        save_keys: bool,
        /// Write the signature to signature-<stem>.txt
        #[arg(long)]
        save_signature: bool,
    },
    /// Verify the signature over FILE
    Verify {
        file: PathBuf,
        /// Key file holding p, g, v
        #[arg(long)]
        keys: PathBuf,
        /// Signature file holding r, s
        #[arg(long)]
        signature: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "kryptos=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = KryptosConfig {
        rsa_prime_bits: cli.rsa_bits,
        safe_prime_bits: cli.group_bits,
        nonce_policy: if cli.full_range_nonce {
            NoncePolicy::FullRange
        } else {
            NoncePolicy::Reference
        },
        ..Default::default()
    };
    config.validate()?;

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    match cli.command {
        Command::Encrypt {
            method,
            file,
            save_keys,
        } => encrypt(method, &file, save_keys, &config, &mut rng),
        Command::Decrypt { method, file, keys } => decrypt(method, &file, &keys),
        Command::Sign {
            file,
            save_keys,
            save_signature,
        } => sign(&file, save_keys, save_signature, &config, &mut rng),
        Command::Verify {
            file,
            keys,
            signature,
        } => verify(&file, &keys, &signature),
    }
}

fn encrypt(
    method: Method,
    path: &Path,
    save_keys: bool,
    config: &KryptosConfig,
    rng: &mut StdRng,
) -> Result<()> {
    let data = read_input(path)?;
    let out_path = prefixed(path, "E")?;

    info!(method = method.name(), file = %path.display(), bytes = data.len(), "encrypting");

    let mut records: Vec<u8> = Vec::new();
    let key_file = match method {
        Method::Rsa => {
            let keys = RsaKeyPair::generate(config, rng)?;
            let blocks = keys.public_key.encrypt_bytes(&data)?;
            write_rsa_records(&mut records, &blocks)?;
            KeyFile::from_rsa(&keys)
        }
        Method::Elgamal => {
            let keys = KeyPair::generate(config, rng)?;
            let elgamal = ElGamal::with_config(keys.public_key.clone(), config.clone());
            let ciphertexts = elgamal.encrypt_bytes(&data, rng)?;
            write_elgamal_records(&mut records, &ciphertexts)?;
            KeyFile::from_elgamal(&keys)
        }
    };
    fs::write(&out_path, records).with_context(|| format!("writing {}", out_path.display()))?;

    println!("Keys:\n{}", key_file);
    if save_keys {
        let name = format!("keys-{}-{}", method.name(), txt_name(&out_path)?);
        write_sibling(&out_path, &name, &key_file)?;
    }
    println!("Encrypted file: {}", out_path.display());
    Ok(())
}

fn decrypt(method: Method, path: &Path, keys: &Path) -> Result<()> {
    require_file(path)?;
    let key_file = read_key_file(keys)?;
    let reader = BufReader::new(
        File::open(path).with_context(|| format!("opening {}", path.display()))?,
    );

    info!(method = method.name(), file = %path.display(), "decrypting");

    let plaintext = match method {
        Method::Rsa => {
            let private_key = key_file.rsa_private_key()?;
            let blocks = read_rsa_records(reader)?;
            private_key.decrypt_bytes(&blocks)?
        }
        Method::Elgamal => {
            let private_key = key_file.elgamal_private_key()?;
            let ciphertexts = read_elgamal_records(reader)?;
            decrypt_bytes(&ciphertexts, &private_key)?
        }
    };

    let out_path = prefixed(path, "D")?;
    fs::write(&out_path, plaintext).with_context(|| format!("writing {}", out_path.display()))?;
    println!("Decrypted file: {}", out_path.display());
    Ok(())
}

fn sign(
    path: &Path,
    save_keys: bool,
    save_signature: bool,
    config: &KryptosConfig,
    rng: &mut StdRng,
) -> Result<()> {
    let content = read_input(path)?;

    info!(file = %path.display(), "generating signing keys");
    let keys = KeyPair::generate(config, rng)?;
    let key_file = KeyFile::from_signing_keys(&keys);
    println!("Signing keys:\n{}", key_file);
    if save_keys {
        let name = format!("keys-signature-{}", txt_name(path)?);
        write_sibling(path, &name, &key_file)?;
    }

    let signature = sign_content(&content, &Sha224Digest, &keys.private_key, config, rng)?;
    let signature_file = KeyFile::from_signature(&signature);
    println!("Signature of {}:\n{}", path.display(), signature_file);
    if save_signature {
        let name = format!("signature-{}", txt_name(path)?);
        write_sibling(path, &name, &signature_file)?;
    }
    Ok(())
}

fn verify(path: &Path, keys: &Path, signature: &Path) -> Result<()> {
    let content = read_input(path)?;
    let public_key = read_key_file(keys)?.verifying_key()?;
    let signature = read_key_file(signature)?.signature()?;

    if verify_content(&content, &Sha224Digest, &signature, &public_key) {
        println!("Signature valid");
        Ok(())
    } else {
        bail!("signature over {} is invalid", path.display())
    }
}

fn require_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("file {} does not exist", path.display());
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    require_file(path)?;
    fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn read_key_file(path: &Path) -> Result<KeyFile> {
    require_file(path)?;
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    text.parse::<KeyFile>()
        .with_context(|| format!("parsing {}", path.display()))
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))
}

/// Same directory, file name with `prefix` prepended
fn prefixed(path: &Path, prefix: &str) -> Result<PathBuf> {
    Ok(path.with_file_name(format!("{}{}", prefix, file_name(path)?)))
}

/// File name with its extension replaced by `.txt`
fn txt_name(path: &Path) -> Result<String> {
    let name = file_name(path)?;
    let stem = name.rsplit_once('.').map_or(name.as_str(), |(stem, _)| stem);
    Ok(format!("{}.txt", stem))
}

fn write_sibling(path: &Path, name: &str, contents: &KeyFile) -> Result<()> {
    let target = path.with_file_name(name);
    fs::write(&target, contents.to_string())
        .with_context(|| format!("writing {}", target.display()))?;
    println!("Saved {}", target.display());
    Ok(())
}
