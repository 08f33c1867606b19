//! RSA key files.
//!
//! Layout (big-endian):
//!
//! ```text
//! 3 bytes  signature "MCF"
//! 1 byte   kind: 'U' public, 'R' private
//! 4 bytes  u32 modulus bit size
//! public:  e, n          (u64 each)
//! private: d, n, p, q    (u64 each)
//! ```

use crate::errors::MincryptError;
use crate::number_theory::Approach;

use super::{RsaKeyPair, RsaPrivateKey, RsaPublicKey};

use sha2::{Digest, Sha256};

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub const SIGNATURE: &[u8; 3] = b"MCF";
const KIND_PUBLIC: u8 = b'U';
const KIND_PRIVATE: u8 = b'R';

/// Contents of a key file; the variant tells whether the file held private material.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyFile {
    Public(RsaPublicKey),
    Private(RsaPrivateKey),
}

impl KeyFile {
    pub fn is_private(&self) -> bool {
        matches!(self, KeyFile::Private(_))
    }

    pub fn bits(&self) -> u32 {
        match self {
            KeyFile::Public(key) => key.bits,
            KeyFile::Private(key) => key.bits,
        }
    }

    pub fn write_to(&self, writer: &mut impl Write) -> Result<(), MincryptError> {
        writer.write_all(SIGNATURE)?;

        let values: Vec<u64> = match self {
            KeyFile::Public(key) => {
                writer.write_all(&[KIND_PUBLIC])?;
                writer.write_all(&key.bits.to_be_bytes())?;
                vec![key.e, key.n]
            }
            KeyFile::Private(key) => {
                writer.write_all(&[KIND_PRIVATE])?;
                writer.write_all(&key.bits.to_be_bytes())?;
                vec![key.d, key.n, key.p, key.q]
            }
        };

        for value in values {
            writer.write_all(&value.to_be_bytes())?;
        }

        Ok(())
    }

    pub fn read_from(reader: &mut impl Read) -> Result<Self, MincryptError> {
        let mut header = [0u8; 8];
        reader
            .read_exact(&mut header)
            .map_err(|e| MincryptError::from_read(e, "key file header"))?;

        if &header[..3] != SIGNATURE {
            return Err(MincryptError::FormatError(
                "missing MCF key file signature".to_string(),
            ));
        }

        let bits = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);

        match header[3] {
            KIND_PUBLIC => {
                let [e, n] = read_values::<2>(reader)?;
                Ok(KeyFile::Public(RsaPublicKey { bits, e, n }))
            }
            KIND_PRIVATE => {
                let [d, n, p, q] = read_values::<4>(reader)?;
                Ok(KeyFile::Private(RsaPrivateKey { bits, d, n, p, q }))
            }
            other => Err(MincryptError::FormatError(format!(
                "unknown key kind byte 0x{:02x}",
                other
            ))),
        }
    }
}

fn read_values<const N: usize>(reader: &mut impl Read) -> Result<[u64; N], MincryptError> {
    let mut values = [0u64; N];
    let mut buf = [0u8; 8];

    for value in values.iter_mut() {
        reader
            .read_exact(&mut buf)
            .map_err(|e| MincryptError::from_read(e, "key value"))?;
        *value = u64::from_be_bytes(buf);
    }

    Ok(values)
}

/// Derives a key-search seed from a salt and password: the first eight bytes of
/// `SHA-256(salt || password)`, big-endian.
pub fn seed_from_secret(salt: &str, password: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();

    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(seed)
}

/// Generates a keypair from `salt` and `password` and writes both key files.
///
/// Existing files are truncated. Writes are not atomic.
pub fn generate_key_files(
    bits: u32,
    salt: &str,
    password: &str,
    private_path: impl AsRef<Path>,
    public_path: impl AsRef<Path>,
    max_attempts: usize,
) -> Result<RsaKeyPair, MincryptError> {
    let seed = seed_from_secret(salt, password);
    let pair = RsaKeyPair::generate(bits, seed, Approach::Symmetric, max_attempts)?;

    write_key_file(&private_path, &KeyFile::Private(pair.private_key()))?;
    write_key_file(&public_path, &KeyFile::Public(pair.public_key()))?;

    tracing::info!(
        bits,
        private = %private_path.as_ref().display(),
        public = %public_path.as_ref().display(),
        "wrote key files"
    );

    Ok(pair)
}

pub fn write_key_file(path: impl AsRef<Path>, key: &KeyFile) -> Result<(), MincryptError> {
    let mut writer = BufWriter::new(File::create(path)?);
    key.write_to(&mut writer)?;
    writer.flush()?;
    Ok(())
}

pub fn read_key_file(path: impl AsRef<Path>) -> Result<KeyFile, MincryptError> {
    let mut reader = BufReader::new(File::open(path)?);
    KeyFile::read_from(&mut reader)
}
