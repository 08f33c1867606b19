//! # RSA Module
//!
//! Block encryption with 32-bit and 64-bit moduli over key material from
//! [`crate::number_theory::keygen`], plus key-file persistence in [`key_file`].

pub mod key_file;

use crate::errors::MincryptError;
use crate::number_theory::{Approach, KeyMaterial, generate_key_material_with, modpow};

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use serde::{Deserialize, Serialize};

pub use key_file::{KeyFile, generate_key_files, read_key_file, seed_from_secret};

/// Public half of a keypair: encryption exponent and modulus.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RsaPublicKey {
    pub bits: u32,
    pub e: u64,
    pub n: u64,
}

/// Private half of a keypair. `p` and `q` are kept alongside `d`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RsaPrivateKey {
    pub bits: u32,
    pub d: u64,
    pub n: u64,
    pub p: u64,
    pub q: u64,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RsaKeyPair {
    pub bits: u32,
    pub material: KeyMaterial,
}

impl RsaKeyPair {
    /// Generates a keypair reproducibly from `seed`.
    pub fn generate(
        bits: u32,
        seed: u64,
        approach: Approach,
        max_attempts: usize,
    ) -> Result<Self, MincryptError> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::generate_with(&mut rng, bits, approach, max_attempts)
    }

    pub fn generate_with(
        rng: &mut impl Rng,
        bits: u32,
        approach: Approach,
        max_attempts: usize,
    ) -> Result<Self, MincryptError> {
        let material = generate_key_material_with(rng, bits, approach, max_attempts)?;
        tracing::info!(bits, n = material.n, "generated RSA keypair");

        Ok(Self { bits, material })
    }

    pub fn public_key(&self) -> RsaPublicKey {
        RsaPublicKey {
            bits: self.bits,
            e: self.material.e,
            n: self.material.n,
        }
    }

    pub fn private_key(&self) -> RsaPrivateKey {
        RsaPrivateKey {
            bits: self.bits,
            d: self.material.d,
            n: self.material.n,
            p: self.material.p,
            q: self.material.q,
        }
    }
}

impl RsaPublicKey {
    pub fn encrypt_u64(&self, block: u64) -> Result<u64, MincryptError> {
        encrypt_block_u64(block, self.e, self.n)
    }

    /// Encrypts a 32-bit block; the modulus must itself fit in 32 bits.
    pub fn encrypt_u32(&self, block: u32) -> Result<u32, MincryptError> {
        encrypt_block_u32(block, narrow(self.e)?, narrow(self.n)?)
    }
}

impl RsaPrivateKey {
    pub fn decrypt_u64(&self, block: u64) -> Result<u64, MincryptError> {
        decrypt_block_u64(block, self.d, self.n)
    }

    pub fn decrypt_u32(&self, block: u32) -> Result<u32, MincryptError> {
        decrypt_block_u32(block, narrow(self.d)?, narrow(self.n)?)
    }
}

fn narrow(value: u64) -> Result<u32, MincryptError> {
    u32::try_from(value).map_err(|_| {
        MincryptError::InvalidParameters(format!("{} does not fit a 32-bit block key", value))
    })
}

/// `block^exponent mod n` at the width of `T`. Blocks `>= n` are reduced modulo `n`.
fn transform<T>(block: T, exponent: T, n: T) -> Result<T, MincryptError>
where
    T: Copy + Into<u64> + TryFrom<u64>,
{
    let value = modpow(block.into(), exponent.into(), n.into())?;

    // value < modulus <= T::MAX
    T::try_from(value).map_err(|_| {
        MincryptError::InvalidParameters(format!("{} does not fit the block width", value))
    })
}

pub fn encrypt_block_u32(block: u32, e: u32, n: u32) -> Result<u32, MincryptError> {
    transform(block, e, n)
}

pub fn decrypt_block_u32(block: u32, d: u32, n: u32) -> Result<u32, MincryptError> {
    transform(block, d, n)
}

pub fn encrypt_block_u64(block: u64, e: u64, n: u64) -> Result<u64, MincryptError> {
    transform(block, e, n)
}

pub fn decrypt_block_u64(block: u64, d: u64, n: u64) -> Result<u64, MincryptError> {
    transform(block, d, n)
}
