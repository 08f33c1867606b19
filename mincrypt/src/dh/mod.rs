//! Shared Diffie-Hellman parameters: a prime modulus `p` and a base `g`.
//!
//! `g` is only required to be a usable exponentiation base in `[2, p - 2]`; it is not
//! checked to be a primitive root.

use crate::config::{DEFAULT_SMALL_PRIME_BITS, MAX_SMALL_PRIME_BITS};
use crate::errors::MincryptError;
use crate::number_theory::keygen::random_prime_of_bits;
use crate::number_theory::{is_prime, modpow, primes_in_bit_range};

use rand::Rng;

use serde::{Deserialize, Serialize};

use std::fmt;

pub const MIN_DH_BITS: u32 = 3;
pub const MAX_DH_BITS: u32 = u64::BITS;

/// Draws per bit strength before giving up on the nearest-prime path.
const PRIME_DRAWS: usize = 16;

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct DhCommon {
    pub p: u64,
    pub g: u64,
}

impl DhCommon {
    /// Validating constructor: `p` must be prime and `1 < g < p`.
    pub fn try_with(p: u64, g: u64) -> Result<Self, MincryptError> {
        if !is_prime(p) {
            return Err(MincryptError::InvalidParameters(format!(
                "DH modulus {} is not prime",
                p
            )));
        }
        if g <= 1 || g >= p {
            return Err(MincryptError::InvalidParameters(format!(
                "DH base must satisfy 1 < g < p, got g={} p={}",
                g, p
            )));
        }

        Ok(Self { p, g })
    }

    /// Generates parameters with a `bits`-bit prime modulus, using the default
    /// small-prime threshold.
    pub fn generate(rng: &mut impl Rng, bits: u32) -> Result<Self, MincryptError> {
        Self::generate_with(rng, bits, DEFAULT_SMALL_PRIME_BITS)
    }

    /// Generates parameters with a `bits`-bit prime modulus.
    ///
    /// Up to `small_prime_bits` the modulus is picked uniformly from every prime of that
    /// bit length; above it the nearest prime to a random `bits`-bit value is used.
    /// `small_prime_bits` is clamped to [`MAX_SMALL_PRIME_BITS`].
    ///
    /// # Errors
    ///
    /// * `InvalidParameters` if `bits` is outside `[MIN_DH_BITS, MAX_DH_BITS]`.
    /// * `NoPrimeFound` if no prime of that size could be selected.
    pub fn generate_with(
        rng: &mut impl Rng,
        bits: u32,
        small_prime_bits: u32,
    ) -> Result<Self, MincryptError> {
        if !(MIN_DH_BITS..=MAX_DH_BITS).contains(&bits) {
            return Err(MincryptError::InvalidParameters(format!(
                "DH bit strength must be within {}..={}, got {}",
                MIN_DH_BITS, MAX_DH_BITS, bits
            )));
        }

        let p = if bits <= small_prime_bits.min(MAX_SMALL_PRIME_BITS) {
            let primes = primes_in_bit_range(bits, bits)?;
            if primes.is_empty() {
                return Err(MincryptError::NoPrimeFound(format!(
                    "no {}-bit prime in range",
                    bits
                )));
            }
            primes.values[rng.random_range(0..primes.count())]
        } else {
            (0..PRIME_DRAWS)
                .find_map(|_| random_prime_of_bits(rng, bits))
                .ok_or_else(|| {
                    MincryptError::NoPrimeFound(format!(
                        "no {}-bit prime after {} draws",
                        bits, PRIME_DRAWS
                    ))
                })?
        };

        let g = rng.random_range(2..=p - 2);
        tracing::debug!(bits, p, g, "generated DH common parameters");

        Ok(Self { p, g })
    }

    /// `g^private mod p`. Fails with `InvalidModulus` on unset parameters (`p == 0`).
    pub fn public_value(&self, private: u64) -> Result<u64, MincryptError> {
        modpow(self.g, private, self.p)
    }

    /// `peer_public^private mod p`.
    pub fn shared_secret(&self, peer_public: u64, private: u64) -> Result<u64, MincryptError> {
        modpow(peer_public, private, self.p)
    }
}

impl fmt::Display for DhCommon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p = {}, g = {}", self.p, self.g)
    }
}
