use crate::errors::MincryptError;
use crate::number_theory::keygen::DEFAULT_MAX_KEYGEN_ATTEMPTS;

use rand::SeedableRng;
use rand::rngs::StdRng;

use serde::{Deserialize, Serialize};

use std::path::Path;

/// Default bound on the number of values a single key-material field may declare.
pub const DEFAULT_MAX_FIELD_VALUES: u64 = 1 << 20;

/// Bit strengths up to this are served by an exhaustive prime listing.
pub const DEFAULT_SMALL_PRIME_BITS: u32 = 16;

/// Ceiling for `small_prime_bits`; listing every prime of a larger size is too slow.
pub const MAX_SMALL_PRIME_BITS: u32 = 24;

/// Settings for one [`crate::session::Session`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MincryptConfig {
    /// Seed for every random draw of the session. `None` seeds from the OS.
    ///
    /// Draws come from [`StdRng`]. Neither setting makes the toolkit's keys
    /// cryptographically strong; seeded sessions are fully predictable.
    pub seed: Option<u64>,
    /// Retry ceiling for RSA key material search.
    pub max_keygen_attempts: usize,
    /// Largest value count accepted for one field when reading key material.
    pub max_field_values: u64,
    /// DH bit strengths up to this pick from the full list of primes in range.
    pub small_prime_bits: u32,
}

impl Default for MincryptConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_keygen_attempts: DEFAULT_MAX_KEYGEN_ATTEMPTS,
            max_field_values: DEFAULT_MAX_FIELD_VALUES,
            small_prime_bits: DEFAULT_SMALL_PRIME_BITS,
        }
    }
}

impl MincryptConfig {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, MincryptError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MincryptError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String, MincryptError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), MincryptError> {
        if self.max_keygen_attempts == 0 {
            return Err(MincryptError::InvalidParameters(
                "max_keygen_attempts must be > 0".to_string(),
            ));
        }

        if self.max_field_values == 0 {
            return Err(MincryptError::InvalidParameters(
                "max_field_values must be > 0".to_string(),
            ));
        }

        if self.small_prime_bits > MAX_SMALL_PRIME_BITS {
            return Err(MincryptError::InvalidParameters(format!(
                "small_prime_bits must be <= {}, got {}",
                MAX_SMALL_PRIME_BITS, self.small_prime_bits
            )));
        }

        Ok(())
    }

    /// Builds the session generator: seeded when `seed` is set, OS-seeded otherwise.
    ///
    /// [`StdRng`] is a reproducible general-purpose generator. Nothing here promises
    /// cryptographic-strength randomness, even when seeded from the OS.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}
