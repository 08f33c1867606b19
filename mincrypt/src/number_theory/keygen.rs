use crate::errors::MincryptError;

use super::helper::gcd;
use super::math::private_exponent;
use super::primes::{Nearest, nearest_prime};

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use serde::{Deserialize, Serialize};

/// Smallest modulus size that still leaves room for a public exponent.
pub const MIN_KEY_BITS: u32 = 8;
pub const MAX_KEY_BITS: u32 = u64::BITS;

/// Default retry ceiling for [`generate_key_material`].
pub const DEFAULT_MAX_KEYGEN_ATTEMPTS: usize = 64;

/// How the modulus bits are split between `p` and `q`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Approach {
    /// `p` and `q` each take half of the bits.
    Symmetric,
    /// `p` takes three eighths, `q` the rest.
    Asymmetric,
}

impl Approach {
    /// Returns `(p_bits, q_bits)` for a modulus of `bits` bits.
    pub fn split(self, bits: u32) -> (u32, u32) {
        let p_bits = match self {
            Approach::Symmetric => bits / 2,
            Approach::Asymmetric => bits / 2 - bits / 8,
        };

        (p_bits, bits - p_bits)
    }
}

/// RSA-style key material: private primes `p`, `q`, exponents `e`, `d` and modulus `n`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct KeyMaterial {
    pub p: u64,
    pub q: u64,
    pub e: u64,
    pub d: u64,
    pub n: u64,
}

impl KeyMaterial {
    pub fn phi(&self) -> u64 {
        (self.p - 1) * (self.q - 1)
    }
}

/// Deterministic key search seeded from `seed`; see [`generate_key_material_with`].
pub fn generate_key_material(
    seed: u64,
    bits: u32,
    approach: Approach,
) -> Result<KeyMaterial, MincryptError> {
    let mut rng = StdRng::seed_from_u64(seed);
    generate_key_material_with(&mut rng, bits, approach, DEFAULT_MAX_KEYGEN_ATTEMPTS)
}

/// Searches for primes `p != q` sized by `approach`, a public exponent `e` coprime to
/// `phi(n)`, and the matching private exponent `d`.
///
/// Every failed candidate (prime outside its bit range, `p == q`, no inverse for `e`)
/// costs one attempt.
///
/// # Errors
///
/// * `InvalidParameters` if `bits` is outside `[MIN_KEY_BITS, MAX_KEY_BITS]`.
/// * `KeyGenExhausted` once `max_attempts` candidates have failed.
pub fn generate_key_material_with(
    rng: &mut impl Rng,
    bits: u32,
    approach: Approach,
    max_attempts: usize,
) -> Result<KeyMaterial, MincryptError> {
    if !(MIN_KEY_BITS..=MAX_KEY_BITS).contains(&bits) {
        return Err(MincryptError::InvalidParameters(format!(
            "key size must be within {}..={} bits, got {}",
            MIN_KEY_BITS, MAX_KEY_BITS, bits
        )));
    }

    let (p_bits, q_bits) = approach.split(bits);

    for attempt in 1..=max_attempts {
        let Some(p) = random_prime_of_bits(rng, p_bits) else {
            continue;
        };
        let Some(q) = random_prime_of_bits(rng, q_bits) else {
            continue;
        };
        if p == q {
            tracing::debug!(attempt, p, "p == q, retrying");
            continue;
        }

        let phi = (p - 1) * (q - 1);
        let e = pick_public_exponent(rng, phi);

        match private_exponent(p, q, e) {
            Ok((d, n)) => {
                tracing::debug!(attempt, bits, n, "key material found");
                return Ok(KeyMaterial { p, q, e, d, n });
            }
            Err(MincryptError::NoInverse(reason)) => {
                tracing::debug!(attempt, p, q, e, %reason, "no private exponent, retrying");
            }
            Err(err) => return Err(err),
        }
    }

    tracing::warn!(bits, max_attempts, "key search exhausted");
    Err(MincryptError::KeyGenExhausted {
        attempts: max_attempts,
    })
}

/// A random prime with exactly `bits` bits, or `None` if the nearest prime to the drawn
/// candidate falls outside the bit range on both sides.
pub(crate) fn random_prime_of_bits(rng: &mut impl Rng, bits: u32) -> Option<u64> {
    let low = 1u64 << (bits - 1);
    let high = if bits == u64::BITS {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    };

    let candidate = rng.random_range(low..=high);

    if let Ok(prime) = nearest_prime(candidate, Nearest::Bigger) {
        if prime <= high {
            return Some(prime);
        }
    }

    match nearest_prime(candidate, Nearest::Smaller) {
        Ok(prime) if prime >= low => Some(prime),
        _ => None,
    }
}

/// An odd exponent in `[3, phi)`, preferring one coprime to `phi`.
///
/// When the scan finds nothing coprime the raw candidate is returned and the caller's
/// inverse step reports `NoInverse`.
fn pick_public_exponent(rng: &mut impl Rng, phi: u64) -> u64 {
    if phi <= 3 {
        return 3;
    }

    let start = rng.random_range(3..phi) | 1;
    let coprime = (start..phi).step_by(2).take(64).find(|&e| gcd(e, phi) == 1);

    coprime.unwrap_or(start)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::number_theory::{bit_length, is_prime};

    #[test]
    fn test_split() {
        assert_eq!(Approach::Symmetric.split(64), (32, 32));
        assert_eq!(Approach::Symmetric.split(9), (4, 5));
        assert_eq!(Approach::Asymmetric.split(64), (24, 40));
        assert_eq!(Approach::Asymmetric.split(8), (3, 5));
    }

    #[test]
    fn test_key_material_is_consistent() -> Result<(), MincryptError> {
        for bits in [8u32, 16, 24, 32, 48, 64] {
            for approach in [Approach::Symmetric, Approach::Asymmetric] {
                let km = generate_key_material(7, bits, approach)?;
                assert!(is_prime(km.p) && is_prime(km.q));
                assert_ne!(km.p, km.q);
                assert_eq!(km.n, km.p * km.q);
                let (p_bits, q_bits) = approach.split(bits);
                assert_eq!(bit_length(km.p), p_bits);
                assert_eq!(bit_length(km.q), q_bits);
                assert_eq!((km.d as u128 * km.e as u128) % km.phi() as u128, 1);
            }
        }
        Ok(())
    }

    #[test]
    fn test_same_seed_same_keys() -> Result<(), MincryptError> {
        let a = generate_key_material(1234, 32, Approach::Symmetric)?;
        let b = generate_key_material(1234, 32, Approach::Symmetric)?;
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn test_rejects_bad_sizes() {
        assert!(generate_key_material(1, 4, Approach::Symmetric).is_err());
        assert!(generate_key_material(1, 65, Approach::Symmetric).is_err());
    }

    #[test]
    fn test_zero_attempts_is_exhausted() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = generate_key_material_with(&mut rng, 16, Approach::Symmetric, 0);
        assert!(matches!(result, Err(MincryptError::KeyGenExhausted { attempts: 0 })));
    }

    #[test]
    fn test_failed_attempts_are_retried() -> Result<(), MincryptError> {
        // 8-bit symmetric keys draw p and q from {11, 13}, so p == q is common
        let mut found = 0;
        let mut exhausted = 0;

        for seed in 0..200u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            match generate_key_material_with(&mut rng, 8, Approach::Symmetric, 1) {
                Ok(km) => {
                    assert_ne!(km.p, km.q);
                    found += 1;
                }
                Err(MincryptError::KeyGenExhausted { attempts: 1 }) => exhausted += 1,
                Err(err) => return Err(err),
            }
        }
        assert!(found > 0, "no single attempt succeeded");
        assert!(exhausted > 0, "no single attempt failed");

        for seed in 0..200u64 {
            let km = generate_key_material(seed, 8, Approach::Symmetric)?;
            assert_eq!([km.p.min(km.q), km.p.max(km.q)], [11, 13]);
            assert_eq!(km.e as u128 * km.d as u128 % km.phi() as u128, 1);
        }
        Ok(())
    }
}
