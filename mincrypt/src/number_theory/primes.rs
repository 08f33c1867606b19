//! Prime testing and prime search over `u64`.
//!
//! Primality is exact for every `u64`: trial division by a precomputed table of
//! primes below 2^16 settles every `n < 2^32`, and whatever survives the table above
//! that is decided by Miller-Rabin with the first twelve prime bases, which is known
//! to be deterministic for the whole 64-bit range.

use crate::errors::MincryptError;

use super::helper::isqrt;
use super::math::Ring;

use lazy_static::lazy_static;

use serde::{Deserialize, Serialize};

/// Upper bound (exclusive) of the trial-division table.
const SMALL_PRIME_LIMIT: usize = 1 << 16;

const MILLER_RABIN_BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

lazy_static! {
    /// Every prime below 2^16, ascending, built once with the sieve of Eratosthenes.
    static ref SMALL_PRIMES: Vec<u64> = {
        let mut composite = vec![false; SMALL_PRIME_LIMIT];
        let mut primes = Vec::with_capacity(6542);

        for i in 2..SMALL_PRIME_LIMIT {
            if composite[i] {
                continue;
            }
            primes.push(i as u64);

            let mut j = i * i;
            while j < SMALL_PRIME_LIMIT {
                composite[j] = true;
                j += i;
            }
        }

        primes
    };
}

/// Direction of a nearest-prime search.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Nearest {
    /// Closest prime `>= n`.
    Bigger,
    /// Closest prime `<= n`.
    Smaller,
}

/// Result of a prime search.
///
/// Every value is prime, lies in `[start, end]` and the values are ascending.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PrimeSet {
    pub start: u64,
    pub end: u64,
    pub values: Vec<u64>,
}

impl PrimeSet {
    pub fn count(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &u64> {
        self.values.iter()
    }
}

/// Exact primality test.
///
/// # Example
///
/// ```
/// # use mincrypt::number_theory::is_prime;
/// assert!(is_prime(2));
/// assert!(is_prime(4_294_967_291));
/// assert!(!is_prime(4_294_967_297)); // 641 * 6700417
/// assert!(!is_prime(1));
/// ```
pub fn is_prime(n: u64) -> bool {
    is_prime_since(2, n)
}

/// Primality test that may skip divisors below `start`.
///
/// The caller promises `n` has no prime factor below `start` (a resumed search).
/// Under that promise the answer is always the same as [`is_prime`].
pub fn is_prime_since(start: u64, n: u64) -> bool {
    if n < 2 {
        return false;
    }

    for &p in SMALL_PRIMES.iter() {
        if p * p > n {
            return true;
        }
        if p < start {
            continue;
        }
        if n % p == 0 {
            return false;
        }
    }

    miller_rabin(n)
}

/// Strong probable-prime test over all [`MILLER_RABIN_BASES`]; exact for `u64`.
/// Only called for odd `n` beyond the reach of the small-prime table.
fn miller_rabin(n: u64) -> bool {
    let ring = Ring { modulus: n };
    let s = (n - 1).trailing_zeros();
    let d = (n - 1) >> s;

    'witness: for &a in MILLER_RABIN_BASES.iter() {
        let mut x = ring.pow(a, d);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = ring.mul(x, x);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }

    true
}

/// Every prime `p` with `start <= p <= end`, ascending. `start > end` is an empty set.
///
/// # Example
///
/// ```
/// # use mincrypt::number_theory::primes_in_range;
/// let set = primes_in_range(10, 30);
/// assert_eq!(set.values, vec![11, 13, 17, 19, 23, 29]);
/// ```
pub fn primes_in_range(start: u64, end: u64) -> PrimeSet {
    let values = if start > end {
        Vec::new()
    } else {
        (start..=end).filter(|&n| is_prime(n)).collect()
    };

    PrimeSet { start, end, values }
}

/// Primes whose bit length lies in `[start_bits, end_bits]`, i.e.
/// `primes_in_range(2^(start_bits - 1), 2^end_bits - 1)`.
pub fn primes_in_bit_range(start_bits: u32, end_bits: u32) -> Result<PrimeSet, MincryptError> {
    if start_bits == 0 || start_bits > end_bits || end_bits > u64::BITS {
        return Err(MincryptError::InvalidParameters(format!(
            "bit range must satisfy 1 <= start <= end <= 64, got {}..={}",
            start_bits, end_bits
        )));
    }

    let start = 1u64 << (start_bits - 1);
    let end = if end_bits == u64::BITS {
        u64::MAX
    } else {
        (1u64 << end_bits) - 1
    };

    Ok(primes_in_range(start, end))
}

/// Closest prime to `n` in the given direction, `n` itself included.
///
/// # Errors
///
/// `NotFound` when the scan would leave the `u64` range (above the largest 64-bit prime,
/// or below 2).
///
/// # Example
///
/// ```
/// # use mincrypt::number_theory::{nearest_prime, Nearest};
/// assert_eq!(nearest_prime(14, Nearest::Smaller).unwrap(), 13);
/// assert_eq!(nearest_prime(14, Nearest::Bigger).unwrap(), 17);
/// ```
pub fn nearest_prime(n: u64, direction: Nearest) -> Result<u64, MincryptError> {
    let mut candidate = n;

    loop {
        if is_prime(candidate) {
            return Ok(candidate);
        }

        candidate = match direction {
            Nearest::Bigger => candidate.checked_add(1),
            Nearest::Smaller => candidate.checked_sub(1),
        }
        .ok_or(MincryptError::NotFound(n))?;
    }
}

/// Trial divisors in ascending order: the prime table, then every odd number past it.
/// The first divisor of `n` met in this order is always prime.
fn trial_divisors() -> impl Iterator<Item = u64> {
    let after_table = SMALL_PRIMES.last().copied().unwrap_or(1) + 2;
    SMALL_PRIMES
        .iter()
        .copied()
        .chain((after_table..).step_by(2))
}

/// Recovers the two prime factors of a semiprime `n`, smaller one first.
///
/// # Errors
///
/// `NotSemiprime` when `n` is prime, below 4, or has more than two prime factors.
///
/// # Example
///
/// ```
/// # use mincrypt::number_theory::factor_to_primes;
/// assert_eq!(factor_to_primes(15).unwrap().values, vec![3, 5]);
/// assert!(factor_to_primes(17).is_err());
/// ```
pub fn factor_to_primes(n: u64) -> Result<PrimeSet, MincryptError> {
    if n < 4 || is_prime(n) {
        return Err(MincryptError::NotSemiprime(n));
    }

    let limit = isqrt(n);
    for d in trial_divisors().take_while(|&d| d <= limit) {
        if n % d != 0 {
            continue;
        }

        let q = n / d;
        if !is_prime(q) {
            return Err(MincryptError::NotSemiprime(n));
        }

        return Ok(PrimeSet {
            start: d,
            end: q,
            values: vec![d, q],
        });
    }

    Err(MincryptError::NotSemiprime(n))
}
