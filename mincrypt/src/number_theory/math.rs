//! Implementation of ring ops using modular arithmetic over `u64`.

use crate::errors::MincryptError;

use super::extended_gcd;

use serde::{Deserialize, Serialize};

/// Represents a finite ring Z_k using modular arithmetic.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    pub modulus: u64,
}

impl Ring {
    /// Create a new Ring with the given modulus.
    ///
    /// The modulus must be at least 1; Z_1 is the zero ring.
    pub fn try_with(modulus: u64) -> Result<Self, MincryptError> {
        if modulus == 0 {
            return Err(MincryptError::InvalidModulus(
                "Modulus must be at least 1, got 0".to_string(),
            ));
        }

        Ok(Ring { modulus })
    }

    /// Returns the modulus of the ring.
    ///
    /// # Example
    ///
    /// ```
    /// # use mincrypt::number_theory::Ring;
    /// let ring = Ring::try_with(13).unwrap();
    /// assert_eq!(ring.modulus(), 13);
    /// ```
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    pub fn normalize(&self, value: u64) -> u64 {
        value % self.modulus
    }

    /// Computes `(a * b) mod modulus`.
    ///
    /// Uses `u128` internally to prevent overflow during multiplication before the modulo
    /// operation.
    ///
    /// # Example
    ///
    /// ```
    /// # use mincrypt::number_theory::Ring;
    /// let ring = Ring::try_with(u64::MAX).unwrap();
    /// assert_eq!(ring.mul(u64::MAX - 1, 2), u64::MAX - 2);
    /// ```
    pub fn mul(&self, a: u64, b: u64) -> u64 {
        ((a as u128 * b as u128) % self.modulus as u128) as u64
    }

    /// Computes `base^exponent mod modulus` by repeated squaring.
    ///
    /// # Example
    ///
    /// ```
    /// # use mincrypt::number_theory::Ring;
    /// let ring = Ring::try_with(497).unwrap();
    /// assert_eq!(ring.pow(4, 13), 445);
    /// assert_eq!(ring.pow(4, 0), 1);
    /// ```
    pub fn pow(&self, base: u64, exponent: u64) -> u64 {
        let mut result = self.normalize(1);
        let mut base = self.normalize(base);
        let mut exponent = exponent;

        while exponent > 0 {
            if exponent & 1 == 1 {
                result = self.mul(result, base);
            }
            base = self.mul(base, base);
            exponent >>= 1;
        }

        result
    }

    /// Computes the modular multiplicative inverse `a^-1 mod modulus`.
    ///
    /// The inverse exists if and only if `gcd(a, modulus) == 1`.
    /// Uses the Extended Euclidean Algorithm.
    ///
    /// # Errors
    ///
    /// Returns `MincryptError::NoInverse` if the inverse does not exist
    /// (i.e., `gcd(a, modulus) != 1`).
    ///
    /// # Example
    ///
    /// ```
    /// # use mincrypt::number_theory::Ring;
    /// let ring = Ring::try_with(10).unwrap();
    /// assert_eq!(ring.inv(3).unwrap(), 7); // 3 * 7 = 21 = 1 mod 10
    /// assert!(ring.inv(2).is_err()); // gcd(2, 10) = 2
    /// assert!(ring.inv(0).is_err());
    /// ```
    pub fn inv(&self, a: u64) -> Result<u64, MincryptError> {
        let a_norm = self.normalize(a);
        let (g, x, _) = extended_gcd(a_norm as i128, self.modulus as i128);
        if g != 1 || self.modulus == 1 {
            return Err(MincryptError::NoInverse(format!(
                "Modular inverse does not exist for {} mod {} (gcd={})",
                a_norm, self.modulus, g
            )));
        }

        Ok(x.rem_euclid(self.modulus as i128) as u64)
    }
}

/// Modular exponentiation `base^exponent mod modulus`.
///
/// `modpow(b, 0, m)` is `1 % m`, so a modulus of 1 always yields 0.
///
/// # Errors
///
/// `InvalidModulus` if `modulus` is zero.
pub fn modpow(base: u64, exponent: u64, modulus: u64) -> Result<u64, MincryptError> {
    Ok(Ring::try_with(modulus)?.pow(base, exponent))
}

/// Computes `n = p * q` and `d = e^-1 mod (p - 1)(q - 1)`.
///
/// Returns `(d, n)`.
///
/// # Errors
///
/// * `NoInverse` when `gcd(e, phi(n)) != 1`.
/// * `InvalidParameters` when `p * q` overflows or `phi(n) < 2`.
pub fn private_exponent(p: u64, q: u64, e: u64) -> Result<(u64, u64), MincryptError> {
    if p < 2 || q < 2 {
        return Err(MincryptError::InvalidParameters(format!(
            "p and q must be at least 2, got p={} q={}",
            p, q
        )));
    }

    let n = p.checked_mul(q).ok_or_else(|| {
        MincryptError::InvalidParameters(format!("p * q overflows u64 (p={}, q={})", p, q))
    })?;

    let phi = (p - 1) * (q - 1);
    if phi < 2 {
        return Err(MincryptError::InvalidParameters(format!(
            "phi(n) must be at least 2, got {}",
            phi
        )));
    }

    let d = Ring::try_with(phi)?.inv(e)?;

    Ok((d, n))
}
