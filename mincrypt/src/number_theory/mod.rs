//! # Number Theory Module
//!
//! Primality, prime search, modular arithmetic over `u64` and RSA-style key material search.
//! Everything else in the crate is built on top of this module.

pub mod helper;
pub mod keygen;
pub mod math;
pub mod primes;

pub use helper::{bit_length, extended_gcd, gcd, isqrt};
pub use keygen::{Approach, KeyMaterial, generate_key_material, generate_key_material_with};
pub use math::{Ring, modpow, private_exponent};
pub use primes::{
    Nearest, PrimeSet, factor_to_primes, is_prime, is_prime_since, nearest_prime,
    primes_in_bit_range, primes_in_range,
};
