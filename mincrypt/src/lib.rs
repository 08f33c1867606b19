//! # minCrypt
//!
//! A minimalist toolkit of small-number cryptography: exact 64-bit number theory,
//! RSA-style block encryption, Diffie-Hellman parameters and the file-mediated
//! multi-party key agreement (AKD).
//!
//! Keys fit in 64-bit integers. Nothing here is meant to be production strength.

pub mod akd;
pub mod config;
pub mod dh;
pub mod errors;
pub mod number_theory;
pub mod rsa;
pub mod session;

pub use config::MincryptConfig;
pub use errors::MincryptError;
pub use session::Session;
