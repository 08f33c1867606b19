//! # AKD Module
//!
//! File-mediated multi-party Diffie-Hellman-like key agreement: per-party keypairs
//! under shared [`DhCommon`](crate::dh::DhCommon) parameters, their stream format and
//! the step driver that moves a party through the protocol.

pub mod codec;
pub mod flags;
pub mod keypair;
pub mod process;

pub use codec::{
    count_elements, count_file_elements, read_file, read_key_material, write_file,
    write_key_material,
};
pub use flags::{Direction, FieldMask};
pub use keypair::{AkdKeyPair, RandomValues, generate_random_values};
pub use process::{
    AkdOperation, AkdParams, AkdProcessData, FileSetSnapshot, FileSnapshot, KeyFiles,
    process_step,
};
