//! Key-material stream format.
//!
//! For each field selected by a [`FieldMask`], in the fixed order
//! `COMMON_P, COMMON_G, PUBLIC, PRIVATE`:
//!
//! ```text
//! 8 bytes          u64 big-endian value count
//! count * 8 bytes  u64 big-endian values
//! ```
//!
//! The common fields always carry exactly one value.

use crate::config::DEFAULT_MAX_FIELD_VALUES;
use crate::errors::MincryptError;

use super::flags::FieldMask;
use super::keypair::AkdKeyPair;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;

const VALUE_SIZE: usize = 8;

fn write_field(writer: &mut impl Write, values: &[u64]) -> Result<usize, MincryptError> {
    writer.write_all(&(values.len() as u64).to_be_bytes())?;
    for value in values {
        writer.write_all(&value.to_be_bytes())?;
    }

    Ok(VALUE_SIZE * (values.len() + 1))
}

fn read_u64(reader: &mut impl Read, what: &str) -> Result<u64, MincryptError> {
    let mut buf = [0u8; VALUE_SIZE];
    reader
        .read_exact(&mut buf)
        .map_err(|e| MincryptError::from_read(e, what))?;
    Ok(u64::from_be_bytes(buf))
}

fn read_field(
    reader: &mut impl Read,
    field: FieldMask,
    max_values: u64,
) -> Result<Vec<u64>, MincryptError> {
    let count = read_u64(reader, &format!("{} count", field))?;
    if count > max_values {
        return Err(MincryptError::FormatError(format!(
            "{} declares {} values, limit is {}",
            field, count, max_values
        )));
    }

    (0..count)
        .map(|_| read_u64(reader, &format!("{} value", field)))
        .collect()
}

/// Serializes the fields of `keypair` selected by `mask`. Returns the number of bytes written.
pub fn write_key_material(
    writer: &mut impl Write,
    keypair: &AkdKeyPair,
    mask: FieldMask,
) -> Result<usize, MincryptError> {
    let mut written = 0;

    for field in mask.fields() {
        written += match field {
            FieldMask::COMMON_P => write_field(writer, &[keypair.common.p])?,
            FieldMask::COMMON_G => write_field(writer, &[keypair.common.g])?,
            FieldMask::PUBLIC => write_field(writer, &keypair.public_values)?,
            _ => write_field(writer, &keypair.private_values)?,
        };
    }

    Ok(written)
}

/// Reads the fields selected by `mask`; unselected components stay at their defaults.
///
/// # Errors
///
/// * `FormatError` on truncation, a common field without exactly one value, or a count
///   above `max_values`.
/// * `IoError` on any other read failure.
pub fn read_key_material(
    reader: &mut impl Read,
    mask: FieldMask,
    max_values: u64,
) -> Result<AkdKeyPair, MincryptError> {
    let mut keypair = AkdKeyPair::default();

    for field in mask.fields() {
        let values = read_field(reader, field, max_values)?;

        match field {
            FieldMask::COMMON_P | FieldMask::COMMON_G => {
                let &[value] = values.as_slice() else {
                    return Err(MincryptError::FormatError(format!(
                        "{} must hold exactly one value, found {}",
                        field,
                        values.len()
                    )));
                };
                if field == FieldMask::COMMON_P {
                    keypair.common.p = value;
                } else {
                    keypair.common.g = value;
                }
            }
            FieldMask::PUBLIC => keypair.public_values = values,
            _ => keypair.private_values = values,
        }
    }

    Ok(keypair)
}

/// Value count of the first field in the stream, without parsing the rest.
pub fn count_elements(reader: &mut impl Read) -> Result<u64, MincryptError> {
    read_u64(reader, "first field count")
}

/// Writes key material to `path`, truncating any existing file. Not atomic.
pub fn write_file(
    path: impl AsRef<Path>,
    keypair: &AkdKeyPair,
    mask: FieldMask,
) -> Result<usize, MincryptError> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    let written = write_key_material(&mut writer, keypair, mask)?;
    writer.flush()?;

    tracing::debug!(path = %path.display(), %mask, written, "wrote key material");
    Ok(written)
}

pub fn read_file(
    path: impl AsRef<Path>,
    mask: FieldMask,
    max_values: u64,
) -> Result<AkdKeyPair, MincryptError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_key_material(&mut reader, mask, max_values)
}

pub fn count_file_elements(path: impl AsRef<Path>) -> Result<u64, MincryptError> {
    let mut reader = BufReader::new(File::open(path)?);
    count_elements(&mut reader)
}

impl AkdKeyPair {
    /// Key material selected by `mask` as standard base64, for text transport.
    pub fn to_base64(&self, mask: FieldMask) -> Result<String, MincryptError> {
        let mut bytes = Vec::new();
        write_key_material(&mut bytes, self, mask)?;
        Ok(STANDARD.encode(bytes))
    }

    pub fn from_base64(text: &str, mask: FieldMask) -> Result<Self, MincryptError> {
        let bytes = STANDARD
            .decode(text.trim())
            .map_err(|e| MincryptError::FormatError(format!("base64 decoding failed: {}", e)))?;
        read_key_material(&mut Cursor::new(bytes), mask, DEFAULT_MAX_FIELD_VALUES)
    }
}
