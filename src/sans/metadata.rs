//! Metadata entry discriminators.

use thiserror::Error;

/// An error decoding a metadata entry.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Negative discriminator outside the defined set.
    #[error("Unrecognized metadata variant ({0}).")]
    UnrecognizedVariant(i32),
}

/// Kind of value stored in a metadata entry, announced by the signed length
/// field following its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// A single byte.
    Bool,
    /// A 64-bit signed integer.
    Long,
    /// A 64-bit float.
    Double,
    /// A block of raw bytes, preceded by its own 32-bit length.
    Bytes,
    /// A UTF-8 string of the given number of bytes.
    String(usize),
}

impl ValueKind {
    /// Select the value kind from its discriminator.
    pub fn advance(r: [u8; 4]) -> Result<Self, MetadataError> {
        let discriminator = i32::from_be_bytes(r);

        Ok(match discriminator {
            -1 => Self::Bool,
            -2 => Self::Long,
            -3 => Self::Double,
            -4 => Self::Bytes,
            0..=i32::MAX => Self::String(discriminator as usize),
            _ => Err(MetadataError::UnrecognizedVariant(discriminator))?,
        })
    }
}
