//! Primitive reads from a byte source.
//!
//! _Requires Cargo feature `std`._

use alloc::{
    string::{FromUtf8Error, String},
    vec::Vec,
};
use std::io::{self, Read};

use thiserror::Error;

use crate::sans::{
    archive::ArchiveError, header::VersionError, location::LocationError,
    metadata::MetadataError,
};

/// Errors occurring while decoding from a byte source.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the supplied reader.
    #[error(transparent)]
    Io(io::Error),
    /// Fewer bytes remain than a read requires.
    #[error("Unexpectedly reached the end of the input.")]
    TruncatedInput,
    /// Bytes declared as a string are not valid UTF-8.
    #[error("Invalid string: {0}.")]
    Encoding(#[from] FromUtf8Error),
    /// A length field is negative.
    #[error("Negative length ({0}).")]
    NegativeLength(i64),
    /// Metadata value discriminator outside the defined set.
    #[error("Unrecognized metadata variant ({0}).")]
    UnrecognizedMetadataVariant(i32),
    /// Location field tag outside the defined set.
    #[error("Unknown location field ({0:#04x}).")]
    UnknownLocationField(u8),
    /// Structure version outside the supported range.
    #[error("Unsupported format version ({0}).")]
    UnsupportedFormatVersion(i32),
    /// Archive structure is inconsistent.
    #[error("Corrupt archive: {0}")]
    CorruptArchive(#[from] ArchiveError),
    /// File extension is neither `.trk` nor `.ldk`.
    #[error("Unsupported file type (extension {0:?}).")]
    UnsupportedFileType(Option<String>),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Self::TruncatedInput,
            _ => Self::Io(err),
        }
    }
}

impl From<MetadataError> for Error {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::UnrecognizedVariant(d) => Self::UnrecognizedMetadataVariant(d),
        }
    }
}

impl From<LocationError> for Error {
    fn from(err: LocationError) -> Self {
        match err {
            LocationError::UnknownField(tag) => Self::UnknownLocationField(tag),
        }
    }
}

impl From<VersionError> for Error {
    fn from(err: VersionError) -> Self {
        match err {
            VersionError::Unsupported(v) => Self::UnsupportedFormatVersion(v),
        }
    }
}

/// Take an exact number of bytes from a reader.
pub(crate) fn take<const N: usize, R: Read + ?Sized>(r: &mut R) -> Result<[u8; N], Error> {
    let mut buf = [0; N];
    r.read_exact(&mut buf)?;

    Ok(buf)
}

/// Big-endian scalar reads, advancing the cursor by their width.
///
/// Implemented for every reader. None of these methods validate the position
/// of the cursor: reading past the end fails with [`Error::TruncatedInput`].
pub trait Primitives: Read {
    fn read_i32(&mut self) -> Result<i32, Error> {
        Ok(i32::from_be_bytes(take(self)?))
    }

    fn read_i64(&mut self) -> Result<i64, Error> {
        Ok(i64::from_be_bytes(take(self)?))
    }

    /// An absolute offset into the byte source.
    fn read_pointer(&mut self) -> Result<u64, Error> {
        Ok(u64::from_be_bytes(take(self)?))
    }

    fn read_f64(&mut self) -> Result<f64, Error> {
        Ok(f64::from_be_bytes(take(self)?))
    }

    /// A single byte, true when non-zero.
    fn read_bool(&mut self) -> Result<bool, Error> {
        let [b] = take(self)?;
        Ok(b != 0)
    }

    /// A block of `size` bytes.
    ///
    /// Memory grows with the bytes actually read, so a corrupt size fails
    /// with [`Error::TruncatedInput`] rather than a large allocation.
    fn read_raw(&mut self, size: usize) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        Read::take(&mut *self, size as u64).read_to_end(&mut buf)?;

        if buf.len() != size {
            Err(Error::TruncatedInput)?;
        }

        Ok(buf)
    }

    /// A UTF-8 string of `size` bytes.
    fn read_string(&mut self, size: usize) -> Result<String, Error> {
        Ok(String::from_utf8(self.read_raw(size)?)?)
    }

    /// A block of bytes preceded by a signed 32-bit length.
    fn read_sized_raw(&mut self) -> Result<Vec<u8>, Error> {
        let size = self.read_i32()?;
        self.read_raw(length(size.into())?)
    }
}

impl<R: Read + ?Sized> Primitives for R {}

/// Convert a stored length, rejecting negative values.
pub(crate) fn length(n: i64) -> Result<usize, Error> {
    usize::try_from(n).map_err(|_| Error::NegativeLength(n))
}
