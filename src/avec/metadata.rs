//! Metadata block decoder.
//!
//! _Requires Cargo feature `std`._

use std::io::Read;

use crate::{
    model::Metadata,
    sans::{header::FormatVersion, metadata::ValueKind, scalar::count},
};

use super::{
    FromMetadata,
    reader::{Error, Primitives, length, take},
};

/// Decode a metadata block at the cursor, publishing each entry to a
/// receiver in file order.
///
/// Version 3 blocks end with an extension count, which is consumed and
/// ignored.
pub fn decode(
    r: &mut impl Read,
    version: FormatVersion,
    o: &mut impl FromMetadata,
) -> Result<(), Error> {
    let entries = count(r.read_i32()?.into());

    for _ in 0..entries {
        let key_size = r.read_i32()?;
        let key = r.read_string(length(key_size.into())?)?;

        match ValueKind::advance(take(r)?)? {
            ValueKind::Bool => o.add_bool(&key, r.read_bool()?),
            ValueKind::Long => o.add_i64(&key, r.read_i64()?),
            ValueKind::Double => o.add_f64(&key, r.read_f64()?),
            ValueKind::Bytes => o.add_bytes(&key, r.read_sized_raw()?),
            ValueKind::String(size) => o.add_string(&key, r.read_string(size)?),
        }
    }

    if version.has_metadata_extension() {
        let _extensions = r.read_i32()?;
    }

    Ok(())
}

/// Decode a metadata block at the cursor into a [`Metadata`].
pub fn read(r: &mut impl Read, version: FormatVersion) -> Result<Metadata, Error> {
    let mut metadata = Metadata::default();
    decode(r, version, &mut metadata)?;

    Ok(metadata)
}
