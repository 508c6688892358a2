//! Convenience interfaces for decoding documents.
//!
//! The functions in this module decode from any seekable byte source: a file,
//! or an in-memory buffer such as [`std::io::Cursor`]. Track documents are
//! decoded by [`decode_track`], archives by [`decode_archive`], and files on
//! disk are dispatched on their extension by [`decode_file`].
//!
//! Metadata blocks are published to the [`FromMetadata`] trait. The decoders
//! collect them into [`Metadata`](crate::model::Metadata), which can in turn
//! be replayed into a typed receiver. See the
//! [`FromMetadata`](macro@FromMetadata) derive macro for details.

use alloc::{string::String, vec::Vec};

#[cfg(feature = "std")]
pub mod archive;
#[cfg(feature = "std")]
pub mod metadata;
#[cfg(feature = "std")]
pub mod reader;
#[cfg(feature = "std")]
pub mod track;

#[cfg(feature = "std")]
pub use archive::{Options, decode as decode_archive};
#[cfg(feature = "std")]
pub use reader::Error;
#[cfg(feature = "std")]
pub use track::decode as decode_track;

/// Derive [`FromMetadata`] for a struct holding a selection of entries.
///
/// _Requires Cargo feature `derive`._
///
/// # Example
///
/// To receive an entry, add the `entry("key")` attribute to an `Option<T>`
/// struct field, where `T` is one of `bool`, `i64`, `f64`, `Vec<u8>` or
/// `String`. Entries of another value type under the same key are ignored.
///
/// ```
/// #[derive(Debug, Default, FromMetadata)]
/// struct Landmark {
///     #[entry("name")]
///     name: Option<String>,
///     #[entry("dte")]
///     created: Option<i64>,
/// }
///
/// let landmark: Landmark = waypoint.metadata.extract();
/// ```
///
/// To receive values into any other type, supply an accumulator closure.
/// Since the value type cannot be inferred, the second argument must be
/// typed.
///
/// ```
/// #[derive(Debug, Default, FromMetadata)]
/// struct Flags {
///     #[entry("visible", |v, x: bool| *v = x)]
///     visible: bool,
/// }
/// ```
#[cfg(feature = "derive")]
pub use carabiner_derive::FromMetadata;

/// Receive the entries of a metadata block.
///
/// Entries are published in file order, each to the method matching its
/// value type. The default implementation of each method ignores received
/// values.
///
/// See the [`FromMetadata`](macro@FromMetadata) derive macro for an automatic
/// implementation of this trait.
#[allow(unused_variables)]
pub trait FromMetadata {
    /// Add a boolean entry.
    fn add_bool(&mut self, key: &str, _: bool) {}
    /// Add a 64-bit integer entry.
    fn add_i64(&mut self, key: &str, _: i64) {}
    /// Add a 64-bit float entry.
    fn add_f64(&mut self, key: &str, _: f64) {}
    /// Add a raw bytes entry.
    fn add_bytes(&mut self, key: &str, _: Vec<u8>) {}
    /// Add a string entry.
    fn add_string(&mut self, key: &str, _: String) {}
}

/// Decode a file, selecting the decoder from its extension.
///
/// `.trk` files are decoded as track documents and `.ldk` files as archives,
/// ignoring case. Other extensions fail with
/// [`Error::UnsupportedFileType`] before the file is opened.
///
/// _Requires Cargo feature `std`._
#[cfg(feature = "std")]
pub fn decode_file(
    path: impl AsRef<std::path::Path>,
    options: &Options,
) -> Result<either::Either<crate::model::TrackDocument, crate::model::Archive>, Error> {
    use either::Either::{Left, Right};
    use std::{fs::File, io::BufReader};

    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("trk") => {
            let mut r = BufReader::new(File::open(path)?);
            Ok(Left(decode_track(&mut r)?))
        }
        Some("ldk") => {
            let mut r = BufReader::new(File::open(path)?);
            Ok(Right(decode_archive(&mut r, options)?))
        }
        _ => Err(Error::UnsupportedFileType(extension)),
    }
}
