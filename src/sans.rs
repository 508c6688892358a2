//! I/O-free building blocks of the track and archive formats.
//!
//! Every function in this module consumes a fixed-width array of bytes, read
//! by the caller from the correct position in the document, and returns the
//! decoded value or the layout selected by it. Nothing here performs I/O or
//! allocates.
//!
//! All multi-byte scalars in both formats are big-endian. The single
//! exception is the record kind at the start of an archive data payload (see
//! [`archive::RecordKind`]).
//!
//! Some areas of the decoding process are not represented here and must be
//! carefully written by the caller:
//!
//! - Following pointers. Pointers are absolute offsets into the byte source
//!   holding the structure that contains them.
//!
//! - Reading variable-length values (strings and raw blocks) whose length was
//!   announced by a preceding field.
//!
//! - Guarding against cycles in the archive's node tree and overflow chains.
//!
//! Implementers are recommended to begin by studying the reader-based
//! decoders in the [`crate::avec`] module.

pub mod archive;
pub mod header;
pub mod location;
pub mod metadata;
pub mod scalar;
