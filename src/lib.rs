#![no_std]

//! A decoder for AlpineQuest track (`.trk`) and landmark archive (`.ldk`)
//! files.
//!
//! Carabiner reads the versioned, big-endian binary layouts used by
//! AlpineQuest into a plain document model: track metadata, waypoints and
//! segments of locations. Archives are walked as a tree of nodes, and every
//! track embedded in them is decoded into its own document.
//!
//! Most users should begin with [`avec::decode_file`], or with the track and
//! archive decoders in the [`avec`] module when the byte source is not a file
//! on disk. The fixed-width building blocks of the format are exposed in the
//! [`sans`] module for applications that drive their own I/O.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `derive`: enable the metadata derive macro (default).
//! - `std`: enable reader-based decoders (default).
//! - `gpx`: enable projection of decoded documents to GPX.
//! - `cli`: build the `carabiner` converter binary.

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod avec;
#[cfg(feature = "gpx")]
pub mod gpx;
pub mod model;
pub mod sans;
