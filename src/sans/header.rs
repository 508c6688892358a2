//! Track document headers and structure versions.

use thiserror::Error;
use zerocopy::{
    FromBytes,
    byteorder::big_endian::{F64, I32, I64},
};

use super::{location::Layout, scalar};
use crate::model::TrackStatistics;

/// An unsupported structure version.
#[derive(Debug, Error)]
pub enum VersionError {
    /// The stored version is not a positive integer.
    #[error("Unsupported structure version ({0}).")]
    Unsupported(i32),
}

/// Version selecting the layout of a record family.
///
/// Stored versions above 3 all behave as version 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormatVersion {
    V1 = 1,
    V2 = 2,
    V3 = 3,
    V4 = 4,
}

impl FormatVersion {
    /// Collapse a stored version.
    pub fn new(raw: i32) -> Result<Self, VersionError> {
        Ok(match raw {
            1 => Self::V1,
            2 => Self::V2,
            3 => Self::V3,
            4..=i32::MAX => Self::V4,
            _ => Err(VersionError::Unsupported(raw))?,
        })
    }

    /// Whether a metadata block of this version ends with an extension count.
    pub fn has_metadata_extension(self) -> bool {
        self == Self::V3
    }

    /// Layout of location records in segments of this version.
    pub fn location_layout(self) -> Layout {
        if self == Self::V4 {
            Layout::Tagged
        } else {
            Layout::Fixed
        }
    }
}

/// State token to decode the two-field header opening a track document.
#[derive(Debug)]
pub struct TrackHeader;

impl TrackHeader {
    /// Decode the file version and header size.
    ///
    /// For versions up to 3, the top-level metadata starts `header_size + 8`
    /// bytes into the document. For version 4, the summary block follows
    /// immediately.
    pub fn advance(r: [u8; 8]) -> Result<(FormatVersion, i32), VersionError> {
        #[repr(C)]
        #[derive(FromBytes)]
        struct Header {
            version: I32,
            header_size: I32,
        }

        let Header {
            version,
            header_size,
        } = zerocopy::transmute!(r);

        Ok((FormatVersion::new(version.get())?, header_size.get()))
    }
}

/// Offset of the statistics block in documents up to version 3.
pub const STATISTICS_OFFSET: u64 = 8;
/// Size of the statistics block. Shorter headers leave it out.
pub const STATISTICS_SIZE: u64 = 60;

/// Decode the statistics block of a document up to version 3.
pub fn statistics(r: [u8; 60]) -> TrackStatistics {
    #[repr(C)]
    #[derive(FromBytes)]
    struct Statistics {
        locations: I32,
        segments: I32,
        waypoints: I32,
        first_longitude: [u8; 4],
        first_latitude: [u8; 4],
        first_time: [u8; 8],
        length: F64,
        length_3d: F64,
        elevation_gain: F64,
        duration: I64,
    }

    let Statistics {
        locations,
        segments,
        waypoints,
        first_longitude,
        first_latitude,
        first_time,
        length,
        length_3d,
        elevation_gain,
        duration,
    } = zerocopy::transmute!(r);

    TrackStatistics {
        locations: locations.get(),
        segments: segments.get(),
        waypoints: waypoints.get(),
        first_longitude: scalar::coordinate(first_longitude),
        first_latitude: scalar::coordinate(first_latitude),
        first_time: scalar::timestamp(first_time),
        length: length.get(),
        length_3d: length_3d.get(),
        elevation_gain: elevation_gain.get(),
        duration: duration.get(),
    }
}
