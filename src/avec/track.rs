//! Track document decoder.
//!
//! _Requires Cargo feature `std`._

use alloc::vec::Vec;
use std::io::{Cursor, Read, Seek, SeekFrom};

use either::Either::{Left, Right};
use tracing::debug;

use crate::{
    model::{Location, Metadata, Segment, Summary, TrackDocument, TrackStatistics, Waypoint},
    sans::{
        header::{self, FormatVersion, TrackHeader},
        location::{Layout, LocationPrefix, Tag},
        scalar::{self, count},
    },
};

use super::{
    metadata,
    reader::{Error, Primitives, length, take},
};

/// Decode a track document from a byte source.
///
/// The document is read from the start of the source, whatever the position
/// of its cursor. This method is also re-exported as
/// `carabiner::avec::decode_track`.
pub fn decode<R: Read + Seek>(r: &mut R) -> Result<TrackDocument, Error> {
    r.seek(SeekFrom::Start(0))?;
    let (version, header_size) = TrackHeader::advance(take(r)?)?;

    debug!(?version, header_size, "decoding track document");

    let (summary, metadata) = if version <= FormatVersion::V3 {
        let statistics = match u64::try_from(header_size) {
            Ok(size) if size >= header::STATISTICS_SIZE => Some(read_statistics(r)?),
            _ => None,
        };

        r.seek(SeekFrom::Start(length(i64::from(header_size) + 8)? as u64))?;
        let metadata = metadata::read(r, version)?;

        (Summary::Header(statistics), metadata)
    } else {
        r.seek(SeekFrom::Start(8))?;
        let summary = metadata::read(r, version)?;
        skip_placeholders(r)?;

        let metadata = metadata::read(r, version)?;
        skip_placeholders(r)?;

        (Summary::Metadata(summary), metadata)
    };

    let waypoints = read_waypoints(r, version)?;
    let segments = read_segments(r, version)?;

    debug!(
        waypoints = waypoints.len(),
        segments = segments.len(),
        "decoded track document"
    );

    Ok(TrackDocument {
        version,
        summary,
        metadata,
        waypoints,
        segments,
    })
}

/// Decode a track document held in memory.
pub fn decode_slice(r: &[u8]) -> Result<TrackDocument, Error> {
    decode(&mut Cursor::new(r))
}

/// Read the statistics block of a document up to version 3.
///
/// This is a random-access read, independent of the rest of the document.
/// The cursor is left after the block.
pub fn read_statistics<R: Read + Seek>(r: &mut R) -> Result<TrackStatistics, Error> {
    r.seek(SeekFrom::Start(header::STATISTICS_OFFSET))?;

    Ok(header::statistics(take(r)?))
}

/// Two integers of unknown meaning, present in version 4 documents.
fn skip_placeholders(r: &mut impl Read) -> Result<(), Error> {
    let _ = take::<8, _>(r)?;

    Ok(())
}

/// Decode a location record at the cursor.
pub fn read_location(r: &mut impl Read, layout: Layout) -> Result<Location, Error> {
    let ((latitude, longitude), successor) = LocationPrefix::new(layout).advance(take(r)?);

    let mut location = Location {
        latitude,
        longitude,
        elevation: None,
        time: None,
        accuracy: None,
        pressure: None,
    };

    match successor {
        Left(state) => {
            let (elevation, time, trailing) = state.advance(take(r)?);
            location.elevation = elevation;
            location.time = Some(time);

            if trailing.accuracy {
                location.accuracy = Some(scalar::accuracy(take(r)?));
            }
            if trailing.pressure {
                location.pressure = scalar::pressure(take(r)?);
            }
        }
        Right(mut state) => {
            while let Some(field) = state {
                let (tag, successor) = field.advance(take(r)?)?;

                match tag {
                    Tag::Elevation => location.elevation = scalar::height(take(r)?),
                    Tag::Time => location.time = Some(scalar::timestamp(take(r)?)),
                    Tag::Accuracy => location.accuracy = Some(scalar::accuracy(take(r)?)),
                    Tag::Pressure => location.pressure = scalar::pressure(take(r)?),
                }

                state = successor;
            }
        }
    }

    Ok(location)
}

/// Decode a segment at the cursor.
pub fn read_segment(r: &mut impl Read, version: FormatVersion) -> Result<Segment, Error> {
    let metadata = if version < FormatVersion::V3 {
        let _ = r.read_i32()?;
        Metadata::default()
    } else {
        let metadata = metadata::read(r, version)?;
        if version == FormatVersion::V4 {
            skip_placeholders(r)?;
        }
        metadata
    };

    let layout = version.location_layout();
    let locations = (0..count(r.read_i32()?.into()))
        .map(|_| read_location(r, layout))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Segment {
        metadata,
        locations,
    })
}

/// Decode a counted sequence of segments at the cursor.
pub fn read_segments(r: &mut impl Read, version: FormatVersion) -> Result<Vec<Segment>, Error> {
    (0..count(r.read_i32()?.into()))
        .map(|_| read_segment(r, version))
        .collect()
}

/// Decode a counted sequence of waypoints at the cursor.
///
/// Waypoint locations always use the fixed layout.
pub fn read_waypoints(r: &mut impl Read, version: FormatVersion) -> Result<Vec<Waypoint>, Error> {
    (0..count(r.read_i32()?.into()))
        .map(|_| -> Result<Waypoint, Error> {
            let metadata = metadata::read(r, version)?;
            let location = read_location(r, Layout::Fixed)?;

            Ok(Waypoint { metadata, location })
        })
        .collect()
}
