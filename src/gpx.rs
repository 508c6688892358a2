//! Projection of track documents to GPX.
//!
//! _Requires Cargo feature `gpx`._

use alloc::{
    string::{String, ToString},
    vec,
    vec::Vec,
};
use std::io::Write;

use ::gpx::{Gpx, GpxVersion, Link, Track, TrackSegment, errors::GpxError};
use geo_types::Point;
use time::{OffsetDateTime, macros::format_description};

use crate::model::{Location, TrackDocument};

/// Creator recorded in every GPX document.
pub const CREATOR: &str = concat!("carabiner ", env!("CARGO_PKG_VERSION"));

/// Link recorded in the metadata of every GPX document.
pub const LINK: &str = "https://github.com/jachetto/alp2gpx";

/// Name of a document without a `name` entry or any timed location.
pub const UNTITLED: &str = "Untitled";

/// Build a GPX 1.1 document from a track document.
///
/// Each waypoint becomes a `wpt`, and each segment its own `trk` holding a
/// single `trkseg`. Tracks are named after [`display_name`].
pub fn to_gpx(document: &TrackDocument) -> Gpx {
    let name = display_name(document);

    let waypoints = document
        .waypoints
        .iter()
        .map(|w| {
            let mut point = waypoint(&w.location);
            point.name = w.metadata.name().map(String::from);
            point
        })
        .collect();

    let tracks = document
        .segments
        .iter()
        .map(|s| {
            let mut segment = TrackSegment::default();
            segment.points = s.locations.iter().map(waypoint).collect();

            Track {
                name: Some(name.clone()),
                segments: vec![segment],
                ..Default::default()
            }
        })
        .collect::<Vec<_>>();

    Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(CREATOR.into()),
        metadata: Some(::gpx::Metadata {
            description: Some(name),
            links: vec![Link {
                href: LINK.into(),
                ..Default::default()
            }],
            ..Default::default()
        }),
        waypoints,
        tracks,
        ..Default::default()
    }
}

/// Write a track document as GPX.
pub fn write(document: &TrackDocument, w: impl Write) -> Result<(), GpxError> {
    ::gpx::write(&to_gpx(document), w)
}

fn waypoint(location: &Location) -> ::gpx::Waypoint {
    let mut point = ::gpx::Waypoint::new(Point::new(location.longitude, location.latitude));
    point.elevation = location.elevation;
    point.time = location.time.and_then(date_time).map(Into::into);
    point
}

/// Convert seconds since the Unix epoch, keeping millisecond precision.
fn date_time(seconds: f64) -> Option<OffsetDateTime> {
    let millis = (seconds * 1e3).round() as i128;
    OffsetDateTime::from_unix_timestamp_nanos(millis * 1_000_000).ok()
}

/// Human-readable name of a track document.
///
/// This is the `name` entry of its metadata if non-empty, else the UTC time
/// of its first location as `YYYY-MM-DD HH:MM:SS`, else [`UNTITLED`].
pub fn display_name(document: &TrackDocument) -> String {
    if let Some(name) = document.name() {
        return name.into();
    }

    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

    document
        .start_time()
        .and_then(date_time)
        .and_then(|t| t.format(format).ok())
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Make a display name usable as part of a file name.
///
/// Each of `; : ! * / \ . ,` is replaced with `-`, and surrounding
/// whitespace is trimmed.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ';' | ':' | '!' | '*' | '/' | '\\' | '.' | ',' => '-',
            c => c,
        })
        .collect::<String>()
        .trim()
        .into()
}
