//! Decoded documents.
//!
//! Values here are plain data, built by the decoders in [`crate::avec`] and
//! owned by the caller. Nothing refers back to the byte source.

use alloc::{string::String, vec::Vec};
use core::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};

use crate::{
    avec::FromMetadata,
    sans::{archive::RecordKind, header::FormatVersion},
};

/// A metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Long(i64),
    Double(f64),
    /// Raw bytes, rendered as base64 by [`Display`](fmt::Display).
    Bytes(Vec<u8>),
    String(String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Long(x) => Some(*x),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(x) => write!(f, "{x}"),
            Self::Long(x) => write!(f, "{x}"),
            Self::Double(x) => write!(f, "{x}"),
            Self::Bytes(x) => f.write_str(&BASE64_STANDARD.encode(x)),
            Self::String(x) => f.write_str(x),
        }
    }
}

/// Ordered key/value pairs.
///
/// Keys keep the order in which they were first read. A repeated key
/// replaces the earlier value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    entries: Vec<(String, Value)>,
}

impl Metadata {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key.into(), value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `name` entry, if it holds a non-empty string.
    pub fn name(&self) -> Option<&str> {
        self.get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Replay every entry into a receiver.
    pub fn publish(&self, o: &mut impl FromMetadata) {
        for (key, value) in &self.entries {
            match value {
                Value::Bool(x) => o.add_bool(key, *x),
                Value::Long(x) => o.add_i64(key, *x),
                Value::Double(x) => o.add_f64(key, *x),
                Value::Bytes(x) => o.add_bytes(key, x.clone()),
                Value::String(x) => o.add_string(key, x.clone()),
            }
        }
    }

    /// Collect entries into a fresh receiver, such as a struct deriving
    /// [`FromMetadata`](macro@crate::avec::FromMetadata).
    pub fn extract<T: FromMetadata + Default>(&self) -> T {
        let mut o = T::default();
        self.publish(&mut o);
        o
    }
}

impl FromMetadata for Metadata {
    fn add_bool(&mut self, key: &str, value: bool) {
        self.insert(key, Value::Bool(value));
    }
    fn add_i64(&mut self, key: &str, value: i64) {
        self.insert(key, Value::Long(value));
    }
    fn add_f64(&mut self, key: &str, value: f64) {
        self.insert(key, Value::Double(value));
    }
    fn add_bytes(&mut self, key: &str, value: Vec<u8>) {
        self.insert(key, Value::Bytes(value));
    }
    fn add_string(&mut self, key: &str, value: String) {
        self.insert(key, Value::String(value));
    }
}

/// A recorded position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    /// Degrees.
    pub latitude: f64,
    /// Degrees.
    pub longitude: f64,
    /// Meters.
    pub elevation: Option<f64>,
    /// Seconds since the Unix epoch, with millisecond precision.
    pub time: Option<f64>,
    /// Meters.
    pub accuracy: Option<i32>,
    /// Millibars.
    pub pressure: Option<f64>,
}

/// A path of locations in recording order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segment {
    /// Empty before structure version 3.
    pub metadata: Metadata,
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub metadata: Metadata,
    pub location: Location,
}

/// Summary values stored in the header of documents up to version 3.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackStatistics {
    pub locations: i32,
    pub segments: i32,
    pub waypoints: i32,
    pub first_longitude: f64,
    pub first_latitude: f64,
    /// Seconds since the Unix epoch.
    pub first_time: f64,
    /// Meters.
    pub length: f64,
    /// Meters, including elevation changes.
    pub length_3d: f64,
    /// Meters.
    pub elevation_gain: f64,
    /// Seconds.
    pub duration: i64,
}

/// Summary of a track document, whose form depends on its version.
#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    /// Fixed header fields, up to version 3. `None` when the header is too
    /// short to hold them.
    Header(Option<TrackStatistics>),
    /// A metadata block, from version 4.
    Metadata(Metadata),
}

/// A decoded `.trk` document.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackDocument {
    pub version: FormatVersion,
    pub summary: Summary,
    pub metadata: Metadata,
    pub waypoints: Vec<Waypoint>,
    pub segments: Vec<Segment>,
}

#[cfg_attr(feature = "derive", derive(carabiner_derive::FromMetadata))]
#[derive(Debug, Default)]
struct SummaryTimes {
    #[cfg_attr(feature = "derive", entry("dte"))]
    first_time: Option<i64>,
}

#[cfg(not(feature = "derive"))]
impl FromMetadata for SummaryTimes {
    fn add_i64(&mut self, key: &str, value: i64) {
        if key == "dte" {
            self.first_time = Some(value);
        }
    }
}

impl TrackDocument {
    /// The `name` entry of the top-level metadata.
    pub fn name(&self) -> Option<&str> {
        self.metadata.name()
    }

    /// Time of the first location, in seconds since the Unix epoch, as
    /// recorded in the document summary.
    ///
    /// Up to version 3 this is a header field. From version 4 it is the
    /// `dte` summary entry, in milliseconds.
    pub fn time_of_first_location(&self) -> Option<f64> {
        match &self.summary {
            Summary::Header(statistics) => statistics.map(|s| s.first_time),
            Summary::Metadata(summary) => summary
                .extract::<SummaryTimes>()
                .first_time
                .map(|t| t as f64 * 1e-3),
        }
    }

    /// Time of the first location, from the summary, or else from the first
    /// timed location of the first segment, or else of the first waypoint.
    pub fn start_time(&self) -> Option<f64> {
        self.time_of_first_location()
            .or_else(|| {
                self.segments
                    .first()
                    .and_then(|s| s.locations.iter().find_map(|l| l.time))
            })
            .or_else(|| self.waypoints.first().and_then(|w| w.location.time))
    }
}

/// A decoded `.ldk` archive.
#[derive(Debug, Clone, PartialEq)]
pub struct Archive {
    /// Application-specific magic number.
    pub magic: i32,
    pub version: i32,
    pub root: Node,
    /// Track documents embedded in data entries, in walk order.
    pub tracks: Vec<NestedTrack>,
    /// Parts of the archive passed over without decoding.
    pub skipped: Vec<Skipped>,
}

/// A node of an archive's tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub offset: u64,
    /// Identifier given by the parent's entries table. `None` for the root.
    pub id: Option<i32>,
    /// `/` for the root, otherwise a non-empty `name` entry followed by `/`,
    /// or the identifier as eight hexadecimal digits.
    pub path: String,
    pub metadata: Metadata,
    pub children: Vec<Node>,
    pub entries: Vec<DataEntry>,
}

/// A leaf of an archive's tree, referring to a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DataEntry {
    pub offset: u64,
    pub id: i32,
    /// Path of the owning node.
    pub path: String,
    /// `None` when the payload is too short to hold a kind.
    pub kind: Option<RecordKind>,
}

/// A track document embedded in an archive.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedTrack {
    /// Path of the node owning the data entry.
    pub path: String,
    /// Identifier of the data entry.
    pub id: i32,
    pub document: TrackDocument,
}

/// Part of an archive passed over without decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Skipped {
    /// Entries table of the node at `node` has an unknown layout. The node
    /// is kept without children or data.
    Entries { node: u64, magic: i32 },
    /// Payload of the data entry at `entry` is not a track.
    Record { entry: u64, kind: RecordKind },
    /// Payload of the data entry at `entry` is too short to hold a kind.
    Empty { entry: u64 },
}
