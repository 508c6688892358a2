//! States processing location records.
//!
//! Locations come in two incompatible layouts. Up to structure version 3 a
//! record has a fixed sequence of fields, with accuracy and pressure present
//! only when the announced record size leaves room for them. From version 4
//! each field after the coordinates is introduced by a one-byte tag, and the
//! record size is a budget consumed tag by tag.

use either::Either::{self, Left, Right};
use thiserror::Error;
use zerocopy::{FromBytes, byteorder::big_endian::I32};

/// An error advancing over a location record.
#[derive(Debug, Error)]
pub enum LocationError {
    /// Tag outside `e`, `t`, `a`, `p`. The width of its field is unknown, so
    /// decoding cannot continue.
    #[error("Unknown location field ({0:#04x}).")]
    UnknownField(u8),
}

/// Layout of a location record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Fixed field order, optional trailing fields selected by record size.
    Fixed,
    /// Tagged fields consuming the record size as a budget.
    Tagged,
}

/// State token to decode the prefix shared by both layouts.
#[derive(Debug)]
pub struct LocationPrefix(Layout);

impl LocationPrefix {
    pub fn new(layout: Layout) -> Self {
        Self(layout)
    }

    /// Transition to another state by decoding the record size, longitude
    /// and latitude.
    ///
    /// Returns the latitude and longitude in degrees, and a successor state
    /// token for the remaining fields. Tagged records with no budget left
    /// after the coordinates have no successor.
    pub fn advance(
        self,
        r: [u8; 12],
    ) -> ((f64, f64), Either<FixedFields, Option<TaggedField>>) {
        #[repr(C)]
        #[derive(FromBytes)]
        struct Prefix {
            size: I32,
            longitude: [u8; 4],
            latitude: [u8; 4],
        }

        let Prefix {
            size,
            longitude,
            latitude,
        } = zerocopy::transmute!(r);

        let position = (
            super::scalar::coordinate(latitude),
            super::scalar::coordinate(longitude),
        );

        let successor = match self.0 {
            Layout::Fixed => Left(FixedFields { size: size.get() }),
            Layout::Tagged => Right(TaggedField::new(size.get().saturating_sub(8))),
        };

        (position, successor)
    }
}

/// State token to decode the height and timestamp of a fixed-layout record.
#[derive(Debug)]
pub struct FixedFields {
    size: i32,
}

impl FixedFields {
    /// Transition to another state by decoding the height and timestamp.
    ///
    /// Returns the height, the timestamp, and which trailing fields follow.
    pub fn advance(self, r: [u8; 12]) -> (Option<f64>, f64, Trailing) {
        let [h0, h1, h2, h3, t @ ..] = r;

        let trailing = Trailing {
            accuracy: self.size > 20,
            pressure: self.size > 24,
        };

        (
            super::scalar::height([h0, h1, h2, h3]),
            super::scalar::timestamp(t),
            trailing,
        )
    }
}

/// Trailing fields of a fixed-layout record, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trailing {
    pub accuracy: bool,
    pub pressure: bool,
}

/// State token to decode the next tag of a tagged record.
#[derive(Debug)]
pub struct TaggedField {
    remaining: i32,
}

impl TaggedField {
    /// Start a tagged sequence with a byte budget, if any remains.
    fn new(remaining: i32) -> Option<Self> {
        if remaining > 0 {
            Some(Self { remaining })
        } else {
            None
        }
    }

    /// Transition to another state by decoding a field tag.
    ///
    /// Returns the field announced by the tag, whose value the caller reads
    /// next, and a successor state token if the budget is not yet spent.
    pub fn advance(self, r: [u8; 1]) -> Result<(Tag, Option<TaggedField>), LocationError> {
        let tag = match r[0] {
            b'e' => Tag::Elevation,
            b't' => Tag::Time,
            b'a' => Tag::Accuracy,
            b'p' => Tag::Pressure,
            other => Err(LocationError::UnknownField(other))?,
        };

        Ok((tag, Self::new(self.remaining - tag.width())))
    }
}

/// A tagged location field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// `e`: height, as [`super::scalar::height`].
    Elevation,
    /// `t`: timestamp, as [`super::scalar::timestamp`].
    Time,
    /// `a`: accuracy, as [`super::scalar::accuracy`].
    Accuracy,
    /// `p`: pressure, as [`super::scalar::pressure`].
    Pressure,
}

impl Tag {
    /// Bytes consumed from the budget, including the tag itself.
    pub const fn width(self) -> i32 {
        match self {
            Self::Time => 9,
            Self::Elevation | Self::Accuracy | Self::Pressure => 5,
        }
    }
}
