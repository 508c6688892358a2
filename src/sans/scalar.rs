//! Fixed-point scalars.
//!
//! Coordinates, timestamps, heights and pressures are stored as scaled
//! integers. Heights and pressures reserve one raw value meaning "not
//! recorded".

/// Raw height marking an absent value.
pub const HEIGHT_ABSENT: i32 = -999_999_999;

/// Raw pressure marking an absent value.
pub const PRESSURE_ABSENT: i32 = 999_999_999;

macro_rules! scaled {
    ($name:ident, $raw:ident, $scale:expr, $(#[$attr:meta])*) => {
        $(#[$attr])*
        pub fn $name(r: [u8; size_of::<$raw>()]) -> f64 {
            $raw::from_be_bytes(r) as f64 * $scale
        }
    };
    ($name:ident, $raw:ident, $scale:expr, $absent:expr, $(#[$attr:meta])*) => {
        $(#[$attr])*
        pub fn $name(r: [u8; size_of::<$raw>()]) -> Option<f64> {
            let x = $raw::from_be_bytes(r);

            if x != $absent {
                Some(x as f64 * $scale)
            } else {
                None
            }
        }
    };
}

scaled!(coordinate, i32, 1e-7, /** Degrees, with seven decimal digits. */);
scaled!(timestamp, i64, 1e-3, /** Seconds since the Unix epoch, from milliseconds. */);
scaled!(height, i32, 1e-3, HEIGHT_ABSENT, /** Meters, from millimeters. */);
scaled!(pressure, i32, 1e-3, PRESSURE_ABSENT, /** Millibars, from thousandths. */);

/// Horizontal accuracy in meters, stored unscaled.
pub fn accuracy(r: [u8; 4]) -> i32 {
    i32::from_be_bytes(r)
}

/// Convert a stored count. Negative counts are read as zero.
pub fn count(n: i64) -> usize {
    usize::try_from(n).unwrap_or(0)
}
