//! States processing archive headers, nodes and data blocks.
//!
//! An archive is a tree of nodes addressed by absolute pointers. Each node
//! points to its metadata and to an entries table listing child nodes and
//! data entries. Data entries point to a payload block, which may continue
//! in a chain of overflow blocks.

use either::Either::{self, Left, Right};
use thiserror::Error;
use zerocopy::{
    FromBytes,
    byteorder::big_endian::{F64, I32, I64, U64},
};

use super::scalar::count;

/// Magic number opening every node.
pub const NODE_MAGIC: i32 = 0x0001_5555;
/// Magic number of an entries table with slot accounting.
pub const LIST_ENTRIES_MAGIC: i32 = 0x0002_5555;
/// Magic number of a compact entries table.
pub const TABLE_ENTRIES_MAGIC: i32 = 0x0004_5555;

/// Distance from a node's metadata pointer to the metadata block itself.
pub const METADATA_OFFSET: u64 = 0x20;
/// Width of an empty slot in an entries table (a pointer and an identifier).
pub const SLOT_WIDTH: u64 = 12;

/// An error in the structure of an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Node does not start with [`NODE_MAGIC`].
    #[error("Incorrect node magic number ({0:#010x}).")]
    NodeMagic(i32),
    /// Node reached again below itself. A node shared by several parents
    /// is not a cycle, and is decoded under each of them.
    #[error("Node at {0:#x} is its own ancestor.")]
    NodeCycle(u64),
    /// Node tree nested deeper than permitted.
    #[error("Node tree deeper than {0} levels.")]
    TooDeep(usize),
    /// Overflow block reached twice while following a chain.
    #[error("Overflow chain revisits block at {0:#x}.")]
    ChainCycle(u64),
    /// Overflow chain longer than permitted.
    #[error("Overflow chain longer than {0} blocks.")]
    ChainTooLong(usize),
}

/// Top-level archive header.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveHeader {
    /// Application-specific magic number.
    pub magic: i32,
    pub version: i32,
    /// Pointer to the root node.
    pub root: u64,
}

impl ArchiveHeader {
    /// Decode the archive header, ignoring its four reserved doubles.
    pub fn advance(r: [u8; 48]) -> Self {
        #[repr(C)]
        #[derive(FromBytes)]
        struct Header {
            magic: I32,
            version: I32,
            root: U64,
            _reserved: [F64; 4],
        }

        let Header {
            magic,
            version,
            root,
            ..
        } = zerocopy::transmute!(r);

        Self {
            magic: magic.get(),
            version: version.get(),
            root: root.get(),
        }
    }
}

/// Pointers held by a node header.
#[derive(Debug, Clone, Copy)]
pub struct NodeHeader {
    /// Pointer from which the node metadata is found, see [`METADATA_OFFSET`].
    pub metadata: u64,
    /// Pointer to the node's entries table.
    pub entries: u64,
}

impl NodeHeader {
    /// Decode a node header, checking its magic number. Flags are ignored.
    pub fn advance(r: [u8; 24]) -> Result<Self, ArchiveError> {
        #[repr(C)]
        #[derive(FromBytes)]
        struct Header {
            magic: I32,
            _flags: I32,
            metadata: U64,
            entries: U64,
        }

        let Header {
            magic,
            metadata,
            entries,
            ..
        } = zerocopy::transmute!(r);

        if magic.get() != NODE_MAGIC {
            Err(ArchiveError::NodeMagic(magic.get()))?;
        }

        Ok(Self {
            metadata: metadata.get(),
            entries: entries.get(),
        })
    }
}

/// An entries table in an unrecognized layout.
#[derive(Debug, Error)]
pub enum EntriesError {
    #[error("Unknown entries magic number ({0:#010x}).")]
    UnknownMagic(i32),
}

/// State token to decode the magic number of an entries table.
#[derive(Debug)]
pub struct EntriesHeader;

impl EntriesHeader {
    /// Transition to another state by decoding the magic number selecting
    /// the table layout.
    ///
    /// Returns a successor state token for the layout's counts.
    pub fn advance(r: [u8; 4]) -> Result<Either<ListEntries, TableEntries>, EntriesError> {
        Ok(match i32::from_be_bytes(r) {
            LIST_ENTRIES_MAGIC => Left(ListEntries(())),
            TABLE_ENTRIES_MAGIC => Right(TableEntries(())),
            magic => Err(EntriesError::UnknownMagic(magic))?,
        })
    }
}

/// Number of each kind of slot in an entries table.
///
/// Negative stored counts are read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryCounts {
    pub children: usize,
    pub empty: usize,
    pub data: usize,
}

/// State token to decode the counts of a table with slot accounting.
#[derive(Debug)]
pub struct ListEntries(());

impl ListEntries {
    /// Decode the total, child and data counts, and the unused pointer that
    /// follows them. Slots that are neither children nor data are empty.
    pub fn advance(self, r: [u8; 20]) -> EntryCounts {
        #[repr(C)]
        #[derive(FromBytes)]
        struct Counts {
            total: I32,
            children: I32,
            data: I32,
            _next: U64,
        }

        let Counts {
            total,
            children,
            data,
            ..
        } = zerocopy::transmute!(r);

        let (total, children, data) = (total.get(), children.get(), data.get());
        let empty = i64::from(total) - i64::from(children) - i64::from(data);

        EntryCounts {
            children: count(children.into()),
            empty: count(empty),
            data: count(data.into()),
        }
    }
}

/// State token to decode the counts of a compact table.
#[derive(Debug)]
pub struct TableEntries(());

impl TableEntries {
    /// Decode the child and data counts. Compact tables have no empty slots.
    pub fn advance(self, r: [u8; 8]) -> EntryCounts {
        let [c0, c1, c2, c3, d0, d1, d2, d3] = r;

        EntryCounts {
            children: count(i32::from_be_bytes([c0, c1, c2, c3]).into()),
            empty: 0,
            data: count(i32::from_be_bytes([d0, d1, d2, d3]).into()),
        }
    }
}

/// Decode a table slot: a pointer and an identifying integer.
pub fn entry(r: [u8; 12]) -> (u64, i32) {
    #[repr(C)]
    #[derive(FromBytes)]
    struct Slot {
        pointer: U64,
        id: I32,
    }

    let Slot { pointer, id } = zerocopy::transmute!(r);

    (pointer.get(), id.get())
}

/// Decode the header of a data block.
///
/// Returns the size of the chunk following the header, and the pointer to
/// the first overflow block (zero when there is none).
pub fn data_header(r: [u8; 32]) -> (i64, u64) {
    #[repr(C)]
    #[derive(FromBytes)]
    struct Header {
        _magic: I32,
        _flags: I32,
        _total_size: I64,
        size: I64,
        next: U64,
    }

    let Header { size, next, .. } = zerocopy::transmute!(r);

    (size.get(), next.get())
}

/// Decode the header of an overflow block.
///
/// Returns the size of the chunk following the header, and the pointer to
/// the next overflow block (zero when there is none).
pub fn overflow_header(r: [u8; 20]) -> (i64, u64) {
    #[repr(C)]
    #[derive(FromBytes)]
    struct Header {
        _magic: I32,
        size: I64,
        next: U64,
    }

    let Header { size, next, .. } = zerocopy::transmute!(r);

    (size.get(), next.get())
}

/// Kind of document held by a data payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// 101
    Waypoint,
    /// 102
    Set,
    /// 103
    Route,
    /// 104, the only kind decoded.
    Track,
    /// 105
    Area,
    Unknown(i32),
}

impl RecordKind {
    /// Select the record kind from the first four bytes of a payload, read
    /// little-endian.
    pub fn advance(r: [u8; 4]) -> Self {
        match i32::from_le_bytes(r) {
            101 => Self::Waypoint,
            102 => Self::Set,
            103 => Self::Route,
            104 => Self::Track,
            105 => Self::Area,
            other => Self::Unknown(other),
        }
    }
}

/// Offset of an embedded document within a payload.
///
/// The kind is read as four bytes, but the document starts after the first.
/// With the big-endian version field of a track starting at byte one, the
/// three bytes shared by both fields are zero for every supported version,
/// so the little-endian kind still reads as 104.
pub const EMBEDDED_OFFSET: usize = 1;
