//! Archive tree walker.
//!
//! _Requires Cargo feature `std`._

use alloc::{collections::BTreeSet, format, string::String, vec::Vec};
use std::io::{Read, Seek, SeekFrom};

use either::Either::{Left, Right};
use tracing::{debug, warn};

use crate::{
    model::{Archive, DataEntry, NestedTrack, Node, Skipped},
    sans::{
        archive::{
            self, ArchiveError, ArchiveHeader, EMBEDDED_OFFSET, EntriesError, EntriesHeader,
            METADATA_OFFSET, NodeHeader, RecordKind, SLOT_WIDTH,
        },
        header::FormatVersion,
    },
};

use super::{
    metadata,
    reader::{Error, Primitives, length, take},
    track,
};

/// Limits applied while walking an archive.
#[derive(Debug, Clone)]
pub struct Options {
    /// Most overflow blocks followed for a single data entry.
    pub max_chain_blocks: usize,
    /// Deepest node nesting below the root.
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_chain_blocks: 4096,
            max_depth: 256,
        }
    }
}

/// Decode an archive from a byte source, and every track document embedded
/// in it.
///
/// Nodes are walked depth-first. Within a node, child nodes are walked
/// before its own data entries, which also sets the order of
/// [`Archive::tracks`].
///
/// This method is also re-exported as `carabiner::avec::decode_archive`.
pub fn decode<R: Read + Seek>(r: &mut R, options: &Options) -> Result<Archive, Error> {
    r.seek(SeekFrom::Start(0))?;
    let ArchiveHeader {
        magic,
        version,
        root,
    } = ArchiveHeader::advance(take(r)?);

    debug!(magic, version, root, "decoding archive");

    let mut walker = Walker {
        r,
        options,
        ancestors: BTreeSet::new(),
        tracks: Vec::new(),
        skipped: Vec::new(),
    };

    let root = walker.node(root, None, 0)?;

    Ok(Archive {
        magic,
        version,
        root,
        tracks: walker.tracks,
        skipped: walker.skipped,
    })
}

struct Walker<'a, R> {
    r: &'a mut R,
    options: &'a Options,
    /// Offsets of the nodes on the path from the root to the current node.
    ancestors: BTreeSet<u64>,
    tracks: Vec<NestedTrack>,
    skipped: Vec<Skipped>,
}

impl<R: Read + Seek> Walker<'_, R> {
    fn node(&mut self, offset: u64, id: Option<i32>, depth: usize) -> Result<Node, Error> {
        if depth > self.options.max_depth {
            Err(ArchiveError::TooDeep(self.options.max_depth))?;
        }
        if !self.ancestors.insert(offset) {
            Err(ArchiveError::NodeCycle(offset))?;
        }

        let node = self.walk(offset, id, depth);
        self.ancestors.remove(&offset);

        node
    }

    fn walk(&mut self, offset: u64, id: Option<i32>, depth: usize) -> Result<Node, Error> {
        let r = &mut *self.r;

        r.seek(SeekFrom::Start(offset))?;
        let header = NodeHeader::advance(take(r)?)?;

        r.seek(SeekFrom::Start(header.metadata.saturating_add(METADATA_OFFSET)))?;
        let metadata = metadata::read(r, FormatVersion::V2)?;

        let path = match (id, metadata.name()) {
            (None, _) => String::from("/"),
            (Some(_), Some(name)) => format!("{name}/"),
            (Some(id), None) => format!("{id:08X}"),
        };

        debug!(offset, %path, "decoding node");

        let mut node = Node {
            offset,
            id,
            path,
            metadata,
            children: Vec::new(),
            entries: Vec::new(),
        };

        r.seek(SeekFrom::Start(header.entries))?;
        let counts = match EntriesHeader::advance(take(r)?) {
            Ok(Left(state)) => state.advance(take(r)?),
            Ok(Right(state)) => state.advance(take(r)?),
            Err(EntriesError::UnknownMagic(magic)) => {
                warn!(offset, magic, "skipping node with unknown entries layout");
                self.skipped.push(Skipped::Entries {
                    node: offset,
                    magic,
                });
                return Ok(node);
            }
        };

        let children = (0..counts.children)
            .map(|_| -> Result<_, Error> { Ok(archive::entry(take(r)?)) })
            .collect::<Result<Vec<_>, Error>>()?;

        r.seek(SeekFrom::Current((counts.empty as u64 * SLOT_WIDTH) as i64))?;

        let data = (0..counts.data)
            .map(|_| -> Result<_, Error> { Ok(archive::entry(take(r)?)) })
            .collect::<Result<Vec<_>, Error>>()?;

        for (pointer, id) in children {
            let child = self.node(pointer, Some(id), depth + 1)?;
            node.children.push(child);
        }

        for (pointer, id) in data {
            let entry = self.entry(pointer, id, &node.path)?;
            node.entries.push(entry);
        }

        Ok(node)
    }

    fn entry(&mut self, offset: u64, id: i32, path: &str) -> Result<DataEntry, Error> {
        let payload = resolve_payload(self.r, offset, self.options)?;

        let Some(kind) = payload.first_chunk().map(|r| RecordKind::advance(*r)) else {
            warn!(offset, size = payload.len(), "skipping data entry without a kind");
            self.skipped.push(Skipped::Empty { entry: offset });

            return Ok(DataEntry {
                offset,
                id,
                path: path.into(),
                kind: None,
            });
        };

        match kind {
            RecordKind::Track => {
                let document = track::decode_slice(&payload[EMBEDDED_OFFSET..])?;
                self.tracks.push(NestedTrack {
                    path: path.into(),
                    id,
                    document,
                });
            }
            RecordKind::Unknown(code) => {
                warn!(offset, code, "skipping data entry of unknown kind");
                self.skipped.push(Skipped::Record { entry: offset, kind });
            }
            _ => {
                debug!(offset, ?kind, "skipping unsupported data entry");
                self.skipped.push(Skipped::Record { entry: offset, kind });
            }
        }

        Ok(DataEntry {
            offset,
            id,
            path: path.into(),
            kind: Some(kind),
        })
    }
}

/// Read the payload of the data entry at `offset`, following its chain of
/// overflow blocks.
///
/// Returns the concatenation of every chunk in chain order. A chain that
/// revisits a block, or runs longer than [`Options::max_chain_blocks`], fails
/// with [`Error::CorruptArchive`].
pub fn resolve_payload<R: Read + Seek>(
    r: &mut R,
    offset: u64,
    options: &Options,
) -> Result<Vec<u8>, Error> {
    r.seek(SeekFrom::Start(offset))?;
    let (size, mut next) = archive::data_header(take(r)?);
    let mut payload = r.read_raw(length(size)?)?;

    let mut visited = BTreeSet::from([offset]);

    while next != 0 {
        if !visited.insert(next) {
            Err(ArchiveError::ChainCycle(next))?;
        }
        if visited.len() - 1 > options.max_chain_blocks {
            Err(ArchiveError::ChainTooLong(options.max_chain_blocks))?;
        }

        r.seek(SeekFrom::Start(next))?;
        let (size, following) = archive::overflow_header(take(r)?);
        payload.extend(r.read_raw(length(size)?)?);

        next = following;
    }

    Ok(payload)
}
