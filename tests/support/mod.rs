#![allow(dead_code)]

//! Byte builders for hand-made documents and archives.

pub const HEIGHT_ABSENT: i32 = -999_999_999;
pub const PRESSURE_ABSENT: i32 = 999_999_999;

/// A metadata value to encode.
pub enum V<'a> {
    Bool(bool),
    Long(i64),
    Double(f64),
    Bytes(&'a [u8]),
    Str(&'a str),
}

#[derive(Default)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn i32(mut self, x: i32) -> Self {
        self.0.extend(x.to_be_bytes());
        self
    }

    pub fn i64(mut self, x: i64) -> Self {
        self.0.extend(x.to_be_bytes());
        self
    }

    pub fn u64(mut self, x: u64) -> Self {
        self.0.extend(x.to_be_bytes());
        self
    }

    pub fn f64(mut self, x: f64) -> Self {
        self.0.extend(x.to_be_bytes());
        self
    }

    pub fn raw(mut self, x: &[u8]) -> Self {
        self.0.extend_from_slice(x);
        self
    }

    /// A metadata block. Version 3 blocks end with an extension count.
    pub fn metadata(mut self, version: i32, entries: &[(&str, V)]) -> Self {
        self = self.i32(entries.len() as i32);

        for (key, value) in entries {
            self = self.i32(key.len() as i32).raw(key.as_bytes());
            self = match value {
                V::Bool(x) => self.i32(-1).raw(&[*x as u8]),
                V::Long(x) => self.i32(-2).i64(*x),
                V::Double(x) => self.i32(-3).f64(*x),
                V::Bytes(x) => self.i32(-4).i32(x.len() as i32).raw(x),
                V::Str(x) => self.i32(x.len() as i32).raw(x.as_bytes()),
            };
        }

        if version == 3 {
            self = self.i32(0);
        }
        self
    }

    /// A fixed-layout location with a declared record size.
    pub fn fixed(self, size: i32, lat: i32, lon: i32, height: i32, time: i64) -> Self {
        self.i32(size).i32(lon).i32(lat).i32(height).i64(time)
    }

    /// A tagged location, sizing the record from its fields.
    pub fn tagged(self, lat: i32, lon: i32, fields: &[(u8, i64)]) -> Self {
        let mut body = Bytes::new();
        for (tag, value) in fields {
            body = body.raw(&[*tag]);
            body = match tag {
                b't' => body.i64(*value),
                _ => body.i32(*value as i32),
            };
        }

        self.i32(8 + body.0.len() as i32).i32(lon).i32(lat).raw(&body.0)
    }

    pub fn len(&self) -> u64 {
        self.0.len() as u64
    }
}

/// Header and statistics of a version 1 to 3 document, with the top-level
/// metadata right after.
pub fn fixed_header(version: i32) -> Bytes {
    Bytes::new()
        .i32(version)
        .i32(60)
        .i32(0)
        .i32(0)
        .i32(0)
        .i32(0)
        .i32(0)
        .i64(0)
        .f64(0.0)
        .f64(0.0)
        .f64(0.0)
        .i64(0)
}

/// Header, summary and metadata of a version 4 document.
pub fn tagged_header(version: i32, summary: &[(&str, V)], metadata: &[(&str, V)]) -> Bytes {
    Bytes::new()
        .i32(version)
        .i32(0)
        .metadata(4, summary)
        .i64(0)
        .metadata(4, metadata)
        .i64(0)
}

/// An archive image under construction. Offsets are absolute.
pub struct Image(pub Vec<u8>);

impl Image {
    /// An image with room for the archive header.
    pub fn new() -> Self {
        Self(vec![0; 48])
    }

    pub fn put(&mut self, b: Bytes) -> u64 {
        let offset = self.0.len() as u64;
        self.0.extend(b.0);
        offset
    }

    /// Node metadata, returning the pointer stored in the node header.
    pub fn metadata(&mut self, entries: &[(&str, V)]) -> u64 {
        self.put(Bytes::new().raw(&[0; 0x20]).metadata(2, entries))
    }

    pub fn node(&mut self, metadata: u64, entries: u64) -> u64 {
        self.node_with_magic(0x0001_5555, metadata, entries)
    }

    pub fn node_with_magic(&mut self, magic: i32, metadata: u64, entries: u64) -> u64 {
        self.put(Bytes::new().i32(magic).i32(0).u64(metadata).u64(entries))
    }

    pub fn list(&mut self, children: &[(u64, i32)], empty: usize, data: &[(u64, i32)]) -> u64 {
        let mut b = Bytes::new()
            .i32(0x0002_5555)
            .i32((children.len() + empty + data.len()) as i32)
            .i32(children.len() as i32)
            .i32(data.len() as i32)
            .u64(0);
        for (pointer, id) in children {
            b = b.u64(*pointer).i32(*id);
        }
        b = b.raw(&vec![0xee; 12 * empty]);
        for (pointer, id) in data {
            b = b.u64(*pointer).i32(*id);
        }
        self.put(b)
    }

    pub fn table(&mut self, children: &[(u64, i32)], data: &[(u64, i32)]) -> u64 {
        let mut b = Bytes::new()
            .i32(0x0004_5555)
            .i32(children.len() as i32)
            .i32(data.len() as i32);
        for (pointer, id) in children.iter().chain(data) {
            b = b.u64(*pointer).i32(*id);
        }
        self.put(b)
    }

    /// A data block whose payload continues in overflow blocks, one per
    /// further chunk.
    pub fn data(&mut self, chunks: &[&[u8]]) -> u64 {
        let total = chunks.iter().map(|c| c.len()).sum::<usize>() as i64;

        let mut next = 0;
        for chunk in chunks[1..].iter().rev() {
            next = self.overflow(chunk, next);
        }

        self.put(
            Bytes::new()
                .i32(0x0003_5555)
                .i32(0)
                .i64(total)
                .i64(chunks[0].len() as i64)
                .u64(next)
                .raw(chunks[0]),
        )
    }

    pub fn overflow(&mut self, chunk: &[u8], next: u64) -> u64 {
        self.put(
            Bytes::new()
                .i32(0x0008_5555)
                .i64(chunk.len() as i64)
                .u64(next)
                .raw(chunk),
        )
    }

    /// Overwrite the pointer to the next block of the data or overflow
    /// block at `offset`.
    pub fn relink(&mut self, offset: u64, overflow: bool, next: u64) {
        let at = offset as usize + if overflow { 12 } else { 24 };
        self.0[at..at + 8].copy_from_slice(&next.to_be_bytes());
    }

    /// Write the archive header and return the finished image.
    pub fn finish(mut self, root: u64) -> Vec<u8> {
        let header = Bytes::new().i32(0x4c44_4b21).i32(2).u64(root);
        self.0[..header.0.len()].copy_from_slice(&header.0);
        self.0
    }
}

/// A track payload as embedded in an archive.
pub fn embedded(track: &[u8]) -> Vec<u8> {
    let mut payload = vec![104];
    payload.extend_from_slice(track);
    payload
}
