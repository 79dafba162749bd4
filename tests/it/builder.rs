use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

pub const LFH_SIGNATURE: u32 = 0x04034b50;
pub const DESCRIPTOR_SIGNATURE: u32 = 0x08074b50;

/// Writes local file headers by hand, the way a streaming ZIP writer would.
#[derive(Default)]
pub struct ArchiveBuilder {
    bytes: Vec<u8>,
    offsets: Vec<u64>,
}

pub struct EntrySpec<'a> {
    pub name: &'a str,
    pub method: u16,
    pub flags: u16,
    pub crc: u32,
    pub data: &'a [u8],
    pub uncompressed_size: u32,
    pub extra: &'a [u8],
    pub mod_time: u16,
    pub mod_date: u16,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(self, name: &str, data: &[u8]) -> Self {
        self.entry(EntrySpec {
            name,
            method: 0,
            flags: 0,
            crc: crc32fast::hash(data),
            data,
            uncompressed_size: data.len() as u32,
            extra: &[],
            mod_time: 0,
            mod_date: 0,
        })
    }

    pub fn deflated(self, name: &str, data: &[u8]) -> Self {
        let compressed = deflate(data);
        self.entry(EntrySpec {
            name,
            method: 8,
            flags: 0,
            crc: crc32fast::hash(data),
            data: &compressed,
            uncompressed_size: data.len() as u32,
            extra: &[],
            mod_time: 0,
            mod_date: 0,
        })
    }

    /// A DEFLATE entry whose header carries zeroes and whose real sizes and
    /// CRC follow the data in a descriptor.
    pub fn streamed(self, name: &str, data: &[u8]) -> Self {
        self.streamed_with_crc(name, data, crc32fast::hash(data))
    }

    /// Like [`ArchiveBuilder::streamed`], with `crc` written to the descriptor.
    pub fn streamed_with_crc(mut self, name: &str, data: &[u8], crc: u32) -> Self {
        let compressed = deflate(data);
        self = self.entry(EntrySpec {
            name,
            method: 8,
            flags: 0x0008,
            crc: 0,
            data: &compressed,
            uncompressed_size: 0,
            extra: &[],
            mod_time: 0,
            mod_date: 0,
        });
        // The header's compressed size was zero; only the descriptor knows it
        let header_start = *self.offsets.last().unwrap() as usize;
        self.bytes[header_start + 18..header_start + 22].copy_from_slice(&0u32.to_le_bytes());

        self.bytes.extend_from_slice(&DESCRIPTOR_SIGNATURE.to_le_bytes());
        self.bytes
            .extend_from_slice(&crc.to_le_bytes());
        self.bytes
            .extend_from_slice(&(compressed.len() as u32).to_le_bytes());
        self.bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
        self
    }

    pub fn entry(mut self, spec: EntrySpec<'_>) -> Self {
        self.offsets.push(self.bytes.len() as u64);
        let out = &mut self.bytes;
        out.extend_from_slice(&LFH_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&20u16.to_le_bytes());
        out.extend_from_slice(&spec.flags.to_le_bytes());
        out.extend_from_slice(&spec.method.to_le_bytes());
        out.extend_from_slice(&spec.mod_time.to_le_bytes());
        out.extend_from_slice(&spec.mod_date.to_le_bytes());
        out.extend_from_slice(&spec.crc.to_le_bytes());
        out.extend_from_slice(&(spec.data.len() as u32).to_le_bytes());
        out.extend_from_slice(&spec.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&(spec.name.len() as u16).to_le_bytes());
        out.extend_from_slice(&(spec.extra.len() as u16).to_le_bytes());
        out.extend_from_slice(spec.name.as_bytes());
        out.extend_from_slice(spec.extra);
        out.extend_from_slice(spec.data);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn into_bytes_unterminated(self) -> Vec<u8> {
        self.bytes
    }

    /// Terminate the entry list with a central directory signature.
    pub fn finish(self) -> Vec<u8> {
        self.raw(b"PK\x01\x02").bytes
    }
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}
