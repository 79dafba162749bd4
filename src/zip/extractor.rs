use flate2::{Decompress, FlushDecompress, Status};
use std::io::{ErrorKind, Read, Seek, SeekFrom};

use super::crc::ChecksumAccumulator;
use super::error::{Result, ZipError};
use super::parser::read_variable_fields;
use super::structures::{CompressionMethod, LocalFileHeader};

/// Chunk size for copying stored entries
const COPY_CHUNK_SIZE: usize = 16 * 1024;

/// Buffer size for feeding and draining the decompressor
const INFLATE_BUFFER_SIZE: usize = 32 * 1024;

/// Outcome of checking the computed CRC-32 against the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumStatus {
    /// The checksum matched, or the header carried no checksum to compare with.
    Verified,
    ChecksumMismatch { expected: u32, actual: u32 },
}

/// Decoded payload of one entry.
///
/// A checksum mismatch does not discard the payload: the bytes produced are
/// returned as they are, and `status` records the mismatch.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub payload: Vec<u8>,
    pub checksum: u32,
    pub status: ChecksumStatus,
}

impl Extraction {
    pub fn is_checksum_mismatch(&self) -> bool {
        matches!(self.status, ChecksumStatus::ChecksumMismatch { .. })
    }

    /// Return the payload only if its checksum was verified.
    pub fn into_verified(self) -> Result<Vec<u8>> {
        match self.status {
            ChecksumStatus::Verified => Ok(self.payload),
            ChecksumStatus::ChecksumMismatch { expected, actual } => {
                Err(ZipError::ChecksumMismatch { expected, actual })
            }
        }
    }
}

/// Reusable raw DEFLATE decoder.
///
/// One `Inflator` is acquired for a batch of extractions and passed to each
/// of them; its state is reset at the start of every entry. Dropping it
/// releases the decoder and its buffers.
pub struct Inflator {
    state: Decompress,
    input: Box<[u8]>,
    output: Box<[u8]>,
}

impl Inflator {
    pub fn new() -> Self {
        Self {
            state: Decompress::new(false),
            input: vec![0u8; INFLATE_BUFFER_SIZE].into_boxed_slice(),
            output: vec![0u8; INFLATE_BUFFER_SIZE].into_boxed_slice(),
        }
    }

    /// Decompress one raw DEFLATE stream from `input` into `sink`.
    ///
    /// Reads from `input` until the end of the DEFLATE stream, and returns
    /// the CRC-32 of the decompressed bytes. The caller bounds `input` to the
    /// entry's compressed size; how far into it the decoder actually read is
    /// not reported.
    pub fn inflate<R: Read>(&mut self, mut input: R, sink: &mut Vec<u8>) -> Result<u32> {
        self.state.reset(false);
        let mut checksum = ChecksumAccumulator::new();

        let mut start = 0;
        let mut end = 0;
        let mut eof = false;

        loop {
            if start == end && !eof {
                end = read_retrying(&mut input, &mut self.input)?;
                start = 0;
                eof = end == 0;
            }

            let flush = if eof {
                FlushDecompress::Finish
            } else {
                FlushDecompress::None
            };

            let in_before = self.state.total_in();
            let out_before = self.state.total_out();
            let status = self
                .state
                .decompress(&self.input[start..end], &mut self.output, flush)
                .map_err(|e| ZipError::Corrupt(format!("invalid deflate data: {e}")))?;
            let consumed = (self.state.total_in() - in_before) as usize;
            let produced = (self.state.total_out() - out_before) as usize;

            start += consumed;
            sink.extend_from_slice(&self.output[..produced]);
            checksum.update(&self.output[..produced]);

            match status {
                Status::StreamEnd => break,
                _ if consumed == 0 && produced == 0 && (eof || start < end) => {
                    return Err(ZipError::Corrupt("deflate stream is truncated".into()));
                }
                _ => {}
            }
        }

        Ok(checksum.finalize())
    }
}

impl Default for Inflator {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the entry whose fixed header fields were just parsed.
///
/// The stream must sit right after the fixed header fields, as left by
/// [`read_local_header`](super::parser::read_local_header). The file name
/// and extra field are consumed first; the payload starts right after them.
///
/// Stored entries are copied verbatim; every other supported method goes
/// through `inflator`. In both cases the CRC-32 is computed over the
/// decoded bytes and compared with the header's value unless that is zero.
///
/// Whether or not decoding succeeds, once the payload start is known the
/// stream is left at the start of the next entry: payload start +
/// `compressed_size` + `descriptor_length`. If the file name or extra field
/// is truncated the stream is returned to where the call started.
pub fn extract_entry<R: Read + Seek>(
    stream: &mut R,
    header: &LocalFileHeader,
    inflator: &mut Inflator,
) -> Result<Extraction> {
    let fields_start = stream.stream_position()?;
    if let Err(e) = read_variable_fields(stream, header) {
        stream.seek(SeekFrom::Start(fields_start))?;
        return Err(e);
    }
    let payload_start = stream.stream_position()?;

    let mut payload = Vec::new();
    let decoded = decode_payload(stream, header, inflator, &mut payload);

    stream.seek(SeekFrom::Start(
        payload_start + header.compressed_size as u64 + header.descriptor_length as u64,
    ))?;
    let checksum = decoded?;

    let status = if header.crc_32 != 0 && checksum != header.crc_32 {
        log::debug!(
            "checksum mismatch for entry data at {payload_start}: header {:#010x}, computed {checksum:#010x}",
            header.crc_32
        );
        ChecksumStatus::ChecksumMismatch {
            expected: header.crc_32,
            actual: checksum,
        }
    } else {
        ChecksumStatus::Verified
    };

    Ok(Extraction {
        payload,
        checksum,
        status,
    })
}

fn decode_payload<R: Read>(
    stream: &mut R,
    header: &LocalFileHeader,
    inflator: &mut Inflator,
    payload: &mut Vec<u8>,
) -> Result<u32> {
    match header.method() {
        CompressionMethod::Stored => copy_stored(stream, header.uncompressed_size as u64, payload),
        CompressionMethod::Deflate => {
            payload.reserve((header.uncompressed_size as usize).min(INFLATE_BUFFER_SIZE));
            inflator.inflate(stream.take(header.compressed_size as u64), payload)
        }
        CompressionMethod::Unknown(method) => Err(ZipError::UnsupportedCompression(method)),
    }
}

/// Copy exactly `len` bytes into `sink` in bounded chunks, returning their CRC-32.
fn copy_stored<R: Read>(stream: &mut R, len: u64, sink: &mut Vec<u8>) -> Result<u32> {
    let mut buffer = vec![0u8; COPY_CHUNK_SIZE];
    let mut checksum = ChecksumAccumulator::new();
    let mut copied = 0u64;

    // `len` comes from the header; grow with the data actually read
    sink.reserve(len.min(COPY_CHUNK_SIZE as u64) as usize);
    while copied < len {
        let r = (len - copied).min(COPY_CHUNK_SIZE as u64) as usize;
        stream.read_exact(&mut buffer[..r])?;
        sink.extend_from_slice(&buffer[..r]);
        checksum.update(&buffer[..r]);
        copied += r as u64;
    }

    Ok(checksum.finalize())
}

fn read_retrying<R: Read>(input: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    loop {
        match input.read(buf) {
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}
