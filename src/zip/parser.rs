//! Local file header codec.
//!
//! Archives are read front to back, one local file header at a time, without
//! ever consulting the central directory. Each header is followed by the
//! file name, the extra field and the entry data; entries written in
//! streaming mode (general purpose flag bit 3) carry zeroes in the header's
//! size and CRC fields and append the real values in a data descriptor
//! after the data. Those values can only be recovered by scanning forward
//! for the descriptor signature.
//!
//! ## Stream positions
//!
//! - On `Ok(Some(header))` the stream sits right after the 30 fixed header
//!   bytes, where the file name begins.
//! - On `Ok(None)` (no header at this position) the stream is back where
//!   the call started.
//! - On `Err(ZipError::Corrupt)` the stream is back where the call started.

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::{Cursor, ErrorKind, Read, Seek, SeekFrom};

use super::error::{Result, ZipError};
use super::structures::*;

/// Parse the local file header at the current stream position.
///
/// Returns `Ok(None)` when the four bytes at the current position are not a
/// local file header signature, or when fewer than four bytes remain. This is
/// how the end of the entry list is detected: after the last entry a ZIP
/// file continues with the central directory, whose signature differs.
///
/// # Errors
///
/// - [`ZipError::Corrupt`] if the header is truncated, or if the entry
///   defers its sizes to a data descriptor that cannot be found before the
///   end of the stream.
/// - [`ZipError::Io`] if the underlying stream fails.
pub fn read_local_header<R: Read + Seek>(stream: &mut R) -> Result<Option<LocalFileHeader>> {
    let start = stream.stream_position()?;

    let mut buf = [0u8; LFH_SIZE];
    let n = read_up_to(stream, &mut buf)?;

    if n < 4 || LittleEndian::read_u32(&buf[0..4]) != LFH_SIGNATURE {
        stream.seek(SeekFrom::Start(start))?;
        return Ok(None);
    }

    if n < LFH_SIZE {
        stream.seek(SeekFrom::Start(start))?;
        return Err(ZipError::Corrupt(format!(
            "header at offset {start} is truncated ({n} of {LFH_SIZE} bytes)"
        )));
    }

    let mut cursor = Cursor::new(&buf[4..]);
    let mut header = LocalFileHeader {
        version: cursor.read_u16::<LittleEndian>()?,
        flags: cursor.read_u16::<LittleEndian>()?,
        compression_method: cursor.read_u16::<LittleEndian>()?,
        mod_time: cursor.read_u16::<LittleEndian>()?,
        mod_date: cursor.read_u16::<LittleEndian>()?,
        crc_32: cursor.read_u32::<LittleEndian>()?,
        compressed_size: cursor.read_u32::<LittleEndian>()?,
        uncompressed_size: cursor.read_u32::<LittleEndian>()?,
        name_length: cursor.read_u16::<LittleEndian>()?,
        extra_length: cursor.read_u16::<LittleEndian>()?,
        descriptor_length: 0,
    };

    if header.has_data_descriptor() {
        match find_data_descriptor(stream)? {
            Some(descriptor) => {
                log::trace!(
                    "entry at {start}: recovered descriptor crc={:#010x} size={}",
                    descriptor.crc_32,
                    descriptor.compressed_size
                );
                header.crc_32 = descriptor.crc_32;
                header.compressed_size = descriptor.compressed_size;
                header.uncompressed_size = descriptor.uncompressed_size;
                header.descriptor_length = DESCRIPTOR_SIZE;
            }
            None => {
                stream.seek(SeekFrom::Start(start))?;
                return Err(ZipError::Corrupt(format!(
                    "entry at offset {start} has no data descriptor"
                )));
            }
        }
    }

    Ok(Some(header))
}

/// Scan forward from the current position for a data descriptor.
///
/// The scan reads a four-byte window, and on a miss steps back three bytes
/// before reading the next window, so a signature starting at any byte
/// offset is seen. There is no bound on the distance scanned: a missing
/// descriptor costs a read to the end of the stream.
///
/// Whatever the outcome, the stream is restored to the position it had on
/// entry.
pub fn find_data_descriptor<R: Read + Seek>(stream: &mut R) -> Result<Option<DataDescriptor>> {
    let data_start = stream.stream_position()?;
    let found = scan_for_descriptor(stream);
    stream.seek(SeekFrom::Start(data_start))?;
    found
}

fn scan_for_descriptor<R: Read + Seek>(stream: &mut R) -> Result<Option<DataDescriptor>> {
    let mut window = [0u8; 4];

    loop {
        if read_up_to(stream, &mut window)? < window.len() {
            return Ok(None);
        }

        if LittleEndian::read_u32(&window) == DESCRIPTOR_SIGNATURE {
            let mut fields = [0u8; 12];
            if read_up_to(stream, &mut fields)? < fields.len() {
                return Ok(None);
            }

            let mut cursor = Cursor::new(&fields[..]);
            return Ok(Some(DataDescriptor {
                crc_32: cursor.read_u32::<LittleEndian>()?,
                compressed_size: cursor.read_u32::<LittleEndian>()?,
                uncompressed_size: cursor.read_u32::<LittleEndian>()?,
            }));
        }

        stream.seek(SeekFrom::Current(-3))?;
    }
}

/// Read the file name and extra field that follow the fixed header.
///
/// The stream must sit right after the fixed header fields, as left by
/// [`read_local_header`]. On success it sits at the start of the entry data.
pub fn read_variable_fields<R: Read>(
    stream: &mut R,
    header: &LocalFileHeader,
) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut name = vec![0u8; header.name_length as usize];
    read_exact_or_corrupt(stream, &mut name, "file name")?;

    let mut extra = vec![0u8; header.extra_length as usize];
    read_exact_or_corrupt(stream, &mut extra, "extra field")?;

    Ok((name, extra))
}

/// Read just the file name, leaving the stream where it was.
pub fn peek_file_name<R: Read + Seek>(stream: &mut R, header: &LocalFileHeader) -> Result<Vec<u8>> {
    let marker = stream.stream_position()?;
    let mut name = vec![0u8; header.name_length as usize];
    let read = read_exact_or_corrupt(stream, &mut name, "file name");
    stream.seek(SeekFrom::Start(marker))?;
    read.map(|_| name)
}

fn read_exact_or_corrupt<R: Read>(stream: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    match stream.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            Err(ZipError::Corrupt(format!("{what} is truncated")))
        }
        Err(e) => Err(e.into()),
    }
}

/// Fill as much of `buf` as the stream allows, returning the byte count.
fn read_up_to<R: Read>(stream: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
