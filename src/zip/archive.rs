//! Entry lookup over a stream of local file headers.
//!
//! [`ZipArchive`] owns one open stream and answers every question by walking
//! the local headers from the start of the archive (or from a resume
//! offset). There is no index: each call repeats the scan, and two calls
//! never share parsed state. Entry handles are plain byte offsets, so a
//! handle obtained from one call can be passed to any other.

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::io::{LocalFileReader, SourceStream};

use super::error::{Result, ZipError};
use super::extractor::{Extraction, Inflator, extract_entry};
use super::parser::{peek_file_name, read_local_header};
use super::structures::*;

/// A ZIP archive read through its local file headers.
pub struct ZipArchive<R> {
    stream: R,
}

impl ZipArchive<SourceStream<LocalFileReader>> {
    /// Open a local archive file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let reader = LocalFileReader::new(path.as_ref())?;
        Ok(Self::new(SourceStream::new(reader)))
    }
}

impl<R: Read + Seek> ZipArchive<R> {
    pub fn new(stream: R) -> Self {
        Self { stream }
    }

    pub fn into_inner(self) -> R {
        self.stream
    }

    /// Count the entries in the archive.
    ///
    /// A corrupt header ends the count early; the entries before it are
    /// still counted. The stream is left at the first position that does not
    /// hold a valid header.
    pub fn count_entries(&mut self) -> Result<usize> {
        self.stream.seek(SeekFrom::Start(0))?;

        let mut count = 0;
        while self.next_header()?.is_some() {
            count += 1;
        }

        Ok(count)
    }

    /// Find the entry at position `index` (0-based) in the archive.
    pub fn offset_of_index(&mut self, index: usize) -> Result<Option<EntryHandle>> {
        self.stream.seek(SeekFrom::Start(0))?;

        let mut count = 0;
        loop {
            let current = self.stream.stream_position()?;
            let Some(header) = self.next_header_unskipped()? else {
                return Ok(None);
            };

            if count == index {
                return Ok(Some(EntryHandle(current)));
            }

            self.skip_entry(&header)?;
            count += 1;
        }
    }

    /// Find the first entry whose name matches `name` under `flags`.
    ///
    /// With `resume_after` set, the scan starts at that offset and only
    /// entries starting strictly after it are considered, so passing the
    /// previous result finds the next match. The stream is left inside the
    /// matching entry, or at the end of the entry list when nothing matched.
    pub fn offset_of_name(
        &mut self,
        name: &str,
        flags: MatchFlags,
        resume_after: Option<u64>,
    ) -> Result<Option<EntryHandle>> {
        self.stream
            .seek(SeekFrom::Start(resume_after.unwrap_or(0)))?;

        loop {
            let current = self.stream.stream_position()?;
            let Some(header) = self.next_header_unskipped()? else {
                return Ok(None);
            };

            if resume_after.is_none_or(|skip| current > skip) {
                let candidate = match peek_file_name(&mut self.stream, &header) {
                    Ok(candidate) => candidate,
                    Err(ZipError::Corrupt(reason)) => {
                        log::debug!("name lookup stopped at offset {current}: {reason}");
                        return Ok(None);
                    }
                    Err(e) => return Err(e),
                };

                if flags.matches(&candidate, name.as_bytes()) {
                    return Ok(Some(EntryHandle(current)));
                }
            }

            self.skip_entry(&header)?;
        }
    }

    /// Raw file name bytes of the entry at `handle`.
    pub fn name_of(&mut self, handle: EntryHandle) -> Result<Vec<u8>> {
        let header = self.header_at(handle)?;
        peek_file_name(&mut self.stream, &header)
    }

    /// File name of the entry at `handle`, with invalid UTF-8 replaced.
    pub fn name_of_lossy(&mut self, handle: EntryHandle) -> Result<String> {
        let name = self.name_of(handle)?;
        Ok(String::from_utf8_lossy(&name).into_owned())
    }

    /// Uncompressed size of the entry at `handle`.
    pub fn uncompressed_size_of(&mut self, handle: EntryHandle) -> Result<u32> {
        Ok(self.header_at(handle)?.uncompressed_size)
    }

    /// Last modification time of the entry at `handle`.
    pub fn modtime_of(&mut self, handle: EntryHandle) -> Result<DosDateTime> {
        Ok(self.header_at(handle)?.modified())
    }

    /// Offset of the entry that follows the one at `handle`.
    ///
    /// The returned position may not hold a header if `handle` is the last
    /// entry.
    pub fn next_offset(&mut self, handle: EntryHandle) -> Result<EntryHandle> {
        let header = self.header_at(handle)?;
        Ok(EntryHandle(handle.offset() + header.entry_length()))
    }

    /// Decode the payload of the entry at `handle`.
    ///
    /// On success the stream is left at the start of the next entry.
    pub fn extract(&mut self, handle: EntryHandle, inflator: &mut Inflator) -> Result<Extraction> {
        let header = self.header_at(handle)?;
        extract_entry(&mut self.stream, &header, inflator)
    }

    /// Look up an entry by name and decode its payload.
    pub fn read_by_name(
        &mut self,
        name: &str,
        flags: MatchFlags,
        inflator: &mut Inflator,
    ) -> Result<Extraction> {
        let handle = self
            .offset_of_name(name, flags, None)?
            .ok_or(ZipError::NotFound)?;
        self.extract(handle, inflator)
    }

    /// Iterate over the entries from the start of the archive.
    pub fn entries(&mut self) -> EntryIter<'_, R> {
        EntryIter {
            archive: self,
            next: Some(0),
        }
    }

    /// Parse the header at `handle`, leaving the stream after its fixed fields.
    fn header_at(&mut self, handle: EntryHandle) -> Result<LocalFileHeader> {
        self.stream.seek(SeekFrom::Start(handle.offset()))?;
        read_local_header(&mut self.stream)?.ok_or(ZipError::NotFound)
    }

    /// Parse the header at the current position and skip past its entry.
    ///
    /// `Ok(None)` covers both the end of the entry list and a corrupt header.
    fn next_header(&mut self) -> Result<Option<LocalFileHeader>> {
        let Some(header) = self.next_header_unskipped()? else {
            return Ok(None);
        };
        self.skip_entry(&header)?;
        Ok(Some(header))
    }

    fn next_header_unskipped(&mut self) -> Result<Option<LocalFileHeader>> {
        match read_local_header(&mut self.stream) {
            Ok(header) => Ok(header),
            Err(ZipError::Corrupt(reason)) => {
                log::debug!("entry scan truncated: {reason}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Advance from the end of the fixed header fields to the next header.
    fn skip_entry(&mut self, header: &LocalFileHeader) -> Result<()> {
        let skip = i64::try_from(header.skip_length())
            .map_err(|_| ZipError::Corrupt("entry length overflows".into()))?;
        self.stream.seek(SeekFrom::Current(skip))?;
        Ok(())
    }

    fn entry_info(&mut self, handle: EntryHandle) -> Result<Option<(EntryInfo, u64)>> {
        self.stream.seek(SeekFrom::Start(handle.offset()))?;
        let Some(header) = read_local_header(&mut self.stream)? else {
            return Ok(None);
        };
        let name = peek_file_name(&mut self.stream, &header)?;
        let file_name = String::from_utf8_lossy(&name).into_owned();

        let info = EntryInfo {
            handle,
            is_directory: file_name.ends_with('/'),
            file_name,
            compression_method: header.method(),
            compressed_size: header.compressed_size,
            uncompressed_size: header.uncompressed_size,
            crc_32: header.crc_32,
            modified: header.modified(),
        };
        Ok(Some((info, handle.offset() + header.entry_length())))
    }
}

/// Sequential walk over the entries of a [`ZipArchive`].
///
/// Ends at the first position without a local header. A corrupt header is
/// yielded once as an error, after which the iterator is exhausted.
pub struct EntryIter<'a, R> {
    archive: &'a mut ZipArchive<R>,
    next: Option<u64>,
}

impl<R: Read + Seek> Iterator for EntryIter<'_, R> {
    type Item = Result<EntryInfo>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.next.take()?;
        match self.archive.entry_info(EntryHandle(offset)) {
            Ok(Some((info, next))) => {
                self.next = Some(next);
                Some(Ok(info))
            }
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
