//! ZIP archive parsing and extraction.
//!
//! This module reads ZIP archives front to back through their local file
//! headers, without consulting the central directory.
//!
//! ## Architecture
//!
//! - [`structures`]: header fields, constants, DOS timestamps, name matching
//! - [`parser`]: local file header codec, including the data descriptor scan
//! - [`extractor`]: payload decoding (stored and DEFLATE) with CRC-32 checks
//! - [`archive`]: the [`ZipArchive`] handle with counting, lookup and
//!   metadata operations
//!
//! ## ZIP Format Overview
//!
//! Each entry starts with a 30-byte local file header, followed by the file
//! name, an extra field and the entry data. Entries written in streaming
//! mode add a 16-byte data descriptor after the data. Walking the headers in
//! order visits every entry; the first position that does not start with a
//! local header signature ends the walk.
//!
//! ## Limitations
//!
//! - No central directory or end-of-archive record handling
//! - No encryption, ZIP64 or multi-disk support
//! - Only STORED and DEFLATE compression methods

mod archive;
mod crc;
mod error;
mod extractor;
mod parser;
mod structures;

pub use archive::{EntryIter, ZipArchive};
pub use crc::{ChecksumAccumulator, crc32};
pub use error::ZipError;
pub use extractor::{ChecksumStatus, Extraction, Inflator, extract_entry};
pub use parser::{find_data_descriptor, read_local_header, read_variable_fields};
pub use structures::*;
