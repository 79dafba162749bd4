//! # odtzip
//!
//! A local-header ZIP reader for OpenDocument text, with local and HTTP sources.
//!
//! The reader walks an archive's local file headers from the front and never
//! consults the central directory. Entries are located by name or index,
//! identified by the byte offset of their header, and decoded (stored or
//! DEFLATE) into memory with a CRC-32 check.
//!
//! ## Features
//!
//! - Count, list and look up entries by index or by name (exact or
//!   substring, case-sensitive or not)
//! - Entries written in streaming mode, whose sizes and CRC live in a
//!   trailing data descriptor
//! - STORED and DEFLATE compression methods
//! - Archives on the local filesystem or behind an HTTP server with Range
//!   request support
//! - Reading the `mimetype` and `content.xml` parts of an OpenDocument Text
//!
//! ## Example
//!
//! ```no_run
//! use odtzip::{Inflator, MatchFlags, ZipArchive};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut archive = ZipArchive::open("report.odt")?;
//!     let mut inflator = Inflator::new();
//!
//!     let flags = MatchFlags::EXACT | MatchFlags::CASE_SENSITIVE;
//!     if let Some(handle) = archive.offset_of_name("content.xml", flags, None)? {
//!         let extraction = archive.extract(handle, &mut inflator)?;
//!         println!("{}", String::from_utf8_lossy(&extraction.payload));
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod document;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use document::{Document, DocumentError, read_document};
pub use io::{HttpRangeReader, LocalFileReader, ReadAt, SourceStream};
pub use zip::{
    EntryHandle, EntryInfo, Extraction, Inflator, MatchFlags, ZipArchive, ZipError,
};
