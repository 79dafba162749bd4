//! OpenDocument Text access on top of the archive reader.
//!
//! An OpenDocument file is a ZIP archive whose `mimetype` entry names the
//! document type and whose `content.xml` entry holds the document body.

use std::io::{Read, Seek};

use crate::zip::{Inflator, MatchFlags, ZipArchive, ZipError};

pub const MIMETYPE_ENTRY: &str = "mimetype";
pub const CONTENT_ENTRY: &str = "content.xml";

/// Mimetypes accepted without `--force`.
pub const KNOWN_MIMETYPES: [&str; 2] = [
    "application/vnd.oasis.opendocument.text",
    "application/vnd.sun.xml.writer",
];

#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    #[error("Can't read {0}: Is it an OpenDocument Text?")]
    NotOpenDocument(&'static str),

    #[error("Can't extract {entry}. Maybe the file is corrupted?")]
    Corrupted {
        entry: &'static str,
        #[source]
        source: ZipError,
    },

    #[error("Document has unknown mimetype: -{0}-")]
    UnknownMimetype(String),

    #[error(transparent)]
    Zip(#[from] ZipError),
}

/// The parts of an OpenDocument Text the converter works with.
#[derive(Debug, Clone)]
pub struct Document {
    pub mimetype: String,
    pub content: String,
}

/// Check a document's mimetype against [`KNOWN_MIMETYPES`].
///
/// The document is rejected only when its mimetype is neither of the known
/// ones and `force` is not set.
pub fn check_mimetype(mimetype: &str, force: bool) -> Result<(), DocumentError> {
    let known = KNOWN_MIMETYPES.iter().any(|known| *known == mimetype);
    if !known && !force {
        return Err(DocumentError::UnknownMimetype(mimetype.to_string()));
    }
    Ok(())
}

/// Read the `mimetype` and `content.xml` entries of an OpenDocument Text.
///
/// Both entries are looked up by exact, case-sensitive name. A checksum
/// mismatch is logged and the payload is used anyway.
pub fn read_document<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    force: bool,
) -> Result<Document, DocumentError> {
    let mut inflator = Inflator::new();

    let mimetype = read_part(archive, MIMETYPE_ENTRY, &mut inflator)?;
    check_mimetype(&mimetype, force)?;

    let content = read_part(archive, CONTENT_ENTRY, &mut inflator)?;

    Ok(Document { mimetype, content })
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    entry: &'static str,
    inflator: &mut Inflator,
) -> Result<String, DocumentError> {
    let flags = MatchFlags::EXACT | MatchFlags::CASE_SENSITIVE;
    let handle = archive
        .offset_of_name(entry, flags, None)?
        .ok_or(DocumentError::NotOpenDocument(entry))?;

    let extraction = archive
        .extract(handle, inflator)
        .map_err(|source| DocumentError::Corrupted { entry, source })?;

    if extraction.is_checksum_mismatch() {
        log::warn!("Checksums don't match for {entry}: {:?}", extraction.status);
    }

    Ok(String::from_utf8_lossy(&extraction.payload).into_owned())
}
