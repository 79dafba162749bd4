use crate::builder::{ArchiveBuilder, EntrySpec};
use odtzip::{DocumentError, ZipArchive, ZipError, read_document};
use std::io::Cursor;

const ODT_MIMETYPE: &[u8] = b"application/vnd.oasis.opendocument.text";
const CONTENT: &[u8] = b"<office:document-content>Hello</office:document-content>";

fn odt(mimetype: &[u8]) -> ZipArchive<Cursor<Vec<u8>>> {
    let bytes = ArchiveBuilder::new()
        .stored("mimetype", mimetype)
        .deflated("styles.xml", b"<office:document-styles/>")
        .streamed("content.xml", CONTENT)
        .finish();
    ZipArchive::new(Cursor::new(bytes))
}

#[test]
fn reads_mimetype_and_content() {
    let document = read_document(&mut odt(ODT_MIMETYPE), false).unwrap();
    assert_eq!(document.mimetype.as_bytes(), ODT_MIMETYPE);
    assert_eq!(document.content.as_bytes(), CONTENT);
}

#[test]
fn legacy_writer_mimetype_is_accepted() {
    let document = read_document(&mut odt(b"application/vnd.sun.xml.writer"), false).unwrap();
    assert_eq!(document.content.as_bytes(), CONTENT);
}

#[test]
fn unknown_mimetype_requires_force() {
    let err = read_document(&mut odt(b"application/epub+zip"), false).unwrap_err();
    assert!(matches!(err, DocumentError::UnknownMimetype(ref m) if m == "application/epub+zip"));

    let document = read_document(&mut odt(b"application/epub+zip"), true).unwrap();
    assert_eq!(document.content.as_bytes(), CONTENT);
}

#[test]
fn missing_content_is_not_an_open_document() {
    let bytes = ArchiveBuilder::new()
        .stored("mimetype", ODT_MIMETYPE)
        .finish();
    let err = read_document(&mut ZipArchive::new(Cursor::new(bytes)), false).unwrap_err();
    assert!(matches!(err, DocumentError::NotOpenDocument("content.xml")));
    assert_eq!(
        err.to_string(),
        "Can't read content.xml: Is it an OpenDocument Text?"
    );
}

#[test]
fn checksum_mismatch_still_yields_content() {
    let bytes = ArchiveBuilder::new()
        .stored("mimetype", ODT_MIMETYPE)
        .entry(EntrySpec {
            name: "content.xml",
            method: 0,
            flags: 0,
            crc: 0xBAD0_BAD0,
            data: CONTENT,
            uncompressed_size: CONTENT.len() as u32,
            extra: &[],
            mod_time: 0,
            mod_date: 0,
        })
        .finish();
    let document = read_document(&mut ZipArchive::new(Cursor::new(bytes)), false).unwrap();
    assert_eq!(document.content.as_bytes(), CONTENT);
}

#[test]
fn undecodable_content_is_corrupted() {
    let bytes = ArchiveBuilder::new()
        .stored("mimetype", ODT_MIMETYPE)
        .entry(EntrySpec {
            name: "content.xml",
            method: 8,
            flags: 0,
            crc: 0,
            // Reserved block type 3 is invalid DEFLATE
            data: b"\xff\xff\xff\xff",
            uncompressed_size: 10,
            extra: &[],
            mod_time: 0,
            mod_date: 0,
        })
        .finish();
    let err = read_document(&mut ZipArchive::new(Cursor::new(bytes)), false).unwrap_err();
    assert!(matches!(
        err,
        DocumentError::Corrupted {
            entry: "content.xml",
            source: ZipError::Corrupt(_)
        }
    ));
}
