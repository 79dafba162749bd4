mod builder;
mod document_tests;

use builder::ArchiveBuilder;
use odtzip::zip::ChecksumStatus;
use odtzip::{EntryHandle, Inflator, MatchFlags, SourceStream, ZipArchive, ZipError};
use quickcheck_macros::quickcheck;
use std::io::Cursor;

const MIMETYPE: &[u8] = b"application/epub+zip";
const CONTENT: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content><office:body><office:text>
<text:h text:outline-level="1">Title</text:h><text:p>Body text, body text, body text.</text:p>
</office:text></office:body></office:document-content>"#;

fn exact() -> MatchFlags {
    MatchFlags::EXACT | MatchFlags::CASE_SENSITIVE
}

#[test]
fn mimetype_then_content_scenario() {
    let builder = ArchiveBuilder::new()
        .stored("mimetype", MIMETYPE)
        .deflated("content.xml", CONTENT);
    let offsets = builder.offsets().to_vec();
    let mut archive = ZipArchive::new(Cursor::new(builder.finish()));
    let mut inflator = Inflator::new();

    let mimetype = archive.offset_of_name("mimetype", exact(), None).unwrap();
    assert_eq!(mimetype, Some(EntryHandle(0)));

    let extraction = archive.extract(EntryHandle(0), &mut inflator).unwrap();
    assert_eq!(extraction.payload.len(), 20);
    assert_eq!(extraction.payload, MIMETYPE);
    assert!(!extraction.is_checksum_mismatch());

    let content = archive
        .offset_of_name("content.xml", exact(), Some(0))
        .unwrap()
        .unwrap();
    // header + name + extra + compressed size of the first entry
    assert_eq!(content.offset(), 30 + 8 + 20);
    assert_eq!(content.offset(), offsets[1]);

    let extraction = archive.extract(content, &mut inflator).unwrap();
    assert_eq!(extraction.payload, CONTENT);
    assert!(!extraction.is_checksum_mismatch());
}

#[test]
fn streamed_entry_uses_descriptor_values() {
    let builder = ArchiveBuilder::new()
        .streamed("content.xml", CONTENT)
        .stored("after", b"tail entry");
    let offsets = builder.offsets().to_vec();
    let mut archive = ZipArchive::new(Cursor::new(builder.finish()));

    assert_eq!(archive.count_entries().unwrap(), 2);
    assert_eq!(
        archive.uncompressed_size_of(EntryHandle(0)).unwrap(),
        CONTENT.len() as u32
    );

    let extraction = archive.extract(EntryHandle(0), &mut Inflator::new()).unwrap();
    assert_eq!(extraction.payload, CONTENT);
    assert_eq!(extraction.checksum, crc32fast::hash(CONTENT));
    assert!(!extraction.is_checksum_mismatch());

    // The entry after the descriptor is reached by index and by name
    let second = EntryHandle(offsets[1]);
    assert_eq!(archive.offset_of_index(1).unwrap(), Some(second));
    assert_eq!(
        archive.offset_of_name("after", exact(), None).unwrap(),
        Some(second)
    );
    assert_eq!(archive.next_offset(EntryHandle(0)).unwrap(), second);
}

#[test]
fn streamed_entry_is_verified_against_descriptor_crc() {
    let bogus = crc32fast::hash(CONTENT) ^ 0xdead_beef;
    let bytes = ArchiveBuilder::new()
        .streamed_with_crc("content.xml", CONTENT, bogus)
        .finish();
    let mut archive = ZipArchive::new(Cursor::new(bytes));

    let extraction = archive.extract(EntryHandle(0), &mut Inflator::new()).unwrap();
    assert_eq!(extraction.payload, CONTENT);
    assert_eq!(
        extraction.status,
        ChecksumStatus::ChecksumMismatch {
            expected: bogus,
            actual: crc32fast::hash(CONTENT),
        }
    );
}

#[test]
fn stored_entry_claiming_huge_size_is_short_read() {
    let data = b"hello";
    let bytes = ArchiveBuilder::new()
        .entry(builder::EntrySpec {
            name: "big",
            method: 0,
            flags: 0,
            crc: crc32fast::hash(data),
            data,
            uncompressed_size: 0xFFFF_FFF0,
            extra: &[],
            mod_time: 0,
            mod_date: 0,
        })
        .finish();
    let mut archive = ZipArchive::new(Cursor::new(bytes));

    let err = archive
        .extract(EntryHandle(0), &mut Inflator::new())
        .unwrap_err();
    assert!(
        matches!(err, ZipError::Io(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    );
}

#[test]
fn streamed_entry_without_descriptor_truncates_count() {
    let bytes = ArchiveBuilder::new()
        .stored("first", b"ok")
        .entry(builder::EntrySpec {
            name: "broken",
            method: 8,
            flags: 0x0008,
            crc: 0,
            data: b"\x03\x00",
            uncompressed_size: 0,
            extra: &[],
            mod_time: 0,
            mod_date: 0,
        })
        .raw(b"no descriptor follows")
        .into_bytes_unterminated();
    let mut archive = ZipArchive::new(Cursor::new(bytes));

    assert_eq!(archive.count_entries().unwrap(), 1);
    assert_eq!(archive.offset_of_index(1).unwrap(), None);
    assert_eq!(archive.offset_of_name("broken", exact(), None).unwrap(), None);
}

#[test]
fn extra_field_is_skipped() {
    let bytes = ArchiveBuilder::new()
        .entry(builder::EntrySpec {
            name: "with-extra",
            method: 0,
            flags: 0,
            crc: crc32fast::hash(b"data"),
            data: b"data",
            uncompressed_size: 4,
            extra: b"UT\x05\x00\x01abcd",
            mod_time: 0,
            mod_date: 0,
        })
        .stored("next", b"n")
        .finish();
    let mut archive = ZipArchive::new(Cursor::new(bytes));

    let extraction = archive.extract(EntryHandle(0), &mut Inflator::new()).unwrap();
    assert_eq!(extraction.payload, b"data");
    assert_eq!(
        archive.offset_of_index(1).unwrap(),
        Some(EntryHandle(30 + 10 + 9 + 4))
    );
}

#[test]
fn local_file_source_reads_like_memory() {
    let bytes = ArchiveBuilder::new()
        .stored("mimetype", MIMETYPE)
        .streamed("content.xml", CONTENT)
        .finish();
    let path = std::env::temp_dir().join(format!("odtzip-it-{}.odt", std::process::id()));
    std::fs::write(&path, &bytes).unwrap();

    let mut archive = ZipArchive::open(&path).unwrap();
    let mut inflator = Inflator::new();
    assert_eq!(archive.count_entries().unwrap(), 2);
    let handle = archive
        .offset_of_name("content.xml", exact(), None)
        .unwrap()
        .unwrap();
    assert_eq!(archive.extract(handle, &mut inflator).unwrap().payload, CONTENT);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn source_stream_over_memory() {
    let bytes = ArchiveBuilder::new()
        .deflated("a.txt", b"alpha")
        .streamed("b.txt", b"beta")
        .finish();
    let mut archive = ZipArchive::new(SourceStream::new(bytes));

    let names: Vec<_> = archive
        .entries()
        .map(|e| e.unwrap().file_name)
        .collect();
    assert_eq!(names, ["a.txt", "b.txt"]);
}

#[quickcheck]
fn count_matches_number_of_entries(sizes: Vec<u8>) -> bool {
    let mut builder = ArchiveBuilder::new();
    for (i, size) in sizes.iter().enumerate() {
        let data = vec![*size; *size as usize];
        builder = builder.stored(&format!("entry-{i}"), &data);
    }
    // Any four bytes that are not a local header signature end the list
    let bytes = builder.raw(b"\0\0\0\0").into_bytes_unterminated();

    ZipArchive::new(Cursor::new(bytes)).count_entries().unwrap() == sizes.len()
}

#[quickcheck]
fn stored_payload_is_the_literal_byte_range(prefix: Vec<u8>, data: Vec<u8>) -> bool {
    let builder = ArchiveBuilder::new()
        .stored("prefix", &prefix)
        .stored("data", &data);
    let offset = builder.offsets()[1];
    let bytes = builder.finish();

    let payload_start = offset as usize + 30 + "data".len();
    let expected = bytes[payload_start..payload_start + data.len()].to_vec();

    let mut archive = ZipArchive::new(Cursor::new(bytes));
    let extraction = archive
        .extract(EntryHandle(offset), &mut Inflator::new())
        .unwrap();
    extraction.payload == expected
        && extraction.payload == data
        && extraction.checksum == crc32fast::hash(&data)
        && !extraction.is_checksum_mismatch()
}
