use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone};
use std::time::SystemTime;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }

    /// Short label used in verbose listings.
    pub fn label(&self) -> &'static str {
        match self {
            CompressionMethod::Stored => "Stored",
            CompressionMethod::Deflate => "Defl",
            CompressionMethod::Unknown(_) => "Unk",
        }
    }
}

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: u32 = 0x04034b50;
pub const LFH_SIZE: usize = 30;

/// Data descriptor trailing a streamed entry - 16 bytes including signature
pub const DESCRIPTOR_SIGNATURE: u32 = 0x08074b50;
pub const DESCRIPTOR_SIZE: u16 = 16;

/// General purpose flag: sizes and CRC are deferred to a data descriptor
pub const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;

/// A parsed local file header.
///
/// Headers are transient: every lookup re-parses them from the stream and
/// nothing holds on to one between calls. When the entry was written in
/// streaming mode the size and CRC fields hold the values recovered from the
/// trailing data descriptor, and `descriptor_length` is 16.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub version: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub mod_time: u16,
    pub mod_date: u16,
    pub crc_32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub name_length: u16,
    pub extra_length: u16,
    pub descriptor_length: u16,
}

impl LocalFileHeader {
    pub fn method(&self) -> CompressionMethod {
        CompressionMethod::from_u16(self.compression_method)
    }

    pub fn has_data_descriptor(&self) -> bool {
        self.flags & FLAG_DATA_DESCRIPTOR != 0
    }

    pub fn modified(&self) -> DosDateTime {
        DosDateTime::from_msdos(self.mod_date, self.mod_time)
    }

    /// Bytes between the end of the fixed header fields and the next header.
    pub fn skip_length(&self) -> u64 {
        self.compressed_size as u64
            + self.name_length as u64
            + self.extra_length as u64
            + self.descriptor_length as u64
    }

    /// Total size of the entry on disk, from signature to the next header.
    pub fn entry_length(&self) -> u64 {
        LFH_SIZE as u64 + self.skip_length()
    }
}

/// Fields recovered from a data descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataDescriptor {
    pub crc_32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

/// Byte offset of a local file header within the archive.
///
/// Handles are plain positions: they stay valid for as long as the archive
/// bytes do not change, and carry no cached header data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryHandle(pub u64);

impl EntryHandle {
    pub fn offset(&self) -> u64 {
        self.0
    }
}

/// How [`offset_of_name`](super::ZipArchive::offset_of_name) compares names.
///
/// Bit 0 selects an exact match (otherwise the archived name only needs to
/// contain the search string), bit 1 selects case-sensitive comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchFlags(u8);

impl MatchFlags {
    pub const EXACT: MatchFlags = MatchFlags(0b01);
    pub const CASE_SENSITIVE: MatchFlags = MatchFlags(0b10);

    pub const fn from_bits(bits: u8) -> Self {
        MatchFlags(bits & 0b11)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub const fn union(self, other: MatchFlags) -> Self {
        MatchFlags(self.0 | other.0)
    }

    pub fn is_exact(&self) -> bool {
        self.0 & Self::EXACT.0 != 0
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.0 & Self::CASE_SENSITIVE.0 != 0
    }

    /// Test an archived `name` against the search string `needle`.
    ///
    /// For substring searches without case sensitivity, the case-insensitive
    /// scan is only used when the two lengths differ; equal-length names fall
    /// back to the ordinary case-sensitive containment test.
    pub fn matches(&self, name: &[u8], needle: &[u8]) -> bool {
        if self.is_exact() {
            if self.is_case_sensitive() {
                name == needle
            } else {
                name.eq_ignore_ascii_case(needle)
            }
        } else if self.is_case_sensitive() || name.len() == needle.len() {
            contains(name, needle)
        } else {
            contains_ignore_ascii_case(name, needle)
        }
    }
}

impl std::ops::BitOr for MatchFlags {
    type Output = MatchFlags;

    fn bitor(self, rhs: MatchFlags) -> MatchFlags {
        self.union(rhs)
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

fn contains_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty()
        || haystack
            .windows(needle.len())
            .any(|w| w.eq_ignore_ascii_case(needle))
}

/// A decoded MS-DOS timestamp.
///
/// Fields follow the C `struct tm` conventions: `month` is zero-based and
/// `year` counts years since 1900, so the DOS epoch of 1980 is `80`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    pub seconds: u8,
    pub minutes: u8,
    pub hours: u8,
    pub day: u8,
    pub month: i8,
    pub year: u16,
}

impl DosDateTime {
    pub fn from_msdos(date: u16, time: u16) -> Self {
        Self {
            seconds: ((time & 0x1F) * 2) as u8,
            minutes: ((time >> 5) & 0x3F) as u8,
            hours: (time >> 11) as u8,
            day: (date & 0x1F) as u8,
            month: ((date >> 5) & 0x0F) as i8 - 1,
            year: (date >> 9) + 80,
        }
    }

    /// Calendar year, e.g. `2024`.
    pub fn calendar_year(&self) -> i32 {
        1900 + self.year as i32
    }

    /// Convert to a naive date-time, `None` if the fields do not form a valid date.
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        let month = u32::try_from(self.month).ok()? + 1;
        NaiveDate::from_ymd_opt(self.calendar_year(), month, self.day as u32)?.and_hms_opt(
            self.hours as u32,
            self.minutes as u32,
            self.seconds as u32,
        )
    }

    /// Interpret the timestamp in the local time zone.
    pub fn to_system_time(&self) -> Option<SystemTime> {
        let naive = self.to_naive()?;
        let local = Local.from_local_datetime(&naive).earliest()?;
        Some(local.into())
    }
}

/// Metadata of one archive entry, as reported by sequential iteration.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub handle: EntryHandle,
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub crc_32: u32,
    pub modified: DosDateTime,
    pub is_directory: bool,
}
