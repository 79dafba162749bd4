/// Failures reported by the archive reader.
///
/// The end of the entry list is not an error: header parsing reports it as
/// `Ok(None)`. A checksum mismatch is normally carried as a status next to
/// a usable payload and only becomes [`ZipError::ChecksumMismatch`] when the
/// caller asks for a strictly verified payload.
#[derive(thiserror::Error, Debug)]
pub enum ZipError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Corrupt local file header: {0}")]
    Corrupt(String),

    #[error("Checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("No matching entry in archive")]
    NotFound,

    #[error("Unsupported compression method: {0}")]
    UnsupportedCompression(u16),
}

pub type Result<T, E = ZipError> = std::result::Result<T, E>;
