//! Positioned stream over a [`ReadAt`] source.

use std::io::{self, Read, Seek, SeekFrom};

use super::ReadAt;

/// Size of the read-ahead window kept by [`SourceStream`].
const WINDOW_SIZE: usize = 8 * 1024;

/// Adapts any [`ReadAt`] source into a `Read + Seek` stream.
///
/// Reads are served from a read-ahead window of the most recently fetched
/// bytes, so small reads and short backwards seeks (the data descriptor scan
/// steps back three bytes after every four-byte read) do not each turn into
/// a positional read on the source. Seeking never touches the source.
pub struct SourceStream<R: ReadAt> {
    source: R,
    pos: u64,
    window: Vec<u8>,
    window_start: u64,
}

impl<R: ReadAt> SourceStream<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            pos: 0,
            window: Vec::with_capacity(WINDOW_SIZE),
            window_start: 0,
        }
    }

    /// Get a reference to the underlying source.
    pub fn source(&self) -> &R {
        &self.source
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    fn window_end(&self) -> u64 {
        self.window_start + self.window.len() as u64
    }

    fn fill_window(&mut self) -> io::Result<()> {
        self.window.resize(WINDOW_SIZE, 0);
        let n = self.source.read_at(self.pos, &mut self.window)?;
        self.window.truncate(n);
        self.window_start = self.pos;
        Ok(())
    }
}

impl<R: ReadAt> Read for SourceStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        // Large reads bypass the window entirely
        if buf.len() >= WINDOW_SIZE {
            let n = self.source.read_at(self.pos, buf)?;
            self.pos += n as u64;
            return Ok(n);
        }

        if self.pos < self.window_start || self.pos >= self.window_end() {
            self.fill_window()?;
        }

        let start = (self.pos - self.window_start) as usize;
        let available = &self.window[start..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n as u64;
        Ok(n)
    }
}

impl<R: ReadAt> Seek for SourceStream<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
            SeekFrom::End(delta) => self.source.size().checked_add_signed(delta),
        };

        match target {
            Some(target) => {
                self.pos = target;
                Ok(target)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.pos)
    }
}
