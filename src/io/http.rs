use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, HeaderName, RANGE};
use reqwest::StatusCode;
use std::cell::Cell;
use std::io;
use std::time::Duration;

use super::ReadAt;
use anyhow::{Context, Result, anyhow, bail, ensure};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 10;
const BACKOFF_STEP: Duration = Duration::from_millis(500);

/// An archive served over HTTP, read through `Range` requests.
///
/// Only the byte ranges the reader asks for are downloaded, so locating
/// `content.xml` in a large document costs a handful of small requests.
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    transferred: Cell<u64>,
}

impl HttpRangeReader {
    /// Probe `url` with a HEAD request and keep the reported length.
    ///
    /// Fails when the server does not advertise byte ranges or does not send
    /// a `Content-Length`.
    pub fn new(url: String) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let size = probe(&client, &url).with_context(|| format!("cannot read {url}"))?;

        log::debug!("{url}: {size} bytes, range requests supported");

        Ok(Self {
            client,
            url,
            size,
            transferred: Cell::new(0),
        })
    }

    /// Body bytes received so far.
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred.get()
    }

    /// Fill `buf` from `offset`, clamped to the end of the resource.
    fn fetch_range(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let last = (offset + buf.len() as u64 - 1).min(self.size - 1);
        let wanted = (last - offset + 1) as usize;

        let mut filled = 0;
        let mut attempt = 0;
        while filled < wanted {
            let range = format!("bytes={}-{}", offset + filled as u64, last);
            let resp = match self.client.get(&self.url).header(RANGE, &range).send() {
                Ok(resp) => resp,
                Err(e) if e.is_timeout() || e.is_connect() => {
                    attempt += 1;
                    ensure!(attempt < MAX_ATTEMPTS, "giving up on {range} after {attempt} attempts: {e}");
                    log::warn!("{range}: {e}, retrying ({attempt}/{MAX_ATTEMPTS})");
                    std::thread::sleep(BACKOFF_STEP * attempt);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            ensure!(
                resp.status() == StatusCode::PARTIAL_CONTENT,
                "{range}: unexpected status {}",
                resp.status()
            );
            let body = resp.bytes()?;
            ensure!(!body.is_empty(), "{range}: empty response body");

            let n = body.len().min(wanted - filled);
            buf[filled..filled + n].copy_from_slice(&body[..n]);
            filled += n;
            self.transferred.set(self.transferred.get() + n as u64);
        }

        Ok(filled)
    }
}

fn probe(client: &Client, url: &str) -> Result<u64> {
    let resp = client.head(url).send()?;
    if !resp.status().is_success() {
        bail!("HEAD returned {}", resp.status());
    }

    let ranges = header_str(&resp, ACCEPT_RANGES).unwrap_or("none");
    if !ranges.contains("bytes") {
        bail!("server does not accept byte ranges");
    }

    header_str(&resp, CONTENT_LENGTH)
        .and_then(|len| len.parse().ok())
        .ok_or_else(|| anyhow!("server sent no Content-Length"))
}

fn header_str(resp: &Response, name: HeaderName) -> Option<&str> {
    resp.headers().get(name).and_then(|v| v.to_str().ok())
}

impl ReadAt for HttpRangeReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        self.fetch_range(offset, buf).map_err(io::Error::other)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
