//! Streams length-prefixed records back out of a run file, either raw or
//! through an LZ4 decompression frame.
//!
//! Both variants share the same ring-buffered framing logic; they differ
//! only in which byte stream feeds the ring.

use extsort_core::{Error, Result, RingBuffer};
use lz4_flex::frame::FrameDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::warn;

const LENGTH_PREFIX: usize = 8;

/// Byte length of the frame header every run-file record is prefixed with.
/// A reader's ring buffer must hold at least `RECORD_HEADER_BYTES +
/// max_element` bytes for the largest permitted record to ever be read
/// whole.
pub const RECORD_HEADER_BYTES: usize = LENGTH_PREFIX;

/// Streams records out of a run file one at a time.
pub trait RunReader {
    /// Returns the next record, or `None` at end of file.
    ///
    /// The returned slice is valid only until the next call to `next()` —
    /// callers must finish using it (copy it out, compare it, write it)
    /// before asking for another record.
    ///
    /// # Errors
    ///
    /// Propagates I/O or codec errors.
    fn next(&mut self) -> Result<Option<&[u8]>>;
}

/// Fills `ring` from `source` until either `target` bytes are live or the
/// source is exhausted. Returns `true` if the source reached EOF.
fn fill(ring: &mut RingBuffer, source: &mut impl Read, target: usize) -> Result<bool> {
    loop {
        if ring.fill() >= target || ring.free() == 0 {
            return Ok(false);
        }
        let want = ring.free().min(target - ring.fill());
        let dest = ring.peek_mut(want);
        let n = source.read(dest)?;
        if n == 0 {
            return Ok(true);
        }
        ring.advance_hi(n);
    }
}

struct RingReader<R> {
    source: R,
    ring: RingBuffer,
    eof: bool,
}

impl<R: Read> RingReader<R> {
    fn new(source: R, ring_capacity: usize) -> Result<Self> {
        Ok(Self {
            source,
            ring: RingBuffer::new(ring_capacity)?,
            eof: false,
        })
    }

    fn next(&mut self) -> Result<Option<Vec<u8>>> {
        if !self.eof && self.ring.fill() < LENGTH_PREFIX {
            self.eof = fill(&mut self.ring, &mut self.source, LENGTH_PREFIX)?;
        }
        if self.ring.fill() < LENGTH_PREFIX {
            if self.ring.fill() > 0 {
                warn!(
                    bytes = self.ring.fill(),
                    "run file ends mid-frame; discarding trailing bytes"
                );
            }
            return Ok(None);
        }

        let header: [u8; LENGTH_PREFIX] = self.ring.peek(LENGTH_PREFIX).try_into().unwrap();
        let len = u64::from_le_bytes(header) as usize;

        if !self.eof && self.ring.fill() < LENGTH_PREFIX + len {
            self.eof = fill(&mut self.ring, &mut self.source, LENGTH_PREFIX + len)?;
        }
        if self.ring.fill() < LENGTH_PREFIX + len {
            warn!(
                declared = len,
                available = self.ring.fill().saturating_sub(LENGTH_PREFIX),
                "run file truncated mid-record; discarding trailing bytes"
            );
            return Ok(None);
        }

        self.ring.advance_lo(LENGTH_PREFIX);
        let record = self.ring.peek(len).to_vec();
        self.ring.advance_lo(len);
        Ok(Some(record))
    }
}

/// Reads an uncompressed run file written by [`crate::run_writer::RawRunWriter`].
pub struct RawRunReader {
    inner: RingReader<BufReader<File>>,
    last: Option<Vec<u8>>,
}

impl RawRunReader {
    /// Opens `path` with a ring buffer of at least `ring_capacity` bytes.
    ///
    /// # Errors
    ///
    /// Propagates any I/O error opening the file or building the ring.
    pub fn open(path: &Path, ring_capacity: usize) -> Result<Self> {
        Ok(Self {
            inner: RingReader::new(BufReader::new(File::open(path)?), ring_capacity)?,
            last: None,
        })
    }
}

impl RunReader for RawRunReader {
    fn next(&mut self) -> Result<Option<&[u8]>> {
        self.last = self.inner.next()?;
        Ok(self.last.as_deref())
    }
}

/// Reads a run file written by [`crate::run_writer::FramedRunWriter`],
/// decompressing through the LZ4 frame format as it streams.
pub struct FramedRunReader {
    inner: RingReader<FrameDecoder<BufReader<File>>>,
    last: Option<Vec<u8>>,
}

impl FramedRunReader {
    /// Opens `path` with a ring buffer of at least `ring_capacity` bytes
    /// for the decompressed record stream.
    ///
    /// # Errors
    ///
    /// Propagates any I/O error opening the file or building the ring.
    pub fn open(path: &Path, ring_capacity: usize) -> Result<Self> {
        let decoder = FrameDecoder::new(BufReader::new(File::open(path)?));
        Ok(Self {
            inner: RingReader::new(decoder, ring_capacity)?,
            last: None,
        })
    }
}

impl RunReader for FramedRunReader {
    fn next(&mut self) -> Result<Option<&[u8]>> {
        self.last = self.inner.next().map_err(|e| match e {
            Error::Io(io) => Error::Codec(io.to_string()),
            other => other,
        })?;
        Ok(self.last.as_deref())
    }
}
