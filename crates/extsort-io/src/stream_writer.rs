//! Buffered, newline-delimited record output.

use extsort_core::Result;
use std::io::Write;

/// Writes records to a byte stream, one per line.
pub struct StreamWriter<W> {
    sink: W,
    buf: Vec<u8>,
}

impl<W: Write> StreamWriter<W> {
    /// Creates a writer with an internal buffer of `buffer_size` bytes.
    #[must_use]
    pub fn new(sink: W, buffer_size: usize) -> Self {
        Self {
            sink,
            buf: Vec::with_capacity(buffer_size.max(1)),
        }
    }

    /// Appends `key` followed by a newline, flushing first if it would not
    /// fit in the internal buffer. Records larger than the buffer are
    /// written directly, bypassing buffering.
    ///
    /// # Errors
    ///
    /// Propagates any I/O error from the underlying sink.
    pub fn write(&mut self, key: &[u8]) -> Result<()> {
        let needed = key.len() + 1;
        if needed > self.buf.capacity() {
            self.flush()?;
            self.sink.write_all(key)?;
            self.sink.write_all(b"\n")?;
            return Ok(());
        }
        if self.buf.len() + needed > self.buf.capacity() {
            self.flush()?;
        }
        self.buf.extend_from_slice(key);
        self.buf.push(b'\n');
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if !self.buf.is_empty() {
            self.sink.write_all(&self.buf)?;
            self.buf.clear();
        }
        Ok(())
    }

    /// Flushes any buffered bytes. Must be called once no more records
    /// will be written.
    ///
    /// # Errors
    ///
    /// Propagates any I/O error from the underlying sink.
    pub fn end(&mut self) -> Result<()> {
        self.flush()?;
        self.sink.flush()?;
        Ok(())
    }
}
