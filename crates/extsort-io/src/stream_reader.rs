//! Newline-delimited ingestion of records into a `KeyStore`.
//!
//! At most one worker ever holds the `READER` permit at a time (see
//! `extsort_core::SyncIO`), so a single blocking `Read::read` call is
//! enough here; there is no need for non-blocking file descriptors or a
//! poll loop to interleave reads with other work.

use extsort_core::{Error, InsertOutcome, KeyStore, Result};
use std::io::Read;
use tracing::warn;

use crate::pushback::Pushback;

/// Reads newline-delimited records from a byte stream into a `KeyStore`.
pub struct StreamReader<R> {
    source: R,
    buf: Vec<u8>,
    /// Number of live bytes at the front of `buf`, starting at index 0.
    len: usize,
    /// Fraction of `buf.capacity()` to fill before stopping to insert,
    /// clamped to `(0, 1]`.
    trigger_fraction: f64,
    /// Upper bound on a single record's length, in bytes. `buf` is always
    /// at least this large, so a record up to this length can never be
    /// truncated regardless of any performance floor applied to `buf`'s
    /// actual allocation.
    max_element: usize,
}

impl<R: Read> StreamReader<R> {
    /// Creates a reader whose internal buffer is sized to hold at least one
    /// `max_element`-byte record, matching the sizing used elsewhere for
    /// pushback and run-file I/O.
    ///
    /// `trigger_fraction` is clamped to `(0, 1]` — values above `1.0` are
    /// capped to `1.0` (fill to the full buffer before inserting).
    #[must_use]
    pub fn new(source: R, max_element: usize, trigger_fraction: f64) -> Self {
        Self {
            source,
            buf: vec![0u8; max_element.max(1)],
            len: 0,
            trigger_fraction: trigger_fraction.min(1.0).max(f64::MIN_POSITIVE),
            max_element,
        }
    }

    fn trigger(&self) -> usize {
        ((self.buf.len() as f64) * self.trigger_fraction).ceil() as usize
    }

    /// Fills `keystore` with as many complete records as fit, carrying any
    /// partially-consumed tail in `pushback`.
    ///
    /// Returns `Ok(true)` if more input remains to be read on a future
    /// call, `Ok(false)` once the stream is exhausted and fully consumed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordTooLong`] if a record exceeds the
    /// `KeyStore`'s capacity outright (not just the currently free space).
    pub fn read(&mut self, keystore: &mut KeyStore, pushback: &mut Pushback) -> Result<bool> {
        if !pushback.is_empty() {
            let carried = pushback.take();
            self.buf[..carried.len()].copy_from_slice(&carried);
            self.len = carried.len();
        }

        let trigger = self.trigger();
        let mut eof = false;
        while self.len < trigger && !eof {
            let n = self.source.read(&mut self.buf[self.len..])?;
            if n == 0 {
                eof = true;
            } else {
                self.len += n;
            }
        }

        let mut consumed = 0;
        loop {
            let window = &self.buf[consumed..self.len];
            let Some(newline) = window.iter().position(|&b| b == b'\n') else {
                break;
            };
            let record = &self.buf[consumed..consumed + newline];
            match keystore.insert(record) {
                InsertOutcome::Inserted => {
                    consumed += newline + 1;
                }
                InsertOutcome::KeyTooLong => {
                    return Err(Error::RecordTooLong {
                        len: record.len() as u64,
                        max: keystore.max_key_len(),
                    });
                }
                InsertOutcome::NotEnoughSpace => {
                    pushback.push(&self.buf[consumed..self.len], self.max_element)?;
                    self.len = 0;
                    return Ok(true);
                }
            }
        }

        // Compact: move the unconsumed tail (a partial record without a
        // newline yet, or nothing) to the front of the buffer.
        self.buf.copy_within(consumed..self.len, 0);
        self.len -= consumed;

        if eof {
            if self.len > 0 {
                warn!(
                    bytes = self.len,
                    "dropping unterminated trailing record at end of stream"
                );
                self.len = 0;
            }
            return Ok(false);
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(input: &str, ks_capacity: usize, buf_size: usize) -> Vec<String> {
        let mut reader = StreamReader::new(Cursor::new(input.as_bytes().to_vec()), buf_size, 0.9);
        let mut pushback = Pushback::new();
        let mut out = Vec::new();
        loop {
            let mut ks = KeyStore::new(ks_capacity);
            let more = reader.read(&mut ks, &mut pushback).unwrap();
            for record in ks.iter() {
                out.push(String::from_utf8(record.to_vec()).unwrap());
            }
            if !more && pushback.is_empty() {
                break;
            }
        }
        out
    }

    #[test]
    fn empty_input_yields_no_records() {
        assert_eq!(read_all("", 4096, 64), Vec::<String>::new());
    }

    #[test]
    fn single_terminated_record() {
        assert_eq!(read_all("hello\n", 4096, 64), vec!["hello"]);
    }

    #[test]
    fn trailing_record_without_newline_is_dropped() {
        assert_eq!(read_all("b\na", 4096, 64), vec!["b"]);
    }

    #[test]
    fn multiple_records_preserve_order_and_duplicates() {
        assert_eq!(
            read_all("a\nb\na\n", 4096, 64),
            vec!["a".to_string(), "b".to_string(), "a".to_string()]
        );
    }

    #[test]
    fn small_keystore_forces_pushback_across_reads() {
        // KeyStore capacity is small enough that only the first record
        // fits per fill, so the reader must carry the rest via pushback
        // across multiple calls, and the caller must drain the KeyStore
        // (via `clear`) between calls for forward progress.
        let mut reader = StreamReader::new(Cursor::new(b"one\ntwo\nthree\n".to_vec()), 64, 0.9);
        let mut pushback = Pushback::new();
        let mut out = Vec::new();
        loop {
            let mut ks = KeyStore::new(16);
            let more = reader.read(&mut ks, &mut pushback).unwrap();
            for record in ks.iter() {
                out.push(String::from_utf8(record.to_vec()).unwrap());
            }
            if !more {
                break;
            }
        }
        assert_eq!(out, vec!["one", "two", "three"]);
    }
}
