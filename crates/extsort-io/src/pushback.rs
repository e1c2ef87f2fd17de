//! A single-record carry-over buffer between successive `StreamReader`
//! reads.

use extsort_core::{Error, Result};

/// Holds at most one record that a `StreamReader` could not fit into the
/// caller's `KeyStore` on the previous call, so it can be retried first on
/// the next one.
#[derive(Default)]
pub struct Pushback {
    buf: Vec<u8>,
}

impl Pushback {
    /// An empty pushback buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if no record is currently held back.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The held-back bytes, if any.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Stores `data` for the next read, replacing anything previously
    /// held.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhaustion`] if `data` exceeds `max_len`
    /// (the configured record ceiling); pushing back more than one
    /// record's worth of bytes indicates a caller bug, not a sizing
    /// problem, but we report it the same way other capacity failures are
    /// reported.
    pub fn push(&mut self, data: &[u8], max_len: usize) -> Result<()> {
        if data.len() > max_len {
            return Err(Error::ResourceExhaustion(format!(
                "pushback of {} bytes exceeds max record length {}",
                data.len(),
                max_len
            )));
        }
        self.buf.clear();
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// Takes the held-back bytes, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let pb = Pushback::new();
        assert!(pb.is_empty());
    }

    #[test]
    fn push_then_take_roundtrips() {
        let mut pb = Pushback::new();
        pb.push(b"partial record", 64).unwrap();
        assert!(!pb.is_empty());
        assert_eq!(pb.take(), b"partial record");
        assert!(pb.is_empty());
    }

    #[test]
    fn oversized_pushback_is_rejected() {
        let mut pb = Pushback::new();
        assert!(pb.push(&[0u8; 100], 10).is_err());
    }
}
