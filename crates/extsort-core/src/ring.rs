//! A byte ring buffer backed by a doubly-mapped virtual memory region.
//!
//! The same physical pages are mapped twice, back to back, so that any
//! sub-range of up to `capacity()` bytes starting anywhere in the ring is a
//! single contiguous slice — callers never need to special-case a wrapped
//! read or write. This is the same trick used by lock-free audio and
//! network ring buffers ("magic ring buffer" / VM-mirror buffer).
//!
//! `RingBuffer` itself holds no thread-safety machinery: callers in this
//! crate serialize access to a ring through [`crate::sync_io::SyncIO`]
//! rather than through atomics inside the ring, since at most one reader
//! and one writer ever touch a given ring concurrently and the `lo`/`hi`
//! cursors are only ever advanced by their respective side.

use crate::error::{Error, Result};
use std::ptr::NonNull;

/// A page-aligned, doubly-mapped byte ring.
pub struct RingBuffer {
    /// Base address of the 2x virtual mapping; `base[0..capacity]` and
    /// `base[capacity..2*capacity]` alias the same physical pages.
    base: NonNull<u8>,
    /// Size of one physical copy, in bytes. Always a multiple of the page
    /// size.
    capacity: usize,
    /// Consumer cursor, `0 <= lo < capacity`.
    lo: usize,
    /// Producer cursor, `0 <= hi < capacity`.
    hi: usize,
    /// `true` once `hi` has lapped `lo` at least once, i.e. the ring holds
    /// `capacity` live bytes rather than `0`. Distinguishes "empty" from
    /// "full" when `lo == hi`.
    full: bool,
}

// SAFETY: `RingBuffer` owns its mapping exclusively; no other code holds a
// pointer into it. It is safe to move between threads (the mapping is not
// thread-local), and callers already serialize concurrent access via
// `SyncIO`, so `Sync` is sound as long as that discipline is honored.
unsafe impl Send for RingBuffer {}
unsafe impl Sync for RingBuffer {}

impl RingBuffer {
    /// Creates a new ring of at least `requested` bytes, rounded up to the
    /// system page size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhaustion`] if the anonymous backing file,
    /// the virtual address reservation, or either mapping cannot be
    /// created.
    pub fn new(requested: usize) -> Result<Self> {
        let page_size = page_size();
        let capacity = round_up(requested.max(1), page_size);

        // SAFETY: the return value is checked below before use; all
        // arguments are constants or values we just validated.
        let fd = unsafe {
            let template = b"/tmp/extsort-ring-XXXXXX\0";
            let mut path = template.to_vec();
            let fd = libc::mkstemp(path.as_mut_ptr().cast());
            if fd < 0 {
                return Err(Error::ResourceExhaustion(
                    "mkstemp failed for ring buffer backing file".into(),
                ));
            }
            // Unlink immediately: the fd keeps the inode alive, and no
            // other process needs to see the scratch file.
            libc::unlink(path.as_ptr().cast());
            fd
        };

        // SAFETY: fd is a valid, just-created file descriptor.
        let truncated = unsafe { libc::ftruncate(fd, capacity as libc::off_t) };
        if truncated != 0 {
            // SAFETY: fd is open and owned by this call.
            unsafe { libc::close(fd) };
            return Err(Error::ResourceExhaustion(
                "ftruncate failed for ring buffer backing file".into(),
            ));
        }

        // Reserve a 2x window with no access so the two real mappings land
        // at predictable, adjacent addresses.
        // SAFETY: all arguments are valid for an anonymous PROT_NONE
        // reservation; the result is checked immediately.
        let reservation = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                capacity * 2,
                libc::PROT_NONE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if reservation == libc::MAP_FAILED {
            // SAFETY: fd is open and owned by this call.
            unsafe { libc::close(fd) };
            return Err(Error::ResourceExhaustion(
                "failed to reserve virtual address space for ring buffer".into(),
            ));
        }

        let low_addr = reservation;
        // SAFETY: `low_addr` lies inside the just-reserved region, which we
        // are about to overwrite with a fixed mapping of the same size.
        let low = unsafe {
            libc::mmap(
                low_addr,
                capacity,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED | libc::MAP_FIXED,
                fd,
                0,
            )
        };
        // SAFETY: `high_addr` is the second half of the reservation.
        let high_addr = (reservation as usize + capacity) as *mut libc::c_void;
        let high = unsafe {
            libc::mmap(
                high_addr,
                capacity,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED | libc::MAP_FIXED,
                fd,
                0,
            )
        };

        // SAFETY: fd is no longer needed once both mappings exist; the
        // mappings keep the underlying pages alive.
        unsafe { libc::close(fd) };

        if low == libc::MAP_FAILED || high == libc::MAP_FAILED {
            // SAFETY: `reservation` is a valid mapping of `capacity * 2`
            // bytes that we own and are abandoning.
            unsafe { libc::munmap(reservation, capacity * 2) };
            return Err(Error::ResourceExhaustion(
                "failed to double-map ring buffer backing file".into(),
            ));
        }

        let base = NonNull::new(low.cast::<u8>()).ok_or_else(|| {
            Error::ResourceExhaustion("ring buffer mapping returned a null base".into())
        })?;

        Ok(Self {
            base,
            capacity,
            lo: 0,
            hi: 0,
            full: false,
        })
    }

    /// Logical capacity of the ring, in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live (unread) bytes currently in the ring.
    #[inline]
    pub fn fill(&self) -> usize {
        if self.full {
            self.capacity
        } else if self.hi >= self.lo {
            self.hi - self.lo
        } else {
            self.capacity - self.lo + self.hi
        }
    }

    /// Number of bytes that can still be written before the ring is full.
    #[inline]
    pub fn free(&self) -> usize {
        self.capacity - self.fill()
    }

    /// A linear view of the next `len` unread bytes starting at `lo`.
    ///
    /// Valid because of the double mapping: any `len <= capacity` starting
    /// anywhere in `[0, capacity)` is addressable without wrapping.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the current fill level.
    #[inline]
    pub fn peek(&self, len: usize) -> &[u8] {
        assert!(len <= self.fill(), "peek past the live region of the ring");
        // SAFETY: `self.lo + len <= self.lo + capacity < 2*capacity`, which
        // is within the doubly-mapped region; the slice does not outlive
        // `&self` and no mutation happens through `base` while it is held.
        unsafe { std::slice::from_raw_parts(self.base.as_ptr().add(self.lo), len) }
    }

    /// A linear, writable view of the next `len` free bytes starting at
    /// `hi`, for the producer to fill in place.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the current free space.
    #[inline]
    pub fn peek_mut(&mut self, len: usize) -> &mut [u8] {
        assert!(len <= self.free(), "peek_mut past the free region of the ring");
        // SAFETY: same reasoning as `peek`; `&mut self` guarantees no other
        // borrow of the ring is live.
        unsafe { std::slice::from_raw_parts_mut(self.base.as_ptr().add(self.hi), len) }
    }

    /// Advances the consumer cursor by `len` bytes, marking them as read.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the current fill level.
    pub fn advance_lo(&mut self, len: usize) {
        assert!(len <= self.fill(), "advance_lo past the live region of the ring");
        if len > 0 {
            self.full = false;
        }
        self.lo = wrap(self.lo + len, self.capacity);
    }

    /// Advances the producer cursor by `len` bytes, marking them as
    /// written and live for the consumer.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the current free space.
    pub fn advance_hi(&mut self, len: usize) {
        assert!(len <= self.free(), "advance_hi past the free region of the ring");
        self.hi = wrap(self.hi + len, self.capacity);
        if len > 0 && self.hi == self.lo {
            self.full = true;
        }
    }

    /// Copies `data` into the ring and advances the producer cursor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhaustion`] if `data` does not fit in the
    /// current free space.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > self.free() {
            return Err(Error::ResourceExhaustion(format!(
                "ring buffer has {} free bytes, need {}",
                self.free(),
                data.len()
            )));
        }
        self.peek_mut(data.len()).copy_from_slice(data);
        self.advance_hi(data.len());
        Ok(())
    }
}

impl Drop for RingBuffer {
    fn drop(&mut self) {
        // SAFETY: `base` was obtained from a `2*capacity`-sized mmap
        // reservation that this `RingBuffer` uniquely owns.
        unsafe {
            libc::munmap(self.base.as_ptr().cast(), self.capacity * 2);
        }
    }
}

#[inline]
fn wrap(value: usize, capacity: usize) -> usize {
    if value >= capacity {
        value - capacity
    } else {
        value
    }
}

#[inline]
fn round_up(value: usize, multiple: usize) -> usize {
    value.div_ceil(multiple) * multiple
}

fn page_size() -> usize {
    // SAFETY: `sysconf` with `_SC_PAGESIZE` has no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size <= 0 {
        4096
    } else {
        size as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_capacity_up_to_page_size() {
        let rb = RingBuffer::new(1).unwrap();
        assert_eq!(rb.capacity(), page_size());
        assert_eq!(rb.fill(), 0);
        assert_eq!(rb.free(), rb.capacity());
    }

    #[test]
    fn write_and_peek_roundtrip() {
        let mut rb = RingBuffer::new(64).unwrap();
        rb.write(b"hello world").unwrap();
        assert_eq!(rb.fill(), 11);
        assert_eq!(rb.peek(11), b"hello world");
    }

    #[test]
    fn any_subrange_is_linear_across_the_wrap() {
        let mut rb = RingBuffer::new(1).unwrap();
        let cap = rb.capacity();

        // Fill, drain most of it, then write again so `hi` wraps past the
        // physical end while `lo` has not — the classic wrap case.
        rb.write(&vec![1u8; cap]).unwrap();
        rb.advance_lo(cap - 4);
        rb.write(&[9, 9, 9, 9]).unwrap();

        assert_eq!(rb.fill(), 8);
        let view = rb.peek(8);
        assert_eq!(view, &[1, 1, 1, 1, 9, 9, 9, 9]);
    }

    #[test]
    fn full_ring_reports_zero_free_space() {
        let mut rb = RingBuffer::new(1).unwrap();
        let cap = rb.capacity();
        rb.write(&vec![0u8; cap]).unwrap();
        assert_eq!(rb.free(), 0);
        assert!(rb.write(&[1]).is_err());
    }
}
