//! Record comparators shared by the `KeyStore` sorter and the run merger.

use std::cmp::Ordering;
use std::ffi::CString;

/// A total order over byte strings.
pub trait Collator: Send + Sync {
    /// Compares two records. Implementations must agree with the ordering
    /// used elsewhere in the system: on an equal common prefix, the
    /// shorter record is lesser.
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;
}

/// Plain byte-lexicographic order, shorter-is-lesser on a shared prefix.
/// Zero-cost: no allocation, no locking, usable from any thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByteOrderCollator;

impl Collator for ByteOrderCollator {
    #[inline]
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        let common = a.len().min(b.len());
        match a[..common].cmp(&b[..common]) {
            Ordering::Equal => a.len().cmp(&b.len()),
            ord => ord,
        }
    }
}

/// Host locale collation via POSIX `strcoll_l`.
pub struct LocaleCollator {
    locale: libc::locale_t,
}

// SAFETY: a `locale_t` obtained from `newlocale` may be used concurrently
// by multiple threads for lookups (`strcoll_l` does not mutate it); only
// `freelocale` on drop requires exclusive access, which `Drop` guarantees.
unsafe impl Send for LocaleCollator {}
unsafe impl Sync for LocaleCollator {}

impl LocaleCollator {
    /// Opens the named locale (e.g. `"en_US.UTF-8"`) for collation.
    ///
    /// # Errors
    ///
    /// Returns an error message suitable for `Error::Configuration` if the
    /// locale name is not recognised by the host.
    pub fn new(name: &str) -> Result<Self, String> {
        let c_name = CString::new(name).map_err(|_| "locale name contains a NUL byte".to_string())?;
        // SAFETY: `c_name` is a valid, NUL-terminated C string for the
        // duration of this call; the result is checked immediately.
        let locale = unsafe { libc::newlocale(libc::LC_COLLATE_MASK, c_name.as_ptr(), std::ptr::null_mut()) };
        if locale.is_null() {
            return Err(format!("unknown or unsupported locale: {name}"));
        }
        Ok(Self { locale })
    }
}

impl Collator for LocaleCollator {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        // `strcoll_l` compares NUL-terminated strings; records may contain
        // embedded NULs in principle, but sorted key material in practice
        // never does.
        let a = CString::new(a).unwrap_or_default();
        let b = CString::new(b).unwrap_or_default();
        // SAFETY: both C strings are valid and NUL-terminated for the
        // duration of this call; `self.locale` is valid until `Drop`.
        let result = unsafe { libc::strcoll_l(a.as_ptr(), b.as_ptr(), self.locale) };
        result.cmp(&0)
    }
}

impl Drop for LocaleCollator {
    fn drop(&mut self) {
        // SAFETY: `self.locale` was obtained from `newlocale` and is not
        // shared beyond this struct's lifetime.
        unsafe {
            libc::freelocale(self.locale);
        }
    }
}

/// Builds the configured collator: byte order by default, or a
/// [`LocaleCollator`] if `locale` is `Some`.
///
/// # Errors
///
/// Propagates [`LocaleCollator::new`]'s error if the named locale is
/// unknown.
pub fn build_collator(locale: Option<&str>) -> Result<Box<dyn Collator>, String> {
    match locale {
        Some(name) => Ok(Box::new(LocaleCollator::new(name)?)),
        None => Ok(Box::new(ByteOrderCollator)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_order_prefers_shorter_on_common_prefix() {
        assert_eq!(ByteOrderCollator.compare(b"a", b"ab"), Ordering::Less);
        assert_eq!(ByteOrderCollator.compare(b"ab", b"a"), Ordering::Greater);
        assert_eq!(ByteOrderCollator.compare(b"ab", b"ab"), Ordering::Equal);
    }

    #[test]
    fn byte_order_respects_byte_value() {
        assert_eq!(ByteOrderCollator.compare(b"a", b"b"), Ordering::Less);
    }

    #[test]
    fn default_collator_is_byte_order() {
        let collator = build_collator(None).unwrap();
        assert_eq!(collator.compare(b"x", b"y"), Ordering::Less);
    }
}
