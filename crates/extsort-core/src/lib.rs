//! Constant-memory building blocks for out-of-core sorting.
//!
//! * [`RingBuffer`] — a doubly-mapped byte ring so any sub-range up to its
//!   capacity is addressable as a linear slice.
//! * [`KeyStore`] — a bounded arena for records plus a sortable index,
//!   with in-place, allocation-free insert and sort.
//! * [`Collator`] and friends — byte-order or locale-aware comparison,
//!   shared by the `KeyStore` sorter and the run merger.
//! * [`SyncIO`] — a three-class counting semaphore (optional global cap,
//!   plus independent reader/writer classes) used to bound concurrent
//!   disk I/O across run-creation workers.
//!
//! ```
//! use extsort_core::{KeyStore, InsertOutcome, ByteOrderCollator};
//!
//! let mut ks = KeyStore::new(4096);
//! assert_eq!(ks.insert(b"banana"), InsertOutcome::Inserted);
//! assert_eq!(ks.insert(b"apple"), InsertOutcome::Inserted);
//! ks.sort(&ByteOrderCollator);
//! assert_eq!(ks.iter().collect::<Vec<_>>(), vec![b"apple".as_slice(), b"banana"]);
//! ```

mod collation;
mod error;
mod keystore;
mod ring;
mod sync_io;

pub use collation::{build_collator, ByteOrderCollator, Collator, LocaleCollator};
pub use error::{Error, Result};
pub use keystore::{InsertOutcome, KeyStore};
pub use ring::RingBuffer;
pub use sync_io::{Class, Permit, SyncIO};
