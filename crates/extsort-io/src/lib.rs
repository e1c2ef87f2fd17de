//! Stream ingestion, stream output, and run-file I/O for the out-of-core
//! sorter.
//!
//! * [`StreamReader`] / [`Pushback`] — newline-delimited ingestion into a
//!   `KeyStore`, carrying a partial trailing record across reads.
//! * [`StreamWriter`] — buffered, newline-delimited output.
//! * [`RunWriter`], [`RawRunWriter`], [`FramedRunWriter`] — serialize a
//!   sorted `KeyStore` to a run file, optionally through an LZ4 frame.
//! * [`RunReader`], [`RawRunReader`], [`FramedRunReader`] — stream
//!   records back out of a run file.
//! * [`RECORD_HEADER_BYTES`] — length of a run-file record's frame header,
//!   used by callers to size a reader's ring buffer off `max_element`.

mod pushback;
mod run_reader;
mod run_writer;
mod stream_reader;
mod stream_writer;

pub use pushback::Pushback;
pub use run_reader::{FramedRunReader, RawRunReader, RunReader, RECORD_HEADER_BYTES};
pub use run_writer::{FramedRunWriter, RawRunWriter, RunWriter};
pub use stream_reader::StreamReader;
pub use stream_writer::StreamWriter;
