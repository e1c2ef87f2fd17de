//! Serializes a sorted `KeyStore` to a run file, as raw length-prefixed
//! frames or the same frames wrapped in a streaming compression frame.

use extsort_core::{Error, KeyStore, Result};
use lz4_flex::frame::{BlockMode, BlockSize, FrameEncoder, FrameInfo};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the records of a `KeyStore` to a run file.
pub trait RunWriter {
    /// Writes every record currently in `keystore`, in its current index
    /// order, framed as `<8-byte little-endian length><payload>`.
    ///
    /// # Errors
    ///
    /// Propagates I/O or codec errors.
    fn write_run(&mut self, keystore: &KeyStore) -> Result<()>;

    /// Finalizes the file (flushing any codec footer). Must be called
    /// once no more records will be written to this run.
    ///
    /// # Errors
    ///
    /// Propagates I/O or codec errors.
    fn finish(self: Box<Self>) -> Result<()>;
}

fn write_framed_record<W: Write>(sink: &mut W, payload: &[u8]) -> Result<()> {
    sink.write_all(&(payload.len() as u64).to_le_bytes())?;
    sink.write_all(payload)?;
    Ok(())
}

/// Writes run files with no compression: a flat stream of
/// `<length><payload>` frames.
pub struct RawRunWriter {
    out: BufWriter<File>,
}

impl RawRunWriter {
    /// Creates (or truncates) the run file at `path`.
    ///
    /// # Errors
    ///
    /// Propagates any I/O error opening the file.
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self {
            out: BufWriter::new(File::create(path)?),
        })
    }
}

impl RunWriter for RawRunWriter {
    fn write_run(&mut self, keystore: &KeyStore) -> Result<()> {
        for record in keystore.iter() {
            write_framed_record(&mut self.out, record)?;
        }
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Writes run files through an LZ4 streaming compression frame: 256-KiB
/// blocks, linked blocks, no content checksum, default compression level.
pub struct FramedRunWriter {
    encoder: FrameEncoder<BufWriter<File>>,
}

impl FramedRunWriter {
    /// Creates (or truncates) the run file at `path` and opens a
    /// compression frame over it.
    ///
    /// # Errors
    ///
    /// Propagates any I/O error opening the file.
    pub fn create(path: &Path) -> Result<Self> {
        let mut info = FrameInfo::new();
        info.block_size = BlockSize::Max256KB;
        info.block_mode = BlockMode::Linked;
        info.content_checksum = false;
        let encoder = FrameEncoder::with_frame_info(info, BufWriter::new(File::create(path)?));
        Ok(Self { encoder })
    }
}

impl RunWriter for FramedRunWriter {
    fn write_run(&mut self, keystore: &KeyStore) -> Result<()> {
        for record in keystore.iter() {
            write_framed_record(&mut self.encoder, record)?;
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        self.encoder
            .finish()
            .map_err(|e| Error::Codec(e.to_string()))?;
        Ok(())
    }
}
