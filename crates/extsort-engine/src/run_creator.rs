//! Per-worker run-creation loop: read under a `READER` permit, sort in
//! memory, write under a `WRITER` permit, repeat until the shared input
//! stream is exhausted.

use extsort_core::{Class, Collator, KeyStore, Result, SyncIO};
use extsort_io::{Pushback, RunWriter, StreamReader};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Shared, mutex-guarded input side: a single `StreamReader` and its
/// `Pushback`, used by every `RunCreator` in a sort.
pub struct SharedInput<R> {
    state: Mutex<(StreamReader<R>, Pushback)>,
}

impl<R: Read> SharedInput<R> {
    /// Wraps `reader` and a fresh `Pushback` for sharing across workers.
    #[must_use]
    pub fn new(reader: StreamReader<R>) -> Self {
        Self {
            state: Mutex::new((reader, Pushback::new())),
        }
    }
}

/// Builds the run writer for a given run file path. Boxed so the worker
/// does not need to know whether runs are compressed.
pub type RunWriterFactory = dyn Fn(&Path) -> Result<Box<dyn RunWriter>> + Send + Sync;

/// One worker in the run-creation pool.
pub struct RunCreator<'a, R> {
    worker_id: usize,
    keystore_capacity: usize,
    tmp_dir: PathBuf,
    shared_input: &'a SharedInput<R>,
    sync_io: &'a SyncIO,
    writer_factory: &'a RunWriterFactory,
    collator: &'a dyn Collator,
}

impl<'a, R: Read> RunCreator<'a, R> {
    /// Creates a worker that will name its run files
    /// `fort_run.<worker_id>.<seq>` under `tmp_dir`.
    #[must_use]
    pub fn new(
        worker_id: usize,
        keystore_capacity: usize,
        tmp_dir: PathBuf,
        shared_input: &'a SharedInput<R>,
        sync_io: &'a SyncIO,
        writer_factory: &'a RunWriterFactory,
        collator: &'a dyn Collator,
    ) -> Self {
        Self {
            worker_id,
            keystore_capacity,
            tmp_dir,
            shared_input,
            sync_io,
            writer_factory,
            collator,
        }
    }

    /// Runs the worker to completion, returning the paths of every run
    /// file it created (possibly empty, if the shared input was already
    /// exhausted by other workers before this one got a turn).
    ///
    /// # Errors
    ///
    /// A `RecordTooLong`, a codec/I-O failure from the reader, or a write
    /// failure aborts the worker and propagates to the caller.
    pub fn run(&mut self) -> Result<Vec<PathBuf>> {
        let mut runs = Vec::new();
        let mut keystore = KeyStore::new(self.keystore_capacity);

        loop {
            keystore.clear();

            let more_data = {
                self.sync_io.acquire(Class::Reader);
                let outcome = {
                    let mut guard = self.shared_input.state.lock().unwrap();
                    let (reader, pushback) = &mut *guard;
                    reader.read(&mut keystore, pushback)
                };
                self.sync_io.release(Class::Reader);
                outcome?
            };

            if !keystore.is_empty() {
                keystore.sort(self.collator);

                let path = self
                    .tmp_dir
                    .join(format!("fort_run.{}.{}", self.worker_id, runs.len()));

                self.sync_io.acquire(Class::Writer);
                let result = (|| -> Result<()> {
                    let mut writer = (self.writer_factory)(&path)?;
                    writer.write_run(&keystore)?;
                    writer.finish()?;
                    Ok(())
                })();
                self.sync_io.release(Class::Writer);
                result?;

                debug!(worker = self.worker_id, path = %path.display(), "run file written");
                runs.push(path);
            }

            if !more_data {
                break;
            }
        }

        info!(worker = self.worker_id, runs = runs.len(), "worker finished");
        Ok(runs)
    }
}
