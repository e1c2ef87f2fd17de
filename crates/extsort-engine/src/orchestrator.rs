//! Sizing, spawning, and lifecycle: wires together the run-creation pool
//! and the run merger for one end-to-end sort.

use crate::config::EngineConfig;
use crate::run_creator::{RunCreator, RunWriterFactory, SharedInput};
use crate::run_merger::RunMerger;
use extsort_core::{build_collator, Class, Error, Result, SyncIO};
use extsort_io::{
    FramedRunReader, FramedRunWriter, RawRunReader, RawRunWriter, RunReader, StreamReader, StreamWriter,
    RECORD_HEADER_BYTES,
};
use std::io::{Read, Write};
use std::path::Path;
use tracing::{info, warn};

/// Drives one full sort: spawn `parallel` run-creation workers against a
/// shared input stream, then k-way merge the resulting runs into the
/// output stream.
pub struct Orchestrator {
    config: EngineConfig,
}

impl Orchestrator {
    /// Creates an orchestrator for `config`.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Runs the sort end to end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the locale name is unknown, or
    /// any fatal error raised by a run-creation worker or the merger.
    pub fn sort<R, W>(&self, input: R, output: W) -> Result<()>
    where
        R: Read + Send,
        W: Write,
    {
        std::fs::create_dir_all(&self.config.tmp_dir)?;

        let collator = build_collator(self.config.locale.as_deref()).map_err(Error::Configuration)?;
        let sorter_mem = self.config.sorter_mem().max(4096) as usize;
        let max_element = self.config.max_element as usize;

        let sync_io = SyncIO::new(
            (self.config.max_run_io > 0).then_some(self.config.max_run_io),
            1,
            self.config.max_run_writers.max(1),
        );

        let shared_input = SharedInput::new(StreamReader::new(input, max_element, 0.9));

        let compress = self.config.compress;
        let writer_factory: Box<RunWriterFactory> = Box::new(move |path: &Path| {
            if compress {
                Ok(Box::new(FramedRunWriter::create(path)?) as Box<_>)
            } else {
                Ok(Box::new(RawRunWriter::create(path)?) as Box<_>)
            }
        });

        let run_paths: Vec<std::path::PathBuf> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..self.config.parallel.max(1))
                .map(|worker_id| {
                    let shared_input = &shared_input;
                    let sync_io = &sync_io;
                    let writer_factory = &*writer_factory;
                    let collator = &*collator;
                    let tmp_dir = self.config.tmp_dir.clone();
                    scope.spawn(move || {
                        let mut worker = RunCreator::new(
                            worker_id,
                            sorter_mem,
                            tmp_dir,
                            shared_input,
                            sync_io,
                            writer_factory,
                            collator,
                        );
                        worker.run()
                    })
                })
                .collect();

            let mut all_runs = Vec::new();
            let mut first_err = None;
            for handle in handles {
                match handle.join().expect("run-creation worker panicked") {
                    Ok(mut runs) => all_runs.append(&mut runs),
                    Err(err) if first_err.is_none() => first_err = Some(err),
                    Err(_) => {}
                }
            }
            match first_err {
                Some(err) => Err(err),
                None => Ok(all_runs),
            }
        })?;

        info!(runs = run_paths.len(), "run creation complete, starting merge");

        // Large enough to hold one full record plus its frame header,
        // whatever compression does to it in between, so a legitimately
        // sized record can never be truncated on the way back out.
        let merge_ring = (max_element + RECORD_HEADER_BYTES).max(4096);
        let readers: Vec<Box<dyn RunReader>> = run_paths
            .iter()
            .map(|path| -> Result<Box<dyn RunReader>> {
                if self.config.compress {
                    Ok(Box::new(FramedRunReader::open(path, merge_ring)?))
                } else {
                    Ok(Box::new(RawRunReader::open(path, merge_ring)?))
                }
            })
            .collect::<Result<_>>()?;

        let mut merger = RunMerger::new(readers, &*collator);
        let mut writer = StreamWriter::new(output, merge_ring);
        let merge_result = merger.merge(&mut writer);

        for path in &run_paths {
            if let Err(err) = std::fs::remove_file(path) {
                warn!(path = %path.display(), error = %err, "failed to remove run file");
            }
        }

        merge_result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn base_config(tmp_dir: std::path::PathBuf) -> EngineConfig {
        EngineConfig {
            mem_size: 1 << 20,
            parallel: 2,
            max_run_writers: 1,
            max_run_io: 1,
            tmp_dir,
            max_element: 4096,
            locale: None,
            compress: false,
        }
    }

    fn sort_string(config: EngineConfig, input: &str) -> String {
        let orchestrator = Orchestrator::new(config);
        let mut output = Vec::new();
        orchestrator
            .sort(Cursor::new(input.as_bytes().to_vec()), &mut output)
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn empty_input_sorts_to_empty_output() {
        let dir = tempdir().unwrap();
        assert_eq!(sort_string(base_config(dir.path().to_path_buf()), ""), "");
    }

    #[test]
    fn single_record_sorts_to_itself() {
        let dir = tempdir().unwrap();
        assert_eq!(
            sort_string(base_config(dir.path().to_path_buf()), "hello\n"),
            "hello\n"
        );
    }

    #[test]
    fn duplicates_are_preserved() {
        let dir = tempdir().unwrap();
        assert_eq!(
            sort_string(base_config(dir.path().to_path_buf()), "a\nb\na\n"),
            "a\na\nb\n"
        );
    }

    #[test]
    fn byte_order_prefers_shorter_key_on_common_prefix() {
        let dir = tempdir().unwrap();
        assert_eq!(
            sort_string(base_config(dir.path().to_path_buf()), "ab\na\n"),
            "a\nab\n"
        );
    }

    #[test]
    fn small_memory_forces_multiple_runs_but_sorts_correctly() {
        let dir = tempdir().unwrap();
        let mut config = base_config(dir.path().to_path_buf());
        config.mem_size = 4096;
        config.parallel = 3;

        let mut input = String::new();
        let mut expected: Vec<u32> = (0..500).collect();
        for i in &expected {
            input.push_str(&format!("{:010}\n", i));
        }
        expected.sort_unstable();

        let output = sort_string(config, &input);
        let got: Vec<u32> = output
            .lines()
            .map(|line| line.parse().unwrap())
            .collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn run_files_are_cleaned_up_after_a_successful_sort() {
        let dir = tempdir().unwrap();
        let config = base_config(dir.path().to_path_buf());
        sort_string(config, "a\nb\nc\n");
        let remaining: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(remaining.is_empty(), "expected no leftover run files");
    }
}
