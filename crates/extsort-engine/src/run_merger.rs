//! K-way merge of sorted run readers into a single output stream.

use extsort_core::{Collator, Result};
use extsort_io::{RunReader, StreamWriter};
use std::cmp::Ordering;
use std::io::Write;
use tracing::debug;

struct Entry {
    key: Vec<u8>,
    reader_index: usize,
}

/// A binary min-heap ordered by a runtime [`Collator`], since `Collator`
/// cannot be expressed through `std::cmp::Ord` (it is a trait object
/// chosen at runtime from the `--locale` option).
struct MergeHeap<'c> {
    entries: Vec<Entry>,
    collator: &'c dyn Collator,
}

impl<'c> MergeHeap<'c> {
    fn new(collator: &'c dyn Collator) -> Self {
        Self {
            entries: Vec::new(),
            collator,
        }
    }

    fn less(&self, a: &Entry, b: &Entry) -> bool {
        self.collator.compare(&a.key, &b.key) == Ordering::Less
    }

    fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
        let mut i = self.entries.len() - 1;
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.less(&self.entries[i], &self.entries[parent]) {
                self.entries.swap(i, parent);
                i = parent;
            } else {
                break;
            }
        }
    }

    fn pop(&mut self) -> Option<Entry> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        let top = self.entries.pop();

        let mut i = 0;
        loop {
            let left = 2 * i + 1;
            let right = 2 * i + 2;
            let mut smallest = i;
            if left < self.entries.len() && self.less(&self.entries[left], &self.entries[smallest]) {
                smallest = left;
            }
            if right < self.entries.len() && self.less(&self.entries[right], &self.entries[smallest]) {
                smallest = right;
            }
            if smallest == i {
                break;
            }
            self.entries.swap(i, smallest);
            i = smallest;
        }

        top
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Merges a set of sorted run readers into a single sorted output stream.
pub struct RunMerger<'c> {
    readers: Vec<Box<dyn RunReader>>,
    collator: &'c dyn Collator,
}

impl<'c> RunMerger<'c> {
    /// Builds a merger over `readers`, comparing records with `collator`.
    #[must_use]
    pub fn new(readers: Vec<Box<dyn RunReader>>, collator: &'c dyn Collator) -> Self {
        Self { readers, collator }
    }

    /// Drains every reader, writing records to `writer` in sorted order,
    /// then flushes it.
    ///
    /// # Errors
    ///
    /// Propagates any I/O or codec error from a reader or from `writer`.
    pub fn merge<W: Write>(&mut self, writer: &mut StreamWriter<W>) -> Result<()> {
        let mut heap = MergeHeap::new(self.collator);

        for (index, reader) in self.readers.iter_mut().enumerate() {
            if let Some(record) = reader.next()? {
                heap.push(Entry {
                    key: record.to_vec(),
                    reader_index: index,
                });
            }
        }

        let mut emitted: u64 = 0;
        while !heap.is_empty() {
            let entry = heap.pop().expect("checked non-empty above");
            writer.write(&entry.key)?;
            emitted += 1;

            if let Some(record) = self.readers[entry.reader_index].next()? {
                heap.push(Entry {
                    key: record.to_vec(),
                    reader_index: entry.reader_index,
                });
            }
        }

        debug!(records = emitted, runs = self.readers.len(), "merge complete");
        writer.end()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extsort_core::{ByteOrderCollator, KeyStore};
    use extsort_io::{RawRunReader, RawRunWriter, RunWriter};
    use tempfile::tempdir;

    fn write_run(dir: &std::path::Path, name: &str, words: &[&str]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut ks = KeyStore::new(4096);
        for word in words {
            ks.insert(word.as_bytes());
        }
        ks.sort(&ByteOrderCollator);
        let mut writer: Box<dyn RunWriter> = Box::new(RawRunWriter::create(&path).unwrap());
        writer.write_run(&ks).unwrap();
        writer.finish().unwrap();
        path
    }

    #[test]
    fn merges_two_sorted_runs_preserving_duplicates() {
        let dir = tempdir().unwrap();
        let run_a = write_run(dir.path(), "fort_run.0.0", &["banana", "date"]);
        let run_b = write_run(dir.path(), "fort_run.1.0", &["apple", "banana", "cherry"]);

        let readers: Vec<Box<dyn RunReader>> = vec![
            Box::new(RawRunReader::open(&run_a, 64).unwrap()),
            Box::new(RawRunReader::open(&run_b, 64).unwrap()),
        ];

        let collator = ByteOrderCollator;
        let mut merger = RunMerger::new(readers, &collator);

        let mut out = Vec::new();
        let mut writer = StreamWriter::new(&mut out, 4096);
        merger.merge(&mut writer).unwrap();

        assert_eq!(out, b"apple\nbanana\nbanana\ncherry\ndate\n");
    }

    #[test]
    fn merging_zero_runs_produces_empty_output() {
        let collator = ByteOrderCollator;
        let mut merger = RunMerger::new(Vec::new(), &collator);
        let mut out = Vec::new();
        let mut writer = StreamWriter::new(&mut out, 4096);
        merger.merge(&mut writer).unwrap();
        assert!(out.is_empty());
    }
}
