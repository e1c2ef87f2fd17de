//! External configuration for a single sort invocation.

/// Tunables for one run of the sorter (see `extsort-cli` for the `clap`
/// parser that produces one of these).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Total memory budget, in bytes, across all run-creation workers.
    pub mem_size: u64,
    /// Number of parallel run-creation workers.
    pub parallel: usize,
    /// Maximum number of workers allowed to hold the writer permit at
    /// once.
    pub max_run_writers: usize,
    /// Maximum combined reader + writer permits in flight at once. `0`
    /// disables the shared cap.
    pub max_run_io: usize,
    /// Directory in which run files are created.
    pub tmp_dir: std::path::PathBuf,
    /// Upper bound on a single record's length, in bytes.
    pub max_element: u64,
    /// Locale name for collation, or `None` for plain byte order.
    pub locale: Option<String>,
    /// Whether run files are written through the LZ4 streaming frame.
    pub compress: bool,
}

impl EngineConfig {
    /// Per-worker memory budget for its `KeyStore` and ring buffers:
    /// `(mem_size - 2 * max_element) / parallel`.
    ///
    /// # Panics
    ///
    /// Panics if `parallel` is zero.
    #[must_use]
    pub fn sorter_mem(&self) -> u64 {
        assert!(self.parallel > 0, "parallel must be at least 1");
        self.mem_size.saturating_sub(2 * self.max_element) / self.parallel as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorter_mem_divides_the_remaining_budget_across_workers() {
        let cfg = EngineConfig {
            mem_size: 1_000_000,
            parallel: 4,
            max_run_writers: 1,
            max_run_io: 1,
            tmp_dir: std::env::temp_dir(),
            max_element: 100,
            locale: None,
            compress: true,
        };
        assert_eq!(cfg.sorter_mem(), (1_000_000 - 200) / 4);
    }
}
