//! Command-line surface for the sorter, including a size-suffix grammar
//! (`%`, `K`, `M`, `G`, `T`) for memory and buffer options.

use clap::Parser;
use extsort_core::Error;
use std::path::PathBuf;

/// A size expressed either as a percentage of free memory or as a byte
/// count with an optional binary SI suffix.
#[derive(Debug, Clone, Copy)]
pub enum Size {
    /// A percentage of free memory, e.g. `95%`.
    Percent(f64),
    /// An absolute byte count.
    Bytes(u64),
}

impl Size {
    /// Resolves this size to a concrete byte count, consulting
    /// `free_memory` only for the [`Size::Percent`] case.
    #[must_use]
    pub fn resolve(self, free_memory: u64) -> u64 {
        match self {
            Size::Bytes(b) => b,
            Size::Percent(pct) => ((free_memory as f64) * pct / 100.0) as u64,
        }
    }
}

fn parse_size(raw: &str) -> Result<Size, String> {
    let raw = raw.trim();
    if let Some(pct) = raw.strip_suffix('%') {
        let value: f64 = pct
            .parse()
            .map_err(|_| format!("invalid percentage: {raw}"))?;
        return Ok(Size::Percent(value));
    }

    let (digits, multiplier) = match raw.chars().last() {
        Some('K') | Some('k') => (&raw[..raw.len() - 1], 1024u64),
        Some('M') | Some('m') => (&raw[..raw.len() - 1], 1024 * 1024),
        Some('G') | Some('g') => (&raw[..raw.len() - 1], 1024 * 1024 * 1024),
        Some('T') | Some('t') => (&raw[..raw.len() - 1], 1024 * 1024 * 1024 * 1024),
        _ => (raw, 1),
    };
    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("invalid size: {raw}"))?;
    Ok(Size::Bytes(value * multiplier))
}

/// Parses a `Size` and converts failures into the shared error taxonomy.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if `raw` is not a valid size
/// expression.
pub fn parse_size_arg(raw: &str) -> Result<Size, Error> {
    parse_size(raw).map_err(Error::Configuration)
}

/// Sorts newline-delimited records from standard input to standard
/// output, spilling to disk when the input does not fit in memory.
#[derive(Parser, Debug)]
#[command(name = "extsort", version, about)]
pub struct Args {
    /// Memory budget across all workers: a byte count (optionally suffixed
    /// with K/M/G/T) or a percentage of free memory, e.g. `95%`.
    #[arg(long, default_value = "95%", value_parser = parse_size)]
    pub mem_size: Size,

    /// Number of parallel run-creation workers.
    #[arg(long)]
    pub parallel: Option<usize>,

    /// Maximum number of workers allowed to hold the writer permit at
    /// once.
    #[arg(long, default_value_t = 1)]
    pub max_run_writers: usize,

    /// Maximum combined reader + writer permits in flight at once. `0`
    /// disables the shared cap.
    #[arg(long, default_value_t = 1)]
    pub max_run_io: usize,

    /// Directory in which run files are created.
    #[arg(long)]
    pub tmp_dir: Option<PathBuf>,

    /// Upper bound on a single record's length.
    #[arg(long, default_value = "16M", value_parser = parse_size)]
    pub max_element: Size,

    /// Locale name for collation (e.g. `en_US.UTF-8`); defaults to plain
    /// byte order.
    #[arg(long)]
    pub locale: Option<String>,

    /// Disables the LZ4 streaming frame for run files.
    #[arg(long)]
    pub no_compress: bool,

    /// Log verbosity, also overridable via `RUST_LOG`.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
