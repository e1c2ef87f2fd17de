//! Host free-memory detection, used to resolve a percentage `mem_size`.

use std::fs;

/// Sums `MemFree`, `Buffers`, and `Cached` from `/proc/meminfo`, treating
/// "free" as memory that is either already unused or trivially
/// reclaimable.
///
/// Returns `0` on non-Linux hosts or if `/proc/meminfo` cannot be parsed,
/// which forces the caller to supply an explicit `--mem-size`.
#[must_use]
pub fn measure_free_memory() -> u64 {
    let Ok(contents) = fs::read_to_string("/proc/meminfo") else {
        return 0;
    };
    parse_meminfo(&contents)
}

fn parse_meminfo(contents: &str) -> u64 {
    let mut total_kb = 0u64;
    for field in ["MemFree", "Buffers", "Cached"] {
        if let Some(kb) = field_kb(contents, field) {
            total_kb += kb;
        }
    }
    total_kb * 1024
}

fn field_kb(contents: &str, field: &str) -> Option<u64> {
    let line = contents.lines().find(|line| line.starts_with(field))?;
    line.split_whitespace().nth(1)?.parse().ok()
}
