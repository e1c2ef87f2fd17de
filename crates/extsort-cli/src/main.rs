//! Command-line entry point: parses arguments, resolves sizes against the
//! host's free memory, installs logging, runs the sort, and maps any
//! fatal error onto a process exit code.

mod args;
mod meminfo;

use args::Args;
use clap::Parser;
use extsort_engine::{EngineConfig, Orchestrator};
use std::io;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)))
        .with_writer(io::stderr)
        .init();

    let free_memory = meminfo::measure_free_memory();
    let config = EngineConfig {
        mem_size: args.mem_size.resolve(free_memory),
        parallel: args
            .parallel
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)),
        max_run_writers: args.max_run_writers,
        max_run_io: args.max_run_io,
        tmp_dir: args.tmp_dir.unwrap_or_else(std::env::temp_dir),
        max_element: args.max_element.resolve(free_memory),
        locale: args.locale,
        compress: !args.no_compress,
    };

    let orchestrator = Orchestrator::new(config);
    let stdin = io::stdin();
    let stdout = io::stdout();

    match orchestrator.sort(stdin.lock(), stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "sort failed");
            ExitCode::FAILURE
        }
    }
}
