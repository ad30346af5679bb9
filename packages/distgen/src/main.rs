//! Binary entry point for the distgen tool.
//!
//! This module is excluded from mutation testing because testing process entry/exit behavior
//! is impractical - it requires spawning subprocesses and checking exit codes.

use std::io;
use std::process::ExitCode;

use argh::FromArgs;
use distgen::{Benchmark, Config, StridePolicy, parse_size};
use tracing::Level;

/// Generate memory accesses at one or more working-set sizes and measure the achieved
/// bandwidth and latency.
#[derive(FromArgs)]
struct Args {
    /// number of worker threads (default: 1)
    #[argh(option, short = 'c', default = "1")]
    threads: usize,

    /// iterations of the access loop (default: enough for 50 million accesses per thread)
    #[argh(option, short = 'i')]
    iterations: Option<u64>,

    /// advance through the buffer in a pseudo-random order instead of sequentially
    #[argh(switch, short = 'p')]
    pseudo_random: bool,

    /// follow a dependency chain so every access waits for the previous one (latency)
    #[argh(switch, short = 'd')]
    dependency_chain: bool,

    /// increment every accessed block instead of only reading it
    #[argh(switch, short = 'w')]
    write: bool,

    /// do not pin worker threads to processors
    #[argh(switch)]
    no_pin: bool,

    /// describe the buffer layout and progress on stderr
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// working-set sizes in bytes, with optional K/M/G/T suffix (e.g. 32K 1M 256M)
    #[argh(positional, from_str_fn(parse_distance))]
    distances: Vec<u64>,
}

fn parse_distance(value: &str) -> Result<u64, String> {
    parse_size(value).map_err(|e| e.to_string())
}

// Binary entry point - mutations would require subprocess testing which is impractical.
#[cfg_attr(test, mutants::skip)]
fn main() -> ExitCode {
    let args: Args = argh::from_env();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::WARN
        })
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let stride = if args.pseudo_random {
        StridePolicy::PseudoRandom
    } else {
        StridePolicy::Sequential
    };

    let mut builder = Config::builder()
        .threads(args.threads)
        .distances(args.distances)
        .stride(stride)
        .dependency_chain(args.dependency_chain)
        .write(args.write)
        .pin_threads(!args.no_pin)
        .verbose(args.verbose);

    if let Some(iterations) = args.iterations {
        builder = builder.iterations(iterations);
    }

    let result = builder.build().and_then(Benchmark::new);

    let mut benchmark = match result {
        Ok(benchmark) => benchmark,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    benchmark.prepare();
    let report = benchmark.run();

    println!("{report}");

    ExitCode::SUCCESS
}
