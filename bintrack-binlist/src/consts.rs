/// Bin width multiplier between two consecutive pyramid levels.
pub const ACCELERATOR_FACTOR: u32 = 100;

/// No pyramid level is built with a bin width above this many base pairs.
pub const ACCELERATOR_MAX_BINWIDTH: u32 = 1_000_000;

/// Environment variable overriding the worker count of the shared pool.
pub const NUM_THREADS_ENV: &str = "BINTRACK_NUM_THREADS";

pub const WORKER_THREAD_PREFIX: &str = "bintrack-worker";
