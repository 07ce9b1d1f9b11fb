use rayon::ThreadPoolBuildError;
use thiserror::Error;

use bintrack_core::{AggregationMethod, Precision};

use crate::executor::BatchError;
use crate::storage::CompressionError;

#[derive(Error, Debug)]
pub enum BinListError {
    #[error("Bin width must be positive")]
    InvalidBinWidth,

    #[error("{precision} storage cannot hold {method} aggregates")]
    IncompatiblePrecision {
        precision: Precision,
        method: AggregationMethod,
    },

    #[error("Expected records for {expected} chromosomes, found {found}")]
    ChromosomeCountMismatch { expected: usize, found: usize },

    #[error("Invalid window on chromosome {chromosome}: stop {stop} is before start {start}")]
    InvalidWindow {
        chromosome: usize,
        start: u32,
        stop: u32,
    },

    #[error("Aggregation failed on chromosome {chromosome}: {source}")]
    ChromosomeTask {
        chromosome: usize,
        #[source]
        source: Box<BinListError>,
    },

    #[error("Task for chromosome {chromosome} panicked: {message}")]
    TaskPanicked { chromosome: usize, message: String },

    #[error("Chromosome index {index} out of range ({count} chromosomes)")]
    ChromosomeOutOfRange { index: usize, count: usize },

    #[error("Bin index {index} out of range for chromosome {chromosome} ({count} bins)")]
    BinOutOfRange {
        chromosome: usize,
        index: usize,
        count: usize,
    },

    #[error("Base pairs per pixel must be a positive finite number, got {0}")]
    InvalidResolution(f64),

    #[error("Accelerator factor must be at least 2, got {0}")]
    InvalidAcceleratorFactor(u32),

    #[error(transparent)]
    Compression(#[from] CompressionError),

    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] ThreadPoolBuildError),

    #[error("Can't read config file: {0}")]
    ConfigRead(#[source] std::io::Error),

    #[error("Invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid value for {name}: {value}")]
    InvalidConfigValue { name: String, value: String },
}

/// Per-chromosome batches index tasks by chromosome ordinal.
impl From<BatchError<BinListError>> for BinListError {
    fn from(err: BatchError<BinListError>) -> Self {
        match err {
            BatchError::TaskFailed { index, source } => BinListError::ChromosomeTask {
                chromosome: index,
                source: Box::new(source),
            },
            BatchError::TaskPanicked { index, message } => BinListError::TaskPanicked {
                chromosome: index,
                message,
            },
        }
    }
}
