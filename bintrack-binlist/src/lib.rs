//! # Fixed-width genomic bin signals
//!
//! `bintrack-binlist` turns per-chromosome positions or `(start, stop, score)`
//! windows into one numeric value per fixed-width bin. A window spanning
//! several bins is split between them in proportion to the overlap, then
//! folded in with sum, average or maximum.
//!
//! Every [`BinList`] carries:
//! - the base bin arrays, stored at 16 or 32 bit precision and optionally compressed
//! - genome-wide statistics over the non-zero bins
//! - a pyramid of coarser averaged levels used to draw zoomed-out views
//!
//! All parallel work (one task per chromosome) runs on a shared, bounded
//! [`ExecutionCoordinator`].
//!
//! A bin value of exactly zero means "no data" throughout: zero bins are left
//! out of statistics, projections and derived levels.
//!
//! # Example
//!
//! ```rust
//! use bintrack_binlist::{BinList, ExecutionCoordinator};
//! use bintrack_core::Genome;
//!
//! let genome = Genome::new(vec![("chr1".to_string(), 1_000)]).unwrap();
//! let coordinator = ExecutionCoordinator::new(4).unwrap();
//!
//! let binlist = BinList::builder(&coordinator)
//!     .with_bin_width(100)
//!     .from_positions(&genome, &[vec![5, 10, 250]])
//!     .unwrap();
//!
//! assert_eq!(binlist.get(0).unwrap()[..3], [2.0, 0.0, 1.0]);
//! assert_eq!(binlist.statistics().non_zero_count, 2);
//! assert_eq!(binlist.project(0, 200.0).unwrap()[..2], [2.0, 1.0]);
//! ```

pub mod aggregator;
pub mod binlist;
pub mod config;
pub mod consts;
pub mod errors;
pub mod executor;
pub mod level;
pub mod projection;
pub mod pyramid;
pub mod statistics;
pub mod storage;

// re-exports
pub use self::binlist::{BinList, BinListBuilder};
pub use self::config::EngineConfig;
pub use self::errors::BinListError;
pub use self::executor::{BatchError, ExecutionCoordinator, ProgressListener, StopSignal};
pub use self::level::BinLevel;
pub use self::pyramid::{PyramidSettings, ResolutionPyramid};
pub use self::statistics::BinListStatistics;
pub use self::storage::{BinArray, Compressible};
