//! Core models shared by the bintrack crates.
//!
//! `bintrack-core` holds the vocabulary the binning engine is written in:
//!
//! - [`Chromosome`] and the [`ChromosomeCatalog`] trait, the only view of the
//!   genome the engine needs (count, name and length by ordinal index)
//! - [`Genome`], an in-memory catalog that can be loaded from a `chrom.sizes` file
//! - [`ScoredWindow`], one `(start, stop, score)` input record
//! - [`AggregationMethod`] and [`Precision`], the settings a bin-list is built with
//!
//! # Example
//!
//! ```rust
//! use bintrack_core::models::{ChromosomeCatalog, Genome, ScoredWindow};
//!
//! let genome = Genome::new(vec![("chr1".to_string(), 1_000), ("chr2".to_string(), 500)]).unwrap();
//! assert_eq!(genome.count(), 2);
//! assert_eq!(genome.get(1).unwrap().name, "chr2");
//!
//! let window = ScoredWindow::new(10, 30, 2.0);
//! assert_eq!(window.width(), 20);
//! ```

pub mod errors;
pub mod models;
pub mod utils;

// re-exports
pub use models::{AggregationMethod, Chromosome, ChromosomeCatalog, Genome, Precision, ScoredWindow};
