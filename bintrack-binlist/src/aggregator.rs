//! Proportional overlap splitting of scored windows into fixed-width bins.
//!
//! A window spanning several bins gives each bin a share of its score
//! proportional to the overlap length. The share is then folded into the bin
//! with the chosen [`AggregationMethod`]. A bin value of `0` means "no data".

use bintrack_core::{AggregationMethod, ScoredWindow};

/// Anything that can be binned as a scored window.
pub trait AsScoredWindow {
    fn as_scored_window(&self) -> ScoredWindow;
}

/// A bare position counts as one observation.
impl AsScoredWindow for u32 {
    fn as_scored_window(&self) -> ScoredWindow {
        ScoredWindow::point(*self, 1.0)
    }
}

/// A `(position, score)` pair.
impl AsScoredWindow for (u32, f64) {
    fn as_scored_window(&self) -> ScoredWindow {
        ScoredWindow::point(self.0, self.1)
    }
}

impl AsScoredWindow for ScoredWindow {
    fn as_scored_window(&self) -> ScoredWindow {
        *self
    }
}

///
/// Iterate over `(bin index, contribution)` pairs for one window.
///
/// Bins at or past `bin_count` are never produced, so windows lying past the
/// chromosome end yield nothing. Point windows land whole in `start / bin_width`.
/// The window must satisfy `stop >= start`.
///
pub fn split_window(
    window: &ScoredWindow,
    bin_width: u32,
    bin_count: usize,
) -> impl Iterator<Item = (usize, f64)> + use<> {
    let width = bin_width as u64;
    let start = window.start as u64;
    let stop = window.stop as u64;
    let score = window.score;

    let first_bin = start / width;
    let last_bin = if stop > start { (stop - 1) / width } else { first_bin };
    let span = (stop - start) as f64;

    let end = (last_bin + 1).min(bin_count as u64);

    (first_bin..end).map(move |j| {
        let contribution = if first_bin == last_bin {
            score
        } else if j == first_bin {
            score / span * ((j + 1) * width - start) as f64
        } else if j == last_bin {
            score / span * (stop - j * width) as f64
        } else {
            score / span * width as f64
        };
        (j as usize, contribution)
    })
}

///
/// Fold one contribution into bin `j`.
///
/// `counts` is only read and written for [`AggregationMethod::Average`].
///
#[inline]
pub fn combine(
    method: AggregationMethod,
    bins: &mut [f64],
    counts: &mut [u32],
    j: usize,
    contribution: f64,
) {
    match method {
        AggregationMethod::Sum => bins[j] += contribution,
        AggregationMethod::Maximum => {
            // zero is "empty", so a negative contribution can still land
            bins[j] = if bins[j] == 0.0 {
                contribution
            } else {
                bins[j].max(contribution)
            };
        }
        AggregationMethod::Average => {
            let n = counts[j] as f64;
            bins[j] = (bins[j] * n + contribution) / (n + 1.0);
            counts[j] += 1;
        }
    }
}

///
/// Distribute one window over `bins` using `method`.
///
/// # Arguments
/// - method: how contributions landing in the same bin are combined
/// - bin_width: width of every bin in base pairs
/// - window: an already validated window (`stop >= start`)
/// - bins: the chromosome's bin array, updated in place
/// - counts: contributions seen per bin, only used by `Average`
///
pub fn aggregate(
    method: AggregationMethod,
    bin_width: u32,
    window: &ScoredWindow,
    bins: &mut [f64],
    counts: &mut [u32],
) {
    for (j, contribution) in split_window(window, bin_width, bins.len()) {
        combine(method, bins, counts, j, contribution);
    }
}

///
/// Per-chromosome scratch space for one aggregation pass.
///
/// Values accumulate in `f64` and are narrowed to the bin-list precision once
/// the chromosome is complete.
///
#[derive(Debug, Clone)]
pub struct ChromosomeAccumulator {
    method: AggregationMethod,
    bin_width: u32,
    bins: Vec<f64>,
    counts: Vec<u32>,
}

impl ChromosomeAccumulator {
    pub fn new(method: AggregationMethod, bin_width: u32, bin_count: usize) -> Self {
        let counts = match method {
            AggregationMethod::Average => vec![0; bin_count],
            _ => Vec::new(),
        };
        ChromosomeAccumulator {
            method,
            bin_width,
            bins: vec![0.0; bin_count],
            counts,
        }
    }

    pub fn add(&mut self, window: &ScoredWindow) {
        aggregate(
            self.method,
            self.bin_width,
            window,
            &mut self.bins,
            &mut self.counts,
        );
    }

    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    pub fn into_bins(self) -> Vec<f64> {
        self.bins
    }
}
