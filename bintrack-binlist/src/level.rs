//! One resolution of a bin signal: a fixed bin width and one array per chromosome.

use log::debug;

use bintrack_core::{AggregationMethod, ChromosomeCatalog, Precision, ScoredWindow};

use crate::aggregator::{AsScoredWindow, ChromosomeAccumulator};
use crate::errors::BinListError;
use crate::executor::ExecutionCoordinator;
use crate::storage::{BinArray, Compressible, CompressionError};

/// Settings a level is aggregated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSettings {
    pub bin_width: u32,
    pub precision: Precision,
    pub method: AggregationMethod,
}

impl LevelSettings {
    pub fn new(bin_width: u32, precision: Precision, method: AggregationMethod) -> Self {
        LevelSettings {
            bin_width,
            precision,
            method,
        }
    }

    ///
    /// Reject settings no level can be built with.
    ///
    /// Half precision tops out around 65504, which unbounded sums overrun.
    ///
    pub fn validate(&self) -> Result<(), BinListError> {
        if self.bin_width == 0 {
            return Err(BinListError::InvalidBinWidth);
        }
        if self.precision == Precision::Half && self.method == AggregationMethod::Sum {
            return Err(BinListError::IncompatiblePrecision {
                precision: self.precision,
                method: self.method,
            });
        }
        Ok(())
    }
}

///
/// Per-chromosome bin arrays at a single bin width.
///
/// Array lengths are `ceil(chromosome length / bin width)` and never change.
///
#[derive(Debug, Clone, PartialEq)]
pub struct BinLevel {
    settings: LevelSettings,
    lengths: Vec<u32>,
    arrays: Vec<BinArray>,
}

impl BinLevel {
    ///
    /// Aggregate per-chromosome records into a new level.
    ///
    /// `records[i]` holds the records of chromosome `i` in `catalog`. Trailing
    /// chromosomes without an entry get an all-zero array. One task per
    /// chromosome runs on `coordinator`; the first failing chromosome (by
    /// index) fails the whole call.
    ///
    pub fn aggregate<C, R>(
        catalog: &C,
        coordinator: &ExecutionCoordinator,
        settings: LevelSettings,
        records: &[Vec<R>],
    ) -> Result<Self, BinListError>
    where
        C: ChromosomeCatalog + ?Sized,
        R: AsScoredWindow + Sync,
    {
        settings.validate()?;

        let count = catalog.count();
        if records.len() > count {
            return Err(BinListError::ChromosomeCountMismatch {
                expected: count,
                found: records.len(),
            });
        }

        let lengths: Vec<u32> = catalog.iter().map(|c| c.length).collect();

        let mut batch = coordinator.batch();
        for (index, &length) in lengths.iter().enumerate() {
            let chromosome_records = records.get(index).map(Vec::as_slice).unwrap_or(&[]);
            batch.push(move || {
                aggregate_chromosome(index, length, settings, chromosome_records)
            });
        }
        let arrays = batch.join()?;

        debug!(
            "Aggregated {} chromosomes at {} bp ({})",
            arrays.len(),
            settings.bin_width,
            settings.method
        );

        Ok(BinLevel {
            settings,
            lengths,
            arrays,
        })
    }

    ///
    /// Derive a level at `bin_width` from this one.
    ///
    /// Every non-zero bin becomes a window covering the bin, clipped to the
    /// chromosome end, scored with the bin value. Zero bins carry no data and
    /// are skipped. The source precision is kept.
    ///
    pub fn resample(
        &self,
        coordinator: &ExecutionCoordinator,
        bin_width: u32,
        method: AggregationMethod,
    ) -> Result<Self, BinListError> {
        let settings = LevelSettings::new(bin_width, self.settings.precision, method);
        settings.validate()?;

        let source_width = self.settings.bin_width;

        let mut batch = coordinator.batch();
        for (index, (array, &length)) in self.arrays.iter().zip(&self.lengths).enumerate() {
            batch.push(move || {
                let values = array.values()?;
                let mut acc =
                    ChromosomeAccumulator::new(method, bin_width, bin_count(length, bin_width));
                for (j, value) in values.iter().enumerate().filter(|(_, v)| *v != 0.0) {
                    acc.add(&bin_window(j, source_width, length, value));
                }
                let bins = acc.into_bins();
                debug!("Resampled chromosome {} into {} bins", index, bins.len());
                Ok::<_, BinListError>(BinArray::from_f64(settings.precision, &bins))
            });
        }
        let arrays = batch.join()?;

        Ok(BinLevel {
            settings,
            lengths: self.lengths.clone(),
            arrays,
        })
    }

    pub fn settings(&self) -> LevelSettings {
        self.settings
    }

    pub fn bin_width(&self) -> u32 {
        self.settings.bin_width
    }

    pub fn precision(&self) -> Precision {
        self.settings.precision
    }

    pub fn method(&self) -> AggregationMethod {
        self.settings.method
    }

    pub fn chromosome_count(&self) -> usize {
        self.arrays.len()
    }

    pub fn arrays(&self) -> &[BinArray] {
        &self.arrays
    }

    pub fn array(&self, chromosome: usize) -> Result<&BinArray, BinListError> {
        self.arrays
            .get(chromosome)
            .ok_or(BinListError::ChromosomeOutOfRange {
                index: chromosome,
                count: self.arrays.len(),
            })
    }

    pub fn bin_count(&self, chromosome: usize) -> Result<usize, BinListError> {
        Ok(self.array(chromosome)?.len())
    }

    /// All bins of one chromosome, widened to `f64`.
    pub fn get(&self, chromosome: usize) -> Result<Vec<f64>, BinListError> {
        Ok(self.array(chromosome)?.to_vec()?)
    }

    pub fn get_bin(&self, chromosome: usize, bin: usize) -> Result<f64, BinListError> {
        let array = self.array(chromosome)?;
        array.get(bin)?.ok_or(BinListError::BinOutOfRange {
            chromosome,
            index: bin,
            count: array.len(),
        })
    }

    pub fn is_compressed(&self) -> bool {
        self.arrays.iter().any(|a| a.is_compressed())
    }

    ///
    /// Build, without touching `self`, the arrays this level would hold after
    /// a compression toggle.
    ///
    pub(crate) fn toggled_arrays(&self, compress: bool) -> Result<Vec<BinArray>, CompressionError> {
        self.arrays
            .iter()
            .map(|a| if compress { a.compressed() } else { a.uncompressed() })
            .collect()
    }

    /// Swap in arrays produced by [`BinLevel::toggled_arrays`].
    pub(crate) fn replace_arrays(&mut self, arrays: Vec<BinArray>) {
        debug_assert_eq!(arrays.len(), self.arrays.len());
        self.arrays = arrays;
    }

    #[cfg(test)]
    pub(crate) fn from_parts(settings: LevelSettings, lengths: Vec<u32>, arrays: Vec<BinArray>) -> Self {
        BinLevel {
            settings,
            lengths,
            arrays,
        }
    }
}

/// Bins of width `bin_width` needed to cover `length` base pairs.
fn bin_count(length: u32, bin_width: u32) -> usize {
    length.div_ceil(bin_width) as usize
}

/// Window covering bin `j`, clipped to the chromosome end.
fn bin_window(j: usize, bin_width: u32, length: u32, score: f64) -> ScoredWindow {
    let start = j as u64 * bin_width as u64;
    let stop = (start + bin_width as u64).min(length as u64);
    ScoredWindow::new(start as u32, stop as u32, score)
}

fn aggregate_chromosome<R: AsScoredWindow>(
    index: usize,
    length: u32,
    settings: LevelSettings,
    records: &[R],
) -> Result<BinArray, BinListError> {
    let count = bin_count(length, settings.bin_width);
    if records.is_empty() {
        return Ok(BinArray::zeros(settings.precision, count));
    }

    let mut acc = ChromosomeAccumulator::new(settings.method, settings.bin_width, count);
    for record in records {
        let window = record.as_scored_window();
        if !window.is_valid() {
            return Err(BinListError::InvalidWindow {
                chromosome: index,
                start: window.start,
                stop: window.stop,
            });
        }
        acc.add(&window);
    }

    Ok(BinArray::from_f64(settings.precision, acc.bins()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use bintrack_core::Genome;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case(1_000, 10, 100)]
    #[case(1_001, 10, 101)]
    #[case(16, 100, 1)]
    #[case(0, 100, 0)]
    fn test_bin_count(#[case] length: u32, #[case] bin_width: u32, #[case] expected: usize) {
        assert_eq!(bin_count(length, bin_width), expected);
    }

    #[fixture]
    fn genome() -> Genome {
        Genome::new(vec![("chr1".to_string(), 45), ("chr2".to_string(), 20)]).unwrap()
    }

    #[fixture]
    fn coordinator() -> ExecutionCoordinator {
        ExecutionCoordinator::new(2).unwrap()
    }

    fn sum_settings(bin_width: u32) -> LevelSettings {
        LevelSettings::new(bin_width, Precision::Single, AggregationMethod::Sum)
    }

    #[rstest]
    fn test_aggregate_per_chromosome(genome: Genome, coordinator: ExecutionCoordinator) {
        let records = vec![
            vec![ScoredWindow::new(5, 15, 4.0), ScoredWindow::point(44, 1.0)],
            vec![ScoredWindow::new(0, 20, 2.0)],
        ];
        let level = BinLevel::aggregate(&genome, &coordinator, sum_settings(10), &records).unwrap();

        assert_eq!(level.chromosome_count(), 2);
        assert_eq!(level.get(0).unwrap(), vec![2.0, 2.0, 0.0, 0.0, 1.0]);
        assert_eq!(level.get(1).unwrap(), vec![1.0, 1.0]);
        assert_eq!(level.get_bin(0, 4).unwrap(), 1.0);
    }

    #[rstest]
    fn test_missing_chromosomes_are_empty(genome: Genome, coordinator: ExecutionCoordinator) {
        let records = vec![vec![3u32, 4, 40]];
        let level = BinLevel::aggregate(&genome, &coordinator, sum_settings(10), &records).unwrap();
        assert_eq!(level.get(0).unwrap(), vec![2.0, 0.0, 0.0, 0.0, 1.0]);
        assert_eq!(level.get(1).unwrap(), vec![0.0, 0.0]);
    }

    #[rstest]
    fn test_too_many_chromosomes(genome: Genome, coordinator: ExecutionCoordinator) {
        let records: Vec<Vec<u32>> = vec![vec![], vec![], vec![1]];
        let err = BinLevel::aggregate(&genome, &coordinator, sum_settings(10), &records).unwrap_err();
        assert!(matches!(
            err,
            BinListError::ChromosomeCountMismatch { expected: 2, found: 3 }
        ));
    }

    #[rstest]
    fn test_invalid_window_fails_level(genome: Genome, coordinator: ExecutionCoordinator) {
        let records = vec![
            vec![ScoredWindow::new(0, 10, 1.0)],
            vec![ScoredWindow::new(15, 5, 1.0)],
        ];
        let err = BinLevel::aggregate(&genome, &coordinator, sum_settings(10), &records).unwrap_err();
        match err {
            BinListError::ChromosomeTask { chromosome, source } => {
                assert_eq!(chromosome, 1);
                assert!(matches!(
                    *source,
                    BinListError::InvalidWindow { chromosome: 1, start: 15, stop: 5 }
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[rstest]
    #[case(LevelSettings::new(0, Precision::Single, AggregationMethod::Average))]
    #[case(LevelSettings::new(10, Precision::Half, AggregationMethod::Sum))]
    fn test_rejected_settings(#[case] settings: LevelSettings) {
        assert!(settings.validate().is_err());
    }

    #[rstest]
    fn test_resample_averages_non_zero_bins(coordinator: ExecutionCoordinator) {
        let arrays = vec![
            BinArray::from_f64(Precision::Single, &[2.0, 0.0, 4.0, 6.0, 8.0]),
            BinArray::from_f64(Precision::Single, &[0.0, 0.0]),
        ];
        let level = BinLevel::from_parts(sum_settings(10), vec![45, 20], arrays);

        let coarse = level
            .resample(&coordinator, 20, AggregationMethod::Average)
            .unwrap();
        assert_eq!(coarse.bin_width(), 20);
        assert_eq!(coarse.method(), AggregationMethod::Average);
        assert_eq!(coarse.get(0).unwrap(), vec![2.0, 5.0, 8.0]);
        assert_eq!(coarse.get(1).unwrap(), vec![0.0]);
    }

    #[rstest]
    fn test_resample_is_deterministic(genome: Genome, coordinator: ExecutionCoordinator) {
        let records = vec![
            (0..45u32).map(|p| (p, (p % 5) as f64 + 0.25)).collect::<Vec<_>>(),
            vec![(3u32, 1.5), (19, 2.5)],
        ];
        let level = BinLevel::aggregate(&genome, &coordinator, sum_settings(3), &records).unwrap();

        let a = level.resample(&coordinator, 9, AggregationMethod::Average).unwrap();
        let b = level.resample(&coordinator, 9, AggregationMethod::Average).unwrap();
        for i in 0..2 {
            let (x, y) = (a.get(i).unwrap(), b.get(i).unwrap());
            assert_eq!(
                x.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
                y.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
            );
        }
    }

    #[rstest]
    fn test_resample_reads_compressed_source(coordinator: ExecutionCoordinator) {
        let mut array = BinArray::from_f64(Precision::Single, &[1.0, 3.0]);
        array.compress().unwrap();
        let level = BinLevel::from_parts(sum_settings(10), vec![20], vec![array]);

        let coarse = level.resample(&coordinator, 20, AggregationMethod::Maximum).unwrap();
        assert_eq!(coarse.get(0).unwrap(), vec![3.0]);
    }

    #[rstest]
    fn test_lookup_errors(genome: Genome, coordinator: ExecutionCoordinator) {
        let level =
            BinLevel::aggregate::<_, u32>(&genome, &coordinator, sum_settings(10), &[]).unwrap();
        assert!(matches!(
            level.get(2),
            Err(BinListError::ChromosomeOutOfRange { index: 2, count: 2 })
        ));
        assert!(matches!(
            level.get_bin(1, 2),
            Err(BinListError::BinOutOfRange { chromosome: 1, index: 2, count: 2 })
        ));
    }
}
