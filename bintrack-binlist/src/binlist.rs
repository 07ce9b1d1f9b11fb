use std::iter;

use log::{error, info};

use bintrack_core::{AggregationMethod, ChromosomeCatalog, Precision, ScoredWindow};

use crate::aggregator::AsScoredWindow;
use crate::config::EngineConfig;
use crate::errors::BinListError;
use crate::executor::ExecutionCoordinator;
use crate::level::{BinLevel, LevelSettings};
use crate::projection;
use crate::pyramid::{PyramidSettings, ResolutionPyramid};
use crate::statistics::{BinListStatistics, compute_statistics};

///
/// A fixed-width bin signal over a genome, with its statistics and the
/// accelerator levels used for zoomed-out display.
///
/// Built once through [`BinListBuilder`]; afterwards only the compression
/// mode can change. Cloning makes an independent deep copy.
///
#[derive(Debug, Clone)]
pub struct BinList {
    base: BinLevel,
    pyramid: ResolutionPyramid,
    statistics: BinListStatistics,
}

impl BinList {
    pub fn builder(coordinator: &ExecutionCoordinator) -> BinListBuilder {
        BinListBuilder::new(coordinator)
    }

    pub fn bin_width(&self) -> u32 {
        self.base.bin_width()
    }

    pub fn precision(&self) -> Precision {
        self.base.precision()
    }

    pub fn method(&self) -> AggregationMethod {
        self.base.method()
    }

    pub fn chromosome_count(&self) -> usize {
        self.base.chromosome_count()
    }

    pub fn bin_count(&self, chromosome: usize) -> Result<usize, BinListError> {
        self.base.bin_count(chromosome)
    }

    /// All bins of one chromosome.
    pub fn get(&self, chromosome: usize) -> Result<Vec<f64>, BinListError> {
        self.base.get(chromosome)
    }

    pub fn get_bin(&self, chromosome: usize, bin: usize) -> Result<f64, BinListError> {
        self.base.get_bin(chromosome, bin)
    }

    pub fn statistics(&self) -> &BinListStatistics {
        &self.statistics
    }

    pub fn level(&self) -> &BinLevel {
        &self.base
    }

    pub fn pyramid(&self) -> &ResolutionPyramid {
        &self.pyramid
    }

    pub fn accelerator_bin_widths(&self) -> Vec<u32> {
        self.pyramid.bin_widths()
    }

    /// One value per pixel for `chromosome` at `bp_per_pixel` base pairs per pixel.
    pub fn project(&self, chromosome: usize, bp_per_pixel: f64) -> Result<Vec<f64>, BinListError> {
        projection::project(&self.base, &self.pyramid, chromosome, bp_per_pixel)
    }

    pub fn is_compressed(&self) -> bool {
        self.base.is_compressed()
    }

    /// Compress every array of the base level and all accelerator levels.
    pub fn compress(&mut self) -> Result<(), BinListError> {
        self.set_compressed(true)
    }

    pub fn uncompress(&mut self) -> Result<(), BinListError> {
        self.set_compressed(false)
    }

    // All levels are staged first so a failure leaves every level as it was.
    fn set_compressed(&mut self, compress: bool) -> Result<(), BinListError> {
        let staged: Result<Vec<_>, _> = iter::once(&self.base)
            .chain(self.pyramid.levels())
            .map(|level| level.toggled_arrays(compress))
            .collect();

        let staged = match staged {
            Ok(staged) => staged,
            Err(e) => {
                error!(
                    "Failed to {} bin-list at {} bp: {}",
                    if compress { "compress" } else { "uncompress" },
                    self.bin_width(),
                    e
                );
                return Err(e.into());
            }
        };

        for (level, arrays) in iter::once(&mut self.base)
            .chain(self.pyramid.levels_mut().iter_mut())
            .zip(staged)
        {
            level.replace_arrays(arrays);
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn pyramid_mut(&mut self) -> &mut ResolutionPyramid {
        &mut self.pyramid
    }
}

///
/// Settings and shared pool for building a [`BinList`].
///
/// # Example
///
/// ```rust
/// use bintrack_binlist::{BinList, ExecutionCoordinator};
/// use bintrack_core::{AggregationMethod, Genome, ScoredWindow};
///
/// let genome = Genome::new(vec![("chr1".to_string(), 100)]).unwrap();
/// let coordinator = ExecutionCoordinator::new(2).unwrap();
///
/// let binlist = BinList::builder(&coordinator)
///     .with_bin_width(10)
///     .with_method(AggregationMethod::Average)
///     .from_windows(&genome, &[vec![ScoredWindow::new(0, 20, 4.0)]])
///     .unwrap();
///
/// assert_eq!(binlist.bin_count(0).unwrap(), 10);
/// assert_eq!(binlist.get_bin(0, 1).unwrap(), 2.0);
/// ```
///
#[derive(Debug, Clone)]
pub struct BinListBuilder {
    coordinator: ExecutionCoordinator,
    bin_width: u32,
    precision: Precision,
    method: AggregationMethod,
    pyramid: PyramidSettings,
}

impl BinListBuilder {
    pub fn new(coordinator: &ExecutionCoordinator) -> Self {
        BinListBuilder {
            coordinator: coordinator.clone(),
            bin_width: 1,
            precision: Precision::default(),
            method: AggregationMethod::default(),
            pyramid: PyramidSettings::default(),
        }
    }

    pub fn with_bin_width(mut self, bin_width: u32) -> Self {
        self.bin_width = bin_width;
        self
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_method(mut self, method: AggregationMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_pyramid_settings(mut self, pyramid: PyramidSettings) -> Self {
        self.pyramid = pyramid;
        self
    }

    /// Take precision, method and pyramid geometry from `config`.
    pub fn with_config(self, config: &EngineConfig) -> Result<Self, BinListError> {
        let pyramid = config.pyramid_settings()?;
        Ok(self
            .with_precision(config.precision)
            .with_method(config.method)
            .with_pyramid_settings(pyramid))
    }

    fn settings(&self) -> LevelSettings {
        LevelSettings::new(self.bin_width, self.precision, self.method)
    }

    /// Count positions per bin. The configured method is ignored.
    pub fn from_positions<C>(self, catalog: &C, positions: &[Vec<u32>]) -> Result<BinList, BinListError>
    where
        C: ChromosomeCatalog + ?Sized,
    {
        self.with_method(AggregationMethod::Sum)
            .from_records(catalog, positions)
    }

    pub fn from_scored_positions<C>(
        self,
        catalog: &C,
        positions: &[Vec<(u32, f64)>],
    ) -> Result<BinList, BinListError>
    where
        C: ChromosomeCatalog + ?Sized,
    {
        self.from_records(catalog, positions)
    }

    pub fn from_windows<C>(
        self,
        catalog: &C,
        windows: &[Vec<ScoredWindow>],
    ) -> Result<BinList, BinListError>
    where
        C: ChromosomeCatalog + ?Sized,
    {
        self.from_records(catalog, windows)
    }

    ///
    /// Aggregate any per-chromosome records, one list per chromosome ordinal.
    ///
    pub fn from_records<C, R>(self, catalog: &C, records: &[Vec<R>]) -> Result<BinList, BinListError>
    where
        C: ChromosomeCatalog + ?Sized,
        R: AsScoredWindow + Sync,
    {
        let base = BinLevel::aggregate(catalog, &self.coordinator, self.settings(), records)?;
        self.finish(base)
    }

    ///
    /// Re-bin `source` at the configured width and method. The source
    /// precision is kept; the configured one is ignored.
    ///
    pub fn resample(self, source: &BinList) -> Result<BinList, BinListError> {
        let base = source
            .base
            .resample(&self.coordinator, self.bin_width, self.method)?;
        self.finish(base)
    }

    fn finish(self, base: BinLevel) -> Result<BinList, BinListError> {
        self.pyramid.validate()?;

        let statistics = compute_statistics(&self.coordinator, base.arrays())?;
        let pyramid = ResolutionPyramid::build(&base, &self.coordinator, &self.pyramid)?;

        info!(
            "Built {} bin-list at {} bp over {} chromosomes: {} non-zero bins, {} accelerator levels",
            base.method(),
            base.bin_width(),
            base.chromosome_count(),
            statistics.non_zero_count,
            pyramid.len()
        );

        Ok(BinList {
            base,
            pyramid,
            statistics,
        })
    }
}
