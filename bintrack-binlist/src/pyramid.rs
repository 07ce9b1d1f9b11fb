//! Coarser derived levels that keep zoomed-out display cheap.

use log::debug;

use bintrack_core::AggregationMethod;

use crate::consts::{ACCELERATOR_FACTOR, ACCELERATOR_MAX_BINWIDTH};
use crate::errors::BinListError;
use crate::executor::ExecutionCoordinator;
use crate::level::BinLevel;

///
/// Geometry of the pyramid: each level is `factor` times wider than the one
/// below it, and no level is wider than `max_bin_width`.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PyramidSettings {
    pub factor: u32,
    pub max_bin_width: u32,
}

impl Default for PyramidSettings {
    fn default() -> Self {
        PyramidSettings {
            factor: ACCELERATOR_FACTOR,
            max_bin_width: ACCELERATOR_MAX_BINWIDTH,
        }
    }
}

impl PyramidSettings {
    pub fn new(factor: u32, max_bin_width: u32) -> Result<Self, BinListError> {
        let settings = PyramidSettings {
            factor,
            max_bin_width,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), BinListError> {
        if self.factor < 2 {
            return Err(BinListError::InvalidAcceleratorFactor(self.factor));
        }
        Ok(())
    }

    /// Width of the level above `bin_width`, if one is allowed.
    pub fn next_bin_width(&self, bin_width: u32) -> Option<u32> {
        bin_width
            .checked_mul(self.factor)
            .filter(|w| *w > bin_width && *w <= self.max_bin_width)
    }
}

///
/// Build the level directly above `level`, or `None` when it would exceed the
/// width ceiling. The new level averages the non-zero bins of `level`.
///
pub fn build_accelerator(
    level: &BinLevel,
    coordinator: &ExecutionCoordinator,
    settings: &PyramidSettings,
) -> Result<Option<BinLevel>, BinListError> {
    match settings.next_bin_width(level.bin_width()) {
        Some(width) => {
            debug!(
                "Building accelerator level at {} bp from {} bp",
                width,
                level.bin_width()
            );
            Ok(Some(level.resample(
                coordinator,
                width,
                AggregationMethod::Average,
            )?))
        }
        None => Ok(None),
    }
}

///
/// The chain of accelerator levels above a base level, finest first.
///
/// Each level is built from the previous one only after that one's batch has
/// completed. No statistics are computed for these levels.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionPyramid {
    levels: Vec<BinLevel>,
}

impl ResolutionPyramid {
    pub fn build(
        base: &BinLevel,
        coordinator: &ExecutionCoordinator,
        settings: &PyramidSettings,
    ) -> Result<Self, BinListError> {
        settings.validate()?;

        let mut levels: Vec<BinLevel> = Vec::new();
        loop {
            let parent = levels.last().unwrap_or(base);
            match build_accelerator(parent, coordinator, settings)? {
                Some(level) => levels.push(level),
                None => break,
            }
        }

        debug!(
            "Built {} accelerator levels above {} bp",
            levels.len(),
            base.bin_width()
        );

        Ok(ResolutionPyramid { levels })
    }

    pub fn levels(&self) -> &[BinLevel] {
        &self.levels
    }

    pub(crate) fn levels_mut(&mut self) -> &mut [BinLevel] {
        &mut self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn bin_widths(&self) -> Vec<u32> {
        self.levels.iter().map(|l| l.bin_width()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bintrack_core::{Genome, Precision, ScoredWindow};
    use pretty_assertions::assert_eq;
    use rstest::*;

    use crate::level::LevelSettings;

    #[fixture]
    fn coordinator() -> ExecutionCoordinator {
        ExecutionCoordinator::new(2).unwrap()
    }

    #[fixture]
    fn base(coordinator: ExecutionCoordinator) -> BinLevel {
        let genome = Genome::new(vec![("chr1".to_string(), 10_000), ("chr2".to_string(), 2_500)])
            .unwrap();
        let records = vec![
            vec![
                ScoredWindow::new(0, 10, 4.0),
                ScoredWindow::new(10, 20, 2.0),
                ScoredWindow::new(5_000, 5_010, 9.0),
            ],
            vec![ScoredWindow::new(2_490, 2_500, 1.0)],
        ];
        let settings = LevelSettings::new(10, Precision::Single, AggregationMethod::Sum);
        BinLevel::aggregate(&genome, &coordinator, settings, &records).unwrap()
    }

    #[rstest]
    #[case(10, Some(1_000))]
    #[case(10_000, Some(1_000_000))]
    #[case(10_001, None)]
    #[case(u32::MAX / 2, None)]
    #[case(0, None)]
    fn test_next_bin_width(#[case] width: u32, #[case] expected: Option<u32>) {
        assert_eq!(PyramidSettings::default().next_bin_width(width), expected);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    fn test_degenerate_factor_rejected(#[case] factor: u32) {
        assert!(matches!(
            PyramidSettings::new(factor, 1_000),
            Err(BinListError::InvalidAcceleratorFactor(_))
        ));
    }

    #[rstest]
    fn test_zero_width_has_no_levels() {
        let settings = PyramidSettings::new(2, u32::MAX).unwrap();
        assert_eq!(settings.next_bin_width(0), None);
        assert_eq!(settings.next_bin_width(1), Some(2));
    }

    #[rstest]
    fn test_levels_grow_geometrically(base: BinLevel, coordinator: ExecutionCoordinator) {
        let settings = PyramidSettings::new(10, 5_000).unwrap();
        let pyramid = ResolutionPyramid::build(&base, &coordinator, &settings).unwrap();

        assert_eq!(pyramid.bin_widths(), vec![100, 1_000]);
        for level in pyramid.levels() {
            assert_eq!(level.method(), AggregationMethod::Average);
            assert_eq!(level.precision(), Precision::Single);
        }

        let coarse = &pyramid.levels()[0];
        assert_eq!(coarse.bin_count(0).unwrap(), 100);
        assert_eq!(coarse.get_bin(0, 0).unwrap(), 3.0);
        assert_eq!(coarse.get_bin(0, 50).unwrap(), 9.0);
        assert_eq!(coarse.get_bin(1, 24).unwrap(), 1.0);

        let coarsest = &pyramid.levels()[1];
        assert_eq!(coarsest.get(1).unwrap(), vec![0.0, 0.0, 1.0]);
    }

    #[rstest]
    fn test_no_levels_when_base_is_too_wide(base: BinLevel, coordinator: ExecutionCoordinator) {
        let settings = PyramidSettings::new(100, 999).unwrap();
        let pyramid = ResolutionPyramid::build(&base, &coordinator, &settings).unwrap();
        assert!(pyramid.is_empty());
        assert!(build_accelerator(&base, &coordinator, &settings).unwrap().is_none());
    }

    #[rstest]
    fn test_rebuilding_a_level_is_bit_identical(base: BinLevel, coordinator: ExecutionCoordinator) {
        let settings = PyramidSettings::default();
        let first = build_accelerator(&base, &coordinator, &settings).unwrap().unwrap();
        let second = build_accelerator(&base, &coordinator, &settings).unwrap().unwrap();

        for chromosome in 0..base.chromosome_count() {
            let a: Vec<u64> = first.get(chromosome).unwrap().iter().map(|v| v.to_bits()).collect();
            let b: Vec<u64> = second.get(chromosome).unwrap().iter().map(|v| v.to_bits()).collect();
            assert_eq!(a, b);
        }
    }
}
