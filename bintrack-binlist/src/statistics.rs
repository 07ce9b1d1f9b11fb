//! Genome-wide summary statistics over bin arrays.
//!
//! Zero bins mean "no data" and are left out of every statistic. The work runs
//! as two batches on the shared coordinator: the first gathers extrema, sum and
//! count per chromosome, the second sums squared deviations from the
//! genome-wide mean.

use serde::Serialize;

use crate::errors::BinListError;
use crate::executor::ExecutionCoordinator;
use crate::storage::BinArray;

///
/// Summary of every non-zero bin in a bin-list.
///
/// With no non-zero bin, `min`/`max` stay at `+inf`/`-inf`, `sum` and
/// `non_zero_count` at zero, and `mean`/`std_dev` are `None`.
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BinListStatistics {
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub non_zero_count: u64,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
}

impl Default for BinListStatistics {
    fn default() -> Self {
        BinListStatistics {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: 0.0,
            non_zero_count: 0,
            mean: None,
            std_dev: None,
        }
    }
}

impl BinListStatistics {
    pub fn has_data(&self) -> bool {
        self.non_zero_count > 0
    }
}

#[derive(Debug, Clone, Copy)]
struct PartialSummary {
    min: f64,
    max: f64,
    sum: f64,
    count: u64,
}

impl PartialSummary {
    fn empty() -> Self {
        PartialSummary {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: 0.0,
            count: 0,
        }
    }

    fn merge(self, other: PartialSummary) -> Self {
        PartialSummary {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            sum: self.sum + other.sum,
            count: self.count + other.count,
        }
    }
}

fn summarize(array: &BinArray) -> Result<PartialSummary, BinListError> {
    let values = array.values()?;
    let summary = values
        .iter()
        .filter(|v| *v != 0.0)
        .fold(PartialSummary::empty(), |acc, v| PartialSummary {
            min: acc.min.min(v),
            max: acc.max.max(v),
            sum: acc.sum + v,
            count: acc.count + 1,
        });
    Ok(summary)
}

fn squared_deviation(array: &BinArray, mean: f64) -> Result<f64, BinListError> {
    let values = array.values()?;
    Ok(values
        .iter()
        .filter(|v| *v != 0.0)
        .map(|v| (v - mean) * (v - mean))
        .sum())
}

///
/// Compute statistics over `arrays`, one task per chromosome and pass.
///
/// A failing chromosome fails the whole computation; no partial result is
/// returned. Per-chromosome results are reduced in chromosome order, so the
/// outcome does not depend on the worker count.
///
pub fn compute_statistics(
    coordinator: &ExecutionCoordinator,
    arrays: &[BinArray],
) -> Result<BinListStatistics, BinListError> {
    let summaries =
        coordinator.run_all(arrays.iter().map(|a| move || summarize(a)).collect())?;

    let total = summaries
        .into_iter()
        .fold(PartialSummary::empty(), PartialSummary::merge);

    if total.count == 0 {
        return Ok(BinListStatistics::default());
    }

    let mean = total.sum / total.count as f64;

    let deviations = coordinator.run_all(
        arrays
            .iter()
            .map(|a| move || squared_deviation(a, mean))
            .collect(),
    )?;
    let variance = deviations.iter().sum::<f64>() / total.count as f64;

    Ok(BinListStatistics {
        min: total.min,
        max: total.max,
        sum: total.sum,
        non_zero_count: total.count,
        mean: Some(mean),
        std_dev: Some(variance.sqrt()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use bintrack_core::Precision;
    use pretty_assertions::assert_eq;
    use rstest::*;

    use crate::storage::Compressible;

    #[fixture]
    fn coordinator() -> ExecutionCoordinator {
        ExecutionCoordinator::new(3).unwrap()
    }

    #[rstest]
    fn test_single_chromosome(coordinator: ExecutionCoordinator) {
        let arrays = vec![BinArray::from_f64(Precision::Single, &[0.0, 2.0, 0.0, 4.0, 6.0])];
        let stats = compute_statistics(&coordinator, &arrays).unwrap();

        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 6.0);
        assert_eq!(stats.sum, 12.0);
        assert_eq!(stats.non_zero_count, 3);
        assert_eq!(stats.mean, Some(4.0));
        assert!((stats.std_dev.unwrap() - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[rstest]
    fn test_reduces_across_chromosomes(coordinator: ExecutionCoordinator) {
        let mut compressed = BinArray::from_f64(Precision::Single, &[0.0, 6.0]);
        compressed.compress().unwrap();
        let arrays = vec![
            BinArray::from_f64(Precision::Single, &[2.0]),
            BinArray::zeros(Precision::Single, 4),
            compressed,
            BinArray::from_f64(Precision::Half, &[-4.0, 0.0, 0.0]),
        ];
        let stats = compute_statistics(&coordinator, &arrays).unwrap();

        assert_eq!(stats.min, -4.0);
        assert_eq!(stats.max, 6.0);
        assert_eq!(stats.sum, 4.0);
        assert_eq!(stats.non_zero_count, 3);
        let mean = 4.0 / 3.0;
        assert_eq!(stats.mean, Some(mean));
        let expected = (((2.0 - mean).powi(2) + (6.0 - mean).powi(2) + (-4.0 - mean).powi(2))
            / 3.0f64)
            .sqrt();
        assert!((stats.std_dev.unwrap() - expected).abs() < 1e-12);
    }

    #[rstest]
    fn test_no_data_keeps_sentinels(coordinator: ExecutionCoordinator) {
        let arrays = vec![BinArray::zeros(Precision::Single, 5), BinArray::zeros(Precision::Half, 0)];
        let stats = compute_statistics(&coordinator, &arrays).unwrap();
        assert_eq!(stats, BinListStatistics::default());
        assert!(!stats.has_data());
        assert_eq!(stats.min, f64::INFINITY);
        assert_eq!(stats.max, f64::NEG_INFINITY);
    }

    #[rstest]
    fn test_corrupted_chromosome_fails(coordinator: ExecutionCoordinator) {
        let arrays = vec![
            BinArray::from_f64(Precision::Single, &[1.0]),
            BinArray::corrupted(Precision::Single, 3),
        ];
        let err = compute_statistics(&coordinator, &arrays).unwrap_err();
        assert!(matches!(err, BinListError::ChromosomeTask { chromosome: 1, .. }));
    }

    #[rstest]
    fn test_same_result_for_any_pool_size() {
        let arrays: Vec<BinArray> = (0..12)
            .map(|c| {
                let values: Vec<f64> = (0..500)
                    .map(|i| if (i + c) % 3 == 0 { 0.0 } else { ((i * 7 + c) % 11) as f64 * 0.37 })
                    .collect();
                BinArray::from_f64(Precision::Single, &values)
            })
            .collect();

        let serial = compute_statistics(&ExecutionCoordinator::new(1).unwrap(), &arrays).unwrap();
        let parallel = compute_statistics(&ExecutionCoordinator::new(6).unwrap(), &arrays).unwrap();
        assert_eq!(serial, parallel);
    }
}
