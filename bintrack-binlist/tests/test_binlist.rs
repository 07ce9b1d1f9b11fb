use std::path::Path;
use std::sync::Arc;

use indicatif::ProgressBar;
use rstest::*;

use bintrack_binlist::{BinList, BinListError, EngineConfig, ExecutionCoordinator};
use bintrack_core::utils::read_scored_windows;
use bintrack_core::{AggregationMethod, ChromosomeCatalog, Genome, ScoredWindow};

#[fixture]
fn path_to_chrom_sizes() -> &'static str {
    "tests/data/test.chrom.sizes"
}

#[fixture]
fn path_to_windows() -> &'static str {
    "tests/data/windows.bed"
}

#[fixture]
fn genome(path_to_chrom_sizes: &str) -> Genome {
    Genome::from_chrom_sizes(path_to_chrom_sizes).unwrap()
}

#[fixture]
fn windows(genome: Genome, path_to_windows: &str) -> Vec<Vec<ScoredWindow>> {
    read_scored_windows(Path::new(path_to_windows), &genome).unwrap()
}

mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn bits(values: &[f64]) -> Vec<u64> {
        values.iter().map(|v| v.to_bits()).collect()
    }

    #[rstest]
    fn test_windows_loaded_per_chromosome(windows: Vec<Vec<ScoredWindow>>) {
        let counts: Vec<usize> = windows.iter().map(|w| w.len()).collect();
        assert_eq!(counts, vec![4, 2, 1]);
    }

    #[rstest]
    fn test_sum_conserves_scores(genome: Genome, windows: Vec<Vec<ScoredWindow>>) {
        let coordinator = ExecutionCoordinator::new(4).unwrap();
        let binlist = BinList::builder(&coordinator)
            .with_bin_width(100)
            .from_windows(&genome, &windows)
            .unwrap();

        for (index, chromosome_windows) in windows.iter().enumerate() {
            let expected: f64 = chromosome_windows.iter().map(|w| w.score).sum();
            let total: f64 = binlist.get(index).unwrap().iter().sum();
            assert!(
                (total - expected).abs() < 1e-4,
                "chromosome {index}: {total} != {expected}"
            );
        }

        assert_eq!(binlist.bin_count(0).unwrap(), 200);
        assert_eq!(binlist.get_bin(0, 0).unwrap(), 5.5);
        assert_eq!(binlist.get_bin(0, 1).unwrap(), 10.0);
        assert_eq!(binlist.get_bin(0, 10).unwrap(), 3.0);
        assert_eq!(binlist.get_bin(2, 14).unwrap(), 1.0);
    }

    #[rstest]
    #[case(AggregationMethod::Sum)]
    #[case(AggregationMethod::Average)]
    #[case(AggregationMethod::Maximum)]
    fn test_pool_size_does_not_change_results(
        genome: Genome,
        windows: Vec<Vec<ScoredWindow>>,
        #[case] method: AggregationMethod,
    ) {
        let build = |threads: usize| {
            let coordinator = ExecutionCoordinator::new(threads).unwrap();
            BinList::builder(&coordinator)
                .with_bin_width(50)
                .with_method(method)
                .from_windows(&genome, &windows)
                .unwrap()
        };

        let serial = build(1);
        let parallel = build(6);

        for chromosome in 0..genome.count() {
            assert_eq!(
                bits(&serial.get(chromosome).unwrap()),
                bits(&parallel.get(chromosome).unwrap())
            );
            assert_eq!(
                bits(&serial.project(chromosome, 20_000.0).unwrap()),
                bits(&parallel.project(chromosome, 20_000.0).unwrap())
            );
        }
        assert_eq!(serial.statistics(), parallel.statistics());
        assert_eq!(serial.accelerator_bin_widths(), parallel.accelerator_bin_widths());
    }

    #[rstest]
    fn test_failed_batch_yields_no_binlist(genome: Genome, mut windows: Vec<Vec<ScoredWindow>>) {
        windows[1].push(ScoredWindow::new(500, 400, 1.0));
        let coordinator = ExecutionCoordinator::new(3).unwrap();

        let result = BinList::builder(&coordinator)
            .with_bin_width(100)
            .from_windows(&genome, &windows);

        match result {
            Err(BinListError::ChromosomeTask { chromosome, .. }) => assert_eq!(chromosome, 1),
            other => panic!("expected a chromosome failure, got {other:?}"),
        }
    }

    #[rstest]
    fn test_progress_reports_every_task(genome: Genome, windows: Vec<Vec<ScoredWindow>>) {
        let bar = ProgressBar::hidden();
        let coordinator = ExecutionCoordinator::new(2)
            .unwrap()
            .with_progress(Arc::new(bar.clone()));

        let binlist = BinList::builder(&coordinator)
            .with_bin_width(100)
            .from_windows(&genome, &windows)
            .unwrap();

        // aggregation, two statistics passes, and one batch per accelerator level
        let batches = 3 + binlist.accelerator_bin_widths().len();
        assert_eq!(bar.position(), (batches * genome.count()) as u64);
    }

    #[rstest]
    fn test_configured_end_to_end(genome: Genome, windows: Vec<Vec<ScoredWindow>>) {
        let config = EngineConfig::from_toml_str(
            r#"
            threads = 2
            accelerator_factor = 10
            accelerator_max_bin_width = 10000
            method = "maximum"
            "#,
        )
        .unwrap();
        let coordinator = config.coordinator().unwrap();

        let mut binlist = BinList::builder(&coordinator)
            .with_bin_width(100)
            .with_config(&config)
            .unwrap()
            .from_windows(&genome, &windows)
            .unwrap();

        assert_eq!(binlist.method(), AggregationMethod::Maximum);
        assert_eq!(binlist.accelerator_bin_widths(), vec![1_000, 10_000]);

        let stats = *binlist.statistics();
        assert_eq!(stats.max, 10.0);
        assert!(stats.has_data());

        let pixels = binlist.project(0, 10_000.0).unwrap();
        assert_eq!(pixels.len(), 2);
        assert!(pixels.iter().all(|v| *v > 0.0));

        binlist.compress().unwrap();
        assert_eq!(binlist.project(0, 10_000.0).unwrap(), pixels);
        assert_eq!(binlist.statistics(), &stats);
        binlist.uncompress().unwrap();
        assert!(!binlist.is_compressed());
    }

    #[rstest]
    fn test_resample_to_coarser_width(genome: Genome, windows: Vec<Vec<ScoredWindow>>) {
        let coordinator = ExecutionCoordinator::new(2).unwrap();
        let fine = BinList::builder(&coordinator)
            .with_bin_width(10)
            .from_windows(&genome, &windows)
            .unwrap();

        let coarse = BinList::builder(&coordinator)
            .with_bin_width(100)
            .resample(&fine)
            .unwrap();

        assert_eq!(coarse.bin_width(), 100);
        assert_eq!(coarse.bin_count(1).unwrap(), 80);
        for chromosome in 0..genome.count() {
            let fine_total: f64 = fine.get(chromosome).unwrap().iter().sum();
            let coarse_total: f64 = coarse.get(chromosome).unwrap().iter().sum();
            assert!((fine_total - coarse_total).abs() < 1e-3);
        }
    }
}
