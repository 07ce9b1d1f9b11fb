use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ArgMatches;
use indicatif::ProgressBar;
use log::info;
use serde_json::{Value, json};

use bintrack_binlist::{BinList, EngineConfig, PyramidSettings};
use bintrack_core::utils::read_scored_windows;
use bintrack_core::{AggregationMethod, ChromosomeCatalog, Genome, Precision};

use super::cli::DEFAULT_BIN_WIDTH;

/// Engine config from `--config` (or defaults), with CLI flags layered on top.
pub fn resolve_config(matches: &ArgMatches) -> Result<EngineConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => EngineConfig::default().with_env()?,
    };

    if let Some(threads) = matches.get_one::<usize>("threads") {
        config.threads = Some(*threads);
    }
    if let Some(method) = matches.get_one::<String>("method") {
        config.method = AggregationMethod::from_str(method)?;
    }
    if let Some(precision) = matches.get_one::<String>("precision") {
        config.precision = Precision::from_str(precision)?;
    }

    Ok(config)
}

/// Upper bound on the tasks a build submits: aggregation, two statistics
/// passes, one batch per pyramid level. The second statistics pass is skipped
/// when the genome has no data.
fn expected_tasks(chromosomes: usize, bin_width: u32, pyramid: &PyramidSettings) -> u64 {
    let mut batches = 3;
    let mut width = bin_width;
    while let Some(next) = pyramid.next_bin_width(width) {
        batches += 1;
        width = next;
    }
    (batches * chromosomes) as u64
}

/// Settle the bar on the tasks that actually ran.
fn finish_progress(bar: &ProgressBar) {
    bar.set_length(bar.position());
    bar.finish();
}

pub fn summarize(binlist: &BinList, genome: &Genome) -> Value {
    let chromosomes: Vec<Value> = genome
        .iter()
        .map(|c| {
            json!({
                "name": c.name,
                "length": c.length,
                "bins": binlist.bin_count(c.index).unwrap_or(0),
            })
        })
        .collect();

    json!({
        "bin_width": binlist.bin_width(),
        "method": binlist.method(),
        "precision": binlist.precision(),
        "chromosomes": chromosomes,
        "accelerator_bin_widths": binlist.accelerator_bin_widths(),
        "statistics": binlist.statistics(),
    })
}

pub fn run_bin(matches: &ArgMatches) -> Result<()> {
    let chromref = matches
        .get_one::<String>("chromref")
        .context("A path to a chrom.sizes file is required.")?;
    let input = matches
        .get_one::<String>("input")
        .context("A path to a window file is required.")?;
    let bin_width = matches
        .get_one::<u32>("binwidth")
        .copied()
        .unwrap_or(DEFAULT_BIN_WIDTH);

    let config = resolve_config(matches)?;
    let pyramid = config.pyramid_settings()?;
    let coordinator = config.coordinator()?;

    let genome = Genome::from_chrom_sizes(chromref)
        .with_context(|| format!("Failed to read chromosome sizes from {}", chromref))?;
    let windows = read_scored_windows(Path::new(input), &genome)?;

    let bar = (!matches.get_flag("no-progress"))
        .then(|| ProgressBar::new(expected_tasks(genome.count(), bin_width, &pyramid)));
    let coordinator = match &bar {
        Some(bar) => coordinator.with_progress(Arc::new(bar.clone())),
        None => coordinator,
    };

    info!(
        "Binning {} at {} bp on {} threads",
        input,
        bin_width,
        coordinator.num_threads()
    );

    let built = BinList::builder(&coordinator)
        .with_bin_width(bin_width)
        .with_config(&config)
        .and_then(|builder| builder.from_windows(&genome, &windows));

    if let Some(bar) = &bar {
        match &built {
            Ok(_) => finish_progress(bar),
            Err(_) => bar.abandon(),
        }
    }
    let binlist = built.with_context(|| format!("Failed to bin {}", input))?;

    let mut summary = summarize(&binlist, &genome);

    if let (Some(chrom), Some(bp_per_pixel)) = (
        matches.get_one::<String>("chrom"),
        matches.get_one::<f64>("bp-per-pixel"),
    ) {
        let index = genome
            .index_of(chrom)
            .with_context(|| format!("Chromosome {} is not in {}", chrom, chromref))?;
        let values = binlist.project(index, *bp_per_pixel)?;
        summary["projection"] = json!({
            "chrom": chrom,
            "bp_per_pixel": bp_per_pixel,
            "values": values,
        });
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
