use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use log::{info, warn};

use crate::models::{ChromosomeCatalog, ScoredWindow};

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

/// Splits one bed-like line into chromosome, start, stop and an optional score.
/// Columns beyond the fourth are ignored.
pub fn parse_bedlike_line(line: &str) -> Result<(&str, u32, u32, Option<f64>)> {
    let mut fields = line.split('\t');

    let chr = fields.next().context("missing chromosome column")?;
    let start = fields
        .next()
        .context("missing start column")?
        .parse::<u32>()
        .with_context(|| format!("Failed to parse start position in line: {}", line))?;
    let stop = fields
        .next()
        .context("missing end column")?
        .parse::<u32>()
        .with_context(|| format!("Failed to parse end position in line: {}", line))?;
    let score = match fields.next() {
        Some(s) => Some(
            s.trim()
                .parse::<f64>()
                .with_context(|| format!("Failed to parse score in line: {}", line))?,
        ),
        None => None,
    };

    Ok((chr, start, stop, score))
}

///
/// Read a bed-like file of `chrom start stop [score]` records into one window
/// list per chromosome of `catalog`, indexed by chromosome ordinal.
///
/// Records on chromosomes the catalog does not know are skipped. A missing
/// score counts as `1.0`. Lines starting with `#`, `track` or `browser` are headers.
///
pub fn read_scored_windows<C>(path: &Path, catalog: &C) -> Result<Vec<Vec<ScoredWindow>>>
where
    C: ChromosomeCatalog + ?Sized,
{
    let reader = get_dynamic_reader(path)?;
    let mut windows: Vec<Vec<ScoredWindow>> = vec![Vec::new(); catalog.count()];
    let mut skipped = 0usize;

    for line in reader.lines() {
        let line = line?;
        if line.is_empty()
            || line.starts_with('#')
            || line.starts_with("track")
            || line.starts_with("browser")
        {
            continue;
        }

        let (chr, start, stop, score) = parse_bedlike_line(&line)?;
        match catalog.index_of(chr) {
            Some(index) => {
                windows[index].push(ScoredWindow::new(start, stop, score.unwrap_or(1.0)))
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(
            "{} records on chromosomes missing from the catalog were skipped",
            skipped
        );
    }
    info!(
        "Read {} windows from {}",
        windows.iter().map(|w| w.len()).sum::<usize>(),
        path.display()
    );

    Ok(windows)
}
