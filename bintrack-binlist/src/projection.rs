//! Screen projection: turn a chromosome's bins into one value per pixel.
//!
//! Resolution is given as base pairs per pixel. The coarsest level whose bins
//! are no wider than a pixel serves the request; when several of its bins still
//! fall into one pixel they are averaged, ignoring zero bins.

use crate::errors::BinListError;
use crate::level::BinLevel;
use crate::pyramid::ResolutionPyramid;

/// Bins of width `bin_width` merged into one pixel of `bp_per_pixel`.
pub fn group_size(bin_width: u32, bp_per_pixel: f64) -> usize {
    let group = (bp_per_pixel / bin_width as f64).floor();
    if group < 1.0 { 1 } else { group as usize }
}

///
/// Average consecutive chunks of `group` bins.
///
/// Each output value is the mean of the chunk's non-zero members, or 0 when
/// all of them are zero. The output has `ceil(values.len() / group)` entries.
///
pub fn project_values(values: &[f64], group: usize) -> Vec<f64> {
    if group <= 1 {
        return values.to_vec();
    }

    values
        .chunks(group)
        .map(|chunk| {
            let (sum, count) = chunk
                .iter()
                .filter(|v| **v != 0.0)
                .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
            if count == 0 { 0.0 } else { sum / count as f64 }
        })
        .collect()
}

///
/// The level to draw from at `bp_per_pixel`: the coarsest pyramid level with
/// `bin_width <= bp_per_pixel`, else `base`.
///
pub fn select_level<'l>(
    base: &'l BinLevel,
    pyramid: &'l ResolutionPyramid,
    bp_per_pixel: f64,
) -> &'l BinLevel {
    pyramid
        .levels()
        .iter()
        .rev()
        .find(|level| bp_per_pixel >= level.bin_width() as f64)
        .unwrap_or(base)
}

///
/// Pixel values for one chromosome.
///
/// # Arguments
/// - base: the level the bin-list was built at
/// - pyramid: accelerator levels above `base`
/// - chromosome: ordinal index in the catalog
/// - bp_per_pixel: horizontal resolution, must be positive and finite
///
pub fn project(
    base: &BinLevel,
    pyramid: &ResolutionPyramid,
    chromosome: usize,
    bp_per_pixel: f64,
) -> Result<Vec<f64>, BinListError> {
    if !bp_per_pixel.is_finite() || bp_per_pixel <= 0.0 {
        return Err(BinListError::InvalidResolution(bp_per_pixel));
    }

    let level = select_level(base, pyramid, bp_per_pixel);
    let values = level.get(chromosome)?;
    Ok(project_values(
        &values,
        group_size(level.bin_width(), bp_per_pixel),
    ))
}
