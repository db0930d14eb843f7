use log::info;

use super::model::{RawSeries, SeriesRange};
use crate::error::AxisError;

/// Decimal digits kept when wavelengths are merged into the axis.
pub const AXIS_DECIMALS: usize = 4;

// ---------------------------------------------------------------------------
// UnifiedAxis – sorted, de-duplicated union of every file's x values
// ---------------------------------------------------------------------------

/// The common wavelength grid. Strictly ascending, built once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedAxis {
    points: Vec<f64>,
}

impl UnifiedAxis {
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn min(&self) -> Option<f64> {
        self.points.first().copied()
    }

    pub fn max(&self) -> Option<f64> {
        self.points.last().copied()
    }
}

/// Round to [`AXIS_DECIMALS`] places using the exact decimal value of the
/// float, so `400.00004` and `400.0` land on the same axis point.
pub fn round_to_axis(value: f64) -> f64 {
    format!("{value:.prec$}", prec = AXIS_DECIMALS)
        .parse()
        .unwrap_or(value)
}

/// Build the unified axis from keyed series.
///
/// Empty series are ignored. Every non-empty series gets a [`SeriesRange`]
/// (in input order), and all of its x values, rounded, join the axis.
/// The result depends only on the set of values, not on input order.
pub fn build_axis<'a, I>(series: I) -> Result<(UnifiedAxis, Vec<(String, SeriesRange)>), AxisError>
where
    I: IntoIterator<Item = (&'a str, &'a RawSeries)>,
{
    let mut ranges = Vec::new();
    let mut points = Vec::new();

    for (key, s) in series {
        let Some(range) = s.range() else {
            continue;
        };
        ranges.push((key.to_string(), range));
        points.extend(s.x().iter().map(|&x| round_to_axis(x)));
    }

    if points.is_empty() {
        return Err(AxisError::EmptyInput);
    }

    points.sort_by(f64::total_cmp);
    points.dedup();
    let axis = UnifiedAxis { points };

    if let (Some(lo), Some(hi)) = (axis.min(), axis.max()) {
        info!("Global range: {lo:.1} - {hi:.1} nm");
    }
    info!("Total unique X points: {}", axis.len());
    for (key, r) in &ranges {
        info!("  {key}: {:.1}-{:.1} nm ({} pts)", r.min, r.max, r.points);
    }

    Ok((axis, ranges))
}
