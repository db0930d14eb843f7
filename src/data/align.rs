use super::axis::UnifiedAxis;
use super::model::RawSeries;

/// Absolute tolerance for an original x to count as sitting on an axis point.
pub const MATCH_TOLERANCE: f64 = 1e-6;

// ---------------------------------------------------------------------------
// AlignedSeries – one original series re-expressed on the unified axis
// ---------------------------------------------------------------------------

/// One value per axis point; `None` where the file has no measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeries {
    pub values: Vec<Option<f64>>,
    /// Number of axis points that found a match.
    pub matches: usize,
}

impl AlignedSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Percentage of axis points with a value, rounded to one decimal.
    pub fn coverage_percent(&self) -> f64 {
        coverage_percent(self.matches, self.values.len())
    }
}

/// `valid / total * 100`, rounded to one decimal. Zero for an empty axis.
pub fn coverage_percent(valid: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = valid as f64 / total as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

/// Place `series` onto `axis` by exact match only.
///
/// For each axis point the first original index (in file order) whose x lies
/// within [`MATCH_TOLERANCE`] supplies the value. Points with no such x stay
/// `None`: there is no interpolation and no nearest-neighbour fallback.
pub fn align(series: &RawSeries, axis: &UnifiedAxis) -> AlignedSeries {
    align_points(series.x(), series.y(), axis.points())
}

/// Slice form of [`align`].
pub fn align_points(x: &[f64], y: &[f64], axis: &[f64]) -> AlignedSeries {
    if x.is_empty() || y.is_empty() {
        return AlignedSeries {
            values: vec![None; axis.len()],
            matches: 0,
        };
    }

    // Original indices sorted by x, so each axis point only inspects the
    // handful of candidates near it.
    let mut order: Vec<usize> = (0..x.len().min(y.len())).collect();
    order.sort_by(|&a, &b| x[a].total_cmp(&x[b]).then(a.cmp(&b)));

    let mut matches = 0;
    let values = axis
        .iter()
        .map(|&v| {
            let start = order.partition_point(|&i| x[i] < v - 2.0 * MATCH_TOLERANCE);
            let first = order[start..]
                .iter()
                .take_while(|&&i| x[i] <= v + 2.0 * MATCH_TOLERANCE)
                .filter(|&&i| (x[i] - v).abs() < MATCH_TOLERANCE)
                .min()
                .copied();
            if first.is_some() {
                matches += 1;
            }
            first.map(|i| y[i])
        })
        .collect();

    AlignedSeries { values, matches }
}
