//! Pure layout computations shared by the chart builders.
//!
//! Nothing here emits drawing commands; functions take plain numbers and
//! return positions, sizes, angles or statistics.

use crate::error::{ChartError, Result};
use chrono::{DateTime, NaiveDateTime};
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Offset of every packed marker from its slot corner
pub const CELL_MARGIN: f64 = 0.1;
pub const MIN_ROW_HEIGHT: f64 = 0.5;
pub const MIN_COL_WIDTH: f64 = 0.5;

const SECONDS_PER_DAY: f64 = 86_400.0;

// ---------------------------------------------------------------------------
// Calendar cell packing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CellPacking {
    pub dots_per_row: usize,
    pub dots_per_col: usize,
    /// Marker size after growing to fill the cell when capacity ran short
    pub dot_size: f64,
    /// min(count, capacity)
    pub placed: usize,
    /// Markers that fit strictly inside the cell
    pub drawn: usize,
    /// Requested markers that are not drawn
    pub skipped: usize,
    /// Lower-left corners of the drawn markers
    pub markers: Vec<(f64, f64)>,
}

impl CellPacking {
    pub fn capacity(&self) -> usize {
        self.dots_per_row.saturating_mul(self.dots_per_col)
    }
}

/// Column width and row height of the calendar grid, in figure units.
pub fn calendar_grid(figsize: (f64, f64), n_rows: usize, n_cols: usize) -> (f64, f64) {
    let (width, height) = figsize;
    let col_width = (width / n_cols.max(1) as f64).max(MIN_COL_WIDTH);
    let row_height = (height / n_rows.max(1) as f64).max(MIN_ROW_HEIGHT);
    (col_width, row_height)
}

/// Chart-wide marker size, shrinking as the number of records grows.
pub fn calendar_dot_size(default: f64, col_width: f64, row_height: f64, total_records: usize) -> f64 {
    if total_records == 0 {
        return default;
    }
    let possible = ((col_width * row_height) / total_records as f64 * 2.0).sqrt();
    default.min(possible)
}

/// Pack `count` square markers of side `dot_size` into the cell at (x0, y0).
///
/// Slots fill row-major from the cell's lower-left corner. A marker is drawn
/// only when its far edges stay strictly inside the cell, so `drawn` can be
/// smaller than `placed`.
pub fn pack_cell(x0: f64, y0: f64, width: f64, height: f64, count: usize, dot_size: f64) -> CellPacking {
    let mut size = dot_size;
    let dots_per_row = ((width / size).floor() as usize).max(1);
    let dots_per_col = ((height / size).floor() as usize).max(1);
    let capacity = dots_per_row.saturating_mul(dots_per_col);
    if capacity < count {
        size = (width / dots_per_row as f64).max(height / dots_per_col as f64);
    }

    let placed = count.min(capacity);
    let markers: Vec<(f64, f64)> = (0..placed)
        .map(|d| {
            let x = x0 + (d % dots_per_row) as f64 * size + CELL_MARGIN;
            let y = y0 + (d / dots_per_row) as f64 * size + CELL_MARGIN;
            (x, y)
        })
        .filter(|(x, y)| y + size < y0 + height && x + size < x0 + width)
        .collect();

    let drawn = markers.len();
    let skipped = count - drawn;
    if skipped > 0 {
        log::debug!(
            "cell at ({:.2}, {:.2}): {} of {} markers drawn ({} over capacity, {} clipped)",
            x0,
            y0,
            drawn,
            count,
            count - placed,
            placed - drawn
        );
    }

    CellPacking {
        dots_per_row,
        dots_per_col,
        dot_size: size,
        placed,
        drawn,
        skipped,
        markers,
    }
}

// ---------------------------------------------------------------------------
// Angles
// ---------------------------------------------------------------------------

/// Spoke angles in radians, `2*pi*i/n`.
pub fn radar_angles(n: usize) -> Vec<f64> {
    (0..n).map(|i| 2.0 * PI * i as f64 / n as f64).collect()
}

/// Value wedge and remainder wedge of a share pie, in degrees counter-clockwise
/// from 3 o'clock, starting at 90.
pub fn share_wedges(value: f64, total: f64) -> [(f64, f64); 2] {
    let fraction = if total == 0.0 { 0.0 } else { value / total };
    let split = 90.0 + 360.0 * fraction;
    [(90.0, split), (split, 450.0)]
}

/// Wedge for an interval inside the overall span, measured clockwise from
/// 12 o'clock. Returned as (from, to) degrees counter-clockwise from 3 o'clock
/// with from <= to.
pub fn interval_wedge(start: f64, end: f64, span_min: f64, span_max: f64) -> (f64, f64) {
    let span = span_max - span_min;
    if span <= 0.0 {
        return (90.0 - 360.0, 90.0);
    }
    let begin = 90.0 - 360.0 * (start - span_min) / span;
    let finish = 90.0 - 360.0 * (end - span_min) / span;
    (finish.min(begin), finish.max(begin))
}

/// Closed wedge outline: the center followed by arc points from `from` to `to` degrees.
pub fn wedge_polygon(center: (f64, f64), radius: f64, from: f64, to: f64) -> Vec<(f64, f64)> {
    let steps = (((to - from).abs() / 2.0).ceil() as usize).max(1);
    let mut points = Vec::with_capacity(steps + 2);
    points.push(center);
    for i in 0..=steps {
        let deg = from + (to - from) * i as f64 / steps as f64;
        let rad = deg.to_radians();
        points.push((center.0 + radius * rad.cos(), center.1 + radius * rad.sin()));
    }
    points
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Bins {
    Count(usize),
    Edges(Vec<f64>),
}

impl Default for Bins {
    fn default() -> Self {
        Bins::Count(10)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Bin `values`. Every bin is half-open except the last, which includes its right edge.
pub fn histogram(values: &[f64], bins: &Bins) -> Result<Histogram> {
    if values.is_empty() {
        return Err(ChartError::EmptyData("histogram"));
    }
    let edges = match bins {
        Bins::Count(0) => {
            return Err(ChartError::Validation("bin count must be at least 1".into()));
        }
        Bins::Count(n) => {
            let (mut lo, mut hi) = min_max(values);
            if lo == hi {
                lo -= 0.5;
                hi += 0.5;
            }
            let step = (hi - lo) / *n as f64;
            (0..=*n).map(|i| lo + step * i as f64).collect::<Vec<_>>()
        }
        Bins::Edges(edges) => {
            if edges.len() < 2 || edges.windows(2).any(|w| w[1] <= w[0]) {
                return Err(ChartError::Validation(
                    "bin edges must be at least two strictly increasing values".into(),
                ));
            }
            edges.clone()
        }
    };

    let n_bins = edges.len() - 1;
    let (first, last) = (edges[0], edges[n_bins]);
    let mut counts = vec![0usize; n_bins];
    for &v in values {
        if v < first || v > last {
            continue;
        }
        let idx = edges[1..]
            .iter()
            .position(|&edge| v < edge)
            .unwrap_or(n_bins - 1);
        counts[idx] += 1;
    }
    Ok(Histogram { edges, counts })
}

/// Linear-interpolated quantile of already sorted data.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub fliers: Vec<f64>,
}

/// Quartiles, 1.5 IQR whiskers and outliers.
pub fn box_stats(values: &[f64]) -> Result<BoxStats> {
    if values.is_empty() {
        return Err(ChartError::EmptyData("box plot"));
    }
    let sorted = sorted_copy(values);
    let q1 = quantile(&sorted, 0.25);
    let median = quantile(&sorted, 0.5);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

    let whisker_low = sorted.iter().copied().find(|v| *v >= lo_fence).unwrap_or(q1);
    let whisker_high = sorted.iter().rev().copied().find(|v| *v <= hi_fence).unwrap_or(q3);
    let fliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < whisker_low || *v > whisker_high)
        .collect();

    Ok(BoxStats {
        q1,
        median,
        q3,
        whisker_low,
        whisker_high,
        fliers,
    })
}

/// Scott's rule bandwidth: sample standard deviation times n^(-1/5).
pub fn scott_bandwidth(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 2 {
        return 1.0;
    }
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let bw = var.sqrt() * n.powf(-0.2);
    if bw > 0.0 {
        bw
    } else {
        1.0
    }
}

/// Gaussian kernel density of `values` evaluated at `points`.
pub fn gaussian_kde(values: &[f64], points: &[f64]) -> Vec<f64> {
    let bw = scott_bandwidth(values);
    let norm = 1.0 / (values.len() as f64 * bw * (2.0 * PI).sqrt());
    points
        .iter()
        .map(|x| {
            values
                .iter()
                .map(|v| (-0.5 * ((x - v) / bw).powi(2)).exp())
                .sum::<f64>()
                * norm
        })
        .collect()
}

/// Evenly spaced samples over [lo, hi], inclusive.
pub fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => (0..n)
            .map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

/// Distinct values in ascending order with their multiplicity.
pub fn value_counts(values: &[f64]) -> Vec<(f64, usize)> {
    let mut counts: BTreeMap<u64, (f64, usize)> = BTreeMap::new();
    for &v in values {
        // total order on the bit pattern of non-negative-normalised floats
        let key = ordered_bits(v);
        counts.entry(key).or_insert((v, 0)).1 += 1;
    }
    counts.into_values().collect()
}

fn ordered_bits(v: f64) -> u64 {
    let v = if v == 0.0 { 0.0 } else { v };
    let bits = v.to_bits();
    if bits >> 63 == 1 {
        !bits
    } else {
        bits | (1 << 63)
    }
}

// ---------------------------------------------------------------------------
// Ranges and dates
// ---------------------------------------------------------------------------

pub fn min_max(values: &[f64]) -> (f64, f64) {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    (min, max)
}

/// Data range padded by `fraction` of its span; a zero span widens by 1 each side.
pub fn padded_range(min: f64, max: f64, fraction: f64) -> (f64, f64) {
    if min == max {
        (min - 1.0, max + 1.0)
    } else {
        let padding = (max - min) * fraction;
        (min - padding, max + padding)
    }
}

/// Fractional days since 1970-01-01.
pub fn date_to_num(dt: &NaiveDateTime) -> f64 {
    dt.and_utc().timestamp() as f64 / SECONDS_PER_DAY
}

pub fn num_to_date(days: f64) -> Option<NaiveDateTime> {
    let secs = (days * SECONDS_PER_DAY).round() as i64;
    DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_pack_cell_capacity_examples() {
        // W=5, H=2, S=0.5 gives a 10 x 4 grid
        for (count, expected) in [(3, 3), (40, 40), (1000, 40)] {
            let packing = pack_cell(0.0, 0.0, 5.0, 2.0, count, 0.5);
            assert_eq!(packing.capacity(), 40);
            assert_eq!(packing.placed, expected);
        }
    }

    #[test]
    fn test_pack_cell_full_grid_clips_last_row_and_column() {
        let packing = pack_cell(0.0, 0.0, 5.0, 2.0, 40, 0.5);
        // the margin pushes the tenth column and fourth row onto the edge
        assert_eq!(packing.drawn, 27);
        assert_eq!(packing.skipped, 13);
    }

    #[test]
    fn test_pack_cell_never_exceeds_count_or_bounds() {
        let (x0, y0, w, h) = (2.0, 1.0, 1.5, 0.75);
        for count in [0, 1, 5, 17, 400] {
            for size in [0.05, 0.2, 0.5, 2.0] {
                let packing = pack_cell(x0, y0, w, h, count, size);
                assert!(packing.drawn <= count);
                assert!(packing.placed <= count);
                assert_eq!(packing.drawn + packing.skipped, count);
                for (x, y) in &packing.markers {
                    assert!(*x >= x0 && *y >= y0);
                    assert!(x + packing.dot_size < x0 + w);
                    assert!(y + packing.dot_size < y0 + h);
                }
            }
        }
    }

    #[test]
    fn test_pack_cell_grows_marker_when_over_capacity() {
        let packing = pack_cell(0.0, 0.0, 1.0, 1.0, 100, 0.3);
        assert_eq!(packing.dots_per_row, 3);
        assert!(approx(packing.dot_size, 1.0 / 3.0));
        let packing = pack_cell(0.0, 0.0, 1.0, 1.0, 2, 0.3);
        assert!(approx(packing.dot_size, 0.3));
    }

    #[test]
    fn test_pack_cell_tiny_cell_keeps_one_slot() {
        let packing = pack_cell(0.0, 0.0, 0.1, 0.1, 5, 0.5);
        assert_eq!(packing.capacity(), 1);
        assert_eq!(packing.placed, 1);
        assert_eq!(packing.drawn, 0);
    }

    #[test]
    fn test_pack_cell_degenerate_sizes_saturate() {
        let packing = pack_cell(0.0, 0.0, 2.0, 2.0, 3, 0.0);
        assert_eq!(packing.capacity(), usize::MAX);
        assert_eq!(packing.placed, 3);

        let packing = pack_cell(0.0, 0.0, 6.0, 4.0, 3, 1e-12);
        assert_eq!(packing.placed, 3);
        assert_eq!(packing.drawn + packing.skipped, 3);
    }

    #[test]
    fn test_calendar_grid_minimums() {
        assert_eq!(calendar_grid((6.0, 4.0), 2, 3), (2.0, 2.0));
        assert_eq!(calendar_grid((6.0, 4.0), 20, 30), (0.5, 0.5));
    }

    #[test]
    fn test_calendar_dot_size_shrinks_with_density() {
        assert!(approx(calendar_dot_size(0.2, 2.0, 2.0, 10), 0.2));
        // sqrt(0.25 / 1000 * 2) ~ 0.0224
        let size = calendar_dot_size(0.2, 0.5, 0.5, 1000);
        assert!(size < 0.03 && size > 0.02);
        assert_eq!(calendar_dot_size(0.2, 1.0, 1.0, 0), 0.2);
    }

    #[test]
    fn test_radar_angles() {
        let angles = radar_angles(4);
        assert_eq!(angles.len(), 4);
        assert!(approx(angles[1], PI / 2.0));
        assert!(approx(angles[3], 3.0 * PI / 2.0));
    }

    #[test]
    fn test_share_wedges() {
        let [value, rest] = share_wedges(25.0, 100.0);
        assert_eq!(value, (90.0, 180.0));
        assert_eq!(rest, (180.0, 450.0));
        let [value, _] = share_wedges(1.0, 0.0);
        assert_eq!(value, (90.0, 90.0));
    }

    #[test]
    fn test_interval_wedge_is_clockwise_from_noon() {
        // first quarter of the span sits between 12 and 3 o'clock
        let (from, to) = interval_wedge(0.0, 25.0, 0.0, 100.0);
        assert!(approx(from, 0.0));
        assert!(approx(to, 90.0));
        let (from, to) = interval_wedge(50.0, 100.0, 0.0, 100.0);
        assert!(approx(from, -270.0));
        assert!(approx(to, -90.0));
    }

    #[test]
    fn test_wedge_polygon_starts_at_center() {
        let pts = wedge_polygon((0.0, 0.0), 1.0, 0.0, 90.0);
        assert_eq!(pts[0], (0.0, 0.0));
        assert!(approx(pts[1].0, 1.0));
        let last = pts[pts.len() - 1];
        assert!(approx(last.0, 0.0) && approx(last.1, 1.0));
    }

    #[test]
    fn test_histogram_counts() {
        let values = [1.0, 2.0, 2.0, 3.0, 4.0, 5.0];
        let hist = histogram(&values, &Bins::Count(4)).unwrap();
        assert_eq!(hist.edges, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(hist.counts, vec![1, 2, 1, 2]);
        assert_eq!(hist.counts.iter().sum::<usize>(), values.len());
    }

    #[test]
    fn test_histogram_explicit_edges_and_constant_data() {
        let hist = histogram(&[0.5, 1.5, 9.0], &Bins::Edges(vec![0.0, 1.0, 2.0])).unwrap();
        assert_eq!(hist.counts, vec![1, 1]);
        let hist = histogram(&[3.0, 3.0], &Bins::Count(2)).unwrap();
        assert_eq!(hist.edges, vec![2.5, 3.0, 3.5]);
        assert_eq!(hist.counts, vec![0, 2]);
    }

    #[test]
    fn test_histogram_rejects_bad_bins() {
        assert!(histogram(&[1.0], &Bins::Count(0)).is_err());
        assert!(histogram(&[1.0], &Bins::Edges(vec![1.0, 1.0])).is_err());
        assert!(matches!(histogram(&[], &Bins::default()), Err(ChartError::EmptyData(_))));
    }

    #[test]
    fn test_box_stats() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 100.0];
        let stats = box_stats(&values).unwrap();
        assert!(approx(stats.q1, 3.0));
        assert!(approx(stats.median, 5.0));
        assert!(approx(stats.q3, 7.0));
        assert!(approx(stats.whisker_low, 1.0));
        assert!(approx(stats.whisker_high, 8.0));
        assert_eq!(stats.fliers, vec![100.0]);
    }

    #[test]
    fn test_gaussian_kde_is_symmetric_and_peaks_at_data() {
        let values = [0.0];
        let density = gaussian_kde(&values, &[-1.0, 0.0, 1.0]);
        assert!(approx(density[0], density[2]));
        assert!(density[1] > density[0]);
    }

    #[test]
    fn test_value_counts_sorted() {
        let counts = value_counts(&[3.0, -1.0, 3.0, 0.0, -0.0]);
        assert_eq!(counts, vec![(-1.0, 1), (0.0, 2), (3.0, 2)]);
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range(0.0, 10.0, 0.1), (-1.0, 11.0));
        assert_eq!(padded_range(5.0, 5.0, 0.1), (4.0, 6.0));
    }

    #[test]
    fn test_date_num_round_trip() {
        let dt = NaiveDate::from_ymd_opt(2021, 3, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let days = date_to_num(&dt);
        assert!(approx(days.fract(), 0.5));
        assert_eq!(num_to_date(days), Some(dt));
    }
}
