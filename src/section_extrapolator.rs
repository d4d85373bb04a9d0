/// Shadow-zone extrapolation for station sections
///
/// Shallow casts leave the lower part of a section empty where deeper
/// neighbours still have data. Those cells are reconstructed from two
/// independent 1-D passes that are then blended:
/// - along each level, across stations (against along-track distance)
/// - along each station, across levels (against depth)
///
/// Each line with two or more valid cells is refit and re-evaluated at every
/// position, so originally valid cells are smoothed too. A line with one valid
/// cell is broadcast, a line with none stays empty.
///
/// Usage:
/// ```rust,ignore
/// let filled = extrap_sec(&grid, &distance, section.levels(), 0.97, 0.03)?;
/// ```

use ndarray::{Array2, ArrayView1, Axis};
use tracing::{debug, warn};

use crate::config::ExtrapolationConfig;
use crate::error::{Result, SectionError};
use crate::interpolation::{Interp1d, Interpolant, InterpolationKind, LinearExtrapolant};
use crate::section::Grid;

/// How a single row or column was reconstructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFill {
    Empty,
    Broadcast,
    Extrapolated,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtrapolationStats {
    pub originally_missing: usize,
    pub residual_missing: usize,
    pub empty_rows: usize,
    pub broadcast_rows: usize,
    pub empty_columns: usize,
    pub broadcast_columns: usize,
}

#[derive(Debug, Clone)]
pub struct ExtrapolatedSection {
    pub grid: Grid,
    pub stats: ExtrapolationStats,
}

#[derive(Debug, Clone, Default)]
pub struct SectionExtrapolator {
    config: ExtrapolationConfig,
}

impl SectionExtrapolator {
    pub fn new(config: ExtrapolationConfig) -> Self {
        SectionExtrapolator { config }
    }

    pub fn config(&self) -> &ExtrapolationConfig {
        &self.config
    }

    /// Fill `grid` (`[level][station]`) using `distance` (one entry per
    /// station) and `depth` (one entry per level).
    pub fn extrapolate(&self, grid: &Grid, distance: &[f64], depth: &[f64]) -> Result<ExtrapolatedSection> {
        self.config.validate()?;
        check_shape(grid, distance, depth)?;

        let kind = self.config.kind;
        let (rows, row_fills) = extrapolate_lines(grid, Axis(0), distance, kind)?;
        let (columns, column_fills) = extrapolate_lines(grid, Axis(1), depth, kind)?;

        let filled = blend(&rows, &columns, self.config.w1, self.config.w2);

        let stats = ExtrapolationStats {
            originally_missing: count_missing(grid),
            residual_missing: count_missing(&filled),
            empty_rows: count_fill(&row_fills, LineFill::Empty),
            broadcast_rows: count_fill(&row_fills, LineFill::Broadcast),
            empty_columns: count_fill(&column_fills, LineFill::Empty),
            broadcast_columns: count_fill(&column_fills, LineFill::Broadcast),
        };

        if stats.residual_missing > 0 {
            warn!(
                residual = stats.residual_missing,
                empty_rows = stats.empty_rows,
                empty_columns = stats.empty_columns,
                "section still has gaps after extrapolation"
            );
        }
        debug!(
            w1 = self.config.w1,
            w2 = self.config.w2,
            filled = stats.originally_missing.saturating_sub(stats.residual_missing),
            "extrapolated {}x{} section",
            grid.nrows(),
            grid.ncols()
        );

        Ok(ExtrapolatedSection { grid: filled, stats })
    }
}

/// Extrapolate shadow zones with linear fits and the given blend weights.
///
/// `w1` weighs the pass along each level (across stations), `w2` the pass
/// along each station (across levels). The weights are not normalised.
pub fn extrap_sec(grid: &Grid, distance: &[f64], depth: &[f64], w1: f64, w2: f64) -> Result<Grid> {
    let extrapolator = SectionExtrapolator::new(ExtrapolationConfig::with_weights(w1, w2));
    Ok(extrapolator.extrapolate(grid, distance, depth)?.grid)
}

/// Pass along each level: every row refit against along-track distance.
pub fn extrapolate_rows(grid: &Grid, distance: &[f64], kind: InterpolationKind) -> Result<Grid> {
    if distance.len() != grid.ncols() {
        return Err(shape_error(grid, grid.nrows(), distance.len()));
    }
    Ok(extrapolate_lines(grid, Axis(0), distance, kind)?.0)
}

/// Pass along each station: every column refit against depth.
pub fn extrapolate_columns(grid: &Grid, depth: &[f64], kind: InterpolationKind) -> Result<Grid> {
    if depth.len() != grid.nrows() {
        return Err(shape_error(grid, depth.len(), grid.ncols()));
    }
    Ok(extrapolate_lines(grid, Axis(1), depth, kind)?.0)
}

/// Reconstruct one line of cells positioned at `axis`.
pub fn extrapolate_line(
    values: ArrayView1<Option<f64>>,
    axis: &[f64],
    kind: InterpolationKind,
) -> Result<(Vec<Option<f64>>, LineFill)> {
    if let Some(i) = axis.iter().position(|x| !x.is_finite()) {
        return Err(SectionError::InvalidParameter(format!(
            "line position {} is not finite",
            i
        )));
    }
    let (xs, ys): (Vec<f64>, Vec<f64>) = axis
        .iter()
        .zip(values.iter())
        .filter_map(|(&x, &v)| v.map(|y| (x, y)))
        .unzip();

    match ys.len() {
        0 => Ok((vec![None; axis.len()], LineFill::Empty)),
        1 => Ok((vec![Some(ys[0]); axis.len()], LineFill::Broadcast)),
        _ => {
            let f = LinearExtrapolant::new(Interp1d::fit(&xs, &ys, kind)?);
            let line = axis.iter().map(|&x| Some(f.eval(x))).collect();
            Ok((line, LineFill::Extrapolated))
        }
    }
}

// Axis(0) iterates rows (one per level), Axis(1) iterates columns (one per station).
fn extrapolate_lines(
    grid: &Grid,
    lane_axis: Axis,
    positions: &[f64],
    kind: InterpolationKind,
) -> Result<(Grid, Vec<LineFill>)> {
    let mut out = Array2::from_elem(grid.dim(), None);
    let mut fills = Vec::with_capacity(grid.len_of(lane_axis));

    for (i, line) in grid.axis_iter(lane_axis).enumerate() {
        let (values, fill) = extrapolate_line(line, positions, kind)?;
        for (dst, v) in out.index_axis_mut(lane_axis, i).iter_mut().zip(values) {
            *dst = v;
        }
        fills.push(fill);
    }

    Ok((out, fills))
}

/// Weighted sum of the two passes. A pass with zero weight never leaves a gap.
pub fn blend(rows: &Grid, columns: &Grid, w1: f64, w2: f64) -> Grid {
    let mut out = Array2::from_elem(rows.dim(), None);
    ndarray::Zip::from(&mut out)
        .and(rows)
        .and(columns)
        .for_each(|dst, &r, &c| {
            *dst = match (w1 == 0.0, w2 == 0.0) {
                (true, true) => r.zip(c).map(|_| 0.0),
                (false, true) => r.map(|r| w1 * r),
                (true, false) => c.map(|c| w2 * c),
                (false, false) => r.zip(c).map(|(r, c)| w1 * r + w2 * c),
            };
        });
    out
}

fn check_shape(grid: &Grid, distance: &[f64], depth: &[f64]) -> Result<()> {
    if grid.nrows() != depth.len() || grid.ncols() != distance.len() {
        return Err(shape_error(grid, depth.len(), distance.len()));
    }
    for (axis, values) in [("depth", depth), ("distance", distance)] {
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(SectionError::InvalidParameter(format!(
                "{} {} is not finite",
                axis, i
            )));
        }
    }
    if let Some(i) = depth.windows(2).position(|w| w[1] <= w[0]) {
        return Err(SectionError::NonMonotonicAxis {
            axis: "depth".to_string(),
            index: i + 1,
        });
    }
    if let Some(i) = distance.windows(2).position(|w| w[1] < w[0]) {
        return Err(SectionError::NonMonotonicAxis {
            axis: "distance".to_string(),
            index: i + 1,
        });
    }
    Ok(())
}

fn shape_error(grid: &Grid, depth_len: usize, distance_len: usize) -> SectionError {
    SectionError::ShapeMismatch {
        rows: grid.nrows(),
        cols: grid.ncols(),
        depth_len,
        distance_len,
    }
}

fn count_missing(grid: &Grid) -> usize {
    grid.iter().filter(|v| v.is_none()).count()
}

fn count_fill(fills: &[LineFill], wanted: LineFill) -> usize {
    fills.iter().filter(|&&f| f == wanted).count()
}

/// Sum of absolute differences between adjacent cells, both directions.
/// Missing cells are skipped.
pub fn total_variation(grid: &Grid) -> f64 {
    let mut tv = 0.0;
    for lane in grid.rows().into_iter().chain(grid.columns()) {
        let values = lane.to_vec();
        for w in values.windows(2) {
            if let (Some(a), Some(b)) = (w[0], w[1]) {
                tv += (b - a).abs();
            }
        }
    }
    tv
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn shadowed_grid() -> Grid {
        // 5 levels x 3 stations; the first station is shallow
        array![
            [None, Some(24.0), Some(25.0)],
            [None, Some(22.0), Some(23.0)],
            [Some(19.5), Some(20.0), Some(21.0)],
            [None, Some(18.0), Some(19.0)],
            [None, None, Some(17.0)],
        ]
    }

    const DIST: [f64; 3] = [0.0, 10.0, 20.0];
    const DEPTH: [f64; 5] = [0.0, 10.0, 20.0, 30.0, 40.0];

    #[test]
    fn test_rows_are_fully_populated() {
        let grid = shadowed_grid();
        let rows = extrapolate_rows(&grid, &DIST, InterpolationKind::Linear).unwrap();
        assert!(rows.iter().all(|v| v.is_some()));

        // Row 0 extrapolated linearly to the left: 24 - (25 - 24) = 23
        assert_relative_eq!(rows[[0, 0]].unwrap(), 23.0);
        // Row 4 has a single valid cell and is broadcast
        for j in 0..3 {
            assert_eq!(rows[[4, j]], Some(17.0));
        }
    }

    #[test]
    fn test_columns_are_fully_populated() {
        let grid = shadowed_grid();
        let cols = extrapolate_columns(&grid, &DEPTH, InterpolationKind::Linear).unwrap();
        assert!(cols.iter().all(|v| v.is_some()));

        // Station 0 has one sample and is broadcast down the column
        for i in 0..5 {
            assert_eq!(cols[[i, 0]], Some(19.5));
        }
        // Station 1 continues its bottom slope (-2 per 10 m)
        assert_relative_eq!(cols[[4, 1]].unwrap(), 16.0);
    }

    #[test]
    fn test_single_valid_point_broadcast() {
        let grid: Grid = array![[None, None, Some(3.5), None]];
        let rows = extrapolate_rows(&grid, &[0.0, 1.0, 2.0, 3.0], InterpolationKind::Linear).unwrap();
        assert!(rows.iter().all(|&v| v == Some(3.5)));
    }

    #[test]
    fn test_empty_line_stays_empty() {
        let grid: Grid = array![[None, None], [Some(1.0), Some(2.0)]];
        let rows = extrapolate_rows(&grid, &[0.0, 1.0], InterpolationKind::Linear).unwrap();
        assert_eq!(rows[[0, 0]], None);
        assert_eq!(rows[[0, 1]], None);
        assert_eq!(rows[[1, 1]], Some(2.0));
    }

    #[test]
    fn test_blend_weights() {
        let grid = shadowed_grid();
        let rows = extrapolate_rows(&grid, &DIST, InterpolationKind::Linear).unwrap();
        let cols = extrapolate_columns(&grid, &DEPTH, InterpolationKind::Linear).unwrap();
        let out = extrap_sec(&grid, &DIST, &DEPTH, 0.97, 0.03).unwrap();

        for ((i, j), v) in out.indexed_iter() {
            let expected = 0.97 * rows[[i, j]].unwrap() + 0.03 * cols[[i, j]].unwrap();
            assert_relative_eq!(v.unwrap(), expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_zero_weight_pass_does_not_leave_gaps() {
        // Middle station has no data at all, so the column pass is empty there
        let grid: Grid = array![[Some(1.0), None, Some(3.0)], [Some(2.0), None, Some(4.0)]];
        let out = extrap_sec(&grid, &[0.0, 1.0, 2.0], &[0.0, 1.0], 1.0, 0.0).unwrap();
        assert_relative_eq!(out[[0, 1]].unwrap(), 2.0);
        assert_relative_eq!(out[[1, 1]].unwrap(), 3.0);

        let blended = extrap_sec(&grid, &[0.0, 1.0, 2.0], &[0.0, 1.0], 0.5, 0.5).unwrap();
        assert_eq!(blended[[0, 1]], None);
    }

    #[test]
    fn test_row_only_rerun_keeps_interior_values() {
        let grid = shadowed_grid();
        let first = extrap_sec(&grid, &DIST, &DEPTH, 1.0, 0.0).unwrap();
        let second = extrap_sec(&first, &DIST, &DEPTH, 1.0, 0.0).unwrap();
        for (a, b) in first.iter().zip(second.iter()) {
            assert_relative_eq!(a.unwrap(), b.unwrap(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_smoother_than_zero_fill() {
        let grid = shadowed_grid();
        let out = extrap_sec(&grid, &DIST, &DEPTH, 0.97, 0.03).unwrap();
        assert!(out.iter().all(|v| v.map_or(false, f64::is_finite)));

        let zero_filled = grid.mapv(|v| Some(v.unwrap_or(0.0)));
        assert!(total_variation(&out) < total_variation(&zero_filled));
    }

    #[test]
    fn test_shape_mismatch() {
        let grid = shadowed_grid();
        let err = extrap_sec(&grid, &[0.0, 1.0], &DEPTH, 1.0, 0.0).unwrap_err();
        assert!(matches!(err, SectionError::ShapeMismatch { rows: 5, cols: 3, .. }));
    }

    #[test]
    fn test_non_finite_axis_rejected() {
        let grid: Grid = array![[Some(1.0), None, Some(3.0)]];
        let err = extrap_sec(&grid, &[0.0, f64::NAN, 2.0], &[0.0], 1.0, 0.0).unwrap_err();
        assert!(matches!(err, SectionError::InvalidParameter(_)));

        let err = extrap_sec(&shadowed_grid(), &DIST, &[0.0, 10.0, f64::INFINITY, 30.0, 40.0], 1.0, 0.0)
            .unwrap_err();
        assert!(matches!(err, SectionError::InvalidParameter(_)));

        // Single passes validate positions too
        let err = extrapolate_rows(&grid, &[0.0, f64::NAN, 2.0], InterpolationKind::Linear).unwrap_err();
        assert!(matches!(err, SectionError::InvalidParameter(_)));
    }

    #[test]
    fn test_stats_report_residual_gaps() {
        let grid: Grid = array![[None, None], [Some(1.0), Some(2.0)]];
        let result = SectionExtrapolator::new(ExtrapolationConfig::shadow_zone())
            .extrapolate(&grid, &[0.0, 1.0], &[0.0, 1.0])
            .unwrap();
        // The empty row keeps its gaps even though the columns were broadcast
        assert_eq!(result.stats.originally_missing, 2);
        assert_eq!(result.stats.residual_missing, 2);
        assert_eq!(result.grid[[1, 0]].map(|v| (v * 100.0).round()), Some(100.0));
        assert_eq!(result.stats.empty_rows, 1);
        assert_eq!(result.stats.broadcast_columns, 2);
    }
}
