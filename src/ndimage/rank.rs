//! Order-statistic filters: minimum, maximum, median, percentile.

use ndarray::{Array, ArrayView, ArrayView2, ArrayViewMut, ArrayViewMut2, Axis, Dimension};

use super::boundary::BoundaryMode;
use super::convolve::check_same_shape;
use crate::error::{FilterError, FilterResult};

#[derive(Clone, Copy)]
enum Extremum {
    Min,
    Max,
}

impl Extremum {
    #[inline]
    fn pick(self, a: f64, b: f64) -> f64 {
        match self {
            Extremum::Min => a.min(b),
            Extremum::Max => a.max(b),
        }
    }
}

fn extremum1d<D: Dimension>(
    input: ArrayView<'_, f64, D>,
    size: usize,
    axis: Axis,
    mode: BoundaryMode,
    which: Extremum,
    mut output: ArrayViewMut<'_, f64, D>,
) {
    let before = size / 2;
    let after = size - before - 1;
    let mut buf = Vec::new();
    for (in_lane, mut out_lane) in input.lanes(axis).into_iter().zip(output.lanes_mut(axis)) {
        mode.extend_line(in_lane, before, after, &mut buf);
        for (i, o) in out_lane.iter_mut().enumerate() {
            *o = buf[i..i + size]
                .iter()
                .copied()
                .fold(buf[i], |acc, v| which.pick(acc, v));
        }
    }
}

// A box extremum factorises into one 1D pass per axis.
fn extremum_filter<D: Dimension>(
    input: ArrayView<'_, f64, D>,
    size: usize,
    mode: BoundaryMode,
    which: Extremum,
    mut output: ArrayViewMut<'_, f64, D>,
) -> FilterResult<()> {
    check_same_shape(&input, &output)?;
    if size <= 1 {
        output.assign(&input);
        return Ok(());
    }
    let mut current = input.to_owned();
    let mut scratch = Array::<f64, D>::zeros(input.raw_dim());
    for axis in 0..input.ndim() {
        extremum1d(current.view(), size, Axis(axis), mode, which, scratch.view_mut());
        std::mem::swap(&mut current, &mut scratch);
    }
    output.assign(&current);
    Ok(())
}

/// Minimum over a `size`-wide box on every axis. Sizes below 2 copy.
pub fn minimum_filter<D: Dimension>(
    input: ArrayView<'_, f64, D>,
    size: usize,
    mode: BoundaryMode,
    output: ArrayViewMut<'_, f64, D>,
) -> FilterResult<()> {
    extremum_filter(input, size, mode, Extremum::Min, output)
}

/// Maximum over a `size`-wide box on every axis. Sizes below 2 copy.
pub fn maximum_filter<D: Dimension>(
    input: ArrayView<'_, f64, D>,
    size: usize,
    mode: BoundaryMode,
    output: ArrayViewMut<'_, f64, D>,
) -> FilterResult<()> {
    extremum_filter(input, size, mode, Extremum::Max, output)
}

/// Select the `rank`-th smallest value of every `size x size` window.
///
/// # Arguments
/// * `rank` - Zero-based order statistic, must be below `size * size`
pub fn rank_filter(
    input: ArrayView2<'_, f64>,
    size: usize,
    rank: usize,
    mode: BoundaryMode,
    mut output: ArrayViewMut2<'_, f64>,
) -> FilterResult<()> {
    check_same_shape(&input, &output)?;
    let size = size.max(1);
    let count = size * size;
    if rank >= count {
        return Err(FilterError::invalid(
            "rank",
            format!("rank {} outside window of {} samples", rank, count),
        ));
    }

    let (height, width) = input.dim();
    let before = (size / 2) as isize;
    let mut window = Vec::with_capacity(count);

    for y in 0..height {
        for x in 0..width {
            window.clear();
            for dy in 0..size as isize {
                let yy = y as isize + dy - before;
                let row = mode.resolve(yy, height);
                for dx in 0..size as isize {
                    let xx = x as isize + dx - before;
                    let v = match (row, mode.resolve(xx, width)) {
                        (Some(r), Some(c)) => input[[r, c]],
                        _ => match mode {
                            BoundaryMode::Constant(k) => k,
                            _ => 0.0,
                        },
                    };
                    window.push(v);
                }
            }
            let (_, nth, _) = window.select_nth_unstable_by(rank, |a, b| a.total_cmp(b));
            output[[y, x]] = *nth;
        }
    }
    Ok(())
}

/// Median of every `size x size` window (rank `n / 2`).
pub fn median_filter(
    input: ArrayView2<'_, f64>,
    size: usize,
    mode: BoundaryMode,
    output: ArrayViewMut2<'_, f64>,
) -> FilterResult<()> {
    let n = size.max(1) * size.max(1);
    rank_filter(input, size, n / 2, mode, output)
}

/// `percentile`-th percentile of every `size x size` window.
pub fn percentile_filter(
    input: ArrayView2<'_, f64>,
    size: usize,
    percentile: f64,
    mode: BoundaryMode,
    output: ArrayViewMut2<'_, f64>,
) -> FilterResult<()> {
    if !(0.0..=100.0).contains(&percentile) {
        return Err(FilterError::invalid(
            "percentile",
            format!("must lie in [0, 100], got {}", percentile),
        ));
    }
    let n = size.max(1) * size.max(1);
    let rank = ((n as f64 * percentile / 100.0).floor() as usize).min(n - 1);
    rank_filter(input, size, rank, mode, output)
}
