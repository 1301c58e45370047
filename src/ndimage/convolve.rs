//! Separable linear filters: correlation, Gaussian, uniform, Laplace, gradients.
//!
//! Every function reads an immutable input view and writes a separate output
//! view of the same shape. Multi-pass operators run their passes through
//! private scratch buffers, never through `output` while still reading.

use ndarray::{Array, ArrayView, ArrayViewMut, Axis, Dimension};

use super::boundary::BoundaryMode;
use super::kernels::{
    gaussian_kernel_1d, gaussian_radius, Derivative, DERIVATIVE, PREWITT_SMOOTH, SECOND_DIFFERENCE,
    SIGMA_EPSILON, SOBEL_SMOOTH,
};
use crate::error::{FilterError, FilterResult};

pub(crate) fn check_same_shape<D: Dimension>(
    input: &ArrayView<'_, f64, D>,
    output: &ArrayViewMut<'_, f64, D>,
) -> FilterResult<()> {
    if input.shape() != output.shape() {
        return Err(FilterError::ShapeMismatch(format!(
            "input {:?} vs output {:?}",
            input.shape(),
            output.shape()
        )));
    }
    Ok(())
}

pub(crate) fn check_axis(axis: Axis, ndim: usize) -> FilterResult<()> {
    if axis.index() >= ndim {
        return Err(FilterError::invalid(
            "axis",
            format!("axis {} out of range for {} dimensions", axis.index(), ndim),
        ));
    }
    Ok(())
}

/// Correlate every lane along `axis` with `weights`.
///
/// `output[i] = sum_j weights[j] * ext[i + j - weights.len() / 2]` where `ext`
/// is the lane extended by `mode`.
pub fn correlate1d<D: Dimension>(
    input: ArrayView<'_, f64, D>,
    weights: &[f64],
    axis: Axis,
    mode: BoundaryMode,
    mut output: ArrayViewMut<'_, f64, D>,
) -> FilterResult<()> {
    check_same_shape(&input, &output)?;
    check_axis(axis, input.ndim())?;
    if weights.is_empty() {
        return Err(FilterError::invalid("weights", "kernel is empty"));
    }

    let before = weights.len() / 2;
    let after = weights.len() - before - 1;
    let mut buf = Vec::new();

    for (in_lane, mut out_lane) in input.lanes(axis).into_iter().zip(output.lanes_mut(axis)) {
        mode.extend_line(in_lane, before, after, &mut buf);
        for (i, o) in out_lane.iter_mut().enumerate() {
            *o = weights
                .iter()
                .zip(&buf[i..i + weights.len()])
                .map(|(w, v)| w * v)
                .sum();
        }
    }
    Ok(())
}

/// Run 1D correlations one after the other, then write the result.
fn separable<D: Dimension>(
    input: ArrayView<'_, f64, D>,
    passes: &[(Axis, Vec<f64>)],
    mode: BoundaryMode,
    mut output: ArrayViewMut<'_, f64, D>,
) -> FilterResult<()> {
    check_same_shape(&input, &output)?;
    if passes.is_empty() {
        output.assign(&input);
        return Ok(());
    }

    let mut current = input.to_owned();
    let mut scratch = Array::<f64, D>::zeros(input.raw_dim());
    for (axis, weights) in passes {
        correlate1d(current.view(), weights, *axis, mode, scratch.view_mut())?;
        std::mem::swap(&mut current, &mut scratch);
    }
    output.assign(&current);
    Ok(())
}

/// Gaussian pass along a single axis.
pub fn gaussian_filter1d<D: Dimension>(
    input: ArrayView<'_, f64, D>,
    sigma: f64,
    axis: Axis,
    order: Derivative,
    mode: BoundaryMode,
    truncate: f64,
    mut output: ArrayViewMut<'_, f64, D>,
) -> FilterResult<()> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(FilterError::invalid("sigma", format!("must be >= 0, got {}", sigma)));
    }
    if sigma <= SIGMA_EPSILON {
        check_same_shape(&input, &output)?;
        output.assign(&input);
        return Ok(());
    }
    let kernel = gaussian_kernel_1d(sigma, order, gaussian_radius(sigma, truncate));
    correlate1d(input, &kernel, axis, mode, output)
}

/// Gaussian with a per-axis derivative order; `orders.len()` must equal ndim.
pub fn gaussian_filter_orders<D: Dimension>(
    input: ArrayView<'_, f64, D>,
    sigma: f64,
    orders: &[Derivative],
    mode: BoundaryMode,
    truncate: f64,
    output: ArrayViewMut<'_, f64, D>,
) -> FilterResult<()> {
    if orders.len() != input.ndim() {
        return Err(FilterError::ShapeMismatch(format!(
            "{} derivative orders for {} dimensions",
            orders.len(),
            input.ndim()
        )));
    }
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(FilterError::invalid("sigma", format!("must be >= 0, got {}", sigma)));
    }

    let passes: Vec<(Axis, Vec<f64>)> = if sigma <= SIGMA_EPSILON {
        Vec::new()
    } else {
        let radius = gaussian_radius(sigma, truncate);
        orders
            .iter()
            .enumerate()
            .map(|(axis, &order)| (Axis(axis), gaussian_kernel_1d(sigma, order, radius)))
            .collect()
    };
    separable(input, &passes, mode, output)
}

/// Isotropic Gaussian smoothing over every axis. `sigma == 0` copies.
pub fn gaussian_filter<D: Dimension>(
    input: ArrayView<'_, f64, D>,
    sigma: f64,
    mode: BoundaryMode,
    truncate: f64,
    output: ArrayViewMut<'_, f64, D>,
) -> FilterResult<()> {
    let orders = vec![Derivative::Zero; input.ndim()];
    gaussian_filter_orders(input, sigma, &orders, mode, truncate, output)
}

/// Box mean of `size` samples per axis. Sizes below 2 copy.
pub fn uniform_filter<D: Dimension>(
    input: ArrayView<'_, f64, D>,
    size: usize,
    mode: BoundaryMode,
    output: ArrayViewMut<'_, f64, D>,
) -> FilterResult<()> {
    let passes: Vec<(Axis, Vec<f64>)> = if size > 1 {
        let weights = vec![1.0 / size as f64; size];
        (0..input.ndim()).map(|axis| (Axis(axis), weights.clone())).collect()
    } else {
        Vec::new()
    };
    separable(input, &passes, mode, output)
}

/// Sum over axes of `derivative(axis)`, each computed from `input`.
fn sum_over_axes<D, F>(
    input: ArrayView<'_, f64, D>,
    mut output: ArrayViewMut<'_, f64, D>,
    mut derivative: F,
) -> FilterResult<()>
where
    D: Dimension,
    F: FnMut(usize, ArrayView<'_, f64, D>, ArrayViewMut<'_, f64, D>) -> FilterResult<()>,
{
    check_same_shape(&input, &output)?;
    let mut term = Array::<f64, D>::zeros(input.raw_dim());
    output.fill(0.0);
    for axis in 0..input.ndim() {
        derivative(axis, input.view(), term.view_mut())?;
        output += &term;
    }
    Ok(())
}

/// Discrete Laplacian: sum of `[1, -2, 1]` second differences over all axes.
pub fn laplace<D: Dimension>(
    input: ArrayView<'_, f64, D>,
    mode: BoundaryMode,
    output: ArrayViewMut<'_, f64, D>,
) -> FilterResult<()> {
    sum_over_axes(input, output, |axis, src, dst| {
        correlate1d(src, &SECOND_DIFFERENCE, Axis(axis), mode, dst)
    })
}

/// Laplacian of Gaussian. A vanishing `sigma` degrades to [`laplace`].
pub fn gaussian_laplace<D: Dimension>(
    input: ArrayView<'_, f64, D>,
    sigma: f64,
    mode: BoundaryMode,
    truncate: f64,
    output: ArrayViewMut<'_, f64, D>,
) -> FilterResult<()> {
    if sigma <= SIGMA_EPSILON {
        return laplace(input, mode, output);
    }
    let ndim = input.ndim();
    sum_over_axes(input, output, |axis, src, dst| {
        let orders: Vec<Derivative> = (0..ndim)
            .map(|d| if d == axis { Derivative::Second } else { Derivative::Zero })
            .collect();
        gaussian_filter_orders(src, sigma, &orders, mode, truncate, dst)
    })
}

fn gradient<D: Dimension>(
    input: ArrayView<'_, f64, D>,
    axis: Axis,
    smooth: &[f64; 3],
    mode: BoundaryMode,
    output: ArrayViewMut<'_, f64, D>,
) -> FilterResult<()> {
    check_axis(axis, input.ndim())?;
    let passes: Vec<(Axis, Vec<f64>)> = (0..input.ndim())
        .map(|d| {
            let weights = if d == axis.index() { DERIVATIVE.to_vec() } else { smooth.to_vec() };
            (Axis(d), weights)
        })
        .collect();
    separable(input, &passes, mode, output)
}

/// Prewitt derivative along `axis`, `[1, 1, 1]` smoothing across the others.
pub fn prewitt<D: Dimension>(
    input: ArrayView<'_, f64, D>,
    axis: Axis,
    mode: BoundaryMode,
    output: ArrayViewMut<'_, f64, D>,
) -> FilterResult<()> {
    gradient(input, axis, &PREWITT_SMOOTH, mode, output)
}

/// Sobel derivative along `axis`, `[1, 2, 1]` smoothing across the others.
pub fn sobel<D: Dimension>(
    input: ArrayView<'_, f64, D>,
    axis: Axis,
    mode: BoundaryMode,
    output: ArrayViewMut<'_, f64, D>,
) -> FilterResult<()> {
    gradient(input, axis, &SOBEL_SMOOTH, mode, output)
}
