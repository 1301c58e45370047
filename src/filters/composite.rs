//! Multi-pass kernels: difference of Gaussians, unsharp mask, Laplacian
//! sharpening, gradient magnitude and mean re-centering.
//!
//! Each kernel reads a working plane and writes a distinct destination. Every
//! intermediate is an `f64` buffer, so differences and residuals keep their
//! sign and magnitude until the runner's single storage cast.

use std::str::FromStr;

use ndarray::{Array, Array2, ArrayView, ArrayView2, ArrayViewMut, ArrayViewMut2, Axis, Dimension, Zip};

use super::FilterContext;
use crate::error::{FilterError, FilterResult};
use crate::ndimage;

// ============================================================================
// Re-centering
// ============================================================================

/// Shift a zero-centred result by the mean of the declared value range.
pub fn recenter<D: Dimension>(mut dest: ArrayViewMut<'_, f64, D>, ctx: &FilterContext) {
    let mean = ctx.range.mean();
    dest.mapv_inplace(|v| v + mean);
}

/// Negate in place, optionally re-centering afterwards.
pub(crate) fn invert<D: Dimension>(mut dest: ArrayViewMut<'_, f64, D>, uniform: bool, ctx: &FilterContext) {
    dest.mapv_inplace(|v| -v);
    if uniform {
        recenter(dest, ctx);
    }
}

// ============================================================================
// Difference of Gaussians
// ============================================================================

/// `dest = G(source, sigma1) - G(source, sigma2)`.
///
/// Both passes read `source` into their own buffer; `dest` is only written by
/// the final subtraction.
pub fn difference_of_gaussians<D: Dimension>(
    source: ArrayView<'_, f64, D>,
    sigma1: f64,
    sigma2: f64,
    ctx: &FilterContext,
    dest: ArrayViewMut<'_, f64, D>,
) -> FilterResult<()> {
    let mut fine = Array::<f64, D>::zeros(source.raw_dim());
    let mut coarse = Array::<f64, D>::zeros(source.raw_dim());
    ndimage::gaussian_filter(source.view(), sigma1, ctx.boundary, ctx.truncate, fine.view_mut())?;
    ndimage::gaussian_filter(source.view(), sigma2, ctx.boundary, ctx.truncate, coarse.view_mut())?;

    Zip::from(dest)
        .and(&fine)
        .and(&coarse)
        .for_each(|d, &a, &b| *d = a - b);
    Ok(())
}

// ============================================================================
// Sharpening
// ============================================================================

/// `dest = source + weight * (source - G(source, sigma))`.
pub fn unsharp_mask<D: Dimension>(
    source: ArrayView<'_, f64, D>,
    sigma: f64,
    weight: f64,
    ctx: &FilterContext,
    dest: ArrayViewMut<'_, f64, D>,
) -> FilterResult<()> {
    let mut blurred = Array::<f64, D>::zeros(source.raw_dim());
    ndimage::gaussian_filter(source.view(), sigma, ctx.boundary, ctx.truncate, blurred.view_mut())?;

    Zip::from(dest)
        .and(&source)
        .and(&blurred)
        .for_each(|d, &s, &g| *d = s + weight * (s - g));
    Ok(())
}

/// `dest = source - weight * laplace(source)`.
pub fn laplace_sharpen<D: Dimension>(
    source: ArrayView<'_, f64, D>,
    weight: f64,
    ctx: &FilterContext,
    dest: ArrayViewMut<'_, f64, D>,
) -> FilterResult<()> {
    let mut lap = Array::<f64, D>::zeros(source.raw_dim());
    ndimage::laplace(source.view(), ctx.boundary, lap.view_mut())?;

    Zip::from(dest)
        .and(&source)
        .and(&lap)
        .for_each(|d, &s, &l| *d = s - weight * l);
    Ok(())
}

// ============================================================================
// Gradient magnitude
// ============================================================================

/// Directional operator used for gradient filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientOperator {
    Prewitt,
    Sobel,
}

impl GradientOperator {
    /// Sum of the cross-axis smoothing weights.
    pub fn norm(self) -> f64 {
        match self {
            GradientOperator::Prewitt => 3.0,
            GradientOperator::Sobel => 4.0,
        }
    }

    fn derivative(
        self,
        source: ArrayView2<'_, f64>,
        axis: Axis,
        ctx: &FilterContext,
        dest: ArrayViewMut2<'_, f64>,
    ) -> FilterResult<()> {
        match self {
            GradientOperator::Prewitt => ndimage::prewitt(source, axis, ctx.boundary, dest),
            GradientOperator::Sobel => ndimage::sobel(source, axis, ctx.boundary, dest),
        }
    }
}

/// Which gradient components contribute to the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Both,
    /// Derivative along rows (axis 0).
    Horizontal,
    /// Derivative along columns (axis 1).
    Vertical,
}

impl Direction {
    pub const CHOICES: &'static [&'static str] = &["both", "horizontal", "vertical"];
}

impl FromStr for Direction {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "both" => Ok(Direction::Both),
            "horizontal" => Ok(Direction::Horizontal),
            "vertical" => Ok(Direction::Vertical),
            other => Err(FilterError::invalid(
                "axis",
                format!("`{}` is not one of {:?}", other, Direction::CHOICES),
            )),
        }
    }
}

/// Absolute gradient along one axis, or `(|g0| + |g1|) / norm` for both.
pub fn gradient_magnitude(
    source: ArrayView2<'_, f64>,
    operator: GradientOperator,
    direction: Direction,
    ctx: &FilterContext,
    mut dest: ArrayViewMut2<'_, f64>,
) -> FilterResult<()> {
    match direction {
        Direction::Horizontal | Direction::Vertical => {
            let axis = if direction == Direction::Horizontal { Axis(0) } else { Axis(1) };
            operator.derivative(source, axis, ctx, dest.view_mut())?;
            dest.mapv_inplace(f64::abs);
            Ok(())
        }
        Direction::Both => {
            let mut g0 = Array2::<f64>::zeros(source.raw_dim());
            let mut g1 = Array2::<f64>::zeros(source.raw_dim());
            operator.derivative(source, Axis(0), ctx, g0.view_mut())?;
            operator.derivative(source, Axis(1), ctx, g1.view_mut())?;
            let norm = operator.norm();
            Zip::from(&mut dest)
                .and(&g0)
                .and(&g1)
                .for_each(|d, &a, &b| *d = (a.abs() + b.abs()) / norm);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ValueRange;
    use crate::ndimage::BoundaryMode;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn ctx() -> FilterContext {
        FilterContext {
            range: ValueRange::new(0.0, 255.0),
            boundary: BoundaryMode::Reflect,
            truncate: 4.0,
        }
    }

    fn ramp() -> Array2<f64> {
        Array2::from_shape_fn((6, 7), |(y, x)| ((y * 7 + x) * 13 % 50) as f64)
    }

    #[test]
    fn test_dog_with_zero_sigma1_is_residual() {
        let src = ramp();
        let mut dog = Array2::<f64>::zeros(src.raw_dim());
        let mut blur = Array2::<f64>::zeros(src.raw_dim());
        difference_of_gaussians(src.view(), 0.0, 1.5, &ctx(), dog.view_mut()).unwrap();
        ndimage::gaussian_filter(src.view(), 1.5, BoundaryMode::Reflect, 4.0, blur.view_mut()).unwrap();
        assert_eq!(dog, &src - &blur);
    }

    #[test]
    fn test_usm_weights() {
        let src = ramp();
        let mut out = Array2::<f64>::zeros(src.raw_dim());
        unsharp_mask(src.view(), 2.0, 0.0, &ctx(), out.view_mut()).unwrap();
        assert_eq!(out, src);

        let mut blur = Array2::<f64>::zeros(src.raw_dim());
        ndimage::gaussian_filter(src.view(), 2.0, BoundaryMode::Reflect, 4.0, blur.view_mut()).unwrap();
        unsharp_mask(src.view(), 2.0, 1.0, &ctx(), out.view_mut()).unwrap();
        for ((o, s), b) in out.iter().zip(src.iter()).zip(blur.iter()) {
            assert_abs_diff_eq!(*o, 2.0 * s - b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_laplace_sharpen_centre() {
        let src = array![[0.0, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 0.0]];
        let mut out = Array2::<f64>::zeros((3, 3));
        laplace_sharpen(src.view(), 0.5, &ctx(), out.view_mut()).unwrap();
        // laplace at centre is -40
        assert_eq!(out[[1, 1]], 30.0);
        assert_eq!(out[[0, 1]], -5.0);
    }

    #[test]
    fn test_gradient_both_divides_single_does_not() {
        let src = array![[0.0, 0.0, 8.0], [0.0, 0.0, 8.0], [4.0, 4.0, 12.0]];
        let mut both = Array2::<f64>::zeros((3, 3));
        let mut g0 = Array2::<f64>::zeros((3, 3));
        let mut g1 = Array2::<f64>::zeros((3, 3));
        gradient_magnitude(src.view(), GradientOperator::Sobel, Direction::Both, &ctx(), both.view_mut())
            .unwrap();
        gradient_magnitude(src.view(), GradientOperator::Sobel, Direction::Horizontal, &ctx(), g0.view_mut())
            .unwrap();
        gradient_magnitude(src.view(), GradientOperator::Sobel, Direction::Vertical, &ctx(), g1.view_mut())
            .unwrap();
        assert_eq!(both, (&g0 + &g1) / 4.0);
        assert!(g0.iter().all(|&v| v >= 0.0));

        let mut raw = Array2::<f64>::zeros((3, 3));
        ndimage::sobel(src.view(), Axis(1), BoundaryMode::Reflect, raw.view_mut()).unwrap();
        assert_eq!(g1, raw.mapv(f64::abs));
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("vertical".parse::<Direction>(), Ok(Direction::Vertical));
        assert!("diagonal".parse::<Direction>().is_err());
    }

    #[test]
    fn test_invert_and_recenter() {
        let mut v = array![[1.0, -2.0]];
        invert(v.view_mut(), true, &ctx());
        assert_eq!(v, array![[126.5, 129.5]]);
    }
}
