//! Edge detection filters: Prewitt, Sobel, Laplace, Gaussian Laplace, DOG.
//!
//! All of these produce signed or amplified results and carry
//! [`Capabilities::WIDE_INTERMEDIATE`], so the runner stores them with the
//! configured cast policy.
//!
//! ## Mean re-centering
//!
//! Laplace, Gaussian Laplace and DOG take a `uniform` flag. When set, the
//! midpoint of the image's declared value range is added to the zero-centred
//! result (127.5 for 8-bit, 0.5 for float images).

use ndarray::{ArrayView2, ArrayViewMut2};

use super::composite::{self, Direction, GradientOperator};
use super::{Capabilities, Filter, FilterContext, FilterGroup, SLICE_FILTER};
use crate::error::FilterResult;
use crate::ndimage;
use crate::params::{ParamSchema, ParamSpec, ParameterSet};

const EDGE_FILTER: Capabilities = SLICE_FILTER.union(Capabilities::WIDE_INTERMEDIATE);

fn uniform_spec() -> ParamSpec {
    ParamSpec::flag("uniform", false)
}

fn sigma_spec(key: &'static str, default: f64) -> ParamSpec {
    ParamSpec::float(key, (0.0, 30.0), 1, default).unit("pix")
}

// ============================================================================
// Prewitt / Sobel
// ============================================================================

/// Gradient magnitude with a Prewitt or Sobel operator.
///
/// `axis = "both"` yields `(|g0| + |g1|) / 3` (Prewitt) or `/ 4` (Sobel);
/// a single axis yields `|g_axis|` undivided.
pub struct Gradient {
    operator: GradientOperator,
    schema: ParamSchema,
}

impl Gradient {
    pub fn prewitt() -> Self {
        Self::new(GradientOperator::Prewitt)
    }

    pub fn sobel() -> Self {
        Self::new(GradientOperator::Sobel)
    }

    fn new(operator: GradientOperator) -> Self {
        Gradient {
            operator,
            schema: ParamSchema::new(vec![ParamSpec::choice("axis", Direction::CHOICES, "both")
                .label("direction")
                .unit("axis")]),
        }
    }
}

impl Filter for Gradient {
    fn key(&self) -> &'static str {
        match self.operator {
            GradientOperator::Prewitt => "prewitt",
            GradientOperator::Sobel => "sobel",
        }
    }

    fn title(&self) -> &'static str {
        match self.operator {
            GradientOperator::Prewitt => "Prewitt",
            GradientOperator::Sobel => "Sobel",
        }
    }

    fn group(&self) -> FilterGroup {
        FilterGroup::Edge
    }

    fn capabilities(&self) -> Capabilities {
        EDGE_FILTER
    }

    fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    fn apply(
        &self,
        ctx: &FilterContext,
        source: ArrayView2<'_, f64>,
        dest: ArrayViewMut2<'_, f64>,
        params: &ParameterSet,
    ) -> FilterResult<()> {
        self.schema.check(params)?;
        let direction: Direction = params.choice("axis")?.parse()?;
        composite::gradient_magnitude(source, self.operator, direction, ctx, dest)
    }
}

// ============================================================================
// Laplace
// ============================================================================

/// Sign-inverted discrete Laplacian.
pub struct Laplace {
    schema: ParamSchema,
}

impl Laplace {
    pub fn new() -> Self {
        Laplace {
            schema: ParamSchema::new(vec![uniform_spec()]),
        }
    }
}

impl Default for Laplace {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for Laplace {
    fn key(&self) -> &'static str {
        "laplace"
    }

    fn title(&self) -> &'static str {
        "Laplace"
    }

    fn group(&self) -> FilterGroup {
        FilterGroup::Edge
    }

    fn capabilities(&self) -> Capabilities {
        EDGE_FILTER
    }

    fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    fn apply(
        &self,
        ctx: &FilterContext,
        source: ArrayView2<'_, f64>,
        mut dest: ArrayViewMut2<'_, f64>,
        params: &ParameterSet,
    ) -> FilterResult<()> {
        self.schema.check(params)?;
        let uniform = params.flag("uniform")?;
        ndimage::laplace(source, ctx.boundary, dest.view_mut())?;
        composite::invert(dest, uniform, ctx);
        Ok(())
    }
}

// ============================================================================
// Gaussian Laplace
// ============================================================================

/// Sign-inverted Laplacian of Gaussian.
pub struct GaussianLaplace {
    schema: ParamSchema,
}

impl GaussianLaplace {
    pub fn new() -> Self {
        GaussianLaplace {
            schema: ParamSchema::new(vec![sigma_spec("sigma", 2.0), uniform_spec()]),
        }
    }
}

impl Default for GaussianLaplace {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for GaussianLaplace {
    fn key(&self) -> &'static str {
        "gaussian_laplace"
    }

    fn title(&self) -> &'static str {
        "Gaussian Laplace"
    }

    fn group(&self) -> FilterGroup {
        FilterGroup::Edge
    }

    fn capabilities(&self) -> Capabilities {
        EDGE_FILTER
    }

    fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    fn apply(
        &self,
        ctx: &FilterContext,
        source: ArrayView2<'_, f64>,
        mut dest: ArrayViewMut2<'_, f64>,
        params: &ParameterSet,
    ) -> FilterResult<()> {
        self.schema.check(params)?;
        let sigma = params.float("sigma")?;
        let uniform = params.flag("uniform")?;
        ndimage::gaussian_laplace(source, sigma, ctx.boundary, ctx.truncate, dest.view_mut())?;
        composite::invert(dest, uniform, ctx);
        Ok(())
    }
}

// ============================================================================
// Difference of Gaussians
// ============================================================================

/// `G(sigma1) - G(sigma2)`, band-pass edge response.
pub struct Dog {
    schema: ParamSchema,
}

impl Dog {
    pub fn new() -> Self {
        Dog {
            schema: ParamSchema::new(vec![
                sigma_spec("sigma1", 0.0),
                sigma_spec("sigma2", 2.0),
                uniform_spec(),
            ]),
        }
    }
}

impl Default for Dog {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for Dog {
    fn key(&self) -> &'static str {
        "dog"
    }

    fn title(&self) -> &'static str {
        "DOG"
    }

    fn group(&self) -> FilterGroup {
        FilterGroup::Edge
    }

    fn capabilities(&self) -> Capabilities {
        EDGE_FILTER
    }

    fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    fn apply(
        &self,
        ctx: &FilterContext,
        source: ArrayView2<'_, f64>,
        mut dest: ArrayViewMut2<'_, f64>,
        params: &ParameterSet,
    ) -> FilterResult<()> {
        self.schema.check(params)?;
        let sigma1 = params.float("sigma1")?;
        let sigma2 = params.float("sigma2")?;
        composite::difference_of_gaussians(source, sigma1, sigma2, ctx, dest.view_mut())?;
        if params.flag("uniform")? {
            composite::recenter(dest, ctx);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;
    use crate::image::ValueRange;
    use crate::ndimage::BoundaryMode;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2, Axis};

    fn ctx() -> FilterContext {
        FilterContext {
            range: ValueRange::new(0.0, 255.0),
            boundary: BoundaryMode::Reflect,
            truncate: 4.0,
        }
    }

    fn impulse() -> Array2<f64> {
        array![[0.0, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 0.0]]
    }

    #[test]
    fn test_laplace_inverts_library_output() {
        let f = Laplace::new();
        let src = impulse();
        let mut out = Array2::<f64>::zeros((3, 3));
        f.apply(&ctx(), src.view(), out.view_mut(), &f.schema().defaults()).unwrap();
        assert_eq!(out[[1, 1]], 40.0);
        assert_eq!(out[[0, 1]], -10.0);

        let mut centred = Array2::<f64>::zeros((3, 3));
        let params = f.schema().defaults().with("uniform", true);
        f.apply(&ctx(), src.view(), centred.view_mut(), &params).unwrap();
        assert_eq!(centred, &out + 127.5);
    }

    #[test]
    fn test_gaussian_laplace_uniform_adds_range_mean() {
        let f = GaussianLaplace::new();
        let src = Array2::from_shape_fn((7, 7), |(y, x)| ((y * 3 + x * 5) % 11) as f64);
        let mut plain = Array2::<f64>::zeros((7, 7));
        let mut centred = Array2::<f64>::zeros((7, 7));
        let params = f.schema().defaults().with("sigma", 1.0);
        f.apply(&ctx(), src.view(), plain.view_mut(), &params).unwrap();
        f.apply(&ctx(), src.view(), centred.view_mut(), &params.clone().with("uniform", true))
            .unwrap();
        for (a, b) in plain.iter().zip(centred.iter()) {
            assert_abs_diff_eq!(a + 127.5, *b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_dog_zero_sigma1_equals_residual() {
        let f = Dog::new();
        let src = Array2::from_shape_fn((6, 6), |(y, x)| (y * x) as f64);
        let mut out = Array2::<f64>::zeros((6, 6));
        let mut blur = Array2::<f64>::zeros((6, 6));
        let params = f.schema().defaults().with("sigma2", 1.5);
        f.apply(&ctx(), src.view(), out.view_mut(), &params).unwrap();
        ndimage::gaussian_filter(src.view(), 1.5, BoundaryMode::Reflect, 4.0, blur.view_mut()).unwrap();
        assert_eq!(out, &src - &blur);
    }

    #[test]
    fn test_sobel_both_and_single_axis() {
        let f = Gradient::sobel();
        let src = array![[0.0, 0.0, 12.0, 12.0], [0.0, 0.0, 12.0, 12.0], [0.0, 0.0, 12.0, 12.0]];
        let mut both = Array2::<f64>::zeros((3, 4));
        let mut vertical = Array2::<f64>::zeros((3, 4));
        f.apply(&ctx(), src.view(), both.view_mut(), &f.schema().defaults()).unwrap();
        let params = f.schema().defaults().with("axis", "vertical");
        f.apply(&ctx(), src.view(), vertical.view_mut(), &params).unwrap();
        assert_eq!(vertical[[1, 1]], 48.0);
        assert_eq!(both[[1, 1]], 12.0);

        let mut raw = Array2::<f64>::zeros((3, 4));
        ndimage::sobel(src.view(), Axis(1), BoundaryMode::Reflect, raw.view_mut()).unwrap();
        assert_eq!(vertical, raw.mapv(f64::abs));
    }

    #[test]
    fn test_prewitt_rejects_unknown_axis() {
        let f = Gradient::prewitt();
        let src = impulse();
        let mut out = Array2::<f64>::zeros((3, 3));
        let params = f.schema().defaults().with("axis", "diagonal");
        let err = f.apply(&ctx(), src.view(), out.view_mut(), &params).unwrap_err();
        assert!(matches!(err, FilterError::InvalidParameter { ref key, .. } if key == "axis"));
    }

    #[test]
    fn test_edge_filters_need_wide_cast() {
        assert!(Dog::new().has(Capabilities::WIDE_INTERMEDIATE));
        assert!(Gradient::prewitt().has(Capabilities::WIDE_INTERMEDIATE | Capabilities::PREVIEW));
    }
}
