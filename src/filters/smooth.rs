//! Smoothing filters: Uniform, Gaussian, and volumetric Gaussian.
//!
//! Single library calls with no post-processing. A size or sigma of zero is
//! the identity.

use ndarray::{ArrayView2, ArrayView3, ArrayViewMut2, ArrayViewMut3};

use super::{window_size, Capabilities, Filter, FilterContext, FilterGroup, SLICE_FILTER};
use crate::error::FilterResult;
use crate::ndimage;
use crate::params::{ParamSchema, ParamSpec, ParameterSet};

fn sigma_spec() -> ParamSpec {
    ParamSpec::float("sigma", (0.0, 30.0), 1, 2.0).unit("pix")
}

// ============================================================================
// Uniform
// ============================================================================

/// Box mean over a `size x size` window.
pub struct Uniform {
    schema: ParamSchema,
}

impl Uniform {
    pub fn new() -> Self {
        Uniform {
            schema: ParamSchema::new(vec![ParamSpec::float("size", (0.0, 30.0), 1, 2.0).unit("pix")]),
        }
    }
}

impl Default for Uniform {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for Uniform {
    fn key(&self) -> &'static str {
        "uniform"
    }

    fn title(&self) -> &'static str {
        "Uniform"
    }

    fn group(&self) -> FilterGroup {
        FilterGroup::Smoothing
    }

    fn capabilities(&self) -> Capabilities {
        SLICE_FILTER
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
        let size = window_size(params, "size")?;
        ndimage::uniform_filter(source, size, ctx.boundary, dest)
    }
}

// ============================================================================
// Gaussian
// ============================================================================

/// Isotropic Gaussian blur of one slice.
pub struct Gaussian {
    schema: ParamSchema,
}

impl Gaussian {
    pub fn new() -> Self {
        Gaussian {
            schema: ParamSchema::new(vec![sigma_spec()]),
        }
    }
}

impl Default for Gaussian {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for Gaussian {
    fn key(&self) -> &'static str {
        "gaussian"
    }

    fn title(&self) -> &'static str {
        "Gaussian"
    }

    fn group(&self) -> FilterGroup {
        FilterGroup::Smoothing
    }

    fn capabilities(&self) -> Capabilities {
        SLICE_FILTER
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
        let sigma = params.float("sigma")?;
        ndimage::gaussian_filter(source, sigma, ctx.boundary, ctx.truncate, dest)
    }
}

// ============================================================================
// Gaussian 3D
// ============================================================================

/// Gaussian blur across rows, columns and slices in one pass.
///
/// On a single 2D image the runner falls back to [`Filter::apply`], which is
/// an ordinary 2D Gaussian.
pub struct Gaussian3D {
    schema: ParamSchema,
}

impl Gaussian3D {
    pub fn new() -> Self {
        Gaussian3D {
            schema: ParamSchema::new(vec![sigma_spec()]),
        }
    }
}

impl Default for Gaussian3D {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for Gaussian3D {
    fn key(&self) -> &'static str {
        "gaussian3d"
    }

    fn title(&self) -> &'static str {
        "Gaussian3D"
    }

    fn group(&self) -> FilterGroup {
        FilterGroup::Volume
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL_KINDS | Capabilities::STACK_3D
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
        let sigma = params.float("sigma")?;
        ndimage::gaussian_filter(source, sigma, ctx.boundary, ctx.truncate, dest)
    }

    fn apply_volume(
        &self,
        ctx: &FilterContext,
        source: ArrayView3<'_, f64>,
        dest: ArrayViewMut3<'_, f64>,
        params: &ParameterSet,
    ) -> FilterResult<()> {
        self.schema.check(params)?;
        let sigma = params.float("sigma")?;
        ndimage::gaussian_filter(source, sigma, ctx.boundary, ctx.truncate, dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;
    use crate::image::ValueRange;
    use crate::ndimage::BoundaryMode;
    use ndarray::{array, Array2, Array3};

    fn ctx() -> FilterContext {
        FilterContext {
            range: ValueRange::new(0.0, 255.0),
            boundary: BoundaryMode::Reflect,
            truncate: 4.0,
        }
    }

    #[test]
    fn test_uniform_zero_size_is_identity() {
        let f = Uniform::new();
        let src = array![[1.0, 2.0], [3.0, 4.0]];
        let mut out = Array2::<f64>::zeros((2, 2));
        let params = f.schema().defaults().with("size", 0.0);
        f.apply(&ctx(), src.view(), out.view_mut(), &params).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn test_uniform_three_by_three_zero() {
        let f = Uniform::new();
        let src = Array2::<f64>::zeros((3, 3));
        let mut out = Array2::<f64>::from_elem((3, 3), 7.0);
        let params = f.schema().defaults().with("size", 1.0);
        f.apply(&ctx(), src.view(), out.view_mut(), &params).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn test_gaussian_rejects_out_of_schema_sigma() {
        let f = Gaussian::new();
        let src = Array2::<f64>::zeros((3, 3));
        let mut out = Array2::<f64>::zeros((3, 3));
        let params = f.schema().defaults().with("sigma", 45.0);
        let err = f.apply(&ctx(), src.view(), out.view_mut(), &params).unwrap_err();
        assert!(matches!(err, FilterError::InvalidParameter { .. }));
    }

    #[test]
    fn test_gaussian3d_volume_mixes_slices() {
        let f = Gaussian3D::new();
        let mut src = Array3::<f64>::zeros((3, 5, 5));
        src[[1, 2, 2]] = 100.0;
        let mut out = Array3::<f64>::zeros((3, 5, 5));
        let params = f.schema().defaults().with("sigma", 1.0);
        f.apply_volume(&ctx(), src.view(), out.view_mut(), &params).unwrap();
        assert!(out[[0, 2, 2]] > 0.0);
        assert!(f.has(Capabilities::STACK_3D));
        assert!(!f.has(Capabilities::PREVIEW));
    }

    #[test]
    fn test_slice_filters_have_no_volume_apply() {
        let f = Gaussian::new();
        let src = Array3::<f64>::zeros((2, 2, 2));
        let mut out = Array3::<f64>::zeros((2, 2, 2));
        let err = f
            .apply_volume(&ctx(), src.view(), out.view_mut(), &f.schema().defaults())
            .unwrap_err();
        assert!(matches!(err, FilterError::Unsupported(_)));
    }
}
