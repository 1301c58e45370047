//! Sharpen filters: Laplace Sharp, Unsharp Mask.
//!
//! Both add amplified high-frequency detail back to the source, so results
//! overshoot the value range near edges and are stored with the configured
//! cast policy.

use ndarray::{ArrayView2, ArrayViewMut2};

use super::composite;
use super::{Capabilities, Filter, FilterContext, FilterGroup, SLICE_FILTER};
use crate::error::FilterResult;
use crate::params::{ParamSchema, ParamSpec, ParameterSet};

const SHARPEN_FILTER: Capabilities = SLICE_FILTER.union(Capabilities::WIDE_INTERMEDIATE);

fn weight_spec(default: f64) -> ParamSpec {
    ParamSpec::float("weight", (0.0, 5.0), 1, default).unit("factor")
}

// ============================================================================
// Laplace Sharp
// ============================================================================

/// `source - weight * laplace(source)`.
pub struct LaplaceSharp {
    schema: ParamSchema,
}

impl LaplaceSharp {
    pub fn new() -> Self {
        LaplaceSharp {
            schema: ParamSchema::new(vec![weight_spec(0.2)]),
        }
    }
}

impl Default for LaplaceSharp {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for LaplaceSharp {
    fn key(&self) -> &'static str {
        "laplace_sharp"
    }

    fn title(&self) -> &'static str {
        "Laplace Sharp"
    }

    fn group(&self) -> FilterGroup {
        FilterGroup::Sharpen
    }

    fn capabilities(&self) -> Capabilities {
        SHARPEN_FILTER
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
        let weight = params.float("weight")?;
        composite::laplace_sharpen(source, weight, ctx, dest)
    }
}

// ============================================================================
// Unsharp Mask
// ============================================================================

/// `source + weight * (source - G(source, sigma))`.
pub struct UnsharpMask {
    schema: ParamSchema,
}

impl UnsharpMask {
    pub fn new() -> Self {
        UnsharpMask {
            schema: ParamSchema::new(vec![
                ParamSpec::float("sigma", (0.0, 30.0), 1, 2.0).unit("pix"),
                weight_spec(0.5),
            ]),
        }
    }
}

impl Default for UnsharpMask {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for UnsharpMask {
    fn key(&self) -> &'static str {
        "unsharp_mask"
    }

    fn title(&self) -> &'static str {
        "Unsharp Mask"
    }

    fn group(&self) -> FilterGroup {
        FilterGroup::Sharpen
    }

    fn capabilities(&self) -> Capabilities {
        SHARPEN_FILTER
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
        let weight = params.float("weight")?;
        composite::unsharp_mask(source, sigma, weight, ctx, dest)
    }
}
