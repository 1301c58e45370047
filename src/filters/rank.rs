//! Rank filters: Maximum, Minimum, Median, Percentile.

use ndarray::{ArrayView2, ArrayViewMut2};

use super::{window_size, Capabilities, Filter, FilterContext, FilterGroup, SLICE_FILTER};
use crate::error::FilterResult;
use crate::ndimage;
use crate::params::{ParamSchema, ParamSpec, ParameterSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Statistic {
    Maximum,
    Minimum,
    Median,
    Percentile,
}

/// Neighborhood order statistic over a square window.
pub struct RankFilter {
    statistic: Statistic,
    schema: ParamSchema,
}

impl RankFilter {
    pub fn maximum() -> Self {
        Self::with_size_spec(Statistic::Maximum, ParamSpec::float("size", (0.0, 30.0), 1, 2.0))
    }

    pub fn minimum() -> Self {
        Self::with_size_spec(Statistic::Minimum, ParamSpec::float("size", (0.0, 30.0), 1, 2.0))
    }

    pub fn median() -> Self {
        Self::with_size_spec(Statistic::Median, ParamSpec::int("size", (0, 30), 2))
    }

    pub fn percentile() -> Self {
        RankFilter {
            statistic: Statistic::Percentile,
            schema: ParamSchema::new(vec![
                ParamSpec::int("size", (0, 30), 2).unit("pix"),
                ParamSpec::int("per", (0, 100), 50).label("percent"),
            ]),
        }
    }

    fn with_size_spec(statistic: Statistic, size: ParamSpec) -> Self {
        RankFilter {
            statistic,
            schema: ParamSchema::new(vec![size.unit("pix")]),
        }
    }
}

impl Filter for RankFilter {
    fn key(&self) -> &'static str {
        match self.statistic {
            Statistic::Maximum => "maximum",
            Statistic::Minimum => "minimum",
            Statistic::Median => "median",
            Statistic::Percentile => "percentile",
        }
    }

    fn title(&self) -> &'static str {
        match self.statistic {
            Statistic::Maximum => "Maximum",
            Statistic::Minimum => "Minimum",
            Statistic::Median => "Median",
            Statistic::Percentile => "Percent",
        }
    }

    fn group(&self) -> FilterGroup {
        FilterGroup::Rank
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
        let mode = ctx.boundary;
        match self.statistic {
            Statistic::Maximum => ndimage::maximum_filter(source, size, mode, dest),
            Statistic::Minimum => ndimage::minimum_filter(source, size, mode, dest),
            Statistic::Median => ndimage::median_filter(source, size, mode, dest),
            Statistic::Percentile => {
                let per = params.float("per")?;
                ndimage::percentile_filter(source, size, per, mode, dest)
            }
        }
    }
}
