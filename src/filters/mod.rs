//! Filter declarations and the catalog.
//!
//! Every filter is a thin declaration over [`crate::ndimage`]: a key, a title,
//! a [`Capabilities`] set, a [`ParamSchema`] and an `apply` operation.
//!
//! ## Execution contract
//!
//! `apply` reads an immutable `f64` working plane converted from the snapshot
//! and writes a separate destination plane of the same shape. It never sees
//! the storage buffer. Snapshots, masks and the final cast belong to the
//! [`crate::FilterRunner`].
//!
//! ## Filter Groups
//!
//! | Group | Filters |
//! |-------|---------|
//! | Smoothing | uniform, gaussian |
//! | Rank | maximum, minimum, median, percentile |
//! | Edge | prewitt, sobel, laplace, gaussian_laplace, dog |
//! | Sharpen | laplace_sharp, unsharp_mask |
//! | Volume | gaussian3d |

use ndarray::{ArrayView2, ArrayView3, ArrayViewMut2, ArrayViewMut3};
use serde::Serialize;

use crate::error::{FilterError, FilterResult};
use crate::image::ValueRange;
use crate::ndimage::BoundaryMode;
use crate::params::{ParamSchema, ParameterSet};

pub mod capability;
pub mod catalog;
pub mod composite;
pub mod edge;
pub mod rank;
pub mod sharpen;
pub mod smooth;

pub use capability::Capabilities;
pub use catalog::{Catalog, MenuEntry};

/// Capabilities shared by every 2D catalog filter.
pub(crate) const SLICE_FILTER: Capabilities = Capabilities::ALL_KINDS
    .union(Capabilities::AUTO_MASK)
    .union(Capabilities::AUTO_SNAPSHOT)
    .union(Capabilities::PREVIEW);

/// Per-invocation facts a filter may depend on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterContext {
    /// Declared value range of the image, used for mean re-centering.
    pub range: ValueRange,
    pub boundary: BoundaryMode,
    pub truncate: f64,
}

/// Menu section a filter is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterGroup {
    Smoothing,
    Rank,
    Edge,
    Sharpen,
    Volume,
}

impl FilterGroup {
    pub fn title(self) -> &'static str {
        match self {
            FilterGroup::Smoothing => "Smoothing",
            FilterGroup::Rank => "Rank",
            FilterGroup::Edge => "Edge",
            FilterGroup::Sharpen => "Sharpen",
            FilterGroup::Volume => "Volume",
        }
    }
}

/// A cataloged filter.
pub trait Filter: Send + Sync {
    /// Stable lookup key, e.g. `"gaussian_laplace"`.
    fn key(&self) -> &'static str;

    /// Display name.
    fn title(&self) -> &'static str;

    fn group(&self) -> FilterGroup;

    fn capabilities(&self) -> Capabilities;

    fn schema(&self) -> &ParamSchema;

    /// Filter one slice: read `source`, write `dest`.
    ///
    /// Must be deterministic for a given `(source, params)` and must reject
    /// parameters outside the schema with [`FilterError::InvalidParameter`].
    fn apply(
        &self,
        ctx: &FilterContext,
        source: ArrayView2<'_, f64>,
        dest: ArrayViewMut2<'_, f64>,
        params: &ParameterSet,
    ) -> FilterResult<()>;

    /// Filter a whole `(slices, height, width)` volume at once.
    ///
    /// Only filters with [`Capabilities::STACK_3D`] override this.
    fn apply_volume(
        &self,
        _ctx: &FilterContext,
        _source: ArrayView3<'_, f64>,
        _dest: ArrayViewMut3<'_, f64>,
        _params: &ParameterSet,
    ) -> FilterResult<()> {
        Err(FilterError::Unsupported(format!(
            "`{}` has no volume operation",
            self.key()
        )))
    }

    fn has(&self, caps: Capabilities) -> bool {
        self.capabilities().contains(caps)
    }
}

/// Read a window size parameter; fractional sizes truncate.
pub(crate) fn window_size(params: &ParameterSet, key: &str) -> FilterResult<usize> {
    let size = params.float(key)?;
    if !size.is_finite() || size < 0.0 {
        return Err(FilterError::invalid(key, format!("size must be >= 0, got {}", size)));
    }
    Ok(size.trunc() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::PixelKind;

    #[test]
    fn test_window_size_truncates() {
        let params = ParameterSet::new().with("size", 2.9);
        assert_eq!(window_size(&params, "size").unwrap(), 2);
        let params = ParameterSet::new().with("size", 3i64);
        assert_eq!(window_size(&params, "size").unwrap(), 3);
        let params = ParameterSet::new().with("size", -1.0);
        assert!(window_size(&params, "size").is_err());
    }

    #[test]
    fn test_slice_filter_capabilities() {
        assert!(SLICE_FILTER.contains(Capabilities::PREVIEW | Capabilities::AUTO_MASK));
        assert!(!SLICE_FILTER.contains(Capabilities::STACK_3D));
        assert!(SLICE_FILTER.accepts(PixelKind::I16));
    }
}
