//! Filter execution: snapshot, apply, cast, mask merge, commit or discard.
//!
//! Every invocation walks `Idle -> SnapshotAcquired -> Applying` and ends in
//! `Committed` or `Discarded`. The filter only ever reads a working copy of
//! the snapshot and writes a separate working buffer; the image is touched
//! once, by the final cast, and restored from the snapshot on any failure.
//!
//! ## Dispatch
//!
//! | Filter | Image | Processed |
//! |--------|-------|-----------|
//! | `STACK_3D` | stack | whole volume, one `apply_volume` call |
//! | `STACK_3D` | single slice | `apply` on the slice |
//! | other | any | `apply` per slice, `AllSlices` or `CurrentSlice` |

use std::fmt;
use std::ops::Range;

use ndarray::{Array3, ArrayView2, ArrayViewMut2, Axis};
use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::cast::CastPolicy;
use crate::config::{RunnerConfig, StackMode};
use crate::error::{FilterError, FilterResult};
use crate::filters::{Capabilities, Catalog, Filter, FilterContext};
use crate::image::{Image, Mask, Pixel, Snapshot};
use crate::params::{ParameterSet, RawParameters};

// ============================================================================
// Outcome types
// ============================================================================

/// Lifecycle of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    SnapshotAcquired,
    Applying,
    Committed,
    Discarded,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::SnapshotAcquired => "snapshot_acquired",
            RunState::Applying => "applying",
            RunState::Committed => "committed",
            RunState::Discarded => "discarded",
        };
        f.write_str(name)
    }
}

/// Record of a committed invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied<T: Pixel> {
    /// Catalog key of the filter.
    pub filter: &'static str,
    /// Resolved parameters the result was computed with.
    pub params: ParameterSet,
    /// Slices that were rewritten.
    pub slices: Range<usize>,
    /// Pre-filter contents, kept for filters with `AUTO_SNAPSHOT`.
    pub undo: Option<Snapshot<T>>,
}

impl<T: Pixel> Applied<T> {
    /// Put the pre-filter contents back.
    pub fn revert(&self, image: &mut Image<T>) -> FilterResult<()> {
        match &self.undo {
            Some(snapshot) => {
                debug!(filter = self.filter, "reverting");
                snapshot.restore_into(image)
            }
            None => Err(FilterError::Unsupported(format!(
                "`{}` keeps no undo snapshot",
                self.filter
            ))),
        }
    }
}

/// Result of [`FilterRunner::invoke`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome<T: Pixel> {
    Committed(Applied<T>),
    Rejected(FilterError),
}

impl<T: Pixel> FilterOutcome<T> {
    pub fn is_committed(&self) -> bool {
        matches!(self, FilterOutcome::Committed(_))
    }

    pub fn into_result(self) -> FilterResult<Applied<T>> {
        match self {
            FilterOutcome::Committed(applied) => Ok(applied),
            FilterOutcome::Rejected(err) => Err(err),
        }
    }
}

impl<T: Pixel> From<FilterResult<Applied<T>>> for FilterOutcome<T> {
    fn from(result: FilterResult<Applied<T>>) -> Self {
        match result {
            Ok(applied) => FilterOutcome::Committed(applied),
            Err(err) => FilterOutcome::Rejected(err),
        }
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Decisions fixed before the snapshot is taken.
struct Plan<'m> {
    slices: Range<usize>,
    volume: bool,
    mask: Option<&'m Mask>,
    cast: CastPolicy,
}

/// Executes catalog filters against images.
///
/// The runner holds no per-image state; exclusive access to the image for
/// the duration of a call comes from the `&mut Image` borrow.
pub struct FilterRunner {
    config: RunnerConfig,
    catalog: Catalog,
}

impl FilterRunner {
    /// Runner over the built-in catalog.
    pub fn new(config: RunnerConfig) -> FilterResult<Self> {
        Self::with_catalog(config, Catalog::builtin())
    }

    pub fn with_catalog(config: RunnerConfig, catalog: Catalog) -> FilterResult<Self> {
        config.validate()?;
        Ok(FilterRunner { config, catalog })
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Resolve `raw` against the filter's schema and run it.
    ///
    /// A rejected invocation leaves `image` exactly as it was.
    pub fn invoke<T: Pixel>(
        &self,
        key: &str,
        image: &mut Image<T>,
        mask: Option<&Mask>,
        raw: &RawParameters,
    ) -> FilterOutcome<T> {
        let result = self.catalog.get(key).and_then(|filter| {
            let params = filter.schema().resolve(raw)?;
            self.run(filter, image, mask, &params)
        });
        if let Err(err) = &result {
            warn!(filter = key, error = %err, "invocation rejected");
        }
        result.into()
    }

    /// Run `filter` with already resolved parameters.
    pub fn run<T: Pixel>(
        &self,
        filter: &dyn Filter,
        image: &mut Image<T>,
        mask: Option<&Mask>,
        params: &ParameterSet,
    ) -> FilterResult<Applied<T>> {
        let key = filter.key();
        trace!(filter = key, state = %RunState::Idle, "invocation start");
        let plan = self.plan(filter, image, mask)?;
        filter.schema().check(params)?;

        let snapshot = Snapshot::capture(image, plan.slices.clone());
        trace!(filter = key, state = %RunState::SnapshotAcquired, slices = ?plan.slices);

        if let Err(err) = self.execute(filter, &plan, &snapshot, image, params) {
            discard(key, &snapshot, image);
            return Err(err);
        }

        debug!(filter = key, state = %RunState::Committed, slices = ?plan.slices);
        Ok(Applied {
            filter: key,
            params: params.clone(),
            slices: plan.slices,
            undo: filter.has(Capabilities::AUTO_SNAPSHOT).then_some(snapshot),
        })
    }

    /// Open a live preview of `key` on `image`.
    ///
    /// The snapshot is taken once; each [`PreviewSession::update`] re-applies
    /// the filter against it. Dropping the session without committing
    /// restores the image.
    pub fn preview<'a, T: Pixel>(
        &'a self,
        key: &str,
        image: &'a mut Image<T>,
        mask: Option<&'a Mask>,
    ) -> FilterResult<PreviewSession<'a, T>> {
        let filter = self.catalog.get(key)?;
        if !filter.has(Capabilities::PREVIEW) {
            return Err(FilterError::Unsupported(format!(
                "`{}` does not support live preview",
                key
            )));
        }
        let plan = self.plan(filter, image, mask)?;
        let snapshot = Snapshot::capture(image, plan.slices.clone());
        trace!(filter = key, state = %RunState::SnapshotAcquired, "preview opened");

        Ok(PreviewSession {
            runner: self,
            filter,
            image,
            plan,
            snapshot: Some(snapshot),
            params: None,
        })
    }

    fn context<T: Pixel>(&self, image: &Image<T>) -> FilterContext {
        FilterContext {
            range: image.range(),
            boundary: self.config.boundary,
            truncate: self.config.truncate,
        }
    }

    /// Checks that must pass before any buffer is copied or written.
    fn plan<'m, T: Pixel>(
        &self,
        filter: &dyn Filter,
        image: &Image<T>,
        mask: Option<&'m Mask>,
    ) -> FilterResult<Plan<'m>> {
        let caps = filter.capabilities();
        if image.depth() == 0 {
            return Err(FilterError::ShapeMismatch(format!(
                "`{}` needs at least one slice",
                filter.key()
            )));
        }
        if !caps.accepts(T::KIND) {
            return Err(FilterError::Unsupported(format!(
                "`{}` does not accept {} images",
                filter.key(),
                T::KIND.name()
            )));
        }

        let mask = match mask {
            Some(m) => {
                m.check_shape(image.plane_shape())?;
                if caps.contains(Capabilities::AUTO_MASK) {
                    Some(m)
                } else {
                    warn!(filter = filter.key(), "filter lacks auto-mask, mask ignored");
                    None
                }
            }
            None => None,
        };

        let volume = caps.contains(Capabilities::STACK_3D) && image.is_stack();
        let slices = if volume {
            0..image.depth()
        } else {
            match self.config.stack_mode {
                StackMode::AllSlices => 0..image.depth(),
                StackMode::CurrentSlice => {
                    let current = image.current_slice();
                    current..current + 1
                }
            }
        };
        debug!(
            filter = filter.key(),
            volume,
            slices = ?slices,
            masked = mask.is_some(),
            "dispatch"
        );

        let cast = if caps.contains(Capabilities::WIDE_INTERMEDIATE) {
            self.config.cast
        } else {
            CastPolicy::Saturate
        };
        Ok(Plan { slices, volume, mask, cast })
    }

    /// Compute from `snapshot`, then cast and merge into `image`.
    ///
    /// The image is only written after every slice computed successfully and
    /// the cast accepted the whole result.
    fn execute<T: Pixel>(
        &self,
        filter: &dyn Filter,
        plan: &Plan<'_>,
        snapshot: &Snapshot<T>,
        image: &mut Image<T>,
        params: &ParameterSet,
    ) -> FilterResult<()> {
        let ctx = self.context(image);
        trace!(filter = filter.key(), state = %RunState::Applying);

        let source: Array3<f64> = snapshot.view().mapv(Pixel::to_f64);
        let mut working = Array3::<f64>::zeros(source.raw_dim());

        if plan.volume {
            filter.apply_volume(&ctx, source.view(), working.view_mut(), params)?;
        } else {
            let planes: Vec<(ArrayView2<'_, f64>, ArrayViewMut2<'_, f64>)> = source
                .axis_iter(Axis(0))
                .zip(working.axis_iter_mut(Axis(0)))
                .collect();
            let apply = |(src, dst)| filter.apply(&ctx, src, dst, params);
            if self.config.parallel_slices && planes.len() > 1 {
                planes.into_par_iter().try_for_each(apply)?;
            } else {
                planes.into_iter().try_for_each(apply)?;
            }
        }

        let mut region = image.region_mut(plan.slices.clone());
        plan.cast.store(working.view(), region.view_mut(), filter.key())?;

        if let Some(mask) = plan.mask {
            for (dst, original) in region.axis_iter_mut(Axis(0)).zip(snapshot.view().axis_iter(Axis(0))) {
                mask.merge(dst, original);
            }
        }
        Ok(())
    }
}

impl Default for FilterRunner {
    fn default() -> Self {
        FilterRunner {
            config: RunnerConfig::default(),
            catalog: Catalog::builtin(),
        }
    }
}

fn discard<T: Pixel>(key: &str, snapshot: &Snapshot<T>, image: &mut Image<T>) {
    if let Err(err) = snapshot.restore_into(image) {
        warn!(filter = key, error = %err, "restore after failure did not fit the image");
    }
    debug!(filter = key, state = %RunState::Discarded);
}

// ============================================================================
// Preview
// ============================================================================

/// Live preview bound to one snapshot of one image.
///
/// Each [`update`](Self::update) recomputes from the snapshot, so the latest
/// parameters always win. [`commit`](Self::commit) keeps the current preview,
/// [`cancel`](Self::cancel) or dropping the session restores the image
/// bit-for-bit.
pub struct PreviewSession<'a, T: Pixel> {
    runner: &'a FilterRunner,
    filter: &'a dyn Filter,
    image: &'a mut Image<T>,
    plan: Plan<'a>,
    snapshot: Option<Snapshot<T>>,
    params: Option<ParameterSet>,
}

impl<'a, T: Pixel> PreviewSession<'a, T> {
    /// Re-apply with new parameters.
    ///
    /// On failure the image is restored to the snapshot and the error returned;
    /// the session stays open.
    pub fn update(&mut self, raw: &RawParameters) -> FilterResult<()> {
        let snapshot = self
            .snapshot
            .as_ref()
            .ok_or_else(|| FilterError::Unsupported("preview already closed".to_string()))?;
        let key = self.filter.key();

        let result = self.filter.schema().resolve(raw).and_then(|params| {
            self.runner
                .execute(self.filter, &self.plan, snapshot, self.image, &params)
                .map(|()| params)
        });
        match result {
            Ok(params) => {
                trace!(filter = key, "preview updated");
                self.params = Some(params);
                Ok(())
            }
            Err(err) => {
                discard(key, snapshot, self.image);
                self.params = None;
                Err(err)
            }
        }
    }

    /// Parameters of the preview currently shown, if any.
    pub fn params(&self) -> Option<&ParameterSet> {
        self.params.as_ref()
    }

    /// The image as currently previewed.
    pub fn image(&self) -> &Image<T> {
        &*self.image
    }

    /// Keep the current preview. With no successful update yet, the filter
    /// runs once with its defaults.
    pub fn commit(mut self) -> FilterResult<Applied<T>> {
        if self.params.is_none() {
            self.update(&RawParameters::new())?;
        }
        let params = self.params.take().unwrap_or_default();
        let snapshot = self.snapshot.take();
        debug!(filter = self.filter.key(), state = %RunState::Committed, "preview committed");
        Ok(Applied {
            filter: self.filter.key(),
            params,
            slices: self.plan.slices.clone(),
            undo: snapshot.filter(|_| self.filter.has(Capabilities::AUTO_SNAPSHOT)),
        })
    }

    /// Drop the preview and restore the image.
    pub fn cancel(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            discard(self.filter.key(), &snapshot, self.image);
        }
    }
}

impl<T: Pixel> Drop for PreviewSession<'_, T> {
    fn drop(&mut self) {
        self.restore();
    }
}
