//! Scalar image buffers, masks and snapshots.
//!
//! An [`Image`] is always stored as a `(slices, height, width)` array; a plain
//! 2D image is a stack with a single slice. Filters never resize an image.

use std::fmt::Debug;
use std::ops::Range;

use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, ArrayViewMut2, ArrayViewMut3, Axis, Zip};
use serde::{Deserialize, Serialize};

use crate::error::{FilterError, FilterResult};

/// Numeric kind of a storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelKind {
    U8,
    U16,
    I16,
    I32,
    F32,
    F64,
}

impl PixelKind {
    pub fn is_integer(self) -> bool {
        !matches!(self, PixelKind::F32 | PixelKind::F64)
    }

    pub fn is_float(self) -> bool {
        !self.is_integer()
    }

    pub fn name(self) -> &'static str {
        match self {
            PixelKind::U8 => "u8",
            PixelKind::U16 => "u16",
            PixelKind::I16 => "i16",
            PixelKind::I32 => "i32",
            PixelKind::F32 => "f32",
            PixelKind::F64 => "f64",
        }
    }
}

/// Storage element of an image.
///
/// `saturate` and `wrap` are the only narrowing conversions in the crate; see
/// [`crate::cast::CastPolicy`].
pub trait Pixel: Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    const KIND: PixelKind;
    /// Smallest representable value.
    const MIN: f64;
    /// Largest representable value.
    const MAX: f64;
    /// Declared value range of a freshly created image of this type.
    const DEFAULT_RANGE: (f64, f64);

    fn to_f64(self) -> f64;

    /// Round half away from zero and clamp. NaN becomes zero for integers.
    fn saturate(value: f64) -> Self;

    /// Truncate toward zero and wrap modulo the type width.
    fn wrap(value: f64) -> Self;
}

macro_rules! impl_int_pixel {
    ($t:ty, $kind:expr) => {
        impl Pixel for $t {
            const KIND: PixelKind = $kind;
            const MIN: f64 = <$t>::MIN as f64;
            const MAX: f64 = <$t>::MAX as f64;
            const DEFAULT_RANGE: (f64, f64) = (<$t>::MIN as f64, <$t>::MAX as f64);

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn saturate(value: f64) -> Self {
                // float -> int `as` clamps and maps NaN to 0
                value.round() as $t
            }

            #[inline]
            fn wrap(value: f64) -> Self {
                if !value.is_finite() {
                    return 0;
                }
                (value.trunc() as i64) as $t
            }
        }
    };
}

impl_int_pixel!(u8, PixelKind::U8);
impl_int_pixel!(u16, PixelKind::U16);
impl_int_pixel!(i16, PixelKind::I16);
impl_int_pixel!(i32, PixelKind::I32);

impl Pixel for f32 {
    const KIND: PixelKind = PixelKind::F32;
    const MIN: f64 = f32::MIN as f64;
    const MAX: f64 = f32::MAX as f64;
    const DEFAULT_RANGE: (f64, f64) = (0.0, 1.0);

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn saturate(value: f64) -> Self {
        value.clamp(<Self as Pixel>::MIN, <Self as Pixel>::MAX) as f32
    }

    #[inline]
    fn wrap(value: f64) -> Self {
        value as f32
    }
}

impl Pixel for f64 {
    const KIND: PixelKind = PixelKind::F64;
    const MIN: f64 = f64::MIN;
    const MAX: f64 = f64::MAX;
    const DEFAULT_RANGE: (f64, f64) = (0.0, 1.0);

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn saturate(value: f64) -> Self {
        value.clamp(f64::MIN, f64::MAX)
    }

    #[inline]
    fn wrap(value: f64) -> Self {
        value
    }
}

/// Declared display range of an image, e.g. `[0, 255]` for 8-bit data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub low: f64,
    pub high: f64,
}

impl ValueRange {
    pub fn new(low: f64, high: f64) -> Self {
        ValueRange { low, high }
    }

    /// Midpoint of the declared range, used for mean re-centering.
    pub fn mean(&self) -> f64 {
        (self.low + self.high) / 2.0
    }
}

/// A 2D image or a 3D stack of equally sized slices.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<T: Pixel> {
    data: Array3<T>,
    range: ValueRange,
    current: usize,
}

impl<T: Pixel> Image<T> {
    /// Wrap a single 2D plane.
    pub fn from_plane(plane: Array2<T>) -> Self {
        Self::from_stack(plane.insert_axis(Axis(0)))
    }

    /// Wrap a `(slices, height, width)` stack.
    pub fn from_stack(data: Array3<T>) -> Self {
        let (low, high) = T::DEFAULT_RANGE;
        Image {
            data,
            range: ValueRange::new(low, high),
            current: 0,
        }
    }

    /// Override the declared value range.
    pub fn with_range(mut self, low: f64, high: f64) -> Self {
        self.range = ValueRange::new(low, high);
        self
    }

    /// Select the active slice used by current-slice processing.
    pub fn set_current_slice(&mut self, index: usize) -> FilterResult<()> {
        if index >= self.depth() {
            return Err(FilterError::ShapeMismatch(format!(
                "slice {} out of range for a stack of {}",
                index,
                self.depth()
            )));
        }
        self.current = index;
        Ok(())
    }

    pub fn current_slice(&self) -> usize {
        self.current
    }

    pub fn depth(&self) -> usize {
        self.data.dim().0
    }

    pub fn height(&self) -> usize {
        self.data.dim().1
    }

    pub fn width(&self) -> usize {
        self.data.dim().2
    }

    /// `(height, width)` of every slice.
    pub fn plane_shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    /// True for stacks with more than one slice.
    pub fn is_stack(&self) -> bool {
        self.depth() > 1
    }

    pub fn range(&self) -> ValueRange {
        self.range
    }

    pub fn kind(&self) -> PixelKind {
        T::KIND
    }

    pub fn data(&self) -> &Array3<T> {
        &self.data
    }

    pub fn plane(&self, index: usize) -> ArrayView2<'_, T> {
        self.data.index_axis(Axis(0), index)
    }

    pub fn into_inner(self) -> Array3<T> {
        self.data
    }

    pub(crate) fn region_mut(&mut self, slices: Range<usize>) -> ArrayViewMut3<'_, T> {
        self.data.slice_mut(s![slices, .., ..])
    }
}

/// Boolean region selecting which pixels a filter may modify.
///
/// The same mask applies to every slice of a stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    plane: Array2<bool>,
}

impl Mask {
    pub fn new(plane: Array2<bool>) -> Self {
        Mask { plane }
    }

    /// Rectangular selection `rows x cols` inside a `height x width` image.
    pub fn rect(height: usize, width: usize, rows: Range<usize>, cols: Range<usize>) -> Self {
        let mut plane = Array2::from_elem((height, width), false);
        let (r0, c0) = (rows.start.min(height), cols.start.min(width));
        let rows = r0..rows.end.clamp(r0, height);
        let cols = c0..cols.end.clamp(c0, width);
        plane.slice_mut(s![rows, cols]).fill(true);
        Mask { plane }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.plane.dim()
    }

    pub fn contains(&self, y: usize, x: usize) -> bool {
        self.plane.get((y, x)).copied().unwrap_or(false)
    }

    pub fn view(&self) -> ArrayView2<'_, bool> {
        self.plane.view()
    }

    pub(crate) fn check_shape(&self, plane_shape: (usize, usize)) -> FilterResult<()> {
        if self.shape() != plane_shape {
            return Err(FilterError::ShapeMismatch(format!(
                "mask {:?} vs image plane {:?}",
                self.shape(),
                plane_shape
            )));
        }
        Ok(())
    }

    /// Restore every unmasked pixel of `dst` from `original`.
    pub(crate) fn merge<T: Pixel>(&self, mut dst: ArrayViewMut2<'_, T>, original: ArrayView2<'_, T>) {
        Zip::from(&mut dst)
            .and(&original)
            .and(&self.plane)
            .for_each(|d, &o, &inside| {
                if !inside {
                    *d = o;
                }
            });
    }
}

/// Immutable pre-filter copy of the processed slices.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T: Pixel> {
    data: Array3<T>,
    first: usize,
}

impl<T: Pixel> Snapshot<T> {
    pub(crate) fn capture(image: &Image<T>, slices: Range<usize>) -> Self {
        let first = slices.start;
        Snapshot {
            data: image.data.slice(s![slices, .., ..]).to_owned(),
            first,
        }
    }

    /// Slice indices of the image this snapshot covers.
    pub fn slices(&self) -> Range<usize> {
        self.first..self.first + self.data.dim().0
    }

    pub fn view(&self) -> ArrayView3<'_, T> {
        self.data.view()
    }

    /// Plane `index`, relative to the first captured slice.
    pub fn plane(&self, index: usize) -> ArrayView2<'_, T> {
        self.data.index_axis(Axis(0), index)
    }

    /// Copy the captured slices back into `image`.
    pub fn restore_into(&self, image: &mut Image<T>) -> FilterResult<()> {
        let slices = self.slices();
        if slices.end > image.depth() || image.plane_shape() != (self.data.dim().1, self.data.dim().2) {
            return Err(FilterError::ShapeMismatch(format!(
                "snapshot {:?} does not fit image {:?}",
                self.data.dim(),
                image.data.dim()
            )));
        }
        image.region_mut(slices).assign(&self.data);
        Ok(())
    }
}
