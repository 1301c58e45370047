//! The single explicit cast from f64 working planes back to storage types.
//!
//! Filters compute on f64 planes so intermediate sums and differences never
//! wrap. Narrowing happens exactly once, here, under a [`CastPolicy`].

use ndarray::{ArrayView, ArrayViewMut, Dimension, Zip};
use serde::{Deserialize, Serialize};

use crate::error::{FilterError, FilterResult};
use crate::image::Pixel;

/// How out-of-range results are stored into the destination type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastPolicy {
    /// Round half away from zero and clamp into the representable range.
    #[default]
    Saturate,
    /// Truncate toward zero and wrap modulo the type width (two's complement).
    Wrap,
    /// Fail with [`FilterError::NumericOverflow`] instead of narrowing.
    Reject,
}

impl CastPolicy {
    /// Cast one working value. `Err` carries the value that `Reject` refused.
    #[inline]
    pub fn cast<T: Pixel>(self, value: f64) -> Result<T, f64> {
        match self {
            CastPolicy::Saturate => Ok(T::saturate(value)),
            CastPolicy::Wrap => Ok(T::wrap(value)),
            CastPolicy::Reject => {
                if fits::<T>(value) {
                    Ok(T::saturate(value))
                } else {
                    Err(value)
                }
            }
        }
    }

    /// Store a whole working plane into `dst`.
    ///
    /// With `Reject` the plane is scanned first so `dst` is untouched on error.
    pub fn store<T, D>(
        self,
        src: ArrayView<'_, f64, D>,
        mut dst: ArrayViewMut<'_, T, D>,
        filter: &str,
    ) -> FilterResult<()>
    where
        T: Pixel,
        D: Dimension,
    {
        if src.shape() != dst.shape() {
            return Err(FilterError::ShapeMismatch(format!(
                "working plane {:?} vs destination {:?}",
                src.shape(),
                dst.shape()
            )));
        }

        if self == CastPolicy::Reject {
            if let Some(&bad) = src.iter().find(|&&v| !fits::<T>(v)) {
                return Err(FilterError::NumericOverflow {
                    filter: filter.to_string(),
                    value: bad,
                });
            }
        }

        Zip::from(&mut dst).and(&src).for_each(|d, &s| {
            *d = match self {
                CastPolicy::Wrap => T::wrap(s),
                _ => T::saturate(s),
            };
        });
        Ok(())
    }
}

/// Whether `value` survives a saturating cast unchanged (up to rounding).
#[inline]
fn fits<T: Pixel>(value: f64) -> bool {
    if !value.is_finite() {
        return false;
    }
    let v = if T::KIND.is_integer() { value.round() } else { value };
    v >= T::MIN && v <= T::MAX
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array1};

    #[test]
    fn test_saturate_rounds_and_clamps_u8() {
        assert_eq!(CastPolicy::Saturate.cast::<u8>(-12.0), Ok(0));
        assert_eq!(CastPolicy::Saturate.cast::<u8>(300.0), Ok(255));
        assert_eq!(CastPolicy::Saturate.cast::<u8>(2.5), Ok(3));
        assert_eq!(CastPolicy::Saturate.cast::<u8>(f64::NAN), Ok(0));
    }

    #[test]
    fn test_wrap_is_twos_complement() {
        assert_eq!(CastPolicy::Wrap.cast::<u8>(-1.0), Ok(255));
        assert_eq!(CastPolicy::Wrap.cast::<u8>(257.9), Ok(1));
        assert_eq!(CastPolicy::Wrap.cast::<i16>(32768.0), Ok(-32768));
        assert_eq!(CastPolicy::Wrap.cast::<u16>(-2.7), Ok(65534));
    }

    #[test]
    fn test_reject_reports_value() {
        assert_eq!(CastPolicy::Reject.cast::<u8>(256.0), Err(256.0));
        assert_eq!(CastPolicy::Reject.cast::<u8>(254.6), Ok(255));
        assert_eq!(CastPolicy::Reject.cast::<f32>(f64::INFINITY), Err(f64::INFINITY));
    }

    #[test]
    fn test_float_saturate_keeps_fraction() {
        assert_eq!(CastPolicy::Saturate.cast::<f32>(0.25), Ok(0.25f32));
        assert_eq!(CastPolicy::Saturate.cast::<f32>(1e300), Ok(f32::MAX));
    }

    #[test]
    fn test_store_reject_leaves_destination() {
        let src = arr1(&[1.0, 2.0, -3.0]);
        let mut dst = Array1::<u8>::from_elem(3, 9);
        let err = CastPolicy::Reject
            .store(src.view(), dst.view_mut(), "laplace")
            .unwrap_err();
        assert!(matches!(err, FilterError::NumericOverflow { value, .. } if value == -3.0));
        assert_eq!(dst, arr1(&[9u8, 9, 9]));
    }

    #[test]
    fn test_store_shape_mismatch() {
        let src = arr1(&[1.0, 2.0]);
        let mut dst = Array1::<u8>::zeros(3);
        let err = CastPolicy::Saturate
            .store(src.view(), dst.view_mut(), "gaussian")
            .unwrap_err();
        assert!(matches!(err, FilterError::ShapeMismatch(_)));
    }
}
