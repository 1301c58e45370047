//! Classic Image Filters
//!
//! Neighborhood, rank and composite filters (Gaussian, median, Sobel, DOG,
//! unsharp mask, ...) behind a uniform execution model, with Python bindings
//! via PyO3 and WASM bindings for JavaScript.
//!
//! ## Image Format
//! An [`Image`] is a `(slices, height, width)` scalar buffer; a plain 2D image
//! has one slice. Storage types:
//! - `u8`, `u16`, `i16`, `i32`: declared range defaults to the type range
//! - `f32`, `f64`: declared range defaults to `[0, 1]`
//!
//! ## Execution Model
//! A [`FilterRunner`] takes a snapshot of the processed slices, lets the
//! [`Filter`] compute from an `f64` copy of it into a separate buffer, casts
//! the result back under a [`CastPolicy`], restores unmasked pixels, and
//! either commits or restores the snapshot. [`PreviewSession`] re-applies
//! against one snapshot while parameters change.
//!
//! ```no_run
//! use classic_filters::{FilterRunner, Image, RawParameters};
//! use ndarray::Array2;
//!
//! let runner = FilterRunner::default();
//! let mut image = Image::from_plane(Array2::<u8>::zeros((64, 64)));
//! let params = RawParameters::new().with("sigma", 1.5);
//! let outcome = runner.invoke("gaussian", &mut image, None, &params);
//! assert!(outcome.is_committed());
//! ```

pub mod cast;
pub mod config;
pub mod error;
pub mod filters;
pub mod image;
pub mod ndimage;
pub mod params;
pub mod runner;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use cast::CastPolicy;
pub use config::{RunnerConfig, StackMode};
pub use error::{FilterError, FilterResult};
pub use filters::{Capabilities, Catalog, Filter, FilterContext, FilterGroup, MenuEntry};
pub use image::{Image, Mask, Pixel, PixelKind, Snapshot, ValueRange};
pub use ndimage::BoundaryMode;
pub use params::{ParamKind, ParamSchema, ParamSpec, ParamValue, ParameterSet, RawParameters};
pub use runner::{Applied, FilterOutcome, FilterRunner, PreviewSession, RunState};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use ndarray::{Array3, ArrayView3};
    use numpy::{Element, IntoPyArray, PyArray3, PyReadonlyArray2, PyReadonlyArray3};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;
    use pyo3::types::{PyBool, PyDict};

    use crate::{Catalog, FilterError, FilterRunner, Image, Mask, ParamValue, Pixel, RawParameters, RunnerConfig};

    fn to_py_err(err: FilterError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }

    /// Convert a Python dict into raw parameters. `bool` is tested before
    /// `int` because Python booleans are integers.
    fn raw_parameters(params: Option<&Bound<'_, PyDict>>) -> PyResult<RawParameters> {
        let mut raw = RawParameters::new();
        let Some(dict) = params else {
            return Ok(raw);
        };
        for (key, value) in dict.iter() {
            let key: String = key.extract()?;
            let value = if value.is_instance_of::<PyBool>() {
                ParamValue::Bool(value.extract()?)
            } else if let Ok(i) = value.extract::<i64>() {
                ParamValue::Int(i)
            } else if let Ok(f) = value.extract::<f64>() {
                ParamValue::Float(f)
            } else if let Ok(s) = value.extract::<String>() {
                ParamValue::Text(s)
            } else {
                return Err(PyValueError::new_err(format!(
                    "parameter `{}` must be bool, int, float or str",
                    key
                )));
            };
            raw.insert(&key, value);
        }
        Ok(raw)
    }

    fn apply_impl<T: Pixel>(
        key: &str,
        image: ArrayView3<'_, T>,
        params: Option<&Bound<'_, PyDict>>,
        mask: Option<PyReadonlyArray2<'_, bool>>,
        config: Option<&str>,
    ) -> PyResult<Array3<T>> {
        let config = match config {
            Some(json) => RunnerConfig::from_json(json).map_err(to_py_err)?,
            None => RunnerConfig::default(),
        };
        let runner = FilterRunner::new(config).map_err(to_py_err)?;
        let raw = raw_parameters(params)?;
        let mask = mask.map(|m| Mask::new(m.as_array().to_owned()));

        let mut img = Image::from_stack(image.to_owned());
        runner
            .invoke(key, &mut img, mask.as_ref(), &raw)
            .into_result()
            .map_err(to_py_err)?;
        Ok(img.into_inner())
    }

    fn to_numpy<'py, T: Pixel + Element>(py: Python<'py>, data: Array3<T>) -> Bound<'py, PyArray3<T>> {
        data.into_pyarray(py)
    }

    // ========================================================================
    // Filter application
    // ========================================================================

    /// Apply a catalog filter to a (slices, height, width) u8 array.
    ///
    /// Raises ValueError for unknown filters, invalid parameters, mask shape
    /// mismatches and rejected casts.
    #[pyfunction]
    #[pyo3(signature = (key, image, params=None, mask=None, config=None))]
    pub fn apply_filter_u8<'py>(
        py: Python<'py>,
        key: &str,
        image: PyReadonlyArray3<'py, u8>,
        params: Option<&Bound<'py, PyDict>>,
        mask: Option<PyReadonlyArray2<'py, bool>>,
        config: Option<&str>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let result = apply_impl(key, image.as_array(), params, mask, config)?;
        Ok(to_numpy(py, result))
    }

    /// Apply a catalog filter to a (slices, height, width) u16 array.
    #[pyfunction]
    #[pyo3(signature = (key, image, params=None, mask=None, config=None))]
    pub fn apply_filter_u16<'py>(
        py: Python<'py>,
        key: &str,
        image: PyReadonlyArray3<'py, u16>,
        params: Option<&Bound<'py, PyDict>>,
        mask: Option<PyReadonlyArray2<'py, bool>>,
        config: Option<&str>,
    ) -> PyResult<Bound<'py, PyArray3<u16>>> {
        let result = apply_impl(key, image.as_array(), params, mask, config)?;
        Ok(to_numpy(py, result))
    }

    /// Apply a catalog filter to a (slices, height, width) i16 array.
    #[pyfunction]
    #[pyo3(signature = (key, image, params=None, mask=None, config=None))]
    pub fn apply_filter_i16<'py>(
        py: Python<'py>,
        key: &str,
        image: PyReadonlyArray3<'py, i16>,
        params: Option<&Bound<'py, PyDict>>,
        mask: Option<PyReadonlyArray2<'py, bool>>,
        config: Option<&str>,
    ) -> PyResult<Bound<'py, PyArray3<i16>>> {
        let result = apply_impl(key, image.as_array(), params, mask, config)?;
        Ok(to_numpy(py, result))
    }

    /// Apply a catalog filter to a (slices, height, width) f32 array (range 0.0-1.0).
    #[pyfunction]
    #[pyo3(signature = (key, image, params=None, mask=None, config=None))]
    pub fn apply_filter_f32<'py>(
        py: Python<'py>,
        key: &str,
        image: PyReadonlyArray3<'py, f32>,
        params: Option<&Bound<'py, PyDict>>,
        mask: Option<PyReadonlyArray2<'py, bool>>,
        config: Option<&str>,
    ) -> PyResult<Bound<'py, PyArray3<f32>>> {
        let result = apply_impl(key, image.as_array(), params, mask, config)?;
        Ok(to_numpy(py, result))
    }

    /// Apply a catalog filter to a (slices, height, width) f64 array (range 0.0-1.0).
    #[pyfunction]
    #[pyo3(signature = (key, image, params=None, mask=None, config=None))]
    pub fn apply_filter_f64<'py>(
        py: Python<'py>,
        key: &str,
        image: PyReadonlyArray3<'py, f64>,
        params: Option<&Bound<'py, PyDict>>,
        mask: Option<PyReadonlyArray2<'py, bool>>,
        config: Option<&str>,
    ) -> PyResult<Bound<'py, PyArray3<f64>>> {
        let result = apply_impl(key, image.as_array(), params, mask, config)?;
        Ok(to_numpy(py, result))
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Titles, capability flags and parameter schemas of every filter, as JSON.
    #[pyfunction]
    pub fn filter_catalog_json() -> PyResult<String> {
        Catalog::builtin().to_json().map_err(to_py_err)
    }

    /// Python module definition
    #[pymodule]
    pub fn classic_filters(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(apply_filter_u8, m)?)?;
        m.add_function(wrap_pyfunction!(apply_filter_u16, m)?)?;
        m.add_function(wrap_pyfunction!(apply_filter_i16, m)?)?;
        m.add_function(wrap_pyfunction!(apply_filter_f32, m)?)?;
        m.add_function(wrap_pyfunction!(apply_filter_f64, m)?)?;
        m.add_function(wrap_pyfunction!(filter_catalog_json, m)?)?;
        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::classic_filters;
