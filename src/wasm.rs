//! WebAssembly exports for the classic filters.
//!
//! These functions are exposed to JavaScript via wasm-bindgen. Canvas pixels
//! are converted to a single 8-bit grayscale plane by the caller.

use ndarray::Array2;
use wasm_bindgen::prelude::*;

use crate::{Catalog, FilterError, FilterRunner, Image, RawParameters};

fn to_js(err: FilterError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// ============================================================================
// Filter application - u8 grayscale
// ============================================================================

/// Apply a catalog filter to an 8-bit grayscale image.
///
/// # Arguments
/// * `key` - Catalog key, e.g. `"gaussian"` or `"unsharp_mask"`
/// * `data` - Flat array of gray bytes (length = width * height)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `params_json` - JSON object of parameters; `""` uses the defaults
///
/// # Returns
/// Flat array of filtered gray bytes, or an error message
#[wasm_bindgen]
pub fn apply_filter_gray_u8_wasm(
    key: &str,
    data: &[u8],
    width: usize,
    height: usize,
    params_json: &str,
) -> Result<Vec<u8>, JsValue> {
    let plane = Array2::from_shape_vec((height, width), data.to_vec())
        .map_err(|e| JsValue::from_str(&format!("invalid dimensions: {}", e)))?;
    let raw = if params_json.trim().is_empty() {
        RawParameters::new()
    } else {
        RawParameters::from_json(params_json).map_err(to_js)?
    };

    let mut image = Image::from_plane(plane);
    FilterRunner::default()
        .invoke(key, &mut image, None, &raw)
        .into_result()
        .map_err(to_js)?;
    Ok(image.into_inner().into_raw_vec_and_offset().0)
}

// ============================================================================
// Catalog
// ============================================================================

/// Titles, capability flags and parameter schemas of every filter, as JSON.
#[wasm_bindgen]
pub fn filter_catalog_json_wasm() -> Result<String, JsValue> {
    Catalog::builtin().to_json().map_err(to_js)
}
