//! Multidimensional neighborhood operators on `f64` arrays.
//!
//! The operators work on any dimensionality unless noted: the runner feeds
//! them 2D planes for per-slice filters and the full 3D volume for stack
//! filters. Each one reads an input view and writes a distinct output view.
//!
//! ## Operators
//!
//! - Linear: [`correlate1d`], [`gaussian_filter`], [`uniform_filter`],
//!   [`laplace`], [`gaussian_laplace`], [`prewitt`], [`sobel`]
//! - Order statistics: [`minimum_filter`], [`maximum_filter`] (any ndim),
//!   [`rank_filter`], [`median_filter`], [`percentile_filter`] (2D)
//!
//! Out-of-bounds samples follow a [`BoundaryMode`], `Reflect` by default.

mod boundary;
mod convolve;
mod kernels;
mod rank;

pub use boundary::BoundaryMode;
pub use convolve::{
    correlate1d, gaussian_filter, gaussian_filter1d, gaussian_filter_orders, gaussian_laplace,
    laplace, prewitt, sobel, uniform_filter,
};
pub use kernels::{gaussian_kernel_1d, gaussian_radius, Derivative};
pub use rank::{maximum_filter, median_filter, minimum_filter, percentile_filter, rank_filter};
