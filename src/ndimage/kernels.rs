//! 1D kernels for the separable operators.

/// Central first difference, correlated as `-x[i-1] + x[i+1]`.
pub const DERIVATIVE: [f64; 3] = [-1.0, 0.0, 1.0];

/// Discrete second difference used by the Laplacian.
pub const SECOND_DIFFERENCE: [f64; 3] = [1.0, -2.0, 1.0];

/// Cross-axis smoothing of the Prewitt operator.
pub const PREWITT_SMOOTH: [f64; 3] = [1.0, 1.0, 1.0];

/// Cross-axis smoothing of the Sobel operator.
pub const SOBEL_SMOOTH: [f64; 3] = [1.0, 2.0, 1.0];

/// Sigmas at or below this are treated as "no smoothing".
pub const SIGMA_EPSILON: f64 = 1e-15;

/// Derivative order of a Gaussian pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivative {
    Zero,
    First,
    Second,
}

/// Kernel half-width for `sigma` truncated at `truncate` standard deviations.
pub fn gaussian_radius(sigma: f64, truncate: f64) -> usize {
    (truncate * sigma + 0.5).floor().max(0.0) as usize
}

/// Sampled, normalised Gaussian (or its derivative), ready for correlation.
///
/// The smoothing kernel sums to one. Derivative kernels are the analytic
/// derivative of the normalised samples; they are reversed so that
/// correlating with them equals convolving with the derivative.
pub fn gaussian_kernel_1d(sigma: f64, order: Derivative, radius: usize) -> Vec<f64> {
    if sigma <= SIGMA_EPSILON {
        return vec![1.0];
    }

    let r = radius as isize;
    let sigma2 = sigma * sigma;
    let mut phi: Vec<f64> = (-r..=r)
        .map(|x| {
            let x = x as f64;
            (-0.5 * x * x / sigma2).exp()
        })
        .collect();

    // Normalize
    let sum: f64 = phi.iter().sum();
    for v in phi.iter_mut() {
        *v /= sum;
    }

    let mut kernel: Vec<f64> = match order {
        Derivative::Zero => phi,
        Derivative::First => (-r..=r)
            .zip(phi)
            .map(|(x, p)| -(x as f64) / sigma2 * p)
            .collect(),
        Derivative::Second => (-r..=r)
            .zip(phi)
            .map(|(x, p)| {
                let x = x as f64;
                (x * x / (sigma2 * sigma2) - 1.0 / sigma2) * p
            })
            .collect(),
    };
    kernel.reverse();
    kernel
}
