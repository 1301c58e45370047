//! Boundary extension shared by every neighborhood operation.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// How samples outside the array are synthesised.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
    /// `d c b a | a b c d | d c b a` (half-sample symmetric)
    #[default]
    Reflect,
    /// `a a a a | a b c d | d d d d`
    Nearest,
    /// `d c b | a b c d | c b a` (whole-sample symmetric)
    Mirror,
    /// `a b c d | a b c d | a b c d`
    Wrap,
    /// `k k k k | a b c d | k k k k`
    Constant(f64),
}

impl BoundaryMode {
    /// Map `index` into `0..len`. `None` means "use the constant".
    pub fn resolve(self, index: isize, len: usize) -> Option<usize> {
        let n = len as isize;
        if (0..n).contains(&index) {
            return Some(index as usize);
        }
        if n == 0 {
            return None;
        }
        let i = match self {
            BoundaryMode::Constant(_) => return None,
            BoundaryMode::Nearest => index.clamp(0, n - 1),
            BoundaryMode::Wrap => index.rem_euclid(n),
            BoundaryMode::Reflect => {
                let period = 2 * n;
                let m = index.rem_euclid(period);
                if m >= n {
                    period - 1 - m
                } else {
                    m
                }
            }
            BoundaryMode::Mirror => {
                if n == 1 {
                    0
                } else {
                    let period = 2 * n - 2;
                    let m = index.rem_euclid(period);
                    if m >= n {
                        period - m
                    } else {
                        m
                    }
                }
            }
        };
        Some(i as usize)
    }

    /// Sample `line[index]` with boundary extension.
    #[inline]
    pub fn sample(self, line: &ArrayView1<'_, f64>, index: isize) -> f64 {
        match self.resolve(index, line.len()) {
            Some(i) => line[i],
            None => self.constant(),
        }
    }

    /// Fill `buf` with `line` padded by `before` and `after` extension samples.
    pub fn extend_line(self, line: ArrayView1<'_, f64>, before: usize, after: usize, buf: &mut Vec<f64>) {
        buf.clear();
        if line.is_empty() {
            return;
        }
        let len = line.len() as isize;
        buf.reserve(line.len() + before + after);
        for i in -(before as isize)..0 {
            buf.push(self.sample(&line, i));
        }
        buf.extend(line.iter().copied());
        for i in len..len + after as isize {
            buf.push(self.sample(&line, i));
        }
    }

    fn constant(self) -> f64 {
        match self {
            BoundaryMode::Constant(v) => v,
            _ => 0.0,
        }
    }
}
