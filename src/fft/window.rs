//! Window functions applied to a buffer before the transform.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::fft::{Direction, Sample};

/// The supported weighting functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowKind {
    /// Box car, all factors are one.
    Rectangle,
    /// Hamming.
    Hamming,
    /// Hann (raised cosine).
    Hann,
    /// Triangle (Bartlett).
    Triangle,
    /// Nuttall.
    Nuttall,
    /// Blackman.
    Blackman,
    /// Blackman-Nuttall.
    BlackmanNuttall,
    /// Blackman-Harris.
    BlackmanHarris,
    /// Flat top.
    FlatTop,
    /// Welch.
    Welch,
}

impl WindowKind {
    /// All window kinds.
    pub const ALL: [WindowKind; 10] = [
        Self::Rectangle,
        Self::Hamming,
        Self::Hann,
        Self::Triangle,
        Self::Nuttall,
        Self::Blackman,
        Self::BlackmanNuttall,
        Self::BlackmanHarris,
        Self::FlatTop,
        Self::Welch,
    ];
}

/// Compute the weighting factor of sample `index` in a window of `len` samples.
pub fn window_factor(kind: WindowKind, index: usize, len: usize) -> f64 {
    let i = index as f64;
    let nm1 = len.saturating_sub(1).max(1) as f64;
    let ratio = i / nm1;
    let c = |k: f64| (k * PI * ratio).cos();
    match kind {
        WindowKind::Rectangle => 1.0,
        WindowKind::Hamming => 0.54 - 0.46 * c(2.0),
        WindowKind::Hann => 0.5 * (1.0 - c(2.0)),
        WindowKind::Triangle => 1.0 - (2.0 * (i - nm1 / 2.0).abs()) / nm1,
        WindowKind::Nuttall => 0.355768 - 0.487396 * c(2.0) + 0.144232 * c(4.0) - 0.012604 * c(6.0),
        WindowKind::Blackman => 0.42323 - 0.49755 * c(2.0) + 0.07922 * c(4.0),
        WindowKind::BlackmanNuttall => {
            0.3635819 - 0.4891775 * c(2.0) + 0.1365995 * c(4.0) - 0.0106411 * c(6.0)
        }
        WindowKind::BlackmanHarris => {
            0.35875 - 0.48829 * c(2.0) + 0.14128 * c(4.0) - 0.01168 * c(6.0)
        }
        WindowKind::FlatTop => 0.2810639 - 0.5208972 * c(2.0) + 0.1980399 * c(4.0),
        WindowKind::Welch => {
            let half = nm1 / 2.0;
            1.0 - ((i - half) / half).powi(2)
        }
    }
}

/// Weight `data` in place, multiplying in the forward direction and dividing in the inverse
/// direction.
///
/// Only the first half of the factors is computed; sample `i` and its mirror `N - 1 - i`
/// share a factor. In the inverse direction samples whose factor is exactly zero are left
/// untouched.
///
/// # Panics
///
/// Panics if `data.len() != 1 << log2n`.
pub fn apply_window(data: &mut [Sample], log2n: u32, kind: WindowKind, direction: Direction) {
    let n = 1usize << log2n;
    assert_eq!(data.len(), n, "buffer length must be 2^{}", log2n);
    for i in 0..n / 2 {
        let factor = window_factor(kind, i, n) as f32;
        let mirror = n - (i + 1);
        match direction {
            Direction::Forward => {
                data[i] *= factor;
                data[mirror] *= factor;
            }
            Direction::Inverse if factor != 0.0 => {
                data[i] /= factor;
                data[mirror] /= factor;
            }
            Direction::Inverse => {}
        }
    }
}
