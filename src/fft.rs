//! In-place iterative radix-2 FFT over complex single-precision buffers.
//!
//! The transform runs in two passes: a bit-reversal permutation followed by the
//! decimation-in-time butterflies. Buffers must hold exactly `2^log2n` samples.
//! No `1/N` scaling is applied in either direction, see [`normalize`].

use std::f64::consts::PI;

use num::Complex;

pub mod window;

/// A single acquired sample, or one bin of a spectrum.
pub type Sample = Complex<f32>;

/// The sign of the exponent in the transform kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Time to frequency domain, kernel uses `exp(-i·2π/m)`.
    Forward,
    /// Frequency to time domain, kernel uses `exp(+i·2π/m)`.
    Inverse,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Self::Forward => -1.0,
            Self::Inverse => 1.0,
        }
    }
}

/// Transform `data` in place.
///
/// # Panics
///
/// Panics if `data.len() != 1 << log2n`.
pub fn transform(data: &mut [Sample], log2n: u32, direction: Direction) {
    bit_reverse(data, log2n);
    evaluate(data, log2n, direction);
}

/// Reorder `data` so that the element at index `i` moves to the bit-reversal of `i` over
/// `log2n` bits.
///
/// The next swap target is derived from the previous one: incrementing `i` flips a run of
/// least-significant bits, so the reversed counter `j` flips the mirrored run of
/// most-significant bits. Applying the permutation twice restores the original order.
///
/// # Panics
///
/// Panics if `data.len() != 1 << log2n`.
pub fn bit_reverse(data: &mut [Sample], log2n: u32) {
    let n = length(data, log2n);
    let nd2 = n >> 1;
    let nm1 = n - 1;
    let mut j = 0usize;
    for i in 0..n {
        if j > i {
            data.swap(i, j);
        }
        // Least significant zero bit of `i`, mirrored into the most significant position.
        let lszb = !i & (i + 1);
        let mszb = nd2 / lszb;
        j ^= nm1 & !mszb.wrapping_sub(1);
    }
}

/// Run the butterfly stages over an already bit-reversed buffer.
///
/// The stage twiddle `Wm` is computed once in double precision and the per-butterfly
/// rotation `Wmk` is accumulated by repeated multiplication.
///
/// # Panics
///
/// Panics if `data.len() != 1 << log2n`.
pub fn evaluate(data: &mut [Sample], log2n: u32, direction: Direction) {
    let n = length(data, log2n);
    let theta_2pi = direction.sign() * 2.0 * PI;
    for r in 1..=log2n {
        let m = 1usize << r;
        let md2 = m >> 1;
        let theta = theta_2pi / m as f64;
        let wm = Complex::new(theta.cos(), theta.sin());
        for start in (0..n).step_by(m) {
            let mut wmk = Complex::new(1.0f64, 0.0);
            for k in 0..md2 {
                let even = start + k;
                let odd = even + md2;
                let t = wmk * widen(data[odd]);
                let e = widen(data[even]);
                data[odd] = narrow(e - t);
                data[even] = narrow(e + t);
                wmk *= wm;
            }
        }
    }
}

/// Divide every element by the buffer length, turning an unscaled inverse transform into a
/// true inverse of [`transform`] in the forward direction.
pub fn normalize(data: &mut [Sample]) {
    let scale = 1.0 / data.len() as f32;
    data.iter_mut().for_each(|x| *x *= scale);
}

fn length(data: &[Sample], log2n: u32) -> usize {
    let n = 1usize << log2n;
    assert_eq!(
        data.len(),
        n,
        "buffer length must be 2^{} (want {}, but got {})",
        log2n,
        n,
        data.len()
    );
    n
}

fn widen(x: Sample) -> Complex<f64> {
    Complex::new(f64::from(x.re), f64::from(x.im))
}

fn narrow(x: Complex<f64>) -> Sample {
    Complex::new(x.re as f32, x.im as f32)
}
