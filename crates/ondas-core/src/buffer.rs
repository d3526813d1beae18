//! Growable sample buffer with element-wise math.
//!
//! [`Buffer`] is the unit of batch processing in ondas: a heap-allocated
//! vector of `f64` samples with the arithmetic and reductions that filter
//! design and spectral analysis need.
//!
//! Element-wise binary operators pair samples up to the length of the
//! *shorter* operand; the tail of the longer operand is ignored. This
//! matches how parameter buffers are applied to signals elsewhere in the
//! toolkit.
//!
//! # Example
//!
//! ```rust
//! use ondas_core::Buffer;
//!
//! let a = Buffer::from_vec(vec![1.0, 2.0, 3.0]);
//! let b = Buffer::ones(3);
//!
//! let sum = &a + &b;
//! assert_eq!(sum.as_slice(), &[2.0, 3.0, 4.0]);
//! assert_eq!(a.sum(), 6.0);
//! ```

#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use core::ops::{Add, BitXor, BitXorAssign, Div, Index, IndexMut, Mul, Sub};

use libm::{exp, fabs, log, log10, pow, round, sin, sqrt};

use crate::window::Window;

/// Growable `f64` sample vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buffer {
    data: Vec<f64>,
}

impl Buffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Create an empty buffer with room for `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Create a buffer from an existing vector without copying.
    pub fn from_vec(data: Vec<f64>) -> Self {
        Self { data }
    }

    /// Create a buffer of `n` zeros.
    pub fn zeros(n: usize) -> Self {
        Self {
            data: vec![0.0; n],
        }
    }

    /// Create a buffer of `n` ones.
    pub fn ones(n: usize) -> Self {
        Self {
            data: vec![1.0; n],
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append one sample.
    #[inline]
    pub fn push(&mut self, x: f64) {
        self.data.push(x);
    }

    /// Append all samples of `other`.
    pub fn extend(&mut self, other: &Buffer) {
        self.data.extend_from_slice(&other.data);
    }

    /// View the samples as a slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// View the samples as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consume the buffer, returning the underlying vector.
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Iterate over samples.
    pub fn iter(&self) -> core::slice::Iter<'_, f64> {
        self.data.iter()
    }

    /// Iterate mutably over samples.
    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, f64> {
        self.data.iter_mut()
    }

    /// Sample at `index`, or `None` when out of range.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.data.get(index).copied()
    }

    /// Copy of `n` samples starting at `offset`. Clamped to the buffer end,
    /// so the result may be shorter than `n`.
    pub fn subbuffer(&self, offset: usize, n: usize) -> Buffer {
        if offset >= self.data.len() {
            return Buffer::new();
        }
        let end = (offset + n).min(self.data.len());
        Buffer::from_vec(self.data[offset..end].to_vec())
    }

    /// Reverse the sample order in place.
    pub fn reverse(&mut self) {
        self.data.reverse();
    }

    /// Replace each sample with its absolute value.
    pub fn abs(&mut self) {
        for x in &mut self.data {
            *x = fabs(*x);
        }
    }

    /// Replace each sample with its square root.
    pub fn sqrt(&mut self) {
        for x in &mut self.data {
            *x = sqrt(*x);
        }
    }

    /// Replace each sample `x` with `e^x`.
    pub fn exp(&mut self) {
        for x in &mut self.data {
            *x = exp(*x);
        }
    }

    /// Replace each sample with its natural log.
    pub fn log(&mut self) {
        for x in &mut self.data {
            *x = log(*x);
        }
    }

    /// Replace each sample with its base-10 log.
    pub fn log10(&mut self) {
        for x in &mut self.data {
            *x = log10(*x);
        }
    }

    /// Sum of all samples. Zero for an empty buffer.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Arithmetic mean. Zero for an empty buffer.
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.sum() / self.data.len() as f64
    }

    /// Population standard deviation. Zero for an empty buffer.
    pub fn std_dev(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let var = self
            .data
            .iter()
            .map(|x| (x - mean) * (x - mean))
            .sum::<f64>()
            / self.data.len() as f64;
        sqrt(var)
    }

    /// Largest sample. `-inf` for an empty buffer.
    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Smallest sample. `+inf` for an empty buffer.
    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Largest absolute value. Zero for an empty buffer.
    pub fn max_magnitude(&self) -> f64 {
        self.data.iter().fold(0.0, |m, &x| f64::max(m, fabs(x)))
    }

    /// Index of the largest sample, or `None` for an empty buffer.
    pub fn find_max(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &x) in self.data.iter().enumerate() {
            match best {
                Some((_, b)) if x <= b => {}
                _ => best = Some((i, x)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// Index of the smallest sample, or `None` for an empty buffer.
    pub fn find_min(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &x) in self.data.iter().enumerate() {
            match best {
                Some((_, b)) if x >= b => {}
                _ => best = Some((i, x)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// Scale so the largest absolute value becomes 1.0. Silence is left
    /// untouched.
    pub fn normalize(&mut self) {
        let peak = self.max_magnitude();
        if peak > 0.0 {
            let scale = 1.0 / peak;
            for x in &mut self.data {
                *x *= scale;
            }
        }
    }

    /// Resample by a real `factor`: 2.0 doubles the sample count, 0.5
    /// halves it.
    ///
    /// The factor is approximated by a rational L/M within 1e-4. The
    /// signal is upsampled by L, low-passed by a Blackman-windowed
    /// sinc at the narrower of the two Nyquist rates, and decimated
    /// by M. Output length is `len * L / M`, truncated.
    ///
    /// # Panics
    /// Panics if `factor` is not positive and finite.
    pub fn resample(&self, factor: f64) -> Buffer {
        assert!(
            factor > 0.0 && factor.is_finite(),
            "factor must be positive and finite"
        );
        let (l, m) = find_fraction(factor, 1e-4);
        if l == m {
            return self.clone();
        }

        // Anti-aliasing kernel at the upsampled rate: cutoff
        // 1/(2*max(L, M)) cycles per sample, 10 zero crossings per
        // side, centered at `half`.
        let lm_max = l.max(m);
        let half = 10 * lm_max;
        let window = Window::Blackman.coefficients(2 * half + 1);
        let omega = core::f64::consts::PI / lm_max as f64;
        let mut h = vec![0.0; 2 * half + 1];
        for (t, tap) in h.iter_mut().enumerate() {
            let k = t as f64 - half as f64;
            *tap = if t == half {
                omega / core::f64::consts::PI
            } else {
                sin(omega * k) / (core::f64::consts::PI * k)
            } * window[t];
        }

        // y[j] = L * sum_i x[i] h[u - i*L] over the zero-stuffed
        // signal, with u placed so the kernel center lands on j*M.
        let n_out = self.data.len() * l / m;
        let mut out = Vec::with_capacity(n_out);
        for j in 0..n_out {
            let u = j * m + half;
            let i_lo = u.saturating_sub(2 * half).div_ceil(l);
            let i_hi = (u / l).min(self.data.len() - 1);
            let mut acc = 0.0;
            for i in i_lo..=i_hi {
                acc += self.data[i] * h[u - i * l];
            }
            out.push(acc * l as f64);
        }
        Buffer::from_vec(out)
    }
}

/// Smallest rational L/M within `tolerance` of `x`, found by walking
/// the denominators. Falls back to the closest pair seen if nothing
/// within tolerance exists below the search cap.
fn find_fraction(x: f64, tolerance: f64) -> (usize, usize) {
    let mut best = (1, 1);
    let mut best_err = f64::INFINITY;
    for m in 1..=65536usize {
        let l = round(x * m as f64) as usize;
        if l == 0 {
            continue;
        }
        let err = fabs(l as f64 / m as f64 - x);
        if err < tolerance {
            return (l, m);
        }
        if err < best_err {
            best = (l, m);
            best_err = err;
        }
    }
    best
}

impl From<Vec<f64>> for Buffer {
    fn from(data: Vec<f64>) -> Self {
        Self { data }
    }
}

impl FromIterator<f64> for Buffer {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().collect(),
        }
    }
}

impl Index<usize> for Buffer {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.data[index]
    }
}

impl IndexMut<usize> for Buffer {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.data[index]
    }
}

impl<'a> IntoIterator for &'a Buffer {
    type Item = &'a f64;
    type IntoIter = core::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

macro_rules! elementwise_op {
    ($trait:ident, $method:ident, $op:tt) => {
        impl $trait<&Buffer> for &Buffer {
            type Output = Buffer;

            fn $method(self, rhs: &Buffer) -> Buffer {
                self.data
                    .iter()
                    .zip(rhs.data.iter())
                    .map(|(a, b)| a $op b)
                    .collect()
            }
        }

        impl $trait<f64> for &Buffer {
            type Output = Buffer;

            fn $method(self, rhs: f64) -> Buffer {
                self.data.iter().map(|a| a $op rhs).collect()
            }
        }

        impl $trait<f64> for Buffer {
            type Output = Buffer;

            fn $method(mut self, rhs: f64) -> Buffer {
                for x in &mut self.data {
                    *x = *x $op rhs;
                }
                self
            }
        }
    };
}

elementwise_op!(Add, add, +);
elementwise_op!(Sub, sub, -);
elementwise_op!(Mul, mul, *);
elementwise_op!(Div, div, /);

// `^` is element-wise power, not exclusive-or, mirroring the other
// binary operators: buffer exponents pair up to the shorter length.
impl BitXor<&Buffer> for &Buffer {
    type Output = Buffer;

    fn bitxor(self, rhs: &Buffer) -> Buffer {
        self.data
            .iter()
            .zip(rhs.data.iter())
            .map(|(a, b)| pow(*a, *b))
            .collect()
    }
}

impl BitXor<f64> for &Buffer {
    type Output = Buffer;

    fn bitxor(self, rhs: f64) -> Buffer {
        self.data.iter().map(|a| pow(*a, rhs)).collect()
    }
}

impl BitXor<f64> for Buffer {
    type Output = Buffer;

    fn bitxor(mut self, rhs: f64) -> Buffer {
        self ^= rhs;
        self
    }
}

impl BitXorAssign<f64> for Buffer {
    fn bitxor_assign(&mut self, rhs: f64) {
        for x in &mut self.data {
            *x = pow(*x, rhs);
        }
    }
}

impl BitXorAssign<&Buffer> for Buffer {
    fn bitxor_assign(&mut self, rhs: &Buffer) {
        for (x, e) in self.data.iter_mut().zip(rhs.data.iter()) {
            *x = pow(*x, *e);
        }
    }
}
