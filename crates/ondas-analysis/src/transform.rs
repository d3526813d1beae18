//! Radix-2 FFT kernel and the transform engine built on it.
//!
//! The kernel ([`fft_in_place`]) is the classic iterative decimation-in-time
//! Cooley-Tukey transform: bit-reversal permutation followed by log2(N)
//! butterfly stages with a recurrence-generated twiddle factor per sub-DFT.
//! It operates on parallel real/imaginary slices of power-of-two length and
//! is unscaled in the forward direction.
//!
//! [`FftTransform`] wraps the kernel with framing, windowing, zero padding,
//! and the conjugate-trick inverse, producing and consuming [`FftChunk`]s.

use ondas_core::{Buffer, Window};
use thiserror::Error;
use tracing::debug;

use crate::chunk::FftChunk;

/// Errors from the transform engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    /// The overlap leaves no room to advance between frames.
    #[error("overlap {n_overlap} must be smaller than the frame size {frame_size}")]
    OverlapTooLarge {
        /// Requested overlap in samples.
        n_overlap: usize,
        /// Frame size after rounding up to a power of two.
        frame_size: usize,
    },
}

/// Smallest power of two greater than or equal to `n` (minimum 1).
pub fn round_up_to_power_of_2(n: usize) -> usize {
    let mut raw = n.saturating_sub(1);
    let mut p = 1;
    while raw > 0 {
        p <<= 1;
        raw >>= 1;
    }
    p
}

/// In-place iterative radix-2 DIT transform over parallel real/imaginary
/// slices. Forward direction, unscaled.
///
/// # Panics
/// Panics in debug builds if the slices differ in length or the length is
/// not a power of two.
pub fn fft_in_place(real: &mut [f64], imag: &mut [f64]) {
    let n = real.len();
    debug_assert_eq!(n, imag.len(), "real/imag length mismatch");
    debug_assert!(n.is_power_of_two(), "length must be a power of two");

    if n < 2 {
        return;
    }

    let m = n.trailing_zeros();
    let n_div_2 = n / 2;

    // Bit reversal sorting.
    let mut j = n_div_2;
    for i in 1..=n - 2 {
        if i < j {
            real.swap(i, j);
            imag.swap(i, j);
        }
        let mut k = n_div_2;
        while k <= j {
            j -= k;
            k /= 2;
        }
        j += k;
    }

    // One pass per fft stage.
    for l in 1..=m {
        let le = 1usize << l;
        let le2 = le / 2;

        let sr = (core::f64::consts::PI / le2 as f64).cos();
        let si = -(core::f64::consts::PI / le2 as f64).sin();

        let mut ur = 1.0;
        let mut ui = 0.0;

        // One pass per sub DFT.
        for j in 1..=le2 {
            // Butterflies.
            let mut i = j - 1;
            while i < n {
                let ip = i + le2;

                let temp_real = ur * real[ip] - ui * imag[ip];
                let temp_imag = ui * real[ip] + ur * imag[ip];

                real[ip] = real[i] - temp_real;
                imag[ip] = imag[i] - temp_imag;

                real[i] += temp_real;
                imag[i] += temp_imag;

                i += le;
            }

            let temp = ur;
            ur = temp * sr - ui * si;
            ui = temp * si + ui * sr;
        }
    }
}

/// Transform engine: framing, windowing, forward and inverse transforms.
#[derive(Debug, Clone)]
pub struct FftTransform {
    sample_rate: f64,
    window: Window,
}

impl FftTransform {
    /// Create an engine with a rectangular analysis window.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            window: Window::Rectangular,
        }
    }

    /// Select the analysis window applied to frames before transforming.
    pub fn set_window(&mut self, window: Window) {
        self.window = window;
    }

    /// Currently selected analysis window.
    pub fn window(&self) -> Window {
        self.window
    }

    /// Sample rate frames are interpreted at.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Transform a whole buffer as a single frame, zero-padded to the next
    /// power of two. The chunk records the input length so [`Self::ifft`]
    /// can strip the padding again.
    pub fn fft(&self, input: &Buffer) -> FftChunk {
        let n = round_up_to_power_of_2(input.len());
        self.transform_frame(input.as_slice(), n, input.len())
    }

    /// Split `input` into frames of `n_order` samples (rounded up to a
    /// power of two) advancing by `frame_size - n_overlap`, window each
    /// frame, and transform.
    pub fn fft_frames(
        &self,
        input: &Buffer,
        n_order: usize,
        n_overlap: usize,
    ) -> Result<Vec<FftChunk>, TransformError> {
        let n = round_up_to_power_of_2(n_order);
        if n_overlap >= n {
            return Err(TransformError::OverlapTooLarge {
                n_overlap,
                frame_size: n,
            });
        }
        let step = n - n_overlap;

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < input.len() {
            let end = (start + n).min(input.len());
            chunks.push(self.transform_frame(
                &input.as_slice()[start..end],
                n,
                input.len(),
            ));
            start += step;
        }

        debug!(
            n_frames = chunks.len(),
            frame_size = n,
            step,
            "framed forward transform"
        );

        Ok(chunks)
    }

    fn transform_frame(&self, samples: &[f64], n: usize, original_size: usize) -> FftChunk {
        let mut frame = samples.to_vec();
        self.window.apply(&mut frame);
        frame.resize(n, 0.0);

        let mut chunk = FftChunk::from_parts(
            Buffer::from_vec(frame),
            Buffer::zeros(n),
            self.sample_rate,
            original_size,
        );
        let (real, imag) = chunk.raw_parts_mut();
        fft_in_place(real.as_mut_slice(), imag.as_mut_slice());
        chunk
    }

    /// Inverse transform via the conjugate trick: conjugate, forward
    /// transform, scale by 1/N. The result is truncated to the chunk's
    /// original size.
    pub fn ifft(&self, chunk: &FftChunk) -> Buffer {
        let mut work = chunk.clone();
        work.to_cartesian();

        let n = work.len();
        let (real, imag) = work.raw_parts_mut();
        for x in imag.iter_mut() {
            *x = -*x;
        }
        fft_in_place(real.as_mut_slice(), imag.as_mut_slice());

        let keep = chunk.original_size().min(n);
        let scale = 1.0 / n as f64;
        work.raw_real()
            .iter()
            .take(keep)
            .map(|x| x * scale)
            .collect()
    }

    /// Inverse transform of a frame sequence, concatenated in order.
    pub fn ifft_chunks(&self, chunks: &[FftChunk]) -> Buffer {
        let mut out = Buffer::new();
        for chunk in chunks {
            out.extend(&self.ifft(chunk));
        }
        out
    }

    /// Inverse of a half-spectrum of real coefficients.
    ///
    /// The input is rebuilt into a full zero-phase spectrum: the
    /// coefficients, then zeros up to the next power of two and as
    /// many again, then the coefficients reversed. The chunk inverse
    /// runs on that and the result is truncated to the input length.
    pub fn ifft_spectrum(&self, half_spectrum: &Buffer) -> Buffer {
        let len = half_spectrum.len();
        let n2 = round_up_to_power_of_2(len);

        let mut real = Buffer::with_capacity(2 * n2);
        real.extend(half_spectrum);
        for _ in 0..2 * (n2 - len) {
            real.push(0.0);
        }
        let mut mirrored = half_spectrum.clone();
        mirrored.reverse();
        real.extend(&mirrored);

        let chunk = FftChunk::from_parts(real, Buffer::zeros(2 * n2), self.sample_rate, len);
        self.ifft(&chunk)
    }
}
