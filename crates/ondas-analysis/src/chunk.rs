//! Spectrum container produced by the transform engine.
//!
//! [`FftChunk`] holds one transformed frame as parallel real/imaginary
//! buffers. The pair can be viewed in cartesian or polar form; polar form
//! stores magnitude in the real buffer and phase in the imaginary buffer.
//! Conversions are idempotent and in-place.
//!
//! The chunk remembers the `original_size` of the time-domain frame it was
//! built from so the inverse transform can strip the zero padding again.

use ondas_core::Buffer;

/// One transformed frame: parallel real/imaginary (or magnitude/phase)
/// buffers of power-of-two length.
#[derive(Debug, Clone, PartialEq)]
pub struct FftChunk {
    real: Buffer,
    imag: Buffer,
    sample_rate: f64,
    original_size: usize,
    is_polar: bool,
}

/// Phase of `(re, im)` as the original transform computes it: `atan(im/re)`
/// folded back into `(-pi, pi]` by quadrant.
fn quadrant_phase(re: f64, im: f64) -> f64 {
    if re == 0.0 && im == 0.0 {
        return 0.0;
    }
    let mut phase = (im / re).atan();
    if re < 0.0 {
        if im < 0.0 {
            phase -= core::f64::consts::PI;
        } else {
            phase += core::f64::consts::PI;
        }
    }
    phase
}

impl FftChunk {
    /// Create a cartesian chunk of `size` zeros.
    ///
    /// `original_size` of 0 defaults to `size`.
    pub fn new(size: usize, sample_rate: f64, original_size: usize) -> Self {
        Self {
            real: Buffer::zeros(size),
            imag: Buffer::zeros(size),
            sample_rate,
            original_size: if original_size == 0 {
                size
            } else {
                original_size
            },
            is_polar: false,
        }
    }

    /// Build a chunk from existing real/imaginary buffers.
    ///
    /// # Panics
    /// Panics if the buffers differ in length.
    pub fn from_parts(real: Buffer, imag: Buffer, sample_rate: f64, original_size: usize) -> Self {
        assert_eq!(real.len(), imag.len(), "real/imag length mismatch");
        let size = real.len();
        Self {
            real,
            imag,
            sample_rate,
            original_size: if original_size == 0 {
                size
            } else {
                original_size
            },
            is_polar: false,
        }
    }

    /// Transform length (power of two).
    pub fn len(&self) -> usize {
        self.real.len()
    }

    /// True if the chunk holds no bins.
    pub fn is_empty(&self) -> bool {
        self.real.is_empty()
    }

    /// Length of the time-domain frame this chunk was built from.
    pub fn original_size(&self) -> usize {
        self.original_size
    }

    /// Sample rate of the source signal.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// True when the buffers hold magnitude/phase instead of real/imag.
    pub fn is_polar(&self) -> bool {
        self.is_polar
    }

    /// Raw first buffer: real part, or magnitude when polar.
    pub fn raw_real(&self) -> &Buffer {
        &self.real
    }

    /// Raw second buffer: imaginary part, or phase when polar.
    pub fn raw_imag(&self) -> &Buffer {
        &self.imag
    }

    /// Mutable raw buffers for the transform engine.
    pub(crate) fn raw_parts_mut(&mut self) -> (&mut Buffer, &mut Buffer) {
        (&mut self.real, &mut self.imag)
    }

    /// Convert to magnitude/phase in place. No-op when already polar.
    pub fn to_polar(&mut self) {
        if self.is_polar {
            return;
        }
        for j in 0..self.real.len() {
            let r = self.real[j];
            let i = self.imag[j];
            self.real[j] = (r * r + i * i).sqrt();
            self.imag[j] = quadrant_phase(r, i);
        }
        self.is_polar = true;
    }

    /// Convert back to real/imaginary in place. No-op when cartesian.
    pub fn to_cartesian(&mut self) {
        if !self.is_polar {
            return;
        }
        for j in 0..self.real.len() {
            let m = self.real[j];
            let p = self.imag[j];
            self.real[j] = m * p.cos();
            self.imag[j] = m * p.sin();
        }
        self.is_polar = false;
    }

    /// Real part of the first half of the spectrum (N/2 bins), regardless
    /// of the current view.
    pub fn real_half(&self) -> Buffer {
        let n = self.real.len() / 2;
        if self.is_polar {
            (0..n).map(|i| self.real[i] * self.imag[i].cos()).collect()
        } else {
            self.real.subbuffer(0, n)
        }
    }

    /// Imaginary part of the first half of the spectrum (N/2 bins).
    pub fn imag_half(&self) -> Buffer {
        let n = self.real.len() / 2;
        if self.is_polar {
            (0..n).map(|i| self.real[i] * self.imag[i].sin()).collect()
        } else {
            self.imag.subbuffer(0, n)
        }
    }

    /// Magnitude of the first N/2 + 1 bins (DC through Nyquist).
    pub fn magnitude(&self) -> Buffer {
        let n = self.real.len() / 2 + 1;
        if self.is_polar {
            return self.real.subbuffer(0, n);
        }
        (0..n.min(self.real.len()))
            .map(|i| {
                let r = self.real[i];
                let im = self.imag[i];
                (r * r + im * im).sqrt()
            })
            .collect()
    }

    /// Phase of the first N/2 + 1 bins.
    pub fn phase(&self) -> Buffer {
        let n = self.real.len() / 2 + 1;
        if self.is_polar {
            return self.imag.subbuffer(0, n);
        }
        (0..n.min(self.real.len()))
            .map(|i| quadrant_phase(self.real[i], self.imag[i]))
            .collect()
    }

    /// Frequency in Hz of each of the N/2 + 1 magnitude bins.
    pub fn frequency_axis(&self) -> Buffer {
        let chunk_size = self.real.len();
        let n = chunk_size / 2 + 1;
        let step = self.sample_rate / chunk_size as f64;
        (0..n).map(|i| i as f64 * step).collect()
    }
}
