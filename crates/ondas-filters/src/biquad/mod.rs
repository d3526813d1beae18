//! High-order parametric biquad filters and their design routines.
//!
//! A [`Biquad`] owns one direct-form kernel. Open biquads remember
//! their design parameters and can be retuned, redesigning the kernel
//! on the fly; closed biquads wrap a fixed kernel and refuse
//! parameter changes. A [`FilterBank`] composes several biquads into
//! one chain that can also be folded into a single equivalent kernel.

mod bank;
mod design;
mod kernel;

pub use bank::{FilterBank, FilterId};
pub use design::{BandEdge, hpeq_design};
pub use kernel::BiquadKernel;

use ondas_core::Buffer;

use crate::error::FilterError;

/// Whether a biquad's design parameters can still be changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesignMode {
    /// Designed from parameters; retunable.
    Open,
    /// Wraps a fixed kernel; parameter calls fail.
    Closed,
}

/// One direct-form IIR section chain with optional live redesign.
#[derive(Debug, Clone)]
pub struct Biquad {
    sample_rate: f64,
    freq_center: f64,
    band_width: f64,
    gain_db_at_fc: f64,
    gain_db_at_band_width: f64,
    gain_db_baseline: f64,
    order: u32,
    mode: DesignMode,
    kernel: BiquadKernel,
    x_buf: Vec<f64>,
    x_idx: usize,
    y_buf: Vec<f64>,
    y_idx: usize,
}

impl Biquad {
    /// Wrap a fixed kernel (closed design).
    pub fn from_kernel(kernel: BiquadKernel) -> Self {
        let order = kernel.order() as u32;
        let x_len = kernel.b.len().max(1);
        let y_len = kernel.a.len().max(1);
        Self {
            sample_rate: 0.0,
            freq_center: 0.0,
            band_width: 0.0,
            gain_db_at_fc: 0.0,
            gain_db_at_band_width: 0.0,
            gain_db_baseline: 0.0,
            order,
            mode: DesignMode::Closed,
            kernel,
            x_buf: vec![0.0; x_len],
            x_idx: 0,
            y_buf: vec![0.0; y_len],
            y_idx: 0,
        }
    }

    /// Design an open biquad from equalizer parameters. Gains are in
    /// dB: at the center frequency, at the band edges, and far from
    /// the band.
    pub fn new(
        sample_rate: f64,
        freq_center_hz: f64,
        bandwidth_hz: f64,
        gain_db_at_fc: f64,
        gain_db_at_band_width: f64,
        gain_db_baseline: f64,
        order: u32,
    ) -> Result<Self, FilterError> {
        let mut bq = Self {
            sample_rate,
            freq_center: freq_center_hz,
            band_width: bandwidth_hz,
            gain_db_at_fc,
            gain_db_at_band_width,
            gain_db_baseline,
            order,
            mode: DesignMode::Open,
            kernel: BiquadKernel::identity(),
            x_buf: vec![0.0],
            x_idx: 0,
            y_buf: vec![0.0],
            y_idx: 0,
        };
        bq.update_design()?;
        Ok(bq)
    }

    /// Rebuild the kernel from the stored design parameters.
    pub fn update_design(&mut self) -> Result<(), FilterError> {
        if self.mode == DesignMode::Closed {
            return Err(FilterError::ClosedDesign);
        }

        self.kernel = hpeq_design(
            self.sample_rate,
            self.order,
            self.freq_center,
            self.band_width,
            self.gain_db_baseline,
            self.gain_db_at_fc,
            self.gain_db_at_band_width,
        )?;

        // Reallocate histories only when the kernel changed size.
        if self.x_buf.len() != self.kernel.b.len() {
            self.x_buf = vec![0.0; self.kernel.b.len().max(1)];
            self.x_idx = 0;
        }
        if self.y_buf.len() != self.kernel.a.len() {
            self.y_buf = vec![0.0; self.kernel.a.len().max(1)];
            self.y_idx = 0;
        }
        Ok(())
    }

    /// The current kernel.
    pub fn kernel(&self) -> &BiquadKernel {
        &self.kernel
    }

    /// Open or closed.
    pub fn design_mode(&self) -> DesignMode {
        self.mode
    }

    /// Sample rate, if this is an open design.
    pub fn sample_rate(&self) -> Option<f64> {
        match self.mode {
            DesignMode::Open => Some(self.sample_rate),
            DesignMode::Closed => None,
        }
    }

    /// Center frequency in Hz (open designs).
    pub fn freq_center(&self) -> f64 {
        self.freq_center
    }

    /// Bandwidth in Hz (open designs).
    pub fn band_width(&self) -> f64 {
        self.band_width
    }

    /// Gain at the center frequency in dB.
    pub fn gain_db_at_fc(&self) -> f64 {
        self.gain_db_at_fc
    }

    /// Gain at the band edges in dB.
    pub fn gain_db_at_band_width(&self) -> f64 {
        self.gain_db_at_band_width
    }

    /// Baseline gain in dB.
    pub fn gain_db_baseline(&self) -> f64 {
        self.gain_db_baseline
    }

    /// Design order.
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Warped band edge frequencies, for open designs.
    pub fn band_edges(&self) -> Option<BandEdge> {
        match self.mode {
            DesignMode::Open => Some(BandEdge::new(
                self.sample_rate,
                self.freq_center,
                self.band_width,
            )),
            DesignMode::Closed => None,
        }
    }

    /// Zero the filter histories.
    pub fn clear(&mut self) {
        self.x_buf.iter_mut().for_each(|s| *s = 0.0);
        self.y_buf.iter_mut().for_each(|s| *s = 0.0);
        self.x_idx = 0;
        self.y_idx = 0;
    }

    fn maybe_redesign(&mut self, fc: f64, bw: f64) -> Result<(), FilterError> {
        if (self.freq_center - fc).abs() >= 1.0 || (self.band_width - bw).abs() >= 2.0 {
            self.freq_center = fc;
            self.band_width = bw;
            self.update_design()?;
        }
        Ok(())
    }

    fn filter_inner(&mut self, x: f64) -> f64 {
        let xn = self.x_buf.len();
        self.x_buf[self.x_idx] = x;
        self.x_idx = (self.x_idx + 1) % xn;

        let mut y = 0.0;
        let mut i = self.x_idx;
        for &b in &self.kernel.b {
            i = if i == 0 { xn - 1 } else { i - 1 };
            y += b * self.x_buf[i];
        }

        let yn = self.y_buf.len();
        let mut i = self.y_idx;
        for &a in self.kernel.a.iter().skip(1) {
            i = if i == 0 { yn - 1 } else { i - 1 };
            y -= a * self.y_buf[i];
        }

        self.y_buf[self.y_idx] = y;
        self.y_idx = (self.y_idx + 1) % yn;
        y
    }

    /// Filter one sample with the current design.
    pub fn filter(&mut self, x: f64) -> f64 {
        self.filter_inner(x)
    }

    /// Filter one sample, retuning the center frequency first. The
    /// kernel is redesigned only when the frequency moved at least
    /// 1 Hz.
    pub fn filter_at(&mut self, x: f64, freq_center_hz: f64) -> Result<f64, FilterError> {
        if self.mode == DesignMode::Closed {
            return Err(FilterError::ClosedDesign);
        }
        self.maybe_redesign(freq_center_hz, self.band_width)?;
        Ok(self.filter_inner(x))
    }

    /// Filter one sample, retuning center and bandwidth. Redesign
    /// tolerances are 1 Hz on the center and 2 Hz on the bandwidth.
    pub fn filter_band(
        &mut self,
        x: f64,
        freq_center_hz: f64,
        bandwidth_hz: f64,
    ) -> Result<f64, FilterError> {
        if self.mode == DesignMode::Closed {
            return Err(FilterError::ClosedDesign);
        }
        self.maybe_redesign(freq_center_hz, bandwidth_hz)?;
        Ok(self.filter_inner(x))
    }

    /// Filter a whole buffer with the current design.
    pub fn filter_buffer(&mut self, x: &Buffer) -> Buffer {
        x.iter().map(|&s| self.filter_inner(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_kernel_refuses_redesign() {
        let mut bq = Biquad::from_kernel(BiquadKernel::identity());
        assert_eq!(bq.design_mode(), DesignMode::Closed);
        assert_eq!(bq.sample_rate(), None);
        assert_eq!(bq.update_design(), Err(FilterError::ClosedDesign));
        assert_eq!(bq.filter_at(1.0, 500.0), Err(FilterError::ClosedDesign));
    }

    #[test]
    fn test_identity_kernel_passes_through() {
        let mut bq = Biquad::from_kernel(BiquadKernel::identity());
        for i in 0..16 {
            let x = i as f64 * 0.25;
            assert_eq!(bq.filter(x), x);
        }
    }

    #[test]
    fn test_open_design_boosts_at_center() {
        let mut bq = Biquad::new(48000.0, 1000.0, 500.0, 6.0, 3.0, 0.0, 4).unwrap();

        // Probe with a 1 kHz tone; steady-state amplitude approaches
        // the designed +6 dB (linear ~2)
        let sr = 48000.0;
        let mut peak: f64 = 0.0;
        for i in 0..48000 {
            let x = (2.0 * std::f64::consts::PI * 1000.0 * i as f64 / sr).sin();
            let y = bq.filter(x);
            if i > 40000 {
                peak = peak.max(y.abs());
            }
        }
        assert!((peak - 2.0).abs() < 0.05, "peak gain ~2, got {peak}");
    }

    #[test]
    fn test_baseline_is_untouched_far_from_band() {
        let mut bq = Biquad::new(48000.0, 1000.0, 200.0, 12.0, 6.0, 0.0, 4).unwrap();

        let sr = 48000.0;
        let mut peak: f64 = 0.0;
        for i in 0..48000 {
            let x = (2.0 * std::f64::consts::PI * 8000.0 * i as f64 / sr).sin();
            let y = bq.filter(x);
            if i > 40000 {
                peak = peak.max(y.abs());
            }
        }
        assert!((peak - 1.0).abs() < 0.05, "baseline gain ~1, got {peak}");
    }

    #[test]
    fn test_small_retune_skips_redesign() {
        let mut bq = Biquad::new(48000.0, 1000.0, 500.0, 6.0, 3.0, 0.0, 4).unwrap();
        let kernel = bq.kernel().clone();

        bq.filter_at(0.0, 1000.5).unwrap();
        assert_eq!(bq.kernel(), &kernel, "sub-Hz moves keep the kernel");
        assert_eq!(bq.freq_center(), 1000.0);

        bq.filter_at(0.0, 1200.0).unwrap();
        assert_ne!(bq.kernel(), &kernel, "a 200 Hz move redesigns");
        assert_eq!(bq.freq_center(), 1200.0);
    }

    #[test]
    fn test_invalid_design_parameters() {
        assert!(matches!(
            Biquad::new(0.0, 1000.0, 500.0, 6.0, 3.0, 0.0, 4),
            Err(FilterError::NonPositiveSampleRate(_))
        ));
        assert!(matches!(
            Biquad::new(48000.0, 1000.0, -1.0, 6.0, 3.0, 0.0, 4),
            Err(FilterError::NonPositiveBandwidth(_))
        ));
        assert!(matches!(
            Biquad::new(48000.0, 1000.0, 500.0, 6.0, 3.0, 0.0, 0),
            Err(FilterError::ZeroOrder)
        ));
    }
}
