//! Pole-placement IIR filters.
//!
//! [`IirStage`] realizes a low- or high-pass of 2 to 20 poles by
//! cascading second-order pole pairs placed on a circle (Butterworth)
//! or an ellipse (Chebyshev, when a ripple fraction is given), then
//! folding the cascade into one direct-form kernel and normalizing
//! its gain. Band-pass and band-reject chain or sum two stages.
//!
//! Kernels are cached per whole-Hz cutoff so sweeping a filter does
//! not redo the cascade every sample.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::trace;

use crate::filter::{DEFAULT_RESPONSE_SIZE, Filter};

/// Pass direction of an [`IirStage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IirMode {
    /// Pass below the cutoff.
    LowPass,
    /// Pass above the cutoff.
    HighPass,
}

/// Direct-form kernel: numerator taps and feedback taps already in
/// additive form (`y = sum(b * x) + sum(a * y)`), `a[0]` unused.
type StageKernel = (Arc<[f64]>, Arc<[f64]>);

/// One second-order pole pair of the analog prototype, mapped through
/// the bilinear transform. Returns `(a0, a1, a2, b1, b2)` where the
/// `a` values are numerator taps and the `b` values feedback taps.
fn pole_pair(
    mode: IirMode,
    n_poles: usize,
    omega: f64,
    ripple: f64,
    pair: usize,
) -> (f64, f64, f64, f64, f64) {
    let n = n_poles as f64;
    let theta = std::f64::consts::PI / (2.0 * n)
        + (pair - 1) as f64 * std::f64::consts::PI / n;

    let mut rp = -theta.cos();
    let mut ip = theta.sin();

    // Warp the pole circle into an ellipse for Chebyshev ripple.
    if ripple != 0.0 {
        let temp = 1.0 / (1.0 - ripple);
        let es = (temp * temp - 1.0).sqrt();
        let vx = (1.0 / n) * ((1.0 / es) + ((1.0 / (es * es)) + 1.0).sqrt()).ln();
        let kx = (1.0 / n) * ((1.0 / es) + ((1.0 / (es * es)) - 1.0).sqrt()).ln();
        let kx = kx.cosh();
        rp *= vx.sinh() / kx;
        ip *= vx.cosh() / kx;
    }

    let t = 2.0 * (0.5f64).tan();
    let m = rp * rp + ip * ip;
    let mut d = 4.0 - 4.0 * rp * t + m * t * t;

    let x0 = t * t / d;
    let x1 = 2.0 * x0;
    let x2 = x0;
    let y1 = (8.0 - 2.0 * m * t * t) / d;
    let y2 = (-4.0 - 4.0 * rp * t - m * t * t) / d;

    let k = match mode {
        IirMode::HighPass => -((omega / 2.0 + 0.5).cos()) / ((omega / 2.0 - 0.5).cos()),
        IirMode::LowPass => (0.5 - omega / 2.0).sin() / (0.5 + omega / 2.0).sin(),
    };

    d = 1.0 + y1 * k - y2 * k * k;

    let a0 = (x0 - x1 * k + x2 * k * k) / d;
    let mut a1 = (-2.0 * x0 * k + x1 + x1 * k * k - 2.0 * x2 * k) / d;
    let a2 = (x0 * k * k - x1 * k + x2) / d;
    let mut b1 = (2.0 * k + y1 + y1 * k * k - 2.0 * y2 * k) / d;
    let b2 = (-(k * k) - y1 * k + y2) / d;

    if mode == IirMode::HighPass {
        a1 = -a1;
        b1 = -b1;
    }

    (a0, a1, a2, b1, b2)
}

/// Fold the pole-pair cascade into one direct-form kernel and
/// normalize the passband gain to one.
fn stage_kernel(
    sample_rate: f64,
    mode: IirMode,
    n_poles: usize,
    frequency: f64,
    ripple: f64,
) -> StageKernel {
    let no_pass = |n: usize| -> StageKernel {
        (vec![0.0; n + 1].into(), vec![0.0; n + 1].into())
    };
    let pass_through = |n: usize| -> StageKernel {
        let mut b = vec![0.0; n + 1];
        b[0] = 1.0;
        (b.into(), vec![0.0; n + 1].into())
    };

    // Cutoffs outside (1 Hz, Nyquist) degenerate to all-or-nothing.
    if frequency < 1.0 {
        return match mode {
            IirMode::LowPass => no_pass(n_poles),
            IirMode::HighPass => pass_through(n_poles),
        };
    }
    if frequency >= sample_rate / 2.0 {
        return match mode {
            IirMode::LowPass => pass_through(n_poles),
            IirMode::HighPass => no_pass(n_poles),
        };
    }

    let omega = 2.0 * std::f64::consts::PI * frequency / sample_rate;

    // Cascade workspace: 20 poles max plus 3 guard slots.
    let mut a = [0.0f64; 23];
    let mut b = [0.0f64; 23];
    a[2] = 1.0;
    b[2] = 1.0;

    for pair in 1..=n_poles / 2 {
        let (a0, a1, a2, b1, b2) = pole_pair(mode, n_poles, omega, ripple, pair);

        let ta = a;
        let tb = b;
        for i in 2..23 {
            a[i] = a0 * ta[i] + a1 * ta[i - 1] + a2 * ta[i - 2];
            b[i] = tb[i] - b1 * tb[i - 1] - b2 * tb[i - 2];
        }
    }

    // Shift out the seed and flip the feedback signs to additive form.
    b[2] = 0.0;
    for i in 0..21 {
        a[i] = a[i + 2];
        b[i] = -b[i + 2];
    }

    // Normalize to unity gain at DC (low-pass) or Nyquist (high-pass).
    let mut sa = 0.0;
    let mut sb = 0.0;
    for i in 0..21 {
        let sign = match mode {
            IirMode::LowPass => 1.0,
            IirMode::HighPass => {
                if i % 2 == 0 {
                    1.0
                } else {
                    -1.0
                }
            }
        };
        sa += a[i] * sign;
        sb += b[i] * sign;
    }
    let gain = sa / (1.0 - sb);
    for tap in a.iter_mut().take(21) {
        *tap /= gain;
    }

    (a[..=n_poles].to_vec().into(), b[..=n_poles].to_vec().into())
}

fn clamp_poles(n_poles: usize) -> usize {
    let n = if n_poles % 2 == 1 { n_poles + 1 } else { n_poles };
    n.clamp(2, 20)
}

/// Multi-pole low- or high-pass IIR stage.
#[derive(Debug, Clone)]
pub struct IirStage {
    sample_rate: f64,
    mode: IirMode,
    n_poles: usize,
    frequency: f64,
    design_frequency: f64,
    ripple: f64,
    b: Arc<[f64]>,
    a: Arc<[f64]>,
    x_history: Vec<f64>,
    y_history: Vec<f64>,
    idx: usize,
    cache: BTreeMap<u32, StageKernel>,
    realtime: bool,
}

impl IirStage {
    /// Design a stage with `n_poles` poles (made even and clamped to
    /// `[2, 20]`) at `cutoff_hz`. A non-zero `ripple` fraction (for
    /// example `0.005` for 0.5%) selects a Chebyshev response.
    ///
    /// # Panics
    /// Panics if `sample_rate` is not positive.
    pub fn new(sample_rate: f64, mode: IirMode, n_poles: usize, cutoff_hz: f64, ripple: f64) -> Self {
        assert!(sample_rate > 0.0, "sample_rate must be > 0");

        let n_poles = clamp_poles(n_poles);
        let (b, a) = stage_kernel(sample_rate, mode, n_poles, cutoff_hz, ripple);

        let mut cache = BTreeMap::new();
        cache.insert(cutoff_hz as u32, (b.clone(), a.clone()));

        Self {
            sample_rate,
            mode,
            n_poles,
            frequency: cutoff_hz,
            design_frequency: cutoff_hz,
            ripple,
            b,
            a,
            x_history: vec![0.0; n_poles + 1],
            y_history: vec![0.0; n_poles + 1],
            idx: 0,
            cache,
            realtime: false,
        }
    }

    /// Pass direction.
    pub fn mode(&self) -> IirMode {
        self.mode
    }

    /// Number of poles after clamping.
    pub fn n_poles(&self) -> usize {
        self.n_poles
    }

    /// Current cutoff in Hz.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Ripple fraction the stage was designed with.
    pub fn ripple(&self) -> f64 {
        self.ripple
    }

    /// Numerator taps.
    pub fn numerator(&self) -> &[f64] {
        &self.b
    }

    /// Feedback taps in additive form (`a[0]` unused).
    pub fn feedback(&self) -> &[f64] {
        &self.a
    }

    /// Change the design cutoff; [`Filter::reset`] returns to it.
    pub fn set_frequency(&mut self, cutoff_hz: f64) {
        self.design_frequency = cutoff_hz;
        self.retune(cutoff_hz);
    }

    /// Swap in the kernel for `cutoff_hz` without moving the design
    /// cutoff, reusing a cached kernel when one exists.
    fn retune(&mut self, cutoff_hz: f64) {
        if cutoff_hz == self.frequency {
            return;
        }
        self.frequency = cutoff_hz;
        let key = cutoff_hz as u32;
        if let Some((b, a)) = self.cache.get(&key) {
            self.b = b.clone();
            self.a = a.clone();
            return;
        }
        trace!(cutoff_hz, n_poles = self.n_poles, "designing IIR stage kernel");
        let (b, a) = stage_kernel(self.sample_rate, self.mode, self.n_poles, cutoff_hz, self.ripple);
        self.cache.insert(key, (b.clone(), a.clone()));
        self.b = b;
        self.a = a;
    }
}

impl Filter for IirStage {
    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn is_realtime(&self) -> bool {
        self.realtime
    }

    fn set_realtime(&mut self, realtime: bool) {
        self.realtime = realtime;
    }

    fn reset(&mut self) {
        self.x_history.iter_mut().for_each(|s| *s = 0.0);
        self.y_history.iter_mut().for_each(|s| *s = 0.0);
        self.idx = 0;
        self.retune(self.design_frequency);
    }

    fn filter_sample(&mut self, x: f64) -> f64 {
        let n = self.x_history.len();
        self.x_history[self.idx] = x;

        let mut y = 0.0;
        let mut i = self.idx;
        for &bk in self.b.iter() {
            y += bk * self.x_history[i];
            i = if i == 0 { n - 1 } else { i - 1 };
        }

        let mut i = self.idx;
        for &ak in self.a.iter().skip(1) {
            i = if i == 0 { n - 1 } else { i - 1 };
            y += ak * self.y_history[i];
        }

        self.y_history[self.idx] = y;
        self.idx = (self.idx + 1) % n;
        y
    }

    fn filter_sample_at(&mut self, x: f64, frequency: f64) -> f64 {
        self.retune(frequency);
        self.filter_sample(x)
    }
}

/// Band-pass IIR: a high-pass at the low edge into a low-pass at the
/// high edge, with the peak gain normalized to one at construction.
#[derive(Debug, Clone)]
pub struct IirBandPass {
    low_edge: f64,
    high_edge: f64,
    design_low: f64,
    design_high: f64,
    high_pass: IirStage,
    low_pass: IirStage,
    gain: f64,
    realtime: bool,
}

impl IirBandPass {
    /// Design a band-pass over `[low_edge_hz, high_edge_hz]`.
    ///
    /// # Panics
    /// Panics if the edges are not ordered or `sample_rate` is not
    /// positive.
    pub fn new(
        sample_rate: f64,
        n_poles: usize,
        low_edge_hz: f64,
        high_edge_hz: f64,
        ripple: f64,
    ) -> Self {
        assert!(low_edge_hz < high_edge_hz, "band edges must be ordered");

        let mut band = Self {
            low_edge: low_edge_hz,
            high_edge: high_edge_hz,
            design_low: low_edge_hz,
            design_high: high_edge_hz,
            high_pass: IirStage::new(sample_rate, IirMode::HighPass, n_poles, low_edge_hz, ripple),
            low_pass: IirStage::new(sample_rate, IirMode::LowPass, n_poles, high_edge_hz, ripple),
            gain: 1.0,
            realtime: false,
        };

        // Cascading two unity-gain stages sags below one in the band;
        // scale so the response peaks at exactly one.
        let peak = band.frequency_response(DEFAULT_RESPONSE_SIZE).max();
        if peak > 0.0 {
            band.gain = 1.0 / peak;
        }
        band
    }

    /// Lower band edge in Hz.
    pub fn low_edge(&self) -> f64 {
        self.low_edge
    }

    /// Upper band edge in Hz.
    pub fn high_edge(&self) -> f64 {
        self.high_edge
    }

    /// Normalization gain applied to the cascade.
    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Filter one sample with both band edges retuned. The
    /// normalization gain is not recomputed.
    pub fn filter_sample_band(&mut self, x: f64, low_edge_hz: f64, high_edge_hz: f64) -> f64 {
        self.low_edge = low_edge_hz;
        self.high_edge = high_edge_hz;
        self.high_pass.retune(low_edge_hz);
        self.low_pass.retune(high_edge_hz);
        self.filter_sample(x)
    }
}

impl Filter for IirBandPass {
    fn sample_rate(&self) -> f64 {
        self.low_pass.sample_rate()
    }

    fn is_realtime(&self) -> bool {
        self.realtime
    }

    fn set_realtime(&mut self, realtime: bool) {
        self.realtime = realtime;
    }

    fn reset(&mut self) {
        self.low_edge = self.design_low;
        self.high_edge = self.design_high;
        self.high_pass.reset();
        self.low_pass.reset();
    }

    fn filter_sample(&mut self, x: f64) -> f64 {
        let hp = self.high_pass.filter_sample(x);
        self.gain * self.low_pass.filter_sample(hp)
    }

    /// Shifts the band to center on `frequency`, keeping its width.
    fn filter_sample_at(&mut self, x: f64, frequency: f64) -> f64 {
        let half_width = (self.high_edge - self.low_edge) / 2.0;
        self.filter_sample_band(x, frequency - half_width, frequency + half_width)
    }
}

/// Band-reject IIR: the parallel sum of a low-pass at the low edge
/// and a high-pass at the high edge.
#[derive(Debug, Clone)]
pub struct IirBandReject {
    low_edge: f64,
    high_edge: f64,
    design_low: f64,
    design_high: f64,
    low_pass: IirStage,
    high_pass: IirStage,
    realtime: bool,
}

impl IirBandReject {
    /// Design a band-reject over `[low_edge_hz, high_edge_hz]`.
    ///
    /// # Panics
    /// Panics if the edges are not ordered or `sample_rate` is not
    /// positive.
    pub fn new(
        sample_rate: f64,
        n_poles: usize,
        low_edge_hz: f64,
        high_edge_hz: f64,
        ripple: f64,
    ) -> Self {
        assert!(low_edge_hz < high_edge_hz, "band edges must be ordered");
        Self {
            low_edge: low_edge_hz,
            high_edge: high_edge_hz,
            design_low: low_edge_hz,
            design_high: high_edge_hz,
            low_pass: IirStage::new(sample_rate, IirMode::LowPass, n_poles, low_edge_hz, ripple),
            high_pass: IirStage::new(sample_rate, IirMode::HighPass, n_poles, high_edge_hz, ripple),
            realtime: false,
        }
    }

    /// Lower band edge in Hz.
    pub fn low_edge(&self) -> f64 {
        self.low_edge
    }

    /// Upper band edge in Hz.
    pub fn high_edge(&self) -> f64 {
        self.high_edge
    }

    /// Filter one sample with both band edges retuned.
    pub fn filter_sample_band(&mut self, x: f64, low_edge_hz: f64, high_edge_hz: f64) -> f64 {
        self.low_edge = low_edge_hz;
        self.high_edge = high_edge_hz;
        self.low_pass.retune(low_edge_hz);
        self.high_pass.retune(high_edge_hz);
        self.filter_sample(x)
    }
}

impl Filter for IirBandReject {
    fn sample_rate(&self) -> f64 {
        self.low_pass.sample_rate()
    }

    fn is_realtime(&self) -> bool {
        self.realtime
    }

    fn set_realtime(&mut self, realtime: bool) {
        self.realtime = realtime;
    }

    fn reset(&mut self) {
        self.low_edge = self.design_low;
        self.high_edge = self.design_high;
        self.low_pass.reset();
        self.high_pass.reset();
    }

    fn filter_sample(&mut self, x: f64) -> f64 {
        self.low_pass.filter_sample(x) + self.high_pass.filter_sample(x)
    }

    /// Shifts the rejected band to center on `frequency`.
    fn filter_sample_at(&mut self, x: f64, frequency: f64) -> f64 {
        let half_width = (self.high_edge - self.low_edge) / 2.0;
        self.filter_sample_band(x, frequency - half_width, frequency + half_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ondas_core::Buffer;

    fn response_at(resp: &Buffer, axis: &Buffer, hz: f64) -> f64 {
        let mut best = 0;
        for i in 0..axis.len() {
            if (axis[i] - hz).abs() < (axis[best] - hz).abs() {
                best = i;
            }
        }
        resp[best]
    }

    #[test]
    fn test_odd_pole_counts_are_rounded_up() {
        let stage = IirStage::new(8000.0, IirMode::LowPass, 5, 1000.0, 0.0);
        assert_eq!(stage.n_poles(), 6);
        let stage = IirStage::new(8000.0, IirMode::LowPass, 99, 1000.0, 0.0);
        assert_eq!(stage.n_poles(), 20);
        let stage = IirStage::new(8000.0, IirMode::LowPass, 1, 1000.0, 0.0);
        assert_eq!(stage.n_poles(), 2);
    }

    #[test]
    fn test_low_pass_has_unity_dc_gain() {
        let mut stage = IirStage::new(8000.0, IirMode::LowPass, 4, 1000.0, 0.0);
        stage.set_realtime(true);
        let mut y = 0.0;
        for _ in 0..4000 {
            y = stage.filter_sample(1.0);
        }
        assert!((y - 1.0).abs() < 1e-6, "DC gain should be 1, got {y}");
    }

    #[test]
    fn test_low_pass_attenuates_above_cutoff() {
        let mut stage = IirStage::new(8000.0, IirMode::LowPass, 6, 500.0, 0.0);
        let resp = stage.frequency_response(8192);
        let axis = stage.frequency_axis(8192);

        assert!(response_at(&resp, &axis, 100.0) > 0.95);
        assert!(response_at(&resp, &axis, 2000.0) < 0.05);
    }

    #[test]
    fn test_high_pass_rejects_dc() {
        let mut stage = IirStage::new(8000.0, IirMode::HighPass, 6, 1000.0, 0.0);
        let resp = stage.frequency_response(8192);
        let axis = stage.frequency_axis(8192);

        assert!(response_at(&resp, &axis, 10.0) < 0.01);
        assert!(response_at(&resp, &axis, 3000.0) > 0.95);
    }

    #[test]
    fn test_degenerate_cutoffs() {
        // Low-pass below 1 Hz blocks everything
        let mut stage = IirStage::new(8000.0, IirMode::LowPass, 4, 0.5, 0.0);
        assert_eq!(stage.filter_sample(1.0), 0.0);

        // Low-pass at or above Nyquist passes everything untouched
        let mut stage = IirStage::new(8000.0, IirMode::LowPass, 4, 4000.0, 0.0);
        assert_eq!(stage.filter_sample(0.75), 0.75);

        // Mirrored for high-pass
        let mut stage = IirStage::new(8000.0, IirMode::HighPass, 4, 0.5, 0.0);
        assert_eq!(stage.filter_sample(0.75), 0.75);
        let mut stage = IirStage::new(8000.0, IirMode::HighPass, 4, 4000.0, 0.0);
        assert_eq!(stage.filter_sample(1.0), 0.0);
    }

    #[test]
    fn test_chebyshev_ripple_stays_stable() {
        let mut stage = IirStage::new(8000.0, IirMode::LowPass, 6, 1000.0, 0.005);
        let ir = stage.impulse_response(8192);
        assert!(ir.iter().all(|s| s.is_finite()));
        let late: f64 = (4096..8192).map(|i| ir[i].abs()).sum();
        assert!(late < 1e-3, "impulse response should decay, got {late}");
    }

    #[test]
    fn test_band_pass_peaks_at_unity() {
        let mut band = IirBandPass::new(8000.0, 6, 500.0, 1500.0, 0.01);
        let resp = band.frequency_response(8192);
        assert!(
            (resp.max() - 1.0).abs() < 1e-9,
            "self-normalized peak should be 1, got {}",
            resp.max()
        );
    }

    #[test]
    fn test_band_pass_selects_the_band() {
        let mut band = IirBandPass::new(8000.0, 6, 500.0, 1500.0, 0.0);
        let resp = band.frequency_response(8192);
        let axis = band.frequency_axis(8192);

        assert!(response_at(&resp, &axis, 1000.0) > 0.5);
        assert!(response_at(&resp, &axis, 50.0) < 0.05);
        assert!(response_at(&resp, &axis, 3500.0) < 0.05);
    }

    #[test]
    fn test_band_reject_notches_the_band() {
        let mut band = IirBandReject::new(8000.0, 6, 500.0, 1500.0, 0.0);
        let resp = band.frequency_response(8192);
        let axis = band.frequency_axis(8192);

        assert!(response_at(&resp, &axis, 1000.0) < 0.1);
        assert!(response_at(&resp, &axis, 50.0) > 0.9);
        assert!(response_at(&resp, &axis, 3500.0) > 0.9);
    }

    #[test]
    fn test_retuning_reuses_cached_kernels() {
        let mut stage = IirStage::new(8000.0, IirMode::LowPass, 4, 1000.0, 0.0);
        let k1000 = stage.numerator().to_vec();

        stage.set_frequency(500.0);
        assert_ne!(stage.numerator(), &k1000[..]);

        stage.set_frequency(1000.0);
        assert_eq!(stage.numerator(), &k1000[..]);
    }

    #[test]
    fn test_reset_restores_design_cutoff() {
        let mut stage = IirStage::new(8000.0, IirMode::LowPass, 4, 1000.0, 0.0);
        let k1000 = stage.numerator().to_vec();

        stage.filter_sample_at(0.0, 500.0);
        assert_eq!(stage.frequency(), 500.0);

        stage.reset();
        assert_eq!(stage.frequency(), 1000.0);
        assert_eq!(stage.numerator(), &k1000[..]);

        // set_frequency moves the design cutoff itself
        stage.set_frequency(500.0);
        stage.filter_sample_at(0.0, 2000.0);
        stage.reset();
        assert_eq!(stage.frequency(), 500.0);
    }

    #[test]
    fn test_reset_restores_design_band_edges() {
        let mut band = IirBandPass::new(8000.0, 6, 500.0, 1500.0, 0.0);
        band.filter_sample_at(0.0, 3000.0);
        assert_ne!(band.low_edge(), 500.0);

        // An offline batch resets first; the sweep must not stick.
        band.filter_buffer(&Buffer::ones(8));
        assert_eq!((band.low_edge(), band.high_edge()), (500.0, 1500.0));
        assert_eq!(band.high_pass.frequency(), 500.0);
        assert_eq!(band.low_pass.frequency(), 1500.0);

        let mut notch = IirBandReject::new(8000.0, 6, 500.0, 1500.0, 0.0);
        notch.filter_sample_band(0.0, 200.0, 900.0);
        notch.reset();
        assert_eq!((notch.low_edge(), notch.high_edge()), (500.0, 1500.0));
    }
}
