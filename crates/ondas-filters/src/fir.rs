//! Windowed-sinc FIR filters.
//!
//! Kernels are Blackman-windowed sinc taps, normalized to unity DC
//! gain, designed once per whole-Hz cutoff and cached behind
//! [`Arc`] handles so retuned filters share coefficient storage.
//! High-pass kernels come from the matching low-pass design by
//! spectral inversion; band filters combine a low-pass and a
//! high-pass edge.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::trace;

use crate::filter::Filter;

/// Blackman window with a half-sample offset, matching the window the
/// kernel designer applies to the sinc taps.
fn blackman_taps(kernel_size: usize) -> Vec<f64> {
    let ks = kernel_size as f64;
    (0..kernel_size)
        .map(|i| {
            let x = (i as f64 + 0.5) / ks;
            0.42 - 0.5 * (2.0 * std::f64::consts::PI * x).cos()
                + 0.08 * (4.0 * std::f64::consts::PI * x).cos()
        })
        .collect()
}

/// Windowed-sinc low-pass taps, normalized to sum to one. A cutoff
/// below 0.1 Hz yields an all-zero kernel (a no-pass filter).
fn low_pass_taps(sample_rate: f64, cutoff_hz: f64, window: &[f64]) -> Vec<f64> {
    let kernel_size = window.len();
    let mut b = vec![0.0; kernel_size];

    if cutoff_hz < 0.1 {
        return b;
    }

    let omega = 2.0 * std::f64::consts::PI * cutoff_hz / sample_rate;
    let half = (kernel_size / 2) as f64;

    let mut sum = 0.0;
    for (i, tap) in b.iter_mut().enumerate() {
        let x = i as f64 - half + 1e-16;
        *tap = (omega * x).sin() / x * window[i];
        sum += *tap;
    }
    for tap in &mut b {
        *tap /= sum;
    }
    b
}

/// High-pass taps by spectral inversion of a low-pass designed at the
/// mirrored cutoff. A cutoff below 0.1 Hz yields a pass-through.
fn high_pass_taps(sample_rate: f64, cutoff_hz: f64, window: &[f64]) -> Vec<f64> {
    if cutoff_hz < 0.1 {
        let mut b = vec![0.0; window.len()];
        b[0] = 1.0;
        return b;
    }

    let mut b = low_pass_taps(sample_rate, sample_rate / 2.0 - cutoff_hz, window);
    for tap in b.iter_mut().skip(1).step_by(2) {
        *tap = -*tap;
    }
    b
}

fn force_odd(kernel_size: usize) -> usize {
    if kernel_size % 2 == 0 {
        kernel_size + 1
    } else {
        kernel_size
    }
}

/// Convolution state shared by the FIR variants: a kernel handle and a
/// ring buffer of past inputs.
#[derive(Debug, Clone)]
struct FirCore {
    kernel: Arc<[f64]>,
    history: Vec<f64>,
    idx: usize,
}

impl FirCore {
    fn new(kernel: Arc<[f64]>) -> Self {
        let n = kernel.len() + 1;
        Self {
            kernel,
            history: vec![0.0; n],
            idx: 0,
        }
    }

    fn set_kernel(&mut self, kernel: Arc<[f64]>) {
        debug_assert_eq!(kernel.len(), self.kernel.len());
        self.kernel = kernel;
    }

    fn reset(&mut self) {
        self.history.iter_mut().for_each(|s| *s = 0.0);
        self.idx = 0;
    }

    fn filter(&mut self, x: f64) -> f64 {
        let n = self.history.len();
        self.history[self.idx] = x;
        self.idx = (self.idx + 1) % n;

        // Walk backwards from the newest sample.
        let mut y = 0.0;
        let mut i = self.idx;
        for &b in self.kernel.iter() {
            i = if i == 0 { n - 1 } else { i - 1 };
            y += b * self.history[i];
        }
        y
    }
}

/// Low-pass windowed-sinc FIR.
#[derive(Debug, Clone)]
pub struct FirLowPass {
    sample_rate: f64,
    frequency: f64,
    design_frequency: f64,
    window: Vec<f64>,
    core: FirCore,
    cache: BTreeMap<u32, Arc<[f64]>>,
    realtime: bool,
}

impl FirLowPass {
    /// Design a low-pass at `cutoff_hz` with `kernel_size` taps (made
    /// odd if necessary).
    ///
    /// # Panics
    /// Panics if `sample_rate` is not positive or `kernel_size < 2`.
    pub fn new(sample_rate: f64, cutoff_hz: f64, kernel_size: usize) -> Self {
        assert!(sample_rate > 0.0, "sample_rate must be > 0");
        assert!(kernel_size >= 2, "kernel_size must be >= 2");

        let kernel_size = force_odd(kernel_size);
        let window = blackman_taps(kernel_size);
        let taps: Arc<[f64]> = low_pass_taps(sample_rate, cutoff_hz, &window).into();

        let mut cache = BTreeMap::new();
        cache.insert(cutoff_hz as u32, taps.clone());

        Self {
            sample_rate,
            frequency: cutoff_hz,
            design_frequency: cutoff_hz,
            window,
            core: FirCore::new(taps),
            cache,
            realtime: false,
        }
    }

    /// Number of taps.
    pub fn kernel_size(&self) -> usize {
        self.window.len()
    }

    /// Current cutoff in Hz.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Change the design cutoff; [`Filter::reset`] returns to it.
    pub fn set_frequency(&mut self, cutoff_hz: f64) {
        self.design_frequency = cutoff_hz;
        self.make_kernel(cutoff_hz);
    }

    /// Current taps.
    pub fn kernel(&self) -> &[f64] {
        &self.core.kernel
    }

    fn make_kernel(&mut self, cutoff_hz: f64) {
        self.frequency = cutoff_hz;
        let key = cutoff_hz as u32;
        if let Some(taps) = self.cache.get(&key) {
            self.core.set_kernel(taps.clone());
            return;
        }
        trace!(cutoff_hz, "designing low-pass FIR kernel");
        let taps: Arc<[f64]> = low_pass_taps(self.sample_rate, cutoff_hz, &self.window).into();
        self.cache.insert(key, taps.clone());
        self.core.set_kernel(taps);
    }
}

impl Filter for FirLowPass {
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
        self.core.reset();
        if self.frequency != self.design_frequency {
            self.make_kernel(self.design_frequency);
        }
    }

    fn filter_sample(&mut self, x: f64) -> f64 {
        self.core.filter(x)
    }

    fn filter_sample_at(&mut self, x: f64, frequency: f64) -> f64 {
        if frequency != self.frequency {
            self.make_kernel(frequency);
        }
        self.core.filter(x)
    }
}

/// High-pass windowed-sinc FIR (spectral inversion of the low-pass).
#[derive(Debug, Clone)]
pub struct FirHighPass {
    sample_rate: f64,
    frequency: f64,
    design_frequency: f64,
    window: Vec<f64>,
    core: FirCore,
    cache: BTreeMap<u32, Arc<[f64]>>,
    realtime: bool,
}

impl FirHighPass {
    /// Design a high-pass at `cutoff_hz` with `kernel_size` taps.
    ///
    /// # Panics
    /// Panics if `sample_rate` is not positive or `kernel_size < 2`.
    pub fn new(sample_rate: f64, cutoff_hz: f64, kernel_size: usize) -> Self {
        assert!(sample_rate > 0.0, "sample_rate must be > 0");
        assert!(kernel_size >= 2, "kernel_size must be >= 2");

        let kernel_size = force_odd(kernel_size);
        let window = blackman_taps(kernel_size);
        let taps: Arc<[f64]> = high_pass_taps(sample_rate, cutoff_hz, &window).into();

        let mut cache = BTreeMap::new();
        cache.insert(cutoff_hz as u32, taps.clone());

        Self {
            sample_rate,
            frequency: cutoff_hz,
            design_frequency: cutoff_hz,
            window,
            core: FirCore::new(taps),
            cache,
            realtime: false,
        }
    }

    /// Number of taps.
    pub fn kernel_size(&self) -> usize {
        self.window.len()
    }

    /// Current cutoff in Hz.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Change the design cutoff; [`Filter::reset`] returns to it.
    pub fn set_frequency(&mut self, cutoff_hz: f64) {
        self.design_frequency = cutoff_hz;
        self.make_kernel(cutoff_hz);
    }

    /// Current taps.
    pub fn kernel(&self) -> &[f64] {
        &self.core.kernel
    }

    fn make_kernel(&mut self, cutoff_hz: f64) {
        self.frequency = cutoff_hz;
        let key = cutoff_hz as u32;
        if let Some(taps) = self.cache.get(&key) {
            self.core.set_kernel(taps.clone());
            return;
        }
        trace!(cutoff_hz, "designing high-pass FIR kernel");
        let taps: Arc<[f64]> = high_pass_taps(self.sample_rate, cutoff_hz, &self.window).into();
        self.cache.insert(key, taps.clone());
        self.core.set_kernel(taps);
    }
}

impl Filter for FirHighPass {
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
        self.core.reset();
        if self.frequency != self.design_frequency {
            self.make_kernel(self.design_frequency);
        }
    }

    fn filter_sample(&mut self, x: f64) -> f64 {
        self.core.filter(x)
    }

    fn filter_sample_at(&mut self, x: f64, frequency: f64) -> f64 {
        if frequency != self.frequency {
            self.make_kernel(frequency);
        }
        self.core.filter(x)
    }
}

/// Band-pass FIR: a high-pass at the low edge cascaded into a
/// low-pass at the high edge.
#[derive(Debug, Clone)]
pub struct FirBandPass {
    low_edge: f64,
    high_edge: f64,
    design_low: f64,
    design_high: f64,
    high_pass: FirHighPass,
    low_pass: FirLowPass,
    realtime: bool,
}

impl FirBandPass {
    /// Design a band-pass over `[low_edge_hz, high_edge_hz]`.
    ///
    /// # Panics
    /// Panics if the edges are not ordered, `sample_rate` is not
    /// positive, or `kernel_size < 2`.
    pub fn new(sample_rate: f64, low_edge_hz: f64, high_edge_hz: f64, kernel_size: usize) -> Self {
        assert!(low_edge_hz < high_edge_hz, "band edges must be ordered");
        Self {
            low_edge: low_edge_hz,
            high_edge: high_edge_hz,
            design_low: low_edge_hz,
            design_high: high_edge_hz,
            high_pass: FirHighPass::new(sample_rate, low_edge_hz, kernel_size),
            low_pass: FirLowPass::new(sample_rate, high_edge_hz, kernel_size),
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
        if low_edge_hz != self.low_edge {
            self.low_edge = low_edge_hz;
            self.high_pass.make_kernel(low_edge_hz);
        }
        if high_edge_hz != self.high_edge {
            self.high_edge = high_edge_hz;
            self.low_pass.make_kernel(high_edge_hz);
        }
        self.filter_sample(x)
    }
}

impl Filter for FirBandPass {
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
        self.low_pass.filter_sample(hp)
    }

    /// Shifts the band to center on `frequency`, keeping its width.
    fn filter_sample_at(&mut self, x: f64, frequency: f64) -> f64 {
        let half_width = (self.high_edge - self.low_edge) / 2.0;
        self.filter_sample_band(x, frequency - half_width, frequency + half_width)
    }
}

/// Band-reject FIR: the tap-wise sum of a low-pass at the low edge
/// and a high-pass at the high edge.
#[derive(Debug, Clone)]
pub struct FirBandReject {
    sample_rate: f64,
    low_edge: f64,
    high_edge: f64,
    design_low: f64,
    design_high: f64,
    window: Vec<f64>,
    core: FirCore,
    cache: BTreeMap<(u32, u32), Arc<[f64]>>,
    realtime: bool,
}

fn band_reject_taps(sample_rate: f64, low_edge_hz: f64, high_edge_hz: f64, window: &[f64]) -> Vec<f64> {
    let lp = low_pass_taps(sample_rate, low_edge_hz, window);
    let hp = high_pass_taps(sample_rate, high_edge_hz, window);
    lp.iter().zip(hp.iter()).map(|(l, h)| l + h).collect()
}

impl FirBandReject {
    /// Design a band-reject over `[low_edge_hz, high_edge_hz]`.
    ///
    /// # Panics
    /// Panics if the edges are not ordered, `sample_rate` is not
    /// positive, or `kernel_size < 2`.
    pub fn new(sample_rate: f64, low_edge_hz: f64, high_edge_hz: f64, kernel_size: usize) -> Self {
        assert!(sample_rate > 0.0, "sample_rate must be > 0");
        assert!(kernel_size >= 2, "kernel_size must be >= 2");
        assert!(low_edge_hz < high_edge_hz, "band edges must be ordered");

        let kernel_size = force_odd(kernel_size);
        let window = blackman_taps(kernel_size);
        let taps: Arc<[f64]> =
            band_reject_taps(sample_rate, low_edge_hz, high_edge_hz, &window).into();

        let mut cache = BTreeMap::new();
        cache.insert((low_edge_hz as u32, high_edge_hz as u32), taps.clone());

        Self {
            sample_rate,
            low_edge: low_edge_hz,
            high_edge: high_edge_hz,
            design_low: low_edge_hz,
            design_high: high_edge_hz,
            window,
            core: FirCore::new(taps),
            cache,
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

    fn make_kernel(&mut self, low_edge_hz: f64, high_edge_hz: f64) {
        self.low_edge = low_edge_hz;
        self.high_edge = high_edge_hz;
        let key = (low_edge_hz as u32, high_edge_hz as u32);
        if let Some(taps) = self.cache.get(&key) {
            self.core.set_kernel(taps.clone());
            return;
        }
        let taps: Arc<[f64]> =
            band_reject_taps(self.sample_rate, low_edge_hz, high_edge_hz, &self.window).into();
        self.cache.insert(key, taps.clone());
        self.core.set_kernel(taps);
    }

    /// Filter one sample with both band edges retuned.
    pub fn filter_sample_band(&mut self, x: f64, low_edge_hz: f64, high_edge_hz: f64) -> f64 {
        if low_edge_hz != self.low_edge || high_edge_hz != self.high_edge {
            self.make_kernel(low_edge_hz, high_edge_hz);
        }
        self.core.filter(x)
    }
}

impl Filter for FirBandReject {
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
        self.core.reset();
        if self.low_edge != self.design_low || self.high_edge != self.design_high {
            self.make_kernel(self.design_low, self.design_high);
        }
    }

    fn filter_sample(&mut self, x: f64) -> f64 {
        self.core.filter(x)
    }

    /// Shifts the rejected band to center on `frequency`.
    fn filter_sample_at(&mut self, x: f64, frequency: f64) -> f64 {
        let half_width = (self.high_edge - self.low_edge) / 2.0;
        self.filter_sample_band(x, frequency - half_width, frequency + half_width)
    }
}
