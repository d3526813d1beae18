//! One-pole low-pass tone filter.

use std::collections::BTreeMap;

use ondas_core::hz_to_omega;

use crate::filter::Filter;

/// One-pole low-pass with unity DC gain.
///
/// The pole is recomputed from the cutoff frequency on demand;
/// coefficients are cached with tenth-of-a-Hz resolution so sweeping
/// the cutoff does not redo the trig every sample.
#[derive(Debug, Clone)]
pub struct ToneFilter {
    sample_rate: f64,
    frequency: f64,
    design_frequency: f64,
    a: f64,
    b: f64,
    y_prev: f64,
    realtime: bool,
    cache: BTreeMap<u32, (f64, f64)>,
}

impl ToneFilter {
    /// Create a tone filter with the given cutoff in Hz.
    ///
    /// # Panics
    /// Panics if `sample_rate` is not positive.
    pub fn new(sample_rate: f64, cutoff_hz: f64) -> Self {
        assert!(sample_rate > 0.0, "sample_rate must be > 0");
        let mut tone = Self {
            sample_rate,
            frequency: cutoff_hz,
            design_frequency: cutoff_hz,
            a: 0.0,
            b: 1.0,
            y_prev: 0.0,
            realtime: false,
            cache: BTreeMap::new(),
        };
        tone.make_kernel(cutoff_hz);
        tone
    }

    /// Current cutoff frequency in Hz.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    fn make_kernel(&mut self, cutoff_hz: f64) {
        self.frequency = cutoff_hz;
        let key = (cutoff_hz * 10.0) as u32;
        if let Some(&(a, b)) = self.cache.get(&key) {
            self.a = a;
            self.b = b;
            return;
        }

        let omega = hz_to_omega(cutoff_hz, self.sample_rate);
        let temp = 2.0 - omega.cos();
        let a = -(temp - (temp * temp - 1.0).sqrt());
        let b = 1.0 + a;

        self.cache.insert(key, (a, b));
        self.a = a;
        self.b = b;
    }
}

impl Filter for ToneFilter {
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
        self.y_prev = 0.0;
        if self.frequency != self.design_frequency {
            self.make_kernel(self.design_frequency);
        }
    }

    fn filter_sample(&mut self, x: f64) -> f64 {
        let y = self.b * x - self.a * self.y_prev;
        self.y_prev = y;
        y
    }

    fn filter_sample_at(&mut self, x: f64, frequency: f64) -> f64 {
        if frequency != self.frequency {
            self.make_kernel(frequency);
        }
        self.filter_sample(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ondas_core::Buffer;

    #[test]
    fn test_dc_passes_at_unity() {
        let mut tone = ToneFilter::new(44100.0, 1000.0);
        let mut y = 0.0;
        for _ in 0..2000 {
            y = tone.filter_sample(1.0);
        }
        assert!((y - 1.0).abs() < 1e-6, "DC gain should be 1, got {y}");
    }

    #[test]
    fn test_high_frequencies_are_attenuated() {
        let sr = 44100.0;
        let mut tone = ToneFilter::new(sr, 100.0);

        let high: Buffer = (0..2000)
            .map(|i| (2.0 * std::f64::consts::PI * 10_000.0 * i as f64 / sr).sin())
            .collect();
        let out = tone.filter_buffer(&high);

        let tail: f64 = (1000..2000).map(|i| out[i].abs()).sum::<f64>() / 1000.0;
        assert!(tail < 0.05, "10 kHz should be well below the 100 Hz cutoff: {tail}");
    }

    #[test]
    fn test_batch_resets_unless_realtime() {
        let mut tone = ToneFilter::new(1000.0, 50.0);
        let step = Buffer::ones(100);

        let first = tone.filter_buffer(&step);
        let second = tone.filter_buffer(&step);
        assert_eq!(first[0], second[0], "offline batches start from silence");

        tone.set_realtime(true);
        let third = tone.filter_buffer(&step);
        assert!(third[0] > second[0], "realtime keeps the charged state");
    }

    #[test]
    fn test_dynamic_cutoff_retunes() {
        let mut tone = ToneFilter::new(8000.0, 100.0);
        tone.filter_sample_at(0.5, 2000.0);
        assert_eq!(tone.frequency(), 2000.0);
    }

    #[test]
    fn test_reset_restores_design_cutoff() {
        let mut tone = ToneFilter::new(8000.0, 100.0);
        let (a0, b0) = (tone.a, tone.b);
        tone.filter_sample_at(0.5, 2000.0);

        // An offline batch resets first, so a swept filter snaps back
        // to its construction-time cutoff.
        tone.filter_buffer(&Buffer::ones(8));
        assert_eq!(tone.frequency(), 100.0);
        assert_eq!((tone.a, tone.b), (a0, b0));
    }
}
