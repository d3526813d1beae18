//! Schroeder all-pass filter.

use crate::delay::DelayFilter;
use crate::filter::Filter;

/// All-pass built from a feed-forward and a feedback delay sharing one
/// delay time. Passes all frequencies at equal magnitude while
/// smearing phase, which is what makes reverb tails dense.
#[derive(Debug, Clone)]
pub struct AllPass {
    sample_rate: f64,
    gain: f64,
    x_delay: DelayFilter,
    y_delay: DelayFilter,
    y_history: f64,
    realtime: bool,
}

impl AllPass {
    /// Create an all-pass with `delay_s` seconds of delay and loop
    /// gain `gain`.
    ///
    /// # Panics
    /// Panics if `sample_rate` or `delay_s` is not positive.
    pub fn new(sample_rate: f64, delay_s: f64, gain: f64) -> Self {
        assert!(sample_rate > 0.0, "sample_rate must be > 0");
        assert!(delay_s > 0.0, "delay_s must be > 0");
        Self {
            sample_rate,
            gain,
            x_delay: DelayFilter::new(sample_rate, delay_s, delay_s),
            y_delay: DelayFilter::new(sample_rate, delay_s, delay_s),
            y_history: 0.0,
            realtime: false,
        }
    }

    /// Loop gain.
    pub fn gain(&self) -> f64 {
        self.gain
    }
}

impl Filter for AllPass {
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
        self.x_delay.reset();
        self.y_delay.reset();
        self.y_history = 0.0;
    }

    fn filter_sample(&mut self, x: f64) -> f64 {
        let y = self.gain * x + self.x_delay.filter_sample(x)
            - self.gain * self.y_delay.filter_sample(self.y_history);
        self.y_history = y;
        y
    }

    fn filter_sample_at(&mut self, x: f64, _frequency: f64) -> f64 {
        // The delay time is fixed at construction.
        self.filter_sample(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ondas_core::Buffer;
    use crate::filter::DEFAULT_RESPONSE_SIZE;

    #[test]
    fn test_impulse_leads_with_the_direct_gain() {
        let mut ap = AllPass::new(1000.0, 0.01, 0.7);
        let mut x = Buffer::zeros(16);
        x[0] = 1.0;
        let y = ap.filter_buffer(&x);
        assert!((y[0] - 0.7).abs() < 1e-12);
        assert!((y[10] - 1.0).abs() < 1e-12, "delayed copy at 10 samples");
    }

    #[test]
    fn test_impulse_response_is_stable() {
        let mut ap = AllPass::new(8000.0, 0.002, 0.5);
        let ir = ap.impulse_response(DEFAULT_RESPONSE_SIZE);
        assert!(ir.iter().all(|s| s.is_finite()));
        // With loop gain below 1 the tail dies out
        let late: f64 = (4096..8192).map(|i| ir[i].abs()).sum();
        assert!(late < 1e-3, "tail should have decayed, got {late}");
    }

    #[test]
    fn test_reset_clears_the_tail() {
        let mut ap = AllPass::new(1000.0, 0.005, 0.6);
        ap.set_realtime(true);
        for _ in 0..100 {
            ap.filter_sample(1.0);
        }
        ap.reset();
        assert!((ap.filter_sample(0.0)).abs() < 1e-12);
    }
}
