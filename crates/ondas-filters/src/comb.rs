//! Feedback comb filter with a one-pole low-pass in the loop.

use crate::delay::DelayFilter;
use crate::filter::Filter;

/// Comb filter whose feedback path is damped by a one-pole low-pass.
///
/// This is the classic Schroeder reverberator building block: the
/// output is the delayed signal, and what is fed back is a low-passed
/// copy so high frequencies decay faster than lows.
#[derive(Debug, Clone)]
pub struct CombLowPassFeedback {
    sample_rate: f64,
    delay: DelayFilter,
    feedback: f64,
    frequency: f64,
    damp1: f64,
    damp2: f64,
    y_history: f64,
    realtime: bool,
}

impl CombLowPassFeedback {
    /// Create a comb with `delay_s` seconds of delay, feedback gain
    /// `feedback` (clamped below 1 to stay stable), and a low-pass at
    /// `lowpass_hz` in the feedback path.
    ///
    /// # Panics
    /// Panics if `sample_rate` or `delay_s` is not positive.
    pub fn new(sample_rate: f64, delay_s: f64, feedback: f64, lowpass_hz: f64) -> Self {
        assert!(sample_rate > 0.0, "sample_rate must be > 0");
        assert!(delay_s > 0.0, "delay_s must be > 0");
        let mut comb = Self {
            sample_rate,
            delay: DelayFilter::new(sample_rate, delay_s, delay_s),
            feedback: feedback.clamp(0.0, 0.999_999),
            frequency: lowpass_hz,
            damp1: 0.0,
            damp2: 1.0,
            y_history: 0.0,
            realtime: false,
        };
        comb.set_lowpass_frequency(lowpass_hz);
        comb
    }

    /// Feedback gain.
    pub fn feedback(&self) -> f64 {
        self.feedback
    }

    /// Set the feedback gain, clamped to `[0, 0.999999]`.
    pub fn set_feedback(&mut self, feedback: f64) {
        self.feedback = feedback.clamp(0.0, 0.999_999);
    }

    /// Low-pass frequency in the feedback path.
    pub fn lowpass_frequency(&self) -> f64 {
        self.frequency
    }

    /// Retune the damping low-pass. The damping coefficient saturates
    /// at half the sample rate.
    pub fn set_lowpass_frequency(&mut self, lowpass_hz: f64) {
        self.frequency = lowpass_hz;
        self.damp1 = (lowpass_hz / self.sample_rate).min(0.5);
        self.damp2 = 1.0 - self.damp1;
    }
}

impl Filter for CombLowPassFeedback {
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
        self.delay.reset();
        self.y_history = 0.0;
    }

    fn filter_sample(&mut self, x: f64) -> f64 {
        let d = self.delay.filter_sample(x + self.y_history * self.feedback);
        self.y_history = d * self.damp2 + self.y_history * self.damp1;
        d
    }

    fn filter_sample_at(&mut self, x: f64, frequency: f64) -> f64 {
        if frequency != self.frequency {
            self.set_lowpass_frequency(frequency);
        }
        self.filter_sample(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ondas_core::Buffer;

    #[test]
    fn test_impulse_echoes_at_the_delay_period() {
        // With the damping low-pass at 0 Hz the feedback state tracks
        // the delayed sample exactly, so the echoes are clean. The
        // feedback path carries one extra sample of latency.
        let sr = 1000.0;
        let mut comb = CombLowPassFeedback::new(sr, 0.01, 0.5, 0.0);
        let mut x = Buffer::zeros(40);
        x[0] = 1.0;
        let y = comb.filter_buffer(&x);

        assert_eq!(y[10], 1.0, "first pass through the delay");
        assert!((y[21] - 0.5).abs() < 1e-9, "one trip of feedback");
        assert!((y[32] - 0.25).abs() < 1e-9, "two trips");
    }

    #[test]
    fn test_feedback_is_clamped_below_unity() {
        let comb = CombLowPassFeedback::new(1000.0, 0.01, 2.0, 500.0);
        assert!(comb.feedback() < 1.0);
    }

    #[test]
    fn test_impulse_response_decays() {
        let sr = 8000.0;
        let mut comb = CombLowPassFeedback::new(sr, 0.005, 0.9, 400.0);

        let mut x = Buffer::zeros(4000);
        x[0] = 1.0;
        let y = comb.filter_buffer(&x);

        let early: f64 = (0..1000).map(|i| y[i] * y[i]).sum();
        let late: f64 = (3000..4000).map(|i| y[i] * y[i]).sum();
        assert!(late < early / 2.0, "tail should decay: {late} vs {early}");
    }

    #[test]
    fn test_output_stays_bounded() {
        let mut comb = CombLowPassFeedback::new(1000.0, 0.003, 0.999, 400.0);
        let x = Buffer::ones(5000);
        let y = comb.filter_buffer(&x);
        assert!(y.iter().all(|s| s.is_finite()));
    }
}
