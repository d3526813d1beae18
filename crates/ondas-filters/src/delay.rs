//! Streaming delay with a runtime-adjustable delay time.
//!
//! Unlike [`ondas_core::DelayLine`], which rounds the delay to the
//! nearest sample, this filter truncates. Both behaviors are kept;
//! reverbs built from summed combs depend on the truncating variant.

use crate::filter::Filter;

/// Fixed-capacity delay whose active delay can be changed per sample.
#[derive(Debug, Clone)]
pub struct DelayFilter {
    sample_rate: f64,
    max_delay_s: f64,
    delay_s: f64,
    buffer: Vec<f64>,
    write_idx: usize,
    realtime: bool,
}

impl DelayFilter {
    /// Allocate for up to `max_delay_s` seconds, starting at `delay_s`.
    ///
    /// # Panics
    /// Panics if `sample_rate` or `max_delay_s` is not positive, or if
    /// `delay_s` is outside `[0, max_delay_s]`.
    pub fn new(sample_rate: f64, delay_s: f64, max_delay_s: f64) -> Self {
        assert!(sample_rate > 0.0, "sample_rate must be > 0");
        assert!(max_delay_s > 0.0, "max_delay_s must be > 0");
        assert!(
            (0.0..=max_delay_s).contains(&delay_s),
            "delay_s must be within [0, max_delay_s]"
        );
        let n = (sample_rate * max_delay_s).ceil() as usize + 1;
        Self {
            sample_rate,
            max_delay_s,
            delay_s,
            buffer: vec![0.0; n],
            write_idx: 0,
            realtime: false,
        }
    }

    /// Current delay in seconds.
    pub fn delay(&self) -> f64 {
        self.delay_s
    }

    /// Longest representable delay in seconds.
    pub fn max_delay(&self) -> f64 {
        self.max_delay_s
    }

    /// Set the delay, clamped to `[0, max_delay]`.
    pub fn set_delay(&mut self, delay_s: f64) {
        self.delay_s = delay_s.clamp(0.0, self.max_delay_s);
    }
}

impl Filter for DelayFilter {
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
        self.buffer.iter_mut().for_each(|s| *s = 0.0);
        self.write_idx = 0;
    }

    fn filter_sample(&mut self, x: f64) -> f64 {
        let n = self.buffer.len();
        self.buffer[self.write_idx] = x;
        self.write_idx = (self.write_idx + 1) % n;

        // Truncated, not rounded.
        let d = (self.sample_rate * self.delay_s) as usize;
        let read = (self.write_idx + n - d - 1) % n;
        self.buffer[read]
    }

    /// The control parameter is a delay in seconds, not a frequency.
    fn filter_sample_at(&mut self, x: f64, delay_s: f64) -> f64 {
        self.set_delay(delay_s);
        self.filter_sample(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ondas_core::Buffer;

    #[test]
    fn test_impulse_emerges_after_the_delay() {
        let mut delay = DelayFilter::new(1000.0, 0.01, 0.1); // 10 samples
        let mut x = Buffer::zeros(32);
        x[0] = 1.0;
        let y = delay.filter_buffer(&x);
        assert_eq!(y[10], 1.0);
        for (i, &s) in y.iter().enumerate() {
            if i != 10 {
                assert_eq!(s, 0.0, "sample {i} should be silent");
            }
        }
    }

    #[test]
    fn test_zero_delay_is_identity() {
        let mut delay = DelayFilter::new(1000.0, 0.0, 0.1);
        for i in 0..50 {
            let x = i as f64 * 0.1;
            assert_eq!(delay.filter_sample(x), x);
        }
    }

    #[test]
    fn test_delay_time_truncates_to_samples() {
        // 0.0129 s at 1 kHz is 12.9 samples; the filter uses 12
        let mut delay = DelayFilter::new(1000.0, 0.0129, 0.1);
        let mut x = Buffer::zeros(20);
        x[0] = 1.0;
        let y = delay.filter_buffer(&x);
        assert_eq!(y[12], 1.0);
    }

    #[test]
    fn test_dynamic_delay_clamps_to_capacity() {
        let mut delay = DelayFilter::new(1000.0, 0.01, 0.05);
        delay.filter_sample_at(1.0, 0.2);
        assert_eq!(delay.delay(), 0.05);
        delay.filter_sample_at(1.0, -1.0);
        assert_eq!(delay.delay(), 0.0);
    }
}
