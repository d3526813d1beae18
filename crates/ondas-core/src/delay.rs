//! Circular delay line with a runtime-variable read offset.
//!
//! [`DelayLine`] is the building block under the echo-style filters: a
//! fixed-size circular buffer sized at construction for a maximum delay,
//! read at any shorter delay per call.
//!
//! The read offset is `round(sample_rate * delay_time)` samples behind the
//! write index. Reads at a zero delay return the *oldest* sample in the
//! buffer (the slot the next write will overwrite), matching the classic
//! tape-loop layout.

#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Circular delay buffer.
///
/// # Example
///
/// ```rust
/// use ondas_core::DelayLine;
///
/// let mut delay = DelayLine::new(100.0, 0.1); // up to 10 samples
///
/// for i in 0..5 {
///     delay.write(i as f64);
/// }
/// // 3 samples of delay at 100 Hz
/// assert_eq!(delay.read(0.03), 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct DelayLine {
    sample_rate: f64,
    max_delay_time: f64,
    delay_time: f64,
    buffer: Vec<f64>,
    wr_idx: usize,
}

impl DelayLine {
    /// Create a delay line holding up to `max_delay_s` seconds of signal.
    ///
    /// # Panics
    /// Panics if `sample_rate` or `max_delay_s` is not positive.
    pub fn new(sample_rate: f64, max_delay_s: f64) -> Self {
        assert!(sample_rate > 0.0, "sample_rate must be > 0");
        assert!(max_delay_s > 0.0, "max_delay_s must be > 0");

        let n = (sample_rate * max_delay_s) as usize + 1;

        Self {
            sample_rate,
            max_delay_time: max_delay_s,
            delay_time: max_delay_s,
            buffer: vec![0.0; n],
            wr_idx: 0,
        }
    }

    /// Sample rate the line was constructed for.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Maximum delay in seconds.
    pub fn max_delay(&self) -> f64 {
        self.max_delay_time
    }

    /// Store one sample, advancing the write index.
    #[inline]
    pub fn write(&mut self, x: f64) {
        self.buffer[self.wr_idx] = x;
        self.wr_idx += 1;
        if self.wr_idx >= self.buffer.len() {
            self.wr_idx = 0;
        }
    }

    /// Read at the most recently used delay time.
    #[inline]
    pub fn read_last(&self) -> f64 {
        let offset = (self.sample_rate * self.delay_time + 0.5) as usize;

        if offset > self.wr_idx {
            self.buffer[self.buffer.len() - (offset - self.wr_idx)]
        } else {
            self.buffer[self.wr_idx - offset]
        }
    }

    /// Read at `delay_s` seconds, clamped to `[0, max_delay]`.
    #[inline]
    pub fn read(&mut self, delay_s: f64) -> f64 {
        self.delay_time = delay_s.clamp(0.0, self.max_delay_time);
        self.read_last()
    }

    /// Write then read in one step.
    #[inline]
    pub fn process(&mut self, x: f64, delay_s: f64) -> f64 {
        self.write(x);
        self.read(delay_s)
    }

    /// Clear the buffer and restore the delay time to the maximum.
    pub fn reset(&mut self) {
        self.wr_idx = 0;
        self.delay_time = self.max_delay_time;
        self.buffer.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_delay() {
        let mut delay = DelayLine::new(1000.0, 0.01); // 11-sample buffer

        let mut out = Vec::new();
        for i in 0..10 {
            out.push(delay.process(i as f64, 0.005)); // 5 samples
        }

        // First 5 outputs are the zero fill, then the input reappears.
        assert_eq!(&out[..5], &[0.0; 5]);
        assert_eq!(&out[5..], &[1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_delay_time_is_rounded() {
        let mut delay = DelayLine::new(1000.0, 0.01);
        delay.write(1.0);
        delay.write(2.0);

        // 1.6 samples rounds to 2
        assert_eq!(delay.read(0.0016), 1.0);
        // 1.4 samples rounds to 1
        assert_eq!(delay.read(0.0014), 2.0);
    }

    #[test]
    fn test_delay_clamped_to_max() {
        let mut delay = DelayLine::new(100.0, 0.05); // 6-sample buffer
        for i in 0..6 {
            delay.write(i as f64);
        }
        // Requests beyond the maximum read at the maximum.
        assert_eq!(delay.read(10.0), delay.read(0.05));
    }

    #[test]
    fn test_reset_clears_state() {
        let mut delay = DelayLine::new(100.0, 0.1);
        for _ in 0..20 {
            delay.write(1.0);
        }
        delay.reset();
        assert_eq!(delay.read(0.05), 0.0);
    }

    #[test]
    #[should_panic]
    fn test_zero_max_delay_panics() {
        let _ = DelayLine::new(100.0, 0.0);
    }
}
