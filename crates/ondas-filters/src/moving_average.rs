//! Running-mean filter with an O(1) sliding sum.

use crate::filter::Filter;

/// Moving average over the last `n` samples.
///
/// The first sample primes the whole history, so the output starts at
/// the input level instead of ramping up from zero. Used by the
/// vocoder as a cheap envelope follower.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    sample_rate: f64,
    n: usize,
    history: Vec<f64>,
    idx: usize,
    running_sum: f64,
    primed: bool,
    realtime: bool,
}

impl MovingAverage {
    /// Average over `n_samples` past samples.
    ///
    /// # Panics
    /// Panics if `sample_rate` is not positive or `n_samples` is zero.
    pub fn new(sample_rate: f64, n_samples: usize) -> Self {
        assert!(sample_rate > 0.0, "sample_rate must be > 0");
        assert!(n_samples > 0, "n_samples must be > 0");
        Self {
            sample_rate,
            n: n_samples,
            history: vec![0.0; n_samples],
            idx: 0,
            running_sum: 0.0,
            primed: false,
            realtime: false,
        }
    }

    /// Window length in samples.
    pub fn window_samples(&self) -> usize {
        self.n
    }
}

impl Filter for MovingAverage {
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
        self.history.iter_mut().for_each(|h| *h = 0.0);
        self.idx = 0;
        self.running_sum = 0.0;
        self.primed = false;
    }

    fn filter_sample(&mut self, x: f64) -> f64 {
        if !self.primed {
            self.history.iter_mut().for_each(|h| *h = x);
            self.running_sum = x * self.n as f64;
            self.primed = true;
            return x;
        }

        let last = self.history[self.idx];
        self.history[self.idx] = x;
        self.idx = (self.idx + 1) % self.n;
        self.running_sum += x - last;
        self.running_sum / self.n as f64
    }

    fn filter_sample_at(&mut self, x: f64, _frequency: f64) -> f64 {
        // The window length is fixed; there is nothing to retune.
        self.filter_sample(x)
    }
}
