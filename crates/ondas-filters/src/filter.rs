//! The single-sample streaming filter contract.
//!
//! Every filter in this crate processes one `f64` at a time through
//! [`Filter::filter_sample`], optionally retuned per sample through
//! [`Filter::filter_sample_at`]. Whole-buffer processing, impulse,
//! frequency, and phase responses are provided on top of the
//! per-sample methods.
//!
//! Batch calls reset the filter state first unless the filter has been
//! put in realtime mode, where state must survive across buffers.

use ondas_analysis::FftTransform;
use ondas_core::Buffer;

/// Response length used when no explicit transform size is given.
pub const DEFAULT_RESPONSE_SIZE: usize = 8192;

/// A causal single-sample filter.
pub trait Filter {
    /// Sample rate the filter was designed at.
    fn sample_rate(&self) -> f64;

    /// True when state is preserved across batch calls.
    fn is_realtime(&self) -> bool;

    /// Preserve state across batch calls (streaming use).
    fn set_realtime(&mut self, realtime: bool);

    /// Zero all history and return a swept filter to its design
    /// parameters. Per-sample retunes via [`Filter::filter_sample_at`]
    /// are transient; only the constructor and the explicit setters
    /// move the design point.
    fn reset(&mut self);

    /// Filter one sample.
    fn filter_sample(&mut self, x: f64) -> f64;

    /// Filter one sample with the control parameter retuned first.
    ///
    /// The parameter is a frequency in Hz for most filters; delay
    /// filters interpret it as a delay in seconds. Filters without a
    /// tunable parameter ignore it.
    fn filter_sample_at(&mut self, x: f64, frequency: f64) -> f64;

    /// Filter a whole buffer.
    fn filter_buffer(&mut self, x: &Buffer) -> Buffer {
        if !self.is_realtime() {
            self.reset();
        }
        x.iter().map(|&s| self.filter_sample(s)).collect()
    }

    /// Filter a whole buffer at one fixed parameter value.
    fn filter_buffer_at(&mut self, x: &Buffer, frequency: f64) -> Buffer {
        if !self.is_realtime() {
            self.reset();
        }
        x.iter().map(|&s| self.filter_sample_at(s, frequency)).collect()
    }

    /// Filter a buffer with a per-sample parameter track. The track is
    /// read circularly when it is shorter than the input; an empty
    /// track leaves the design untouched.
    fn filter_buffer_dynamic(&mut self, x: &Buffer, frequencies: &Buffer) -> Buffer {
        if frequencies.is_empty() {
            return self.filter_buffer(x);
        }
        if !self.is_realtime() {
            self.reset();
        }
        x.iter()
            .enumerate()
            .map(|(i, &s)| self.filter_sample_at(s, frequencies[i % frequencies.len()]))
            .collect()
    }

    /// Response to a unit impulse, `n_samples` long. The filter is
    /// reset before and after so the probe leaves no trace.
    fn impulse_response(&mut self, n_samples: usize) -> Buffer {
        self.reset();
        let mut out = Buffer::with_capacity(n_samples);
        if n_samples > 0 {
            out.push(self.filter_sample(1.0));
            for _ in 1..n_samples {
                out.push(self.filter_sample(0.0));
            }
        }
        self.reset();
        out
    }

    /// Magnitude spectrum of the impulse response, `n_fft/2 + 1` bins
    /// from DC to Nyquist.
    fn frequency_response(&mut self, n_fft: usize) -> Buffer {
        let ir = self.impulse_response(n_fft);
        FftTransform::new(self.sample_rate()).fft(&ir).magnitude()
    }

    /// Phase spectrum of a two-second impulse response.
    fn phase_response(&mut self) -> Buffer {
        let n = (2.0 * self.sample_rate()) as usize;
        let ir = self.impulse_response(n.max(2));
        FftTransform::new(self.sample_rate()).fft(&ir).phase()
    }

    /// Frequency in Hz of each [`Filter::frequency_response`] bin.
    fn frequency_axis(&self, n_fft: usize) -> Buffer {
        let chunk = ondas_analysis::round_up_to_power_of_2(n_fft);
        let step = self.sample_rate() / chunk as f64;
        (0..=chunk / 2).map(|i| i as f64 * step).collect()
    }
}
