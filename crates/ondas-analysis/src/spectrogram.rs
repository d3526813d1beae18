//! Sliding-window time-frequency analysis.
//!
//! [`Spectrogram`] slices a signal into windows of `time_window` seconds
//! every `time_step` seconds, transforms each one, and stores the
//! half-spectra as rows. Windows are centered on their time stamp, so the
//! first few read before the start of the signal; the missing samples are
//! zero.

use ondas_core::{Buffer, Window};
use tracing::debug;

use crate::transform::{FftTransform, round_up_to_power_of_2};

/// Time-frequency matrix of a signal.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    sample_rate: f64,
    time_step: f64,
    nfft: usize,
    n_window_samples: usize,
    frequency_axis: Buffer,
    time_axis: Buffer,
    real: Vec<Buffer>,
    imag: Vec<Buffer>,
}

impl Spectrogram {
    /// Analyze `x` with windows of `time_window_s` seconds every
    /// `time_step_s` seconds.
    ///
    /// # Panics
    /// Panics if `sample_rate`, `time_window_s`, or `time_step_s` is not
    /// positive.
    pub fn new(
        x: &Buffer,
        sample_rate: f64,
        time_window_s: f64,
        time_step_s: f64,
        window: Window,
    ) -> Self {
        assert!(sample_rate > 0.0, "sample_rate must be > 0");
        assert!(time_window_s > 0.0, "time_window_s must be > 0");
        assert!(time_step_s > 0.0, "time_step_s must be > 0");

        let n_window_samples = ((time_window_s * sample_rate + 0.5) as usize).max(1);
        let window_step = ((time_step_s * sample_rate + 0.5) as usize).max(1);
        let nfft = round_up_to_power_of_2(n_window_samples);

        let mut engine = FftTransform::new(sample_rate);
        engine.set_window(window);

        let h_window = n_window_samples / 2;
        let n_samples = x.len() as i64;

        let mut real = Vec::new();
        let mut imag = Vec::new();
        let mut time_axis = Buffer::new();
        let mut frequency_axis = Buffer::new();

        let mut time = 0.0;
        let mut start = -(h_window as i64);
        while start < n_samples {
            time_axis.push(time);

            // Extract the window, zero-filling past either end.
            let sub = if start < 0 {
                let n_left = (start + n_window_samples as i64).max(0) as usize;
                let mut padded = Buffer::zeros(n_window_samples - n_left);
                padded.extend(&x.subbuffer(0, n_left));
                padded
            } else {
                x.subbuffer(start as usize, n_window_samples)
            };

            let Ok(chunks) = engine.fft_frames(&sub, nfft, 0) else {
                break;
            };
            let Some(chunk) = chunks.first() else {
                break;
            };

            if frequency_axis.is_empty() {
                // Drop the DC bin, matching the row width of nfft/2.
                frequency_axis = chunk.frequency_axis().subbuffer(1, nfft / 2);
            }
            real.push(chunk.real_half());
            imag.push(chunk.imag_half());

            start += window_step as i64;
            time += time_step_s;
        }

        debug!(
            n_frames = real.len(),
            nfft, n_window_samples, "spectrogram computed"
        );

        Self {
            sample_rate,
            time_step: time_step_s,
            nfft,
            n_window_samples,
            frequency_axis,
            time_axis,
            real,
            imag,
        }
    }

    /// Sample rate of the analyzed signal.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Hop between rows in seconds.
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Transform size used per row.
    pub fn nfft(&self) -> usize {
        self.nfft
    }

    /// Analysis window length in samples.
    pub fn window_samples(&self) -> usize {
        self.n_window_samples
    }

    /// Number of analysis frames (rows).
    pub fn n_frames(&self) -> usize {
        self.real.len()
    }

    /// Center frequency of each spectrum column in Hz.
    pub fn frequency_axis(&self) -> &Buffer {
        &self.frequency_axis
    }

    /// Time stamp of each row in seconds.
    pub fn time_axis(&self) -> &Buffer {
        &self.time_axis
    }

    /// Magnitude rows: `sqrt(re^2 + im^2)` per frame.
    pub fn magnitude(&self) -> Vec<Buffer> {
        self.real
            .iter()
            .zip(self.imag.iter())
            .map(|(re, im)| {
                re.iter()
                    .zip(im.iter())
                    .map(|(r, i)| (r * r + i * i).sqrt())
                    .collect()
            })
            .collect()
    }

    /// Magnitude of one row, or `None` past the end.
    pub fn magnitude_at(&self, frame: usize) -> Option<Buffer> {
        let re = self.real.get(frame)?;
        let im = self.imag.get(frame)?;
        Some(
            re.iter()
                .zip(im.iter())
                .map(|(r, i)| (r * r + i * i).sqrt())
                .collect(),
        )
    }

    /// Summed magnitude over the columns whose center frequency falls in
    /// `[lo_hz, hi_hz]`, one value per frame.
    pub fn extract_band(&self, lo_hz: f64, hi_hz: f64) -> Buffer {
        self.magnitude()
            .iter()
            .map(|row| {
                row.iter()
                    .zip(self.frequency_axis.iter())
                    .filter(|&(_, &f)| f >= lo_hz && f <= hi_hz)
                    .map(|(m, _)| m)
                    .sum()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::PI;

    fn sine(sample_rate: f64, freq: f64, n: usize) -> Buffer {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_frame_count_and_axes() {
        let sr = 1000.0;
        let signal = Buffer::zeros(1000); // 1 second
        let spec = Spectrogram::new(&signal, sr, 0.064, 0.1, Window::Hann);

        // Frames start at -32 samples, stepping 100: 11 frames cover 1s
        assert_eq!(spec.n_frames(), 11);
        assert_eq!(spec.time_axis().len(), 11);
        assert!((spec.time_axis()[1] - 0.1).abs() < 1e-12);
        assert_eq!(spec.nfft(), 64);
        assert_eq!(spec.frequency_axis().len(), 32);
    }

    #[test]
    fn test_pure_tone_peaks_at_its_frequency() {
        let sr = 1000.0;
        let signal = sine(sr, 125.0, 2000);
        let spec = Spectrogram::new(&signal, sr, 0.128, 0.2, Window::Hann);

        // Skip the first frame (half zero fill) and check a steady one.
        let row = spec.magnitude_at(5).unwrap();
        let peak = row.find_max().unwrap();
        let freq = spec.frequency_axis()[peak];
        assert!(
            (freq - 125.0).abs() <= sr / spec.nfft() as f64,
            "peak at {freq} Hz, expected 125"
        );
    }

    #[test]
    fn test_extract_band_tracks_energy() {
        let sr = 1000.0;
        let mut signal = sine(sr, 100.0, 1000);
        signal.extend(&Buffer::zeros(1000));
        let spec = Spectrogram::new(&signal, sr, 0.1, 0.1, Window::Hann);

        let band = spec.extract_band(80.0, 120.0);
        let first_half: f64 = (1..8).map(|i| band[i]).sum();
        let second_half: f64 = (12..19).map(|i| band[i]).sum();
        assert!(
            first_half > 10.0 * second_half,
            "tone energy should sit in the first half: {first_half} vs {second_half}"
        );
    }
}
