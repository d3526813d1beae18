//! Channel vocoder.
//!
//! Splits a modulating voice and a carrier into matched mel-spaced
//! bands, tracks the voice's per-band envelope with a moving average,
//! and rebuilds the carrier with each band scaled by that envelope.

use ondas_core::{Buffer, hz_to_mel, mel_to_hz};
use tracing::debug;

use crate::filter::Filter;
use crate::iir::IirBandPass;
use crate::moving_average::MovingAverage;

/// Ripple fraction for the band-splitting filters.
const BAND_RIPPLE: f64 = 0.01;

/// Poles per band-splitting filter.
const BAND_POLES: usize = 6;

/// One mel-spaced analysis/synthesis band.
#[derive(Debug, Clone)]
struct Band {
    analysis: IirBandPass,
    synthesis: IirBandPass,
    envelope: MovingAverage,
}

/// Imposes the spectral envelope of a voice signal onto a carrier.
#[derive(Debug, Clone)]
pub struct Vocoder {
    sample_rate: f64,
    window_size: usize,
    freq_max: f64,
    bands: Vec<Band>,
}

impl Vocoder {
    /// Build a vocoder with `n_bands` mel-spaced bands up to
    /// `freq_max_hz`, smoothing envelopes over `window_length_seconds`.
    ///
    /// # Panics
    /// Panics if the window is shorter than 5 ms, `n_bands < 4`, or
    /// `freq_max_hz` is below 5% of the sample rate.
    pub fn new(
        sample_rate: f64,
        window_length_seconds: f64,
        n_bands: usize,
        freq_max_hz: f64,
    ) -> Self {
        assert!(sample_rate > 0.0, "sample_rate must be > 0");

        let window_size = (window_length_seconds * sample_rate) as usize;
        assert!(
            window_size as f64 >= sample_rate * 0.005,
            "envelope window must be at least 5 ms"
        );
        assert!(n_bands >= 4, "need at least 4 bands");
        assert!(
            freq_max_hz >= 0.05 * sample_rate,
            "freq_max_hz must be at least 5% of the sample rate"
        );

        // Band centers uniformly spaced on the mel scale.
        let mel_hi = hz_to_mel(freq_max_hz);
        let bw_mel = mel_hi / n_bands as f64;
        let centers: Vec<f64> = (0..n_bands)
            .map(|i| mel_to_hz((i + 1) as f64 * bw_mel - bw_mel / 2.0))
            .collect();

        let mut bands = Vec::with_capacity(n_bands);
        for i in 0..n_bands {
            let f_lo = if i == 0 {
                0.0
            } else {
                (centers[i] + centers[i - 1]) / 2.0
            };
            let f_hi = if i == n_bands - 1 {
                freq_max_hz
            } else {
                (centers[i] + centers[i + 1]) / 2.0
            };

            debug!(band = i, f_lo, f_hi, "vocoder band edges");

            bands.push(Band {
                analysis: IirBandPass::new(sample_rate, BAND_POLES, f_lo, f_hi, BAND_RIPPLE),
                synthesis: IirBandPass::new(sample_rate, BAND_POLES, f_lo, f_hi, BAND_RIPPLE),
                envelope: MovingAverage::new(sample_rate, window_size),
            });
        }

        Self {
            sample_rate,
            window_size,
            freq_max: freq_max_hz,
            bands,
        }
    }

    /// Sample rate the vocoder runs at.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Number of mel-spaced bands.
    pub fn n_bands(&self) -> usize {
        self.bands.len()
    }

    /// Envelope smoothing window in samples.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Highest analyzed frequency in Hz.
    pub fn freq_max(&self) -> f64 {
        self.freq_max
    }

    /// Zero all band filter and envelope state.
    pub fn reset(&mut self) {
        for band in &mut self.bands {
            band.analysis.reset();
            band.synthesis.reset();
            band.envelope.reset();
        }
    }

    /// Process one voice/carrier sample pair.
    pub fn filter_sample(&mut self, voice: f64, carrier: f64) -> f64 {
        let mut y = 0.0;
        for band in &mut self.bands {
            let v = band.analysis.filter_sample(voice);
            let env = band.envelope.filter_sample(v.abs());
            y += env * band.synthesis.filter_sample(carrier);
        }
        y
    }

    /// Process whole buffers. The output follows the carrier's length;
    /// a shorter voice is read circularly.
    pub fn filter_buffer(&mut self, voice: &Buffer, carrier: &Buffer) -> Buffer {
        if voice.is_empty() || carrier.is_empty() {
            return Buffer::new();
        }
        let mut out = Buffer::with_capacity(carrier.len());
        for (i, &c) in carrier.iter().enumerate() {
            out.push(self.filter_sample(voice[i % voice.len()], c));
        }
        out
    }
}
