//! Mathematical utility functions for DSP.
//!
//! Provides the shared conversions used across the toolkit. All functions
//! are allocation-free and suitable for `no_std`.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//!
//! # Frequency Conversions
//!
//! - [`hz_to_omega`] - Frequency to normalized angular frequency
//! - [`hz_to_mel`] / [`mel_to_hz`] - Perceptual mel scale, used to lay out
//!   vocoder band centers

use libm::{exp, log, log10, pow};

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use ondas_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 1e-12);
/// assert!((db_to_linear(-6.0205999) - 0.5).abs() < 1e-6);
/// ```
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f64 = core::f64::consts::LN_10 / 20.0;
    exp(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Values at or below zero are clamped to avoid `-inf`.
///
/// # Example
/// ```rust
/// use ondas_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 1e-12);
/// assert!((linear_to_db(0.5) + 6.0206).abs() < 1e-4);
/// ```
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    const FACTOR: f64 = 20.0 / core::f64::consts::LN_10;
    log(if linear > 1e-15 { linear } else { 1e-15 }) * FACTOR
}

/// Convert a frequency in Hz to normalized angular frequency in
/// radians/sample at the given sample rate.
#[inline]
pub fn hz_to_omega(frequency_hz: f64, sample_rate: f64) -> f64 {
    2.0 * core::f64::consts::PI * frequency_hz / sample_rate
}

/// Convert a frequency in Hz to mels.
///
/// Uses the common `2595 * log10(1 + f/700)` formula.
#[inline]
pub fn hz_to_mel(frequency_hz: f64) -> f64 {
    2595.0 * log10(1.0 + frequency_hz / 700.0)
}

/// Convert mels back to Hz. Inverse of [`hz_to_mel`].
#[inline]
pub fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (pow(10.0, mel / 2595.0) - 1.0)
}
