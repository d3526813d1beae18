//! Ondas Analysis - spectral tools for the ondas toolkit
//!
//! This crate provides the transform engine the filter toolkit is built on:
//!
//! - [`transform`] - In-place iterative radix-2 FFT and the [`FftTransform`]
//!   engine (whole-buffer, framed, and inverse transforms)
//! - [`chunk`] - [`FftChunk`] spectrum container with polar and cartesian
//!   views
//! - [`spectrogram`] - Time-frequency analysis over sliding windows
//!
//! # Example
//!
//! ```rust
//! use ondas_analysis::FftTransform;
//! use ondas_core::{Buffer, Window};
//!
//! let sr = 1024.0;
//! let signal: Buffer = (0..1024)
//!     .map(|i| (2.0 * std::f64::consts::PI * 64.0 * i as f64 / sr).sin())
//!     .collect();
//!
//! let engine = FftTransform::new(sr);
//! let chunk = engine.fft(&signal);
//! let magnitude = chunk.magnitude();
//!
//! // Energy concentrates in bin 64
//! assert_eq!(magnitude.find_max(), Some(64));
//! ```

pub mod chunk;
pub mod spectrogram;
pub mod transform;

pub use chunk::FftChunk;
pub use spectrogram::Spectrogram;
pub use transform::{FftTransform, TransformError, fft_in_place, round_up_to_power_of_2};
