//! Ondas Core - DSP primitives for audio signal processing
//!
//! This crate provides the foundational building blocks for the ondas
//! toolkit: a growable sample buffer with element-wise math, circular
//! delay lines, analysis windows, and an ADSR envelope generator.
//!
//! # Core Types
//!
//! - [`Buffer`] - Growable `f64` sample vector with element-wise arithmetic
//!   and reductions
//! - [`DelayLine`] - Circular delay buffer with runtime-variable read offset
//! - [`Window`] - Analysis window functions (Hann, Hamming, Blackman, ...)
//! - [`EnvelopeAdsr`] - Attack/delay/sustain/release envelope generator
//!
//! # Utilities
//!
//! - Level conversions: [`db_to_linear`], [`linear_to_db`]
//! - Perceptual scales: [`hz_to_mel`], [`mel_to_hz`]
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (with `alloc`). Disable the default
//! `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! ondas-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Design Principles
//!
//! - **All samples are `f64`**: filter design and spectral math keep full
//!   double precision end to end
//! - **No dependencies on std**: pure `no_std` with `libm` for math
//! - **Allocation only at construction**: per-sample paths never allocate

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod buffer;
pub mod delay;
pub mod envelope;
pub mod math;
pub mod window;

pub use buffer::Buffer;
pub use delay::DelayLine;
pub use envelope::{AdsrStage, EnvelopeAdsr};
pub use math::{db_to_linear, hz_to_mel, hz_to_omega, linear_to_db, mel_to_hz};
pub use window::Window;
