//! Ondas Filters - Streaming and batch digital filters
//!
//! This crate provides the filter toolkit built on ondas-core and
//! ondas-analysis:
//!
//! - [`FirLowPass`] / [`FirHighPass`] / [`FirBandPass`] / [`FirBandReject`] -
//!   Blackman windowed-sinc FIR filters
//! - [`IirStage`] / [`IirBandPass`] / [`IirBandReject`] - Chebyshev/Butterworth
//!   pole-placement IIR filters
//! - [`ParametricEqualizer`] - peaking and shelving EQ sections
//! - [`Biquad`] and [`FilterBank`] - high-order parametric equalizers
//!   with live redesign and kernel folding
//! - [`ToneFilter`], [`MovingAverage`], [`DelayFilter`],
//!   [`CombLowPassFeedback`], [`AllPass`] - streaming building blocks
//! - [`Vocoder`] - mel-spaced channel vocoder
//!
//! Every streaming filter implements the [`Filter`] trait, which adds
//! batch processing, dynamic parameter tracks, and impulse/frequency/
//! phase response probes on top of the per-sample kernel.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ondas_core::Buffer;
//! use ondas_filters::{Filter, FirLowPass};
//!
//! let mut lp = FirLowPass::new(48000.0, 2000.0, 129);
//! let output = lp.filter_buffer(&input);
//! let response = lp.frequency_response(8192);
//! ```

pub mod allpass;
pub mod any;
pub mod biquad;
pub mod comb;
pub mod delay;
pub mod eq;
pub mod error;
pub mod filter;
pub mod fir;
pub mod iir;
pub mod moving_average;
pub mod tone;
pub mod vocoder;

// Re-export main types at crate root
pub use allpass::AllPass;
pub use any::AnyFilter;
pub use biquad::{BandEdge, Biquad, BiquadKernel, DesignMode, FilterBank, FilterId, hpeq_design};
pub use comb::CombLowPassFeedback;
pub use delay::DelayFilter;
pub use eq::{EqMode, ParametricEqualizer};
pub use error::FilterError;
pub use filter::{DEFAULT_RESPONSE_SIZE, Filter};
pub use fir::{FirBandPass, FirBandReject, FirHighPass, FirLowPass};
pub use iir::{IirBandPass, IirBandReject, IirMode, IirStage};
pub use moving_average::MovingAverage;
pub use tone::ToneFilter;
pub use vocoder::Vocoder;
