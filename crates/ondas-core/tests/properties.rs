//! Property-based tests for ondas-core primitives.
//!
//! Exercises buffer arithmetic invariants, delay line integrity, and
//! envelope bounds using proptest for randomized input generation.

use ondas_core::{Buffer, DelayLine, EnvelopeAdsr, Window};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Element-wise addition commutes and produces the shorter length.
    #[test]
    fn buffer_add_commutes(
        a in prop::collection::vec(-1e6f64..1e6, 0..64),
        b in prop::collection::vec(-1e6f64..1e6, 0..64),
    ) {
        let (a, b) = (Buffer::from_vec(a), Buffer::from_vec(b));
        let ab = &a + &b;
        let ba = &b + &a;
        prop_assert_eq!(ab.len(), a.len().min(b.len()));
        prop_assert_eq!(ab.as_slice(), ba.as_slice());
    }

    /// Normalizing any non-silent buffer yields peak magnitude 1.
    #[test]
    fn buffer_normalize_peak(
        mut data in prop::collection::vec(-1e3f64..1e3, 1..128),
    ) {
        data[0] += 1.0; // guarantee non-silence
        let mut buf = Buffer::from_vec(data);
        buf.normalize();
        prop_assert!((buf.max_magnitude() - 1.0).abs() < 1e-12);
    }

    /// A delay line returns exactly what was written, `d` samples later.
    #[test]
    fn delay_line_preserves_signal(
        input in prop::collection::vec(-1.0f64..=1.0, 32..128),
        delay_samples in 1usize..16,
    ) {
        let sr = 1000.0;
        let mut line = DelayLine::new(sr, 0.016);
        let delay_s = delay_samples as f64 / sr;

        let mut out = Vec::new();
        for &x in &input {
            out.push(line.process(x, delay_s));
        }

        for i in delay_samples..input.len() {
            prop_assert!(
                (out[i] - input[i - delay_samples]).abs() < 1e-12,
                "sample {} not delayed by {} samples", i, delay_samples
            );
        }
    }

    /// Envelope output never exceeds the input magnitude and never goes
    /// negative for non-negative input.
    #[test]
    fn envelope_is_bounded(
        attack in 0.05f64..0.5,
        delay in 0.05f64..0.5,
        sustain in 0.05f64..1.0,
        release in 0.05f64..0.5,
    ) {
        let mut env = EnvelopeAdsr::new(100.0, attack, delay, sustain, release);
        for _ in 0..500 {
            let y = env.shape_sample(1.0, true);
            prop_assert!((0.0..1.0).contains(&y), "scale out of range: {}", y);
        }
        while !env.is_done() {
            let y = env.shape_sample(1.0, false);
            prop_assert!((0.0..1.0).contains(&y));
        }
    }

    /// Window coefficients are within [0, 1.0001] for every window type.
    #[test]
    fn window_coefficients_bounded(n in 2usize..512) {
        for window in [
            Window::Rectangular,
            Window::Hann,
            Window::Hamming,
            Window::Blackman,
            Window::BlackmanHarris,
        ] {
            for c in window.coefficients(n) {
                prop_assert!((-1e-6..=1.0 + 1e-6).contains(&c),
                    "{:?} coefficient out of range: {}", window, c);
            }
        }
    }
}
