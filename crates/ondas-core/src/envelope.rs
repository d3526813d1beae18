//! ADSR envelope generator.
//!
//! [`EnvelopeAdsr`] shapes a signal with the classic four-segment
//! attack/delay/sustain/release amplitude contour. It can run as a
//! gate-driven state machine ([`EnvelopeAdsr::shape_sample`]) or shape a
//! whole buffer in one call ([`EnvelopeAdsr::shape`]), where the sustain
//! length is derived from the buffer duration.
//!
//! Segment slopes are linear: each segment of `t` seconds ramps over
//! `round(t * sample_rate) - 1` steps. The attack caps just below unity
//! (0.999) before handing off to the delay segment.

use crate::buffer::Buffer;

/// Current segment of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdsrStage {
    /// Ramping from 0 toward 1.
    Attacking,
    /// Ramping from the attack peak down to the sustain level.
    Delaying,
    /// Holding the sustain level while the key is on.
    Sustaining,
    /// Ramping from the current level down to 0.
    Releasing,
    /// Finished; output is silence.
    Done,
}

/// Attack/delay/sustain/release envelope.
///
/// # Example
///
/// ```rust
/// use ondas_core::{Buffer, EnvelopeAdsr};
///
/// let mut env = EnvelopeAdsr::new(100.0, 0.1, 0.1, 0.5, 0.1);
/// let shaped = env.shape(&Buffer::ones(100));
/// assert!(shaped[0] < 0.2, "attack starts near zero");
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeAdsr {
    sample_rate: f64,
    attack_slope: f64,
    attack_time: f64,
    delay_slope: f64,
    delay_time: f64,
    sustain_amp: f64,
    release_slope: f64,
    release_time: f64,
    scale: f64,
    stage: AdsrStage,
}

impl EnvelopeAdsr {
    /// Create an envelope.
    ///
    /// # Panics
    /// Panics if `sample_rate` is not positive, if `sustain_amplitude` is
    /// outside `(0, 1]`, or if any segment is shorter than two samples.
    pub fn new(
        sample_rate: f64,
        attack_s: f64,
        delay_s: f64,
        sustain_amplitude: f64,
        release_s: f64,
    ) -> Self {
        assert!(sample_rate > 0.0, "sample_rate must be > 0");
        assert!(
            sustain_amplitude > 0.0 && sustain_amplitude <= 1.0,
            "sustain_amplitude must be in (0, 1]"
        );

        let mut env = Self {
            sample_rate,
            attack_slope: 0.0,
            attack_time: attack_s,
            delay_slope: 0.0,
            delay_time: delay_s,
            sustain_amp: sustain_amplitude,
            release_slope: 0.0,
            release_time: release_s,
            scale: 0.0,
            stage: AdsrStage::Attacking,
        };
        env.set_attack_time(attack_s);
        env.set_delay_time(delay_s);
        env.set_release_time(release_s);
        env
    }

    fn slope_steps(&self, time_s: f64) -> f64 {
        let n_samples = (time_s * self.sample_rate + 0.5) as i64 - 1;
        assert!(n_samples > 0, "segment must span at least two samples");
        n_samples as f64
    }

    /// Set the attack duration in seconds.
    pub fn set_attack_time(&mut self, time_s: f64) {
        self.attack_slope = 1.0 / self.slope_steps(time_s);
        self.attack_time = time_s;
    }

    /// Set the delay (decay) duration in seconds.
    pub fn set_delay_time(&mut self, time_s: f64) {
        self.delay_slope = -1.0 / self.slope_steps(time_s);
        self.delay_time = time_s;
    }

    /// Set the sustain amplitude in `(0, 1]`.
    pub fn set_sustain_amplitude(&mut self, amp: f64) {
        assert!(amp > 0.0 && amp <= 1.0, "sustain must be in (0, 1]");
        self.sustain_amp = amp;
    }

    /// Set the release duration in seconds.
    pub fn set_release_time(&mut self, time_s: f64) {
        self.release_slope = -1.0 / self.slope_steps(time_s);
        self.release_time = time_s;
    }

    /// Current stage of the state machine.
    pub fn stage(&self) -> AdsrStage {
        self.stage
    }

    /// True once the release has run out.
    pub fn is_done(&self) -> bool {
        self.stage == AdsrStage::Done
    }

    /// Rewind to the start of the attack.
    pub fn reset(&mut self) {
        self.stage = AdsrStage::Attacking;
        self.scale = 0.0;
    }

    /// Advance the envelope one sample and scale `sample` by it.
    ///
    /// `key_on = false` forces the release segment from any earlier stage.
    pub fn shape_sample(&mut self, sample: f64, key_on: bool) -> f64 {
        match self.stage {
            AdsrStage::Attacking => {
                self.scale += self.attack_slope;
                if self.scale >= 1.0 {
                    self.scale = 0.999;
                    self.stage = AdsrStage::Delaying;
                }
                if !key_on {
                    self.stage = AdsrStage::Releasing;
                }
            }
            AdsrStage::Delaying => {
                self.scale += self.delay_slope;
                if self.scale <= self.sustain_amp {
                    self.stage = AdsrStage::Sustaining;
                }
                if !key_on {
                    self.stage = AdsrStage::Releasing;
                }
            }
            AdsrStage::Sustaining => {
                self.scale = self.sustain_amp;
                if !key_on {
                    self.stage = AdsrStage::Releasing;
                }
            }
            AdsrStage::Releasing => {
                self.scale += self.release_slope;
                if self.scale <= 0.0 {
                    self.scale = 0.0;
                    self.stage = AdsrStage::Done;
                }
            }
            AdsrStage::Done => {
                self.scale = 0.0;
            }
        }

        sample * self.scale
    }

    /// Shape a whole buffer.
    ///
    /// The sustain segment length is the buffer duration minus the attack,
    /// delay and release times (floored at zero). The output ends early if
    /// the release completes before the input does.
    pub fn shape(&mut self, buf: &Buffer) -> Buffer {
        let duration = buf.len() as f64 / self.sample_rate;
        let sustain_time =
            (duration - self.attack_time - self.delay_time - self.release_time).max(0.0);
        let sustain_samples = (sustain_time * self.sample_rate) as usize;

        self.stage = AdsrStage::Attacking;

        let mut out = Buffer::with_capacity(buf.len());
        let mut samples = buf.iter().copied();

        // Attack and delay segments
        while self.stage != AdsrStage::Sustaining {
            let Some(x) = samples.next() else {
                return out;
            };
            out.push(self.shape_sample(x, true));
        }

        // Sustain
        for _ in 0..sustain_samples {
            let Some(x) = samples.next() else {
                return out;
            };
            out.push(self.shape_sample(x, true));
        }

        // Release
        while !self.is_done() {
            let Some(x) = samples.next() else {
                return out;
            };
            out.push(self.shape_sample(x, false));
        }

        out
    }
}
