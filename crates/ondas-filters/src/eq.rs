//! Three-tap parametric equalizer sections.

use std::collections::BTreeMap;

use ondas_core::{db_to_linear, hz_to_omega};

use crate::filter::Filter;

/// Shape of a [`ParametricEqualizer`] section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqMode {
    /// Bell boost/cut around the center frequency.
    Peaking,
    /// Shelving boost/cut below the corner frequency.
    LowShelf,
    /// Shelving boost/cut above the corner frequency.
    HighShelf,
}

type EqKernel = ([f64; 3], [f64; 3]);

fn eq_kernel(sample_rate: f64, mode: EqMode, frequency: f64, resonance: f64, boost_db: f64) -> EqKernel {
    let omega = hz_to_omega(frequency, sample_rate);
    let v = db_to_linear(boost_db);
    let q = resonance;

    let (mut b, mut a) = match mode {
        EqMode::Peaking => {
            let k = (omega / 2.0).tan();
            let b = [
                1.0 + v * k / q + k * k,
                2.0 * (k * k - 1.0),
                1.0 - v * k / q + k * k,
            ];
            let a = [1.0 + k / q + k * k, b[1], 1.0 - k / q + k * k];
            (b, a)
        }
        EqMode::LowShelf => {
            let k = (omega / 2.0).tan();
            let sq = (2.0 * v).sqrt();
            let b = [
                1.0 + sq * k + v * k * k,
                2.0 * (v * k * k - 1.0),
                1.0 - sq * k + v * k * k,
            ];
            let a = [
                1.0 + k / q + k * k,
                2.0 * (k * k - 1.0),
                1.0 - k / q + k * k,
            ];
            (b, a)
        }
        EqMode::HighShelf => {
            let k = ((std::f64::consts::PI - omega) / 2.0).tan();
            let sq = (2.0 * v).sqrt();
            let b = [
                1.0 + sq * k + v * k * k,
                -2.0 * (v * k * k - 1.0),
                1.0 - sq * k + v * k * k,
            ];
            let a = [
                1.0 + k / q + k * k,
                -2.0 * (k * k - 1.0),
                1.0 - k / q + k * k,
            ];
            (b, a)
        }
    };

    let inv = 1.0 / a[0];
    for tap in &mut b {
        *tap *= inv;
    }
    a[1] *= inv;
    a[2] *= inv;
    a[0] = 1.0;

    (b, a)
}

/// Single parametric EQ section (peaking or shelving biquad).
///
/// Coefficients are cached keyed on the rounded design triple, so
/// automation that dwells on a value never redesigns.
#[derive(Debug, Clone)]
pub struct ParametricEqualizer {
    sample_rate: f64,
    mode: EqMode,
    frequency: f64,
    design_frequency: f64,
    resonance: f64,
    boost_db: f64,
    b: [f64; 3],
    a: [f64; 3],
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
    cache: BTreeMap<(i64, i64, i64), EqKernel>,
    realtime: bool,
}

impl ParametricEqualizer {
    /// Design a section at `frequency` Hz with quality factor
    /// `resonance` and gain `boost_db` in dB.
    ///
    /// # Panics
    /// Panics if `sample_rate`, `frequency`, or `resonance` is not
    /// positive.
    pub fn new(sample_rate: f64, mode: EqMode, frequency: f64, resonance: f64, boost_db: f64) -> Self {
        assert!(sample_rate > 0.0, "sample_rate must be > 0");
        assert!(frequency > 0.0, "frequency must be > 0");
        assert!(resonance > 0.0, "resonance must be > 0");

        let mut eq = Self {
            sample_rate,
            mode,
            frequency,
            design_frequency: frequency,
            resonance,
            boost_db,
            b: [0.0; 3],
            a: [0.0; 3],
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
            cache: BTreeMap::new(),
            realtime: false,
        };
        eq.make_kernel();
        eq
    }

    /// Section shape.
    pub fn mode(&self) -> EqMode {
        self.mode
    }

    /// Center/corner frequency in Hz.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Quality factor.
    pub fn resonance(&self) -> f64 {
        self.resonance
    }

    /// Boost in dB (negative for a cut).
    pub fn boost_db(&self) -> f64 {
        self.boost_db
    }

    /// Retune the quality factor.
    pub fn set_resonance(&mut self, resonance: f64) {
        self.resonance = resonance;
        self.make_kernel();
    }

    /// Retune the boost.
    pub fn set_boost_db(&mut self, boost_db: f64) {
        self.boost_db = boost_db;
        self.make_kernel();
    }

    /// Change the design center/corner frequency; [`Filter::reset`]
    /// returns to it.
    pub fn set_frequency(&mut self, frequency: f64) {
        self.design_frequency = frequency;
        self.retune(frequency);
    }

    fn retune(&mut self, frequency: f64) {
        if frequency != self.frequency {
            self.frequency = frequency;
            self.make_kernel();
        }
    }

    fn make_kernel(&mut self) {
        let key = (
            self.frequency.round() as i64,
            (self.resonance * 1000.0).round() as i64,
            (self.boost_db * 1000.0).round() as i64,
        );
        if let Some(&(b, a)) = self.cache.get(&key) {
            self.b = b;
            self.a = a;
            return;
        }
        let (b, a) = eq_kernel(
            self.sample_rate,
            self.mode,
            self.frequency,
            self.resonance,
            self.boost_db,
        );
        self.cache.insert(key, (b, a));
        self.b = b;
        self.a = a;
    }
}

impl Filter for ParametricEqualizer {
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
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
        self.retune(self.design_frequency);
    }

    fn filter_sample(&mut self, x: f64) -> f64 {
        let y = self.b[0] * x + self.b[1] * self.x1 + self.b[2] * self.x2
            - self.a[1] * self.y1
            - self.a[2] * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }

    fn filter_sample_at(&mut self, x: f64, frequency: f64) -> f64 {
        self.retune(frequency);
        self.filter_sample(x)
    }
}
