//! Butterworth parametric equalizer design.
//!
//! `hpeq_design` synthesizes a high-order peaking/shelving equalizer
//! as analog second-order sections, maps them to the digital domain
//! with a two-stage bilinear transform centered on the peak
//! frequency, and folds the cascade into one direct-form kernel.

use std::f64::consts::PI;

use tracing::debug;

use crate::biquad::kernel::{BiquadKernel, cas2dir};
use crate::error::FilterError;

/// Left and right band edge frequencies implied by a center frequency
/// and bandwidth under the bilinear transform's frequency warping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandEdge {
    lo_hz: f64,
    hi_hz: f64,
}

impl BandEdge {
    /// Compute the warped band edges.
    pub fn new(sample_rate: f64, freq_center_hz: f64, bandwidth_hz: f64) -> Self {
        let hz_to_radians = 2.0 * PI / sample_rate;
        let radians_to_hz = 1.0 / hz_to_radians;

        let wc = freq_center_hz * hz_to_radians;
        let wb = bandwidth_hz * hz_to_radians;

        let wwbb = (wb / 2.0).tan();
        let c0 = wc.cos();
        let s0 = wc.sin();

        let temp0 = wwbb * (wwbb * wwbb + s0 * s0).sqrt();
        let temp1 = 1.0 + wwbb * wwbb;

        Self {
            lo_hz: radians_to_hz * ((c0 + temp0) / temp1).acos(),
            hi_hz: radians_to_hz * ((c0 - temp0) / temp1).acos(),
        }
    }

    /// Left band edge in Hz.
    pub fn lo_hz(&self) -> f64 {
        self.lo_hz
    }

    /// Right band edge in Hz.
    pub fn hi_hz(&self) -> f64 {
        self.hi_hz
    }
}

/// Design a Butterworth peaking equalizer kernel.
///
/// Gains are in dB: `gain_db_baseline` far from the band,
/// `gain_db_at_fc` at the center, and `gain_db_at_band_width` at the
/// band edges. An order above one is forced even.
pub fn hpeq_design(
    sample_rate: f64,
    order: u32,
    freq_center_hz: f64,
    bandwidth_hz: f64,
    gain_db_baseline: f64,
    gain_db_at_fc: f64,
    gain_db_at_band_width: f64,
) -> Result<BiquadKernel, FilterError> {
    if order == 0 {
        return Err(FilterError::ZeroOrder);
    }
    if sample_rate <= 0.0 {
        return Err(FilterError::NonPositiveSampleRate(sample_rate));
    }
    if bandwidth_hz <= 0.0 {
        return Err(FilterError::NonPositiveBandwidth(bandwidth_hz));
    }

    let mut order = order;
    if order > 1 {
        order += order % 2;
    }

    let gref = 10f64.powf(gain_db_baseline / 20.0);
    let gfc = 10f64.powf(gain_db_at_fc / 20.0);
    let gbw = 10f64.powf(gain_db_at_band_width / 20.0);

    // A peak gain equal to the baseline needs no filtering at all.
    if (gfc - gref).abs() < 1e-7 {
        return Ok(BiquadKernel {
            b: vec![gref],
            a: vec![1.0],
        });
    }

    let r = order % 2;
    let l = (order - r) / 2;

    let hz_to_radians = 2.0 * PI / sample_rate;
    let w0 = freq_center_hz * hz_to_radians;
    let wb = (bandwidth_hz * hz_to_radians / 2.0).tan();

    let gbw2 = gbw * gbw;
    let numerator = gfc * gfc - gbw2;
    let denominator = gbw2 - gref * gref;

    let mut e = 3000.0;
    if denominator.abs() > 0.01 {
        e = (numerator.abs() / denominator.abs()).sqrt();
    }

    // Spread the gains across the cascaded sections.
    let n = f64::from(order);
    let gfc = gfc.powf(1.0 / n);
    let gref = gref.powf(1.0 / n);
    let a = e.powf(1.0 / n);
    let b = gref * a;

    // Analog prototype sections [B0, B1, B2] / [A0, A1, A2].
    let mut ba: Vec<[f64; 3]> = Vec::with_capacity(l as usize + 1);
    let mut aa: Vec<[f64; 3]> = Vec::with_capacity(l as usize + 1);

    if r == 0 {
        ba.push([1.0, 0.0, 0.0]);
        aa.push([1.0, 0.0, 0.0]);
    } else {
        ba.push([gfc * wb, b, 0.0]);
        aa.push([wb, a, 0.0]);
    }

    for i in 1..=l {
        let ui = f64::from(2 * i - 1) / n;
        let si = (PI * ui / 2.0).sin();
        ba.push([gfc * gfc * wb * wb, 2.0 * gfc * b * si * wb, b * b]);
        aa.push([wb * wb, 2.0 * a * si * wb, a * a]);
    }

    let (bz, az) = bilinear_transform(&ba, &aa, w0);
    let kernel = BiquadKernel {
        b: cas2dir(&bz),
        a: cas2dir(&az),
    };

    debug!(
        order,
        freq_center_hz,
        bandwidth_hz,
        kernel_len = kernel.b.len(),
        "designed equalizer kernel"
    );

    Ok(kernel)
}

/// Two-stage bilinear transform of analog second-order sections into
/// fourth-order digital sections centered on `w0` radians/sample.
fn bilinear_transform(
    ba: &[[f64; 3]],
    aa: &[[f64; 3]],
    w0: f64,
) -> (Vec<[f64; 5]>, Vec<[f64; 5]>) {
    debug_assert_eq!(ba.len(), aa.len());

    // Exact values at the DC, Nyquist, and quarter-rate centers.
    let c0 = if w0 == 0.0 {
        1.0
    } else if w0 == PI {
        -1.0
    } else if w0 == PI / 2.0 {
        0.0
    } else {
        w0.cos()
    };

    let n = ba.len();
    let mut bz = vec![[0.0f64; 5]; n];
    let mut az = vec![[0.0f64; 5]; n];
    let mut bhat = vec![[0.0f64; 3]; n];
    let mut ahat = vec![[0.0f64; 3]; n];

    for j in 0..n {
        let [b0, b1, b2] = ba[j];
        let [a0, a1, a2] = aa[j];

        if b2 != 0.0 || a2 != 0.0 {
            // Second-order analog section -> fourth-order digital.
            let d = a0 + a1 + a2;

            bhat[j] = [
                (b0 + b1 + b2) / d,
                2.0 * (b0 - b2) / d,
                (b0 - b1 + b2) / d,
            ];
            ahat[j] = [1.0, 2.0 * (a0 - a2) / d, (a0 - a1 + a2) / d];

            let [bh0, bh1, bh2] = bhat[j];
            let [_, ah1, ah2] = ahat[j];

            bz[j] = [
                bh0,
                c0 * (bh1 - 2.0 * bh0),
                (bh0 - bh1 + bh2) * c0 * c0 - bh1,
                c0 * (bh1 - 2.0 * bh2),
                bh2,
            ];
            az[j] = [
                1.0,
                c0 * (ah1 - 2.0),
                (1.0 - ah1 + ah2) * c0 * c0 - ah1,
                c0 * (ah1 - 2.0 * ah2),
                ah2,
            ];
        } else if b1 != 0.0 || a1 != 0.0 {
            // First-order analog section -> second-order digital.
            let d = a0 + a1;

            bhat[j] = [(b0 + b1) / d, (b0 - b1) / d, 0.0];
            ahat[j] = [1.0, (a0 - a1) / d, 0.0];

            let [bh0, bh1, _] = bhat[j];
            let ah1 = ahat[j][1];

            bz[j] = [bh0, c0 * (bh1 - bh0), -bh1, 0.0, 0.0];
            az[j] = [1.0, c0 * (ah1 - 1.0), -ah1, 0.0, 0.0];
        } else {
            // Pure gain section.
            bhat[j] = [b0 / a0, 0.0, 0.0];
            ahat[j] = [1.0, 0.0, 0.0];
            bz[j] = [b0 / a0, 0.0, 0.0, 0.0, 0.0];
            az[j] = [1.0, 0.0, 0.0, 0.0, 0.0];
        }
    }

    // At DC or Nyquist centers the band collapses to a shelf and the
    // second-order hat sections are already the answer.
    if c0.abs() == 1.0 {
        for j in 0..n {
            bz[j] = [bhat[j][0], c0 * bhat[j][1], bhat[j][2], 0.0, 0.0];
            az[j] = [ahat[j][0], c0 * ahat[j][1], ahat[j][2], 0.0, 0.0];
        }
    }

    (bz, az)
}
