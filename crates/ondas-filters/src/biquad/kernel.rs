//! Direct-form kernel container and polynomial helpers.

/// Direct-form transfer function: numerator `b` over denominator `a`,
/// with `a[0]` normalized to one by the designer.
#[derive(Debug, Clone, PartialEq)]
pub struct BiquadKernel {
    /// Feed-forward coefficients.
    pub b: Vec<f64>,
    /// Feedback coefficients, `a[0] == 1`.
    pub a: Vec<f64>,
}

impl BiquadKernel {
    /// The pass-through kernel.
    pub fn identity() -> Self {
        Self {
            b: vec![1.0],
            a: vec![1.0],
        }
    }

    /// Filter order as the length of the numerator.
    pub fn order(&self) -> usize {
        self.b.len()
    }

    /// Combine two cascaded kernels into one equivalent transfer
    /// function by convolving numerators and denominators.
    pub fn cascade(&self, other: &BiquadKernel) -> BiquadKernel {
        BiquadKernel {
            b: convolve(&self.b, &other.b),
            a: convolve(&self.a, &other.a),
        }
    }
}

/// Polynomial product.
pub(crate) fn convolve(x: &[f64], h: &[f64]) -> Vec<f64> {
    let mut y = vec![0.0; x.len() + h.len() - 1];
    for (i, &xi) in x.iter().enumerate() {
        for (j, &hj) in h.iter().enumerate() {
            y[i + j] += xi * hj;
        }
    }
    y
}

/// Fold cascade sections (one row of z-domain coefficients each) into
/// a single direct-form polynomial.
pub(crate) fn cas2dir(sections: &[[f64; 5]]) -> Vec<f64> {
    let mut out = vec![1.0];
    for row in sections {
        out = convolve(&out, row);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convolve_polynomials() {
        // (1 + z)(1 - z) = 1 - z^2
        let y = convolve(&[1.0, 1.0], &[1.0, -1.0]);
        assert_eq!(y, vec![1.0, 0.0, -1.0]);
    }

    #[test]
    fn test_cascade_identity_is_neutral() {
        let k = BiquadKernel {
            b: vec![0.5, 0.25],
            a: vec![1.0, -0.5],
        };
        let folded = k.cascade(&BiquadKernel::identity());
        assert_eq!(folded.b, k.b);
        assert_eq!(folded.a, k.a);
    }

    #[test]
    fn test_cas2dir_folds_sections() {
        let rows = [[1.0, 2.0, 1.0, 0.0, 0.0], [1.0, -1.0, 0.0, 0.0, 0.0]];
        let direct = cas2dir(&rows);
        // (1 + 2z + z^2)(1 - z) = 1 + z - z^2 - z^3
        assert_eq!(direct[..4], [1.0, 1.0, -1.0, -1.0]);
        assert!(direct[4..].iter().all(|&c| c == 0.0));
    }
}
