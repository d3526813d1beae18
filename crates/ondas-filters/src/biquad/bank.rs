//! Serial bank of biquad filters.

use ondas_analysis::{FftTransform, round_up_to_power_of_2};
use ondas_core::Buffer;
use tracing::debug;

use crate::biquad::{Biquad, BiquadKernel};
use crate::error::FilterError;

/// Handle returned by [`FilterBank::add`]. Stays valid across removals
/// of other filters.
pub type FilterId = usize;

/// Window length in seconds used when probing a bank's response.
const RESPONSE_WINDOW_SECONDS: f64 = 0.080;

/// An ordered chain of [`Biquad`] filters sharing one sample rate.
///
/// Slots are never compacted: removing a filter leaves a tombstone so
/// every [`FilterId`] handed out stays stable.
#[derive(Debug, Clone)]
pub struct FilterBank {
    sample_rate: f64,
    filters: Vec<Option<Biquad>>,
}

impl FilterBank {
    /// Create an empty bank at `sample_rate` Hz.
    ///
    /// # Panics
    /// Panics if `sample_rate` is not positive.
    pub fn new(sample_rate: f64) -> Self {
        assert!(sample_rate > 0.0, "sample_rate must be > 0");
        Self {
            sample_rate,
            filters: Vec::new(),
        }
    }

    /// Sample rate the bank runs at.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Number of slots ever allocated, including tombstones.
    pub fn n_slots(&self) -> usize {
        self.filters.len()
    }

    /// Number of live filters.
    pub fn n_live(&self) -> usize {
        self.filters.iter().filter(|f| f.is_some()).count()
    }

    /// Append a filter to the end of the chain.
    ///
    /// Open designs must agree with the bank's sample rate to within
    /// one Hz; closed designs carry no rate and are always accepted.
    pub fn add(&mut self, filter: Biquad) -> Result<FilterId, FilterError> {
        if let Some(sr) = filter.sample_rate() {
            if (sr - self.sample_rate).abs() > 1.0 {
                return Err(FilterError::SampleRateMismatch {
                    bank: self.sample_rate,
                    filter: sr,
                });
            }
        }
        let id = self.filters.len();
        self.filters.push(Some(filter));
        debug!(id, n_live = self.n_live(), "added filter to bank");
        Ok(id)
    }

    /// Remove a filter, leaving its slot as a tombstone.
    pub fn remove(&mut self, id: FilterId) -> Result<(), FilterError> {
        let len = self.filters.len();
        let slot = self
            .filters
            .get_mut(id)
            .ok_or(FilterError::FilterIdOutOfBounds { id, len })?;
        if slot.take().is_none() {
            return Err(FilterError::FilterRemoved(id));
        }
        Ok(())
    }

    /// Borrow a live filter.
    pub fn get(&self, id: FilterId) -> Result<&Biquad, FilterError> {
        let len = self.filters.len();
        self.filters
            .get(id)
            .ok_or(FilterError::FilterIdOutOfBounds { id, len })?
            .as_ref()
            .ok_or(FilterError::FilterRemoved(id))
    }

    /// Mutably borrow a live filter.
    pub fn get_mut(&mut self, id: FilterId) -> Result<&mut Biquad, FilterError> {
        let len = self.filters.len();
        self.filters
            .get_mut(id)
            .ok_or(FilterError::FilterIdOutOfBounds { id, len })?
            .as_mut()
            .ok_or(FilterError::FilterRemoved(id))
    }

    /// Fold every live filter's kernel into one equivalent transfer
    /// function. An empty bank yields the identity.
    pub fn kernel(&self) -> BiquadKernel {
        self.filters
            .iter()
            .flatten()
            .fold(BiquadKernel::identity(), |acc, f| acc.cascade(f.kernel()))
    }

    /// Run one sample through the chain in insertion order.
    pub fn filter(&mut self, x: f64) -> f64 {
        self.filters
            .iter_mut()
            .flatten()
            .fold(x, |s, f| f.filter(s))
    }

    /// Run a whole buffer through the chain.
    pub fn filter_buffer(&mut self, x: &Buffer) -> Buffer {
        x.iter().map(|&s| self.filter(s)).collect()
    }

    /// Zero every live filter's history.
    pub fn clear(&mut self) {
        for f in self.filters.iter_mut().flatten() {
            f.clear();
        }
    }

    fn response_size(&self) -> usize {
        round_up_to_power_of_2((RESPONSE_WINDOW_SECONDS * self.sample_rate).round() as usize)
    }

    /// Impulse response of the whole chain, probed on a clone so the
    /// live filter state is untouched. Length is an 80 ms window
    /// rounded up to a power of two.
    pub fn impulse_response(&self) -> Buffer {
        let n = self.response_size();
        let mut probe = self.clone();
        probe.clear();
        let mut out = Buffer::with_capacity(n);
        out.push(probe.filter(1.0));
        for _ in 1..n {
            out.push(probe.filter(0.0));
        }
        out
    }

    /// Magnitude spectrum of the chain, `n/2 + 1` bins from DC to
    /// Nyquist.
    pub fn frequency_response(&self) -> Buffer {
        let ir = self.impulse_response();
        FftTransform::new(self.sample_rate).fft(&ir).magnitude()
    }

    /// Phase spectrum of the chain.
    pub fn phase_response(&self) -> Buffer {
        let ir = self.impulse_response();
        FftTransform::new(self.sample_rate).fft(&ir).phase()
    }

    /// Frequency in Hz of each response bin.
    pub fn frequency_axis(&self) -> Buffer {
        let n = self.response_size();
        let step = self.sample_rate / n as f64;
        (0..=n / 2).map(|i| i as f64 * step).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peaker(fc: f64, db: f64) -> Biquad {
        Biquad::new(48000.0, fc, 500.0, db, db / 2.0, 0.0, 4).unwrap()
    }

    #[test]
    fn test_ids_are_stable_across_removal() {
        let mut bank = FilterBank::new(48000.0);
        let a = bank.add(peaker(500.0, 6.0)).unwrap();
        let b = bank.add(peaker(2000.0, -6.0)).unwrap();
        let c = bank.add(peaker(8000.0, 3.0)).unwrap();
        assert_eq!((a, b, c), (0, 1, 2));

        bank.remove(b).unwrap();
        assert_eq!(bank.n_slots(), 3);
        assert_eq!(bank.n_live(), 2);

        // Remaining ids still resolve to the same filters.
        assert_eq!(bank.get(a).unwrap().freq_center(), 500.0);
        assert_eq!(bank.get(c).unwrap().freq_center(), 8000.0);
        assert_eq!(bank.get(b).unwrap_err(), FilterError::FilterRemoved(1));
        assert_eq!(bank.remove(b), Err(FilterError::FilterRemoved(1)));
    }

    #[test]
    fn test_out_of_bounds_id() {
        let bank = FilterBank::new(48000.0);
        assert_eq!(
            bank.get(7).unwrap_err(),
            FilterError::FilterIdOutOfBounds { id: 7, len: 0 }
        );
    }

    #[test]
    fn test_sample_rate_mismatch_is_rejected() {
        let mut bank = FilterBank::new(48000.0);
        let wrong = Biquad::new(44100.0, 1000.0, 500.0, 6.0, 3.0, 0.0, 4).unwrap();
        assert!(matches!(
            bank.add(wrong),
            Err(FilterError::SampleRateMismatch { .. })
        ));

        // Closed kernels carry no rate and are always accepted.
        let closed = Biquad::from_kernel(BiquadKernel::identity());
        assert!(bank.add(closed).is_ok());
    }

    #[test]
    fn test_empty_bank_passes_through() {
        let mut bank = FilterBank::new(48000.0);
        assert_eq!(bank.filter(0.75), 0.75);
        assert_eq!(bank.kernel(), BiquadKernel::identity());
    }

    #[test]
    fn test_folded_kernel_matches_the_chain() {
        let mut bank = FilterBank::new(48000.0);
        bank.add(peaker(500.0, 6.0)).unwrap();
        bank.add(peaker(2000.0, -6.0)).unwrap();

        let mut folded = Biquad::from_kernel(bank.kernel());
        bank.clear();
        for i in 0..256 {
            let x = if i == 0 { 1.0 } else { 0.0 };
            let chained = bank.filter(x);
            let direct = folded.filter(x);
            assert!(
                (chained - direct).abs() < 1e-9,
                "sample {i}: chain {chained} vs folded {direct}"
            );
        }
    }

    #[test]
    fn test_response_probe_leaves_state_alone() {
        let mut bank = FilterBank::new(48000.0);
        bank.add(peaker(1000.0, 6.0)).unwrap();

        // Drive some state into the chain, then probe.
        for i in 0..64 {
            bank.filter(i as f64 * 0.01);
        }
        let before = bank.clone().filter(0.5);
        let _ = bank.frequency_response();
        let after = bank.filter(0.5);
        assert_eq!(before, after);
    }

    #[test]
    fn test_response_window_is_80_ms_rounded_up() {
        let bank = FilterBank::new(48000.0);
        // 0.080 * 48000 = 3840 -> 4096
        assert_eq!(bank.impulse_response().len(), 4096);
        assert_eq!(bank.frequency_axis().len(), 2049);
    }
}
