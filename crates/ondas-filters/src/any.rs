//! Closed sum over every streaming filter in the crate.
//!
//! Heterogeneous chains (graph nodes, preset lists) hold
//! [`AnyFilter`] values instead of boxed trait objects, keeping the
//! set of variants closed and the dispatch a plain `match`.

use crate::allpass::AllPass;
use crate::comb::CombLowPassFeedback;
use crate::delay::DelayFilter;
use crate::eq::ParametricEqualizer;
use crate::filter::Filter;
use crate::fir::{FirBandPass, FirBandReject, FirHighPass, FirLowPass};
use crate::iir::{IirBandPass, IirBandReject, IirStage};
use crate::moving_average::MovingAverage;
use crate::tone::ToneFilter;

macro_rules! any_filter {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        /// Any of the crate's streaming filters, dispatched by `match`.
        #[derive(Debug, Clone)]
        pub enum AnyFilter {
            $(
                #[doc = concat!("A [`", stringify!($ty), "`].")]
                $variant($ty),
            )+
        }

        $(
            impl From<$ty> for AnyFilter {
                fn from(f: $ty) -> Self {
                    AnyFilter::$variant(f)
                }
            }
        )+

        impl Filter for AnyFilter {
            fn sample_rate(&self) -> f64 {
                match self {
                    $(AnyFilter::$variant(f) => f.sample_rate(),)+
                }
            }

            fn is_realtime(&self) -> bool {
                match self {
                    $(AnyFilter::$variant(f) => f.is_realtime(),)+
                }
            }

            fn set_realtime(&mut self, realtime: bool) {
                match self {
                    $(AnyFilter::$variant(f) => f.set_realtime(realtime),)+
                }
            }

            fn reset(&mut self) {
                match self {
                    $(AnyFilter::$variant(f) => f.reset(),)+
                }
            }

            fn filter_sample(&mut self, x: f64) -> f64 {
                match self {
                    $(AnyFilter::$variant(f) => f.filter_sample(x),)+
                }
            }

            fn filter_sample_at(&mut self, x: f64, frequency: f64) -> f64 {
                match self {
                    $(AnyFilter::$variant(f) => f.filter_sample_at(x, frequency),)+
                }
            }
        }
    };
}

any_filter! {
    FirLowPass(FirLowPass),
    FirHighPass(FirHighPass),
    FirBandPass(FirBandPass),
    FirBandReject(FirBandReject),
    IirStage(IirStage),
    IirBandPass(IirBandPass),
    IirBandReject(IirBandReject),
    ParametricEqualizer(ParametricEqualizer),
    Tone(ToneFilter),
    MovingAverage(MovingAverage),
    Delay(DelayFilter),
    Comb(CombLowPassFeedback),
    AllPass(AllPass),
}

#[cfg(test)]
mod tests {
    use super::*;
    use ondas_core::Buffer;

    #[test]
    fn test_chain_of_mixed_filters() {
        let sr = 8000.0;
        let mut chain: Vec<AnyFilter> = vec![
            FirLowPass::new(sr, 2000.0, 65).into(),
            ToneFilter::new(sr, 1000.0).into(),
            MovingAverage::new(sr, 8).into(),
        ];

        let x: Buffer = (0..512).map(|i| ((i % 7) as f64 - 3.0) / 3.0).collect();
        let mut y = x.clone();
        for stage in &mut chain {
            y = stage.filter_buffer(&y);
        }
        assert_eq!(y.len(), x.len());
        assert!(y.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_dispatch_matches_the_inner_filter() {
        let sr = 8000.0;
        let mut direct = ToneFilter::new(sr, 500.0);
        let mut wrapped: AnyFilter = ToneFilter::new(sr, 500.0).into();

        assert_eq!(wrapped.sample_rate(), sr);
        for i in 0..64 {
            let x = (i as f64 * 0.37).sin();
            assert_eq!(direct.filter_sample(x), wrapped.filter_sample(x));
        }
    }

    #[test]
    fn test_realtime_flag_passes_through() {
        let mut any: AnyFilter = MovingAverage::new(8000.0, 4).into();
        assert!(!any.is_realtime());
        any.set_realtime(true);
        assert!(any.is_realtime());
    }
}
