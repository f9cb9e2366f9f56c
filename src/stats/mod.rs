//! Stats module - indicator derivation and rankings

mod indicators;
pub mod ranking;

pub use indicators::{
    clamp_probability, overall_prevalence_pct, percent_of, safe_div, DeriveError, IndicatorCalculator,
    IndicatorTable, NationalRates, RegionIndicators, RegionInputs, ESTIMATE_UNIT,
};
pub use ranking::{bottom_treatment_rate, top_treatment_rate, RankOrder};
