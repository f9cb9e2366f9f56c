//! Indicator Derivation Module
//! Turns the merged region table into prevalence, treatment and male-adjusted
//! estimates.

use crate::data::REGION_KEY;
use log::info;
use polars::prelude::*;
use thiserror::Error;

/// Survey estimates are published in thousands of persons.
pub const ESTIMATE_UNIT: f64 = 1_000.0;

#[derive(Error, Debug)]
pub enum DeriveError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("merged table has a null {column} for row {row}")]
    NullValue { column: String, row: usize },
}

/// Division that yields 0 whenever the quotient is undefined.
///
/// Covers a zero denominator as well as any non-finite result (`inf`, `-inf`,
/// `NaN`), so a single small region can never poison the national aggregates.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let ratio = numerator / denominator;
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}

/// `part / whole * 100`, following the [`safe_div`] policy.
pub fn percent_of(part: f64, whole: f64) -> f64 {
    let pct = safe_div(part, whole) * 100.0;
    if pct.is_finite() {
        pct
    } else {
        0.0
    }
}

/// Clamp a probability to `[0, 1]`; NaN becomes 0.
pub fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

/// National reference rates used to project the male estimates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NationalRates {
    /// Share of adult men with AMI (%)
    pub male_ami_pct: f64,
    /// Share of men with AMI who received treatment (%)
    pub male_treatment_pct: f64,
    /// Share of all adults with AMI who received treatment (%)
    pub overall_treatment_pct: f64,
}

impl NationalRates {
    /// Ratio of male to overall treatment among adults with AMI.
    pub fn male_treatment_scale(&self) -> f64 {
        safe_div(self.male_treatment_pct, self.overall_treatment_pct)
    }
}

/// Joined inputs for one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionInputs {
    pub state: String,
    /// Adults with AMI, thousands
    pub disorder_18plus: f64,
    /// Adults who received treatment, thousands
    pub treatment_18plus: f64,
    pub adults_18plus: f64,
    pub adult_men_18plus: f64,
}

impl RegionInputs {
    /// Read the joined columns of the merged table, one entry per row.
    pub fn from_frame(df: &DataFrame) -> Result<Vec<Self>, DeriveError> {
        let states = df.column(REGION_KEY)?.str()?;
        let disorder = float_column(df, "Disorder_18plus")?;
        let treatment = float_column(df, "Treatment_18plus")?;
        let adults = float_column(df, "Adults18plus")?;
        let men = float_column(df, "AdultMen18plus")?;

        states
            .into_iter()
            .enumerate()
            .map(|(row, state)| {
                let state = state.ok_or_else(|| DeriveError::NullValue {
                    column: REGION_KEY.to_string(),
                    row,
                })?;
                Ok(Self {
                    state: state.to_string(),
                    disorder_18plus: disorder[row],
                    treatment_18plus: treatment[row],
                    adults_18plus: adults[row],
                    adult_men_18plus: men[row],
                })
            })
            .collect()
    }
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>, DeriveError> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    column
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| DeriveError::NullValue {
                column: name.to_string(),
                row,
            })
        })
        .collect()
}

/// Every raw and derived field of one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionIndicators {
    pub state: String,
    pub disorder_18plus: f64,
    pub treatment_18plus: f64,
    pub adults_18plus: f64,
    pub adult_men_18plus: f64,
    pub disorder_count: f64,
    pub treatment_count: f64,
    pub disorder_pct: f64,
    pub treatment_pct: f64,
    pub state_ami_adjuster: f64,
    pub estimated_men_with_ami: f64,
    pub state_treat_among_ami_overall: f64,
    pub male_treat_among_ami_state: f64,
    pub estimated_men_treated: f64,
    pub estimated_male_treatment_gap: f64,
    pub male_treatment_rate: f64,
}

impl RegionIndicators {
    /// Share of men with AMI estimated to go untreated (%).
    pub fn male_treatment_gap_pct(&self) -> f64 {
        100.0 - self.male_treatment_rate
    }
}

/// Result of the derivation: one row per region plus the national aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorTable {
    pub regions: Vec<RegionIndicators>,
    /// sum(DisorderCount) / sum(Adults18plus) * 100 over the merged regions
    pub overall_ami_pct: f64,
    pub national: NationalRates,
}

impl IndicatorTable {
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// The table as a Polars DataFrame, columns in derivation order.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let pick = |f: fn(&RegionIndicators) -> f64| -> Vec<f64> { self.regions.iter().map(f).collect() };
        let states: Vec<&str> = self.regions.iter().map(|r| r.state.as_str()).collect();

        DataFrame::new(vec![
            Column::new(REGION_KEY.into(), states),
            Column::new("Disorder_18plus".into(), pick(|r| r.disorder_18plus)),
            Column::new("Treatment_18plus".into(), pick(|r| r.treatment_18plus)),
            Column::new("Adults18plus".into(), pick(|r| r.adults_18plus)),
            Column::new("AdultMen18plus".into(), pick(|r| r.adult_men_18plus)),
            Column::new("DisorderCount".into(), pick(|r| r.disorder_count)),
            Column::new("TreatmentCount".into(), pick(|r| r.treatment_count)),
            Column::new("DisorderPct".into(), pick(|r| r.disorder_pct)),
            Column::new("TreatmentPct".into(), pick(|r| r.treatment_pct)),
            Column::new("StateAMIAdjuster".into(), pick(|r| r.state_ami_adjuster)),
            Column::new("EstimatedMenWithAMI".into(), pick(|r| r.estimated_men_with_ami)),
            Column::new(
                "StateTreatAmongAMI_overall".into(),
                pick(|r| r.state_treat_among_ami_overall),
            ),
            Column::new(
                "MaleTreatAmongAMI_state".into(),
                pick(|r| r.male_treat_among_ami_state),
            ),
            Column::new("EstimatedMenTreated".into(), pick(|r| r.estimated_men_treated)),
            Column::new(
                "EstimatedMaleTreatmentGap".into(),
                pick(|r| r.estimated_male_treatment_gap),
            ),
            Column::new("MaleTreatmentRate".into(), pick(|r| r.male_treatment_rate)),
        ])
    }
}

/// National AMI prevalence over a set of regions (% of adults).
pub fn overall_prevalence_pct(disorder_counts: &[f64], adults: &[f64]) -> f64 {
    let disorder: f64 = disorder_counts.iter().sum();
    let population: f64 = adults.iter().sum();
    percent_of(disorder, population)
}

/// Handles the derivation of the state indicators.
pub struct IndicatorCalculator;

impl IndicatorCalculator {
    /// Derive every indicator for the joined regions.
    ///
    /// The steps run in dependency order: absolute counts, shares of the adult
    /// population, the national prevalence, the per-region adjuster, the male
    /// projections and finally the clamped male treatment rate.
    pub fn derive(inputs: &[RegionInputs], national: NationalRates) -> IndicatorTable {
        let counts: Vec<(f64, f64)> = inputs
            .iter()
            .map(|r| (r.disorder_18plus * ESTIMATE_UNIT, r.treatment_18plus * ESTIMATE_UNIT))
            .collect();

        let disorder_counts: Vec<f64> = counts.iter().map(|(d, _)| *d).collect();
        let adults: Vec<f64> = inputs.iter().map(|r| r.adults_18plus).collect();
        let overall_ami_pct = overall_prevalence_pct(&disorder_counts, &adults);
        let male_scale = national.male_treatment_scale();

        let regions = inputs
            .iter()
            .zip(counts)
            .map(|(r, (disorder_count, treatment_count))| {
                let disorder_pct = percent_of(disorder_count, r.adults_18plus);
                let treatment_pct = percent_of(treatment_count, r.adults_18plus);

                let state_ami_adjuster = safe_div(disorder_pct, overall_ami_pct);
                let estimated_men_with_ami =
                    r.adult_men_18plus * (national.male_ami_pct / 100.0) * state_ami_adjuster;

                let state_treat_among_ami_overall = safe_div(treatment_pct, disorder_pct);
                let male_treat_among_ami_state =
                    clamp_probability(state_treat_among_ami_overall * male_scale);

                let estimated_men_treated = estimated_men_with_ami * male_treat_among_ami_state;

                RegionIndicators {
                    state: r.state.clone(),
                    disorder_18plus: r.disorder_18plus,
                    treatment_18plus: r.treatment_18plus,
                    adults_18plus: r.adults_18plus,
                    adult_men_18plus: r.adult_men_18plus,
                    disorder_count,
                    treatment_count,
                    disorder_pct,
                    treatment_pct,
                    state_ami_adjuster,
                    estimated_men_with_ami,
                    state_treat_among_ami_overall,
                    male_treat_among_ami_state,
                    estimated_men_treated,
                    estimated_male_treatment_gap: estimated_men_with_ami - estimated_men_treated,
                    male_treatment_rate: male_treat_among_ami_state * 100.0,
                }
            })
            .collect();

        info!(
            "National AMI prevalence over merged regions: {:.2}% (male treatment scale {:.3})",
            overall_ami_pct, male_scale
        );

        IndicatorTable {
            regions,
            overall_ami_pct,
            national,
        }
    }

    /// Read the merged table and derive the indicators.
    pub fn derive_from_frame(
        merged: &DataFrame,
        national: NationalRates,
    ) -> Result<IndicatorTable, DeriveError> {
        let inputs = RegionInputs::from_frame(merged)?;
        Ok(Self::derive(&inputs, national))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NATIONAL: NationalRates = NationalRates {
        male_ami_pct: 18.1,
        male_treatment_pct: 41.6,
        overall_treatment_pct: 50.6,
    };

    fn region(state: &str, disorder: f64, treatment: f64, adults: f64, men: f64) -> RegionInputs {
        RegionInputs {
            state: state.to_string(),
            disorder_18plus: disorder,
            treatment_18plus: treatment,
            adults_18plus: adults,
            adult_men_18plus: men,
        }
    }

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_safe_div_policy() {
        assert_eq!(safe_div(1.0, 4.0), 0.25);
        assert_eq!(safe_div(5.0, 0.0), 0.0);
        assert_eq!(safe_div(-5.0, 0.0), 0.0);
        assert_eq!(safe_div(0.0, 0.0), 0.0);
        assert_eq!(safe_div(f64::NAN, 2.0), 0.0);
        assert_eq!(safe_div(f64::INFINITY, 2.0), 0.0);
        assert_eq!(safe_div(1.0, f64::MIN_POSITIVE / 4.0), 0.0);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(1.0, 4.0), 25.0);
        assert_eq!(percent_of(3.0, 0.0), 0.0);
        assert_eq!(percent_of(f64::MAX, 1.0), 0.0);
    }

    #[test]
    fn test_clamp_probability() {
        assert_eq!(clamp_probability(1.7), 1.0);
        assert_eq!(clamp_probability(-0.2), 0.0);
        assert_eq!(clamp_probability(0.42), 0.42);
        assert_eq!(clamp_probability(f64::NAN), 0.0);
    }

    #[test]
    fn test_two_region_national_prevalence() {
        let inputs = [
            region("A", 0.01, 0.005, 100.0, 50.0),
            region("B", 0.02, 0.01, 200.0, 100.0),
        ];
        let table = IndicatorCalculator::derive(&inputs, NATIONAL);

        assert!(approx_eq(table.overall_ami_pct, 10.0));
        assert!(approx_eq(table.regions[0].disorder_count, 10.0));
        assert!(approx_eq(table.regions[1].disorder_count, 20.0));
        for r in &table.regions {
            assert!(approx_eq(r.disorder_pct, 10.0));
            assert!(approx_eq(r.state_ami_adjuster, 1.0));
        }
    }

    #[test]
    fn test_male_projection_chain() {
        // 100 adults, 25 with AMI, 10 treated; 40 men.
        let inputs = [region("A", 0.025, 0.010, 100.0, 40.0)];
        let national = NationalRates {
            male_ami_pct: 20.0,
            male_treatment_pct: 40.0,
            overall_treatment_pct: 50.0,
        };
        let r = &IndicatorCalculator::derive(&inputs, national).regions[0];

        assert!(approx_eq(r.disorder_pct, 25.0));
        assert!(approx_eq(r.treatment_pct, 10.0));
        assert!(approx_eq(r.state_ami_adjuster, 1.0));
        assert!(approx_eq(r.estimated_men_with_ami, 8.0));
        assert!(approx_eq(r.state_treat_among_ami_overall, 0.4));
        assert!(approx_eq(r.male_treat_among_ami_state, 0.32));
        assert!(approx_eq(r.estimated_men_treated, 2.56));
        assert!(approx_eq(r.estimated_male_treatment_gap, 5.44));
        assert!(approx_eq(r.male_treatment_rate, 32.0));
        assert!(approx_eq(r.male_treatment_gap_pct(), 68.0));
    }

    #[test]
    fn test_treatment_above_prevalence_is_clamped() {
        let inputs = [region("A", 0.01, 0.05, 100.0, 40.0)];
        let national = NationalRates {
            male_ami_pct: 20.0,
            male_treatment_pct: 50.0,
            overall_treatment_pct: 50.0,
        };
        let r = &IndicatorCalculator::derive(&inputs, national).regions[0];
        assert!(r.state_treat_among_ami_overall > 1.0);
        assert_eq!(r.male_treat_among_ami_state, 1.0);
        assert_eq!(r.male_treatment_rate, 100.0);
        assert_eq!(r.estimated_male_treatment_gap, 0.0);
    }

    #[test]
    fn test_zero_prevalence_region_has_zero_adjuster() {
        let inputs = [
            region("Empty", 0.0, 0.0, 100.0, 50.0),
            region("Unpopulated", 0.01, 0.01, 0.0, 0.0),
            region("B", 0.02, 0.01, 200.0, 100.0),
        ];
        let table = IndicatorCalculator::derive(&inputs, NATIONAL);

        for r in &table.regions[..2] {
            assert_eq!(r.disorder_pct, 0.0);
            assert_eq!(r.state_ami_adjuster, 0.0);
            assert_eq!(r.state_treat_among_ami_overall, 0.0);
            assert_eq!(r.estimated_men_with_ami, 0.0);
        }
    }

    #[test]
    fn test_all_zero_population_is_finite() {
        let inputs = [region("A", 0.0, 0.0, 0.0, 0.0)];
        let table = IndicatorCalculator::derive(&inputs, NATIONAL);
        assert_eq!(table.overall_ami_pct, 0.0);
        assert_eq!(table.regions[0].state_ami_adjuster, 0.0);
    }

    #[test]
    fn test_zero_overall_treatment_scale() {
        let national = NationalRates {
            male_ami_pct: 18.1,
            male_treatment_pct: 41.6,
            overall_treatment_pct: 0.0,
        };
        assert_eq!(national.male_treatment_scale(), 0.0);
        let r = &IndicatorCalculator::derive(&[region("A", 0.01, 0.005, 100.0, 50.0)], national).regions[0];
        assert_eq!(r.male_treat_among_ami_state, 0.0);
    }

    #[test]
    fn test_from_frame_and_back() {
        let merged = df!(
            "State" => ["A", "B"],
            "Disorder_18plus" => [0.01, 0.02],
            "Treatment_18plus" => [0.005, 0.01],
            "Adults18plus" => [100.0, 200.0],
            "AdultMen18plus" => [50.0, 100.0]
        )
        .unwrap();

        let table = IndicatorCalculator::derive_from_frame(&merged, NATIONAL).unwrap();
        assert_eq!(table.len(), 2);

        let df = table.to_dataframe().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 16);
        let pct: Vec<Option<f64>> = df.column("DisorderPct").unwrap().f64().unwrap().into_iter().collect();
        assert!(pct.iter().all(|v| approx_eq(v.unwrap(), 10.0)));
    }

    #[test]
    fn test_from_frame_rejects_nulls() {
        let merged = df!(
            "State" => ["A"],
            "Disorder_18plus" => [None::<f64>],
            "Treatment_18plus" => [0.005],
            "Adults18plus" => [100.0],
            "AdultMen18plus" => [50.0]
        )
        .unwrap();
        let err = IndicatorCalculator::derive_from_frame(&merged, NATIONAL).unwrap_err();
        assert!(matches!(err, DeriveError::NullValue { row: 0, .. }));
    }

    fn arb_region() -> impl Strategy<Value = RegionInputs> {
        (
            prop_oneof![Just(0.0), 0.0..1e5f64],
            prop_oneof![Just(0.0), 0.0..1e5f64],
            prop_oneof![Just(0.0), 0.0..1e9f64],
            prop_oneof![Just(0.0), 0.0..1e9f64],
        )
            .prop_map(|(d, t, a, m)| region("R", d, t, a, m))
    }

    fn arb_national() -> impl Strategy<Value = NationalRates> {
        (0.0..100.0f64, 0.0..100.0f64, prop_oneof![Just(0.0), 0.0..100.0f64]).prop_map(
            |(ami, male_t, overall_t)| NationalRates {
                male_ami_pct: ami,
                male_treatment_pct: male_t,
                overall_treatment_pct: overall_t,
            },
        )
    }

    proptest! {
        #[test]
        fn prop_indicators_are_finite_and_bounded(
            inputs in prop::collection::vec(arb_region(), 1..20),
            national in arb_national(),
        ) {
            let table = IndicatorCalculator::derive(&inputs, national);
            prop_assert!(table.overall_ami_pct.is_finite());
            for r in &table.regions {
                prop_assert!(r.disorder_pct.is_finite() && r.disorder_pct >= 0.0);
                prop_assert!(r.treatment_pct.is_finite() && r.treatment_pct >= 0.0);
                prop_assert!((0.0..=1.0).contains(&r.male_treat_among_ami_state));
                prop_assert!(r.state_ami_adjuster.is_finite());
                if r.disorder_pct == 0.0 {
                    prop_assert_eq!(r.state_ami_adjuster, 0.0);
                }
            }
        }

        #[test]
        fn prop_overall_prevalence_matches_aggregate(
            inputs in prop::collection::vec(arb_region(), 1..20),
        ) {
            let table = IndicatorCalculator::derive(&inputs, NATIONAL);
            let counts: f64 = table.regions.iter().map(|r| r.disorder_count).sum();
            let adults: f64 = table.regions.iter().map(|r| r.adults_18plus).sum();
            let expected = if adults == 0.0 { 0.0 } else { counts / adults * 100.0 };
            prop_assert_eq!(table.overall_ami_pct, expected);
        }
    }
}
