//! Rank regions by male treatment rate.

use crate::stats::RegionIndicators;

/// Sort direction of a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    /// Highest rate first
    Descending,
    /// Lowest rate first
    Ascending,
}

/// The first `n` regions ranked on `MaleTreatmentRate`.
///
/// The sort is stable: regions with equal rates keep their table order.
pub fn rank_by_treatment_rate(
    regions: &[RegionIndicators],
    order: RankOrder,
    n: usize,
) -> Vec<&RegionIndicators> {
    let mut ranked: Vec<&RegionIndicators> = regions.iter().collect();
    ranked.sort_by(|a, b| match order {
        RankOrder::Descending => b.male_treatment_rate.total_cmp(&a.male_treatment_rate),
        RankOrder::Ascending => a.male_treatment_rate.total_cmp(&b.male_treatment_rate),
    });
    ranked.truncate(n);
    ranked
}

/// Regions with the highest male treatment rate.
pub fn top_treatment_rate(regions: &[RegionIndicators], n: usize) -> Vec<&RegionIndicators> {
    rank_by_treatment_rate(regions, RankOrder::Descending, n)
}

/// Regions with the lowest male treatment rate, i.e. the widest treatment gap.
pub fn bottom_treatment_rate(regions: &[RegionIndicators], n: usize) -> Vec<&RegionIndicators> {
    rank_by_treatment_rate(regions, RankOrder::Ascending, n)
}
