use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::aggregate::{percent, RegionCount};
use super::filter::{Choice, FilterCriteria, FilteredTable};
use super::model::CaseDataset;
use crate::config::MetricsConfig;

/// Year-over-year card. Falls back to an estimate whenever a real
/// comparison is impossible.
#[derive(Debug, Clone, PartialEq)]
pub enum YearlyComparison {
    /// Change against the previous year's full-table count, in percent.
    Growth { percent: f64, previous: usize },
    /// Single year selected but the previous year has no records.
    EstimatedSevere { cases: usize },
    /// All years selected.
    EstimatedLethality { percent: f64 },
}

/// Headline numbers for the metric cards.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryMetrics {
    pub total: usize,
    /// `None` when the filtered table is empty.
    pub most_affected: Option<RegionCount>,
    /// Cases per 100,000 inhabitants.
    pub incidence_rate: f64,
    pub yearly: YearlyComparison,
    pub departments_affected: usize,
    pub departments_total: usize,
}

impl SummaryMetrics {
    /// Region label for the "most affected" card.
    pub fn most_affected_label(&self) -> MostAffected<'_> {
        MostAffected(self.most_affected.as_ref())
    }

    pub fn departments_share(&self) -> f64 {
        percent(self.departments_affected, self.departments_total)
    }
}

/// Displays the region name or `N/A`.
pub struct MostAffected<'a>(Option<&'a RegionCount>);

impl fmt::Display for MostAffected<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(rc) => f.write_str(&rc.region),
            None => f.write_str("N/A"),
        }
    }
}

/// Compute the metric cards for the current filter state.
pub fn summary_metrics(
    filtered: &FilteredTable<'_>,
    dataset: &CaseDataset,
    criteria: &FilterCriteria,
    config: &MetricsConfig,
) -> SummaryMetrics {
    let total = filtered.len();

    let incidence_rate = if config.population == 0 {
        0.0
    } else {
        total as f64 / config.population as f64 * 100_000.0
    };

    let departments: BTreeSet<&str> = filtered.iter().map(|r| r.department.as_str()).collect();

    SummaryMetrics {
        total,
        most_affected: most_affected(filtered, criteria),
        incidence_rate,
        yearly: yearly_comparison(total, dataset, criteria, config),
        departments_affected: departments.len(),
        departments_total: dataset.departments.len(),
    }
}

/// Region with the highest count at the active level. Ties go to the
/// lexicographically smallest name.
fn most_affected(filtered: &FilteredTable<'_>, criteria: &FilterCriteria) -> Option<RegionCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for rec in filtered.iter() {
        *counts.entry(rec.region(criteria.level)).or_default() += 1;
    }

    // BTreeMap iterates in name order; keep the first maximum seen.
    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (region, count)| match best {
            Some((_, c)) if c >= count => best,
            _ => Some((region, count)),
        })
        .map(|(region, count)| RegionCount {
            region: region.to_string(),
            count,
        })
}

fn yearly_comparison(
    total: usize,
    dataset: &CaseDataset,
    criteria: &FilterCriteria,
    config: &MetricsConfig,
) -> YearlyComparison {
    let Choice::Only(year) = criteria.year else {
        return YearlyComparison::EstimatedLethality {
            percent: config.lethality_percent,
        };
    };

    let previous = year
        .checked_sub(1)
        .map(|prev| dataset.count_year(prev))
        .unwrap_or(0);

    if previous == 0 {
        return YearlyComparison::EstimatedSevere {
            cases: (total as f64 * config.severe_ratio).floor() as usize,
        };
    }

    YearlyComparison::Growth {
        percent: (total as f64 - previous as f64) / previous as f64 * 100.0,
        previous,
    }
}
