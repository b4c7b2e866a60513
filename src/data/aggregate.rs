use std::collections::BTreeMap;

use super::filter::FilteredTable;
use super::model::{AgeGroup, GeoLevel};

// ---------------------------------------------------------------------------
// Geographic aggregate
// ---------------------------------------------------------------------------

/// Case count for one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionCount {
    pub region: String,
    pub count: usize,
}

/// A ranked region with its share of the ranked total, in percent.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRegion {
    pub region: String,
    pub count: usize,
    pub share: f64,
}

/// Per-region case counts at one geographic level, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoAggregate {
    pub level: GeoLevel,
    pub rows: Vec<RegionCount>,
}

impl GeoAggregate {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> usize {
        self.rows.iter().map(|r| r.count).sum()
    }

    pub fn count_for(&self, region: &str) -> Option<usize> {
        self.rows.iter().find(|r| r.region == region).map(|r| r.count)
    }

    /// The `n` largest regions by count, descending. Equal counts keep their
    /// first-seen order. Shares are relative to the sum of the returned rows.
    pub fn top(&self, n: usize) -> Vec<RankedRegion> {
        let mut sorted: Vec<&RegionCount> = self.rows.iter().collect();
        sorted.sort_by(|a, b| b.count.cmp(&a.count));
        sorted.truncate(n);

        let sum: usize = sorted.iter().map(|r| r.count).sum();
        sorted
            .into_iter()
            .map(|r| RankedRegion {
                region: r.region.clone(),
                count: r.count,
                share: percent(r.count, sum),
            })
            .collect()
    }
}

/// Count filtered cases per region at `level`.
pub fn aggregate_by_geography(filtered: &FilteredTable<'_>, level: GeoLevel) -> GeoAggregate {
    let mut position: BTreeMap<&str, usize> = BTreeMap::new();
    let mut rows: Vec<RegionCount> = Vec::new();

    for rec in filtered.iter() {
        let region = rec.region(level);
        match position.get(region) {
            Some(&idx) => rows[idx].count += 1,
            None => {
                position.insert(region, rows.len());
                rows.push(RegionCount {
                    region: region.to_string(),
                    count: 1,
                });
            }
        }
    }

    GeoAggregate { level, rows }
}

// ---------------------------------------------------------------------------
// Weekly aggregate
// ---------------------------------------------------------------------------

/// Cases in one epidemiological week plus the trailing moving average.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekCount {
    pub week: u32,
    pub count: usize,
    pub moving_average: f64,
}

/// Weekly series ordered by week. Weeks without cases are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeeklyAggregate {
    pub rows: Vec<WeekCount>,
}

impl WeeklyAggregate {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Week with the most cases, first one on ties.
    pub fn peak(&self) -> Option<&WeekCount> {
        self.rows
            .iter()
            .fold(None, |best: Option<&WeekCount>, row| match best {
                Some(b) if b.count >= row.count => Some(b),
                _ => Some(row),
            })
    }
}

/// Count filtered cases per week and smooth them with a trailing window of
/// `window` observed weeks. Leading points average over however many samples
/// exist so far.
pub fn aggregate_by_week(filtered: &FilteredTable<'_>, window: usize) -> WeeklyAggregate {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for rec in filtered.iter() {
        *counts.entry(rec.week).or_default() += 1;
    }

    let series: Vec<(u32, usize)> = counts.into_iter().collect();
    let window = window.max(1);

    let rows = series
        .iter()
        .enumerate()
        .map(|(i, &(week, count))| {
            let start = (i + 1).saturating_sub(window);
            let samples = &series[start..=i];
            let sum: usize = samples.iter().map(|&(_, c)| c).sum();
            WeekCount {
                week,
                count,
                moving_average: sum as f64 / samples.len() as f64,
            }
        })
        .collect();

    WeeklyAggregate { rows }
}

// ---------------------------------------------------------------------------
// Demographic breakdowns
// ---------------------------------------------------------------------------

/// One slice of a categorical breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare<K> {
    pub key: K,
    pub count: usize,
    pub share: f64,
}

/// Cases per sex, largest first.
pub fn sex_distribution(filtered: &FilteredTable<'_>) -> Vec<CategoryShare<String>> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for rec in filtered.iter() {
        *counts.entry(rec.sex.as_str()).or_default() += 1;
    }

    let total = filtered.len();
    let mut out: Vec<CategoryShare<String>> = counts
        .into_iter()
        .map(|(sex, count)| CategoryShare {
            key: sex.to_string(),
            count,
            share: percent(count, total),
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

/// Cases per age group, in the natural age order.
pub fn age_distribution(filtered: &FilteredTable<'_>) -> Vec<CategoryShare<AgeGroup>> {
    let mut counts: BTreeMap<&AgeGroup, usize> = BTreeMap::new();
    for rec in filtered.iter() {
        *counts.entry(&rec.age_group).or_default() += 1;
    }

    let total = filtered.len();
    counts
        .into_iter()
        .map(|(group, count)| CategoryShare {
            key: group.clone(),
            count,
            share: percent(count, total),
        })
        .collect()
}

/// `part / whole` as a percentage, 0.0 when `whole` is zero.
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{apply_filters, FilterCriteria};
    use crate::data::model::tests::case;
    use crate::data::model::{CaseDataset, CaseRecord};

    fn table(records: &[CaseRecord]) -> FilteredTable<'_> {
        FilteredTable {
            records: records.iter().collect(),
        }
    }

    #[test]
    fn worked_example() {
        let ds = CaseDataset::from_records(vec![
            case(2022, 1, "LIMA", "M"),
            case(2022, 1, "LIMA", "F"),
            case(2022, 2, "CALLAO", "M"),
        ]);
        let criteria = FilterCriteria {
            weeks: (1, 1),
            ..FilterCriteria::for_dataset(&ds)
        };
        let filtered = apply_filters(&ds, &criteria);

        let geo = aggregate_by_geography(&filtered, GeoLevel::Department);
        assert_eq!(
            geo.rows,
            vec![RegionCount {
                region: "LIMA".into(),
                count: 2
            }]
        );

        let weekly = aggregate_by_week(&filtered, 3);
        assert_eq!(weekly.rows.len(), 1);
        assert_eq!(weekly.rows[0].week, 1);
        assert_eq!(weekly.rows[0].count, 2);
    }

    #[test]
    fn geo_counts_sum_to_filtered_total() {
        let records = vec![
            case(2022, 1, "LIMA", "M"),
            case(2022, 3, "PIURA", "F"),
            case(2022, 3, "LIMA", "F"),
            case(2022, 4, "LORETO", "M"),
        ];
        let filtered = table(&records);
        for level in GeoLevel::ALL {
            assert_eq!(aggregate_by_geography(&filtered, level).total(), filtered.len());
        }
    }

    #[test]
    fn geo_rows_keep_first_seen_order() {
        let records = vec![
            case(2022, 1, "PIURA", "M"),
            case(2022, 1, "LIMA", "M"),
            case(2022, 1, "PIURA", "F"),
        ];
        let geo = aggregate_by_geography(&table(&records), GeoLevel::Department);
        let names: Vec<&str> = geo.rows.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(names, ["PIURA", "LIMA"]);
        assert_eq!(geo.count_for("PIURA"), Some(2));
        assert_eq!(geo.count_for("CUSCO"), None);
    }

    #[test]
    fn top_sorts_descending_with_shares() {
        let records = vec![
            case(2022, 1, "ICA", "M"),
            case(2022, 1, "LIMA", "M"),
            case(2022, 1, "LIMA", "F"),
            case(2022, 1, "LIMA", "F"),
            case(2022, 1, "PIURA", "M"),
        ];
        let top = aggregate_by_geography(&table(&records), GeoLevel::Department).top(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].region, "LIMA");
        // ICA and PIURA tie; ICA was seen first.
        assert_eq!(top[1].region, "ICA");
        assert!((top[0].share - 75.0).abs() < 1e-9);
        assert!((top[1].share - 25.0).abs() < 1e-9);
    }

    #[test]
    fn moving_average_warms_up() {
        let mut records = Vec::new();
        for (week, n) in [(1, 4), (2, 2), (3, 6), (5, 1)] {
            for _ in 0..n {
                records.push(case(2023, week, "LIMA", "M"));
            }
        }
        let weekly = aggregate_by_week(&table(&records), 3);
        let weeks: Vec<u32> = weekly.rows.iter().map(|r| r.week).collect();
        assert_eq!(weeks, [1, 2, 3, 5]);
        assert_eq!(weekly.rows[0].moving_average, 4.0);
        assert_eq!(weekly.rows[1].moving_average, 3.0);
        assert_eq!(weekly.rows[2].moving_average, 4.0);
        assert_eq!(weekly.rows[3].moving_average, 3.0);
        assert_eq!(weekly.peak().map(|p| p.week), Some(3));
    }

    #[test]
    fn empty_table_aggregates_to_nothing() {
        let filtered = FilteredTable::default();
        assert!(aggregate_by_geography(&filtered, GeoLevel::District).is_empty());
        assert!(aggregate_by_week(&filtered, 3).peak().is_none());
        assert!(sex_distribution(&filtered).is_empty());
        assert!(age_distribution(&filtered).is_empty());
    }

    #[test]
    fn demographic_breakdowns() {
        let mut records = vec![
            case(2022, 1, "LIMA", "F"),
            case(2022, 1, "LIMA", "M"),
            case(2022, 1, "LIMA", "F"),
            case(2022, 1, "LIMA", "F"),
        ];
        records[0].age_group = AgeGroup::OlderAdults;
        records[1].age_group = AgeGroup::Children;

        let sexes = sex_distribution(&table(&records));
        assert_eq!(sexes[0].key, "F");
        assert_eq!(sexes[0].count, 3);
        assert!((sexes[0].share - 75.0).abs() < 1e-9);

        let ages = age_distribution(&table(&records));
        let order: Vec<&AgeGroup> = ages.iter().map(|a| &a.key).collect();
        assert_eq!(
            order,
            [&AgeGroup::Children, &AgeGroup::Adults, &AgeGroup::OlderAdults]
        );
        assert_eq!(ages[1].count, 2);
    }

    #[test]
    fn percent_guards_zero() {
        assert_eq!(percent(3, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }
}
