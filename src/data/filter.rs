use std::collections::BTreeSet;

use super::model::{AgeGroup, CaseDataset, CaseRecord, GeoLevel};

// ---------------------------------------------------------------------------
// Selection primitives
// ---------------------------------------------------------------------------

/// Multi-value selection. An emptied subset is never stored: it collapses to
/// `All`, so "nothing picked" always means "every value present".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T: Ord> {
    All,
    Subset(BTreeSet<T>),
}

impl<T: Ord> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}

impl<T: Ord> Selection<T> {
    /// Build a selection from picked values, collapsing the empty set to `All`.
    pub fn from_set(values: BTreeSet<T>) -> Self {
        if values.is_empty() {
            Selection::All
        } else {
            Selection::Subset(values)
        }
    }

    pub fn contains(&self, value: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Subset(set) => set.contains(value),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

impl<T: Ord + Clone> Selection<T> {
    /// Add or remove one value. `All` expands to `universe` first; a subset
    /// that ends up empty or equal to `universe` collapses back to `All`.
    pub fn toggle(&mut self, value: T, universe: &BTreeSet<T>) {
        let mut set = match std::mem::take(self) {
            Selection::All => universe.clone(),
            Selection::Subset(set) => set,
        };
        if !set.remove(&value) {
            set.insert(value);
        }
        *self = if set == *universe {
            Selection::All
        } else {
            Selection::from_set(set)
        };
    }

    /// Resolve against the universe of values present in the data.
    pub fn resolve(&self, universe: &BTreeSet<T>) -> BTreeSet<T> {
        match self {
            Selection::All => universe.clone(),
            Selection::Subset(set) => set.clone(),
        }
    }
}

/// Single-value selector with an "all" option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice<T> {
    All,
    Only(T),
}

impl<T> Default for Choice<T> {
    fn default() -> Self {
        Choice::All
    }
}

impl<T: PartialEq> Choice<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(v) => v == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Choice::All)
    }
}

// ---------------------------------------------------------------------------
// FilterCriteria
// ---------------------------------------------------------------------------

/// Everything the analyst chose in the filter panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub year: Choice<i32>,
    /// Inclusive epidemiological week range.
    pub weeks: (u32, u32),
    pub sex: Choice<String>,
    pub age_group: Choice<AgeGroup>,
    pub departments: Selection<String>,
    pub provinces: Selection<String>,
    pub districts: Selection<String>,
    pub level: GeoLevel,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            year: Choice::All,
            weeks: (1, 53),
            sex: Choice::All,
            age_group: Choice::All,
            departments: Selection::All,
            provinces: Selection::All,
            districts: Selection::All,
            level: GeoLevel::Department,
        }
    }
}

impl FilterCriteria {
    /// Criteria that let every record of `dataset` through.
    pub fn for_dataset(dataset: &CaseDataset) -> Self {
        Self {
            weeks: dataset.week_bounds.unwrap_or((1, 53)),
            ..Self::default()
        }
    }

    /// Departments currently in scope (all of them when nothing is picked).
    pub fn department_scope(&self, dataset: &CaseDataset) -> BTreeSet<String> {
        self.departments.resolve(&dataset.departments)
    }

    /// Provinces the analyst may pick from, given the department scope.
    pub fn province_options(&self, dataset: &CaseDataset) -> BTreeSet<String> {
        dataset.provinces_in(&self.department_scope(dataset))
    }

    /// Districts the analyst may pick from, given the province scope.
    pub fn district_options(&self, dataset: &CaseDataset) -> BTreeSet<String> {
        let provinces = self.provinces.resolve(&self.province_options(dataset));
        dataset.districts_in(&provinces)
    }

    /// Drop province and district picks that fall outside the selected parents.
    pub fn constrain(&mut self, dataset: &CaseDataset) {
        if let Selection::Subset(picked) = &self.provinces {
            let allowed = self.province_options(dataset);
            let kept = picked.intersection(&allowed).cloned().collect();
            self.provinces = Selection::from_set(kept);
        }
        if let Selection::Subset(picked) = &self.districts {
            let allowed = self.district_options(dataset);
            let kept = picked.intersection(&allowed).cloned().collect();
            self.districts = Selection::from_set(kept);
        }
    }

    /// Pre-pick the first `n` provinces/districts available at the current
    /// level, or every option when there are at most `n`.
    pub fn preselect_hierarchy(&mut self, dataset: &CaseDataset, n: usize) {
        self.provinces = Selection::All;
        self.districts = Selection::All;
        if self.level == GeoLevel::Department {
            return;
        }
        self.provinces = first_n(self.province_options(dataset), n);
        if self.level == GeoLevel::District {
            self.districts = first_n(self.district_options(dataset), n);
        }
    }
}

fn first_n(options: BTreeSet<String>, n: usize) -> Selection<String> {
    Selection::from_set(options.into_iter().take(n).collect())
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Order-preserving view of the records that passed every active filter.
#[derive(Debug, Clone, Default)]
pub struct FilteredTable<'a> {
    pub records: Vec<&'a CaseRecord>,
}

impl<'a> FilteredTable<'a> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a CaseRecord> + '_ {
        self.records.iter().copied()
    }
}

/// Return the records of `dataset` that satisfy `criteria`.
///
/// A record passes when:
/// * its year matches (or the year choice is `All`)
/// * its week lies in the inclusive range
/// * its sex and age group match (or the choice is `All`)
/// * its department is selected
/// * its province is selected, checked only at province/district level
/// * its district is selected, checked only at district level
pub fn apply_filters<'a>(dataset: &'a CaseDataset, criteria: &FilterCriteria) -> FilteredTable<'a> {
    let (lo, hi) = criteria.weeks;
    let check_provinces = criteria.level != GeoLevel::Department;
    let check_districts = criteria.level == GeoLevel::District;

    let records = dataset
        .records
        .iter()
        .filter(|r| criteria.year.matches(&r.year))
        .filter(|r| (lo..=hi).contains(&r.week))
        .filter(|r| criteria.sex.matches(&r.sex))
        .filter(|r| criteria.age_group.matches(&r.age_group))
        .filter(|r| criteria.departments.contains(&r.department))
        .filter(|r| !check_provinces || criteria.provinces.contains(&r.province))
        .filter(|r| !check_districts || criteria.districts.contains(&r.district))
        .collect();

    FilteredTable { records }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::case;

    fn sample() -> CaseDataset {
        let mut records = vec![
            case(2022, 1, "LIMA", "M"),
            case(2022, 1, "LIMA", "F"),
            case(2022, 2, "CALLAO", "M"),
            case(2023, 5, "PIURA", "F"),
            case(2023, 7, "LIMA", "M"),
        ];
        records[1].province = "HUAURA".into();
        records[1].district = "HUACHO".into();
        records[3].age_group = AgeGroup::Children;
        CaseDataset::from_records(records)
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn week_range_example() {
        let ds = CaseDataset::from_records(vec![
            case(2022, 1, "LIMA", "M"),
            case(2022, 1, "LIMA", "F"),
            case(2022, 2, "CALLAO", "M"),
        ]);
        let criteria = FilterCriteria {
            weeks: (1, 1),
            ..FilterCriteria::for_dataset(&ds)
        };
        let out = apply_filters(&ds, &criteria);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.department == "LIMA"));
    }

    #[test]
    fn output_is_ordered_subset_satisfying_predicates() {
        let ds = sample();
        let criteria = FilterCriteria {
            year: Choice::Only(2022),
            sex: Choice::Only("M".into()),
            ..FilterCriteria::for_dataset(&ds)
        };
        let out = apply_filters(&ds, &criteria);
        assert!(out.len() <= ds.len());
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.year == 2022 && r.sex == "M"));
        assert_eq!(out.records[0].department, "LIMA");
        assert_eq!(out.records[1].department, "CALLAO");
    }

    #[test]
    fn empty_department_selection_means_all() {
        let ds = sample();
        let base = FilterCriteria::for_dataset(&ds);
        let emptied = FilterCriteria {
            departments: Selection::from_set(BTreeSet::new()),
            ..base.clone()
        };
        let everything = FilterCriteria {
            departments: Selection::Subset(ds.departments.clone()),
            ..base.clone()
        };
        assert_eq!(emptied.departments, Selection::All);
        assert_eq!(apply_filters(&ds, &emptied).len(), ds.len());
        assert_eq!(apply_filters(&ds, &everything).len(), ds.len());
    }

    #[test]
    fn selecting_every_value_is_a_no_op() {
        let ds = sample();
        let base = FilterCriteria::for_dataset(&ds);
        let explicit = FilterCriteria {
            level: GeoLevel::District,
            provinces: Selection::Subset(ds.provinces_in(&ds.departments)),
            districts: Selection::Subset(ds.districts_in(&ds.provinces_in(&ds.departments))),
            ..base.clone()
        };
        let all = apply_filters(&ds, &base);
        let same = apply_filters(&ds, &explicit);
        assert_eq!(all.records, same.records);
    }

    #[test]
    fn age_group_filter_is_exact() {
        let ds = sample();
        let criteria = FilterCriteria {
            age_group: Choice::Only(AgeGroup::Children),
            ..FilterCriteria::for_dataset(&ds)
        };
        let out = apply_filters(&ds, &criteria);
        assert_eq!(out.len(), 1);
        assert_eq!(out.records[0].department, "PIURA");
    }

    #[test]
    fn province_filter_only_applies_below_department_level() {
        let ds = sample();
        let mut criteria = FilterCriteria {
            provinces: Selection::Subset(set(&["HUAURA"])),
            ..FilterCriteria::for_dataset(&ds)
        };
        assert_eq!(apply_filters(&ds, &criteria).len(), ds.len());

        criteria.level = GeoLevel::Province;
        let out = apply_filters(&ds, &criteria);
        assert_eq!(out.len(), 1);
        assert_eq!(out.records[0].district, "HUACHO");
    }

    #[test]
    fn district_filter_only_applies_at_district_level() {
        let ds = sample();
        let mut criteria = FilterCriteria {
            level: GeoLevel::Province,
            districts: Selection::Subset(set(&["HUACHO"])),
            ..FilterCriteria::for_dataset(&ds)
        };
        assert_eq!(apply_filters(&ds, &criteria).len(), ds.len());

        criteria.level = GeoLevel::District;
        assert_eq!(apply_filters(&ds, &criteria).len(), 1);
    }

    #[test]
    fn constrain_drops_orphaned_children() {
        let ds = sample();
        let mut criteria = FilterCriteria {
            level: GeoLevel::District,
            departments: Selection::Subset(set(&["PIURA"])),
            provinces: Selection::Subset(set(&["HUAURA", "PIURA-P"])),
            districts: Selection::Subset(set(&["HUACHO"])),
            ..FilterCriteria::for_dataset(&ds)
        };
        criteria.constrain(&ds);
        assert_eq!(criteria.provinces, Selection::Subset(set(&["PIURA-P"])));
        assert_eq!(criteria.districts, Selection::All);
    }

    #[test]
    fn preselect_takes_first_options() {
        let ds = sample();
        let mut criteria = FilterCriteria {
            level: GeoLevel::Province,
            ..FilterCriteria::for_dataset(&ds)
        };
        criteria.preselect_hierarchy(&ds, 2);
        assert_eq!(criteria.provinces, Selection::Subset(set(&["CALLAO-P", "HUAURA"])));
        assert_eq!(criteria.districts, Selection::All);
    }

    #[test]
    fn toggle_expands_all_and_collapses_back() {
        let universe = set(&["ICA", "LIMA", "PIURA"]);
        let mut sel: Selection<String> = Selection::All;
        sel.toggle("LIMA".into(), &universe);
        assert_eq!(sel, Selection::Subset(set(&["ICA", "PIURA"])));
        sel.toggle("LIMA".into(), &universe);
        assert!(sel.is_all());

        sel.toggle("ICA".into(), &universe);
        sel.toggle("PIURA".into(), &universe);
        assert_eq!(sel, Selection::Subset(set(&["LIMA"])));
        sel.toggle("LIMA".into(), &universe);
        assert!(sel.is_all());
    }
}
