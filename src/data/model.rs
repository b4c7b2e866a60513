use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// AgeGroup – the `tipo_edad` vocabulary
// ---------------------------------------------------------------------------

/// Age-group label of a case.
///
/// Variants are declared in their natural display order so the derived `Ord`
/// sorts children first and older adults last. Labels outside the known
/// vocabulary are kept verbatim and sort after every known group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeGroup {
    Children,
    Adolescents,
    YoungAdults,
    Adults,
    OlderAdults,
    Other(String),
}

impl AgeGroup {
    /// Parse a raw `tipo_edad` cell. Matching ignores surrounding whitespace
    /// and letter case (Unicode, so `niños` is `NIÑOS`). The accented and
    /// unaccented spellings `NIÑOS`/`NINOS` and `JÓVENES`/`JOVENES` are the
    /// same group; any other label is kept trimmed as `Other`.
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_uppercase().as_str() {
            "NIÑOS" | "NINOS" => AgeGroup::Children,
            "ADOLESCENTES" => AgeGroup::Adolescents,
            "JOVENES" | "JÓVENES" => AgeGroup::YoungAdults,
            "ADULTOS" => AgeGroup::Adults,
            "ADULTOS MAYORES" => AgeGroup::OlderAdults,
            _ => AgeGroup::Other(trimmed.to_string()),
        }
    }

    /// The label as it appears in the source data.
    pub fn label(&self) -> &str {
        match self {
            AgeGroup::Children => "NIÑOS",
            AgeGroup::Adolescents => "ADOLESCENTES",
            AgeGroup::YoungAdults => "JOVENES",
            AgeGroup::Adults => "ADULTOS",
            AgeGroup::OlderAdults => "ADULTOS MAYORES",
            AgeGroup::Other(s) => s,
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// GeoLevel – geographic resolution
// ---------------------------------------------------------------------------

/// Administrative level used for filtering, grouping and the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum GeoLevel {
    #[default]
    Department,
    Province,
    District,
}

impl GeoLevel {
    pub const ALL: [GeoLevel; 3] = [GeoLevel::Department, GeoLevel::Province, GeoLevel::District];

    /// Source column holding this level's region name.
    pub fn column(self) -> &'static str {
        match self {
            GeoLevel::Department => "departamento",
            GeoLevel::Province => "provincia",
            GeoLevel::District => "distrito",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GeoLevel::Department => "Department",
            GeoLevel::Province => "Province",
            GeoLevel::District => "District",
        }
    }

    /// Plural label used in headings ("Departments most affected").
    pub fn plural(self) -> &'static str {
        match self {
            GeoLevel::Department => "Departments",
            GeoLevel::Province => "Provinces",
            GeoLevel::District => "Districts",
        }
    }
}

impl fmt::Display for GeoLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// CaseRecord – one row of the source table
// ---------------------------------------------------------------------------

/// A single reported dengue case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseRecord {
    pub year: i32,
    /// Epidemiological week, 1..=53.
    pub week: u32,
    pub department: String,
    pub province: String,
    pub district: String,
    pub sex: String,
    pub age_group: AgeGroup,
}

impl CaseRecord {
    /// Region name of this case at the given level.
    pub fn region(&self, level: GeoLevel) -> &str {
        match level {
            GeoLevel::Department => &self.department,
            GeoLevel::Province => &self.province,
            GeoLevel::District => &self.district,
        }
    }
}

// ---------------------------------------------------------------------------
// CaseDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed option indices.
///
/// Built once by the loader and never mutated afterwards; every view is a
/// projection over `records`.
#[derive(Debug, Clone, Default)]
pub struct CaseDataset {
    pub records: Vec<CaseRecord>,
    pub years: BTreeSet<i32>,
    pub sexes: BTreeSet<String>,
    pub age_groups: BTreeSet<AgeGroup>,
    pub departments: BTreeSet<String>,
    /// Observed (min, max) week; `None` for an empty table.
    pub week_bounds: Option<(u32, u32)>,
    /// department → provinces seen under it.
    provinces_by_department: BTreeMap<String, BTreeSet<String>>,
    /// province → districts seen under it.
    districts_by_province: BTreeMap<String, BTreeSet<String>>,
}

impl CaseDataset {
    /// Build option indices from the loaded records.
    pub fn from_records(records: Vec<CaseRecord>) -> Self {
        let mut dataset = CaseDataset::default();

        for rec in &records {
            dataset.years.insert(rec.year);
            dataset.sexes.insert(rec.sex.clone());
            dataset.age_groups.insert(rec.age_group.clone());
            dataset.departments.insert(rec.department.clone());
            dataset
                .provinces_by_department
                .entry(rec.department.clone())
                .or_default()
                .insert(rec.province.clone());
            dataset
                .districts_by_province
                .entry(rec.province.clone())
                .or_default()
                .insert(rec.district.clone());

            dataset.week_bounds = Some(match dataset.week_bounds {
                None => (rec.week, rec.week),
                Some((lo, hi)) => (lo.min(rec.week), hi.max(rec.week)),
            });
        }

        dataset.records = records;
        dataset
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted provinces belonging to any of the given departments.
    pub fn provinces_in<'a, I>(&self, departments: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        departments
            .into_iter()
            .filter_map(|d| self.provinces_by_department.get(d))
            .flatten()
            .cloned()
            .collect()
    }

    /// Sorted districts belonging to any of the given provinces.
    pub fn districts_in<'a, I>(&self, provinces: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        provinces
            .into_iter()
            .filter_map(|p| self.districts_by_province.get(p))
            .flatten()
            .cloned()
            .collect()
    }

    /// Number of records whose year equals `year`.
    pub fn count_year(&self, year: i32) -> usize {
        self.records.iter().filter(|r| r.year == year).count()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn case(year: i32, week: u32, dept: &str, sex: &str) -> CaseRecord {
        CaseRecord {
            year,
            week,
            department: dept.to_string(),
            province: format!("{dept}-P"),
            district: format!("{dept}-P-D"),
            sex: sex.to_string(),
            age_group: AgeGroup::Adults,
        }
    }

    #[test]
    fn age_groups_sort_in_natural_order() {
        let mut groups = vec![
            AgeGroup::parse("ADULTOS MAYORES"),
            AgeGroup::parse("desconocido"),
            AgeGroup::parse("niños"),
            AgeGroup::parse("JOVENES"),
            AgeGroup::parse("ADOLESCENTES"),
            AgeGroup::parse("ADULTOS"),
        ];
        groups.sort();
        let labels: Vec<&str> = groups.iter().map(AgeGroup::label).collect();
        assert_eq!(
            labels,
            ["NIÑOS", "ADOLESCENTES", "JOVENES", "ADULTOS", "ADULTOS MAYORES", "desconocido"]
        );
    }

    #[test]
    fn spelling_variants_fold_into_one_group() {
        for label in ["Niños", "NINOS", "NIÑOS", " niños "] {
            assert_eq!(AgeGroup::parse(label), AgeGroup::Children, "{label}");
        }
        for label in ["JÓVENES", "jovenes", "Jóvenes"] {
            assert_eq!(AgeGroup::parse(label), AgeGroup::YoungAdults, "{label}");
        }
        assert_eq!(AgeGroup::parse(" ADULTOS "), AgeGroup::Adults);
        assert_eq!(
            AgeGroup::parse(" Lactantes "),
            AgeGroup::Other("Lactantes".into())
        );
    }

    #[test]
    fn indices_cover_hierarchy() {
        let mut lima_2 = case(2023, 9, "LIMA", "F");
        lima_2.province = "HUAURA".into();
        lima_2.district = "HUACHO".into();
        let ds = CaseDataset::from_records(vec![
            case(2022, 4, "LIMA", "M"),
            lima_2,
            case(2023, 1, "PIURA", "F"),
        ]);

        assert_eq!(ds.week_bounds, Some((1, 9)));
        assert_eq!(ds.years.iter().copied().collect::<Vec<_>>(), [2022, 2023]);

        let lima = vec!["LIMA".to_string()];
        let provinces = ds.provinces_in(&lima);
        assert_eq!(
            provinces.iter().map(String::as_str).collect::<Vec<_>>(),
            ["HUAURA", "LIMA-P"]
        );
        let districts = ds.districts_in(&provinces);
        assert!(districts.contains("HUACHO"));
        assert!(!districts.contains("PIURA-P-D"));
        assert_eq!(ds.count_year(2023), 2);
    }

    #[test]
    fn empty_dataset_has_no_week_bounds() {
        let ds = CaseDataset::from_records(Vec::new());
        assert!(ds.is_empty());
        assert_eq!(ds.week_bounds, None);
    }
}
