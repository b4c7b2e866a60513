use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::boundaries::BoundarySet;
use crate::config::Config;
use crate::data::aggregate::{
    age_distribution, aggregate_by_geography, aggregate_by_week, sex_distribution, CategoryShare,
    GeoAggregate, RankedRegion, WeeklyAggregate,
};
use crate::data::filter::{apply_filters, Choice, FilterCriteria, Selection};
use crate::data::metrics::{summary_metrics, SummaryMetrics};
use crate::data::model::{AgeGroup, CaseDataset, GeoLevel};
use crate::synthetic::{
    outbreak_factors, regional_risk, HeadlineIndicators, NoiseSource, RegionalRisk, SeededNoise,
};

// ---------------------------------------------------------------------------
// Derived view
// ---------------------------------------------------------------------------

/// Everything the charts draw, recomputed on every filter change.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub geo: GeoAggregate,
    pub top: Vec<RankedRegion>,
    pub weekly: WeeklyAggregate,
    pub metrics: SummaryMetrics,
    pub sexes: Vec<CategoryShare<String>>,
    pub ages: Vec<CategoryShare<AgeGroup>>,
    pub headline: HeadlineIndicators,
    pub risk: Vec<RegionalRisk>,
    pub factors: Vec<(&'static str, f64)>,
}

/// Run the whole pipeline for one criteria value.
pub fn build_view(
    dataset: &CaseDataset,
    criteria: &FilterCriteria,
    config: &Config,
    noise: &mut impl NoiseSource,
) -> DashboardView {
    let filtered = apply_filters(dataset, criteria);
    let geo = aggregate_by_geography(&filtered, criteria.level);
    let top = geo.top(config.charts.top_n);

    let risk_regions = &top[..top.len().min(config.charts.risk_regions)];
    let risk = regional_risk(
        risk_regions,
        &mut SeededNoise::new(config.synthetic.risk_seed),
    );

    log::debug!(
        "Filtered {} of {} records into {} regions",
        filtered.len(),
        dataset.len(),
        geo.rows.len()
    );

    DashboardView {
        weekly: aggregate_by_week(&filtered, config.charts.moving_average_window),
        metrics: summary_metrics(&filtered, dataset, criteria, &config.metrics),
        sexes: sex_distribution(&filtered),
        ages: age_distribution(&filtered),
        headline: HeadlineIndicators::generate(noise),
        factors: outbreak_factors(noise),
        geo,
        top,
        risk,
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Where the boundaries of one level stand.
#[derive(Debug, Clone, Copy)]
pub enum BoundaryStatus<'a> {
    Ready(&'a BoundarySet),
    Loading,
    Failed(&'a str),
}

type BoundaryResult = Result<BoundarySet, String>;

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: Config,

    /// Loaded dataset (None until a file loads).
    pub dataset: Option<CaseDataset>,

    /// Current filter selections.
    pub criteria: FilterCriteria,

    /// Views derived from `criteria` (cached until the next change).
    pub view: Option<DashboardView>,

    /// Boundaries loaded so far, per level.
    boundaries: BTreeMap<GeoLevel, BoundarySet>,

    /// Levels whose boundaries failed to load, with the reason.
    boundary_errors: BTreeMap<GeoLevel, String>,

    /// Loads running on a worker thread.
    pending: BTreeMap<GeoLevel, Receiver<BoundaryResult>>,

    /// Noise for the synthetic headline indicators.
    noise: SeededNoise,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let noise = match config.synthetic.seed {
            Some(seed) => SeededNoise::new(seed),
            None => SeededNoise::from_clock(),
        };
        Self {
            config,
            dataset: None,
            criteria: FilterCriteria::default(),
            view: None,
            boundaries: BTreeMap::new(),
            boundary_errors: BTreeMap::new(),
            pending: BTreeMap::new(),
            noise,
            status_message: None,
        }
    }

    /// Load a file and install it, or record the failure.
    pub fn load_path(&mut self, path: &Path) {
        match crate::data::loader::load_file(path) {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a newly loaded dataset and reset the filters.
    pub fn set_dataset(&mut self, dataset: CaseDataset) {
        self.criteria = FilterCriteria {
            level: self.criteria.level,
            ..FilterCriteria::for_dataset(&dataset)
        };
        self.criteria
            .preselect_hierarchy(&dataset, self.config.charts.preselect);
        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
        self.request_boundaries(self.criteria.level);
    }

    /// Recompute the view after a filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.criteria.constrain(ds);
            self.view = Some(build_view(ds, &self.criteria, &self.config, &mut self.noise));
        }
    }

    /// Switch geographic level and pre-pick the finer levels.
    pub fn set_level(&mut self, level: GeoLevel) {
        if self.criteria.level == level {
            return;
        }
        self.criteria.level = level;
        if let Some(ds) = &self.dataset {
            self.criteria
                .preselect_hierarchy(ds, self.config.charts.preselect);
        }
        self.refilter();
        self.request_boundaries(level);
    }

    pub fn set_year(&mut self, year: Choice<i32>) {
        self.criteria.year = year;
        self.refilter();
    }

    pub fn set_sex(&mut self, sex: Choice<String>) {
        self.criteria.sex = sex;
        self.refilter();
    }

    pub fn set_age_group(&mut self, age_group: Choice<AgeGroup>) {
        self.criteria.age_group = age_group;
        self.refilter();
    }

    /// Set the week range, keeping `lo <= hi`.
    pub fn set_weeks(&mut self, lo: u32, hi: u32) {
        self.criteria.weeks = (lo.min(hi), lo.max(hi));
        self.refilter();
    }

    /// Toggle one value of a multi-select at `level`.
    pub fn toggle_region(&mut self, level: GeoLevel, region: &str) {
        let Some(ds) = &self.dataset else {
            return;
        };
        let universe = self.region_options(ds, level);
        self.selection_mut(level).toggle(region.to_string(), &universe);
        self.refilter();
    }

    /// Values a multi-select at `level` can currently offer.
    pub fn region_options(&self, dataset: &CaseDataset, level: GeoLevel) -> BTreeSet<String> {
        match level {
            GeoLevel::Department => dataset.departments.clone(),
            GeoLevel::Province => self.criteria.province_options(dataset),
            GeoLevel::District => self.criteria.district_options(dataset),
        }
    }

    /// Clear a multi-select, which means "all".
    pub fn select_all(&mut self, level: GeoLevel) {
        *self.selection_mut(level) = Selection::All;
        self.refilter();
    }

    fn selection_mut(&mut self, level: GeoLevel) -> &mut Selection<String> {
        match level {
            GeoLevel::Department => &mut self.criteria.departments,
            GeoLevel::Province => &mut self.criteria.provinces,
            GeoLevel::District => &mut self.criteria.districts,
        }
    }

    /// Human label for the selected year.
    pub fn year_label(&self) -> String {
        match self.criteria.year {
            Choice::All => "All years".to_string(),
            Choice::Only(y) => y.to_string(),
        }
    }

    /// Start loading the boundaries of `level` on a worker thread, unless
    /// they are loaded, failed, or already on their way.
    pub fn request_boundaries(&mut self, level: GeoLevel) {
        if self.boundaries.contains_key(&level)
            || self.boundary_errors.contains_key(&level)
            || self.pending.contains_key(&level)
        {
            return;
        }

        let source = self.config.boundaries.for_level(level).clone();
        log::info!("Loading {level} boundaries from {}", source.source);

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = BoundarySet::load(&source).map_err(|e| format!("{e:#}"));
            // The receiver is gone only if the app shut down meanwhile.
            let _ = tx.send(result);
        });
        self.pending.insert(level, rx);
    }

    /// Install finished boundary loads. Returns whether any are still running.
    pub fn poll_boundaries(&mut self) -> bool {
        let mut finished = Vec::new();
        for (&level, rx) in &self.pending {
            match rx.try_recv() {
                Ok(result) => finished.push((level, result)),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    finished.push((level, Err("boundary loader stopped".to_string())))
                }
            }
        }

        for (level, result) in finished {
            self.pending.remove(&level);
            match result {
                Ok(set) => {
                    self.boundaries.insert(level, set);
                }
                Err(e) => {
                    log::warn!("No {level} boundaries: {e}");
                    self.boundary_errors.insert(level, e);
                }
            }
        }
        !self.pending.is_empty()
    }

    /// Levels whose boundaries are still loading.
    pub fn loading_levels(&self) -> impl Iterator<Item = GeoLevel> + '_ {
        self.pending.keys().copied()
    }

    pub fn boundary_status(&self, level: GeoLevel) -> BoundaryStatus<'_> {
        if let Some(set) = self.boundaries.get(&level) {
            BoundaryStatus::Ready(set)
        } else if let Some(err) = self.boundary_errors.get(&level) {
            BoundaryStatus::Failed(err)
        } else {
            BoundaryStatus::Loading
        }
    }
}
