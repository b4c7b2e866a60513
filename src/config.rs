//! Dashboard configuration.
//!
//! Settings are read from an optional TOML file (`dengue-viewer.toml` by
//! default). Every field has a default, so a missing file or a partial file
//! is fine.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::model::GeoLevel;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dengue-viewer.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Headline metric constants.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Chart settings.
    #[serde(default)]
    pub charts: ChartConfig,

    /// Synthetic indicator generator.
    #[serde(default)]
    pub synthetic: SyntheticConfig,

    /// Boundary sources for the choropleth.
    #[serde(default)]
    pub boundaries: BoundariesConfig,
}

/// Constants used by the summary metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Estimated national population, the incidence denominator.
    #[serde(default = "default_population")]
    pub population: u64,

    /// Fraction of cases reported as "estimated severe" when no prior year
    /// exists to compare against.
    #[serde(default = "default_severe_ratio")]
    pub severe_ratio: f64,

    /// Lethality placeholder shown when all years are selected, in percent.
    #[serde(default = "default_lethality_percent")]
    pub lethality_percent: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            population: default_population(),
            severe_ratio: default_severe_ratio(),
            lethality_percent: default_lethality_percent(),
        }
    }
}

fn default_population() -> u64 {
    33_000_000
}

fn default_severe_ratio() -> f64 {
    0.15
}

fn default_lethality_percent() -> f64 {
    0.04
}

/// Chart and filter-panel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Regions shown in the ranking chart.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Regions scored in the risk panel.
    #[serde(default = "default_risk_regions")]
    pub risk_regions: usize,

    /// Trailing window of the weekly moving average.
    #[serde(default = "default_moving_average_window")]
    pub moving_average_window: usize,

    /// Provinces/districts pre-selected when switching to a finer level.
    #[serde(default = "default_preselect")]
    pub preselect: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            risk_regions: default_risk_regions(),
            moving_average_window: default_moving_average_window(),
            preselect: default_preselect(),
        }
    }
}

fn default_top_n() -> usize {
    10
}

fn default_risk_regions() -> usize {
    5
}

fn default_moving_average_window() -> usize {
    3
}

fn default_preselect() -> usize {
    5
}

/// Seeds for the synthetic indicators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticConfig {
    /// Seed for the headline indicators. `None` reseeds from the clock on
    /// every start.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Seed used for every regional risk computation.
    #[serde(default = "default_risk_seed")]
    pub risk_seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: None,
            risk_seed: default_risk_seed(),
        }
    }
}

fn default_risk_seed() -> u64 {
    42
}

/// Where one level's GeoJSON comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundarySource {
    /// `http(s)://` URL or a local file path.
    pub source: String,

    /// Feature property holding the region name.
    pub name_property: String,
}

/// Boundary sources for each geographic level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundariesConfig {
    #[serde(default = "default_department_boundaries")]
    pub department: BoundarySource,

    #[serde(default = "default_province_boundaries")]
    pub province: BoundarySource,

    #[serde(default = "default_district_boundaries")]
    pub district: BoundarySource,
}

impl Default for BoundariesConfig {
    fn default() -> Self {
        Self {
            department: default_department_boundaries(),
            province: default_province_boundaries(),
            district: default_district_boundaries(),
        }
    }
}

impl BoundariesConfig {
    pub fn for_level(&self, level: GeoLevel) -> &BoundarySource {
        match level {
            GeoLevel::Department => &self.department,
            GeoLevel::Province => &self.province,
            GeoLevel::District => &self.district,
        }
    }
}

const PERU_GEOJSON_BASE: &str =
    "https://raw.githubusercontent.com/juaneladio/peru-geojson/master";

fn default_department_boundaries() -> BoundarySource {
    BoundarySource {
        source: format!("{PERU_GEOJSON_BASE}/peru_departamental_simple.geojson"),
        name_property: "NOMBDEP".to_string(),
    }
}

fn default_province_boundaries() -> BoundarySource {
    BoundarySource {
        source: format!("{PERU_GEOJSON_BASE}/peru_provincias_simple.geojson"),
        name_property: "NOMBPROV".to_string(),
    }
}

fn default_district_boundaries() -> BoundarySource {
    BoundarySource {
        source: format!("{PERU_GEOJSON_BASE}/peru_distrital_simple.geojson"),
        name_property: "NOMBDIST".to_string(),
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load an explicit config file, or the default one when it exists, or
    /// fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            log::debug!("Loading config from {}", default_path.display());
            return Self::from_file(default_path);
        }

        Ok(Self::default())
    }
}
