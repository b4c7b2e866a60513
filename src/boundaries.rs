//! Administrative boundaries for the choropleth.
//!
//! Loads a GeoJSON `FeatureCollection` per geographic level, keyed by a name
//! property, and joins it with the per-region case counts. Names are matched
//! with plain string equality; regions without a match stay unfilled.

use std::path::Path;

use anyhow::{bail, Context, Result};
use geo::{coord, BoundingRect, Contains, MultiPolygon, Point, Rect, TriangulateEarcut};
use geojson::GeoJson;

use crate::config::BoundarySource;
use crate::data::aggregate::{percent, GeoAggregate};

/// One named boundary.
#[derive(Debug, Clone)]
pub struct Boundary {
    pub name: String,
    pub shape: MultiPolygon<f64>,
    bounds: Option<Rect<f64>>,
    /// Fill triangles, computed once; egui only fills convex shapes.
    triangles: Vec<[[f64; 2]; 3]>,
}

impl Boundary {
    pub fn new(name: String, shape: MultiPolygon<f64>) -> Self {
        let bounds = shape.bounding_rect();
        let triangles = shape
            .0
            .iter()
            .flat_map(|poly| poly.earcut_triangles())
            .map(|tri| tri.to_array().map(|c| [c.x, c.y]))
            .collect();
        Self {
            name,
            shape,
            bounds,
            triangles,
        }
    }

    pub fn triangles(&self) -> &[[[f64; 2]; 3]] {
        &self.triangles
    }

    /// Exterior rings as `[lon, lat]` point lists, for drawing.
    pub fn rings(&self) -> impl Iterator<Item = Vec<[f64; 2]>> + '_ {
        self.shape
            .0
            .iter()
            .map(|poly| poly.exterior().coords().map(|c| [c.x, c.y]).collect())
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let inside_bounds = self.bounds.is_some_and(|r| {
            (r.min().x..=r.max().x).contains(&lon) && (r.min().y..=r.max().y).contains(&lat)
        });
        inside_bounds && self.shape.contains(&Point::new(lon, lat))
    }
}

/// A region ready to be shaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoroplethRegion<'a> {
    pub name: &'a str,
    /// `None` when the region has no matching aggregate row.
    pub count: Option<usize>,
    /// Share of the filtered total, percent.
    pub share: f64,
}

/// All boundaries of one level.
#[derive(Debug, Clone, Default)]
pub struct BoundarySet {
    pub boundaries: Vec<Boundary>,
}

impl BoundarySet {
    /// Fetch (http/https) or read (local path) the GeoJSON of `source`.
    pub fn load(source: &BoundarySource) -> Result<Self> {
        let text = if source.source.starts_with("http://") || source.source.starts_with("https://") {
            log::info!("Fetching boundaries from {}", source.source);
            reqwest::blocking::get(&source.source)
                .and_then(|resp| resp.error_for_status())
                .and_then(|resp| resp.text())
                .with_context(|| format!("fetching {}", source.source))?
        } else {
            std::fs::read_to_string(Path::new(&source.source))
                .with_context(|| format!("reading {}", source.source))?
        };

        let set = Self::parse(&text, &source.name_property)?;
        log::info!(
            "Loaded {} boundaries keyed by {}",
            set.boundaries.len(),
            source.name_property
        );
        Ok(set)
    }

    /// Parse a `FeatureCollection`, naming each feature by `name_property`.
    /// Features without that property or without a polygonal geometry are
    /// skipped.
    pub fn parse(text: &str, name_property: &str) -> Result<Self> {
        let geojson: GeoJson = text.parse().context("parsing GeoJSON")?;
        let GeoJson::FeatureCollection(collection) = geojson else {
            bail!("expected a GeoJSON FeatureCollection");
        };

        let mut boundaries = Vec::with_capacity(collection.features.len());
        for feature in collection.features {
            let Some(name) = feature
                .property(name_property)
                .and_then(|v| v.as_str())
                .map(str::to_string)
            else {
                log::warn!("Skipping feature without '{name_property}'");
                continue;
            };
            let Some(geometry) = feature.geometry else {
                log::warn!("Skipping feature {name} without geometry");
                continue;
            };
            let shape = match geo::Geometry::<f64>::try_from(geometry) {
                Ok(geo::Geometry::MultiPolygon(mp)) => mp,
                Ok(geo::Geometry::Polygon(p)) => MultiPolygon(vec![p]),
                _ => {
                    log::warn!("Skipping feature {name} with non-polygonal geometry");
                    continue;
                }
            };
            boundaries.push(Boundary::new(name, shape));
        }

        Ok(Self { boundaries })
    }

    /// Pair each boundary with its count.
    pub fn join<'a>(&'a self, aggregate: &GeoAggregate) -> Vec<ChoroplethRegion<'a>> {
        let total = aggregate.total();
        let regions: Vec<ChoroplethRegion<'a>> = self
            .boundaries
            .iter()
            .map(|b| {
                let count = aggregate.count_for(&b.name);
                ChoroplethRegion {
                    name: &b.name,
                    count,
                    share: percent(count.unwrap_or(0), total),
                }
            })
            .collect();

        let unmatched = aggregate
            .rows
            .iter()
            .filter(|row| !self.boundaries.iter().any(|b| b.name == row.region))
            .count();
        if unmatched > 0 {
            log::debug!("{unmatched} regions have no boundary and will not be drawn");
        }
        regions
    }

    /// Smallest rectangle covering every boundary.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.boundaries
            .iter()
            .filter_map(|b| b.bounds)
            .reduce(|a, b| {
                Rect::new(
                    coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                    coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
                )
            })
    }

    /// Boundary under the given coordinate.
    pub fn region_at(&self, lon: f64, lat: f64) -> Option<&Boundary> {
        self.boundaries.iter().find(|b| b.contains(lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregate::RegionCount;
    use crate::data::model::GeoLevel;

    const COLLECTION: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        {"type": "Feature", "properties": {"NOMBDEP": "LIMA"},
         "geometry": {"type": "Polygon",
           "coordinates": [[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]]]}},
        {"type": "Feature", "properties": {"NOMBDEP": "PIURA"},
         "geometry": {"type": "MultiPolygon",
           "coordinates": [[[[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 5.0]]]]}},
        {"type": "Feature", "properties": {"OTHER": "X"},
         "geometry": {"type": "Point", "coordinates": [1.0, 1.0]}}
      ]
    }"#;

    #[test]
    fn parses_polygons_and_skips_unnamed() {
        let set = BoundarySet::parse(COLLECTION, "NOMBDEP").unwrap();
        let names: Vec<&str> = set.boundaries.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["LIMA", "PIURA"]);
        assert_eq!(set.boundaries[0].rings().count(), 1);
        // A square splits into two triangles.
        assert_eq!(set.boundaries[0].triangles().len(), 2);
    }

    #[test]
    fn rejects_non_collections() {
        let err = BoundarySet::parse(r#"{"type": "Point", "coordinates": [0, 0]}"#, "NOMBDEP");
        assert!(err.is_err());
    }

    #[test]
    fn join_matches_names_exactly() {
        let set = BoundarySet::parse(COLLECTION, "NOMBDEP").unwrap();
        let aggregate = GeoAggregate {
            level: GeoLevel::Department,
            rows: vec![
                RegionCount {
                    region: "LIMA".into(),
                    count: 3,
                },
                RegionCount {
                    region: "Piura".into(),
                    count: 1,
                },
            ],
        };
        let joined = set.join(&aggregate);
        assert_eq!(joined[0].count, Some(3));
        assert!((joined[0].share - 75.0).abs() < 1e-9);
        assert_eq!(joined[1].count, None);
        assert_eq!(joined[1].share, 0.0);
    }

    #[test]
    fn finds_region_under_point() {
        let set = BoundarySet::parse(COLLECTION, "NOMBDEP").unwrap();
        assert_eq!(set.region_at(1.0, 1.0).map(|b| b.name.as_str()), Some("LIMA"));
        assert!(set.region_at(3.0, 3.0).is_none());
    }

    #[test]
    fn bounds_cover_every_boundary() {
        let set = BoundarySet::parse(COLLECTION, "NOMBDEP").unwrap();
        let bounds = set.bounds().unwrap();
        assert_eq!((bounds.min().x, bounds.min().y), (0.0, 0.0));
        assert_eq!((bounds.max().x, bounds.max().y), (6.0, 6.0));
        assert!(BoundarySet::default().bounds().is_none());
    }
}
