use std::f64::consts::TAU;

use eframe::egui::{self, Align2, Color32, Mesh, Pos2, RichText, Sense, Shape, Stroke, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoint, PlotPoints, Polygon, Text};

use dengue_viewer::boundaries::BoundarySet;
use dengue_viewer::data::aggregate::{CategoryShare, GeoAggregate, WeeklyAggregate};
use dengue_viewer::data::model::AgeGroup;

use crate::color::{self, ColorScale};

fn no_data(ui: &mut Ui, message: &str) {
    ui.label(RichText::new(message).color(Color32::YELLOW));
}

// ---------------------------------------------------------------------------
// Choropleth
// ---------------------------------------------------------------------------

/// Equirectangular lon/lat to screen transform with a uniform scale.
#[derive(Debug, Clone, Copy, PartialEq)]
struct MapProjection {
    min_lon: f64,
    max_lat: f64,
    /// Points per degree.
    scale: f64,
    origin: Pos2,
}

impl MapProjection {
    /// Largest scale that fits `bounds` inside `screen`, centred.
    fn fit(bounds: geo::Rect<f64>, screen: egui::Rect) -> Self {
        let (width, height) = (bounds.width().max(1e-9), bounds.height().max(1e-9));
        let (screen_w, screen_h) = (screen.width() as f64, screen.height() as f64);
        let scale = (screen_w / width).min(screen_h / height);
        let origin = Pos2::new(
            screen.min.x + ((screen_w - width * scale) / 2.0) as f32,
            screen.min.y + ((screen_h - height * scale) / 2.0) as f32,
        );
        Self {
            min_lon: bounds.min().x,
            max_lat: bounds.max().y,
            scale,
            origin,
        }
    }

    fn to_screen(&self, lon: f64, lat: f64) -> Pos2 {
        Pos2::new(
            self.origin.x + ((lon - self.min_lon) * self.scale) as f32,
            self.origin.y + ((self.max_lat - lat) * self.scale) as f32,
        )
    }

    fn to_geo(&self, pos: Pos2) -> (f64, f64) {
        (
            self.min_lon + (pos.x - self.origin.x) as f64 / self.scale,
            self.max_lat - (pos.y - self.origin.y) as f64 / self.scale,
        )
    }
}

/// Shade each boundary by its case count. Hovering shows name, count and
/// share of the filtered total.
pub fn choropleth(ui: &mut Ui, boundaries: &BoundarySet, aggregate: &GeoAggregate) {
    let Some(bounds) = boundaries.bounds() else {
        no_data(ui, "No boundaries to draw.");
        return;
    };
    let regions = boundaries.join(aggregate);
    let max = regions.iter().filter_map(|r| r.count).max().unwrap_or(0);
    let scale = ColorScale::yl_or_rd();

    let (response, painter) =
        ui.allocate_painter(egui::vec2(ui.available_width(), 450.0), Sense::hover());
    let projection = MapProjection::fit(bounds, response.rect.shrink(8.0));

    // One mesh for every fill triangle in the frame.
    let mut mesh = Mesh::default();
    let mut outlines = Vec::new();
    for (boundary, region) in boundaries.boundaries.iter().zip(&regions) {
        let fill = region
            .count
            .map_or(color::NO_DATA, |c| scale.for_value(c, max));

        for tri in boundary.triangles() {
            let base = mesh.vertices.len() as u32;
            for &[lon, lat] in tri {
                mesh.colored_vertex(projection.to_screen(lon, lat), fill);
            }
            mesh.add_triangle(base, base + 1, base + 2);
        }
        for ring in boundary.rings() {
            let points: Vec<Pos2> = ring
                .into_iter()
                .map(|[lon, lat]| projection.to_screen(lon, lat))
                .collect();
            outlines.push(Shape::line(points, Stroke::new(0.5, Color32::from_gray(40))));
        }
    }
    painter.add(Shape::mesh(mesh));
    painter.extend(outlines);

    let hovered = response
        .hover_pos()
        .map(|pos| projection.to_geo(pos))
        .and_then(|(lon, lat)| boundaries.region_at(lon, lat))
        .and_then(|b| regions.iter().find(|r| r.name == b.name));

    if let Some(region) = hovered {
        let text = match region.count {
            Some(c) => format!("{}\nTotal cases: {c}\n{:.1}% of total", region.name, region.share),
            None => format!("{}\nNo cases", region.name),
        };
        response.on_hover_text(text);
    }
}

// ---------------------------------------------------------------------------
// Weekly trend
// ---------------------------------------------------------------------------

/// Weekly case bars with the moving-average line and a peak marker.
pub fn weekly_trend(ui: &mut Ui, weekly: &WeeklyAggregate, window: usize, year_label: &str) {
    if weekly.is_empty() {
        no_data(ui, "Not enough data to show the weekly trend.");
        return;
    }

    ui.label(format!("Weekly dengue cases, {year_label}"));

    let bars: Vec<Bar> = weekly
        .rows
        .iter()
        .map(|w| {
            Bar::new(w.week as f64, w.count as f64)
                .name(format!("Week {}", w.week))
                .fill(color::WEEKLY_BARS.gamma_multiply(0.7))
        })
        .collect();

    let trend: PlotPoints = weekly
        .rows
        .iter()
        .map(|w| [w.week as f64, w.moving_average])
        .collect();

    Plot::new("weekly_trend")
        .legend(Legend::default())
        .x_axis_label("Epidemiological week")
        .y_axis_label("Cases")
        .height(320.0)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Weekly cases").width(0.8));
            plot_ui.line(
                Line::new(trend)
                    .name(format!("Moving average ({window} weeks)"))
                    .color(color::TREND_LINE)
                    .width(3.0),
            );

            if weekly.rows.len() > 3 {
                if let Some(peak) = weekly.peak() {
                    plot_ui.text(
                        Text::new(
                            PlotPoint::new(peak.week as f64, peak.count as f64),
                            RichText::new(format!("Peak: {} cases", peak.count))
                                .color(color::WEEKLY_BARS),
                        )
                        .anchor(Align2::CENTER_BOTTOM),
                    );
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Demographics
// ---------------------------------------------------------------------------

/// Donut chart of cases by sex.
pub fn sex_donut(ui: &mut Ui, sexes: &[CategoryShare<String>]) {
    if sexes.is_empty() {
        no_data(ui, "No cases to break down by sex.");
        return;
    }

    let palette = color::warm_palette(sexes.len());
    let total: usize = sexes.iter().map(|s| s.count).sum();

    Plot::new("sex_donut")
        .legend(Legend::default())
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .height(280.0)
        .show(ui, |plot_ui| {
            let mut start = 0.0;
            for (slice, fill) in sexes.iter().zip(palette) {
                let sweep = slice.count as f64 / total as f64 * TAU;
                let name = format!("{} ({:.1}%)", slice.key, slice.share);
                for segment in donut_segments(start, sweep, 0.4, 1.0) {
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(segment))
                            .fill_color(fill)
                            .stroke(Stroke::NONE)
                            .name(&name),
                    );
                }
                start += sweep;
            }
        });
}

/// Split an annular sector into convex quads no wider than ~3 degrees.
fn donut_segments(start: f64, sweep: f64, inner: f64, outer: f64) -> Vec<Vec<[f64; 2]>> {
    let steps = ((sweep / TAU * 120.0).ceil() as usize).max(1);
    let step = sweep / steps as f64;
    (0..steps)
        .map(|i| {
            let a0 = start + step * i as f64;
            let a1 = a0 + step;
            vec![
                [inner * a0.cos(), inner * a0.sin()],
                [outer * a0.cos(), outer * a0.sin()],
                [outer * a1.cos(), outer * a1.sin()],
                [inner * a1.cos(), inner * a1.sin()],
            ]
        })
        .collect()
}

/// Horizontal bars of cases by age group, youngest at the top.
pub fn age_bars(ui: &mut Ui, ages: &[CategoryShare<AgeGroup>]) {
    if ages.is_empty() {
        no_data(ui, "No cases to break down by age group.");
        return;
    }

    let max = ages.iter().map(|a| a.count).max().unwrap_or(0);
    let scale = ColorScale::reds();
    let n = ages.len();

    let bars: Vec<Bar> = ages
        .iter()
        .enumerate()
        .map(|(i, a)| {
            Bar::new((n - 1 - i) as f64, a.count as f64)
                .name(format!("{} ({:.1}%)", a.key, a.share))
                .fill(scale.for_value(a.count, max))
        })
        .collect();

    Plot::new("age_bars")
        .show_axes([true, false])
        .allow_scroll(false)
        .height(280.0)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal().width(0.7));
            for (i, a) in ages.iter().enumerate() {
                plot_ui.text(
                    Text::new(
                        PlotPoint::new(0.0, (n - 1 - i) as f64),
                        format!(" {}  {:.1}%", a.key, a.share),
                    )
                    .anchor(Align2::LEFT_CENTER)
                    .color(Color32::WHITE),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Outbreak factors
// ---------------------------------------------------------------------------

/// Radar of the synthetic outbreak factors on a 0..1 radius.
pub fn factor_radar(ui: &mut Ui, factors: &[(&'static str, f64)]) {
    if factors.is_empty() {
        return;
    }

    let n = factors.len();
    let angle = |i: usize| TAU * i as f64 / n as f64 + TAU / 4.0;

    let mut outline: Vec<[f64; 2]> = factors
        .iter()
        .enumerate()
        .map(|(i, &(_, v))| [v * angle(i).cos(), v * angle(i).sin()])
        .collect();
    if let Some(&first) = outline.first() {
        outline.push(first);
    }

    Plot::new("factor_radar")
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .include_x(-1.4)
        .include_x(1.4)
        .include_y(-1.2)
        .include_y(1.2)
        .height(300.0)
        .show(ui, |plot_ui| {
            for (i, &(name, _)) in factors.iter().enumerate() {
                let (x, y) = (angle(i).cos(), angle(i).sin());
                plot_ui.line(
                    Line::new(PlotPoints::from(vec![[0.0, 0.0], [x, y]]))
                        .color(Color32::from_gray(80))
                        .width(1.0),
                );
                plot_ui.text(Text::new(PlotPoint::new(x * 1.1, y * 1.1), name).color(Color32::LIGHT_GRAY));
            }
            plot_ui.line(
                Line::new(PlotPoints::from(outline))
                    .color(color::WEEKLY_BARS)
                    .width(2.5),
            );
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn donut_segments_cover_the_sweep() {
        let segments = donut_segments(0.0, TAU / 2.0, 0.4, 1.0);
        assert_eq!(segments.len(), 60);
        let last = segments.last().unwrap();
        assert!((last[2][0] - -1.0).abs() < 1e-9);
        assert!(last[2][1].abs() < 1e-9);
    }

    fn square_map() -> MapProjection {
        let bounds = geo::Rect::new(
            geo::coord! { x: -80.0, y: -10.0 },
            geo::coord! { x: -70.0, y: 0.0 },
        );
        let screen = egui::Rect::from_min_size(Pos2::new(0.0, 0.0), egui::vec2(200.0, 100.0));
        MapProjection::fit(bounds, screen)
    }

    #[test]
    fn projection_keeps_aspect_and_centres() {
        let map = square_map();
        // Height limits the scale, so the map is centred horizontally.
        assert!((map.scale - 10.0).abs() < 1e-9);
        assert_eq!(map.to_screen(-80.0, 0.0), Pos2::new(50.0, 0.0));
        assert_eq!(map.to_screen(-70.0, -10.0), Pos2::new(150.0, 100.0));
    }

    #[test]
    fn projection_inverts() {
        let map = square_map();
        let (lon, lat) = map.to_geo(map.to_screen(-75.5, -3.25));
        assert!((lon - -75.5).abs() < 1e-4);
        assert!((lat - -3.25).abs() < 1e-4);
    }
}
