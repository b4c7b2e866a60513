use eframe::egui::{self, Color32, Frame, ProgressBar, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use dengue_viewer::data::aggregate::RankedRegion;
use dengue_viewer::data::metrics::{SummaryMetrics, YearlyComparison};
use dengue_viewer::data::model::GeoLevel;
use dengue_viewer::synthetic::{HeadlineIndicators, RegionalRisk, OUTBREAK_FACTORS, PREDOMINANT_SEROTYPE};

use crate::color;

const ACCENT: Color32 = Color32::from_rgb(144, 202, 249);
const MUTED: Color32 = Color32::from_rgb(176, 176, 176);

/// `12345` -> `"12,345"`.
fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Title, value and caption for the year-over-year card.
fn yearly_card(yearly: &YearlyComparison) -> (&'static str, String, String) {
    match *yearly {
        YearlyComparison::Growth { percent, previous } => (
            "Change vs previous year",
            format!("{percent:+.1}%"),
            format!("{} cases the year before", thousands(previous)),
        ),
        YearlyComparison::EstimatedSevere { cases } => (
            "Severe cases",
            thousands(cases),
            "estimated, no previous-year data".to_string(),
        ),
        YearlyComparison::EstimatedLethality { percent } => {
            ("Lethality", format!("{percent:.2}%"), "estimated".to_string())
        }
    }
}

fn card(ui: &mut Ui, title: &str, value: &str, caption: &str) {
    Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.set_min_width(150.0);
        ui.label(RichText::new(title).color(MUTED));
        ui.label(RichText::new(value).size(22.0).strong().color(ACCENT));
        if !caption.is_empty() {
            ui.small(caption);
        }
    });
}

// ---------------------------------------------------------------------------
// Metric cards
// ---------------------------------------------------------------------------

/// Headline numbers computed from the filtered cases.
pub fn metric_cards(ui: &mut Ui, metrics: &SummaryMetrics, level: GeoLevel) {
    ui.horizontal_wrapped(|ui: &mut Ui| {
        card(ui, "Total cases", &thousands(metrics.total), "");

        let delta = metrics
            .most_affected
            .as_ref()
            .map(|rc| format!("{} cases", thousands(rc.count)))
            .unwrap_or_default();
        card(
            ui,
            &format!("Most affected {}", level.label().to_lowercase()),
            &metrics.most_affected_label().to_string(),
            &delta,
        );

        card(
            ui,
            "Incidence rate",
            &format!("{:.2}", metrics.incidence_rate),
            "per 100,000 inhabitants",
        );

        let (title, value, caption) = yearly_card(&metrics.yearly);
        card(ui, title, &value, &caption);

        card(
            ui,
            "Departments affected",
            &metrics.departments_affected.to_string(),
            &format!(
                "of {} ({:.1}%)",
                metrics.departments_total,
                metrics.departments_share()
            ),
        );
    });
}

/// Illustrative indicators, labelled as such.
pub fn synthetic_cards(ui: &mut Ui, headline: &HeadlineIndicators) {
    ui.horizontal_wrapped(|ui: &mut Ui| {
        card(
            ui,
            "Transmission index (R₀)",
            &format!("{:.2}", headline.transmission_index),
            "synthetic",
        );
        card(
            ui,
            "Predominant serotype",
            PREDOMINANT_SEROTYPE,
            &format!("{:.0}% of samples, synthetic", headline.serotype_share),
        );
        card(
            ui,
            "Mean hospital stay",
            &format!("{:.1} days", headline.hospital_days),
            "synthetic",
        );
    });
}

// ---------------------------------------------------------------------------
// Ranking table
// ---------------------------------------------------------------------------

/// Top regions with their count and share of the ranked total.
pub fn ranking_table(ui: &mut Ui, top: &[RankedRegion], level: GeoLevel) {
    ui.label(RichText::new(format!("Top {} {}", top.len(), level.plural().to_lowercase())).strong());
    if top.is_empty() {
        ui.label(RichText::new("No data for the current filters.").color(Color32::YELLOW));
        return;
    }

    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().at_least(120.0))
        .column(Column::auto().at_least(60.0))
        .column(Column::remainder().at_least(100.0))
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong(level.label());
            });
            header.col(|ui| {
                ui.strong("Cases");
            });
            header.col(|ui| {
                ui.strong("Share");
            });
        })
        .body(|mut body| {
            for row in top {
                body.row(20.0, |mut table_row| {
                    table_row.col(|ui| {
                        ui.label(row.region.as_str());
                    });
                    table_row.col(|ui| {
                        ui.label(thousands(row.count));
                    });
                    table_row.col(|ui| {
                        ui.add(
                            ProgressBar::new((row.share / 100.0) as f32)
                                .fill(color::WEEKLY_BARS)
                                .text(format!("{:.1}%", row.share)),
                        );
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

/// One gauge per ranked region, coloured by category.
pub fn risk_gauges(ui: &mut Ui, risk: &[RegionalRisk]) {
    ui.label(RichText::new("Regional risk index").strong().color(ACCENT));
    if risk.is_empty() {
        ui.label(RichText::new("Not enough data to compute the risk index.").color(Color32::YELLOW));
        return;
    }

    for r in risk {
        ui.horizontal(|ui: &mut Ui| {
            ui.add_sized([120.0, 18.0], egui::Label::new(r.region.as_str()).truncate());
            ui.add(
                ProgressBar::new((r.score / 100.0) as f32)
                    .desired_width(220.0)
                    .fill(color::risk_color(r.category))
                    .text(format!("{:.1}  {}", r.score, r.category.label())),
            )
            .on_hover_text(format!(
                "Case load {:.2}\nVector {:.2}\nClimate {:.2}\nInfrastructure {:.2}",
                r.base, r.vector_factor, r.climate_factor, r.infrastructure_factor
            ));
        });
    }
    ui.small("Synthetic index from case share and illustrative vector, climate and infrastructure factors.");
}

/// Legend for the outbreak-factor radar.
pub fn factor_legend(ui: &mut Ui) {
    ui.label(
        RichText::new("Relative contribution of each factor. Points further from the centre weigh more.")
            .color(MUTED),
    );
    for (name, description) in OUTBREAK_FACTORS {
        ui.horizontal(|ui: &mut Ui| {
            ui.strong(format!("{name}:"));
            ui.label(description);
        });
    }
}

// ---------------------------------------------------------------------------
// Surveillance notes
// ---------------------------------------------------------------------------

const ALERT_INDICATORS: [&str; 5] = [
    "Rising Aedes aegypti presence in urban areas",
    "Simultaneous circulation of several serotypes (DENV-1, DENV-2)",
    "Febrile syndrome consultations up more than 10%",
    "Cases detected in new geographic areas",
    "Shifts in the usual seasonal pattern",
];

const RECOMMENDATIONS: [&str; 5] = [
    "Step up entomological surveillance in high-risk areas",
    "Run breeding-site elimination campaigns",
    "Strengthen diagnostic capacity in health centres",
    "Secure supplies for managing severe cases",
    "Teach communities the warning signs",
];

pub fn surveillance_notes(ui: &mut Ui) {
    egui::CollapsingHeader::new(RichText::new("Surveillance indicators and recommendations").strong())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.columns(2, |cols| {
                cols[0].label(RichText::new("Alert indicators").color(ACCENT));
                for item in ALERT_INDICATORS {
                    cols[0].label(format!("• {item}"));
                }
                cols[1].label(RichText::new("Health recommendations").color(ACCENT));
                for item in RECOMMENDATIONS {
                    cols[1].label(format!("• {item}"));
                }
            });
        });
}
