use std::time::Duration;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use dengue_viewer::data::filter::Choice;
use dengue_viewer::state::{AppState, BoundaryStatus};

use crate::ui::{cards, panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DengueViewerApp {
    pub state: AppState,
}

impl DengueViewerApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for DengueViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.state.poll_boundaries() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: dashboard ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| dashboard(ui, &self.state));
        });
    }
}

fn section(ui: &mut Ui, title: &str) {
    ui.add_space(12.0);
    ui.heading(RichText::new(title).color(Color32::from_rgb(144, 202, 249)));
    ui.separator();
}

fn dashboard(ui: &mut Ui, state: &AppState) {
    ui.heading("Dengue heat map of Peru");
    ui.label("Epidemiological analysis by department, province and district");

    let Some(view) = &state.view else {
        ui.add_space(20.0);
        ui.label(
            RichText::new("No dataset loaded. Use File → Open… to load a case file.")
                .color(Color32::YELLOW),
        );
        return;
    };
    let level = state.criteria.level;

    section(ui, "Key indicators");
    cards::metric_cards(ui, &view.metrics, level);
    ui.add_space(6.0);
    cards::synthetic_cards(ui, &view.headline);

    section(ui, &format!("Cases by {}", level.label().to_lowercase()));
    ui.columns(2, |cols| {
        match state.boundary_status(level) {
            BoundaryStatus::Ready(set) => plot::choropleth(&mut cols[0], set, &view.geo),
            BoundaryStatus::Failed(err) => {
                cols[0].label(
                    RichText::new(format!("Map unavailable: {err}")).color(Color32::YELLOW),
                );
            }
            BoundaryStatus::Loading => {
                cols[0].horizontal(|ui: &mut Ui| {
                    ui.spinner();
                    ui.label(format!("Loading {} boundaries…", level.label().to_lowercase()));
                });
            }
        }
        cards::ranking_table(&mut cols[1], &view.top, level);
    });

    section(ui, "Weekly evolution");
    plot::weekly_trend(
        ui,
        &view.weekly,
        state.config.charts.moving_average_window,
        &state.year_label(),
    );

    section(ui, "Demographics");
    ui.columns(2, |cols| {
        cols[0].label("Cases by sex");
        if matches!(state.criteria.sex, Choice::All) {
            plot::sex_donut(&mut cols[0], &view.sexes);
        } else {
            cols[0].label("Select \"All\" in the sex filter to see the breakdown.");
        }

        cols[1].label("Cases by age group");
        if matches!(state.criteria.age_group, Choice::All) {
            plot::age_bars(&mut cols[1], &view.ages);
        } else {
            cols[1].label("Select \"All\" in the age filter to see the breakdown.");
        }
    });

    section(ui, "Epidemiological pattern and risk factors");
    ui.columns(2, |cols| {
        cards::risk_gauges(&mut cols[0], &view.risk);
        cols[1].label(RichText::new("Factors associated with the outbreak").strong());
        plot::factor_radar(&mut cols[1], &view.factors);
        cards::factor_legend(&mut cols[1]);
    });

    ui.add_space(12.0);
    cards::surveillance_notes(ui);
}
