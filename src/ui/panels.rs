use std::collections::BTreeSet;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use dengue_viewer::data::filter::{Choice, Selection};
use dengue_viewer::data::model::GeoLevel;
use dengue_viewer::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Analysis filters");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the widgets.
    let years = dataset.years.clone();
    let sexes = dataset.sexes.clone();
    let age_groups = dataset.age_groups.clone();
    let (min_week, max_week) = dataset.week_bounds.unwrap_or((1, 53));
    let departments = dataset.departments.clone();
    let provinces = state.region_options(dataset, GeoLevel::Province);
    let districts = state.region_options(dataset, GeoLevel::District);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Year ----
            ui.strong("Year");
            let year_text = state.year_label();
            egui::ComboBox::from_id_salt("year")
                .selected_text(year_text)
                .show_ui(ui, |ui: &mut Ui| {
                    if ui
                        .selectable_label(state.criteria.year.is_all(), "All years")
                        .clicked()
                    {
                        state.set_year(Choice::All);
                    }
                    for &year in &years {
                        let selected = state.criteria.year == Choice::Only(year);
                        if ui.selectable_label(selected, year.to_string()).clicked() {
                            state.set_year(Choice::Only(year));
                        }
                    }
                });
            ui.add_space(4.0);

            // ---- Geographic level ----
            ui.strong("Level of analysis");
            egui::ComboBox::from_id_salt("level")
                .selected_text(state.criteria.level.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for level in GeoLevel::ALL {
                        if ui
                            .selectable_label(state.criteria.level == level, level.label())
                            .clicked()
                        {
                            state.set_level(level);
                        }
                    }
                });
            ui.add_space(4.0);

            // ---- Week range ----
            ui.strong("Epidemiological weeks");
            let (mut lo, mut hi) = state.criteria.weeks;
            let lo_changed = ui
                .add(egui::Slider::new(&mut lo, min_week..=max_week).text("from"))
                .changed();
            let hi_changed = ui
                .add(egui::Slider::new(&mut hi, min_week..=max_week).text("to"))
                .changed();
            if lo_changed || hi_changed {
                state.set_weeks(lo, hi);
            }
            ui.add_space(4.0);

            // ---- Sex ----
            ui.strong("Sex");
            let sex_text = match &state.criteria.sex {
                Choice::All => "All".to_string(),
                Choice::Only(s) => s.clone(),
            };
            egui::ComboBox::from_id_salt("sex")
                .selected_text(sex_text)
                .show_ui(ui, |ui: &mut Ui| {
                    if ui.selectable_label(state.criteria.sex.is_all(), "All").clicked() {
                        state.set_sex(Choice::All);
                    }
                    for sex in &sexes {
                        let selected = state.criteria.sex == Choice::Only(sex.clone());
                        if ui.selectable_label(selected, sex.as_str()).clicked() {
                            state.set_sex(Choice::Only(sex.clone()));
                        }
                    }
                });
            ui.add_space(4.0);

            // ---- Age group ----
            ui.strong("Age group");
            let age_text = match &state.criteria.age_group {
                Choice::All => "All".to_string(),
                Choice::Only(g) => g.to_string(),
            };
            egui::ComboBox::from_id_salt("age_group")
                .selected_text(age_text)
                .show_ui(ui, |ui: &mut Ui| {
                    if ui
                        .selectable_label(state.criteria.age_group.is_all(), "All")
                        .clicked()
                    {
                        state.set_age_group(Choice::All);
                    }
                    for group in &age_groups {
                        let selected = state.criteria.age_group == Choice::Only(group.clone());
                        if ui.selectable_label(selected, group.label()).clicked() {
                            state.set_age_group(Choice::Only(group.clone()));
                        }
                    }
                });
            ui.separator();

            // ---- Hierarchical multi-selects ----
            region_filter(ui, state, GeoLevel::Department, &departments);
            if state.criteria.level != GeoLevel::Department {
                region_filter(ui, state, GeoLevel::Province, &provinces);
            }
            if state.criteria.level == GeoLevel::District {
                region_filter(ui, state, GeoLevel::District, &districts);
            }
        });
}

/// Collapsible checkbox list for one geographic level.
fn region_filter(ui: &mut Ui, state: &mut AppState, level: GeoLevel, options: &BTreeSet<String>) {
    let selection = match level {
        GeoLevel::Department => state.criteria.departments.clone(),
        GeoLevel::Province => state.criteria.provinces.clone(),
        GeoLevel::District => state.criteria.districts.clone(),
    };

    let n_total = options.len();
    let n_selected = match &selection {
        Selection::All => n_total,
        Selection::Subset(set) => set.len(),
    };
    let header_text = format!("{}  ({n_selected}/{n_total})", level.plural());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(level.column())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            if ui.small_button("All").clicked() {
                state.select_all(level);
            }
            for region in options {
                let mut checked = selection.contains(region);
                if ui.checkbox(&mut checked, region.as_str()).changed() {
                    state.toggle_region(level, region);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        let loading: Vec<String> = state
            .loading_levels()
            .map(|level| level.label().to_lowercase())
            .collect();
        if !loading.is_empty() {
            ui.spinner();
            ui.label(format!("Loading {} boundaries…", loading.join(", ")));
            ui.separator();
        }

        if let (Some(ds), Some(view)) = (&state.dataset, &state.view) {
            ui.label(format!(
                "{} cases loaded, {} match the filters",
                ds.len(),
                view.metrics.total
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open dengue case data")
        .add_filter("Supported files", &["csv", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}
