mod app;
mod cli;
mod color;
mod ui;

use app::DengueViewerApp;
use clap::Parser;
use cli::Args;
use dengue_viewer::config::Config;
use dengue_viewer::state::AppState;
use eframe::egui;

fn main() -> eframe::Result {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration, using defaults: {e:#}");
            Config::default()
        }
    };
    if let Some(seed) = args.seed {
        config.synthetic.seed = Some(seed);
    }

    let mut state = AppState::new(config);
    state.load_path(&args.data);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Dengue Viewer – Peru",
        options,
        Box::new(|_cc| Ok(Box::new(DengueViewerApp::new(state)))),
    )
}
