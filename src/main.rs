mod app;
mod color;
mod config;
mod data;
mod map;
mod state;
mod ui;

use app::MapasApp;
use config::AppConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:#}");
            std::process::exit(2);
        }
    };
    log::info!("Starting with data file {}", config.data_path.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([700.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Mapas Municipais – Brazilian municipalities",
        options,
        Box::new(|_cc| Ok(Box::new(MapasApp::new(config)))),
    )
}
