mod app;
mod color;
mod ui;

use app::BpsDashboardApp;
use bps_dashboard::config::AppConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = AppConfig::from_env();
    log::info!("Starting with dataset {}", config.archive_path.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Dashboard BPS – Banco de Preços em Saúde",
        options,
        Box::new(move |_cc| Ok(Box::new(BpsDashboardApp::new(&config)))),
    )
}
