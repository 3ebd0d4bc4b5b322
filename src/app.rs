use eframe::egui;

use bps_dashboard::config::AppConfig;
use bps_dashboard::state::AppState;

use crate::ui::panels;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct BpsDashboardApp {
    pub state: AppState,
}

impl BpsDashboardApp {
    /// Load the configured dataset before the first frame.
    pub fn new(config: &AppConfig) -> Self {
        let mut state = AppState {
            preview_limit: config.preview_limit,
            ..AppState::default()
        };
        panels::load_into(&mut state, &config.archive_path);
        Self { state }
    }
}

impl eframe::App for BpsDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: KPIs and records ----
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| panels::central_panel(ui, &mut self.state));
        });
    }
}
