use eframe::egui;

use crate::state::AppState;
use crate::ui::{media, panels, plot, sessions};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RhymeViewerApp {
    pub state: AppState,
}

impl RhymeViewerApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for RhymeViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: selection controls ----
        egui::SidePanel::left("selection_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Right side panel: video ----
        egui::SidePanel::right("media_panel")
            .default_width(320.0)
            .resizable(true)
            .show(ctx, |ui| {
                media::media_panel(ui, &self.state);
            });

        // ---- Bottom panel: session overview ----
        if self.state.show_sessions {
            egui::TopBottomPanel::bottom("session_panel")
                .resizable(true)
                .default_height(180.0)
                .show(ctx, |ui| {
                    sessions::session_table(ui, &mut self.state);
                });
        }

        // ---- Central panel: time series ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::signal_plots(ui, &self.state);
        });
    }
}
