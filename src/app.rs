use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::ui::table::Rows;
use crate::ui::{map, panels, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct MapasApp {
    pub state: AppState,
}

impl MapasApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for MapasApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: map type, filters, customisation ----
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: map and tables ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    let state = &self.state;
                    map::map_area(ui, state);
                    ui.add_space(8.0);
                    table::data_table(
                        ui,
                        "Filtered data",
                        &state.dataset,
                        Rows::Subset(&state.view.indices),
                    );
                    table::data_table(ui, "Raw data", &state.dataset, Rows::All);
                    ui.add_space(8.0);
                    ui.label(
                        RichText::new(format!("Source: {}", state.data_path.display()))
                            .small()
                            .weak(),
                    );
                });
        });
    }
}
