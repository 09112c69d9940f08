use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::map::{BaseStyle, HEIGHT_RANGE, MARKER_SIZE_RANGE, MapKind, ZOOM_RANGE};
use crate::state::AppState;

const ALL_STATES: &str = "All states";

// ---------------------------------------------------------------------------
// Left side panel – map selector, filters and customisation
// ---------------------------------------------------------------------------

/// Render the left sidebar. Any widget change re-runs the pipeline once.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("🗺 Municipal maps");
    ui.label("Customise the map with the options below.");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            let mut changed = false;

            ui.strong("Map type");
            let mut kind = state.map_kind;
            egui::ComboBox::from_id_salt("map_kind")
                .selected_text(kind.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for k in MapKind::ALL {
                        ui.selectable_value(&mut kind, k, k.label());
                    }
                });
            if kind != state.map_kind {
                state.set_map_kind(kind);
            }

            ui.add_space(6.0);
            ui.strong("Geographic filters");
            if state.map_kind.is_customisable() {
                changed |= state_checkbox_and_combo(ui, state);
            } else {
                changed |= state_combo_with_all(ui, state);
            }

            changed |= multiselect(
                ui,
                "Filter by region",
                "regions",
                &mut state.filter_by_region,
                &mut state.chosen_regions,
                &state.view.region_options,
            );
            changed |= multiselect(
                ui,
                "Filter by federative unit (UF)",
                "ufs",
                &mut state.filter_by_uf,
                &mut state.chosen_ufs,
                &state.view.uf_options,
            );

            if state.map_kind.is_customisable() {
                ui.separator();
                changed |= customisation(ui, state);
            }

            if changed {
                state.refresh();
            }
        });
}

fn state_checkbox_and_combo(ui: &mut Ui, state: &mut AppState) -> bool {
    let mut enabled = state.filter_by_state;
    if ui.checkbox(&mut enabled, "Filter by state").changed() {
        state.set_filter_by_state(enabled);
    }
    if !state.filter_by_state {
        return false;
    }

    let mut changed = false;
    let current = state.chosen_state.clone().unwrap_or_default();
    egui::ComboBox::from_id_salt("state")
        .selected_text(&current)
        .show_ui(ui, |ui: &mut Ui| {
            for name in &state.view.state_options {
                if ui.selectable_label(current == *name, name).clicked() && current != *name {
                    state.chosen_state = Some(name.clone());
                    changed = true;
                }
            }
        });
    changed
}

fn state_combo_with_all(ui: &mut Ui, state: &mut AppState) -> bool {
    let mut changed = false;
    let current = state.chosen_state.clone();
    egui::ComboBox::from_id_salt("state_native")
        .selected_text(current.as_deref().unwrap_or(ALL_STATES))
        .show_ui(ui, |ui: &mut Ui| {
            if ui.selectable_label(current.is_none(), ALL_STATES).clicked() && current.is_some() {
                state.chosen_state = None;
                changed = true;
            }
            for name in &state.view.state_options {
                let selected = current.as_deref() == Some(name.as_str());
                if ui.selectable_label(selected, name).clicked() && !selected {
                    state.chosen_state = Some(name.clone());
                    changed = true;
                }
            }
        });
    changed
}

/// Checkbox enabling a stage plus one checkbox per offered value.
fn multiselect(
    ui: &mut Ui,
    label: &str,
    id: &str,
    enabled: &mut bool,
    chosen: &mut std::collections::BTreeSet<String>,
    options: &[String],
) -> bool {
    let mut changed = ui.checkbox(enabled, label).changed();
    if !*enabled {
        return changed;
    }

    let header = format!("{} of {} selected", chosen.len(), options.len());
    egui::CollapsingHeader::new(RichText::new(header).small())
        .id_salt(id)
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    chosen.extend(options.iter().cloned());
                    changed = true;
                }
                if ui.small_button("None").clicked() {
                    chosen.clear();
                    changed = true;
                }
            });
            for value in options {
                let mut checked = chosen.contains(value);
                if ui.checkbox(&mut checked, value).changed() {
                    AppState::toggle(chosen, value);
                    changed = true;
                }
            }
        });
    changed
}

fn customisation(ui: &mut Ui, state: &mut AppState) -> bool {
    let mut changed = false;
    let render = &mut state.render;
    ui.strong("Map customisation");

    egui::ComboBox::from_id_salt("base_style")
        .selected_text(render.style.name())
        .show_ui(ui, |ui: &mut Ui| {
            for style in BaseStyle::ALL {
                changed |= ui
                    .selectable_value(&mut render.style, style, style.name())
                    .changed();
            }
        });

    changed |= ui
        .add(egui::Slider::new(&mut render.zoom, ZOOM_RANGE).text("Initial zoom"))
        .changed();
    changed |= ui
        .add(egui::Slider::new(&mut render.height, HEIGHT_RANGE).text("Map height (px)"))
        .changed();

    match state.map_kind {
        MapKind::Markers => {
            changed |= ui
                .checkbox(&mut render.color_by_uf, "Colour municipalities by UF")
                .changed();
        }
        MapKind::PopulationSize => {
            changed |= ui
                .checkbox(&mut render.size_by_population, "Size markers by population")
                .changed();
            changed |= ui
                .add(
                    egui::Slider::new(&mut render.max_marker_size, MARKER_SIZE_RANGE)
                        .text("Max marker size"),
                )
                .changed();
        }
        _ => {}
    }
    changed
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
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} municipalities loaded, {} visible",
            state.dataset.len(),
            state.view.len()
        ));

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
        .set_title("Open municipal data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}
