use eframe::egui::{self, Color32, RichText, Stroke, Ui};
use egui_plot::{MarkerShape, Plot, PlotBounds, PlotPoints, Points, Polygon};

use crate::color::heat_color;
use crate::data::model::MunicipalRecord;
use crate::map::projection::{GeoPoint, nearest_record, project, view_bounds};
use crate::map::{Layer, MapChart, MapOutcome};
use crate::state::AppState;

/// Hover pick radius in screen pixels.
const PICK_RADIUS_PX: f64 = 8.0;

/// Density cells fainter than this are not drawn.
const MIN_VISIBLE_DENSITY: f64 = 0.02;

/// Temp-data key holding the revision whose view was last applied.
const APPLIED_REVISION_KEY: &str = "municipal_map_applied_revision";

// ---------------------------------------------------------------------------
// Map area (central panel)
// ---------------------------------------------------------------------------

/// Render the subheader, description and the chart or its replacement message.
pub fn map_area(ui: &mut Ui, state: &AppState) {
    ui.heading(state.map_kind.title());
    ui.label(state.map_kind.description());
    ui.add_space(4.0);

    match &state.outcome {
        MapOutcome::Chart(chart) => map_plot(ui, state, chart),
        MapOutcome::Info(msg) => {
            message(ui, "ℹ", msg, Color32::from_rgb(0x1c, 0x83, 0xe1));
        }
        MapOutcome::Warning(msg) => {
            message(ui, "⚠", msg, Color32::from_rgb(0xff, 0xbd, 0x45));
        }
    }
}

fn message(ui: &mut Ui, icon: &str, text: &str, accent: Color32) {
    egui::Frame::group(ui.style())
        .fill(accent.gamma_multiply(0.15))
        .stroke(Stroke::new(1.0, accent))
        .show(ui, |ui: &mut Ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new(format!("{icon}  {text}")).color(ui.visuals().text_color()));
        });
}

fn map_plot(ui: &mut Ui, state: &AppState, chart: &MapChart) {
    let dataset = &state.dataset;
    let height = chart.height as f32;
    let width = ui.available_width().max(1.0);
    let bounds = initial_bounds(chart, width as f64);

    // The chart's view is applied once per refresh; afterwards the user pans freely.
    let applied_id = egui::Id::new(APPLIED_REVISION_KEY);
    let applied = ui.ctx().data(|d| d.get_temp::<u64>(applied_id));
    let reset = needs_reset(applied, state.revision);
    if reset {
        ui.ctx().data_mut(|d| d.insert_temp(applied_id, state.revision));
    }

    let plot = Plot::new(("municipal_map", state.revision))
        .height(height)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .show_background(false)
        .show_x(false)
        .show_y(false)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);

    let response = egui::Frame::NONE
        .fill(chart.style.background())
        .show(ui, |ui: &mut Ui| {
            plot.show(ui, |plot_ui| {
                if reset {
                    plot_ui.set_plot_bounds(bounds);
                }
                match &chart.layer {
                    Layer::Markers(groups) => {
                        for group in groups {
                            let points = Points::new(PlotPoints::from(group.points.clone()))
                                .name(&group.label)
                                .color(group.color)
                                .radius(group.radius)
                                .shape(MarkerShape::Circle)
                                .filled(true);
                            plot_ui.points(points);
                        }
                    }
                    Layer::Density(grid) => {
                        let s = grid.cell_size;
                        for cell in grid.cells.iter().filter(|c| c.intensity >= MIN_VISIBLE_DENSITY) {
                            let [x, y] = cell.min;
                            let square = vec![[x, y], [x + s, y], [x + s, y + s], [x, y + s]];
                            plot_ui.polygon(
                                Polygon::new(PlotPoints::from(square))
                                    .fill_color(heat_color(cell.intensity))
                                    .stroke(Stroke::NONE),
                            );
                        }
                    }
                }

                // Municipality under the pointer, if any.
                let pointer = plot_ui.pointer_coordinate()?;
                let transform = plot_ui.transform();
                let units_per_px = transform.bounds().width() / transform.frame().width() as f64;
                let index = nearest_record(
                    dataset,
                    &state.view,
                    [pointer.x, pointer.y],
                    PICK_RADIUS_PX * units_per_px,
                )?;
                let record = dataset.record(index)?;
                plot_ui.points(
                    Points::new(PlotPoints::from(vec![project(GeoPoint::of(record))]))
                        .radius(6.0)
                        .shape(MarkerShape::Circle)
                        .filled(false)
                        .color(chart.style.foreground()),
                );
                Some(index)
            })
        })
        .inner;

    if let Some(record) = response.inner.and_then(|i| dataset.record(i)) {
        response.response.on_hover_text_at_pointer(hover_text(record));
    }
}

/// Plot-space rectangle showing `chart` in a frame `width` pixels wide.
fn initial_bounds(chart: &MapChart, width: f64) -> PlotBounds {
    let view = view_bounds(chart.center, chart.zoom, width, chart.height as f64);
    PlotBounds::from_min_max(view.min, view.max)
}

fn needs_reset(applied: Option<u64>, revision: u64) -> bool {
    applied != Some(revision)
}

/// Tooltip for one municipality.
pub fn hover_text(record: &MunicipalRecord) -> String {
    format!(
        "{}\nState: {}\nUF: {}\nRegion: {}\nPopulation (2021): {}",
        record.municipio,
        record.estado,
        record.uf,
        record.regiao,
        group_thousands(record.pop_21)
    )
}

/// `12396372` → `12,396,372`.
pub fn group_thousands(n: u64) -> String {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;
    use crate::map::projection::BRAZIL_CENTER;
    use crate::map::{BaseStyle, MarkerGroup};

    fn chart_at(zoom: f64) -> MapChart {
        MapChart {
            style: BaseStyle::default(),
            center: BRAZIL_CENTER,
            zoom,
            height: 600,
            layer: Layer::Markers(vec![MarkerGroup {
                label: "municipalities".to_string(),
                color: Color32::RED,
                radius: 3.0,
                points: vec![project(BRAZIL_CENTER)],
            }]),
        }
    }

    #[test]
    fn bounds_are_centred_on_the_chart() {
        let chart = chart_at(3.0);
        let bounds = initial_bounds(&chart, 900.0);
        let [cx, cy] = project(chart.center);
        let (min, max) = (bounds.min(), bounds.max());
        assert!(((min[0] + max[0]) / 2.0 - cx).abs() < 1e-9);
        assert!(((min[1] + max[1]) / 2.0 - cy).abs() < 1e-9);
        // Square pixels: the aspect follows the frame.
        assert!((bounds.width() / bounds.height() - 900.0 / 600.0).abs() < 1e-9);
    }

    #[test]
    fn deeper_zoom_narrows_bounds() {
        let wide = initial_bounds(&chart_at(3.0), 900.0);
        let close = initial_bounds(&chart_at(5.0), 900.0);
        assert!((wide.width() / close.width() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn view_resets_once_per_revision() {
        assert!(needs_reset(None, 0));
        assert!(needs_reset(Some(3), 4));
        assert!(!needs_reset(Some(4), 4));
    }

    #[test]
    fn thousands_are_grouped() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(12_396_372), "12,396,372");
    }

    #[test]
    fn hover_lists_every_attribute() {
        let text = hover_text(&record("Manaus", "Amazonas", "Norte", "AM", 2_255_903));
        assert!(text.starts_with("Manaus\n"));
        for part in ["Amazonas", "AM", "Norte", "2,255,903"] {
            assert!(text.contains(part), "{text}");
        }
    }
}
