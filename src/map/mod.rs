/// Map rendering dispatch.
///
/// ```text
///   FilteredView + MapKind + RenderOptions
///        │
///        ▼
///   ┌──────────┐
///   │ dispatch  │  exactly one rendering path
///   └──────────┘
///        │
///        ▼
///   MapOutcome::{Chart, Info, Warning}
/// ```
///
/// Everything here is plain data; `ui::map` turns a [`MapChart`] into plot
/// items.

pub mod density;
pub mod projection;

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use eframe::egui::Color32;

use crate::color::{self, ColorMap};
use crate::data::filter::FilteredView;
use crate::data::model::MunicipalDataset;
use density::{DensityGrid, density_grid};
use projection::{BRAZIL_CENTER, GeoPoint, degrees_per_pixel, extent, fit_zoom, mean_center, project};

pub const ZOOM_RANGE: RangeInclusive<u8> = 1..=15;
pub const HEIGHT_RANGE: RangeInclusive<u32> = 400..=1000;
pub const MARKER_SIZE_RANGE: RangeInclusive<u32> = 5..=50;

/// The plain point map always uses this height.
pub const NATIVE_HEIGHT: u32 = 700;

/// Viewport width assumed when fitting the point map to its data.
const NATIVE_FIT_WIDTH: f64 = 900.0;

/// Density kernel radius in screen pixels at the initial zoom.
const HEATMAP_RADIUS_PX: f64 = 10.0;

/// Marker radius (px) of unscaled scatter markers.
const MARKER_RADIUS: f32 = 3.0;

const NATIVE_RADIUS: f32 = 2.5;

// ---------------------------------------------------------------------------
// Enumerated options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MapKind {
    /// Plain points, no customisation.
    #[default]
    Native,
    /// Scatter markers, optionally coloured by UF.
    Markers,
    /// Density heatmap of municipalities.
    Heatmap,
    /// Markers sized by 2021 population.
    PopulationSize,
}

impl MapKind {
    pub const ALL: [MapKind; 4] = [
        MapKind::Native,
        MapKind::Markers,
        MapKind::Heatmap,
        MapKind::PopulationSize,
    ];

    /// Label in the map selector.
    pub fn label(self) -> &'static str {
        match self {
            MapKind::Native => "Native points",
            MapKind::Markers => "Markers",
            MapKind::Heatmap => "Heatmap",
            MapKind::PopulationSize => "Population size",
        }
    }

    pub fn title(self) -> String {
        format!("Map: {}", self.label())
    }

    pub fn description(self) -> &'static str {
        match self {
            MapKind::Native => "Basic interactive map showing each municipality as a point.",
            MapKind::Markers => {
                "Each marker is a municipality. Hover over a marker for details."
            }
            MapKind::Heatmap => {
                "Density of municipalities. Brighter colours mean a higher concentration."
            }
            MapKind::PopulationSize => {
                "Marker area is proportional to the municipality's 2021 population."
            }
        }
    }

    /// Whether the customisation options (style, zoom, height, ...) apply.
    pub fn is_customisable(self) -> bool {
        self != MapKind::Native
    }
}

/// Base map style. The names match the tile provider identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BaseStyle {
    #[default]
    OpenStreetMap,
    CartoPositron,
    CartoDarkmatter,
}

impl BaseStyle {
    pub const ALL: [BaseStyle; 3] = [
        BaseStyle::OpenStreetMap,
        BaseStyle::CartoPositron,
        BaseStyle::CartoDarkmatter,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BaseStyle::OpenStreetMap => "open-street-map",
            BaseStyle::CartoPositron => "carto-positron",
            BaseStyle::CartoDarkmatter => "carto-darkmatter",
        }
    }

    pub fn background(self) -> Color32 {
        match self {
            BaseStyle::OpenStreetMap => Color32::from_rgb(0xaa, 0xd3, 0xdf),
            BaseStyle::CartoPositron => Color32::from_rgb(0xfa, 0xfa, 0xf8),
            BaseStyle::CartoDarkmatter => Color32::from_rgb(0x26, 0x26, 0x26),
        }
    }

    /// Colour for text and outlines drawn over the background.
    pub fn foreground(self) -> Color32 {
        match self {
            BaseStyle::CartoDarkmatter => Color32::from_gray(0xdd),
            _ => Color32::from_gray(0x33),
        }
    }
}

impl fmt::Display for BaseStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown map style '{0}' (expected open-street-map, carto-positron or carto-darkmatter)")]
pub struct UnknownStyle(String);

impl FromStr for BaseStyle {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BaseStyle::ALL
            .into_iter()
            .find(|style| style.name() == s.trim())
            .ok_or_else(|| UnknownStyle(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Render options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub style: BaseStyle,
    pub zoom: u8,
    /// Map height in pixels.
    pub height: u32,
    /// Marker map: one colour per UF.
    pub color_by_uf: bool,
    /// Population map: scale markers by `pop_21`.
    pub size_by_population: bool,
    /// Population map: diameter (px) of the most populous municipality.
    pub max_marker_size: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            style: BaseStyle::default(),
            zoom: Self::default_zoom(false),
            height: 600,
            color_by_uf: false,
            size_by_population: true,
            max_marker_size: 20,
        }
    }
}

impl RenderOptions {
    /// Country-wide view unless a single state is chosen.
    pub fn default_zoom(state_chosen: bool) -> u8 {
        if state_chosen { 5 } else { 3 }
    }

    pub fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom.clamp(*ZOOM_RANGE.start(), *ZOOM_RANGE.end());
    }

    pub fn set_height(&mut self, height: u32) {
        self.height = height.clamp(*HEIGHT_RANGE.start(), *HEIGHT_RANGE.end());
    }

    pub fn set_max_marker_size(&mut self, size: u32) {
        self.max_marker_size = size.clamp(*MARKER_SIZE_RANGE.start(), *MARKER_SIZE_RANGE.end());
    }

    /// A copy with every numeric field forced into its range.
    pub fn clamped(&self) -> Self {
        let mut out = self.clone();
        out.set_zoom(self.zoom);
        out.set_height(self.height);
        out.set_max_marker_size(self.max_marker_size);
        out
    }
}

// ---------------------------------------------------------------------------
// Chart description
// ---------------------------------------------------------------------------

/// Points sharing one colour and one radius.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerGroup {
    pub label: String,
    pub color: Color32,
    /// Radius in screen pixels.
    pub radius: f32,
    /// Projected positions.
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Markers(Vec<MarkerGroup>),
    Density(DensityGrid),
}

/// Everything needed to draw one map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapChart {
    pub style: BaseStyle,
    pub center: GeoPoint,
    pub zoom: f64,
    pub height: u32,
    pub layer: Layer,
}

/// Result of a dispatch: a chart, or a message shown in its place.
#[derive(Debug, Clone, PartialEq)]
pub enum MapOutcome {
    Chart(MapChart),
    Info(String),
    Warning(String),
}

pub const EMPTY_VIEW_WARNING: &str = "No data to display for the selected filters.";
pub const SIZE_DISABLED_INFO: &str =
    "Enable \"Size markers by population\" in the sidebar to draw this map.";

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Select and run exactly one rendering path for `kind`.
pub fn dispatch(
    dataset: &MunicipalDataset,
    view: &FilteredView,
    kind: MapKind,
    options: &RenderOptions,
) -> MapOutcome {
    let options = options.clamped();
    match kind {
        MapKind::Native => native_points(dataset, view),
        MapKind::Markers => MapOutcome::Chart(marker_scatter(dataset, view, &options)),
        MapKind::Heatmap => MapOutcome::Chart(density_heatmap(dataset, view, &options)),
        MapKind::PopulationSize => {
            if !options.size_by_population {
                return MapOutcome::Info(SIZE_DISABLED_INFO.to_string());
            }
            MapOutcome::Chart(population_markers(dataset, view, &options))
        }
    }
}

fn projected(dataset: &MunicipalDataset, view: &FilteredView) -> Vec<[f64; 2]> {
    view.records(dataset)
        .map(|r| project(GeoPoint::of(r)))
        .collect()
}

fn chart(options: &RenderOptions, center: GeoPoint, layer: Layer) -> MapChart {
    MapChart {
        style: options.style,
        center,
        zoom: options.zoom as f64,
        height: options.height,
        layer,
    }
}

fn native_points(dataset: &MunicipalDataset, view: &FilteredView) -> MapOutcome {
    let Some(bounds) = extent(dataset, view) else {
        log::warn!("native map requested for an empty selection");
        return MapOutcome::Warning(EMPTY_VIEW_WARNING.to_string());
    };
    let center = projection::unproject([
        (bounds.min[0] + bounds.max[0]) / 2.0,
        (bounds.min[1] + bounds.max[1]) / 2.0,
    ]);
    let zoom = fit_zoom(
        &bounds,
        NATIVE_FIT_WIDTH,
        NATIVE_HEIGHT as f64,
        *ZOOM_RANGE.start() as f64,
        *ZOOM_RANGE.end() as f64,
    );
    let group = MarkerGroup {
        label: "municipalities".to_string(),
        color: color::NATIVE_MARKER,
        radius: NATIVE_RADIUS,
        points: projected(dataset, view),
    };
    MapOutcome::Chart(MapChart {
        style: BaseStyle::CartoPositron,
        center,
        zoom,
        height: NATIVE_HEIGHT,
        layer: Layer::Markers(vec![group]),
    })
}

fn marker_scatter(
    dataset: &MunicipalDataset,
    view: &FilteredView,
    options: &RenderOptions,
) -> MapChart {
    let center = mean_center(dataset, view).unwrap_or(BRAZIL_CENTER);
    let groups = if options.color_by_uf {
        // Colours come from the full UF list so they stay put across filters.
        let colors = ColorMap::new(dataset.records.iter().map(|r| r.uf.as_str()));
        let mut by_uf: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
        for r in view.records(dataset) {
            by_uf
                .entry(r.uf.as_str())
                .or_default()
                .push(project(GeoPoint::of(r)));
        }
        by_uf
            .into_iter()
            .map(|(uf, points)| MarkerGroup {
                label: uf.to_string(),
                color: colors.color_for(uf),
                radius: MARKER_RADIUS,
                points,
            })
            .collect()
    } else {
        vec![MarkerGroup {
            label: "municipalities".to_string(),
            color: color::DEFAULT_MARKER,
            radius: MARKER_RADIUS,
            points: projected(dataset, view),
        }]
    };
    chart(options, center, Layer::Markers(groups))
}

fn density_heatmap(
    dataset: &MunicipalDataset,
    view: &FilteredView,
    options: &RenderOptions,
) -> MapChart {
    let center = mean_center(dataset, view).unwrap_or(BRAZIL_CENTER);
    let radius = HEATMAP_RADIUS_PX * degrees_per_pixel(options.zoom as f64);
    let grid = density_grid(&projected(dataset, view), radius);
    chart(options, center, Layer::Density(grid))
}

/// Marker diameter for a population, area-proportional to the largest one.
pub fn marker_diameter(pop: u64, max_pop: u64, max_size: u32) -> f32 {
    if max_pop == 0 {
        return 1.0;
    }
    let ratio = (pop.min(max_pop) as f64 / max_pop as f64).sqrt();
    (max_size as f64 * ratio).max(1.0) as f32
}

fn population_markers(
    dataset: &MunicipalDataset,
    view: &FilteredView,
    options: &RenderOptions,
) -> MapChart {
    let center = mean_center(dataset, view).unwrap_or(BRAZIL_CENTER);
    let max_pop = view.records(dataset).map(|r| r.pop_21).max().unwrap_or(0);

    // Radii snap to half pixels so rows share a handful of groups.
    let mut buckets: BTreeMap<u32, Vec<[f64; 2]>> = BTreeMap::new();
    for r in view.records(dataset) {
        let radius = marker_diameter(r.pop_21, max_pop, options.max_marker_size) / 2.0;
        let key = (radius * 2.0).round() as u32;
        buckets
            .entry(key)
            .or_default()
            .push(project(GeoPoint::of(r)));
    }

    // Largest first so small markers stay visible on top.
    let groups = buckets
        .into_iter()
        .rev()
        .map(|(key, points)| MarkerGroup {
            label: format!("{key} px"),
            color: color::DEFAULT_MARKER.gamma_multiply(0.8),
            radius: key as f32 / 2.0,
            points,
        })
        .collect();
    chart(options, center, Layer::Markers(groups))
}
