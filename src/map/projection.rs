//! Web Mercator helpers. Plot space uses longitude for `x` and the Mercator
//! ordinate expressed in degrees for `y`, so one unit is one degree at the
//! equator on both axes.

use std::f64::consts::FRAC_PI_4;

use crate::data::filter::FilteredView;
use crate::data::model::{MunicipalDataset, MunicipalRecord};

/// Web Mercator is undefined at the poles; clamp like tile servers do.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// Side of one slippy-map tile in screen pixels.
pub const TILE_SIZE: f64 = 512.0;

/// Geographic centre of Brazil, used when there is nothing to centre on.
pub const BRAZIL_CENTER: GeoPoint = GeoPoint {
    lat: -14.235,
    lon: -51.925,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn of(record: &MunicipalRecord) -> Self {
        GeoPoint {
            lat: record.latitude,
            lon: record.longitude,
        }
    }
}

pub fn mercator_y(lat: f64) -> f64 {
    let phi = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    (FRAC_PI_4 + phi / 2.0).tan().ln().to_degrees()
}

pub fn inverse_mercator_y(y: f64) -> f64 {
    (2.0 * y.to_radians().exp().atan() - 2.0 * FRAC_PI_4).to_degrees()
}

/// Geographic point → plot coordinates.
pub fn project(p: GeoPoint) -> [f64; 2] {
    [p.lon, mercator_y(p.lat)]
}

pub fn unproject(xy: [f64; 2]) -> GeoPoint {
    GeoPoint {
        lat: inverse_mercator_y(xy[1]),
        lon: xy[0],
    }
}

/// Plot units covered by one screen pixel at a zoom level.
pub fn degrees_per_pixel(zoom: f64) -> f64 {
    360.0 / (TILE_SIZE * zoom.exp2())
}

/// Axis-aligned window in plot coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBounds {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl ViewBounds {
    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }
}

/// The window a map of `width_px × height_px` shows around `center`.
pub fn view_bounds(center: GeoPoint, zoom: f64, width_px: f64, height_px: f64) -> ViewBounds {
    let [cx, cy] = project(center);
    let dpp = degrees_per_pixel(zoom);
    let half_w = width_px * dpp / 2.0;
    let half_h = height_px * dpp / 2.0;
    ViewBounds {
        min: [cx - half_w, cy - half_h],
        max: [cx + half_w, cy + half_h],
    }
}

/// Bounding box of the projected rows, or `None` for an empty view.
pub fn extent(dataset: &MunicipalDataset, view: &FilteredView) -> Option<ViewBounds> {
    view.records(dataset)
        .map(|r| project(GeoPoint::of(r)))
        .fold(None, |acc: Option<ViewBounds>, [x, y]| {
            Some(match acc {
                None => ViewBounds {
                    min: [x, y],
                    max: [x, y],
                },
                Some(b) => ViewBounds {
                    min: [b.min[0].min(x), b.min[1].min(y)],
                    max: [b.max[0].max(x), b.max[1].max(y)],
                },
            })
        })
}

/// Mean coordinate of the rows in `view`.
pub fn mean_center(dataset: &MunicipalDataset, view: &FilteredView) -> Option<GeoPoint> {
    if view.is_empty() {
        return None;
    }
    let (lat, lon) = view
        .records(dataset)
        .fold((0.0, 0.0), |(lat, lon), r| (lat + r.latitude, lon + r.longitude));
    let n = view.len() as f64;
    Some(GeoPoint {
        lat: lat / n,
        lon: lon / n,
    })
}

/// Largest zoom in `[min_zoom, max_zoom]` at which `bounds` (plus a margin)
/// fits a `width_px × height_px` viewport.
pub fn fit_zoom(
    bounds: &ViewBounds,
    width_px: f64,
    height_px: f64,
    min_zoom: f64,
    max_zoom: f64,
) -> f64 {
    const MARGIN: f64 = 1.1;
    let span_x = (bounds.width() * MARGIN).max(f64::EPSILON);
    let span_y = (bounds.height() * MARGIN).max(f64::EPSILON);
    let zx = (360.0 * width_px / (TILE_SIZE * span_x)).log2();
    let zy = (360.0 * height_px / (TILE_SIZE * span_y)).log2();
    zx.min(zy).clamp(min_zoom, max_zoom)
}

/// Index of the row in `view` closest to `pointer` (plot coordinates), if one
/// lies within `max_distance` plot units.
pub fn nearest_record(
    dataset: &MunicipalDataset,
    view: &FilteredView,
    pointer: [f64; 2],
    max_distance: f64,
) -> Option<usize> {
    let limit = max_distance * max_distance;
    view.indices
        .iter()
        .filter_map(|&i| {
            let [x, y] = project(GeoPoint::of(dataset.record(i)?));
            let d = (x - pointer[0]).powi(2) + (y - pointer[1]).powi(2);
            (d <= limit).then_some((i, d))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;

    fn at(lat: f64, lon: f64) -> MunicipalRecord {
        let mut r = record("M", "E", "R", "U", 1);
        r.latitude = lat;
        r.longitude = lon;
        r
    }

    #[test]
    fn mercator_round_trips_and_is_odd() {
        for lat in [-33.7, -23.55, 0.0, 5.27] {
            assert!((inverse_mercator_y(mercator_y(lat)) - lat).abs() < 1e-9);
            assert!((mercator_y(-lat) + mercator_y(lat)).abs() < 1e-9);
        }
        assert!(mercator_y(90.0).is_finite());
    }

    #[test]
    fn higher_zoom_shows_less() {
        let a = view_bounds(BRAZIL_CENTER, 3.0, 800.0, 600.0);
        let b = view_bounds(BRAZIL_CENTER, 5.0, 800.0, 600.0);
        assert!((a.width() / b.width() - 4.0).abs() < 1e-9);
        let [cx, _] = project(BRAZIL_CENTER);
        assert!(((a.min[0] + a.max[0]) / 2.0 - cx).abs() < 1e-9);
    }

    #[test]
    fn fitted_zoom_contains_extent() {
        let ds = MunicipalDataset::from_records(vec![at(-33.7, -53.4), at(5.2, -60.7), at(-7.1, -34.8)]);
        let view = FilteredView::unfiltered(&ds);
        let ext = extent(&ds, &view).unwrap();
        let zoom = fit_zoom(&ext, 800.0, 700.0, 1.0, 15.0);
        let centre = unproject([
            (ext.min[0] + ext.max[0]) / 2.0,
            (ext.min[1] + ext.max[1]) / 2.0,
        ]);
        let window = view_bounds(centre, zoom, 800.0, 700.0);
        assert!(window.width() >= ext.width());
        assert!(window.height() >= ext.height());
        assert!((1.0..=15.0).contains(&zoom));
    }

    #[test]
    fn single_point_fits_at_max_zoom() {
        let ds = MunicipalDataset::from_records(vec![at(-15.8, -47.9)]);
        let view = FilteredView::unfiltered(&ds);
        let ext = extent(&ds, &view).unwrap();
        assert_eq!(fit_zoom(&ext, 800.0, 700.0, 1.0, 15.0), 15.0);
    }

    #[test]
    fn mean_center_and_empty_view() {
        let ds = MunicipalDataset::from_records(vec![at(-10.0, -50.0), at(-20.0, -40.0)]);
        let view = FilteredView::unfiltered(&ds);
        assert_eq!(
            mean_center(&ds, &view),
            Some(GeoPoint {
                lat: -15.0,
                lon: -45.0
            })
        );
        assert!(mean_center(&ds, &FilteredView::default()).is_none());
        assert!(extent(&ds, &FilteredView::default()).is_none());
    }

    #[test]
    fn nearest_record_respects_radius_and_view() {
        let ds = MunicipalDataset::from_records(vec![at(-10.0, -50.0), at(-10.0, -49.0)]);
        let view = FilteredView::unfiltered(&ds);
        let p = project(GeoPoint {
            lat: -10.0,
            lon: -49.2,
        });
        assert_eq!(nearest_record(&ds, &view, p, 1.0), Some(1));
        assert_eq!(nearest_record(&ds, &view, p, 0.1), None);

        let only_first = FilteredView {
            indices: vec![0],
            ..Default::default()
        };
        assert_eq!(nearest_record(&ds, &only_first, p, 1.0), Some(0));
    }
}
