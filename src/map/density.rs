//! Kernel density estimate on a regular grid in plot coordinates. When the
//! grid has to be coarser than the kernel, points are counted per cell.

use std::collections::HashMap;

/// Upper bound on grid cells per axis; the cell size grows to respect it.
const MAX_CELLS_PER_AXIS: f64 = 300.0;

/// Kernel radius measured in cells at the nominal resolution.
const CELLS_PER_RADIUS: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityCell {
    /// Lower-left corner in plot coordinates.
    pub min: [f64; 2],
    /// Density normalised so the busiest cell is 1.
    pub intensity: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DensityGrid {
    pub cell_size: f64,
    pub cells: Vec<DensityCell>,
}

impl DensityGrid {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Accumulate a quartic kernel of `radius` plot units around every point.
pub fn density_grid(points: &[[f64; 2]], radius: f64) -> DensityGrid {
    if points.is_empty() || !(radius > 0.0) {
        return DensityGrid::default();
    }

    let (mut min, mut max) = (points[0], points[0]);
    for p in points {
        min = [min[0].min(p[0]), min[1].min(p[1])];
        max = [max[0].max(p[0]), max[1].max(p[1])];
    }
    let span = (max[0] - min[0]).max(max[1] - min[1]) + 2.0 * radius;
    let cell_size = (radius / CELLS_PER_RADIUS).max(span / MAX_CELLS_PER_AXIS);
    let reach = (radius / cell_size).ceil() as i64;
    let origin = [min[0] - radius, min[1] - radius];

    // Cells wider than the kernel would miss most centres; bin instead.
    let binned = cell_size > radius;

    let mut acc: HashMap<(i64, i64), f64> = HashMap::new();
    for p in points {
        let ci = ((p[0] - origin[0]) / cell_size).floor() as i64;
        let cj = ((p[1] - origin[1]) / cell_size).floor() as i64;
        if binned {
            *acc.entry((ci, cj)).or_default() += 1.0;
            continue;
        }
        for i in (ci - reach)..=(ci + reach) {
            for j in (cj - reach)..=(cj + reach) {
                let cx = origin[0] + (i as f64 + 0.5) * cell_size;
                let cy = origin[1] + (j as f64 + 0.5) * cell_size;
                let u2 = ((cx - p[0]).powi(2) + (cy - p[1]).powi(2)) / (radius * radius);
                if u2 < 1.0 {
                    *acc.entry((i, j)).or_default() += (1.0 - u2).powi(2);
                }
            }
        }
    }

    let peak = acc.values().copied().fold(0.0, f64::max);
    if peak <= 0.0 {
        return DensityGrid::default();
    }

    let mut cells: Vec<DensityCell> = acc
        .into_iter()
        .map(|((i, j), w)| DensityCell {
            min: [
                origin[0] + i as f64 * cell_size,
                origin[1] + j as f64 * cell_size,
            ],
            intensity: w / peak,
        })
        .collect();
    // Paint dense cells last.
    cells.sort_by(|a, b| a.intensity.total_cmp(&b.intensity));

    DensityGrid { cell_size, cells }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_gives_empty_grid() {
        assert!(density_grid(&[], 1.0).is_empty());
        assert!(density_grid(&[[0.0, 0.0]], 0.0).is_empty());
    }

    #[test]
    fn cluster_is_denser_than_outlier() {
        let points = [[0.0, 0.0], [0.05, 0.0], [0.0, 0.05], [10.0, 10.0]];
        let grid = density_grid(&points, 1.0);
        let near = |x: f64, y: f64| {
            grid.cells
                .iter()
                .filter(|c| {
                    (c.min[0] + grid.cell_size / 2.0 - x).abs() <= grid.cell_size
                        && (c.min[1] + grid.cell_size / 2.0 - y).abs() <= grid.cell_size
                })
                .map(|c| c.intensity)
                .fold(0.0, f64::max)
        };
        assert_eq!(near(0.0, 0.0), 1.0);
        let outlier = near(10.0, 10.0);
        assert!(outlier > 0.0 && outlier < 0.5);
        assert!(grid.cells.iter().all(|c| c.intensity > 0.0 && c.intensity <= 1.0));
        assert!(grid.cells.windows(2).all(|w| w[0].intensity <= w[1].intensity));
    }

    #[test]
    fn coarse_cells_keep_every_point() {
        // Kernel far smaller than the cell the extent forces.
        let points: Vec<[f64; 2]> = (0..50).map(|i| [i as f64 * 2.0 + 0.37, 0.11]).collect();
        let grid = density_grid(&points, 0.01);
        assert!(grid.cell_size >= 98.0 / MAX_CELLS_PER_AXIS);
        assert_eq!(grid.cells.len(), 50);
        for p in &points {
            assert!(
                grid.cells.iter().any(|c| {
                    (c.min[0]..c.min[0] + grid.cell_size).contains(&p[0])
                        && (c.min[1]..c.min[1] + grid.cell_size).contains(&p[1])
                        && c.intensity > 0.0
                }),
                "{p:?} has no cell"
            );
        }
    }
}
