//! Routing-utilization estimation.
//!
//! Net bounding boxes and TSV-island connections are rasterized onto
//! per-layer grids; the evaluator reads back the average and peak cell
//! utilization. Maps are scratch buffers, reset at the start of every
//! evaluation.

use strata_core::Rect;

/// Edge length of each per-layer utilization grid.
pub const UTIL_MAP_DIM: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UtilResult {
    /// Average cell utilization across all layers.
    pub cost: f64,
    /// Peak cell utilization.
    pub max_util: f64,
}

#[derive(Debug, Clone)]
pub struct RoutingUtilization {
    maps: Vec<Vec<Vec<f64>>>,
    outline_x: f64,
    outline_y: f64,
}

impl RoutingUtilization {
    pub fn new(layers: usize, outline_x: f64, outline_y: f64) -> Self {
        Self {
            maps: vec![vec![vec![0.0; UTIL_MAP_DIM]; UTIL_MAP_DIM]; layers],
            outline_x,
            outline_y,
        }
    }

    pub fn reset(&mut self) {
        for map in &mut self.maps {
            for row in map {
                row.fill(0.0);
            }
        }
    }

    /// Spread `weight` over the cells covered by `bb` on `layer`.
    pub fn add_demand(&mut self, layer: usize, bb: &Rect, weight: f64) {
        if layer >= self.maps.len() || bb.area == 0.0 {
            return;
        }
        let cell_w = self.outline_x / UTIL_MAP_DIM as f64;
        let cell_h = self.outline_y / UTIL_MAP_DIM as f64;

        let x0 = ((bb.ll.x / cell_w).floor().max(0.0) as usize).min(UTIL_MAP_DIM - 1);
        let x1 = ((bb.ur.x / cell_w).ceil() as usize).clamp(x0 + 1, UTIL_MAP_DIM);
        let y0 = ((bb.ll.y / cell_h).floor().max(0.0) as usize).min(UTIL_MAP_DIM - 1);
        let y1 = ((bb.ur.y / cell_h).ceil() as usize).clamp(y0 + 1, UTIL_MAP_DIM);

        let map = &mut self.maps[layer];
        for row in map.iter_mut().take(x1).skip(x0) {
            for cell in row.iter_mut().take(y1).skip(y0) {
                *cell += weight;
            }
        }
    }

    pub fn eval(&self) -> UtilResult {
        let mut max_util = 0.0_f64;
        let mut sum = 0.0;
        let mut cells = 0usize;
        for map in &self.maps {
            for row in map {
                for &cell in row {
                    max_util = max_util.max(cell);
                    sum += cell;
                    cells += 1;
                }
            }
        }
        UtilResult {
            cost: if cells > 0 { sum / cells as f64 } else { 0.0 },
            max_util,
        }
    }

    pub fn map(&self, layer: usize) -> &Vec<Vec<f64>> {
        &self.maps[layer]
    }

    pub fn layers(&self) -> usize {
        self.maps.len()
    }
}
