//! Power-blurring thermal analysis.
//!
//! Per-die power densities are rasterized into padded grids; one
//! precomputed Gauss-like mask per source layer is convolved across the
//! stack to estimate the temperature map of the lowest layer, which sits
//! furthest from the heat sink. TSV islands conduct heat and enter as a
//! local power reduction before blurring.
//!
//! The masks are computed once at construction and immutable afterwards;
//! the analysis is deterministic for identical inputs, also when the
//! row-parallel convolution is enabled (each output cell is an independent
//! sum).

use strata_core::config::ThermalConfig;
use strata_core::{Block, Config, TsvIsland};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Edge length of the thermal and power grids.
pub const THERMAL_MAP_DIM: usize = 64;

/// Outcome of one thermal analysis.
#[derive(Debug, Clone, Default)]
pub struct ThermalResult {
    /// Estimated temperature of the lowest layer, K.
    pub thermal_map: Vec<Vec<f64>>,
    pub max_temp: f64,
    /// Cost handle for the evaluator; the estimated peak temperature.
    pub cost_temp: f64,
}

#[derive(Debug, Clone)]
pub struct ThermalAnalyzer {
    layers: usize,
    outline_x: f64,
    outline_y: f64,
    params: ThermalConfig,
    /// One mask per source layer, `mask_dim` x `mask_dim`.
    masks: Vec<Vec<Vec<f64>>>,
    /// Per-layer power maps, padded by `mask_dim / 2` on each side.
    power_maps: Vec<Vec<Vec<f64>>>,
}

impl ThermalAnalyzer {
    pub fn new(config: &Config) -> Self {
        let params = config.thermal.clone();
        let masks = (0..config.layers)
            .map(|layer| Self::build_mask(&params, layer))
            .collect();
        let padded = THERMAL_MAP_DIM + params.mask_dim - 1;
        Self {
            layers: config.layers,
            outline_x: config.outline_x,
            outline_y: config.outline_y,
            params,
            masks,
            power_maps: vec![vec![vec![0.0; padded]; padded]; config.layers],
        }
    }

    /// Gauss-like impulse response of a source on `layer`, seen at the
    /// lowest layer. The peak decays with the layer distance; the spread is
    /// fixed by the demanded boundary value.
    fn build_mask(params: &ThermalConfig, layer: usize) -> Vec<Vec<f64>> {
        let dim = params.mask_dim;
        let amplitude = params.impulse_factor / params.impulse_scaling.powi(layer as i32);
        let radius = dim as f64 / 2.0;
        // amplitude * exp(-R^2 / (2 sigma^2)) == amplitude * boundary
        let sigma_sq = radius * radius / (2.0 * (1.0 / params.mask_boundary_value).ln());
        let center = (dim / 2) as f64;

        let mut mask = vec![vec![0.0; dim]; dim];
        for (x, row) in mask.iter_mut().enumerate() {
            for (y, value) in row.iter_mut().enumerate() {
                let r_sq = (x as f64 - center).powi(2) + (y as f64 - center).powi(2);
                *value = amplitude * (-r_sq / (2.0 * sigma_sq)).exp();
            }
        }
        mask
    }

    /// Rasterize block power densities into the per-layer grids.
    pub fn generate_power_maps(&mut self, blocks: &[Block]) {
        for map in &mut self.power_maps {
            for row in map.iter_mut() {
                row.fill(0.0);
            }
        }
        let offset = self.params.mask_dim / 2;
        let cell_w = self.outline_x / THERMAL_MAP_DIM as f64;
        let cell_h = self.outline_y / THERMAL_MAP_DIM as f64;

        for block in blocks {
            if !block.is_regular() || !block.placed || block.power_density == 0.0 {
                continue;
            }
            let layer = match block.layer {
                Some(l) if l < self.layers => l,
                _ => continue,
            };
            let bb = &block.bb;
            let x0 = ((bb.ll.x / cell_w).floor().max(0.0) as usize).min(THERMAL_MAP_DIM - 1);
            let x1 = ((bb.ur.x / cell_w).ceil() as usize).clamp(x0 + 1, THERMAL_MAP_DIM);
            let y0 = ((bb.ll.y / cell_h).floor().max(0.0) as usize).min(THERMAL_MAP_DIM - 1);
            let y1 = ((bb.ur.y / cell_h).ceil() as usize).clamp(y0 + 1, THERMAL_MAP_DIM);

            for x in x0..x1 {
                let ow = (bb.ur.x.min((x + 1) as f64 * cell_w) - bb.ll.x.max(x as f64 * cell_w))
                    .max(0.0);
                for y in y0..y1 {
                    let oh = (bb.ur.y.min((y + 1) as f64 * cell_h)
                        - bb.ll.y.max(y as f64 * cell_h))
                    .max(0.0);
                    let frac = (ow * oh) / (cell_w * cell_h);
                    self.power_maps[layer][x + offset][y + offset] +=
                        block.power_density * frac;
                }
            }
        }
    }

    /// Scale cell power down under TSV islands; vias are vertical heat
    /// paths, locally cooling their footprint.
    pub fn adapt_power_maps(&mut self, islands: &[TsvIsland]) {
        let offset = self.params.mask_dim / 2;
        let cell_w = self.outline_x / THERMAL_MAP_DIM as f64;
        let cell_h = self.outline_y / THERMAL_MAP_DIM as f64;

        for island in islands {
            if island.layer >= self.layers {
                continue;
            }
            let bb = &island.bb;
            let x0 = ((bb.ll.x / cell_w).floor().max(0.0) as usize).min(THERMAL_MAP_DIM - 1);
            let x1 = ((bb.ur.x / cell_w).ceil().max(0.0) as usize).clamp(x0 + 1, THERMAL_MAP_DIM);
            let y0 = ((bb.ll.y / cell_h).floor().max(0.0) as usize).min(THERMAL_MAP_DIM - 1);
            let y1 = ((bb.ur.y / cell_h).ceil().max(0.0) as usize).clamp(y0 + 1, THERMAL_MAP_DIM);

            for x in x0..x1 {
                let ow = (bb.ur.x.min((x + 1) as f64 * cell_w) - bb.ll.x.max(x as f64 * cell_w))
                    .max(0.0);
                for y in y0..y1 {
                    let oh = (bb.ur.y.min((y + 1) as f64 * cell_h)
                        - bb.ll.y.max(y as f64 * cell_h))
                    .max(0.0);
                    let frac = ((ow * oh) / (cell_w * cell_h)).clamp(0.0, 1.0);
                    let scale = 1.0 - self.params.tsv_cooling_factor * frac;
                    self.power_maps[island.layer][x + offset][y + offset] *= scale.max(0.0);
                }
            }
        }
    }

    /// Convolve every layer's power map with its mask onto the lowest-layer
    /// temperature estimate.
    pub fn perform_blurring(&self) -> ThermalResult {
        let dim = self.params.mask_dim;
        let compute_row = |x: usize| -> Vec<f64> {
            let mut row = vec![self.params.ambient_temp; THERMAL_MAP_DIM];
            for (cell_y, out) in row.iter_mut().enumerate() {
                let mut acc = 0.0;
                for (mask, power) in self.masks.iter().zip(self.power_maps.iter()) {
                    for mx in 0..dim {
                        let power_row = &power[x + mx];
                        let mask_row = &mask[mx];
                        for my in 0..dim {
                            acc += power_row[cell_y + my] * mask_row[my];
                        }
                    }
                }
                *out += acc;
            }
            row
        };

        #[cfg(feature = "parallel")]
        let thermal_map: Vec<Vec<f64>> =
            (0..THERMAL_MAP_DIM).into_par_iter().map(compute_row).collect();
        #[cfg(not(feature = "parallel"))]
        let thermal_map: Vec<Vec<f64>> = (0..THERMAL_MAP_DIM).map(compute_row).collect();

        let max_temp = thermal_map
            .iter()
            .flat_map(|row| row.iter())
            .fold(f64::NEG_INFINITY, |a, &b| a.max(b));

        ThermalResult {
            thermal_map,
            max_temp,
            cost_temp: max_temp,
        }
    }

    /// Full analysis: rasterize, adapt for TSVs, blur.
    pub fn analyze(&mut self, blocks: &[Block], islands: &[TsvIsland]) -> ThermalResult {
        self.generate_power_maps(blocks);
        self.adapt_power_maps(islands);
        self.perform_blurring()
    }

    /// Unpadded power map of one layer, for the map exporters.
    pub fn power_map(&self, layer: usize) -> Vec<Vec<f64>> {
        let offset = self.params.mask_dim / 2;
        (0..THERMAL_MAP_DIM)
            .map(|x| {
                (0..THERMAL_MAP_DIM)
                    .map(|y| self.power_maps[layer][x + offset][y + offset])
                    .collect()
            })
            .collect()
    }

    pub fn layers(&self) -> usize {
        self.layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Rect;

    fn config() -> Config {
        Config {
            layers: 2,
            outline_x: 640.0,
            outline_y: 640.0,
            ..Config::default()
        }
    }

    fn hot_block(name: &str, layer: usize, x: f64, y: f64) -> Block {
        let mut b = Block::new(name, 100.0, 100.0);
        b.bb.move_to(x, y);
        b.layer = Some(layer);
        b.placed = true;
        b.power_density = 0.5;
        b
    }

    #[test]
    fn test_blurring_is_deterministic() {
        let blocks = vec![hot_block("a", 0, 100.0, 100.0), hot_block("b", 1, 400.0, 400.0)];
        let mut analyzer = ThermalAnalyzer::new(&config());
        let first = analyzer.analyze(&blocks, &[]);
        let second = analyzer.analyze(&blocks, &[]);
        assert_eq!(first.thermal_map, second.thermal_map);
        assert_eq!(first.max_temp, second.max_temp);
    }

    #[test]
    fn test_peak_sits_over_the_hot_block() {
        let blocks = vec![hot_block("a", 0, 100.0, 100.0)];
        let mut analyzer = ThermalAnalyzer::new(&config());
        let result = analyzer.analyze(&blocks, &[]);
        // locate the hottest cell; block spans cells 10..20 in both axes
        let mut peak = (0, 0);
        let mut best = f64::NEG_INFINITY;
        for (x, row) in result.thermal_map.iter().enumerate() {
            for (y, &t) in row.iter().enumerate() {
                if t > best {
                    best = t;
                    peak = (x, y);
                }
            }
        }
        assert!((10..20).contains(&peak.0), "peak x at {}", peak.0);
        assert!((10..20).contains(&peak.1), "peak y at {}", peak.1);
        assert!(result.max_temp > config().thermal.ambient_temp);
    }

    #[test]
    fn test_upper_layer_contributes_less() {
        let lower = vec![hot_block("a", 0, 300.0, 300.0)];
        let upper = vec![hot_block("a", 1, 300.0, 300.0)];
        let mut analyzer = ThermalAnalyzer::new(&config());
        let low = analyzer.analyze(&lower, &[]);
        let high = analyzer.analyze(&upper, &[]);
        assert!(low.max_temp > high.max_temp);
    }

    #[test]
    fn test_tsv_island_cools_footprint() {
        let blocks = vec![hot_block("a", 0, 100.0, 100.0)];
        let island = TsvIsland::new("v", 16, 10.0, Rect::new(120.0, 120.0, 60.0, 60.0), 0, None);
        let mut analyzer = ThermalAnalyzer::new(&config());
        let without = analyzer.analyze(&blocks, &[]);
        let with = analyzer.analyze(&blocks, std::slice::from_ref(&island));
        assert!(with.max_temp < without.max_temp);
    }

    #[test]
    fn test_idle_stack_sits_at_ambient() {
        let mut analyzer = ThermalAnalyzer::new(&config());
        let result = analyzer.analyze(&[], &[]);
        assert_eq!(result.max_temp, config().thermal.ambient_temp);
    }
}
