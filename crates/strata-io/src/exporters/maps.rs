//! Grid-map dumps in gnuplot matrix format: power and thermal maps, routing
//! utilization, and TSV density, one `x y value` triple per line with blank
//! lines between rows.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use strata_algo::routing::RoutingUtilization;
use strata_algo::thermal::{ThermalAnalyzer, ThermalResult, THERMAL_MAP_DIM};
use strata_core::{Config, Rect, TsvIsland};

pub fn write_maps(
    dir: &Path,
    prefix: &str,
    analyzer: &ThermalAnalyzer,
    thermal: &ThermalResult,
    routing: &RoutingUtilization,
    islands: &[TsvIsland],
    config: &Config,
) -> Result<()> {
    for layer in 0..config.layers {
        write_grid(
            &dir.join(format!("{prefix}_power_{layer}.data")),
            &analyzer.power_map(layer),
            config,
        )?;
        write_grid(
            &dir.join(format!("{prefix}_util_{layer}.data")),
            routing.map(layer),
            config,
        )?;
        write_grid(
            &dir.join(format!("{prefix}_tsv_density_{layer}.data")),
            &tsv_density_map(islands, layer, config),
            config,
        )?;
    }
    if !thermal.thermal_map.is_empty() {
        write_grid(&dir.join(format!("{prefix}_thermal.data")), &thermal.thermal_map, config)?;
    }
    Ok(())
}

fn write_grid(path: &Path, grid: &[Vec<f64>], config: &Config) -> Result<()> {
    let mut out = String::new();
    let dim = grid.len();
    let cell_w = config.outline_x / dim as f64;
    let cell_h = config.outline_y / grid.first().map(Vec::len).unwrap_or(1) as f64;
    for (x, row) in grid.iter().enumerate() {
        for (y, value) in row.iter().enumerate() {
            let _ = writeln!(
                out,
                "{:.2} {:.2} {:.6}",
                (x as f64 + 0.5) * cell_w,
                (y as f64 + 0.5) * cell_h,
                value
            );
        }
        out.push('\n');
    }
    fs::write(path, out).with_context(|| format!("writing map: {}", path.display()))
}

/// Fraction of each thermal-grid cell covered by TSV islands on `layer`.
fn tsv_density_map(islands: &[TsvIsland], layer: usize, config: &Config) -> Vec<Vec<f64>> {
    let mut map = vec![vec![0.0; THERMAL_MAP_DIM]; THERMAL_MAP_DIM];
    let cell_w = config.outline_x / THERMAL_MAP_DIM as f64;
    let cell_h = config.outline_y / THERMAL_MAP_DIM as f64;
    for island in islands.iter().filter(|i| i.layer == layer) {
        for (x, row) in map.iter_mut().enumerate() {
            for (y, cell) in row.iter_mut().enumerate() {
                let cell_rect = Rect::new(x as f64 * cell_w, y as f64 * cell_h, cell_w, cell_h);
                let overlap = Rect::intersection(&island.bb, &cell_rect);
                if overlap.area > 0.0 {
                    *cell = (*cell + overlap.area / cell_rect.area).min(1.0);
                }
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Design;
    use tempfile::tempdir;

    #[test]
    fn test_maps_written() {
        let config = Config {
            layers: 1,
            outline_x: 640.0,
            outline_y: 640.0,
            ..Config::default()
        };
        let design = Design::new();
        let mut analyzer = ThermalAnalyzer::new(&config);
        let thermal = analyzer.analyze(&design.blocks, &[]);
        let routing = RoutingUtilization::new(1, 640.0, 640.0);

        let dir = tempdir().unwrap();
        write_maps(dir.path(), "bench", &analyzer, &thermal, &routing, &[], &config).unwrap();

        assert!(dir.path().join("bench_power_0.data").exists());
        assert!(dir.path().join("bench_util_0.data").exists());
        assert!(dir.path().join("bench_tsv_density_0.data").exists());
        let thermal_data = std::fs::read_to_string(dir.path().join("bench_thermal.data")).unwrap();
        // 64 rows of 64 entries, blank-line separated
        assert_eq!(thermal_data.lines().filter(|l| !l.is_empty()).count(), 64 * 64);
    }
}
