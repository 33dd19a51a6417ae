//! HotSpot-compatible output: per-die floorplans (`.flp`), the power trace
//! (`.ptrace`) and the 3D layer-configuration file (`.lcf`).
//!
//! HotSpot wants meters and watts; coordinates are converted from
//! micrometers on the way out.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use strata_core::{Config, Design};

const UM_TO_M: f64 = 1.0e-6;

/// Silicon thermal conductivity (W/(m K)) for the layer file.
const SI_CONDUCTIVITY: f64 = 150.0;
/// Volumetric heat capacity of silicon (J/(m^3 K)).
const SI_HEAT_CAPACITY: f64 = 1.75e6;
/// Bonding-layer (BCB) conductivity.
const BOND_CONDUCTIVITY: f64 = 0.25;
const BOND_HEAT_CAPACITY: f64 = 2.18e6;

pub fn write_hotspot_files(
    dir: &Path,
    prefix: &str,
    design: &Design,
    config: &Config,
) -> Result<()> {
    for layer in 0..config.layers {
        let path = dir.join(format!("{prefix}_hotspot_{layer}.flp"));
        fs::write(&path, floorplan_file(layer, design, config))
            .with_context(|| format!("writing HotSpot floorplan: {}", path.display()))?;
    }
    let ptrace = dir.join(format!("{prefix}.ptrace"));
    fs::write(&ptrace, power_trace(design))
        .with_context(|| format!("writing power trace: {}", ptrace.display()))?;
    let lcf = dir.join(format!("{prefix}.lcf"));
    fs::write(&lcf, layer_config(prefix, config))
        .with_context(|| format!("writing layer config: {}", lcf.display()))?;
    Ok(())
}

fn floorplan_file(layer: usize, design: &Design, config: &Config) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# HotSpot floorplan for die {layer}");
    let _ = writeln!(out, "# name\twidth\theight\tleft\tbottom");

    let mut covered = 0.0;
    for block in design.blocks.iter().filter(|b| b.is_regular()) {
        if block.layer != Some(layer) {
            continue;
        }
        let bb = &block.bb;
        let _ = writeln!(
            out,
            "{}\t{:.9}\t{:.9}\t{:.9}\t{:.9}",
            block.name,
            bb.w * UM_TO_M,
            bb.h * UM_TO_M,
            bb.ll.x * UM_TO_M,
            bb.ll.y * UM_TO_M
        );
        covered += bb.area;
    }

    // HotSpot requires full die coverage; one filler block models the
    // remaining deadspace
    if covered < config.die_area() {
        let _ = writeln!(
            out,
            "deadspace_{layer}\t{:.9}\t{:.9}\t0.0\t0.0",
            config.outline_x * UM_TO_M,
            config.outline_y * UM_TO_M
        );
    }
    out
}

fn power_trace(design: &Design) -> String {
    let blocks: Vec<_> = design.blocks.iter().filter(|b| b.is_regular()).collect();
    let mut names = String::new();
    let mut values = String::new();
    for block in &blocks {
        let _ = write!(names, "{}\t", block.name);
        let _ = write!(values, "{:.6}\t", block.power());
    }
    format!("{}\n{}\n", names.trim_end(), values.trim_end())
}

fn layer_config(prefix: &str, config: &Config) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# 3D stack layer configuration, bottom-up");
    for layer in 0..config.layers {
        // active silicon layer, power dissipating
        let _ = writeln!(out, "# die {layer}: active Si");
        let _ = writeln!(out, "{}", layer * 2);
        let _ = writeln!(out, "Y");
        let _ = writeln!(out, "Y");
        let _ = writeln!(out, "{SI_CONDUCTIVITY:.1}");
        let _ = writeln!(out, "{SI_HEAT_CAPACITY:.3e}");
        let _ = writeln!(out, "{:.9}", config.die_thickness * UM_TO_M);
        let _ = writeln!(out, "{prefix}_hotspot_{layer}.flp");
        let _ = writeln!(out);
        if layer + 1 < config.layers {
            // passive bonding layer between dies
            let _ = writeln!(out, "# bond {layer}");
            let _ = writeln!(out, "{}", layer * 2 + 1);
            let _ = writeln!(out, "Y");
            let _ = writeln!(out, "N");
            let _ = writeln!(out, "{BOND_CONDUCTIVITY:.2}");
            let _ = writeln!(out, "{BOND_HEAT_CAPACITY:.3e}");
            let _ = writeln!(out, "{:.9}", config.bond_thickness * UM_TO_M);
            let _ = writeln!(out, "{prefix}_hotspot_{layer}.flp");
            let _ = writeln!(out);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Block;
    use tempfile::tempdir;

    #[test]
    fn test_hotspot_files_complete() {
        let mut design = Design::new();
        let mut block = Block::new("core", 100.0, 100.0);
        block.layer = Some(0);
        block.placed = true;
        block.power_density = 0.2;
        design.add_block(block);

        let config = Config {
            layers: 2,
            ..Config::default()
        };
        let dir = tempdir().unwrap();
        write_hotspot_files(dir.path(), "bench", &design, &config).unwrap();

        let flp = std::fs::read_to_string(dir.path().join("bench_hotspot_0.flp")).unwrap();
        // 100um -> 1e-4 m
        assert!(flp.contains("core\t0.000100000"));
        assert!(flp.contains("deadspace_0"));

        let ptrace = std::fs::read_to_string(dir.path().join("bench.ptrace")).unwrap();
        let mut lines = ptrace.lines();
        assert_eq!(lines.next().unwrap().trim_end(), "core");
        // 0.2 uW/um^2 * 10^4 um^2 * 1e-6 = 0.002 W
        assert!(lines.next().unwrap().starts_with("0.002000"));

        assert!(dir.path().join("bench.lcf").exists());
    }
}
