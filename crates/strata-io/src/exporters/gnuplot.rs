//! Gnuplot floorplan scripts, one per die.
//!
//! Blocks are drawn as labeled rectangles, TSV islands as filled boxes;
//! blocks with a failed alignment get their mismatch direction annotated.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use strata_core::{AlignmentStatus, Config, Design, TsvIsland};

pub fn write_floorplan_scripts(
    dir: &Path,
    prefix: &str,
    design: &Design,
    islands: &[TsvIsland],
    config: &Config,
) -> Result<()> {
    for layer in 0..config.layers {
        let path = dir.join(format!("{prefix}_{layer}.gp"));
        fs::write(&path, floorplan_script(prefix, layer, design, islands, config))
            .with_context(|| format!("writing floorplan script: {}", path.display()))?;
    }
    Ok(())
}

fn floorplan_script(
    prefix: &str,
    layer: usize,
    design: &Design,
    islands: &[TsvIsland],
    config: &Config,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "set title \"{prefix} - die {layer} floorplan\"");
    let _ = writeln!(out, "set terminal postscript eps color solid");
    let _ = writeln!(out, "set output \"{prefix}_{layer}.eps\"");
    let _ = writeln!(out, "set size ratio {}", config.outline_y / config.outline_x);
    let _ = writeln!(out, "set xrange [0:{}]", config.outline_x);
    let _ = writeln!(out, "set yrange [0:{}]", config.outline_y);
    let _ = writeln!(out, "set xlabel \"x (um)\"");
    let _ = writeln!(out, "set ylabel \"y (um)\"");

    let mut object = 1usize;
    for block in design.blocks.iter().filter(|b| b.is_regular()) {
        if block.layer != Some(layer) {
            continue;
        }
        let bb = &block.bb;
        let _ = writeln!(
            out,
            "set object {object} rect from {:.2},{:.2} to {:.2},{:.2} fc rgb \"gold\"",
            bb.ll.x, bb.ll.y, bb.ur.x, bb.ur.y
        );
        let annotation = match block.alignment_status {
            AlignmentStatus::FailHorTooLeft => " (<)",
            AlignmentStatus::FailHorTooRight => " (>)",
            AlignmentStatus::FailVertTooLow => " (v)",
            AlignmentStatus::FailVertTooHigh => " (^)",
            _ => "",
        };
        let center = bb.center();
        let _ = writeln!(
            out,
            "set label \"{}{annotation}\" at {:.2},{:.2} center",
            block.name, center.x, center.y
        );
        object += 1;
    }

    for island in islands.iter().filter(|i| i.layer == layer) {
        let bb = &island.bb;
        let _ = writeln!(
            out,
            "set object {object} rect from {:.2},{:.2} to {:.2},{:.2} fc rgb \"slategrey\"",
            bb.ll.x, bb.ll.y, bb.ur.x, bb.ur.y
        );
        object += 1;
    }

    let _ = writeln!(out, "plot NaN notitle");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Block;
    use tempfile::tempdir;

    #[test]
    fn test_scripts_written_per_die() {
        let mut design = Design::new();
        let mut block = Block::new("cpu", 10.0, 10.0);
        block.layer = Some(0);
        block.placed = true;
        design.add_block(block);

        let config = Config {
            layers: 2,
            ..Config::default()
        };
        let dir = tempdir().unwrap();
        write_floorplan_scripts(dir.path(), "bench", &design, &[], &config).unwrap();

        let die0 = std::fs::read_to_string(dir.path().join("bench_0.gp")).unwrap();
        let die1 = std::fs::read_to_string(dir.path().join("bench_1.gp")).unwrap();
        assert!(die0.contains("set object 1 rect"));
        assert!(die0.contains("\"cpu\""));
        // the block sits on die 0 only
        assert!(!die1.contains("\"cpu\""));
    }
}
