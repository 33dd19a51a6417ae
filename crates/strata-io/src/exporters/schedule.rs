//! Temperature-schedule log writer: one tab-separated row per SA step.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use strata_algo::anneal::{SaPhase, TempStep};

pub fn write_temp_schedule(path: &Path, steps: &[TempStep]) -> Result<()> {
    let mut out = String::from("# step\ttemp\tavg_cost\tbest_cost\tnew_best\tphase\n");
    for step in steps {
        let phase = match step.phase {
            SaPhase::One => 1,
            SaPhase::Two => 2,
            SaPhase::Three => 3,
        };
        let _ = writeln!(
            out,
            "{}\t{:.6}\t{:.6}\t{:.6}\t{}\t{}",
            step.step,
            step.temp,
            step.avg_cost,
            step.cost_best_sol,
            u8::from(step.new_best_sol_found),
            phase
        );
    }
    fs::write(path, out).with_context(|| format!("writing temperature log: {}", path.display()))
}
