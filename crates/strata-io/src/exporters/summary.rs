//! Run summary: a JSON record for tooling plus a human-readable results log.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use strata_algo::eval::Cost;
use strata_core::{Config, Design, TsvIsland};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub benchmark: String,
    /// Whether a layout fitting the fixed outline was found.
    pub valid: bool,
    pub layers: usize,
    pub outline: (f64, f64),
    pub cost_total: f64,
    pub max_blocks_outline_ratio: f64,
    pub deadspace_percent: f64,
    pub hpwl: f64,
    pub max_routing_util: f64,
    pub tsvs: usize,
    pub tsv_islands: usize,
    pub avg_tsvs_per_island: f64,
    pub tsv_deadspace_percent: f64,
    pub alignment_mismatch_um: f64,
    pub max_temp_k: f64,
    pub hotspot_count: usize,
    pub temp_steps: usize,
    pub runtime_seconds: f64,
}

impl RunSummary {
    pub fn new(
        benchmark: &str,
        valid: bool,
        cost: &Cost,
        config: &Config,
        design: &Design,
        islands: &[TsvIsland],
        hotspot_count: usize,
        temp_steps: usize,
        runtime_seconds: f64,
    ) -> Self {
        let clustered: usize = islands.iter().map(|i| i.count).sum();
        let deadspace = config.stack_area() - design.blocks_area();
        Self {
            benchmark: benchmark.to_string(),
            valid,
            layers: config.layers,
            outline: (config.outline_x, config.outline_y),
            cost_total: cost.total,
            max_blocks_outline_ratio: cost.area_actual,
            deadspace_percent: 100.0 * deadspace / config.stack_area(),
            hpwl: cost.hpwl_actual,
            max_routing_util: cost.routing_util_actual,
            tsvs: cost.tsvs_actual,
            tsv_islands: islands.len(),
            avg_tsvs_per_island: if islands.is_empty() {
                0.0
            } else {
                clustered as f64 / islands.len() as f64
            },
            tsv_deadspace_percent: 100.0 * cost.tsvs_deadspace_ratio,
            alignment_mismatch_um: cost.alignments_actual,
            max_temp_k: cost.thermal_actual,
            hotspot_count,
            temp_steps,
            runtime_seconds,
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing summary: {}", path.display()))
    }

    pub fn write_results(&self, path: &Path) -> Result<()> {
        let mut out = String::new();
        let _ = writeln!(out, "Characteristica of final solution:");
        let _ = writeln!(out, "Final (adapted) cost: {:.6}", self.cost_total);
        let _ = writeln!(
            out,
            "Max blocks-outline / die-outline ratio: {:.6}",
            self.max_blocks_outline_ratio
        );
        let _ = writeln!(out, "Overall deadspace [%]: {:.2}", self.deadspace_percent);
        let _ = writeln!(out, "HPWL: {:.2}", self.hpwl);
        let _ = writeln!(out, "Max routing utilization: {:.4}", self.max_routing_util);
        let _ = writeln!(out, "TSVs: {}", self.tsvs);
        let _ = writeln!(out, " TSV islands: {}", self.tsv_islands);
        let _ = writeln!(out, " Avg TSV count per island: {:.2}", self.avg_tsvs_per_island);
        let _ = writeln!(
            out,
            " Deadspace utilization by TSVs [%]: {:.4}",
            self.tsv_deadspace_percent
        );
        let _ = writeln!(out, "Alignment mismatches [um]: {:.2}", self.alignment_mismatch_um);
        let _ = writeln!(
            out,
            "Temp cost (estimated max temp for lowest layer [K]): {:.2}",
            self.max_temp_k
        );
        let _ = writeln!(out, "Hotspot regions (on lowest layer): {}", self.hotspot_count);
        let _ = writeln!(out, "Temperature steps: {}", self.temp_steps);
        let _ = writeln!(out, "Runtime: {:.3} s", self.runtime_seconds);
        fs::write(path, out).with_context(|| format!("writing results: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_summary_roundtrips_as_json() {
        let config = Config::default();
        let design = Design::new();
        let cost = Cost::default();
        let summary =
            RunSummary::new("bench", true, &cost, &config, &design, &[], 0, 10, 1.5);
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.json");
        summary.write_json(&path).unwrap();
        let loaded: RunSummary =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(loaded.valid);
        assert_eq!(loaded.temp_steps, 10);
    }
}
