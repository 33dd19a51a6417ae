//! Run configuration.
//!
//! One immutable [`Config`] value is built from the TOML config file and
//! passed by reference through every component; there are no process-wide
//! settings. [`Config::validate`] enforces the constraints that turn into
//! exit code 1 when violated.

use serde::{Deserialize, Serialize};

use crate::error::{StrataError, StrataResult};

/// Annealing schedule parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Inner-loop exponent: `inner_max = blocks^loop_factor`.
    pub loop_factor: f64,
    /// Upper limit of outer temperature steps.
    pub loop_limit: usize,
    /// Initial temperature = stdev of sampled costs * this factor.
    pub temp_init_factor: f64,
    /// Phase-1 cooling factor at the first step.
    pub temp_factor_phase1: f64,
    /// Phase-1 cooling factor approached at the last step.
    pub temp_factor_phase1_limit: f64,
    /// Phase-2 base factor; > 1 reheats initially, the schedule scales it
    /// down over the remaining steps.
    pub temp_factor_phase2: f64,
    /// Phase-3 reheat factor applied on cost-convergence stalls.
    pub temp_factor_phase3: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            loop_factor: 4.0 / 3.0,
            loop_limit: 300,
            temp_init_factor: 20.0,
            temp_factor_phase1: 0.5,
            temp_factor_phase1_limit: 0.9,
            temp_factor_phase2: 1.1,
            temp_factor_phase3: 1.5,
        }
    }
}

/// Weights of the phase-2 cost terms; should sum to 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CostWeights {
    pub wirelength: f64,
    pub routing_util: f64,
    pub tsvs: f64,
    pub alignment: f64,
    pub thermal: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            wirelength: 0.4,
            routing_util: 0.1,
            tsvs: 0.2,
            alignment: 0.1,
            thermal: 0.2,
        }
    }
}

/// Power-blurring parameters for the thermal analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalConfig {
    /// Odd edge length of the blurring masks, in grid cells.
    pub mask_dim: usize,
    /// Peak impulse response of the lowest layer's mask.
    pub impulse_factor: f64,
    /// Per-layer decay of the impulse response.
    pub impulse_scaling: f64,
    /// Mask value at the mask boundary; fixes the Gaussian spread.
    pub mask_boundary_value: f64,
    /// Ambient temperature offset in K.
    pub ambient_temp: f64,
    /// Fractional power reduction under a fully TSV-covered cell.
    pub tsv_cooling_factor: f64,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            mask_dim: 7,
            impulse_factor: 1.0,
            impulse_scaling: 2.0,
            mask_boundary_value: 0.05,
            ambient_temp: 293.0,
            tsv_cooling_factor: 0.5,
        }
    }
}

/// Layout-generation and operator parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Packing sweeps per axis after each generation.
    pub packing_iterations: usize,
    /// Cluster signal TSVs into islands instead of dummy per-net vias.
    pub signal_tsv_clustering: bool,
    /// Handle oversized macros by pre-sorting and phase-1 pinning.
    pub floorplacement: bool,
    /// Shrink the fixed outline to the final layout before the concluding
    /// evaluation.
    pub outline_shrink: bool,
    /// Probability of biasing an operator onto the outline-violating block
    /// while no fitting layout exists.
    pub fix_bias_prob: f64,
    /// Estimate wirelength with one global bounding box per net instead of
    /// per-layer boxes; for comparison against other 3D floorplanners.
    pub trivial_hpwl: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            packing_iterations: 2,
            signal_tsv_clustering: true,
            floorplacement: true,
            outline_shrink: false,
            fix_bias_prob: 0.9,
            trivial_hpwl: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dies in the stack.
    pub layers: usize,
    /// Fixed die outline, x-dimension in um.
    pub outline_x: f64,
    /// Fixed die outline, y-dimension in um.
    pub outline_y: f64,
    /// TSV pitch in um.
    pub tsv_pitch: f64,
    /// Die thickness in um; TSV length contribution to wirelength.
    pub die_thickness: f64,
    /// Bonding-layer thickness in um.
    pub bond_thickness: f64,
    pub schedule: ScheduleConfig,
    pub weights: CostWeights,
    pub thermal: ThermalConfig,
    pub layout: LayoutConfig,
    /// PRNG seed; identical seed and inputs reproduce the run exactly.
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layers: 2,
            outline_x: 1000.0,
            outline_y: 1000.0,
            tsv_pitch: 10.0,
            die_thickness: 50.0,
            bond_thickness: 10.0,
            schedule: ScheduleConfig::default(),
            weights: CostWeights::default(),
            thermal: ThermalConfig::default(),
            layout: LayoutConfig::default(),
            seed: 0,
        }
    }
}

impl Config {
    /// Target aspect ratio of the fixed outline.
    pub fn outline_ar(&self) -> f64 {
        self.outline_x / self.outline_y
    }

    /// Area of one die.
    pub fn die_area(&self) -> f64 {
        self.outline_x * self.outline_y
    }

    /// Area of the whole stack.
    pub fn stack_area(&self) -> f64 {
        self.die_area() * self.layers as f64
    }

    pub fn validate(&self) -> StrataResult<()> {
        if self.layers == 0 {
            return Err(StrataError::Config("layer count must be at least 1".into()));
        }
        if self.outline_x <= 0.0 || self.outline_y <= 0.0 {
            return Err(StrataError::Config("die outline must be positive".into()));
        }
        if self.tsv_pitch <= 0.0 {
            return Err(StrataError::Config("TSV pitch must be positive".into()));
        }
        if self.layout.signal_tsv_clustering && self.layers == 0 {
            return Err(StrataError::Config(
                "TSV clustering requires a layered stack".into(),
            ));
        }

        let s = &self.schedule;
        if s.loop_limit < 2 {
            return Err(StrataError::Config("loop_limit must be at least 2".into()));
        }
        if s.loop_factor <= 0.0 {
            return Err(StrataError::Config("loop_factor must be positive".into()));
        }
        if !(0.0 < s.temp_factor_phase1 && s.temp_factor_phase1 < 1.0) {
            return Err(StrataError::Config(
                "phase-1 cooling factor must lie in (0, 1)".into(),
            ));
        }
        if s.temp_factor_phase1_limit <= s.temp_factor_phase1 || s.temp_factor_phase1_limit >= 1.0 {
            return Err(StrataError::Config(
                "phase-1 cooling limit must lie in (temp_factor_phase1, 1)".into(),
            ));
        }
        if s.temp_factor_phase2 <= 0.0 {
            return Err(StrataError::Config(
                "phase-2 factor must be positive".into(),
            ));
        }
        if s.temp_factor_phase3 <= 1.0 {
            return Err(StrataError::Config(
                "phase-3 reheat factor must exceed 1".into(),
            ));
        }

        let w = &self.weights;
        for (name, value) in [
            ("wirelength", w.wirelength),
            ("routing_util", w.routing_util),
            ("tsvs", w.tsvs),
            ("alignment", w.alignment),
            ("thermal", w.thermal),
        ] {
            if value < 0.0 {
                return Err(StrataError::Config(format!(
                    "cost weight '{name}' must not be negative"
                )));
            }
        }

        if self.thermal.mask_dim % 2 == 0 || self.thermal.mask_dim < 3 {
            return Err(StrataError::Config(
                "thermal mask dimension must be odd and at least 3".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.layout.fix_bias_prob) {
            return Err(StrataError::Config(
                "fix_bias_prob must lie in [0, 1]".into(),
            ));
        }

        Ok(())
    }
}
