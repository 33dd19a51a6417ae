//! Three-phase simulated annealing over the Corblivar representation.
//!
//! Phase one cools adaptively until a first outline-fitting layout shows up,
//! phase two reheats briefly and then accelerates cooling toward
//! convergence, phase three reheats whenever the average cost stalls across
//! recent temperature steps. The initial temperature comes from the cost
//! standard deviation of a random accept-only-improvements walk.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use strata_core::geometry::std_dev;
use strata_core::{Config, Design};

use crate::corb::CorbRep;
use crate::eval::{Cost, Evaluator};
use crate::ops::{LayoutOp, OpContext};

/// Successful sampling operations per block during initialization.
pub const SAMPLING_LOOP_FACTOR: usize = 2;
/// Temperature steps whose average cost feeds the stall detector.
pub const REHEAT_COST_SAMPLES: usize = 3;
/// Stall threshold: reheat when the stdev of recent step averages drops
/// this low.
pub const REHEAT_STD_DEV_COST_LIMIT: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaPhase {
    /// Adaptive cooling toward the first fitting solution.
    One,
    /// Reheat plus accelerated cooling after the first fitting solution.
    Two,
    /// Brief reheating on convergence stall.
    Three,
}

/// Log record of one temperature step.
#[derive(Debug, Clone)]
pub struct TempStep {
    pub step: usize,
    pub temp: f64,
    pub avg_cost: f64,
    pub cost_best_sol: f64,
    pub new_best_sol_found: bool,
    pub phase: SaPhase,
}

/// The annealing engine; owns the PRNG and the temperature-schedule log.
pub struct Annealer {
    config: Config,
    rng: StdRng,
    pub temp_schedule: Vec<TempStep>,
}

impl Annealer {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            rng: StdRng::seed_from_u64(config.seed),
            temp_schedule: Vec::new(),
        }
    }

    /// Seed the representation with a random initial block distribution,
    /// drawn from the annealer's own PRNG stream.
    pub fn seed_representation(&mut self, design: &Design, rep: &mut CorbRep) {
        rep.init_random(design, &mut self.rng);
    }

    /// Run the annealing search. Returns true when at least one layout fit
    /// the fixed outline; the best CBLs are stored inside `rep`.
    pub fn run(
        &mut self,
        design: &mut Design,
        rep: &mut CorbRep,
        evaluator: &mut Evaluator,
        ops: &mut LayoutOp,
    ) -> bool {
        // floorplacement benchmarks: place the huge macros first, near the
        // lower-left corner, and pin them there during phase one
        if self.config.layout.floorplacement {
            design.flag_floorplacement(self.config.die_area());
            rep.sort_by_area(design);
        }

        let (inner_max, init_temp, samples) = self.init(design, rep, evaluator, ops);
        info!(
            inner_max,
            init_temp,
            cost_std_dev = std_dev(&samples),
            "initial sampling done"
        );

        let align = !design.alignments.is_empty();
        let packing = self.config.layout.packing_iterations;
        let loop_limit = self.config.schedule.loop_limit;

        let mut temp = init_temp;
        let mut phase_two = false;
        let mut valid_layout_found = false;
        let mut i_valid: Option<usize> = None;
        let mut fitting_ratio = 0.0;
        let mut last_fit = false;
        // dummy large value so the first fitting solution is kept, also for
        // degenerate instances whose sampled costs never vary
        let spread = std_dev(&samples);
        let mut best_cost = if spread > 0.0 {
            100.0 * spread
        } else {
            f64::INFINITY
        };

        let mut i = 1;
        while i <= loop_limit {
            let mut ii = 1;
            let mut avg_cost = 0.0;
            let mut accepted = 0usize;
            let mut fit_count = 0usize;
            let mut phase_two_init = false;
            let mut best_sol_found = false;

            // refresh the cost under the current fitting ratio
            rep.generate_layout(design, packing, align && phase_two);
            let cost = evaluator.evaluate(design, fitting_ratio, phase_two, false, false);
            last_fit = cost.fits_outline;
            let mut cur_cost = cost.total;

            while ii <= inner_max {
                let ctx = OpContext {
                    phase_two,
                    last_layout_fit: last_fit,
                    outline_x: self.config.outline_x,
                    outline_y: self.config.outline_y,
                };
                if !ops.perform(rep, design, ctx, &mut self.rng) {
                    // no valid candidate for the drawn operator; retry
                    // without burning an inner step
                    continue;
                }

                let prev_cost = cur_cost;
                rep.generate_layout(design, packing, align && phase_two);
                let cost = evaluator.evaluate(design, fitting_ratio, phase_two, false, false);
                last_fit = cost.fits_outline;
                cur_cost = cost.total;
                let cost_diff = cur_cost - prev_cost;

                let mut accept = true;
                if cost_diff >= 0.0 {
                    let r: f64 = self.rng.gen();
                    if !(temp > 0.0) || r > (-cost_diff / temp).exp() {
                        accept = false;
                        ops.revert(rep, design);
                        cur_cost = prev_cost;
                    }
                }

                if accept {
                    accepted += 1;
                    avg_cost += cur_cost;

                    if cost.fits_outline {
                        if !phase_two {
                            // alignment runs must still fit after enforced
                            // alignment before the phase may switch
                            let mut proceed = true;
                            if align {
                                rep.generate_layout(design, packing, true);
                                let check =
                                    evaluator.evaluate(design, 1.0, false, false, false);
                                proceed = check.fits_outline;
                            }
                            if proceed {
                                phase_two = true;
                                phase_two_init = true;
                                i_valid = Some(i);
                                fit_count += 1;
                                info!(
                                    step = i,
                                    "phase two: optimizing within outline, switching cost function"
                                );
                                // re-capture max cost for the new phase;
                                // ratio 1.0 compares fitting solutions fairly
                                let fitting_cost =
                                    evaluator.evaluate(design, 1.0, true, true, false).total;
                                if fitting_cost < best_cost {
                                    best_cost = fitting_cost;
                                    rep.store_best(design);
                                    valid_layout_found = true;
                                    best_sol_found = true;
                                }
                            }
                        } else {
                            fit_count += 1;
                            let fitting_cost = cost.total_fitting;
                            if fitting_cost < best_cost {
                                best_cost = fitting_cost;
                                rep.store_best(design);
                                valid_layout_found = true;
                                best_sol_found = true;
                            }
                        }
                    }
                }

                // a phase transition invalidates the cost function; restart
                // the temperature step against the new one
                if phase_two_init {
                    break;
                }
                ii += 1;
            }

            if accepted > 0 {
                fitting_ratio = fit_count as f64 / accepted as f64;
                avg_cost /= accepted as f64;
            } else {
                fitting_ratio = 0.0;
            }

            self.temp_schedule.push(TempStep {
                step: i,
                temp,
                avg_cost,
                cost_best_sol: best_cost,
                new_best_sol_found: best_sol_found,
                phase: SaPhase::One,
            });
            let phase = self.update_temp(&mut temp, i, i_valid);
            self.temp_schedule.last_mut().expect("just pushed").phase = phase;

            debug!(
                step = i,
                temp,
                avg_cost,
                fitting_ratio,
                ?phase,
                best = best_sol_found,
                "temperature step done"
            );
            i += 1;
        }

        if !valid_layout_found {
            warn!("no layout fitting the fixed outline was found");
        }
        valid_layout_found
    }

    /// Initial sampling: random walk accepting only improvements, at
    /// temperature zero; the cost spread calibrates the start temperature.
    fn init(
        &mut self,
        design: &mut Design,
        rep: &mut CorbRep,
        evaluator: &mut Evaluator,
        ops: &mut LayoutOp,
    ) -> (usize, f64, Vec<f64>) {
        rep.backup(design);

        let blocks = design.regular_block_count();
        let inner_max = (blocks as f64)
            .powf(self.config.schedule.loop_factor)
            .round()
            .max(1.0) as usize;
        let packing = self.config.layout.packing_iterations;

        rep.generate_layout(design, packing, false);
        let mut cur_cost = evaluator.evaluate(design, 0.0, false, false, false).total;

        let target = SAMPLING_LOOP_FACTOR * blocks;
        let mut samples = Vec::with_capacity(target);
        // pretend a fitting layout exists so the walk explores freely
        // instead of chasing outline violations
        let ctx = OpContext {
            phase_two: false,
            last_layout_fit: true,
            outline_x: self.config.outline_x,
            outline_y: self.config.outline_y,
        };

        while samples.len() < target {
            if !ops.perform(rep, design, ctx, &mut self.rng) {
                continue;
            }
            rep.generate_layout(design, packing, false);
            let cost = evaluator.evaluate(design, 0.0, false, false, false).total;
            if cost - cur_cost > 0.0 {
                ops.revert(rep, design);
            } else {
                cur_cost = cost;
            }
            samples.push(cur_cost);
        }

        let init_temp = std_dev(&samples) * self.config.schedule.temp_init_factor;
        rep.restore(design);
        (inner_max, init_temp, samples)
    }

    /// Temperature update across the three phases; reads the recent
    /// temperature-schedule log for stall detection.
    pub fn update_temp(&self, temp: &mut f64, iteration: usize, i_valid: Option<usize>) -> SaPhase {
        let n = self.temp_schedule.len();
        let std_dev_avg_cost = if n >= REHEAT_COST_SAMPLES {
            let recent: Vec<f64> = self.temp_schedule[n - REHEAT_COST_SAMPLES..]
                .iter()
                .map(|s| s.avg_cost)
                .collect();
            std_dev(&recent)
        } else {
            REHEAT_STD_DEV_COST_LIMIT + 1.0
        };

        let s = &self.config.schedule;

        // brief reheating due to cost convergence
        if std_dev_avg_cost <= REHEAT_STD_DEV_COST_LIMIT {
            *temp *= s.temp_factor_phase3;
            return SaPhase::Three;
        }

        match i_valid {
            // adaptive cooling, slowing from phase1 toward phase1_limit
            None => {
                let ramp = (s.temp_factor_phase1_limit - s.temp_factor_phase1)
                    * (iteration - 1) as f64
                    / (s.loop_limit - 1) as f64;
                *temp *= s.temp_factor_phase1 + ramp;
                SaPhase::One
            }
            // reheat, then cool faster over the remaining iterations
            Some(valid) => {
                let remaining = if s.loop_limit > valid {
                    1.0 - (iteration - valid) as f64 / (s.loop_limit - valid) as f64
                } else {
                    0.0
                };
                *temp *= s.temp_factor_phase2 * remaining;
                SaPhase::Two
            }
        }
    }
}

/// Outcome of the concluding evaluation.
pub struct FinalOutcome {
    /// Whether a fitting best solution was available and applied.
    pub valid: bool,
    pub cost: Cost,
    /// Outline used for the final evaluation (possibly shrunk).
    pub outline: (f64, f64),
}

/// Apply the best CBLs, regenerate, and evaluate with clustering feedback.
///
/// Without a stored best solution the current (non-fitting) CBLs are
/// evaluated anyway so plots and maps of the best effort can be written;
/// the caller suppresses the solution file in that case.
pub fn finalize(
    design: &mut Design,
    rep: &mut CorbRep,
    config: &Config,
) -> (FinalOutcome, Evaluator) {
    let valid = rep.apply_best(design);
    if !valid {
        warn!("finalizing without a fitting solution; emitting best effort");
    }
    rep.generate_layout(
        design,
        config.layout.packing_iterations,
        !design.alignments.is_empty(),
    );

    let mut final_config = config.clone();
    if config.layout.outline_shrink {
        let mut x = 0.0_f64;
        let mut y = 0.0_f64;
        for (_, block) in design.regular_blocks() {
            x = x.max(block.bb.ur.x);
            y = y.max(block.bb.ur.y);
        }
        if x > 0.0 && y > 0.0 {
            final_config.outline_x = x;
            final_config.outline_y = y;
        }
    }

    let mut evaluator = Evaluator::new(&final_config);
    let cost = evaluator.evaluate(design, 1.0, true, true, true);
    (
        FinalOutcome {
            valid,
            cost,
            outline: (final_config.outline_x, final_config.outline_y),
        },
        evaluator,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Block;

    fn small_config(layers: usize, outline: f64, loop_limit: usize) -> Config {
        let mut config = Config {
            layers,
            outline_x: outline,
            outline_y: outline,
            tsv_pitch: 2.0,
            seed: 42,
            ..Config::default()
        };
        config.schedule.loop_limit = loop_limit;
        config
    }

    fn small_design(blocks: usize, w: f64, h: f64) -> Design {
        let mut design = Design::new();
        for i in 0..blocks {
            design.add_block(Block::new(format!("b{i}"), w, h));
        }
        design
    }

    fn run_annealer(config: &Config, design: &mut Design) -> (bool, CorbRep, Vec<TempStep>) {
        let mut rep = CorbRep::new(config.layers);
        let mut annealer = Annealer::new(config);
        rep.init_random(design, &mut StdRng::seed_from_u64(config.seed));
        let mut evaluator = Evaluator::new(config);
        let mut ops = LayoutOp::new(
            config.layout.fix_bias_prob,
            config.layout.floorplacement,
        );
        let valid = annealer.run(design, &mut rep, &mut evaluator, &mut ops);
        (valid, rep, annealer.temp_schedule)
    }

    #[test]
    fn test_finds_fitting_layout_for_easy_instance() {
        let config = small_config(1, 100.0, 40);
        let mut design = small_design(4, 10.0, 10.0);
        let (valid, _, schedule) = run_annealer(&config, &mut design);
        assert!(valid);
        assert!(!schedule.is_empty());
        assert!(schedule.iter().any(|s| s.new_best_sol_found));
    }

    #[test]
    fn test_infeasible_outline_never_fits() {
        // three 10x10 blocks cannot fit a 15x15 die
        let config = small_config(1, 15.0, 20);
        let mut design = small_design(3, 10.0, 10.0);
        let (valid, _, schedule) = run_annealer(&config, &mut design);
        assert!(!valid);
        // best cost keeps reflecting the outline violation
        assert!(schedule.last().unwrap().cost_best_sol > 0.0);
    }

    #[test]
    fn test_determinism_under_fixed_seed() {
        let config = small_config(2, 60.0, 25);
        let mut design_a = small_design(6, 10.0, 8.0);
        let mut design_b = small_design(6, 10.0, 8.0);
        let (_, rep_a, _) = run_annealer(&config, &mut design_a);
        let (_, rep_b, _) = run_annealer(&config, &mut design_b);
        for (da, db) in rep_a.dies.iter().zip(rep_b.dies.iter()) {
            assert_eq!(da.cbl, db.cbl);
        }
        for (a, b) in design_a.blocks.iter().zip(design_b.blocks.iter()) {
            assert_eq!(a.bb, b.bb);
        }
    }

    #[test]
    fn test_reheat_on_cost_stall() {
        let config = small_config(1, 100.0, 20);
        let mut annealer = Annealer::new(&config);
        // feed a stalled schedule: identical averages across the window
        for step in 1..=REHEAT_COST_SAMPLES {
            annealer.temp_schedule.push(TempStep {
                step,
                temp: 10.0,
                avg_cost: 5.0,
                cost_best_sol: 5.0,
                new_best_sol_found: false,
                phase: SaPhase::One,
            });
        }
        let mut temp = 10.0;
        let phase = annealer.update_temp(&mut temp, REHEAT_COST_SAMPLES + 1, None);
        assert_eq!(phase, SaPhase::Three);
        assert!(temp > 10.0);
    }

    #[test]
    fn test_phase_one_cooling_slows_down() {
        let config = small_config(1, 100.0, 100);
        let annealer = Annealer::new(&config);
        let mut early = 10.0;
        let mut late = 10.0;
        annealer.update_temp(&mut early, 2, None);
        annealer.update_temp(&mut late, 99, None);
        // the cooling factor ramps toward phase1_limit, so late steps
        // retain more temperature
        assert!(late > early);
    }

    #[test]
    fn test_phase_two_converges_to_zero() {
        let config = small_config(1, 100.0, 50);
        let annealer = Annealer::new(&config);
        let mut temp = 10.0;
        let phase = annealer.update_temp(&mut temp, 50, Some(10));
        assert_eq!(phase, SaPhase::Two);
        assert!(temp.abs() < 1e-9);
    }

    #[test]
    fn test_finalize_applies_best() {
        let config = small_config(1, 100.0, 30);
        let mut design = small_design(4, 10.0, 10.0);
        let mut rep = CorbRep::new(config.layers);
        rep.init_random(&mut design, &mut StdRng::seed_from_u64(config.seed));
        let mut annealer = Annealer::new(&config);
        let mut evaluator = Evaluator::new(&config);
        let mut ops = LayoutOp::new(0.9, true);
        let valid = annealer.run(&mut design, &mut rep, &mut evaluator, &mut ops);
        assert!(valid);

        let (outcome, _) = finalize(&mut design, &mut rep, &config);
        assert!(outcome.valid);
        assert!(outcome.cost.fits_outline);
    }
}
