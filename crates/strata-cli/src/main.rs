use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use strata_algo::{finalize, Annealer, CorbRep, Evaluator, LayoutOp};
use strata_core::{Config, Design};
use strata_io::exporters::{
    write_floorplan_scripts, write_hotspot_files, write_maps, write_solution_file,
    write_temp_schedule, RunSummary,
};
use strata_io::importers::{read_solution_file, BenchmarkPaths};

mod cli;
use cli::Cli;

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        tracing::Level::WARN
    } else {
        match cli.verbose {
            0 => tracing::Level::INFO,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            if cli.strict {
                error!("no layout fitting the fixed outline was found within the step budget");
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> Result<bool> {
    let start = Instant::now();
    let name = cli.benchmark_name();
    info!(benchmark = %name, started = %chrono::Local::now().format("%Y-%m-%d %H:%M:%S"), "strata run");

    let config = strata_io::load_config(&cli.config)?;
    let paths = BenchmarkPaths {
        blocks: cli.blocks.clone(),
        nets: cli.nets.clone(),
        power: cli.power.clone(),
        pins: cli.pins.clone(),
        alignments: cli.alignments.clone(),
    };
    let mut design = strata_io::load_design(&paths)?;
    design
        .validate(&config)
        .context("validating benchmark against config")?;

    std::fs::create_dir_all(&cli.out)
        .with_context(|| format!("creating output directory: {}", cli.out.display()))?;

    let mut annealer = Annealer::new(&config);
    let mut rep;

    if let Some(solution) = &cli.solution_in {
        info!(solution = %solution.display(), "replaying solution file, skipping annealing");
        rep = read_solution_file(solution, &mut design)?;
        if rep.dies.len() != config.layers {
            anyhow::bail!(
                "solution has {} dies, config specifies {} layers",
                rep.dies.len(),
                config.layers
            );
        }
        rep.store_best(&design);
    } else {
        rep = CorbRep::new(config.layers);
        annealer.seed_representation(&design, &mut rep);
        let mut evaluator = Evaluator::new(&config);
        let mut ops = LayoutOp::new(config.layout.fix_bias_prob, config.layout.floorplacement);
        annealer.run(&mut design, &mut rep, &mut evaluator, &mut ops);
    }

    let (outcome, evaluator) = finalize(&mut design, &mut rep, &config);

    write_outputs(
        cli,
        &name,
        &config,
        &design,
        &rep,
        &annealer,
        &outcome,
        &evaluator,
        start,
    )?;

    info!(
        valid = outcome.valid,
        cost = outcome.cost.total,
        runtime_s = start.elapsed().as_secs_f64(),
        "done"
    );
    Ok(outcome.valid)
}

#[allow(clippy::too_many_arguments)]
fn write_outputs(
    cli: &Cli,
    name: &str,
    config: &Config,
    design: &Design,
    rep: &CorbRep,
    annealer: &Annealer,
    outcome: &strata_algo::FinalOutcome,
    evaluator: &Evaluator,
    start: Instant,
) -> Result<()> {
    let out: &Path = &cli.out;

    // the outline may have been shrunk for the final evaluation
    let mut final_config = config.clone();
    final_config.outline_x = outcome.outline.0;
    final_config.outline_y = outcome.outline.1;

    if !annealer.temp_schedule.is_empty() {
        write_temp_schedule(&out.join(format!("{name}_schedule.tsv")), &annealer.temp_schedule)?;
    }

    write_floorplan_scripts(out, name, design, &evaluator.islands, &final_config)?;

    // the solution file documents a fitting layout only
    if outcome.valid {
        write_solution_file(&out.join(format!("{name}.solution")), design, rep)?;
    } else {
        info!("suppressing solution file: no fitting layout");
    }

    // thermal-analysis outputs need power data to mean anything
    if cli.power.is_some() {
        write_hotspot_files(out, name, design, &final_config)?;
        write_maps(
            out,
            name,
            evaluator.thermal_analyzer(),
            evaluator.last_thermal(),
            evaluator.routing_utilization(),
            &evaluator.islands,
            &final_config,
        )?;
    }

    let summary = RunSummary::new(
        name,
        outcome.valid,
        &outcome.cost,
        &final_config,
        design,
        &evaluator.islands,
        evaluator.hotspots.len(),
        annealer.temp_schedule.len(),
        start.elapsed().as_secs_f64(),
    );
    summary.write_json(&out.join(format!("{name}_summary.json")))?;
    summary.write_results(&out.join(format!("{name}_results.txt")))?;
    Ok(())
}
