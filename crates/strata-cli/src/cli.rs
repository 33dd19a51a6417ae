//! Command-line definition for the `strata` binary.

use clap::Parser;
use std::path::PathBuf;

/// 3D-IC floorplanner: simulated annealing over multi-die corner block
/// lists, with thermal-aware TSV planning.
#[derive(Debug, Parser)]
#[command(name = "strata", version, about)]
pub struct Cli {
    /// TOML run configuration
    #[arg(short, long)]
    pub config: PathBuf,

    /// GSRC-style blocks file
    #[arg(long)]
    pub blocks: PathBuf,

    /// Nets file (NetDegree records)
    #[arg(long)]
    pub nets: PathBuf,

    /// Power-density file, one value per block
    #[arg(long)]
    pub power: Option<PathBuf>,

    /// Terminal-pin coordinates file
    #[arg(long)]
    pub pins: Option<PathBuf>,

    /// Alignment-requests file
    #[arg(long)]
    pub alignments: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// Benchmark name used as output-file prefix; defaults to the
    /// blocks-file stem
    #[arg(long)]
    pub name: Option<String>,

    /// Replay a previously written solution file instead of annealing
    #[arg(long)]
    pub solution_in: Option<PathBuf>,

    /// Exit with status 2 when no layout fits the fixed outline
    #[arg(long)]
    pub strict: bool,

    /// Suppress all but warnings
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn benchmark_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.blocks
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "floorplan".to_string())
        })
    }
}
