//! Benchmark importers: line-oriented parsers plus the assembly of a
//! [`Design`] from the parsed records.

pub mod alignments;
pub mod blocks;
pub mod nets;
pub mod pins;
pub mod solution;

pub use alignments::{parse_alignments_file, parse_alignments_str, AlignmentRecord};
pub use blocks::{parse_blocks_file, parse_blocks_str, parse_power_file, BlockRecord};
pub use nets::{parse_nets_file, parse_nets_str, NetRecord};
pub use pins::{parse_pins_file, parse_pins_str, PinRecord};
pub use solution::read_solution_file;

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use tracing::{info, warn};

use strata_core::block::{ArRange, Block};
use strata_core::{AlignmentReq, BlockId, Design, Net};

/// Input file set of one floorplanning run; only blocks and nets are
/// mandatory.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkPaths {
    pub blocks: PathBuf,
    pub nets: PathBuf,
    pub power: Option<PathBuf>,
    pub pins: Option<PathBuf>,
    pub alignments: Option<PathBuf>,
}

/// Parse all benchmark files and assemble the design instance.
pub fn load_design(paths: &BenchmarkPaths) -> Result<Design> {
    let block_records = parse_blocks_file(&paths.blocks)?;
    let net_records = parse_nets_file(&paths.nets)?;
    let pin_records = match &paths.pins {
        Some(path) => parse_pins_file(path)?,
        None => Vec::new(),
    };
    let alignment_records = match &paths.alignments {
        Some(path) => parse_alignments_file(path)?,
        None => Vec::new(),
    };
    let power = match &paths.power {
        Some(path) => Some(parse_power_file(path)?),
        None => {
            warn!("no power file given; thermal analysis sees zero power");
            None
        }
    };

    build_design(
        &block_records,
        &net_records,
        &pin_records,
        &alignment_records,
        power.as_deref(),
    )
}

/// Assemble a [`Design`] from parsed records; all name references are
/// resolved here, and conflicts are rejected.
pub fn build_design(
    block_records: &[BlockRecord],
    net_records: &[NetRecord],
    pin_records: &[PinRecord],
    alignment_records: &[AlignmentRecord],
    power: Option<&[f64]>,
) -> Result<Design> {
    let mut design = Design::new();
    let mut by_name: HashMap<String, BlockId> = HashMap::new();
    by_name.insert(Block::RBOD_NAME.to_string(), design.rbod());

    let pin_coords: HashMap<&str, (f64, f64)> = pin_records
        .iter()
        .map(|p| (p.name.as_str(), (p.x, p.y)))
        .collect();

    let mut placeable = 0usize;
    for record in block_records {
        let block = match record {
            BlockRecord::Hard { name, w, h } => {
                placeable += 1;
                Block::new(name.clone(), *w, *h)
            }
            BlockRecord::Soft { name, area, ar_min, ar_max } => {
                placeable += 1;
                Block::new_soft(name.clone(), *area, ArRange { min: *ar_min, max: *ar_max })
            }
            BlockRecord::Terminal { name } => {
                let (x, y) = pin_coords.get(name.as_str()).copied().unwrap_or_else(|| {
                    warn!(pin = %name, "terminal without coordinates; assuming the origin");
                    (0.0, 0.0)
                });
                Block::new_pin(name.clone(), x, y)
            }
        };
        let name = block.name.clone();
        let id = design.add_block(block);
        if by_name.insert(name.clone(), id).is_some() {
            bail!("duplicate block name '{name}'");
        }
    }

    // pins file may introduce terminals the blocks file never declared
    for pin in pin_records {
        if !by_name.contains_key(pin.name.as_str()) {
            let id = design.add_block(Block::new_pin(pin.name.clone(), pin.x, pin.y));
            by_name.insert(pin.name.clone(), id);
        }
    }

    if let Some(densities) = power {
        if densities.len() != placeable {
            bail!(
                "power file lists {} values for {} placeable blocks",
                densities.len(),
                placeable
            );
        }
        let mut it = densities.iter();
        for block in design.blocks.iter_mut().filter(|b| b.is_regular()) {
            block.power_density = *it.next().expect("length checked above");
        }
    }

    for record in net_records {
        let mut net = Net::new(record.name.clone());
        for member in &record.members {
            let id = *by_name
                .get(member.as_str())
                .ok_or_else(|| anyhow!("net '{}' references unknown block '{member}'", record.name))?;
            if design.blocks[id.value()].is_regular() {
                net.blocks.push(id);
            } else {
                net.pins.push(id);
            }
        }
        if net.blocks.is_empty() {
            warn!(net = %record.name, "net connects no placeable block; dropped");
            continue;
        }
        design.nets.push(net);
    }

    for record in alignment_records {
        let resolve = |name: &str| -> Result<BlockId> {
            by_name
                .get(name)
                .copied()
                .ok_or_else(|| anyhow!("alignment references unknown block '{name}'"))
        };
        design.alignments.push(AlignmentReq::new(
            resolve(&record.a)?,
            resolve(&record.b)?,
            alignments::to_axis_spec(record.x),
            alignments::to_axis_spec(record.y),
            record.signals,
        ));
    }

    info!(
        blocks = placeable,
        nets = design.nets.len(),
        alignments = design.alignments.len(),
        "benchmark loaded"
    );
    Ok(design)
}

/// Convenience wrapper used by tests and the solution-replay path.
pub fn load_design_from_strs(
    blocks: &str,
    nets: &str,
    power: Option<&str>,
) -> Result<Design> {
    let block_records = parse_blocks_str(blocks)?;
    let net_records = parse_nets_str(nets)?;
    let power = match power {
        Some(content) => Some(blocks::parse_power_str(content)?),
        None => None,
    };
    build_design(&block_records, &net_records, &[], &[], power.as_deref())
}
