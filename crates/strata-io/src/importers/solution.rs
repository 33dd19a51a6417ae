//! Corblivar solution-file reader.
//!
//! Re-loads a written solution (see the matching exporter) so a finished
//! run can be reproduced without annealing: the CBLs define the packing
//! order, the stored dimensions pin down rotations and soft-block shapes.

use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::path::Path;

use strata_algo::corb::{CblDirection, CblEntry, CorbRep};
use strata_core::Design;

/// Parse a solution file back into a representation over `design`.
///
/// The die count follows from the number of `CBL [ d ]` sections; block
/// dimensions in the tuples are applied to the design's blocks.
pub fn read_solution_file(path: &Path, design: &mut Design) -> Result<CorbRep> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading solution file: {}", path.display()))?;
    read_solution_str(&content, design)
}

pub fn read_solution_str(content: &str, design: &mut Design) -> Result<CorbRep> {
    let mut cbls: Vec<Vec<CblEntry>> = Vec::new();

    for (lineno, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with("CBL") {
            cbls.push(Vec::new());
            continue;
        }
        let die = cbls
            .last_mut()
            .ok_or_else(|| anyhow!("line {}: tuple before any CBL header", lineno + 1))?;

        for tuple in line.split(';') {
            let tuple = tuple.trim().trim_start_matches('(').trim_end_matches(')');
            if tuple.is_empty() {
                continue;
            }
            let fields: Vec<&str> = tuple.split(',').map(str::trim).collect();
            if fields.len() != 5 {
                bail!("line {}: malformed tuple '({tuple})'", lineno + 1);
            }
            let name = fields[0];
            let id = design
                .find_block(name)
                .ok_or_else(|| anyhow!("line {}: unknown block '{name}'", lineno + 1))?;
            let dir = match fields[1] {
                "0" => CblDirection::Horizontal,
                "1" => CblDirection::Vertical,
                other => bail!("line {}: bad direction code '{other}'", lineno + 1),
            };
            let junctions: usize = fields[2]
                .parse()
                .with_context(|| format!("line {}: bad junction count", lineno + 1))?;
            let w: f64 = fields[3]
                .parse()
                .with_context(|| format!("line {}: bad width", lineno + 1))?;
            let h: f64 = fields[4]
                .parse()
                .with_context(|| format!("line {}: bad height", lineno + 1))?;

            design.blocks[id.value()].bb.resize(w, h);
            die.push(CblEntry { block: id, dir, junctions });
        }
    }

    if cbls.is_empty() {
        bail!("solution file contains no CBL section");
    }

    // every placeable block must appear exactly once across all dies
    let mut seen = std::collections::HashSet::new();
    for cbl in &cbls {
        for entry in cbl {
            if !seen.insert(entry.block) {
                bail!(
                    "block '{}' appears twice in the solution",
                    design.blocks[entry.block.value()].name
                );
            }
        }
    }
    if seen.len() != design.regular_block_count() {
        bail!(
            "solution covers {} blocks, the design has {}",
            seen.len(),
            design.regular_block_count()
        );
    }

    let mut rep = CorbRep::new(cbls.len());
    for (die, cbl) in rep.dies.iter_mut().zip(cbls.into_iter()) {
        die.cbl = cbl;
    }
    Ok(rep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Block;

    fn design() -> Design {
        let mut design = Design::new();
        design.add_block(Block::new("a", 10.0, 10.0));
        design.add_block(Block::new("b", 12.0, 6.0));
        design
    }

    #[test]
    fn test_read_two_die_solution() {
        let mut design = design();
        let content = "\
CBL [ 0 ]
( a , 0 , 0 , 10.000000 , 10.000000 )
CBL [ 1 ]
( b , 1 , 2 , 6.000000 , 12.000000 )
";
        let rep = read_solution_str(content, &mut design).unwrap();
        assert_eq!(rep.dies.len(), 2);
        assert_eq!(rep.dies[0].cbl.len(), 1);
        assert_eq!(rep.dies[1].cbl[0].junctions, 2);
        assert_eq!(rep.dies[1].cbl[0].dir, CblDirection::Vertical);
        // stored dimensions override the benchmark's (b was rotated)
        assert_eq!(design.blocks[2].bb.w, 6.0);
    }

    #[test]
    fn test_rejects_missing_block() {
        let mut design = design();
        let content = "CBL [ 0 ]\n( a , 0 , 0 , 10 , 10 )\n";
        assert!(read_solution_str(content, &mut design).is_err());
    }

    #[test]
    fn test_rejects_duplicate_block() {
        let mut design = design();
        let content = "CBL [ 0 ]\n( a , 0 , 0 , 10 , 10 ) ; ( a , 0 , 0 , 10 , 10 )\n";
        assert!(read_solution_str(content, &mut design).is_err());
    }
}
