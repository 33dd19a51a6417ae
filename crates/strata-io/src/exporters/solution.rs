//! Corblivar solution-file writer.
//!
//! Format, one section per die:
//!
//! ```text
//! CBL [ 0 ]
//! ( bk1 , 0 , 0 , 336.000000 , 133.000000 ) ; ( bk2 , 1 , 2 , 20.000000 , 10.000000 )
//! ```
//!
//! Direction codes: 0 horizontal, 1 vertical. Width and height are recorded
//! so rotations and soft-block shapes survive the round trip.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use strata_algo::corb::{CblDirection, CorbRep};
use strata_core::Design;

pub fn write_solution_file(path: &Path, design: &Design, rep: &CorbRep) -> Result<()> {
    fs::write(path, solution_string(design, rep))
        .with_context(|| format!("writing solution file: {}", path.display()))
}

pub fn solution_string(design: &Design, rep: &CorbRep) -> String {
    let mut out = String::new();
    for die in &rep.dies {
        let _ = writeln!(out, "CBL [ {} ]", die.id);
        let tuples: Vec<String> = die
            .cbl
            .iter()
            .map(|entry| {
                let block = &design.blocks[entry.block.value()];
                let dir = match entry.dir {
                    CblDirection::Horizontal => 0,
                    CblDirection::Vertical => 1,
                };
                format!(
                    "( {} , {} , {} , {:.6} , {:.6} )",
                    block.name, dir, entry.junctions, block.bb.w, block.bb.h
                )
            })
            .collect();
        let _ = writeln!(out, "{}", tuples.join(" ; "));
    }
    out
}
