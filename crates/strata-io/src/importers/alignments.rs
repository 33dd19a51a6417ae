//! Alignment-requests file parser.
//!
//! One request per line:
//!
//! ```text
//! s_i s_j type_x value_x type_y value_y signals
//! ```
//!
//! with types `range`, `offset` or `undef`. `RBOD` names the on-die anchor
//! for fixed-offset placement requests.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisKind {
    Range,
    Offset,
    Undef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRecord {
    pub a: String,
    pub b: String,
    pub x: (AxisKind, f64),
    pub y: (AxisKind, f64),
    pub signals: usize,
}

pub fn parse_alignments_file(path: &Path) -> Result<Vec<AlignmentRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading alignments file: {}", path.display()))?;
    parse_alignments_str(&content)
}

pub fn parse_alignments_str(content: &str) -> Result<Vec<AlignmentRecord>> {
    let mut records = Vec::new();
    for (lineno, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 7 {
            bail!(
                "line {}: expected 's_i s_j type_x value_x type_y value_y signals'",
                lineno + 1
            );
        }
        let axis = |kind: &str, value: &str| -> Result<(AxisKind, f64)> {
            let kind = match kind {
                "range" => AxisKind::Range,
                "offset" => AxisKind::Offset,
                "undef" => AxisKind::Undef,
                other => bail!("line {}: unknown axis type '{}'", lineno + 1, other),
            };
            let value: f64 = value
                .parse()
                .with_context(|| format!("line {}: bad axis value", lineno + 1))?;
            Ok((kind, value))
        };
        let signals: usize = tokens[6]
            .parse()
            .with_context(|| format!("line {}: bad signal count", lineno + 1))?;
        if signals == 0 {
            bail!("line {}: alignment with zero signals", lineno + 1);
        }
        if tokens[0] == tokens[1] {
            bail!("line {}: request pairs '{}' with itself", lineno + 1, tokens[0]);
        }
        records.push(AlignmentRecord {
            a: tokens[0].to_string(),
            b: tokens[1].to_string(),
            x: axis(tokens[2], tokens[3])?,
            y: axis(tokens[4], tokens[5])?,
            signals,
        });
    }
    Ok(records)
}

/// Map a parsed axis onto the core representation.
pub fn to_axis_spec(axis: (AxisKind, f64)) -> strata_core::AxisSpec {
    match axis.0 {
        AxisKind::Range => strata_core::AxisSpec::Range(axis.1),
        AxisKind::Offset => strata_core::AxisSpec::Offset(axis.1),
        AxisKind::Undef => strata_core::AxisSpec::Undef,
    }
}
