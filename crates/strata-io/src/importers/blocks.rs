//! GSRC-style blocks file parser.
//!
//! Supports the n-sets flavor: `NumHardRectilinearBlocks` /
//! `NumSoftRectangularBlocks` / `NumTerminals` counts followed by records of
//! the forms
//!
//! ```text
//! bk1 hardrectilinear 4 (0, 0) (0, 133) (336, 133) (336, 0)
//! sb2 softrectangular 10000 0.5 2.0
//! p7 terminal
//! ```

use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::path::Path;

/// One parsed blocks-file record.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockRecord {
    Hard { name: String, w: f64, h: f64 },
    Soft { name: String, area: f64, ar_min: f64, ar_max: f64 },
    Terminal { name: String },
}

impl BlockRecord {
    pub fn name(&self) -> &str {
        match self {
            BlockRecord::Hard { name, .. }
            | BlockRecord::Soft { name, .. }
            | BlockRecord::Terminal { name } => name,
        }
    }
}

pub fn parse_blocks_file(path: &Path) -> Result<Vec<BlockRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading blocks file: {}", path.display()))?;
    parse_blocks_str(&content)
}

pub fn parse_blocks_str(content: &str) -> Result<Vec<BlockRecord>> {
    let mut records = Vec::new();

    for (lineno, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty()
            || line.starts_with('#')
            || line.starts_with("UCSC")
            || line.starts_with("UCLA")
        {
            continue;
        }
        // count headers carry no record data
        if line.starts_with("Num") {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let name = tokens
            .next()
            .ok_or_else(|| anyhow!("line {}: missing block name", lineno + 1))?
            .to_string();
        let kind = tokens.next().unwrap_or_default();

        match kind {
            "hardrectilinear" => {
                let corners: usize = tokens
                    .next()
                    .ok_or_else(|| anyhow!("line {}: missing corner count", lineno + 1))?
                    .parse()
                    .with_context(|| format!("line {}: bad corner count", lineno + 1))?;
                if corners != 4 {
                    bail!(
                        "line {}: only rectangular blocks (4 corners) are supported, got {}",
                        lineno + 1,
                        corners
                    );
                }
                let rest: String = tokens.collect::<Vec<_>>().join(" ");
                let points = parse_points(&rest)
                    .with_context(|| format!("line {}: bad corner list", lineno + 1))?;
                if points.len() != 4 {
                    bail!("line {}: expected 4 corners, got {}", lineno + 1, points.len());
                }
                let w = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
                let h = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
                if w <= 0.0 || h <= 0.0 {
                    bail!("line {}: block '{}' has a degenerate outline", lineno + 1, name);
                }
                records.push(BlockRecord::Hard { name, w, h });
            }
            "softrectangular" => {
                let mut next_f64 = |what: &str| -> Result<f64> {
                    tokens
                        .next()
                        .ok_or_else(|| anyhow!("line {}: missing {what}", lineno + 1))?
                        .parse()
                        .with_context(|| format!("line {}: bad {what}", lineno + 1))
                };
                let area = next_f64("area")?;
                let ar_min = next_f64("min aspect ratio")?;
                let ar_max = next_f64("max aspect ratio")?;
                if area <= 0.0 || ar_min <= 0.0 || ar_max < ar_min {
                    bail!("line {}: invalid soft block '{}'", lineno + 1, name);
                }
                records.push(BlockRecord::Soft { name, area, ar_min, ar_max });
            }
            "terminal" => {
                records.push(BlockRecord::Terminal { name });
            }
            other => {
                bail!("line {}: unknown block type '{}'", lineno + 1, other);
            }
        }
    }

    if records.is_empty() {
        bail!("blocks file contains no records");
    }
    Ok(records)
}

/// Parse a `(x, y) (x, y) ...` corner list.
fn parse_points(s: &str) -> Result<Vec<(f64, f64)>> {
    let mut points = Vec::new();
    for group in s.split(')') {
        let group = group.trim().trim_start_matches('(').trim();
        if group.is_empty() {
            continue;
        }
        let (x, y) = group
            .split_once(',')
            .ok_or_else(|| anyhow!("malformed corner '{}'", group))?;
        points.push((x.trim().parse()?, y.trim().parse()?));
    }
    Ok(points)
}

/// Parse a power file: one density per line, blocks-file order.
pub fn parse_power_file(path: &Path) -> Result<Vec<f64>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading power file: {}", path.display()))?;
    parse_power_str(&content)
}

pub fn parse_power_str(content: &str) -> Result<Vec<f64>> {
    let mut densities = Vec::new();
    for (lineno, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        // tolerate `name value` pairs by taking the last token
        let token = line.split_whitespace().last().unwrap();
        let value: f64 = token
            .parse()
            .with_context(|| format!("line {}: bad power density '{token}'", lineno + 1))?;
        if value < 0.0 {
            bail!("line {}: negative power density", lineno + 1);
        }
        densities.push(value);
    }
    Ok(densities)
}
