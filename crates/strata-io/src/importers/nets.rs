//! GSRC-style nets file parser.
//!
//! `NetDegree : k` headers followed by `k` identifiers, one per line; extra
//! per-pin tokens (pin directions, offsets) are tolerated and ignored.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// One parsed net: the identifiers it connects, blocks and pins mixed.
#[derive(Debug, Clone, PartialEq)]
pub struct NetRecord {
    pub name: String,
    pub members: Vec<String>,
}

pub fn parse_nets_file(path: &Path) -> Result<Vec<NetRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading nets file: {}", path.display()))?;
    parse_nets_str(&content)
}

pub fn parse_nets_str(content: &str) -> Result<Vec<NetRecord>> {
    let mut nets: Vec<NetRecord> = Vec::new();
    let mut expected: usize = 0;

    for (lineno, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("UCLA") {
            continue;
        }
        if let Some(rest) = line.strip_prefix("NetDegree") {
            if expected > 0 {
                bail!(
                    "line {}: previous net '{}' is short {} member(s)",
                    lineno + 1,
                    nets.last().map(|n| n.name.as_str()).unwrap_or("?"),
                    expected
                );
            }
            let degree: usize = rest
                .trim_start_matches(':')
                .trim()
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .parse()
                .with_context(|| format!("line {}: bad net degree", lineno + 1))?;
            if degree == 0 {
                bail!("line {}: zero-degree net", lineno + 1);
            }
            expected = degree;
            nets.push(NetRecord {
                name: format!("n{}", nets.len()),
                members: Vec::with_capacity(degree),
            });
            continue;
        }
        if line.starts_with("NumNets") || line.starts_with("NumPins") {
            continue;
        }

        if expected == 0 {
            bail!("line {}: member '{}' outside any net", lineno + 1, line);
        }
        let member = line.split_whitespace().next().unwrap().to_string();
        nets.last_mut().unwrap().members.push(member);
        expected -= 1;
    }

    if expected > 0 {
        bail!("nets file ends mid-net");
    }
    Ok(nets)
}
