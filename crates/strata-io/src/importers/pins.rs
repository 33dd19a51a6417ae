//! Terminal-pin coordinates file: `name x y` per line.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct PinRecord {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

pub fn parse_pins_file(path: &Path) -> Result<Vec<PinRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading pins file: {}", path.display()))?;
    parse_pins_str(&content)
}

pub fn parse_pins_str(content: &str) -> Result<Vec<PinRecord>> {
    let mut pins = Vec::new();
    for (lineno, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 3 {
            bail!("line {}: expected 'name x y', got '{}'", lineno + 1, line);
        }
        let x: f64 = tokens[1]
            .parse()
            .with_context(|| format!("line {}: bad x coordinate", lineno + 1))?;
        let y: f64 = tokens[2]
            .parse()
            .with_context(|| format!("line {}: bad y coordinate", lineno + 1))?;
        pins.push(PinRecord {
            name: tokens[0].to_string(),
            x,
            y,
        });
    }
    Ok(pins)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pins() {
        let pins = parse_pins_str("p0 0.0 12.5\np1 300 0\n").unwrap();
        assert_eq!(pins.len(), 2);
        assert_eq!(pins[1], PinRecord { name: "p1".into(), x: 300.0, y: 0.0 });
    }

    #[test]
    fn test_rejects_missing_coordinate() {
        assert!(parse_pins_str("p0 1.0\n").is_err());
    }
}
