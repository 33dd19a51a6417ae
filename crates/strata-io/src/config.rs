//! TOML configuration loading.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use strata_core::Config;

/// Load and validate a run configuration.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config file: {}", path.display()))?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("parsing TOML config")?;
    config.validate().context("validating config")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config = parse_config(
            r#"
layers = 3
outline_x = 500.0
outline_y = 400.0
seed = 7

[schedule]
loop_limit = 128

[weights]
thermal = 0.3
wirelength = 0.3
"#,
        )
        .unwrap();
        assert_eq!(config.layers, 3);
        assert_eq!(config.seed, 7);
        assert_eq!(config.schedule.loop_limit, 128);
        assert_eq!(config.weights.thermal, 0.3);
        // unspecified fields keep their defaults
        assert_eq!(config.layout.packing_iterations, 2);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.layers, Config::default().layers);
    }

    #[test]
    fn test_invalid_schedule_rejected() {
        let err = parse_config(
            r#"
[schedule]
temp_factor_phase1 = 0.95
temp_factor_phase1_limit = 0.9
"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(parse_config("layers = [oops").is_err());
    }
}
