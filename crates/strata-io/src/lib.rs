//! # strata-io: Benchmark and Result File Handling
//!
//! Importers for the GSRC-style benchmark formats (blocks, nets, power,
//! pins, alignment requests), TOML configuration loading, the Corblivar
//! solution-file round trip, and the result writers (Gnuplot floorplans,
//! HotSpot inputs, temperature-schedule log, map dumps, run summary).
//!
//! Parsers are line-oriented and return structured records with explicit
//! errors; no parsing state leaks across files.

pub mod config;
pub mod exporters;
pub mod importers;

pub use config::{load_config, parse_config};
pub use exporters::RunSummary;
pub use importers::{load_design, BenchmarkPaths};
