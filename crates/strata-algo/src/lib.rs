//! # strata-algo: Floorplanning Algorithms
//!
//! The optimization machinery of the Strata 3D-IC floorplanner:
//!
//! - [`corb`] - the multi-die Corblivar representation (corner block lists)
//!   and its deterministic layout interpretation and packing
//! - [`ops`] - the CBL mutation operators with data-driven revert
//! - [`eval`] - the multi-objective cost evaluator
//! - [`thermal`] - power-blurring thermal analysis
//! - [`routing`] - routing-utilization estimation
//! - [`cluster`] - hotspot-guided signal-TSV clustering
//! - [`anneal`] - the three-phase simulated-annealing engine
//!
//! The engine is single-threaded and synchronous; all state is owned by the
//! caller and mutated strictly between evaluations. Randomness comes from
//! one seeded PRNG inside [`anneal::Annealer`], so identical seeds and
//! inputs reproduce results byte for byte. The optional `parallel` feature
//! only parallelizes the power-blurring convolution, which is bitwise
//! deterministic either way.

pub mod anneal;
pub mod cluster;
pub mod corb;
pub mod eval;
pub mod ops;
pub mod routing;
pub mod thermal;

pub use anneal::{finalize, Annealer, FinalOutcome, SaPhase, TempStep};
pub use corb::{CblDirection, CblEntry, CorbRep, Die};
pub use eval::{Cost, Evaluator};
pub use ops::{LayoutOp, OpContext, OpKind, OpRecord};
pub use routing::{RoutingUtilization, UtilResult};
pub use thermal::{ThermalAnalyzer, ThermalResult, THERMAL_MAP_DIM};
