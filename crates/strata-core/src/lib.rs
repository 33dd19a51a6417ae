//! # strata-core: 3D-IC Floorplan Modeling Core
//!
//! Data structures shared by the Strata floorplanner: geometry primitives,
//! circuit blocks, nets, alignment requests and the run configuration.
//!
//! ## Design
//!
//! All circuit elements live in flat arenas owned by a [`Design`]:
//! blocks (including terminal pins and the RBOD anchor) in one vector,
//! indexed by [`BlockId`]; nets and alignment requests reference blocks by
//! id only. There are no back-references and no shared ownership: the layout
//! generator and the mutation operators receive `&mut` access to block
//! geometry, every other consumer reads.
//!
//! ## Quick Start
//!
//! ```rust
//! use strata_core::*;
//!
//! let mut design = Design::new();
//! let a = design.add_block(block::Block::new("a", 10.0, 10.0));
//! let b = design.add_block(block::Block::new("b", 10.0, 10.0));
//!
//! let mut net = net::Net::new("n0");
//! net.blocks = vec![a, b];
//! design.nets.push(net);
//!
//! assert_eq!(design.regular_blocks().count(), 2);
//! ```
//!
//! ## Modules
//!
//! - [`geometry`] - points, rectangles, tolerant comparison
//! - [`block`] - blocks, pins, RBOD, TSV islands
//! - [`net`] - nets and per-layer bounding boxes
//! - [`align`] - alignment requests and their evaluation
//! - [`config`] - immutable run configuration
//! - [`error`] - unified error type

use serde::{Deserialize, Serialize};

pub mod align;
pub mod block;
pub mod config;
pub mod error;
pub mod geometry;
pub mod net;

pub use align::{AlignmentReq, AxisSpec};
pub use block::{AlignmentStatus, Block, BlockKind, TsvIsland};
pub use config::Config;
pub use error::{StrataError, StrataResult};
pub use geometry::{Point, Rect, EPS};
pub use net::Net;

// Newtype wrappers for IDs for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetId(usize);

impl BlockId {
    #[inline]
    pub fn new(value: usize) -> Self {
        BlockId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl NetId {
    #[inline]
    pub fn new(value: usize) -> Self {
        NetId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

/// Blocks whose area reaches this share of one die are floorplacement
/// macros: pre-sorted to the CBL head and immune to move/swap in phase one.
pub const FLOORPLACEMENT_AREA_RATIO: f64 = 0.05;

/// The complete floorplanning problem instance.
///
/// Arena slot 0 always holds the RBOD anchor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Design {
    pub blocks: Vec<Block>,
    pub nets: Vec<Net>,
    pub alignments: Vec<AlignmentReq>,
}

impl Design {
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::new_rbod()],
            nets: Vec::new(),
            alignments: Vec::new(),
        }
    }

    /// Append a block to the arena and return its id.
    pub fn add_block(&mut self, block: Block) -> BlockId {
        self.blocks.push(block);
        BlockId::new(self.blocks.len() - 1)
    }

    pub fn rbod(&self) -> BlockId {
        BlockId::new(0)
    }

    /// Look a block up by name.
    pub fn find_block(&self, name: &str) -> Option<BlockId> {
        self.blocks
            .iter()
            .position(|b| b.name == name)
            .map(BlockId::new)
    }

    /// Placeable blocks, i.e. everything the layout generator handles.
    pub fn regular_blocks(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_regular())
            .map(|(i, b)| (BlockId::new(i), b))
    }

    pub fn regular_block_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_regular()).count()
    }

    /// Summed area of all placeable blocks.
    pub fn blocks_area(&self) -> f64 {
        self.blocks
            .iter()
            .filter(|b| b.is_regular())
            .map(|b| b.bb.area)
            .sum()
    }

    /// Clear placement state before a layout regeneration.
    pub fn reset_placement(&mut self) {
        for b in &mut self.blocks {
            if b.is_regular() {
                b.placed = false;
                b.layer = None;
            }
        }
    }

    /// Flag oversized macros for floorplacement handling.
    pub fn flag_floorplacement(&mut self, die_area: f64) {
        let limit = FLOORPLACEMENT_AREA_RATIO * die_area;
        for b in &mut self.blocks {
            if b.is_regular() {
                b.floorplacement = b.bb.area >= limit;
            }
        }
    }

    /// Check the instance against the stack outline and reject conflicting
    /// references up front.
    pub fn validate(&self, config: &Config) -> StrataResult<()> {
        if self.regular_block_count() == 0 {
            return Err(StrataError::Validation("no blocks to place".into()));
        }
        let capacity = config.stack_area();
        let demand = self.blocks_area();
        if demand > capacity {
            return Err(StrataError::Validation(format!(
                "total block area {demand:.1} exceeds stack capacity {capacity:.1}"
            )));
        }
        for net in &self.nets {
            for id in net.blocks.iter().chain(net.pins.iter()) {
                if id.value() >= self.blocks.len() {
                    return Err(StrataError::Validation(format!(
                        "net '{}' references unknown block index {}",
                        net.name,
                        id.value()
                    )));
                }
            }
        }
        for (i, req) in self.alignments.iter().enumerate() {
            if req.a.value() >= self.blocks.len() || req.b.value() >= self.blocks.len() {
                return Err(StrataError::Validation(format!(
                    "alignment request {i} references an unknown block"
                )));
            }
            if req.a == req.b {
                return Err(StrataError::Validation(format!(
                    "alignment request {i} pairs a block with itself"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_design_reserves_rbod_slot() {
        let design = Design::new();
        assert_eq!(design.blocks[design.rbod().value()].kind, BlockKind::Rbod);
        assert_eq!(design.regular_block_count(), 0);
    }

    #[test]
    fn test_find_block() {
        let mut design = Design::new();
        let id = design.add_block(Block::new("cpu", 10.0, 10.0));
        assert_eq!(design.find_block("cpu"), Some(id));
        assert_eq!(design.find_block("missing"), None);
    }

    #[test]
    fn test_validate_rejects_infeasible_area() {
        let mut design = Design::new();
        for i in 0..3 {
            design.add_block(Block::new(format!("b{i}"), 10.0, 10.0));
        }
        let config = Config {
            layers: 1,
            outline_x: 15.0,
            outline_y: 15.0,
            ..Config::default()
        };
        assert!(matches!(
            design.validate(&config),
            Err(StrataError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_self_alignment() {
        let mut design = Design::new();
        let a = design.add_block(Block::new("a", 1.0, 1.0));
        design.alignments.push(AlignmentReq::new(
            a,
            a,
            AxisSpec::Undef,
            AxisSpec::Undef,
            1,
        ));
        assert!(design.validate(&Config::default()).is_err());
    }

    #[test]
    fn test_flag_floorplacement() {
        let mut design = Design::new();
        design.add_block(Block::new("big", 300.0, 300.0));
        design.add_block(Block::new("small", 10.0, 10.0));
        design.flag_floorplacement(1000.0 * 1000.0);
        assert!(design.blocks[1].floorplacement);
        assert!(!design.blocks[2].floorplacement);
    }
}
