//! The multi-die Corblivar representation.
//!
//! A layout is encoded as one corner block list per die; interpretation is
//! deterministic, so the CBLs (plus current block dimensions) are the whole
//! search state of the annealer.

mod die;

pub use die::{CblDirection, CblEntry, Die};

use rand::Rng;
use serde::{Deserialize, Serialize};

use strata_core::geometry::{Rect, EPS};
use strata_core::{AlignmentReq, AxisSpec, BlockId, Design};

/// Deep copy of the search state: per-die CBLs plus block dimensions
/// (operators reshape and rotate blocks, so order alone does not pin the
/// layout down).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Snapshot {
    cbls: Vec<Vec<CblEntry>>,
    dims: Vec<(f64, f64)>,
}

/// Corner block lists for the whole stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorbRep {
    pub dies: Vec<Die>,
    backup: Option<Snapshot>,
    best: Option<Snapshot>,
}

impl CorbRep {
    pub fn new(layers: usize) -> Self {
        Self {
            dies: (0..layers).map(Die::new).collect(),
            backup: None,
            best: None,
        }
    }

    /// Distribute the design's blocks over the dies with random directions;
    /// the initial solution is a valid permutation, nothing more.
    pub fn init_random<R: Rng>(&mut self, design: &Design, rng: &mut R) -> &mut Self {
        for die in &mut self.dies {
            die.cbl.clear();
        }
        let layers = self.dies.len();
        for (id, _) in design.regular_blocks() {
            let die = rng.gen_range(0..layers);
            let dir = if rng.gen_bool(0.5) {
                CblDirection::Horizontal
            } else {
                CblDirection::Vertical
            };
            self.dies[die].cbl.push(CblEntry {
                block: id,
                dir,
                junctions: 0,
            });
        }
        self
    }

    /// Round-robin distribution with horizontal insertion; used by tests and
    /// by the solution-file reader as a deterministic base.
    pub fn init_sequential(&mut self, design: &Design) -> &mut Self {
        for die in &mut self.dies {
            die.cbl.clear();
        }
        let layers = self.dies.len();
        for (i, (id, _)) in design.regular_blocks().enumerate() {
            self.dies[i % layers].cbl.push(CblEntry {
                block: id,
                dir: CblDirection::Horizontal,
                junctions: 0,
            });
        }
        self
    }

    /// Sort every die's CBL by descending block area; floorplacement mode
    /// wants the large macros placed first, near the origin.
    pub fn sort_by_area(&mut self, design: &Design) {
        for die in &mut self.dies {
            die.cbl.sort_by(|a, b| {
                design.blocks[b.block.value()]
                    .bb
                    .area
                    .partial_cmp(&design.blocks[a.block.value()].bb.area)
                    .unwrap()
            });
        }
    }

    /// Die currently hosting `block`, by CBL membership.
    pub fn die_of(&self, block: BlockId) -> Option<usize> {
        self.dies
            .iter()
            .position(|d| d.cbl.iter().any(|e| e.block == block))
    }

    pub fn total_entries(&self) -> usize {
        self.dies.iter().map(|d| d.cbl.len()).sum()
    }

    /// Regenerate the layout from the CBLs.
    ///
    /// Interpretation proceeds round-robin across the dies, one triple per
    /// die and turn, until every die is done. Optionally enforces alignment
    /// requests afterwards (bounded shifts that keep dies overlap-free),
    /// annotates alignment success for packing, then runs the packing sweeps.
    pub fn generate_layout(
        &mut self,
        design: &mut Design,
        packing_iterations: usize,
        enforce_alignment: bool,
    ) {
        design.reset_placement();
        for die in &mut self.dies {
            die.reset();
        }

        loop {
            let mut progressed = false;
            for die in &mut self.dies {
                if die.place_next(&mut design.blocks).is_some() {
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }

        if enforce_alignment {
            self.enforce_alignments(design);
        }

        if packing_iterations > 0 {
            // annotate alignment success so packing can preserve it
            let reqs = design.alignments.clone();
            for req in &reqs {
                req.evaluate(&mut design.blocks);
            }
            for die in &mut self.dies {
                if die.cbl.is_empty() {
                    continue;
                }
                for _ in 0..packing_iterations {
                    die.pack(CblDirection::Horizontal, &mut design.blocks);
                    die.pack(CblDirection::Vertical, &mut design.blocks);
                }
            }
        }

        debug_assert!(
            self.dies.iter().all(|d| d.overlap_free(&design.blocks)),
            "layout generation produced overlapping blocks"
        );
    }

    /// Pull the second block of each failing request toward its required
    /// position. Shifts are applied only when the moved block stays
    /// overlap-free on its die and inside the positive quadrant.
    fn enforce_alignments(&self, design: &mut Design) {
        let reqs: Vec<AlignmentReq> = design.alignments.clone();
        for req in &reqs {
            if req.anchored(&design.blocks) {
                continue;
            }
            let a = design.blocks[req.a.value()].bb;
            let b = design.blocks[req.b.value()].bb;

            let dx = match req.x {
                AxisSpec::Range(required) => {
                    let overlap = (a.ur.x.min(b.ur.x) - a.ll.x.max(b.ll.x)).max(0.0);
                    let miss = (required.min(a.w).min(b.w) - overlap).max(0.0);
                    if miss > EPS {
                        if b.center().x > a.center().x {
                            -miss
                        } else {
                            miss
                        }
                    } else {
                        0.0
                    }
                }
                AxisSpec::Offset(required) => a.ll.x + required - b.ll.x,
                AxisSpec::Undef => 0.0,
            };
            let dy = match req.y {
                AxisSpec::Range(required) => {
                    let overlap = (a.ur.y.min(b.ur.y) - a.ll.y.max(b.ll.y)).max(0.0);
                    let miss = (required.min(a.h).min(b.h) - overlap).max(0.0);
                    if miss > EPS {
                        if b.center().y > a.center().y {
                            -miss
                        } else {
                            miss
                        }
                    } else {
                        0.0
                    }
                }
                AxisSpec::Offset(required) => a.ll.y + required - b.ll.y,
                AxisSpec::Undef => 0.0,
            };

            if dx.abs() < EPS && dy.abs() < EPS {
                continue;
            }
            let new_x = (b.ll.x + dx).max(0.0);
            let new_y = (b.ll.y + dy).max(0.0);

            let mut shifted = b;
            shifted.move_to(new_x, new_y);
            let die = match design.blocks[req.b.value()].layer {
                Some(d) => d,
                None => continue,
            };
            let clear = self.dies[die].cbl.iter().all(|e| {
                e.block == req.b
                    || Rect::intersection(&design.blocks[e.block.value()].bb, &shifted).area <= EPS
            });
            if clear {
                design.blocks[req.b.value()].bb = shifted;
            }
        }
    }

    fn snapshot(&self, design: &Design) -> Snapshot {
        Snapshot {
            cbls: self.dies.iter().map(|d| d.cbl.clone()).collect(),
            dims: design.blocks.iter().map(|b| (b.bb.w, b.bb.h)).collect(),
        }
    }

    fn restore_snapshot(&mut self, snap: &Snapshot, design: &mut Design) {
        for (die, cbl) in self.dies.iter_mut().zip(snap.cbls.iter()) {
            die.cbl = cbl.clone();
        }
        for (block, &(w, h)) in design.blocks.iter_mut().zip(snap.dims.iter()) {
            block.bb.resize(w, h);
        }
    }

    /// Snapshot the current CBLs as the best known solution.
    pub fn store_best(&mut self, design: &Design) {
        self.best = Some(self.snapshot(design));
    }

    /// Restore the best known solution; false when none was stored.
    pub fn apply_best(&mut self, design: &mut Design) -> bool {
        match self.best.take() {
            Some(snap) => {
                self.restore_snapshot(&snap, design);
                self.best = Some(snap);
                true
            }
            None => false,
        }
    }

    /// Backup the current CBLs (used around the initial sampling walk).
    pub fn backup(&mut self, design: &Design) {
        self.backup = Some(self.snapshot(design));
    }

    pub fn restore(&mut self, design: &mut Design) {
        if let Some(snap) = self.backup.take() {
            self.restore_snapshot(&snap, design);
            self.backup = Some(snap);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::geometry::approx_eq;
    use strata_core::Block;

    fn two_block_design() -> Design {
        let mut design = Design::new();
        design.add_block(Block::new("a", 10.0, 10.0));
        design.add_block(Block::new("b", 10.0, 10.0));
        design
    }

    #[test]
    fn test_generation_one_die_two_blocks() {
        let mut design = two_block_design();
        let mut rep = CorbRep::new(1);
        rep.init_sequential(&design);
        rep.generate_layout(&mut design, 0, false);
        assert!(approx_eq(design.blocks[1].bb.ll.x, 0.0));
        assert!(approx_eq(design.blocks[2].bb.ll.x, 10.0));
        assert_eq!(design.blocks[1].layer, Some(0));
        assert_eq!(design.blocks[2].layer, Some(0));
    }

    #[test]
    fn test_generation_round_robin_assigns_layers() {
        let mut design = two_block_design();
        let mut rep = CorbRep::new(2);
        rep.init_sequential(&design);
        rep.generate_layout(&mut design, 0, false);
        assert_eq!(design.blocks[1].layer, Some(0));
        assert_eq!(design.blocks[2].layer, Some(1));
        // single block per die sits at the origin
        assert!(approx_eq(design.blocks[2].bb.ll.x, 0.0));
    }

    #[test]
    fn test_empty_die_is_fine() {
        let mut design = Design::new();
        design.add_block(Block::new("a", 10.0, 10.0));
        let mut rep = CorbRep::new(3);
        rep.init_sequential(&design);
        rep.generate_layout(&mut design, 1, false);
        assert_eq!(design.blocks[1].layer, Some(0));
        assert!(rep.dies[1].cbl.is_empty());
        assert!(rep.dies[2].cbl.is_empty());
    }

    #[test]
    fn test_best_snapshot_roundtrip() {
        let mut design = two_block_design();
        let mut rep = CorbRep::new(1);
        rep.init_sequential(&design);
        rep.store_best(&design);
        let stored: Vec<CblEntry> = rep.dies[0].cbl.clone();

        // wreck the CBL and the dimensions
        rep.dies[0].cbl.swap(0, 1);
        design.blocks[1].rotate();
        design.blocks[1].bb.resize(3.0, 7.0);

        assert!(rep.apply_best(&mut design));
        assert_eq!(rep.dies[0].cbl, stored);
        assert!(approx_eq(design.blocks[1].bb.w, 10.0));
    }

    #[test]
    fn test_sort_by_area_descending() {
        let mut design = Design::new();
        design.add_block(Block::new("small", 2.0, 2.0));
        design.add_block(Block::new("large", 20.0, 20.0));
        let mut rep = CorbRep::new(1);
        rep.init_sequential(&design);
        rep.sort_by_area(&design);
        assert_eq!(rep.dies[0].cbl[0].block.value(), 2);
    }

    #[test]
    fn test_stacked_singletons_align_without_shifting() {
        // one block per die lands at the origin, so a full-overlap bus
        // request is satisfied as generated
        let mut design = Design::new();
        let a = design.add_block(Block::new("a", 10.0, 10.0));
        let b = design.add_block(Block::new("b", 10.0, 10.0));
        design.alignments.push(AlignmentReq::new(
            a,
            b,
            AxisSpec::Range(10.0),
            AxisSpec::Range(10.0),
            4,
        ));
        let mut rep = CorbRep::new(2);
        rep.init_sequential(&design);
        rep.generate_layout(&mut design, 0, true);
        let inter = Rect::intersection(&design.blocks[1].bb, &design.blocks[2].bb);
        assert!(approx_eq(inter.area, 100.0));
    }

    #[test]
    fn test_alignment_enforcement_shifts_block() {
        // b must sit 12um above a (offset request); the generated position
        // is at y = 0, the enforcement pass lifts it
        let mut design = Design::new();
        let a = design.add_block(Block::new("a", 10.0, 10.0));
        let c = design.add_block(Block::new("c", 6.0, 2.0));
        let b = design.add_block(Block::new("b", 10.0, 10.0));
        design.alignments.push(AlignmentReq::new(
            a,
            b,
            AxisSpec::Undef,
            AxisSpec::Offset(12.0),
            4,
        ));
        let mut rep = CorbRep::new(2);
        // die 0: a alone; die 1: c then b side by side
        rep.dies[0].cbl.push(CblEntry {
            block: a,
            dir: CblDirection::Horizontal,
            junctions: 0,
        });
        for id in [c, b] {
            rep.dies[1].cbl.push(CblEntry {
                block: id,
                dir: CblDirection::Horizontal,
                junctions: 0,
            });
        }
        rep.generate_layout(&mut design, 0, true);
        assert!(approx_eq(design.blocks[b.value()].bb.ll.y, 12.0));
        assert!(rep.dies[1].overlap_free(&design.blocks));
    }
}
