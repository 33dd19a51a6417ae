//! Per-die corner block list and its deterministic interpretation.

use serde::{Deserialize, Serialize};

use strata_core::block::AlignmentStatus;
use strata_core::geometry::{Rect, EPS};
use strata_core::{Block, BlockId};

/// Insertion direction of a CBL triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CblDirection {
    Horizontal,
    Vertical,
}

impl CblDirection {
    pub fn toggled(self) -> Self {
        match self {
            CblDirection::Horizontal => CblDirection::Vertical,
            CblDirection::Vertical => CblDirection::Horizontal,
        }
    }
}

/// One CBL triple: block, insertion direction, T-junction count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CblEntry {
    pub block: BlockId,
    pub dir: CblDirection,
    pub junctions: usize,
}

/// One die of the stack: its CBL sequence plus the interpretation state
/// (progress pointer and the two placement stacks).
///
/// The H stack holds blocks whose right boundary is currently exposed, the V
/// stack those with an exposed top boundary. Both are cleared per
/// regeneration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Die {
    pub id: usize,
    pub cbl: Vec<CblEntry>,
    pos: usize,
    stack_h: Vec<BlockId>,
    stack_v: Vec<BlockId>,
}

impl Die {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            cbl: Vec::new(),
            pos: 0,
            stack_h: Vec::new(),
            stack_v: Vec::new(),
        }
    }

    /// Rewind the progress pointer and clear both stacks.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.stack_h.clear();
        self.stack_v.clear();
    }

    pub fn done(&self) -> bool {
        self.pos >= self.cbl.len()
    }

    /// Interpret the next CBL triple and place its block.
    ///
    /// The first block of a die sits at the origin. A horizontal insertion
    /// pops up to `T + 1` blocks (at least one) from the H stack; the new
    /// block starts at the maximum right edge and the minimum bottom edge of
    /// the popped blocks. Vertical insertion is symmetric on the V stack.
    /// Excess T is interpreted as pop-all. The placed block joins both
    /// stacks.
    pub fn place_next(&mut self, blocks: &mut [Block]) -> Option<BlockId> {
        if self.done() {
            return None;
        }
        let entry = self.cbl[self.pos];
        let id = entry.block;

        let (x, y) = if self.stack_h.is_empty() && self.stack_v.is_empty() {
            (0.0, 0.0)
        } else {
            match entry.dir {
                CblDirection::Horizontal => {
                    let pops = (entry.junctions + 1).clamp(1, self.stack_h.len());
                    let mut x = 0.0_f64;
                    let mut y = f64::INFINITY;
                    for _ in 0..pops {
                        let popped = self.stack_h.pop().expect("H stack underflow");
                        let bb = &blocks[popped.value()].bb;
                        x = x.max(bb.ur.x);
                        y = y.min(bb.ll.y);
                    }
                    (x, y)
                }
                CblDirection::Vertical => {
                    let pops = (entry.junctions + 1).clamp(1, self.stack_v.len());
                    let mut x = f64::INFINITY;
                    let mut y = 0.0_f64;
                    for _ in 0..pops {
                        let popped = self.stack_v.pop().expect("V stack underflow");
                        let bb = &blocks[popped.value()].bb;
                        y = y.max(bb.ur.y);
                        x = x.min(bb.ll.x);
                    }
                    (x, y)
                }
            }
        };

        let block = &mut blocks[id.value()];
        block.bb.move_to(x, y);
        block.placed = true;
        block.layer = Some(self.id);

        self.stack_h.push(id);
        self.stack_v.push(id);
        self.pos += 1;
        Some(id)
    }

    /// Slide every placed block toward the origin along one axis until it
    /// touches another block or the die boundary, preserving the relative
    /// order on the sweep axis. Blocks with a currently satisfied alignment
    /// stay put so packing does not undo successful alignments.
    pub fn pack(&mut self, dir: CblDirection, blocks: &mut [Block]) {
        let mut order: Vec<BlockId> = self.cbl.iter().map(|e| e.block).collect();
        match dir {
            CblDirection::Horizontal => order.sort_by(|a, b| {
                let (ra, rb) = (&blocks[a.value()].bb, &blocks[b.value()].bb);
                ra.ll
                    .x
                    .partial_cmp(&rb.ll.x)
                    .unwrap()
                    .then(ra.ll.y.partial_cmp(&rb.ll.y).unwrap())
            }),
            CblDirection::Vertical => order.sort_by(|a, b| {
                let (ra, rb) = (&blocks[a.value()].bb, &blocks[b.value()].bb);
                ra.ll
                    .y
                    .partial_cmp(&rb.ll.y)
                    .unwrap()
                    .then(ra.ll.x.partial_cmp(&rb.ll.x).unwrap())
            }),
        }

        for (idx, id) in order.iter().enumerate() {
            if blocks[id.value()].alignment_status == AlignmentStatus::Success {
                continue;
            }
            let bb = blocks[id.value()].bb;
            let mut target = 0.0_f64;
            for (j, other) in order.iter().enumerate() {
                if j == idx {
                    continue;
                }
                let obb = &blocks[other.value()].bb;
                match dir {
                    CblDirection::Horizontal => {
                        if Rect::overlaps_in_y(obb, &bb) && obb.ur.x <= bb.ll.x + EPS {
                            target = target.max(obb.ur.x);
                        }
                    }
                    CblDirection::Vertical => {
                        if Rect::overlaps_in_x(obb, &bb) && obb.ur.y <= bb.ll.y + EPS {
                            target = target.max(obb.ur.y);
                        }
                    }
                }
            }
            let block = &mut blocks[id.value()];
            match dir {
                CblDirection::Horizontal => block.bb.move_to(target, bb.ll.y),
                CblDirection::Vertical => block.bb.move_to(bb.ll.x, target),
            }
        }
    }

    /// Sanity check: no pair of blocks on this die shares positive area.
    pub fn overlap_free(&self, blocks: &[Block]) -> bool {
        for (i, a) in self.cbl.iter().enumerate() {
            for b in self.cbl.iter().skip(i + 1) {
                let inter = Rect::intersection(
                    &blocks[a.block.value()].bb,
                    &blocks[b.block.value()].bb,
                );
                if inter.area > EPS {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::geometry::approx_eq;

    fn die_with(entries: &[(usize, CblDirection, usize)]) -> Die {
        let mut die = Die::new(0);
        die.cbl = entries
            .iter()
            .map(|&(b, dir, junctions)| CblEntry {
                block: BlockId::new(b),
                dir,
                junctions,
            })
            .collect();
        die
    }

    fn run(die: &mut Die, blocks: &mut [Block]) {
        while die.place_next(blocks).is_some() {}
    }

    #[test]
    fn test_two_blocks_horizontal() {
        let mut blocks = vec![Block::new("a", 10.0, 10.0), Block::new("b", 10.0, 10.0)];
        let mut die = die_with(&[
            (0, CblDirection::Horizontal, 0),
            (1, CblDirection::Horizontal, 0),
        ]);
        run(&mut die, &mut blocks);
        assert!(approx_eq(blocks[0].bb.ll.x, 0.0));
        assert!(approx_eq(blocks[1].bb.ll.x, 10.0));
        assert!(approx_eq(blocks[1].bb.ll.y, 0.0));
        assert!(die.overlap_free(&blocks));
    }

    #[test]
    fn test_vertical_stacking() {
        let mut blocks = vec![Block::new("a", 10.0, 10.0), Block::new("b", 8.0, 5.0)];
        let mut die = die_with(&[
            (0, CblDirection::Horizontal, 0),
            (1, CblDirection::Vertical, 0),
        ]);
        run(&mut die, &mut blocks);
        assert!(approx_eq(blocks[1].bb.ll.x, 0.0));
        assert!(approx_eq(blocks[1].bb.ll.y, 10.0));
        assert!(die.overlap_free(&blocks));
    }

    #[test]
    fn test_junctions_cover_multiple_blocks() {
        // two blocks side by side, third spans both via T = 1
        let mut blocks = vec![
            Block::new("a", 10.0, 10.0),
            Block::new("b", 10.0, 8.0),
            Block::new("c", 20.0, 5.0),
        ];
        let mut die = die_with(&[
            (0, CblDirection::Horizontal, 0),
            (1, CblDirection::Horizontal, 0),
            (2, CblDirection::Vertical, 1),
        ]);
        run(&mut die, &mut blocks);
        // T = 1 pops both a and b: y = max(10, 8), x = min(0, 10)
        assert!(approx_eq(blocks[2].bb.ll.y, 10.0));
        assert!(approx_eq(blocks[2].bb.ll.x, 0.0));
        assert!(die.overlap_free(&blocks));
    }

    #[test]
    fn test_excess_junctions_clamp_to_pop_all() {
        let mut blocks = vec![Block::new("a", 10.0, 10.0), Block::new("b", 10.0, 10.0)];
        let mut die = die_with(&[
            (0, CblDirection::Horizontal, 0),
            (1, CblDirection::Horizontal, 99),
        ]);
        run(&mut die, &mut blocks);
        assert!(approx_eq(blocks[1].bb.ll.x, 10.0));
        assert!(die.overlap_free(&blocks));
    }

    #[test]
    fn test_pack_closes_gap() {
        let mut blocks = vec![Block::new("a", 10.0, 10.0), Block::new("b", 10.0, 10.0)];
        let mut die = die_with(&[
            (0, CblDirection::Horizontal, 0),
            (1, CblDirection::Horizontal, 0),
        ]);
        run(&mut die, &mut blocks);
        // introduce a gap, packing must close it
        let y = blocks[1].bb.ll.y;
        blocks[1].bb.move_to(25.0, y);
        die.pack(CblDirection::Horizontal, &mut blocks);
        assert!(approx_eq(blocks[1].bb.ll.x, 10.0));
    }

    #[test]
    fn test_pack_is_idempotent_on_packed_layout() {
        let mut blocks = vec![
            Block::new("a", 10.0, 10.0),
            Block::new("b", 6.0, 4.0),
            Block::new("c", 4.0, 12.0),
        ];
        let mut die = die_with(&[
            (0, CblDirection::Horizontal, 0),
            (1, CblDirection::Horizontal, 0),
            (2, CblDirection::Vertical, 0),
        ]);
        run(&mut die, &mut blocks);
        die.pack(CblDirection::Horizontal, &mut blocks);
        die.pack(CblDirection::Vertical, &mut blocks);
        let before: Vec<Rect> = blocks.iter().map(|b| b.bb).collect();
        die.pack(CblDirection::Horizontal, &mut blocks);
        die.pack(CblDirection::Vertical, &mut blocks);
        let after: Vec<Rect> = blocks.iter().map(|b| b.bb).collect();
        assert_eq!(before, after);
    }
}
