//! CBL mutation operators.
//!
//! Every operator records the exact state needed to undo itself in an
//! [`OpRecord`]; revert is data-driven and restores the representation
//! bit-for-bit. Operators that cannot produce a valid candidate fail without
//! touching anything, the annealer then retries with a fresh draw.

use rand::Rng;

use strata_core::geometry::EPS;
use strata_core::{BlockId, Design};

use crate::corb::CorbRep;

/// The seven operator classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// Exchange block references of two positions in one die's CBL.
    SwapWithinDie,
    /// Move a whole triple from one die's CBL into another's.
    MoveAcrossDies,
    /// Exchange block references between two CBL positions on different dies.
    SwapAcrossDies,
    /// Swap a block's width and height.
    Rotate,
    /// Reshape a soft block to a random aspect ratio at constant area.
    Shape,
    /// Toggle a triple's insertion direction.
    SwitchDir,
    /// Redraw a triple's T-junction count.
    SwitchJunctions,
}

/// Saved pre-state of the last successful operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OpRecord {
    SwapWithinDie {
        die: usize,
        i: usize,
        j: usize,
    },
    MoveAcrossDies {
        from_die: usize,
        from_pos: usize,
        to_die: usize,
        to_pos: usize,
    },
    SwapAcrossDies {
        die_a: usize,
        i: usize,
        die_b: usize,
        j: usize,
    },
    Rotate {
        block: BlockId,
    },
    Shape {
        block: BlockId,
        old_w: f64,
        old_h: f64,
    },
    SwitchDir {
        die: usize,
        pos: usize,
    },
    SwitchJunctions {
        die: usize,
        pos: usize,
        old_junctions: usize,
    },
}

/// Per-attempt context handed down by the annealer.
#[derive(Debug, Clone, Copy)]
pub struct OpContext {
    pub phase_two: bool,
    /// Whether the most recent generated layout fit the fixed outline.
    pub last_layout_fit: bool,
    pub outline_x: f64,
    pub outline_y: f64,
}

/// Operator engine: weighted selection, guards, and revert bookkeeping.
#[derive(Debug, Clone)]
pub struct LayoutOp {
    /// Selection weights per operator class.
    pub weights: Vec<(OpKind, f64)>,
    /// Probability of the failure-fix bias while no layout fits.
    pub fix_bias_prob: f64,
    /// Floorplacement mode: oversized macros are immune to move/swap during
    /// phase one.
    pub floorplacement: bool,
    last: Option<OpRecord>,
}

impl LayoutOp {
    pub fn new(fix_bias_prob: f64, floorplacement: bool) -> Self {
        Self {
            weights: vec![
                (OpKind::SwapWithinDie, 0.2),
                (OpKind::MoveAcrossDies, 0.2),
                (OpKind::SwapAcrossDies, 0.1),
                (OpKind::Rotate, 0.15),
                (OpKind::Shape, 0.15),
                (OpKind::SwitchDir, 0.1),
                (OpKind::SwitchJunctions, 0.1),
            ],
            fix_bias_prob,
            floorplacement,
            last: None,
        }
    }

    pub fn last_record(&self) -> Option<&OpRecord> {
        self.last.as_ref()
    }

    /// Attempt one mutation. Returns false when the drawn operator had no
    /// valid candidate; the representation is untouched in that case.
    pub fn perform<R: Rng>(
        &mut self,
        rep: &mut CorbRep,
        design: &mut Design,
        ctx: OpContext,
        rng: &mut R,
    ) -> bool {
        // while the layout does not fit, bias operations onto the block
        // sticking out of the outline the furthest
        if !ctx.phase_two && !ctx.last_layout_fit && rng.gen::<f64>() < self.fix_bias_prob {
            if let Some(record) = self.fix_violating_block(rep, design, ctx, rng) {
                self.last = Some(record);
                return true;
            }
        }

        let kind = self.sample_kind(rng);
        let record = match kind {
            OpKind::SwapWithinDie => self.op_swap_within_die(rep, design, ctx, rng),
            OpKind::MoveAcrossDies => self.op_move_across_dies(rep, design, ctx, rng),
            OpKind::SwapAcrossDies => self.op_swap_across_dies(rep, design, ctx, rng),
            OpKind::Rotate => self.op_rotate(rep, design, rng),
            OpKind::Shape => self.op_shape(rep, design, rng),
            OpKind::SwitchDir => self.op_switch_dir(rep, rng),
            OpKind::SwitchJunctions => self.op_switch_junctions(rep, rng),
        };
        match record {
            Some(record) => {
                self.last = Some(record);
                true
            }
            None => false,
        }
    }

    /// Undo the last successful operation exactly.
    pub fn revert(&mut self, rep: &mut CorbRep, design: &mut Design) {
        let Some(record) = self.last.take() else {
            return;
        };
        match record {
            OpRecord::SwapWithinDie { die, i, j } => {
                let cbl = &mut rep.dies[die].cbl;
                let tmp = cbl[i].block;
                cbl[i].block = cbl[j].block;
                cbl[j].block = tmp;
            }
            OpRecord::MoveAcrossDies {
                from_die,
                from_pos,
                to_die,
                to_pos,
            } => {
                let entry = rep.dies[to_die].cbl.remove(to_pos);
                rep.dies[from_die].cbl.insert(from_pos, entry);
            }
            OpRecord::SwapAcrossDies { die_a, i, die_b, j } => {
                let tmp = rep.dies[die_a].cbl[i].block;
                rep.dies[die_a].cbl[i].block = rep.dies[die_b].cbl[j].block;
                rep.dies[die_b].cbl[j].block = tmp;
            }
            OpRecord::Rotate { block } => {
                design.blocks[block.value()].rotate();
            }
            OpRecord::Shape { block, old_w, old_h } => {
                design.blocks[block.value()].bb.resize(old_w, old_h);
            }
            OpRecord::SwitchDir { die, pos } => {
                let entry = &mut rep.dies[die].cbl[pos];
                entry.dir = entry.dir.toggled();
            }
            OpRecord::SwitchJunctions {
                die,
                pos,
                old_junctions,
            } => {
                rep.dies[die].cbl[pos].junctions = old_junctions;
            }
        }
    }

    fn sample_kind<R: Rng>(&self, rng: &mut R) -> OpKind {
        let total: f64 = self.weights.iter().map(|(_, w)| w).sum();
        let mut draw = rng.gen::<f64>() * total;
        for &(kind, weight) in &self.weights {
            if draw < weight {
                return kind;
            }
            draw -= weight;
        }
        self.weights.last().map(|&(k, _)| k).unwrap()
    }

    /// A block is protected from move/swap while floorplacement mode runs
    /// phase one.
    fn protected(&self, design: &Design, ctx: OpContext, block: BlockId) -> bool {
        self.floorplacement && !ctx.phase_two && design.blocks[block.value()].floorplacement
    }

    fn random_entry<R: Rng>(&self, rep: &CorbRep, rng: &mut R) -> Option<(usize, usize)> {
        let total = rep.total_entries();
        if total == 0 {
            return None;
        }
        let mut pick = rng.gen_range(0..total);
        for (d, die) in rep.dies.iter().enumerate() {
            if pick < die.cbl.len() {
                return Some((d, pick));
            }
            pick -= die.cbl.len();
        }
        None
    }

    fn op_swap_within_die<R: Rng>(
        &self,
        rep: &mut CorbRep,
        design: &Design,
        ctx: OpContext,
        rng: &mut R,
    ) -> Option<OpRecord> {
        let candidates: Vec<usize> = rep
            .dies
            .iter()
            .enumerate()
            .filter(|(_, d)| d.cbl.len() >= 2)
            .map(|(i, _)| i)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let die = candidates[rng.gen_range(0..candidates.len())];
        let len = rep.dies[die].cbl.len();
        let i = rng.gen_range(0..len);
        let mut j = rng.gen_range(0..len - 1);
        if j >= i {
            j += 1;
        }
        let (ba, bb) = (rep.dies[die].cbl[i].block, rep.dies[die].cbl[j].block);
        if self.protected(design, ctx, ba) || self.protected(design, ctx, bb) {
            return None;
        }
        rep.dies[die].cbl[i].block = bb;
        rep.dies[die].cbl[j].block = ba;
        Some(OpRecord::SwapWithinDie { die, i, j })
    }

    fn op_move_across_dies<R: Rng>(
        &self,
        rep: &mut CorbRep,
        design: &Design,
        ctx: OpContext,
        rng: &mut R,
    ) -> Option<OpRecord> {
        if rep.dies.len() < 2 {
            return None;
        }
        let (from_die, from_pos) = self.random_entry(rep, rng)?;
        let block = rep.dies[from_die].cbl[from_pos].block;
        if self.protected(design, ctx, block) {
            return None;
        }
        let mut to_die = rng.gen_range(0..rep.dies.len() - 1);
        if to_die >= from_die {
            to_die += 1;
        }
        let to_pos = rng.gen_range(0..=rep.dies[to_die].cbl.len());
        let entry = rep.dies[from_die].cbl.remove(from_pos);
        rep.dies[to_die].cbl.insert(to_pos, entry);
        Some(OpRecord::MoveAcrossDies {
            from_die,
            from_pos,
            to_die,
            to_pos,
        })
    }

    fn op_swap_across_dies<R: Rng>(
        &self,
        rep: &mut CorbRep,
        design: &Design,
        ctx: OpContext,
        rng: &mut R,
    ) -> Option<OpRecord> {
        if rep.dies.len() < 2 {
            return None;
        }
        let (die_a, i) = self.random_entry(rep, rng)?;
        let others: Vec<usize> = rep
            .dies
            .iter()
            .enumerate()
            .filter(|(d, die)| *d != die_a && !die.cbl.is_empty())
            .map(|(d, _)| d)
            .collect();
        if others.is_empty() {
            return None;
        }
        let die_b = others[rng.gen_range(0..others.len())];
        let j = rng.gen_range(0..rep.dies[die_b].cbl.len());
        let (ba, bb) = (rep.dies[die_a].cbl[i].block, rep.dies[die_b].cbl[j].block);
        if self.protected(design, ctx, ba) || self.protected(design, ctx, bb) {
            return None;
        }
        rep.dies[die_a].cbl[i].block = bb;
        rep.dies[die_b].cbl[j].block = ba;
        Some(OpRecord::SwapAcrossDies { die_a, i, die_b, j })
    }

    fn op_rotate<R: Rng>(
        &self,
        rep: &mut CorbRep,
        design: &mut Design,
        rng: &mut R,
    ) -> Option<OpRecord> {
        let (die, pos) = self.random_entry(rep, rng)?;
        let id = rep.dies[die].cbl[pos].block;
        let block = &mut design.blocks[id.value()];
        if block.soft {
            // rotation must keep a soft block inside its AR range
            let rotated_ar = block.bb.h / block.bb.w;
            if !block.ar.contains(rotated_ar) {
                return None;
            }
        }
        block.rotate();
        Some(OpRecord::Rotate { block: id })
    }

    fn op_shape<R: Rng>(
        &self,
        rep: &mut CorbRep,
        design: &mut Design,
        rng: &mut R,
    ) -> Option<OpRecord> {
        let soft: Vec<BlockId> = rep
            .dies
            .iter()
            .flat_map(|d| d.cbl.iter().map(|e| e.block))
            .filter(|id| design.blocks[id.value()].soft)
            .collect();
        if soft.is_empty() {
            return None;
        }
        let id = soft[rng.gen_range(0..soft.len())];
        let block = &mut design.blocks[id.value()];
        let (old_w, old_h) = (block.bb.w, block.bb.h);
        let ar = rng.gen_range(block.ar.min..=block.ar.max);
        block.shape_to_ar(ar);
        Some(OpRecord::Shape { block: id, old_w, old_h })
    }

    fn op_switch_dir<R: Rng>(&self, rep: &mut CorbRep, rng: &mut R) -> Option<OpRecord> {
        let (die, pos) = self.random_entry(rep, rng)?;
        let entry = &mut rep.dies[die].cbl[pos];
        entry.dir = entry.dir.toggled();
        Some(OpRecord::SwitchDir { die, pos })
    }

    fn op_switch_junctions<R: Rng>(&self, rep: &mut CorbRep, rng: &mut R) -> Option<OpRecord> {
        let (die, pos) = self.random_entry(rep, rng)?;
        // stack depth at interpretation time is bounded by the position
        let max_junctions = pos.max(1);
        let old_junctions = rep.dies[die].cbl[pos].junctions;
        let new_junctions = rng.gen_range(0..=max_junctions);
        rep.dies[die].cbl[pos].junctions = new_junctions;
        Some(OpRecord::SwitchJunctions {
            die,
            pos,
            old_junctions,
        })
    }

    /// Failure-fix bias: act on the block exceeding the outline the most,
    /// shrinking it, rotating it flat, or moving it to another die.
    fn fix_violating_block<R: Rng>(
        &self,
        rep: &mut CorbRep,
        design: &mut Design,
        ctx: OpContext,
        rng: &mut R,
    ) -> Option<OpRecord> {
        let mut worst: Option<(BlockId, f64, bool)> = None;
        for (id, block) in design.regular_blocks() {
            if !block.placed {
                continue;
            }
            let over_x = block.bb.ur.x - ctx.outline_x;
            let over_y = block.bb.ur.y - ctx.outline_y;
            let excess = over_x.max(over_y);
            if excess > EPS && worst.map(|(_, e, _)| excess > e).unwrap_or(true) {
                worst = Some((id, excess, over_x >= over_y));
            }
        }
        let (id, _, exceeds_x) = worst?;

        let block = &design.blocks[id.value()];
        if block.soft {
            let current_ar = block.bb.w / block.bb.h;
            // narrow the exceeding dimension at constant area
            let (lo, hi) = if exceeds_x {
                (block.ar.min, current_ar.min(block.ar.max))
            } else {
                (current_ar.max(block.ar.min), block.ar.max)
            };
            if hi - lo > EPS {
                let (old_w, old_h) = (block.bb.w, block.bb.h);
                let ar = rng.gen_range(lo..=hi);
                design.blocks[id.value()].shape_to_ar(ar);
                return Some(OpRecord::Shape { block: id, old_w, old_h });
            }
        }

        if rep.dies.len() > 1 && !self.protected(design, ctx, id) {
            let from_die = rep.die_of(id)?;
            let from_pos = rep.dies[from_die].cbl.iter().position(|e| e.block == id)?;
            let mut to_die = rng.gen_range(0..rep.dies.len() - 1);
            if to_die >= from_die {
                to_die += 1;
            }
            let to_pos = rng.gen_range(0..=rep.dies[to_die].cbl.len());
            let entry = rep.dies[from_die].cbl.remove(from_pos);
            rep.dies[to_die].cbl.insert(to_pos, entry);
            return Some(OpRecord::MoveAcrossDies {
                from_die,
                from_pos,
                to_die,
                to_pos,
            });
        }

        // hard block on a single die: rotate if that flattens the excess
        let block = &design.blocks[id.value()];
        let helps = if exceeds_x {
            block.bb.h < block.bb.w
        } else {
            block.bb.w < block.bb.h
        };
        if helps && (!block.soft || block.ar.contains(block.bb.h / block.bb.w)) {
            design.blocks[id.value()].rotate();
            return Some(OpRecord::Rotate { block: id });
        }
        None
    }
}
