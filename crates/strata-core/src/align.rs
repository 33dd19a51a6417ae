//! Pairwise block-alignment requests.
//!
//! A request ties two blocks with independent x- and y-axis demands, each a
//! minimum overlap (range), a fixed signed lower-left offset, or undefined.
//! Evaluation yields the spatial mismatch and annotates both blocks with the
//! failing direction so the failure-fix operator bias knows which way to
//! push.

use serde::{Deserialize, Serialize};

use crate::block::{AlignmentStatus, Block, BlockKind};
use crate::geometry::EPS;
use crate::BlockId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AxisSpec {
    /// Minimum overlap extent along the axis.
    Range(f64),
    /// Fixed signed distance between lower-left corners (b relative to a).
    Offset(f64),
    Undef,
}

impl AxisSpec {
    /// Negative ranges are meaningless; clamp to zero.
    pub fn sanitized(self) -> Self {
        match self {
            AxisSpec::Range(r) if r < 0.0 => AxisSpec::Range(0.0),
            other => other,
        }
    }
}

/// Result of evaluating one request: weighted cost plus raw mismatch in um.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AlignmentEval {
    pub cost: f64,
    pub mismatch: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentReq {
    pub a: BlockId,
    pub b: BlockId,
    pub x: AxisSpec,
    pub y: AxisSpec,
    /// Signal count; weighs TSV island sizing and wirelength.
    pub signals: usize,
}

impl AlignmentReq {
    pub fn new(a: BlockId, b: BlockId, x: AxisSpec, y: AxisSpec, signals: usize) -> Self {
        Self {
            a,
            b,
            x: x.sanitized(),
            y: y.sanitized(),
            signals,
        }
    }

    /// A vertical bus demands positive overlap on both axes; it implies TSV
    /// provisioning across all intermediate dies.
    pub fn vertical_bus(&self) -> bool {
        matches!(self.x, AxisSpec::Range(r) if r > 0.0)
            && matches!(self.y, AxisSpec::Range(r) if r > 0.0)
    }

    /// Fixed x-range demanded by the request, for bus-island sizing.
    pub fn range_x(&self) -> Option<f64> {
        match self.x {
            AxisSpec::Range(r) if r > 0.0 => Some(r),
            _ => None,
        }
    }

    /// Evaluate the request against the current placement and annotate both
    /// blocks' alignment status. Mismatch per axis:
    /// range -> `max(0, required - actual_overlap)`,
    /// offset -> `|actual - required|`; the request cost is their sum.
    pub fn evaluate(&self, blocks: &mut [Block]) -> AlignmentEval {
        let a = blocks[self.a.value()].bb;
        let b = blocks[self.b.value()].bb;

        let mut mismatch = 0.0;
        let mut status_a = AlignmentStatus::Success;
        let mut status_b = AlignmentStatus::Success;

        match self.x {
            AxisSpec::Range(required) => {
                let overlap = (a.ur.x.min(b.ur.x) - a.ll.x.max(b.ll.x)).max(0.0);
                let miss = (required - overlap).max(0.0);
                if miss > EPS {
                    mismatch += miss;
                    if a.center().x < b.center().x {
                        status_a = AlignmentStatus::FailHorTooLeft;
                        status_b = AlignmentStatus::FailHorTooRight;
                    } else {
                        status_a = AlignmentStatus::FailHorTooRight;
                        status_b = AlignmentStatus::FailHorTooLeft;
                    }
                }
            }
            AxisSpec::Offset(required) => {
                let actual = b.ll.x - a.ll.x;
                let miss = (actual - required).abs();
                if miss > EPS {
                    mismatch += miss;
                    if actual < required {
                        status_b = AlignmentStatus::FailHorTooLeft;
                        status_a = AlignmentStatus::FailHorTooRight;
                    } else {
                        status_b = AlignmentStatus::FailHorTooRight;
                        status_a = AlignmentStatus::FailHorTooLeft;
                    }
                }
            }
            AxisSpec::Undef => {}
        }

        match self.y {
            AxisSpec::Range(required) => {
                let overlap = (a.ur.y.min(b.ur.y) - a.ll.y.max(b.ll.y)).max(0.0);
                let miss = (required - overlap).max(0.0);
                if miss > EPS {
                    mismatch += miss;
                    if a.center().y < b.center().y {
                        status_a = AlignmentStatus::FailVertTooLow;
                        status_b = AlignmentStatus::FailVertTooHigh;
                    } else {
                        status_a = AlignmentStatus::FailVertTooHigh;
                        status_b = AlignmentStatus::FailVertTooLow;
                    }
                }
            }
            AxisSpec::Offset(required) => {
                let actual = b.ll.y - a.ll.y;
                let miss = (actual - required).abs();
                if miss > EPS {
                    mismatch += miss;
                    if actual < required {
                        status_b = AlignmentStatus::FailVertTooLow;
                        status_a = AlignmentStatus::FailVertTooHigh;
                    } else {
                        status_b = AlignmentStatus::FailVertTooHigh;
                        status_a = AlignmentStatus::FailVertTooLow;
                    }
                }
            }
            AxisSpec::Undef => {}
        }

        // never overwrite the RBOD anchor's status
        if blocks[self.a.value()].kind != BlockKind::Rbod {
            blocks[self.a.value()].alignment_status = status_a;
        }
        if blocks[self.b.value()].kind != BlockKind::Rbod {
            blocks[self.b.value()].alignment_status = status_b;
        }

        AlignmentEval {
            cost: mismatch,
            mismatch,
        }
    }

    /// Whether one side of the request is the RBOD anchor.
    pub fn anchored(&self, blocks: &[Block]) -> bool {
        blocks[self.a.value()].kind == BlockKind::Rbod
            || blocks[self.b.value()].kind == BlockKind::Rbod
    }
}
