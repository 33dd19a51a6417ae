//! Circuit blocks and TSV islands.
//!
//! A single [`Block`] record covers regular blocks, terminal pins and the
//! RBOD anchor; behavior dispatches on the [`BlockKind`] tag. TSV islands are
//! transient per-evaluation artifacts and live in their own type.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Tag distinguishing the block variants that share one arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// Placeable circuit block.
    Regular,
    /// Fixed terminal pin; zero area, fixed coordinates, never placed by the
    /// layout generator.
    Pin,
    /// Reference block on die: singleton anchor at the origin for
    /// fixed-offset alignment requests.
    Rbod,
}

/// Outcome of the most recent alignment evaluation for a block.
///
/// Only one failing direction per axis is tracked at a time; the failure-fix
/// operator bias reads this to know which way to push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignmentStatus {
    Undef,
    Success,
    FailHorTooLeft,
    FailHorTooRight,
    FailVertTooLow,
    FailVertTooHigh,
}

/// Allowed aspect-ratio range (w / h) for soft blocks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ArRange {
    fn default() -> Self {
        Self { min: 1.0, max: 1.0 }
    }
}

impl ArRange {
    pub fn contains(&self, ar: f64) -> bool {
        self.min <= ar && ar <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub name: String,
    pub kind: BlockKind,
    /// Die index; `None` until the layout generator assigns one.
    pub layer: Option<usize>,
    pub bb: Rect,
    pub ar: ArRange,
    /// Soft blocks may be reshaped within their AR range at constant area.
    pub soft: bool,
    /// Power density in uW/um^2.
    pub power_density: f64,
    pub placed: bool,
    pub alignment_status: AlignmentStatus,
    /// Very large macro; pinned near the CBL head during SA phase one.
    pub floorplacement: bool,
}

impl Block {
    pub fn new(name: impl Into<String>, w: f64, h: f64) -> Self {
        Self {
            name: name.into(),
            kind: BlockKind::Regular,
            layer: None,
            bb: Rect::new(0.0, 0.0, w, h),
            ar: ArRange::default(),
            soft: false,
            power_density: 0.0,
            placed: false,
            alignment_status: AlignmentStatus::Undef,
            floorplacement: false,
        }
    }

    /// Soft block defined by area and AR range; starts square-ish at AR 1.
    pub fn new_soft(name: impl Into<String>, area: f64, ar: ArRange) -> Self {
        let w = (area * 1.0_f64.clamp(ar.min, ar.max)).sqrt();
        let h = area / w;
        let mut b = Block::new(name, w, h);
        b.ar = ar;
        b.soft = true;
        b
    }

    pub fn new_pin(name: impl Into<String>, x: f64, y: f64) -> Self {
        let mut b = Block::new(name, 0.0, 0.0);
        b.kind = BlockKind::Pin;
        b.bb.move_to(x, y);
        b.placed = true;
        b
    }

    /// The reference block on die; placed at the origin, never operated on.
    pub fn new_rbod() -> Self {
        let mut b = Block::new(Self::RBOD_NAME, 0.0, 0.0);
        b.kind = BlockKind::Rbod;
        b.placed = true;
        b
    }

    pub const RBOD_NAME: &'static str = "RBOD";

    pub fn is_regular(&self) -> bool {
        self.kind == BlockKind::Regular
    }

    /// Swap width and height in place.
    pub fn rotate(&mut self) {
        let (w, h) = (self.bb.h, self.bb.w);
        self.bb.resize(w, h);
    }

    /// Reshape to the given aspect ratio at constant area; x^2 = AR * A.
    pub fn shape_to_ar(&mut self, ar: f64) {
        let w = (ar * self.bb.area).sqrt();
        let h = self.bb.area / w;
        self.bb.resize(w, h);
    }

    /// Apply explicit dimensions if the resulting AR is allowed.
    pub fn shape_to_wh(&mut self, w: f64, h: f64) -> bool {
        if self.ar.contains(w / h) {
            self.bb.resize(w, h);
            true
        } else {
            false
        }
    }

    /// Dissipated power in W; density is uW/um^2, area um^2.
    pub fn power(&self) -> f64 {
        self.power_density * self.bb.area * 1.0e-6
    }
}

/// Square-ish bundle of TSVs occupying die area between two layers.
///
/// An island on layer `l` connects `l` to `l + 1`; its landing pads affect
/// routing on the layer above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsvIsland {
    pub name: String,
    pub layer: usize,
    pub count: usize,
    pub bb: Rect,
}

impl TsvIsland {
    /// Size an island to fit `count` TSVs at `pitch` and center it inside
    /// `reference`. Rows and columns are rounded up: spare TSVs are cheaper
    /// than missing ones, and at least one row and column always exist. A
    /// `fixed_width` (vertical buses) overrides the square shape, the height
    /// then covers the remaining via area.
    ///
    /// No sanity check against `reference` being too small: islands may
    /// over-use area since TSVs end up embedded into blocks anyway.
    pub fn new(
        name: impl Into<String>,
        count: usize,
        pitch: f64,
        reference: Rect,
        layer: usize,
        fixed_width: Option<f64>,
    ) -> Self {
        let count = count.max(1);
        let (w, h) = match fixed_width {
            Some(width) if width > pitch => {
                let cols = (width / pitch).floor().max(1.0);
                let rows = (count as f64 / cols).ceil().max(1.0);
                (width, rows * pitch)
            }
            _ => {
                let side = (count as f64).sqrt().ceil().max(1.0);
                (side * pitch, side * pitch)
            }
        };
        let x = reference.ll.x + (reference.w - w) / 2.0;
        let y = reference.ll.y + (reference.h - h) / 2.0;
        let mut bb = Rect::new(0.0, 0.0, w, h);
        bb.move_to(x, y);
        Self {
            name: name.into(),
            layer,
            count,
            bb,
        }
    }
}
