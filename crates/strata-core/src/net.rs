//! Multi-block nets with per-layer bounding boxes.

use serde::{Deserialize, Serialize};

use crate::block::{Block, TsvIsland};
use crate::geometry::Rect;
use crate::BlockId;

/// A net connecting two or more blocks, plus optional terminal pins.
///
/// `layer_bottom` / `layer_top` are derived from the current placement via
/// [`Net::set_layer_span`] before every evaluation; `islands` holds indices
/// into the evaluator's island list and is rebuilt by clustering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Net {
    pub name: String,
    pub blocks: Vec<BlockId>,
    pub pins: Vec<BlockId>,
    pub layer_bottom: usize,
    pub layer_top: usize,
    pub islands: Vec<usize>,
}

impl Net {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Derive the lowest and uppermost layer of the net's placed blocks.
    /// Returns false (and leaves the span at 0..0) when no block is placed.
    pub fn set_layer_span(&mut self, blocks: &[Block]) -> bool {
        let mut span: Option<(usize, usize)> = None;
        for id in &self.blocks {
            if let Some(layer) = blocks[id.value()].layer {
                span = Some(match span {
                    Some((lo, hi)) => (lo.min(layer), hi.max(layer)),
                    None => (layer, layer),
                });
            }
        }
        match span {
            Some((lo, hi)) => {
                self.layer_bottom = lo;
                self.layer_top = hi;
                true
            }
            None => {
                self.layer_bottom = 0;
                self.layer_top = 0;
                false
            }
        }
    }

    /// Number of layer crossings, i.e. the net's baseline TSV demand.
    pub fn tsv_demand(&self) -> usize {
        self.layer_top - self.layer_bottom
    }

    /// Bounding box of the net on one layer.
    ///
    /// Spans the net's blocks assigned to `layer`, terminal pins on the
    /// bottom layer, and TSV islands on `layer` or landing on it from the
    /// layer below. Zero-area when nothing of the net lives on the layer;
    /// the evaluator then inherits the box of the layer below.
    pub fn bounding_box(&self, layer: usize, blocks: &[Block], islands: &[TsvIsland]) -> Rect {
        let mut rects: Vec<Rect> = Vec::new();
        for id in &self.blocks {
            let b = &blocks[id.value()];
            if b.layer == Some(layer) {
                rects.push(b.bb);
            }
        }
        if layer == self.layer_bottom {
            for id in &self.pins {
                rects.push(blocks[id.value()].bb);
            }
        }
        for &i in &self.islands {
            let island = &islands[i];
            if island.layer == layer || island.layer + 1 == layer {
                rects.push(island.bb);
            }
        }
        Rect::bounding_box_of(rects.iter(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::approx_eq;

    fn placed(name: &str, layer: usize, x: f64, y: f64, w: f64, h: f64) -> Block {
        let mut b = Block::new(name, w, h);
        b.bb.move_to(x, y);
        b.layer = Some(layer);
        b.placed = true;
        b
    }

    #[test]
    fn test_layer_span() {
        let blocks = vec![
            placed("a", 2, 0.0, 0.0, 5.0, 5.0),
            placed("b", 0, 0.0, 0.0, 5.0, 5.0),
        ];
        let mut net = Net::new("n");
        net.blocks = vec![BlockId::new(0), BlockId::new(1)];
        assert!(net.set_layer_span(&blocks));
        assert_eq!(net.layer_bottom, 0);
        assert_eq!(net.layer_top, 2);
        assert_eq!(net.tsv_demand(), 2);
    }

    #[test]
    fn test_layer_span_unplaced() {
        let blocks = vec![Block::new("a", 5.0, 5.0)];
        let mut net = Net::new("n");
        net.blocks = vec![BlockId::new(0)];
        assert!(!net.set_layer_span(&blocks));
        assert_eq!(net.tsv_demand(), 0);
    }

    #[test]
    fn test_bounding_box_single_layer() {
        let blocks = vec![
            placed("a", 0, 0.0, 0.0, 10.0, 10.0),
            placed("b", 0, 10.0, 0.0, 10.0, 10.0),
        ];
        let mut net = Net::new("n");
        net.blocks = vec![BlockId::new(0), BlockId::new(1)];
        net.set_layer_span(&blocks);
        let bb = net.bounding_box(0, &blocks, &[]);
        assert!(approx_eq(bb.w, 20.0));
        assert!(approx_eq(bb.h, 10.0));
    }

    #[test]
    fn test_bounding_box_empty_layer() {
        let blocks = vec![
            placed("a", 0, 0.0, 0.0, 10.0, 10.0),
            placed("b", 2, 0.0, 0.0, 10.0, 10.0),
        ];
        let mut net = Net::new("n");
        net.blocks = vec![BlockId::new(0), BlockId::new(1)];
        net.set_layer_span(&blocks);
        assert_eq!(net.bounding_box(1, &blocks, &[]).area, 0.0);
    }

    #[test]
    fn test_bounding_box_includes_island_landing() {
        let blocks = vec![
            placed("a", 0, 0.0, 0.0, 10.0, 10.0),
            placed("b", 1, 30.0, 30.0, 10.0, 10.0),
        ];
        let island = TsvIsland::new("v", 1, 2.0, Rect::new(18.0, 18.0, 4.0, 4.0), 0, None);
        let mut net = Net::new("n");
        net.blocks = vec![BlockId::new(0), BlockId::new(1)];
        net.islands = vec![0];
        net.set_layer_span(&blocks);
        // island on layer 0 joins both the layer-0 box and, as landing pad,
        // the layer-1 box
        let bb0 = net.bounding_box(0, &blocks, std::slice::from_ref(&island));
        let bb1 = net.bounding_box(1, &blocks, std::slice::from_ref(&island));
        assert!(bb0.ur.x > 10.0);
        assert!(bb1.ll.x < 30.0);
    }
}
