//! Solution-file round trip: re-loading a written solution and regenerating
//! must reproduce the originating run's per-block bounding boxes.

use strata_algo::corb::{CblDirection, CorbRep};
use strata_core::block::ArRange;
use strata_core::{Block, Design};

/// Written dimensions are quantized to six decimals; regenerated
/// coordinates may accumulate that rounding across abutting blocks.
const TOL: f64 = 1e-4;
use strata_io::exporters::solution_string;
use strata_io::importers::solution::read_solution_str;

fn benchmark_design() -> Design {
    let mut design = Design::new();
    design.add_block(Block::new("alpha", 30.0, 12.0));
    design.add_block(Block::new("beta", 8.0, 20.0));
    design.add_block(Block::new_soft("gamma", 400.0, ArRange { min: 0.5, max: 2.0 }));
    design.add_block(Block::new("delta", 14.0, 14.0));
    design
}

#[test]
fn regenerated_layout_matches_original() {
    let mut design = benchmark_design();
    // shape the soft block away from its default and rotate a hard one,
    // the solution file must capture both
    design.blocks[3].shape_to_ar(1.8);
    design.blocks[4].rotate();

    let mut rep = CorbRep::new(2);
    rep.init_sequential(&design);
    rep.dies[0].cbl[1].dir = CblDirection::Vertical;
    rep.dies[1].cbl[0].junctions = 1;
    rep.generate_layout(&mut design, 2, false);

    let original_bbs: Vec<_> = design.blocks.iter().map(|b| b.bb).collect();
    let text = solution_string(&design, &rep);

    let mut reloaded_design = benchmark_design();
    let mut reloaded = read_solution_str(&text, &mut reloaded_design).unwrap();
    reloaded.generate_layout(&mut reloaded_design, 2, false);

    for (original, reloaded) in original_bbs.iter().zip(reloaded_design.blocks.iter()) {
        assert!((original.ll.x - reloaded.bb.ll.x).abs() < TOL);
        assert!((original.ll.y - reloaded.bb.ll.y).abs() < TOL);
        assert!((original.w - reloaded.bb.w).abs() < TOL);
        assert!((original.h - reloaded.bb.h).abs() < TOL);
    }
}

#[test]
fn solution_text_is_stable_across_roundtrips() {
    let mut design = benchmark_design();
    let mut rep = CorbRep::new(2);
    rep.init_sequential(&design);
    rep.generate_layout(&mut design, 1, false);

    let first = solution_string(&design, &rep);
    let mut design_b = benchmark_design();
    let mut rep_b = read_solution_str(&first, &mut design_b).unwrap();
    rep_b.generate_layout(&mut design_b, 1, false);
    let second = solution_string(&design_b, &rep_b);

    assert_eq!(first, second);
}
