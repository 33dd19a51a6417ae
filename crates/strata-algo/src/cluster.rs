//! Signal-TSV clustering into islands.
//!
//! Nets crossing dies need one via per crossing; leaving each as its own
//! island wastes deadspace and routing. Clustering merges per-layer net
//! segments into shared islands and deliberately attracts them to thermal
//! hotspots: vias are vertical heat paths, so parking them on hot regions
//! lowers the peak temperature without dedicated thermal TSVs.

use tracing::debug;

use strata_core::{Design, Rect, TsvIsland};

use crate::thermal::{ThermalResult, THERMAL_MAP_DIM};

/// Point of the map's temperature range above which cells count as hot.
pub const HOTSPOT_QUANTILE: f64 = 0.9;

/// Upper bound on TSVs merged into one greedily built island.
pub const MAX_ISLAND_TSVS: usize = 24;

/// One net's routing demand between a layer and the next: the net index and
/// its bounding box on the lower layer.
#[derive(Debug, Clone)]
pub struct Segment {
    pub net: usize,
    pub bb: Rect,
}

/// Contiguous hot region of the thermal map.
#[derive(Debug, Clone)]
pub struct Hotspot {
    pub peak_temp: f64,
    pub base_temp: f64,
    pub temp_gradient: f64,
    /// gradient x bin count; orders hotspots by attraction strength.
    pub score: f64,
    pub bins: Vec<(usize, usize)>,
    /// Footprint in die coordinates.
    pub bb: Rect,
}

/// Flood contiguous cells above the quantile-derived threshold into scored
/// hotspots, ordered by descending score.
pub fn determine_hotspots(
    thermal: &ThermalResult,
    ambient_temp: f64,
    outline_x: f64,
    outline_y: f64,
) -> Vec<Hotspot> {
    if thermal.thermal_map.is_empty() {
        return Vec::new();
    }

    let mut min_temp = f64::INFINITY;
    let mut max_temp = f64::NEG_INFINITY;
    for row in &thermal.thermal_map {
        for &t in row {
            min_temp = min_temp.min(t);
            max_temp = max_temp.max(t);
        }
    }
    // a uniform or idle map has no hotspots to speak of
    if max_temp - min_temp < 1e-9 || max_temp <= ambient_temp + 1e-9 {
        return Vec::new();
    }
    let threshold = min_temp + HOTSPOT_QUANTILE * (max_temp - min_temp);

    let cell_w = outline_x / THERMAL_MAP_DIM as f64;
    let cell_h = outline_y / THERMAL_MAP_DIM as f64;
    let mut visited = vec![vec![false; THERMAL_MAP_DIM]; THERMAL_MAP_DIM];
    let mut hotspots = Vec::new();

    for sx in 0..THERMAL_MAP_DIM {
        for sy in 0..THERMAL_MAP_DIM {
            if visited[sx][sy] || thermal.thermal_map[sx][sy] < threshold {
                continue;
            }
            // flood fill over the 4-neighbourhood
            let mut bins = Vec::new();
            let mut peak = f64::NEG_INFINITY;
            let mut stack = vec![(sx, sy)];
            visited[sx][sy] = true;
            while let Some((x, y)) = stack.pop() {
                peak = peak.max(thermal.thermal_map[x][y]);
                bins.push((x, y));
                let neighbours = [
                    (x.wrapping_sub(1), y),
                    (x + 1, y),
                    (x, y.wrapping_sub(1)),
                    (x, y + 1),
                ];
                for (nx, ny) in neighbours {
                    if nx < THERMAL_MAP_DIM
                        && ny < THERMAL_MAP_DIM
                        && !visited[nx][ny]
                        && thermal.thermal_map[nx][ny] >= threshold
                    {
                        visited[nx][ny] = true;
                        stack.push((nx, ny));
                    }
                }
            }

            let min_x = bins.iter().map(|b| b.0).min().unwrap();
            let max_x = bins.iter().map(|b| b.0).max().unwrap();
            let min_y = bins.iter().map(|b| b.1).min().unwrap();
            let max_y = bins.iter().map(|b| b.1).max().unwrap();
            let bb = Rect::new(
                min_x as f64 * cell_w,
                min_y as f64 * cell_h,
                (max_x - min_x + 1) as f64 * cell_w,
                (max_y - min_y + 1) as f64 * cell_h,
            );

            let gradient = peak - threshold;
            hotspots.push(Hotspot {
                peak_temp: peak,
                base_temp: threshold,
                temp_gradient: gradient,
                score: gradient * bins.len() as f64,
                bins,
                bb,
            });
        }
    }

    hotspots.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    hotspots
}

/// Cluster the per-layer net segments into TSV islands.
///
/// Hotspots absorb intersecting segments first (island confined to the
/// running intersection of hotspot footprint and member boxes, so every net
/// stays within its own bounding box); leftovers cluster greedily by box
/// proximity, capped at [`MAX_ISLAND_TSVS`] vias. Islands are sized for
/// their via count, re-centered, shifted clear of earlier islands on the
/// same layer, and recorded on their nets.
pub fn cluster_signal_tsvs(
    design: &mut Design,
    segments: &[Vec<Segment>],
    islands: &mut Vec<TsvIsland>,
    tsv_pitch: f64,
    thermal: &ThermalResult,
    ambient_temp: f64,
    outline_x: f64,
    outline_y: f64,
) -> Vec<Hotspot> {
    let hotspots = determine_hotspots(thermal, ambient_temp, outline_x, outline_y);
    debug!(hotspots = hotspots.len(), "clustering signal TSVs");

    for (layer, layer_segments) in segments.iter().enumerate() {
        let mut unassigned: Vec<usize> = (0..layer_segments.len()).collect();

        for hotspot in &hotspots {
            let mut members = Vec::new();
            let mut reference = hotspot.bb;
            unassigned.retain(|&s| {
                let candidate = Rect::intersection(&reference, &layer_segments[s].bb);
                if candidate.area > 0.0 {
                    reference = candidate;
                    members.push(s);
                    false
                } else {
                    true
                }
            });
            if !members.is_empty() {
                place_island(design, islands, layer_segments, &members, reference, layer, tsv_pitch);
            }
        }

        // greedy proximity clustering for segments off the hot regions
        while let Some(&seed) = unassigned.first() {
            let mut members = vec![seed];
            let mut reference = layer_segments[seed].bb;
            unassigned.remove(0);
            unassigned.retain(|&s| {
                if members.len() >= MAX_ISLAND_TSVS {
                    return true;
                }
                let candidate = Rect::intersection(&reference, &layer_segments[s].bb);
                if candidate.area > 0.0 {
                    reference = candidate;
                    members.push(s);
                    false
                } else {
                    true
                }
            });
            place_island(design, islands, layer_segments, &members, reference, layer, tsv_pitch);
        }
    }

    hotspots
}

fn place_island(
    design: &mut Design,
    islands: &mut Vec<TsvIsland>,
    segments: &[Segment],
    members: &[usize],
    reference: Rect,
    layer: usize,
    tsv_pitch: f64,
) {
    let name = format!("tsvs_{}_{}", layer, islands.len());
    let mut island = TsvIsland::new(name, members.len(), tsv_pitch, reference, layer, None);

    // shift clear of previously placed islands on this layer
    let mut shifted = true;
    while shifted {
        shifted = false;
        for prev in islands.iter() {
            if prev.layer != layer {
                continue;
            }
            if Rect::intersects(&prev.bb, &island.bb) {
                Rect::greedy_shift(&prev.bb, &mut island.bb);
                shifted = true;
            }
        }
    }

    let index = islands.len();
    islands.push(island);
    for &s in members {
        design.nets[segments[s].net].islands.push(index);
    }
}
