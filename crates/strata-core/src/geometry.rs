//! Planar geometry primitives for floorplan layouts.
//!
//! All coordinates are micrometres. Rectangles are axis-aligned and cache
//! their width, height and area so cost evaluation never recomputes them.
//! Floating-point equality uses the shared tolerance [`EPS`]; strict
//! comparisons (`<`, `>`) break ties.

use serde::{Deserialize, Serialize};

/// Tolerance for coordinate and area comparisons.
///
/// Packing and shifting introduce rounding on the order of 1e-12; overlaps
/// below this bound are artifacts, not layout violations.
pub const EPS: f64 = 1e-6;

/// Tolerant equality for coordinates and derived quantities.
#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPS
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dist(a: Point, b: Point) -> f64 {
        ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
    }
}

/// Axis-aligned rectangle with cached extents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub ll: Point,
    pub ur: Point,
    pub w: f64,
    pub h: f64,
    pub area: f64,
}

impl Rect {
    /// Rectangle from lower-left corner and dimensions.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            ll: Point::new(x, y),
            ur: Point::new(x + w, y + h),
            w,
            h,
            area: w * h,
        }
    }

    pub fn from_corners(ll: Point, ur: Point) -> Self {
        let w = ur.x - ll.x;
        let h = ur.y - ll.y;
        Self {
            ll,
            ur,
            w,
            h,
            area: w * h,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.ll.x + self.w / 2.0, self.ll.y + self.h / 2.0)
    }

    /// Move the rectangle so its lower-left corner sits at (x, y).
    pub fn move_to(&mut self, x: f64, y: f64) {
        self.ll = Point::new(x, y);
        self.ur = Point::new(x + self.w, y + self.h);
    }

    /// Replace the dimensions, keeping the lower-left corner fixed.
    pub fn resize(&mut self, w: f64, h: f64) {
        self.w = w;
        self.h = h;
        self.area = w * h;
        self.ur = Point::new(self.ll.x + w, self.ll.y + h);
    }

    pub fn overlaps_in_x(a: &Rect, b: &Rect) -> bool {
        a.ll.x + EPS < b.ur.x && b.ll.x + EPS < a.ur.x
    }

    pub fn overlaps_in_y(a: &Rect, b: &Rect) -> bool {
        a.ll.y + EPS < b.ur.y && b.ll.y + EPS < a.ur.y
    }

    /// True when the rectangles share positive area.
    pub fn intersects(a: &Rect, b: &Rect) -> bool {
        Rect::overlaps_in_x(a, b) && Rect::overlaps_in_y(a, b)
    }

    /// Intersection of two rectangles; zero-area rect when disjoint.
    pub fn intersection(a: &Rect, b: &Rect) -> Rect {
        if !Rect::intersects(a, b) {
            return Rect::default();
        }
        let ll = Point::new(a.ll.x.max(b.ll.x), a.ll.y.max(b.ll.y));
        let ur = Point::new(a.ur.x.min(b.ur.x), a.ur.y.min(b.ur.y));
        Rect::from_corners(ll, ur)
    }

    /// Bounding box of two rectangles.
    pub fn bounding_box(a: &Rect, b: &Rect) -> Rect {
        let ll = Point::new(a.ll.x.min(b.ll.x), a.ll.y.min(b.ll.y));
        let ur = Point::new(a.ur.x.max(b.ur.x), a.ur.y.max(b.ur.y));
        Rect::from_corners(ll, ur)
    }

    /// Bounding box over a set of rectangles.
    ///
    /// With `centers` set, only the rectangles' center points span the box;
    /// wire estimation assumes nets attach near block centers rather than at
    /// worst-case outer boundaries. Returns a zero-area rect for an empty
    /// input.
    pub fn bounding_box_of<'a, I>(rects: I, centers: bool) -> Rect
    where
        I: IntoIterator<Item = &'a Rect>,
    {
        let mut it = rects.into_iter();
        let first = match it.next() {
            Some(r) => r,
            None => return Rect::default(),
        };
        let (mut ll, mut ur) = if centers {
            (first.center(), first.center())
        } else {
            (first.ll, first.ur)
        };
        for r in it {
            let (lo, hi) = if centers {
                (r.center(), r.center())
            } else {
                (r.ll, r.ur)
            };
            ll.x = ll.x.min(lo.x);
            ll.y = ll.y.min(lo.y);
            ur.x = ur.x.max(hi.x);
            ur.y = ur.y.max(hi.y);
        }
        Rect::from_corners(ll, ur)
    }

    /// Shift `moving` away from `anchor` along the cheaper axis until the two
    /// rectangles no longer overlap. Shifts are in positive direction only so
    /// repeated application against a set of anchors terminates.
    pub fn greedy_shift(anchor: &Rect, moving: &mut Rect) {
        if !Rect::intersects(anchor, moving) {
            return;
        }
        let dx = anchor.ur.x - moving.ll.x;
        let dy = anchor.ur.y - moving.ll.y;
        if dx <= dy {
            moving.move_to(anchor.ur.x, moving.ll.y);
        } else {
            moving.move_to(moving.ll.x, anchor.ur.y);
        }
    }
}

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0.0 for fewer than two samples.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection_overlapping() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        let i = Rect::intersection(&a, &b);
        assert!(approx_eq(i.ll.x, 5.0));
        assert!(approx_eq(i.ur.x, 10.0));
        assert!(approx_eq(i.area, 25.0));
    }

    #[test]
    fn test_intersection_disjoint_is_empty() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!Rect::intersects(&a, &b));
        assert_eq!(Rect::intersection(&a, &b).area, 0.0);
    }

    #[test]
    fn test_abutting_rects_do_not_intersect() {
        // shared edges carry no area and must not count as overlap
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0 - 1e-9, 0.0, 10.0, 10.0);
        assert!(!Rect::intersects(&a, &b));
    }

    #[test]
    fn test_bounding_box_of_centers() {
        let rects = [Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(10.0, 0.0, 10.0, 10.0)];
        let bb = Rect::bounding_box_of(rects.iter(), true);
        assert!(approx_eq(bb.w, 10.0));
        assert!(approx_eq(bb.h, 0.0));
    }

    #[test]
    fn test_greedy_shift_picks_short_axis() {
        let anchor = Rect::new(0.0, 0.0, 10.0, 4.0);
        let mut moving = Rect::new(8.0, 0.0, 5.0, 5.0);
        // dx = 2, dy = 4 -> shift right
        Rect::greedy_shift(&anchor, &mut moving);
        assert!(approx_eq(moving.ll.x, 10.0));
        assert!(approx_eq(moving.ll.y, 0.0));
        assert!(!Rect::intersects(&anchor, &moving));
    }

    #[test]
    fn test_greedy_shift_noop_when_clear() {
        let anchor = Rect::new(0.0, 0.0, 10.0, 10.0);
        let mut moving = Rect::new(20.0, 20.0, 5.0, 5.0);
        let before = moving;
        Rect::greedy_shift(&anchor, &mut moving);
        assert_eq!(before, moving);
    }

    #[test]
    fn test_std_dev() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(approx_eq(std_dev(&v), 2.0));
        assert_eq!(std_dev(&[1.0]), 0.0);
    }
}
