//! Segment intersection tests used to rasterize the limb chain

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned rectangle, `y` growing downwards
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub(crate) fn left(&self) -> f64 {
        self.x
    }

    pub(crate) fn right(&self) -> f64 {
        self.x + self.width
    }

    pub(crate) fn top(&self) -> f64 {
        self.y
    }

    pub(crate) fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Parameters `(ua, ub)` of the crossing point of the lines through `p1 p2`
/// and `p3 p4`, measured along each segment. `None` for parallel lines and
/// zero-length segments.
pub fn intersection_params(p1: Point, p2: Point, p3: Point, p4: Point) -> Option<(f64, f64)> {
    if p1 == p2 || p3 == p4 {
        return None;
    }

    let denom = (p4.y - p3.y) * (p2.x - p1.x) - (p4.x - p3.x) * (p2.y - p1.y);
    if denom == 0.0 {
        return None;
    }

    let ua = ((p4.x - p3.x) * (p1.y - p3.y) - (p4.y - p3.y) * (p1.x - p3.x)) / denom;
    let ub = ((p2.x - p1.x) * (p1.y - p3.y) - (p2.y - p1.y) * (p1.x - p3.x)) / denom;
    Some((ua, ub))
}

fn unit(t: f64) -> bool {
    (0.0..=1.0).contains(&t)
}

/// True if segment `p1 p2` crosses segment `p3 p4`, endpoints included
pub fn segments_intersect(p1: Point, p2: Point, p3: Point, p4: Point) -> bool {
    intersection_params(p1, p2, p3, p4).is_some_and(|(ua, ub)| unit(ua) && unit(ub))
}

/// True if segment `p1 p2` crosses any edge of `cell`.
///
/// Side edges run top to bottom and exclude their top endpoint, so a segment
/// lying on the boundary between two rows lights only the upper one. Cells on
/// the canvas top edge have no row above them and keep the endpoint.
pub fn segment_hits_cell(p1: Point, p2: Point, cell: &Rect) -> bool {
    let owns_top = cell.top() <= 0.0;
    let top_left = Point::new(cell.left(), cell.top());
    let top_right = Point::new(cell.right(), cell.top());
    let bottom_left = Point::new(cell.left(), cell.bottom());
    let bottom_right = Point::new(cell.right(), cell.bottom());

    let side = |top: Point, bottom: Point| {
        intersection_params(p1, p2, top, bottom).is_some_and(|(ua, ub)| {
            let from_top = if owns_top { ub >= 0.0 } else { ub > 0.0 };
            unit(ua) && from_top && ub <= 1.0
        })
    };

    side(top_left, bottom_left)
        || side(top_right, bottom_right)
        || segments_intersect(p1, p2, top_left, top_right)
        || segments_intersect(p1, p2, bottom_left, bottom_right)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_crossing_segments() {
        assert!(segments_intersect(p(0.0, 0.0), p(10.0, 10.0), p(0.0, 10.0), p(10.0, 0.0)));
        assert!(!segments_intersect(p(0.0, 0.0), p(4.0, 4.0), p(0.0, 10.0), p(10.0, 0.0)));
    }

    #[test]
    fn test_touching_endpoint_counts() {
        assert!(segments_intersect(p(0.0, 0.0), p(5.0, 5.0), p(5.0, 5.0), p(10.0, 0.0)));
    }

    #[test]
    fn test_parallel_and_degenerate() {
        assert!(intersection_params(p(0.0, 0.0), p(10.0, 0.0), p(0.0, 5.0), p(10.0, 5.0)).is_none());
        // collinear overlap is treated as parallel
        assert!(!segments_intersect(p(0.0, 0.0), p(10.0, 0.0), p(5.0, 0.0), p(15.0, 0.0)));
        assert!(intersection_params(p(3.0, 3.0), p(3.0, 3.0), p(0.0, 0.0), p(10.0, 10.0)).is_none());
    }

    #[test]
    fn test_segment_inside_cell_misses() {
        let cell = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(!segment_hits_cell(p(2.0, 2.0), p(8.0, 8.0), &cell));
        assert!(segment_hits_cell(p(2.0, 2.0), p(12.0, 8.0), &cell));
    }

    #[test]
    fn test_row_boundary_belongs_to_upper_row() {
        let upper = Rect::new(0.0, 0.0, 10.0, 10.0);
        let lower = Rect::new(0.0, 10.0, 10.0, 10.0);
        assert!(segment_hits_cell(p(-5.0, 10.0), p(15.0, 10.0), &upper));
        assert!(!segment_hits_cell(p(-5.0, 10.0), p(15.0, 10.0), &lower));
    }

    #[test]
    fn test_canvas_top_edge_belongs_to_first_row() {
        let first = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(segment_hits_cell(p(-5.0, 0.0), p(15.0, 0.0), &first));
    }
}
